// ARC: Analyzing Network Configurations with Extended Topology Graphs
// Copyright (C) 2021  The ARC Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Test the incremental max-flow engine against brute force and against fresh computations.

use crate::example_networks::{ExampleNetwork, TwoRouters};
use crate::graphs::{DeviceGraph, ProcessGraph, TopologyGraph};
use crate::maxflow::*;
use crate::settings::Settings;
use rand::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

fn name(i: usize) -> String {
    format!("v{}", i)
}

/// Random graph with unit capacities. Every vertex is added, even without edges.
fn random_graph(rng: &mut StdRng, n: usize, p: f64) -> (CapacityGraph, Vec<(usize, usize)>) {
    let mut graph = CapacityGraph::new();
    let mut edges = Vec::new();
    for i in 0..n {
        graph.add_vertex(&name(i));
    }
    for a in 0..n {
        for b in 0..n {
            if a != b && rng.gen_bool(p) {
                graph.add_capacity(&name(a), &name(b), 1.0);
                edges.push((a, b));
            }
        }
    }
    (graph, edges)
}

fn connected(edges: &[(usize, usize)], removed: u32, from: usize, to: usize) -> bool {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(from);
    seen.insert(from);
    while let Some(v) = queue.pop_front() {
        if v == to {
            return true;
        }
        for (i, (a, b)) in edges.iter().enumerate() {
            if *a == v && removed & (1 << i) == 0 && seen.insert(*b) {
                queue.push_back(*b);
            }
        }
    }
    false
}

/// Smallest number of edges to remove to disconnect the two vertices
fn brute_force_min_cut(edges: &[(usize, usize)], from: usize, to: usize) -> i64 {
    let mut best = edges.len() as u32;
    for removed in 0u32..(1 << edges.len()) {
        if removed.count_ones() < best && !connected(edges, removed, from, to) {
            best = removed.count_ones();
        }
    }
    best as i64
}

#[test]
fn test_small_graph() {
    let mut graph = CapacityGraph::new();
    graph.add_capacity("s", "a", 3.0);
    graph.add_capacity("s", "b", 2.0);
    graph.add_capacity("a", "b", 1.0);
    graph.add_capacity("a", "d", 2.0);
    graph.add_capacity("b", "d", 3.0);
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.edge_count(), 5);

    let mut flow = MaxFlow::new(&graph, "s", "d").unwrap();
    assert_eq!(flow.compute(UNBOUNDED), 5);
    assert_eq!(flow.value(), 5);
    assert_eq!(flow.flow_on("a", "d"), 2);
    assert_eq!(flow.flow_on("s", "a") + flow.flow_on("s", "b"), 5);

    // stop early once the limit is reached
    assert!(flow.compute(2) >= 2);
    assert_eq!(flow.compute(UNBOUNDED), 5);
}

#[test]
fn test_same_source_and_destination() {
    let mut graph = CapacityGraph::new();
    graph.add_capacity("s", "d", 1.0);
    let mut flow = MaxFlow::new(&graph, "s", "s").unwrap();
    assert_eq!(flow.compute(UNBOUNDED), 0);
}

#[test]
fn test_unknown_vertex() {
    let mut graph = CapacityGraph::new();
    graph.add_capacity("s", "d", 1.0);
    assert_eq!(
        MaxFlow::new(&graph, "s", "x").err(),
        Some(FlowError::UnknownVertex("x".to_string()))
    );
    let cache = FlowCache::new();
    assert!(cache.max_flow(&graph, "x", "d").is_err());
}

#[test]
fn test_min_cut_duality() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..30 {
        let n = rng.gen_range(2, 8);
        let (graph, edges) = random_graph(&mut rng, n, 0.25);
        if edges.len() > 16 {
            continue;
        }
        let mut flow = MaxFlow::new(&graph, &name(0), &name(n - 1)).unwrap();
        assert_eq!(flow.compute(UNBOUNDED), brute_force_min_cut(&edges, 0, n - 1));
    }
}

#[test]
fn test_incremental_updates() {
    let mut rng = StdRng::seed_from_u64(7);
    for round in 0..10 {
        let n = 10;
        let (mut graph, _) = random_graph(&mut rng, n, 0.2);
        let (source, destination) = (name(0), name(n - 1));
        let cache = FlowCache::new();
        cache.max_flow(&graph, &source, &destination).unwrap();

        for step in 0..8 {
            for _ in 0..3 {
                let (a, b) = (rng.gen_range(0, n), rng.gen_range(0, n));
                if a != b {
                    graph.set_capacity(&name(a), &name(b), 1);
                }
            }
            for _ in 0..3 {
                let (a, b) = (rng.gen_range(0, n), rng.gen_range(0, n));
                graph.set_capacity(&name(a), &name(b), 0);
            }
            let incremental = cache.max_flow(&graph, &source, &destination).unwrap();
            let fresh = MaxFlow::new(&graph, &source, &destination).unwrap().compute(UNBOUNDED);
            assert_eq!(incremental, fresh, "round {} step {}", round, step);
        }
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 8);
    }
}

#[test]
fn test_stale_vertices_are_dropped() {
    let path = |via: &str| {
        let mut graph = CapacityGraph::new();
        graph.add_capacity("s", via, 1.0);
        graph.add_capacity(via, "d", 1.0);
        graph
    };
    let mut flow = MaxFlow::new(&path("a"), "s", "d").unwrap();
    assert_eq!(flow.compute(UNBOUNDED), 1);
    assert_eq!(flow.num_vertices(), 3);

    assert_eq!(flow.recompute_delta(&path("b")).unwrap(), 1);
    assert_eq!(flow.num_vertices(), 3);
    assert_eq!(flow.flow_on("s", "b"), 1);
    assert_eq!(flow.flow_on("s", "a"), 0);

    for i in 0..20 {
        let graph = path(&format!("x{}", i));
        assert_eq!(flow.recompute_delta(&graph).unwrap(), 1);
        assert_eq!(flow.num_vertices(), 3);
    }
    assert_eq!(flow.source(), "s");
    assert_eq!(flow.destination(), "d");
}

#[test]
fn test_new_vertices_in_update() {
    let mut graph = CapacityGraph::new();
    graph.add_capacity("s", "a", 1.0);
    graph.add_capacity("a", "d", 1.0);
    let cache = FlowCache::new();
    assert_eq!(cache.max_flow(&graph, "s", "d").unwrap(), 1);

    graph.add_capacity("s", "b", 1.0);
    graph.add_capacity("b", "d", 1.0);
    assert_eq!(cache.max_flow(&graph, "s", "d").unwrap(), 2);

    graph.set_capacity("s", "a", 0);
    assert_eq!(cache.max_flow(&graph, "s", "d").unwrap(), 1);
}

#[test]
fn test_capacity_saturation() {
    let mut large = CapacityGraph::new();
    large.add_capacity("s", "a", 50_000.0);
    large.add_capacity("a", "d", 50_000.0);
    let mut limit = CapacityGraph::new();
    limit.add_capacity("s", "a", 10_000.0);
    limit.add_capacity("a", "d", 10_000.0);
    assert_eq!(large, limit);
    assert_eq!(large.capacity_by_name("s", "a"), CAPACITY_LIMIT);

    let flow = |g: &CapacityGraph| MaxFlow::new(g, "s", "d").unwrap().compute(UNBOUNDED);
    assert_eq!(flow(&large), flow(&limit));
    assert_eq!(flow(&large), CAPACITY_LIMIT);

    // repeated additions saturate as well
    let mut summed = CapacityGraph::new();
    summed.add_capacity("s", "d", 6_000.0);
    summed.add_capacity("s", "d", 6_000.0);
    assert_eq!(summed.capacity_by_name("s", "d"), CAPACITY_LIMIT);
    summed.set_capacity("s", "d", -3);
    assert_eq!(summed.capacity_by_name("s", "d"), 0);
    assert_eq!(summed.capacity_by_name("s", "x"), 0);
}

#[test]
fn test_cache() {
    let mut graph = CapacityGraph::new();
    graph.add_capacity("s", "d", 1.0);
    graph.add_capacity("d", "s", 1.0);

    let cache = FlowCache::new();
    assert!(cache.is_empty());
    assert_eq!(cache.max_flow(&graph, "s", "d").unwrap(), 1);
    assert_eq!(cache.max_flow(&graph, "s", "d").unwrap(), 1);
    assert_eq!(cache.max_flow(&graph, "d", "s").unwrap(), 1);
    assert_eq!((cache.hits(), cache.misses()), (1, 2));
    assert_eq!(cache.len(), 2);

    cache.clear().unwrap();
    assert!(cache.is_empty());
    assert_eq!(cache.max_flow(&graph, "s", "d").unwrap(), 1);
    assert_eq!(cache.misses(), 3);
}

#[test]
fn test_shared_cache() {
    let mut graph = CapacityGraph::new();
    for i in 0..4 {
        graph.add_capacity("s", &name(i), 1.0);
        graph.add_capacity(&name(i), "d", 1.0);
    }
    let graph = Arc::new(graph);
    let cache = Arc::new(FlowCache::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let graph = graph.clone();
            let cache = cache.clone();
            std::thread::spawn(move || cache.max_flow(&graph, "s", "d").unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 4);
    }
    assert_eq!(cache.hits() + cache.misses(), 4);
    assert_eq!(cache.misses(), 1);
}

#[test]
fn test_unit_capacity_graph() {
    let settings = Settings::default();
    let net = Arc::new(TwoRouters::net().unwrap());
    let flow = TwoRouters::flow(&net);
    let devices = DeviceGraph::new(net, &settings).unwrap();
    let mut g = ProcessGraph::new(&devices, &settings).unwrap();
    g.customize(&flow).unwrap();

    let graph = unit_capacity_graph(g.etg());
    assert_eq!(graph.len(), 10);
    assert_eq!(graph.edge_count(), 14);
    assert_eq!(graph.capacity_by_name("a.ospf.1.OUT", "b.ospf.1.IN"), 1);
    assert_eq!(graph.capacity_by_name("a.bgp.100.IN", "a.ospf.1.OUT"), CAPACITY_LIMIT);

    let weighted = weighted_capacity_graph(g.etg());
    assert_eq!(weighted.capacity_by_name("a.bgp.100.IN", "a.ospf.1.OUT"), 1500);
}
