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

//! Test the graph container shared by all layers.

use crate::graphs::{
    Canonicalizer, EdgeKind::*, Etg, RankCanonicalizer, Vertex, VertexId, VertexKind,
    INFINITE_WEIGHT,
};
use crate::network::Prefix;
use crate::policy::{Flow, PolicyGroup};
use std::collections::HashMap;

fn group(s: &str) -> PolicyGroup {
    PolicyGroup::from_prefix(&s.parse::<Prefix>().unwrap(), true)
}

fn test_flow() -> Flow {
    Flow::new(group("10.1.0.0/24"), group("10.2.0.0/24"))
}

fn add(etg: &mut Etg<usize>, name: &str) -> VertexId {
    let id = etg.vertex_count();
    etg.add_vertex(Vertex::new(name, VertexKind::Normal, id))
}

/// Chain of named vertices with the given weights: `names[i] -> names[i + 1]` has weight
/// `weights[i]`.
fn chain(names: &[&str], weights: &[f64]) -> Etg<usize> {
    let mut etg = Etg::new();
    let ids: Vec<VertexId> = names.iter().map(|n| add(&mut etg, n)).collect();
    for (i, w) in weights.iter().enumerate() {
        etg.add_edge(ids[i], ids[i + 1], *w, IntraDevice);
    }
    etg
}

#[test]
fn test_unique_vertices() {
    let mut etg: Etg<usize> = Etg::new();
    let a = add(&mut etg, "a");
    let again = etg.add_vertex(Vertex::new("a", VertexKind::Normal, 42));
    assert_eq!(a, again);
    assert_eq!(etg.vertex_count(), 1);
    // the original vertex is kept
    assert_eq!(etg.vertex(a).and_then(|v| v.element()), Some(0));
    assert_eq!(etg.vertex_name(a), "a");
    assert_eq!(etg.vertex_id("b"), None);
}

#[test]
fn test_idempotent_edges() {
    let mut etg: Etg<usize> = Etg::new();
    let a = add(&mut etg, "a");
    let b = add(&mut etg, "b");
    let e1 = etg.add_edge(a, b, 1.0, IntraDevice);
    let e2 = etg.add_edge(a, b, 2.0, InterDevice);
    assert_eq!(e1, e2);
    assert_eq!(etg.edge_count(), 1);
    assert_eq!(etg.edge_weight(a, b), Some(2.0));
    assert_eq!(etg.edge(e1).map(|e| e.kind), Some(InterDevice));
    assert!(etg.contains_edge(a, b));
    assert!(!etg.contains_edge(b, a));

    assert!(etg.set_edge_weight(a, b, 7.0));
    assert_eq!(etg.edge_weight(a, b), Some(7.0));
    assert!(!etg.set_edge_weight(b, a, 7.0));
}

#[test]
fn test_remove_vertex() {
    let mut etg = chain(&["a", "b", "c"], &[1.0, 1.0]);
    let b = etg.vertex_id("b").unwrap();
    let removed = etg.remove_vertex(b).unwrap();
    assert_eq!(removed.name(), "b");
    assert_eq!(etg.vertex_count(), 2);
    assert_eq!(etg.edge_count(), 0);
    assert_eq!(etg.vertex_id("b"), None);
    // the remaining ids stay valid
    assert_eq!(etg.vertex_id("c").map(|c| etg.vertex_name(c).to_string()), Some("c".into()));
}

#[test]
fn test_clone_is_independent() {
    let original = chain(&["a", "b"], &[1.0]);
    let mut copy = original.clone();
    let a = copy.vertex_id("a").unwrap();
    let b = copy.vertex_id("b").unwrap();
    let c = add(&mut copy, "c");
    copy.add_edge(b, c, 3.0, IntraDevice);
    copy.set_edge_weight(a, b, 5.0);

    assert_eq!(original.vertex_count(), 2);
    assert_eq!(original.edge_count(), 1);
    assert_eq!(original.edge_weight(a, b), Some(1.0));
    assert_eq!(copy.edge_weight(a, b), Some(5.0));
}

#[test]
fn test_customize_once() {
    let mut etg = chain(&["a", "b"], &[1.0]);
    let flow = test_flow();
    assert!(etg.begin_customize(&flow, &[group("10.1.0.0/24")]));
    assert_eq!(etg.flow(), Some(&flow));
    assert_eq!(etg.vertex_count(), 4);
    let source = etg.source_vertex(&group("10.1.0.0/24")).unwrap();
    let destination = etg.destination_vertex().unwrap();
    assert_eq!(etg.vertex(source).map(|v| v.kind()), Some(VertexKind::Source));
    assert_eq!(etg.vertex(destination).map(|v| v.kind()), Some(VertexKind::Destination));
    assert!(etg.is_endpoint(source));
    assert!(!etg.is_endpoint(etg.vertex_id("a").unwrap()));

    let other = Flow::new(group("10.2.0.0/24"), group("10.1.0.0/24"));
    assert!(!etg.begin_customize(&other, &[group("10.2.0.0/24")]));
    assert_eq!(etg.flow(), Some(&flow));
    assert_eq!(etg.vertex_count(), 4);
}

#[test]
fn test_prune() {
    let mut etg: Etg<usize> = Etg::new();
    let flow = test_flow();
    etg.begin_customize(&flow, &[group("10.1.0.0/24")]);
    let s = etg.source_vertex(&group("10.1.0.0/24")).unwrap();
    let d = etg.destination_vertex().unwrap();
    let names = ["a", "b", "c", "e", "f", "x", "y"];
    let v: HashMap<&str, VertexId> = names.iter().map(|n| (*n, add(&mut etg, n))).collect();

    etg.add_edge(s, v["a"], 1.0, IntraDevice);
    etg.add_edge(v["a"], d, 1.0, IntraDevice);
    // dead end
    etg.add_edge(v["a"], v["b"], 1.0, IntraDevice);
    // never reached
    etg.add_edge(v["c"], v["a"], 1.0, IntraDevice);
    // blocked entry
    let blocked = etg.add_edge(s, v["e"], 1.0, IntraDevice);
    etg.edge_mut(blocked).unwrap().blocked = true;
    etg.add_edge(v["e"], d, 1.0, IntraDevice);
    // infinite entry
    etg.add_edge(s, v["f"], INFINITE_WEIGHT, IntraDevice);
    etg.add_edge(v["f"], d, 1.0, IntraDevice);
    // chain that dies only after several rounds
    etg.add_edge(v["a"], v["x"], 1.0, IntraDevice);
    etg.add_edge(v["x"], v["y"], 1.0, IntraDevice);

    etg.prune();
    let mut remaining: Vec<String> =
        etg.vertex_ids().into_iter().map(|v| etg.vertex_name(v).to_string()).collect();
    remaining.sort();
    assert_eq!(remaining.len(), 3);
    assert!(remaining.contains(&"a".to_string()));
    assert_eq!(etg.edge_count(), 2);
    assert_eq!(etg.source_vertex(&group("10.1.0.0/24")), Some(s));
    assert_eq!(etg.destination_vertex(), Some(d));

    // pruning again does not change anything
    let before = etg.named_edges();
    etg.prune();
    assert_eq!(etg.named_edges(), before);
    assert_eq!(etg.vertex_count(), 3);
}

#[test]
fn test_prune_keeps_unconnected_endpoints() {
    let mut etg = chain(&["a", "b"], &[1.0]);
    etg.begin_customize(&test_flow(), &[group("10.1.0.0/24")]);
    etg.prune();
    assert_eq!(etg.vertex_count(), 2);
    assert_eq!(etg.edge_count(), 0);
    assert!(etg.destination_vertex().is_some());
}

#[test]
fn test_rank_canonicalizer() {
    let edges = vec![
        ("a".to_string(), "b".to_string(), 10.0),
        ("b".to_string(), "c".to_string(), 30.0),
        ("c".to_string(), "d".to_string(), 10.0),
        ("d".to_string(), "e".to_string(), INFINITE_WEIGHT),
    ];
    let canonical = RankCanonicalizer.canonicalize(&edges);
    assert_eq!(canonical[&("a".to_string(), "b".to_string())], 0.0);
    assert_eq!(canonical[&("b".to_string(), "c".to_string())], 1.0);
    assert_eq!(canonical[&("c".to_string(), "d".to_string())], 0.0);
    assert_eq!(canonical[&("d".to_string(), "e".to_string())], INFINITE_WEIGHT);
}

#[test]
fn test_equivalence() {
    let g = chain(&["a", "b", "c"], &[1.0, 2.0]);
    let scaled = chain(&["a", "b", "c"], &[10.0, 20.0]);
    let swapped = chain(&["a", "b", "c"], &[20.0, 10.0]);
    let renamed = chain(&["a", "b", "x"], &[1.0, 2.0]);
    let mut longer = chain(&["a", "b", "c"], &[1.0, 2.0]);
    let (a, c) = (longer.vertex_id("a").unwrap(), longer.vertex_id("c").unwrap());
    longer.add_edge(a, c, 1.0, IntraDevice);

    let rank = RankCanonicalizer;
    assert!(g.is_equivalent(&scaled, Some(&rank)));
    assert!(!g.is_equivalent(&swapped, Some(&rank)));
    assert!(g.is_equivalent(&swapped, None));
    assert!(!g.is_equivalent(&renamed, None));
    assert!(!g.is_equivalent(&longer, None));
    assert!(!longer.is_equivalent(&g, None));
    assert!(g.is_equivalent(&g.clone(), Some(&rank)));
}

#[test]
fn test_display() {
    let mut etg = chain(&["a", "b", "c"], &[1.5, INFINITE_WEIGHT]);
    let (a, b) = (etg.vertex_id("a").unwrap(), etg.vertex_id("b").unwrap());
    let e = etg.find_edge(a, b).unwrap();
    etg.edge_mut(e).unwrap().blocked = true;
    let text = etg.to_string();
    assert!(text.contains("a -> b 1.5 (blocked)"));
    assert!(text.contains("b -> c INF"));
}
