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

//! Test the interface layer, refining the process graph.

use crate::example_networks::{ExampleNetwork, FirewallNet, TwoRouters};
use crate::graphs::{
    DeviceGraph, EdgeKind, InterfaceGraph, Link, ProcessGraph, TopologyGraph, VertexKind,
};
use crate::maxflow::FlowCache;
use crate::network::{DeviceId, IfaceId, Network};
use crate::settings::Settings;
use crate::verifiers::{AlwaysReachable, Verifier};
use maplit::btreemap;
use petgraph::algo::has_path_connecting;
use std::sync::Arc;

fn processes(net: Network) -> ProcessGraph {
    let settings = Settings::default();
    let devices = DeviceGraph::new(Arc::new(net), &settings).unwrap();
    ProcessGraph::new(&devices, &settings).unwrap()
}

fn iface(device: usize, index: usize) -> IfaceId {
    IfaceId { device: DeviceId(device), index }
}

fn has_edge(g: &InterfaceGraph, from: &str, to: &str) -> bool {
    let etg = g.etg();
    match (etg.vertex_id(from), etg.vertex_id(to)) {
        (Some(a), Some(b)) => etg.contains_edge(a, b),
        _ => false,
    }
}

#[test]
fn test_structure() {
    let g = InterfaceGraph::new(&processes(TwoRouters::net().unwrap())).unwrap();
    let etg = g.etg();
    assert_eq!(g.interfaces().len(), 4);
    assert_eq!(etg.vertex_count(), 8);
    assert_eq!(etg.edge_count(), 6);
    assert!(g.flow().is_none());

    assert!(etg.vertex_id("a.GigabitEthernet0/1.IN").is_some());
    assert!(g.interface_vertex(iface(1, 1), VertexKind::Out).is_some());
    assert!(g.interface_vertex(iface(1, 2), VertexKind::Out).is_none());

    assert!(has_edge(&g, "a.GigabitEthernet0/0.OUT", "b.GigabitEthernet0/0.IN"));
    assert!(has_edge(&g, "b.GigabitEthernet0/0.OUT", "a.GigabitEthernet0/0.IN"));
    assert!(has_edge(&g, "a.GigabitEthernet0/0.IN", "a.GigabitEthernet0/1.OUT"));
    assert!(has_edge(&g, "a.GigabitEthernet0/1.IN", "a.GigabitEthernet0/0.OUT"));
    // no edge from an interface back to itself
    assert!(!has_edge(&g, "a.GigabitEthernet0/0.IN", "a.GigabitEthernet0/0.OUT"));

    let link = etg.find_edge(
        etg.vertex_id("a.GigabitEthernet0/0.OUT").unwrap(),
        etg.vertex_id("b.GigabitEthernet0/0.IN").unwrap(),
    );
    let link = etg.edge(link.unwrap()).unwrap();
    assert_eq!(link.kind, EdgeKind::InterDevice);
    assert_eq!(link.source_iface, Some(iface(0, 0)));
    assert_eq!(link.destination_iface, Some(iface(1, 0)));
}

#[test]
fn test_customized_from_process_graph() {
    let mut p = processes(TwoRouters::net().unwrap());
    let flow = TwoRouters::flow(p.network());
    p.customize(&flow).unwrap();

    let g = InterfaceGraph::new(&p).unwrap();
    assert_eq!(g.flow(), Some(&flow));
    let etg = g.etg();
    assert_eq!(etg.vertex_count(), 10);
    assert_eq!(etg.edge_count(), 10);

    let source = etg.source_vertex(flow.source.as_ref().unwrap()).unwrap();
    let destination = etg.destination_vertex().unwrap();
    let lan_a = g.interface_vertex(iface(0, 1), VertexKind::Out).unwrap();
    let lan_b = g.interface_vertex(iface(1, 1), VertexKind::In).unwrap();
    assert!(etg.contains_edge(source, lan_a));
    assert!(etg.contains_edge(lan_b, destination));
    assert!(!etg.contains_edge(source, destination));
    assert!(etg.edge_ids().iter().all(|e| !etg.edge(*e).unwrap().blocked));

    // the process endpoints reach the link interfaces
    let link_a = g.interface_vertex(iface(0, 0), VertexKind::Out).unwrap();
    let link_b = g.interface_vertex(iface(1, 0), VertexKind::In).unwrap();
    assert!(etg.contains_edge(source, link_a));
    assert!(etg.contains_edge(link_b, destination));
    let mapped = etg.edge(etg.find_edge(source, link_a).unwrap()).unwrap();
    assert_eq!(mapped.kind, EdgeKind::InterDevice);
    assert_eq!(mapped.source_iface, None);
    assert_eq!(mapped.destination_iface, Some(iface(0, 0)));

    // customizing twice has no effect
    let mut again = g.clone();
    assert!(!again.customize(&flow).unwrap());
    assert_eq!(again.etg().edge_count(), 10);
}

#[test]
fn test_reachable_from_process_graph() {
    let mut p = processes(TwoRouters::net().unwrap());
    let flow = TwoRouters::flow(p.network());
    p.customize(&flow).unwrap();
    let g = InterfaceGraph::new(&p).unwrap();

    let etg = g.etg();
    let source = etg.source_vertex(flow.source.as_ref().unwrap()).unwrap();
    let destination = etg.destination_vertex().unwrap();
    assert!(has_path_connecting(etg.graph(), source, destination, None));

    // both BGP and OSPF use the single link, so one failure disconnects the flow
    let etgs = Arc::new(btreemap! { flow.clone() => Arc::new(g.clone()) });
    let verifier = AlwaysReachable::new(etgs, Arc::new(FlowCache::new()));
    assert_eq!(verifier.min_cut(&flow).unwrap(), 1);
    assert!(verifier.verify(&flow, &0).unwrap());
    assert!(!verifier.verify(&flow, &1).unwrap());

    let mut failed = g.clone();
    failed.remove_link(&Link::new("a", "b"));
    let etg = failed.etg();
    assert!(!has_path_connecting(etg.graph(), source, destination, None));
}

#[test]
fn test_filter() {
    let net = FirewallNet::net().unwrap();
    let flow = FirewallNet::flow(&net);
    let mut g = InterfaceGraph::new(&processes(net)).unwrap();
    g.customize(&flow).unwrap();

    let etg = g.etg();
    let source = etg.source_vertex(flow.source.as_ref().unwrap()).unwrap();
    let out = etg.outgoing_edges(source);
    assert_eq!(out.len(), 1);
    assert!(etg.edge(out[0]).unwrap().blocked);

    g.prune();
    assert!(g.etg().outgoing_edges(source).is_empty());
}

#[test]
fn test_remove_link() {
    let base = InterfaceGraph::new(&processes(TwoRouters::net().unwrap())).unwrap();
    let mut g = base.clone();
    g.remove_link(&Link::new("b", "a"));
    assert_eq!(g.etg().edge_count(), 4);
    assert!(!has_edge(&g, "a.GigabitEthernet0/0.OUT", "b.GigabitEthernet0/0.IN"));
    assert!(has_edge(&g, "a.GigabitEthernet0/0.IN", "a.GigabitEthernet0/1.OUT"));
    assert_eq!(base.etg().edge_count(), 6);
}
