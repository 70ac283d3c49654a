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

//! Test the flow enumeration and the construction of flow-specific graphs.

use crate::construct::*;
use crate::example_networks::{ExampleNetwork, FirewallNet, RingNet, TwoRouters};
use crate::graphs::{DeviceGraph, InterfaceGraph, ProcessGraph, TopologyGraph};
use crate::maxflow::FlowCache;
use crate::network::config::NetworkConfig;
use crate::network::Network;
use crate::policy::Flow;
use crate::settings::Settings;
use crate::verifiers::{AlwaysBlocked, AlwaysReachable, Verifier};
use std::sync::Arc;

fn base(config: &NetworkConfig) -> ProcessGraph {
    let settings = Settings::default();
    let net = Arc::new(Network::from_config(config).unwrap());
    let devices = DeviceGraph::new(net, &settings).unwrap();
    ProcessGraph::new(&devices, &settings).unwrap()
}

fn parallel() -> Settings {
    Settings { parallelize: true, n_threads: Some(3), ..Settings::default() }
}

#[test]
fn test_enumerate_flows() {
    let net = TwoRouters::net().unwrap();
    let flows = enumerate_flows(&net, &Settings::default());
    let back = Flow::new(net.policy_groups()[1].clone(), net.policy_groups()[0].clone());
    assert_eq!(flows, vec![TwoRouters::flow(&net), back]);

    let big = Settings { min_hosts: 257, ..Settings::default() };
    assert!(enumerate_flows(&net, &big).is_empty());
    let small = Settings { min_hosts: 256, ..Settings::default() };
    assert_eq!(enumerate_flows(&net, &small).len(), 2);
}

#[test]
fn test_enumerate_internal_flows() {
    let config = TwoRouters::config().policy_group("8.8.8.0/24".parse().unwrap(), false);
    let net = Network::from_config(&config).unwrap();
    assert_eq!(enumerate_flows(&net, &Settings::default()).len(), 6);

    let internal = Settings { internal_only: true, ..Settings::default() };
    let flows = enumerate_flows(&net, &internal);
    assert_eq!(flows.len(), 2);
    assert!(flows.iter().all(|f| f.destination.is_internal()));
}

#[test]
fn test_needs_custom_etg() {
    let net = FirewallNet::net().unwrap();
    let flow = FirewallNet::flow(&net);
    let back = Flow::new(flow.destination.clone(), flow.source.clone().unwrap());
    assert!(flow_needs_custom_etg(&net, &flow));
    assert!(!flow_needs_custom_etg(&net, &back));
    assert!(!flow_needs_custom_etg(&net, &Flow::wildcard(flow.destination.clone())));

    let net = TwoRouters::net().unwrap();
    assert!(!flow_needs_custom_etg(&net, &TwoRouters::flow(&net)));
}

#[test]
fn test_plan_flows() {
    let net = FirewallNet::net().unwrap();
    let flows = enumerate_flows(&net, &Settings::default());
    let plan = plan_flows(&net, &flows);

    let flow = FirewallNet::flow(&net);
    let back = flows[1].clone();
    let wildcard = Flow::wildcard(back.destination.clone());
    assert_eq!(plan.queue, vec![flow.clone(), wildcard.clone()]);
    assert_eq!(plan.dst_to_sources.len(), 1);
    assert_eq!(plan.dst_to_sources[&back.destination], vec![back.source.clone().unwrap()]);
    assert_eq!(plan.served_flows(&flow), vec![flow.clone()]);
    assert_eq!(plan.served_flows(&wildcard), vec![back]);
    assert_eq!(plan.num_flows(), 2);
}

#[test]
fn test_generate_wildcard_graphs() {
    let g = base(&RingNet::config());
    let flows = enumerate_flows(g.network(), &Settings::default());
    let plan = plan_flows(g.network(), &flows);
    assert_eq!(plan.queue.len(), 4);
    assert_eq!(plan.num_flows(), 12);

    let etgs = generate_flow_etgs(&g, &plan, &Settings::default()).unwrap();
    assert_eq!(etgs.len(), 12);
    assert!(flows.iter().all(|f| etgs.contains_key(f)));

    // flows to the same destination share one graph with a source vertex per source
    let shared: Vec<&Flow> =
        flows.iter().filter(|f| f.destination == flows[0].destination).collect();
    assert_eq!(shared.len(), 3);
    assert!(Arc::ptr_eq(&etgs[shared[0]], &etgs[shared[1]]));
    let etg = etgs[shared[0]].etg();
    assert_eq!(etg.source_vertices().len(), 3);
    assert!(etg.flow().map_or(false, |f| f.has_wildcard_source()));
    assert!(!Arc::ptr_eq(&etgs[&flows[0]], &etgs[&flows[11]]));

    // the base graph is never customized
    assert!(g.flow().is_none());
}

#[test]
fn test_generate_custom_graphs() {
    let g = base(&FirewallNet::config());
    let flows = enumerate_flows(g.network(), &Settings::default());
    let plan = plan_flows(g.network(), &flows);
    let flow = FirewallNet::flow(g.network());

    let pruned = Settings { prune: true, ..Settings::default() };
    let etgs = generate_flow_etgs(&g, &plan, &pruned).unwrap();
    assert_eq!(etgs.len(), 2);
    assert_eq!(etgs[&flow].flow(), Some(&flow));
    let etg = etgs[&flow].etg();
    let source = etg.source_vertex(flow.source.as_ref().unwrap()).unwrap();
    assert!(etg.outgoing_edges(source).is_empty());
    assert!(etg.edge_ids().iter().all(|e| !etg.edge(*e).unwrap().blocked));

    let verifier = AlwaysBlocked::new(Arc::new(etgs));
    assert_eq!(verifier.verify(&flow, &()), Ok(true));
    assert_eq!(verifier.verify(&flows[1], &()), Ok(false));
}

#[test]
fn test_generate_parallel() {
    let g = base(&RingNet::config());
    let flows = enumerate_flows(g.network(), &Settings::default());
    let plan = plan_flows(g.network(), &flows);

    let sequential = generate_flow_etgs(&g, &plan, &Settings::default()).unwrap();
    let threaded = generate_flow_etgs(&g, &plan, &parallel()).unwrap();
    assert_eq!(sequential.len(), threaded.len());
    for (flow, etg) in sequential.iter() {
        assert!(etg.is_equivalent(&threaded[flow], None));
    }
}

#[test]
fn test_generate_interface_graphs() {
    let g = base(&TwoRouters::config());
    let interfaces = InterfaceGraph::new(&g).unwrap();
    let flows = enumerate_flows(g.network(), &Settings::default());
    let plan = plan_flows(g.network(), &flows);
    let etgs = generate_flow_etgs(&interfaces, &plan, &parallel()).unwrap();
    assert_eq!(etgs.len(), 2);
    for (flow, etg) in etgs.iter() {
        assert!(etg.etg().source_vertex(flow.source.as_ref().unwrap()).is_some());
        assert!(etg.etg().destination_vertex().is_some());
    }
}

#[test]
fn test_generate_interface_etgs() {
    let g = base(&RingNet::config());
    let flows = enumerate_flows(g.network(), &Settings::default());
    let plan = plan_flows(g.network(), &flows);
    let processes = generate_flow_etgs(&g, &plan, &Settings::default()).unwrap();
    let interfaces = generate_interface_etgs(&processes, &Settings::default()).unwrap();
    assert_eq!(interfaces.len(), 12);

    // flows sharing a wildcard process graph share the interface graph
    for (flow, etg) in interfaces.iter() {
        let shared = interfaces.values().filter(|other| Arc::ptr_eq(etg, other)).count();
        assert_eq!(shared, 3);
        assert_eq!(etg.flow(), processes[flow].flow());
    }

    let etgs = Arc::new(interfaces);
    let verifier = AlwaysReachable::new(etgs.clone(), Arc::new(FlowCache::new()));
    for flow in etgs.keys() {
        assert!(verifier.verify(flow, &1).unwrap(), "{}", flow);
        assert!(!verifier.verify(flow, &2).unwrap(), "{}", flow);
    }
}

#[test]
fn test_group_flows() {
    let g = base(&RingNet::config());
    let flows = enumerate_flows(g.network(), &Settings::default());
    let groups = group_flows(&flows, &g);
    assert_eq!(groups.len(), 4);
    for group in groups.iter() {
        assert_eq!(group.len(), 3);
        assert!(group.iter().all(|f| f.source == group[0].source));
    }
}
