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

//! Test the verifiers on the example networks.

use crate::example_networks::{ExampleNetwork, FirewallNet, RingNet, TwoRouters};
use crate::graphs::{
    DeviceGraph, Link, ProcessGraph, RankCanonicalizer, TopologyGraph, VertexKind,
};
use crate::maxflow::FlowCache;
use crate::network::config::NetworkConfig;
use crate::network::{DeviceId, Network, ProcId, Protocol};
use crate::policy::{Flow, PolicyGroup};
use crate::settings::Settings;
use crate::verifiers::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn base(config: &NetworkConfig) -> ProcessGraph {
    let settings = Settings::default();
    let net = Arc::new(Network::from_config(config).unwrap());
    let devices = DeviceGraph::new(net, &settings).unwrap();
    ProcessGraph::new(&devices, &settings).unwrap()
}

fn customized(base: &ProcessGraph, flows: &[Flow], failed: &[Link]) -> EtgMap<ProcessGraph> {
    let etgs: BTreeMap<Flow, Arc<ProcessGraph>> = flows
        .iter()
        .map(|flow| {
            let mut etg = base.clone();
            etg.customize(flow).unwrap();
            etg.remove_links(failed);
            (flow.clone(), Arc::new(etg))
        })
        .collect();
    Arc::new(etgs)
}

fn reverse(flow: &Flow) -> Flow {
    Flow::new(flow.destination.clone(), flow.source.clone().unwrap())
}

fn all_flows(base: &ProcessGraph) -> Vec<Flow> {
    let groups = base.network().policy_groups();
    let mut flows = Vec::new();
    for s in groups {
        for d in groups.iter().filter(|d| *d != s) {
            flows.push(Flow::new(s.clone(), d.clone()));
        }
    }
    flows
}

#[test]
fn test_always_reachable() {
    let g = base(&TwoRouters::config());
    let flow = TwoRouters::flow(g.network());
    let etgs = customized(&g, &[flow.clone()], &[]);
    let verifier = AlwaysReachable::new(etgs, Arc::new(FlowCache::new()));
    assert_eq!(verifier.min_cut(&flow), Ok(2));
    assert_eq!(verifier.verify(&flow, &0), Ok(true));
    assert_eq!(verifier.verify(&flow, &1), Ok(true));
    assert_eq!(verifier.verify(&flow, &2), Ok(false));
    assert_eq!(verifier.flows(), vec![flow.clone()]);

    let failed = customized(&g, &[flow.clone()], &[Link::new("a", "b")]);
    let verifier = AlwaysReachable::new(failed, verifier.cache().clone());
    assert_eq!(verifier.verify(&flow, &0), Ok(false));
    assert_eq!(verifier.cache().hits(), 4);
}

#[test]
fn test_always_reachable_ring() {
    let g = base(&RingNet::config());
    let flow = RingNet::flow(g.network());
    let cache = Arc::new(FlowCache::new());

    let verifier = AlwaysReachable::new(customized(&g, &[flow.clone()], &[]), cache.clone());
    assert_eq!(verifier.min_cut(&flow), Ok(2));
    assert_eq!(verifier.verify(&flow, &1), Ok(true));
    assert_eq!(verifier.verify(&flow, &2), Ok(false));

    let failed = customized(&g, &[flow.clone()], &[Link::new("r0", "r1")]);
    let verifier = AlwaysReachable::new(failed, cache.clone());
    assert_eq!(verifier.min_cut(&flow), Ok(1));
    assert_eq!(verifier.verify(&flow, &0), Ok(true));
    assert_eq!(verifier.verify(&flow, &1), Ok(false));

    // the cached flow for the pair is updated to the failed graph
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_blocked() {
    let g = base(&FirewallNet::config());
    let flow = FirewallNet::flow(g.network());
    let back = reverse(&flow);
    let etgs = customized(&g, &[flow.clone(), back.clone()], &[]);

    let always = AlwaysBlocked::new(etgs.clone());
    assert_eq!(always.verify(&flow, &()), Ok(true));
    assert_eq!(always.verify(&back, &()), Ok(false));

    let currently = CurrentlyBlocked::new(etgs);
    assert_eq!(currently.verify(&flow, &()), Ok(true));
    assert_eq!(currently.verify(&back, &()), Ok(false));
}

#[test]
fn test_blocked_after_failure() {
    let g = base(&TwoRouters::config());
    let flow = TwoRouters::flow(g.network());
    let etgs = customized(&g, &[flow.clone()], &[Link::new("b", "a")]);
    assert_eq!(AlwaysBlocked::new(etgs.clone()).verify(&flow, &()), Ok(true));
    assert_eq!(CurrentlyBlocked::new(etgs).verify(&flow, &()), Ok(true));

    let etgs = customized(&g, &[flow.clone()], &[]);
    assert_eq!(AlwaysBlocked::new(etgs.clone()).verify(&flow, &()), Ok(false));
    assert_eq!(CurrentlyBlocked::new(etgs).verify(&flow, &()), Ok(false));
}

#[test]
fn test_missing_graph() {
    let g = base(&TwoRouters::config());
    let flow = TwoRouters::flow(g.network());
    let etgs = customized(&g, &[flow.clone()], &[]);
    let unknown = reverse(&flow);

    assert_eq!(
        AlwaysBlocked::new(etgs.clone()).verify(&unknown, &()),
        Err(VerifierError::NoEtg(unknown.clone()))
    );
    assert_eq!(
        AlwaysReachable::new(etgs.clone(), Arc::new(FlowCache::new())).verify(&unknown, &0),
        Err(VerifierError::NoEtg(unknown.clone()))
    );
    assert_eq!(
        AlwaysIsolated::new(etgs.clone()).verify(&flow, &unknown),
        Err(VerifierError::NoEtg(unknown.clone()))
    );

    // a wildcard graph has no vertex for a single source
    let wildcard = Flow::wildcard(flow.destination.clone());
    let etgs = customized(&g, &[wildcard.clone()], &[]);
    assert_eq!(
        CurrentlyBlocked::new(etgs).verify(&wildcard, &()),
        Err(VerifierError::NoSourceVertex(wildcard.clone()))
    );
}

#[test]
fn test_always_isolated() {
    let g = base(&TwoRouters::config());
    let flow = TwoRouters::flow(g.network());
    let back = reverse(&flow);
    let etgs = customized(&g, &[flow.clone(), back.clone()], &[]);
    let verifier = AlwaysIsolated::new(etgs);
    assert_eq!(verifier.verify(&flow, &back), Ok(false));

    // restrict one flow to BGP and the other one to OSPF
    let restricted = |flow: &Flow, removed: Protocol| {
        let mut etg = g.clone();
        etg.customize(flow).unwrap();
        for device in 0..2 {
            for index in 0..2 {
                let pid = ProcId { device: DeviceId(device), index };
                if g.network().process(pid).unwrap().protocol() != removed {
                    continue;
                }
                for kind in [VertexKind::In, VertexKind::Out].iter() {
                    if let Some(v) = etg.process_vertex(pid, *kind) {
                        etg.etg_mut().remove_vertex(v);
                    }
                }
            }
        }
        Arc::new(etg)
    };
    let mut etgs = BTreeMap::new();
    etgs.insert(flow.clone(), restricted(&flow, Protocol::Ospf));
    etgs.insert(back.clone(), restricted(&back, Protocol::Bgp));
    let verifier = AlwaysIsolated::new(Arc::new(etgs));
    assert_eq!(verifier.verify(&flow, &back), Ok(true));
    assert_eq!(verifier.verify(&back, &flow), Ok(true));
    assert_eq!(verifier.verify(&flow, &flow), Ok(false));
}

#[test]
fn test_equivalent() {
    let g = base(&TwoRouters::config());
    let flows = all_flows(&g);
    let etgs = customized(&g, &flows, &[]);
    let same = customized(&base(&TwoRouters::config()), &flows, &[]);

    let mut config = TwoRouters::config();
    config.devices[0].interfaces[0].ospf_cost = Some(10.0);
    let changed = customized(&base(&config), &flows, &[]);

    let ranked = Equivalent::new(etgs.clone(), Some(Arc::new(RankCanonicalizer)));
    let structural = Equivalent::new(etgs.clone(), None);
    for flow in flows.iter() {
        assert_eq!(ranked.verify(flow, &same), Ok(true));
        assert_eq!(ranked.verify(flow, &changed), Ok(false));
        assert_eq!(structural.verify(flow, &changed), Ok(true));
        assert_eq!(ranked.verify(flow, &Arc::new(BTreeMap::new())), Ok(false));
    }

    let failed = customized(&g, &flows, &[Link::new("a", "b")]);
    assert_eq!(structural.verify(&flows[0], &failed), Ok(false));

    let missing = Flow::new(
        PolicyGroup::from_prefix(&"10.9.0.0/24".parse().unwrap(), true),
        flows[0].destination.clone(),
    );
    assert_eq!(ranked.verify(&missing, &same), Err(VerifierError::NoEtg(missing.clone())));
}

#[test]
fn test_verify_all() {
    let g = base(&RingNet::config());
    let flows = all_flows(&g);
    assert_eq!(flows.len(), 12);
    // split the ring into r0 -- r3 and r1 -- r2
    let failed = [Link::new("r0", "r1"), Link::new("r2", "r3")];
    let etgs = customized(&g, &flows, &failed);

    let sequential = Settings::default();
    let parallel = Settings { parallelize: true, n_threads: Some(3), ..Settings::default() };

    let reachable = Arc::new(AlwaysReachable::new(etgs.clone(), Arc::new(FlowCache::new())));
    let expected = verify_all(reachable.clone(), &0, &sequential).unwrap();
    assert_eq!(expected.len(), 12);
    assert_eq!(verify_all(reachable, &0, &parallel).unwrap(), expected);

    let r0 = g.network().policy_groups()[0].clone();
    let r1 = g.network().policy_groups()[1].clone();
    let r3 = g.network().policy_groups()[3].clone();
    assert_eq!(expected.get(&Flow::new(r3.clone(), r0.clone())), Some(&true));
    assert_eq!(expected.get(&Flow::new(r0, r1)), Some(&false));
    assert_eq!(expected.values().filter(|ok| **ok).count(), 4);

    let blocked = Arc::new(AlwaysBlocked::new(etgs));
    let results = verify_all(blocked, &(), &parallel).unwrap();
    for (flow, blocked) in results.iter() {
        assert_eq!(*blocked, !expected[flow]);
    }
}

#[test]
fn test_verify_all_propagates_errors() {
    let g = base(&TwoRouters::config());
    let wildcard = Flow::wildcard(TwoRouters::flow(g.network()).destination);
    let etgs = customized(&g, &[wildcard.clone()], &[]);
    let parallel = Settings { parallelize: true, n_threads: Some(2), ..Settings::default() };
    let verifier = Arc::new(CurrentlyBlocked::new(etgs));
    assert_eq!(
        verify_all(verifier.clone(), &(), &parallel),
        Err(VerifierError::NoSourceVertex(wildcard.clone()))
    );
    assert!(verify_all(verifier, &(), &Settings::default()).is_err());
}
