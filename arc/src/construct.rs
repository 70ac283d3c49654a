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

//! # Flow-specific graphs
//!
//! Enumerates the flows of a network and builds one customized graph per flow, by cloning a base
//! graph. Flows whose traffic is not blocked by any ACL at their endpoints share one graph per
//! destination: a wildcard graph with one source vertex per source.

use crate::graphs::{GeneratorError, InterfaceGraph, ProcessGraph, TopologyGraph, VertexKind};
use crate::network::{Interface, Network};
use crate::policy::{Flow, PolicyGroup};
use crate::settings::Settings;
use log::*;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

/// Flow-specific graphs, by flow. Flows served by the same wildcard graph share it.
pub type FlowEtgs<G> = BTreeMap<Flow, Arc<G>>;

/// Every ordered pair of distinct policy groups of the network. Groups with fewer than
/// [`Settings::min_hosts`] addresses are skipped, and with [`Settings::internal_only`], so are
/// external groups.
pub fn enumerate_flows(net: &Network, settings: &Settings) -> Vec<Flow> {
    let groups: Vec<&PolicyGroup> = net
        .policy_groups()
        .iter()
        .filter(|g| g.size() >= settings.min_hosts)
        .filter(|g| !settings.internal_only || g.is_internal())
        .collect();
    let mut flows = Vec::with_capacity(groups.len() * groups.len().saturating_sub(1));
    for source in groups.iter() {
        for destination in groups.iter().filter(|d| *d != source) {
            flows.push(Flow::new((*source).clone(), (*destination).clone()));
        }
    }
    flows
}

fn filter_blocks(flow: &Flow, net: &Network, iface: &Interface, filter: Option<&str>) -> bool {
    match (filter, net.device(iface.id().device)) {
        (Some(name), Ok(device)) => flow.is_blocked_by_filter(name, device),
        _ => false,
    }
}

/// Returns true if an ACL at the endpoints of the flow blocks it: an incoming filter on an
/// interface inside the destination, or an outgoing filter on an interface inside the source.
/// Such a flow cannot share a wildcard graph with other sources.
pub fn flow_needs_custom_etg(net: &Network, flow: &Flow) -> bool {
    let source = match flow.source.as_ref() {
        Some(s) => s,
        None => return false,
    };
    net.devices().iter().flat_map(|d| d.interfaces().iter()).any(|iface| match iface.prefix() {
        Some(prefix) => {
            (flow.destination.contains_prefix(&prefix)
                && filter_blocks(flow, net, iface, iface.incoming_filter()))
                || (source.contains_prefix(&prefix)
                    && filter_blocks(flow, net, iface, iface.outgoing_filter()))
        }
        None => false,
    })
}

/// # Flow Plan
///
/// The graphs to construct: one per flow in `queue`. Wildcard flows in the queue stand for all
/// sources listed for their destination in `dst_to_sources`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowPlan {
    /// Flows to construct a graph for, in order
    pub queue: Vec<Flow>,
    /// Sources served by the wildcard graph of each destination
    pub dst_to_sources: BTreeMap<PolicyGroup, Vec<PolicyGroup>>,
}

impl FlowPlan {
    /// Concrete flows served by the graph of a planned flow
    pub fn served_flows(&self, planned: &Flow) -> Vec<Flow> {
        if !planned.has_wildcard_source() {
            return vec![planned.clone()];
        }
        self.dst_to_sources
            .get(&planned.destination)
            .map(|sources| {
                sources.iter().map(|s| Flow::new(s.clone(), planned.destination.clone())).collect()
            })
            .unwrap_or_default()
    }

    /// Number of concrete flows covered by the plan
    pub fn num_flows(&self) -> usize {
        self.queue.iter().map(|f| self.served_flows(f).len()).sum()
    }
}

/// Decide which flows get their own graph. Flows blocked at their endpoints are queued
/// individually, all others are served by one wildcard graph per destination.
pub fn plan_flows(net: &Network, flows: &[Flow]) -> FlowPlan {
    let mut plan = FlowPlan::default();
    for flow in flows {
        let source = match flow.source.as_ref() {
            Some(s) => s,
            None => {
                plan.queue.push(flow.clone());
                continue;
            }
        };
        if flow_needs_custom_etg(net, flow) {
            debug!("Flow requires a specific ETG: {}", flow);
            plan.queue.push(flow.clone());
            continue;
        }
        let destination = flow.destination.clone();
        if !plan.dst_to_sources.contains_key(&destination) {
            plan.queue.push(Flow::wildcard(destination.clone()));
        }
        plan.dst_to_sources.entry(destination).or_default().push(source.clone());
    }
    info!(
        "Planned {} ETGs for {} flows ({} wildcard)",
        plan.queue.len(),
        flows.len(),
        plan.dst_to_sources.len()
    );
    plan
}

fn construct_one<G: TopologyGraph>(
    base: &G,
    flow: &Flow,
    plan: &FlowPlan,
    settings: &Settings,
) -> Result<Vec<(Flow, Arc<G>)>, GeneratorError> {
    let mut etg = base.clone();
    let served = plan.served_flows(flow);
    if flow.has_wildcard_source() {
        let sources: Vec<PolicyGroup> =
            served.iter().filter_map(|f| f.source.clone()).collect();
        etg.customize_sources(flow, &sources)?;
    } else {
        etg.customize(flow)?;
    }
    if settings.prune {
        etg.prune();
    }
    let etg = Arc::new(etg);
    Ok(served.into_iter().map(|f| (f, etg.clone())).collect())
}

fn progress(done: &AtomicUsize, total: usize) {
    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
    if n % 100 == 0 {
        debug!("Generated {}/{} ETGs", n, total);
    }
}

/// Clone and customize the base graph for every planned flow. With [`Settings::parallelize`],
/// the queue is drained by [`Settings::threads`] workers. The first failing worker aborts the
/// construction.
pub fn generate_flow_etgs<G>(
    base: &G,
    plan: &FlowPlan,
    settings: &Settings,
) -> Result<FlowEtgs<G>, GeneratorError>
where
    G: TopologyGraph + 'static,
{
    let start = Instant::now();
    let total = plan.queue.len();
    let done = Arc::new(AtomicUsize::new(0));
    let mut etgs = FlowEtgs::new();

    if !settings.parallelize {
        for flow in plan.queue.iter() {
            etgs.extend(construct_one(base, flow, plan, settings)?);
            progress(&done, total);
        }
    } else {
        let n_threads = settings.threads();
        let base = Arc::new(base.clone());
        let plan = Arc::new(plan.clone());
        let queue = Arc::new(Mutex::new(plan.queue.iter().cloned().collect::<VecDeque<Flow>>()));

        let handles = (0..n_threads)
            .map(|_| {
                let base = base.clone();
                let plan = plan.clone();
                let queue = queue.clone();
                let done = done.clone();
                let settings = settings.clone();
                thread::spawn(move || -> Result<Vec<(Flow, Arc<G>)>, GeneratorError> {
                    let mut result = Vec::new();
                    loop {
                        let next = queue
                            .lock()
                            .map_err(|_| GeneratorError::TaskFailed("queue lock poisoned".into()))?
                            .pop_front();
                        let flow = match next {
                            Some(f) => f,
                            None => break,
                        };
                        result.extend(construct_one(base.as_ref(), &flow, &plan, &settings)?);
                        progress(&done, total);
                    }
                    Ok(result)
                })
            })
            .collect::<Vec<_>>();

        let mut some_error = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(part)) => etgs.extend(part),
                Ok(Err(e)) => {
                    error!("Generation task failed: {}", e);
                    some_error.get_or_insert(e);
                }
                Err(_) => {
                    error!("Generation worker panicked");
                    some_error.get_or_insert(GeneratorError::TaskFailed("worker panicked".into()));
                }
            }
        }
        if let Some(e) = some_error {
            return Err(e);
        }
    }

    info!("Generated {} ETGs for {} flows in {:?}", total, etgs.len(), start.elapsed());
    Ok(etgs)
}

/// Refine flow-specific process graphs into interface graphs. Each interface graph is built from
/// the customized process graph of its flow, so it inherits the flow endpoints and the failed
/// links. Flows sharing a process graph share the interface graph built from it.
pub fn generate_interface_etgs(
    etgs: &FlowEtgs<ProcessGraph>,
    settings: &Settings,
) -> Result<FlowEtgs<InterfaceGraph>, GeneratorError> {
    let start = Instant::now();
    let mut built: BTreeMap<*const ProcessGraph, Arc<InterfaceGraph>> = BTreeMap::new();
    let mut result = FlowEtgs::new();
    for (flow, processes) in etgs.iter() {
        let key = Arc::as_ptr(processes);
        let interfaces = match built.get(&key) {
            Some(g) => g.clone(),
            None => {
                let mut g = InterfaceGraph::new(processes)?;
                if settings.prune {
                    g.prune();
                }
                let g = Arc::new(g);
                built.insert(key, g.clone());
                g
            }
        };
        result.insert(flow.clone(), interfaces);
    }
    info!(
        "Refined {} process graphs into interface graphs in {:?}",
        built.len(),
        start.elapsed()
    );
    Ok(result)
}

/// ACLs blocking the flow on adjacency edges of the process graph, named `{device}.{acl}`.
fn blocking_acls(flow: &Flow, base: &ProcessGraph) -> Vec<String> {
    let net = base.network();
    let etg = base.etg();
    let mut acls = Vec::new();
    for e in etg.edge_ids() {
        let ((s, d), edge) = match (etg.edge_endpoints(e), etg.edge(e)) {
            (Some(ends), Some(edge)) => (ends, edge),
            _ => continue,
        };
        let leaving = etg.vertex(s).filter(|v| v.kind() == VertexKind::Out).and(edge.source_iface);
        let entering =
            etg.vertex(d).filter(|v| v.kind() == VertexKind::In).and(edge.destination_iface);
        let filters = [
            leaving.and_then(|i| net.interface(i).ok().map(|x| (i, x.outgoing_filter()))),
            entering.and_then(|i| net.interface(i).ok().map(|x| (i, x.incoming_filter()))),
        ];
        for (iface, filter) in filters.iter().flatten() {
            let (name, device) = match (filter, net.device(iface.device)) {
                (Some(name), Ok(device)) => (name, device),
                _ => continue,
            };
            if flow.is_blocked_by_filter(name, device) {
                acls.push(format!("{}.{}", device.name(), name));
            }
        }
    }
    acls
}

/// Group flows with the same source that are blocked by the same ACLs of the process graph. Such
/// flows are treated alike by the network.
pub fn group_flows(flows: &[Flow], base: &ProcessGraph) -> Vec<Vec<Flow>> {
    let mut groups: BTreeMap<(Option<PolicyGroup>, Vec<String>), Vec<Flow>> = BTreeMap::new();
    for flow in flows {
        let key = (flow.source.clone(), blocking_acls(flow, base));
        groups.entry(key).or_default().push(flow.clone());
    }
    debug!("{} flows condensable to {} groups", flows.len(), groups.len());
    groups.into_iter().map(|(_, flows)| flows).collect()
}
