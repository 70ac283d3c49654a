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

//! # Instance Graph
//!
//! A routing instance is a set of processes that exchange routes with each other, found as a
//! connected component of the process adjacency. The instance graph has one vertex per instance,
//! and an edge wherever a process edge crosses from one instance into another.

use super::edge::EdgeKind;
use super::etg::{Etg, VertexId};
use super::process_graph::ProcessGraph;
use super::vertex::{Vertex, VertexKind};
use super::{GeneratorError, Link, TopologyGraph};
use crate::network::{Network, ProcId, Protocol};
use crate::policy::PolicyGroup;
use itertools::Itertools;
use log::*;
use petgraph::algo::is_cyclic_directed;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Instance Identification (index into the list of instances)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub usize);

/// # Routing Instance
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    id: InstanceId,
    name: String,
    protocol: Protocol,
    processes: Vec<ProcId>,
    max_edge_weight: f64,
}

impl Instance {
    fn new(id: InstanceId, processes: Vec<ProcId>, net: &Network) -> Result<Self, GeneratorError> {
        let mut protocol = None;
        let mut pids: Vec<u32> = Vec::new();
        let mut static_name = None;
        let mut max_edge_weight: f64 = 0.0;
        for pid in processes.iter() {
            let process = net.process(*pid)?;
            let device = net.device(pid.device)?;
            protocol.get_or_insert(process.protocol());
            match process.protocol() {
                Protocol::Ospf => {
                    pids.push(process.pid());
                    max_edge_weight = process
                        .interfaces()
                        .iter()
                        .filter_map(|i| device.interface(*i).and_then(|iface| iface.ospf_cost()))
                        .fold(max_edge_weight, f64::max);
                }
                Protocol::Bgp => {
                    pids.push(process.pid());
                    max_edge_weight = max_edge_weight.max(1.0);
                }
                _ => {
                    if let Some(network) = process.static_network() {
                        static_name = Some(format!("{}.{}", device.name(), network));
                    }
                }
            }
        }
        let protocol = protocol.unwrap_or(Protocol::Static);
        let name = match protocol {
            Protocol::Ospf | Protocol::Bgp => {
                format!("{}.{}", protocol, pids.iter().unique().join("/"))
            }
            _ => format!("{}.{}", protocol, static_name.unwrap_or_default()),
        };
        Ok(Self { id, name, protocol, processes, max_edge_weight })
    }

    /// Identifier of the instance
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Name of the instance, unique within the network
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Protocol of the first process of the instance
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Processes forming the instance
    pub fn processes(&self) -> &[ProcId] {
        &self.processes
    }

    /// Largest weight of an edge inside the instance: the highest OSPF cost of an interface, or 1
    /// for BGP.
    pub fn max_edge_weight(&self) -> f64 {
        self.max_edge_weight
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug)]
struct InstanceBase {
    instances: Vec<Instance>,
    process_instance: BTreeMap<ProcId, InstanceId>,
    generating_edges: BTreeMap<(InstanceId, InstanceId), Vec<(String, String)>>,
}

/// Processes attached to the flow endpoints in a customized process graph
#[derive(Debug, Default)]
struct Endpoints {
    sources: BTreeMap<PolicyGroup, Vec<ProcId>>,
    destination: Vec<ProcId>,
}

/// # Instance Graph
///
/// Built together with the [`ProcessGraph`], which uses it to weight redistribution edges. To get
/// an instance graph for a flow, customize it from a customized process graph using
/// [`InstanceGraph::customize_from`].
#[derive(Debug, Clone)]
pub struct InstanceGraph {
    etg: Etg<InstanceId>,
    base: Arc<InstanceBase>,
    endpoints: Option<Arc<Endpoints>>,
}

impl InstanceGraph {
    pub(super) fn new(
        net: &Network,
        processes: &Etg<ProcId>,
        adjacency: &BTreeMap<ProcId, Vec<ProcId>>,
    ) -> Result<Self, GeneratorError> {
        let mut etg = Etg::new();
        let mut instances: Vec<Instance> = Vec::new();
        let mut process_instance = BTreeMap::new();
        let mut names: HashSet<String> = HashSet::new();

        for process in net.processes() {
            if process_instance.contains_key(&process.id()) {
                continue;
            }
            let mut component = Vec::new();
            visit(process.id(), adjacency, &process_instance, &mut component);

            let id = InstanceId(instances.len());
            let mut instance = Instance::new(id, component, net)?;
            if !names.insert(instance.name.clone()) {
                let mut suffix = 2;
                while names.contains(&format!("{}~{}", instance.name, suffix)) {
                    suffix += 1;
                }
                instance.name = format!("{}~{}", instance.name, suffix);
                names.insert(instance.name.clone());
            }
            for pid in instance.processes() {
                process_instance.insert(*pid, id);
            }
            etg.add_vertex(Vertex::new(instance.name(), VertexKind::Normal, id));
            instances.push(instance);
        }

        let mut generating_edges: BTreeMap<_, Vec<(String, String)>> = BTreeMap::new();
        for e in processes.edge_ids() {
            let (s, d) = match processes.edge_endpoints(e) {
                Some(x) => x,
                None => continue,
            };
            let (s_proc, d_proc) = match (
                processes.vertex(s).and_then(|v| v.element()),
                processes.vertex(d).and_then(|v| v.element()),
            ) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let instances_of = (process_instance.get(&s_proc), process_instance.get(&d_proc));
            let (s_inst, d_inst) = match instances_of {
                (Some(a), Some(b)) if a != b => (*a, *b),
                _ => continue,
            };
            let s_vertex = instance_vertex(&etg, &instances[s_inst.0])?;
            let d_vertex = instance_vertex(&etg, &instances[d_inst.0])?;
            if !etg.contains_edge(s_vertex, d_vertex) {
                let weight = processes.edge(e).map_or(0.0, |edge| edge.weight);
                etg.add_edge(s_vertex, d_vertex, weight, EdgeKind::InterInstance);
            }
            generating_edges.entry((s_inst, d_inst)).or_default().push((
                processes.vertex_name(s).to_string(),
                processes.vertex_name(d).to_string(),
            ));
        }

        debug!("Found {} routing instances", instances.len());
        Ok(Self {
            etg,
            base: Arc::new(InstanceBase { instances, process_instance, generating_edges }),
            endpoints: None,
        })
    }

    /// All routing instances
    pub fn instances(&self) -> &[Instance] {
        &self.base.instances
    }

    /// Instance with the given id
    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.base.instances.get(id.0)
    }

    /// Instance a process belongs to
    pub fn instance_of(&self, process: ProcId) -> Option<&Instance> {
        self.base.process_instance.get(&process).and_then(|id| self.instance(*id))
    }

    /// Vertex of an instance
    pub fn vertex_of(&self, id: InstanceId) -> Option<VertexId> {
        self.instance(id).and_then(|i| self.etg.vertex_id(i.name()))
    }

    /// Weight of the edge between two instances, if there is one.
    pub fn instance_edge_weight(&self, source: InstanceId, destination: InstanceId) -> Option<f64> {
        self.etg.edge_weight(self.vertex_of(source)?, self.vertex_of(destination)?)
    }

    /// Instances with an edge into the given instance
    pub fn parents(&self, id: InstanceId) -> Vec<InstanceId> {
        let vertex = match self.vertex_of(id) {
            Some(v) => v,
            None => return Vec::new(),
        };
        self.etg
            .incoming_edges(vertex)
            .into_iter()
            .filter_map(|e| self.etg.edge_endpoints(e))
            .filter_map(|(s, _)| self.etg.vertex(s).and_then(|v| v.element()))
            .collect()
    }

    /// Process edges (by vertex names) that caused the edge between two instances
    pub fn generating_edges(
        &self,
        source: InstanceId,
        destination: InstanceId,
    ) -> &[(String, String)] {
        self.base
            .generating_edges
            .get(&(source, destination))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if the redistribution between instances forms a cycle.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(self.etg.graph())
    }

    /// Number of instances of the given protocol
    pub fn number_of_type(&self, protocol: Protocol) -> usize {
        self.base.instances.iter().filter(|i| i.protocol == protocol).count()
    }

    /// Customize the graph for the flow of a customized process graph. The endpoint edges connect
    /// to the instances of the processes that the process graph connects its endpoints to.
    pub fn customize_from(&mut self, processes: &ProcessGraph) -> Result<bool, GeneratorError> {
        let process_etg = processes.etg();
        let flow = process_etg.flow().cloned().ok_or(GeneratorError::NotCustomized)?;

        let mut endpoints = Endpoints::default();
        for (group, source) in process_etg.source_vertices() {
            let attached = process_etg
                .outgoing_edges(*source)
                .into_iter()
                .filter_map(|e| process_etg.edge_endpoints(e))
                .filter_map(|(_, d)| process_etg.vertex(d).and_then(|v| v.element()))
                .collect();
            endpoints.sources.insert(group.clone(), attached);
        }
        if let Some(destination) = process_etg.destination_vertex() {
            endpoints.destination = process_etg
                .incoming_edges(destination)
                .into_iter()
                .filter_map(|e| process_etg.edge_endpoints(e))
                .filter_map(|(s, _)| process_etg.vertex(s).and_then(|v| v.element()))
                .collect();
        }
        self.endpoints = Some(Arc::new(endpoints));

        let sources: Vec<PolicyGroup> = process_etg.source_vertices().keys().cloned().collect();
        self.customize_sources(&flow, &sources)
    }
}

/// Collect the component reachable from `root` over the adjacency, skipping processes assigned to
/// an earlier component.
fn visit(
    root: ProcId,
    adjacency: &BTreeMap<ProcId, Vec<ProcId>>,
    assigned: &BTreeMap<ProcId, InstanceId>,
    component: &mut Vec<ProcId>,
) {
    component.push(root);
    for neighbor in adjacency.get(&root).into_iter().flatten() {
        if !assigned.contains_key(neighbor) && !component.contains(neighbor) {
            visit(*neighbor, adjacency, assigned, component);
        }
    }
}

fn instance_vertex(etg: &Etg<InstanceId>, instance: &Instance) -> Result<VertexId, GeneratorError> {
    etg.vertex_id(instance.name())
        .ok_or_else(|| GeneratorError::VertexNotFound(instance.name().to_string()))
}

impl TopologyGraph for InstanceGraph {
    type Element = InstanceId;

    fn etg(&self) -> &Etg<InstanceId> {
        &self.etg
    }

    fn etg_mut(&mut self) -> &mut Etg<InstanceId> {
        &mut self.etg
    }

    fn construct_endpoint_edges(&mut self) -> Result<(), GeneratorError> {
        let endpoints = match self.endpoints.clone() {
            Some(e) => e,
            None => {
                debug!("Instance graph customized without a process graph, no endpoint edges");
                return Ok(());
            }
        };
        let destination = self.etg.destination_vertex().ok_or(GeneratorError::NotCustomized)?;

        for (group, processes) in endpoints.sources.iter() {
            let source = match self.etg.source_vertex(group) {
                Some(s) => s,
                None => continue,
            };
            for pid in processes {
                if let Some(vertex) = self.instance_of(*pid).and_then(|i| self.vertex_of(i.id())) {
                    self.etg.add_edge(source, vertex, 1.0, EdgeKind::InterInstance);
                }
            }
        }
        for pid in endpoints.destination.iter() {
            if let Some(vertex) = self.instance_of(*pid).and_then(|i| self.vertex_of(i.id())) {
                self.etg.add_edge(vertex, destination, 1.0, EdgeKind::InterInstance);
            }
        }
        Ok(())
    }

    /// Filters are already accounted for in the process graph.
    fn customize_edges(&mut self) -> Result<(), GeneratorError> {
        Ok(())
    }

    /// Instances do not map to physical links; failures are evaluated on the process graph.
    fn remove_link(&mut self, _link: &Link) {}
}
