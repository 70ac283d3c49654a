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

//! # Process Graph
//!
//! Every routing process gets an `IN` and an `OUT` vertex. Edges `OUT -> IN` between devices model
//! routing adjacencies (traffic flows opposite to route advertisements), edges `IN -> OUT` inside a
//! device model route redistribution. Edge weights are chosen such that shortest paths follow the
//! routing decisions: redistribution edges are weighted by the administrative distance of the
//! redistributing process, and if the redistribution between instances is acyclic, weights are
//! scaled such that a path never prefers a lower ranked instance.

use super::device_graph::DeviceGraph;
use super::edge::{EdgeKind, INFINITE_WEIGHT};
use super::etg::{EdgeId, Etg, VertexId};
use super::instance_graph::{InstanceGraph, InstanceId};
use super::vertex::{Vertex, VertexKind};
use super::{assumption_violated, GeneratorError, Link, TopologyGraph};
use crate::network::{Device, DeviceId, IfaceId, Network, ProcId, Process, Protocol};
use crate::policy::{Flow, PolicyGroup};
use crate::settings::Settings;
use log::*;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Name of the vertex of a process
pub(crate) fn process_vertex_name(process: &Process, kind: VertexKind) -> String {
    format!("{}.{}", process.name(), kind)
}

#[derive(Debug)]
struct ProcessBase {
    net: Arc<Network>,
    devices: DeviceGraph,
    interfaces_by_address: BTreeMap<Ipv4Addr, BTreeMap<DeviceId, IfaceId>>,
    bgp_with_outside_peers: Vec<ProcId>,
    max_igp_cost: f64,
    internal_ases: BTreeSet<u32>,
    adjacency: BTreeMap<ProcId, Vec<ProcId>>,
    instances: InstanceGraph,
}

/// # Process Graph
///
/// Cloning the graph copies the vertices and edges only; the device graph, the instance graph and
/// the lookup tables built during construction are shared.
#[derive(Debug, Clone)]
pub struct ProcessGraph {
    etg: Etg<ProcId>,
    base: Arc<ProcessBase>,
}

/// State used while adding the edges of a new process graph
struct Builder<'a> {
    net: &'a Network,
    devices: &'a DeviceGraph,
    settings: &'a Settings,
    etg: Etg<ProcId>,
    bgp_with_outside_peers: Vec<ProcId>,
    adjacency: BTreeMap<ProcId, Vec<ProcId>>,
}

impl ProcessGraph {
    /// Build the process graph on top of a device graph.
    pub fn new(devices: &DeviceGraph, settings: &Settings) -> Result<Self, GeneratorError> {
        let net = devices.network().clone();

        let mut interfaces_by_address: BTreeMap<Ipv4Addr, BTreeMap<DeviceId, IfaceId>> =
            BTreeMap::new();
        let mut internal_ases = BTreeSet::new();
        let mut max_igp_cost: f64 = 0.0;
        let mut etg = Etg::new();
        for device in net.devices() {
            for iface in device.interfaces() {
                if let Some(address) = iface.address() {
                    let on_address = interfaces_by_address.entry(address).or_default();
                    if on_address.insert(device.id(), iface.id()).is_some() {
                        return Err(GeneratorError::DuplicateAddress(
                            device.name().to_string(),
                            address,
                        ));
                    }
                }
            }
            for process in device.processes() {
                match process.protocol() {
                    Protocol::Bgp => {
                        internal_ases.insert(process.pid());
                    }
                    Protocol::Ospf => {
                        max_igp_cost = process
                            .interfaces()
                            .iter()
                            .filter_map(|i| device.interface(*i).and_then(|x| x.ospf_cost()))
                            .fold(max_igp_cost, f64::max);
                    }
                    _ => {}
                }
                for kind in [VertexKind::In, VertexKind::Out].iter() {
                    etg.add_vertex(Vertex::new(
                        process_vertex_name(process, *kind),
                        *kind,
                        process.id(),
                    ));
                }
            }
        }

        let mut builder = Builder {
            net: &net,
            devices,
            settings,
            etg,
            bgp_with_outside_peers: Vec::new(),
            adjacency: BTreeMap::new(),
        };
        for device in net.devices() {
            for process in device.processes() {
                match process.protocol() {
                    Protocol::Bgp => builder.bgp_edges(device, process)?,
                    Protocol::Ospf => builder.ospf_edges(device, process)?,
                    Protocol::Static => builder.static_edges(device, process)?,
                    Protocol::Connected => {}
                }
            }
        }
        for device in net.devices() {
            builder.redistribution_edges(device)?;
        }

        let instances = InstanceGraph::new(&net, &builder.etg, &builder.adjacency)?;
        for device in net.devices() {
            builder.adjust_redistribution_weights(device, &instances)?;
        }
        if instances.has_cycles() {
            info!("Route redistribution between instances is cyclic, weights are not scaled");
        } else {
            builder.scale_weights(&instances)?;
        }

        let Builder { etg, bgp_with_outside_peers, adjacency, .. } = builder;
        info!(
            "Process graph has {} vertices, {} edges and {} instances",
            etg.vertex_count(),
            etg.edge_count(),
            instances.instances().len()
        );
        Ok(Self {
            etg,
            base: Arc::new(ProcessBase {
                net: net.clone(),
                devices: devices.clone(),
                interfaces_by_address,
                bgp_with_outside_peers,
                max_igp_cost,
                internal_ases,
                adjacency,
                instances,
            }),
        })
    }

    /// The network the graph was built from
    pub fn network(&self) -> &Arc<Network> {
        &self.base.net
    }

    /// The device graph the graph was built on
    pub fn device_graph(&self) -> &DeviceGraph {
        &self.base.devices
    }

    /// The instance graph built together with this graph, not customized for any flow.
    pub fn instance_graph(&self) -> &InstanceGraph {
        &self.base.instances
    }

    /// Instance graph customized for the same flow as this graph.
    pub fn customized_instance_graph(&self) -> Result<InstanceGraph, GeneratorError> {
        let mut instances = self.base.instances.clone();
        instances.customize_from(self)?;
        Ok(instances)
    }

    /// Processes that exchange routes with the given process
    pub fn adjacent_processes(&self, process: ProcId) -> &[ProcId] {
        self.base.adjacency.get(&process).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// BGP processes with a peer outside the network
    pub fn bgp_with_outside_peers(&self) -> &[ProcId] {
        &self.base.bgp_with_outside_peers
    }

    /// Internal AS numbers
    pub fn internal_ases(&self) -> &BTreeSet<u32> {
        &self.base.internal_ases
    }

    /// Highest OSPF cost of any interface in the network
    pub fn max_igp_cost(&self) -> f64 {
        self.base.max_igp_cost
    }

    /// Upper bound on the cost of a path through the network: the highest IGP cost, times the
    /// number of devices, times the number of internal ASes.
    pub fn max_network_path_weight(&self) -> f64 {
        self.base.max_igp_cost
            * self.base.net.devices().len() as f64
            * self.base.internal_ases.len() as f64
    }

    /// Number of processes of the given protocol
    pub fn number_of_type(&self, protocol: Protocol) -> usize {
        self.base.net.processes().filter(|p| p.protocol() == protocol).count()
    }

    /// Vertex of a process, if it is still in the graph.
    pub fn process_vertex(&self, process: ProcId, kind: VertexKind) -> Option<VertexId> {
        let process = self.base.net.process(process).ok()?;
        self.etg.vertex_id(&process_vertex_name(process, kind))
    }

    fn source_endpoint_edges(
        &mut self,
        flow: &Flow,
        group: &PolicyGroup,
        source: VertexId,
        destination: VertexId,
    ) -> Result<(), GeneratorError> {
        let base = self.base.clone();
        let check = !flow.has_wildcard_source();

        if !group.is_internal() {
            for pid in base.bgp_with_outside_peers.iter() {
                if let Some(out) = self.process_vertex(*pid, VertexKind::Out) {
                    self.etg.add_edge(source, out, 0.0, EdgeKind::InterDevice);
                }
            }
        }

        let path_weight = self.max_network_path_weight();
        for (address, on_devices) in base.interfaces_by_address.iter() {
            if !group.contains_ip(*address) {
                continue;
            }
            for (device, iface) in on_devices.iter() {
                let device = base.net.device(*device)?;
                let destination_iface = device.interface_inside(&flow.destination).map(|i| i.id());

                for (multiplier, process) in device.processes().iter().enumerate() {
                    let name = process_vertex_name(process, VertexKind::Out);
                    let out = match self.etg.vertex_id(&name) {
                        Some(v) => v,
                        None => continue,
                    };
                    if !self.etg.contains_edge(source, out) {
                        let e = self.etg.add_edge_with_ifaces(
                            source,
                            out,
                            multiplier as f64 * path_weight,
                            EdgeKind::IntraDevice,
                            None,
                            Some(*iface),
                        );
                        if check {
                            self.block_incoming(e, flow)?;
                        }
                    }

                    if let Some(destination_iface) = destination_iface {
                        if !self.etg.contains_edge(out, destination) {
                            let e = self.etg.add_edge_with_ifaces(
                                out,
                                destination,
                                0.0,
                                EdgeKind::InterDevice,
                                Some(destination_iface),
                                None,
                            );
                            if check {
                                self.block_outgoing(e, flow)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn destination_endpoint_edges(
        &mut self,
        flow: &Flow,
        destination: VertexId,
    ) -> Result<(), GeneratorError> {
        let base = self.base.clone();
        let check = !flow.has_wildcard_source();

        if !flow.destination.is_internal() {
            for pid in base.bgp_with_outside_peers.iter() {
                if let Some(vin) = self.process_vertex(*pid, VertexKind::In) {
                    self.etg.add_edge(vin, destination, 0.0, EdgeKind::InterDevice);
                }
            }
        }

        for (address, on_devices) in base.interfaces_by_address.iter() {
            if !flow.destination.contains_ip(*address) {
                continue;
            }
            for (device, iface) in on_devices.iter() {
                let device = base.net.device(*device)?;
                for process in device.processes() {
                    if !process.advertises(&flow.destination, device) {
                        continue;
                    }
                    let name = process_vertex_name(process, VertexKind::In);
                    let vin = match self.etg.vertex_id(&name) {
                        Some(v) => v,
                        None => continue,
                    };
                    if !self.etg.contains_edge(vin, destination) {
                        let e = self.etg.add_edge_with_ifaces(
                            vin,
                            destination,
                            0.0,
                            EdgeKind::IntraDevice,
                            Some(*iface),
                            None,
                        );
                        if check {
                            self.block_outgoing(e, flow)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn block_outgoing(&mut self, e: EdgeId, flow: &Flow) -> Result<(), GeneratorError> {
        let net = self.base.net.clone();
        if let Some(edge) = self.etg.edge_mut(e) {
            edge.check_and_block_outgoing(flow, &net)?;
        }
        Ok(())
    }

    fn block_incoming(&mut self, e: EdgeId, flow: &Flow) -> Result<(), GeneratorError> {
        let net = self.base.net.clone();
        if let Some(edge) = self.etg.edge_mut(e) {
            edge.check_and_block_incoming(flow, &net)?;
        }
        Ok(())
    }
}

impl<'a> Builder<'a> {
    fn vertex(&self, process: &Process, kind: VertexKind) -> Result<VertexId, GeneratorError> {
        let name = process_vertex_name(process, kind);
        self.etg.vertex_id(&name).ok_or(GeneratorError::VertexNotFound(name))
    }

    fn mark_adjacent(&mut self, local: ProcId, remote: ProcId) {
        let neighbors = self.adjacency.entry(local).or_default();
        if !neighbors.contains(&remote) {
            neighbors.push(remote);
        }
    }

    fn connect(
        &mut self,
        local: &Process,
        remote: &Process,
        weight: f64,
        local_iface: IfaceId,
        remote_iface: IfaceId,
    ) -> Result<(), GeneratorError> {
        let src = self.vertex(local, VertexKind::Out)?;
        let dst = self.vertex(remote, VertexKind::In)?;
        self.etg.add_edge_with_ifaces(
            src,
            dst,
            weight,
            EdgeKind::InterDevice,
            Some(local_iface),
            Some(remote_iface),
        );
        self.mark_adjacent(local.id(), remote.id());
        Ok(())
    }

    fn bgp_edges(&mut self, device: &Device, local: &Process) -> Result<(), GeneratorError> {
        for peer in local.bgp_neighbors() {
            let local_iface = match local.interface_to_reach(device, *peer) {
                Some(index) => IfaceId { device: device.id(), index },
                None => {
                    warn!("{} has no interface to reach BGP peer {}", device.name(), peer);
                    continue;
                }
            };

            let remote_iface = match self.devices.connected_interface(local_iface) {
                Some(r) => r,
                None => {
                    if !self.bgp_with_outside_peers.contains(&local.id()) {
                        self.bgp_with_outside_peers.push(local.id());
                    }
                    continue;
                }
            };

            let local_address = self.net.interface(local_iface)?.address();
            let remote_device = self.net.device(remote_iface.device)?;
            let remote = remote_device
                .processes()
                .iter()
                .filter(|p| p.protocol() == Protocol::Bgp)
                .filter(|p| local_address.map_or(false, |a| p.bgp_neighbors().contains(&a)))
                .last();
            match remote {
                Some(remote) => self.connect(local, remote, 1.0, local_iface, remote_iface)?,
                None => assumption_violated(
                    self.settings,
                    format!(
                        "{} does not have a BGP process associated with process {}",
                        remote_device.name(),
                        local.name()
                    ),
                )?,
            }
        }
        Ok(())
    }

    fn ospf_edges(&mut self, device: &Device, local: &Process) -> Result<(), GeneratorError> {
        for index in local.interfaces() {
            let local_iface = IfaceId { device: device.id(), index: *index };
            let iface = self.net.interface(local_iface)?;
            debug!("{}:{} participates in {}", device.name(), iface.name(), local.name());
            let weight = iface.ospf_cost().unwrap_or(0.0);

            let remote_iface = match self.devices.connected_interface(local_iface) {
                Some(r) => r,
                None => {
                    warn!(
                        "No interface connected to {}:{} which is used by process {}",
                        device.name(),
                        iface.name(),
                        local.name()
                    );
                    continue;
                }
            };

            let remote_device = self.net.device(remote_iface.device)?;
            for remote in remote_device.processes() {
                if remote.protocol() == Protocol::Ospf
                    && remote.interfaces().contains(&remote_iface.index)
                {
                    self.connect(local, remote, weight, local_iface, remote_iface)?;
                    debug!("{} is adjacent to {}", remote.name(), local.name());
                }
            }
        }
        Ok(())
    }

    fn static_edges(&mut self, device: &Device, local: &Process) -> Result<(), GeneratorError> {
        for index in local.interfaces() {
            let local_iface = IfaceId { device: device.id(), index: *index };
            let remote_iface = match self.devices.connected_interface(local_iface) {
                Some(r) => r,
                None => {
                    warn!(
                        "No interface connected to {}:{} which is used by process {}",
                        device.name(),
                        self.net.interface(local_iface)?.name(),
                        local.name()
                    );
                    continue;
                }
            };
            for remote in self.net.device(remote_iface.device)?.processes() {
                self.connect(local, remote, 0.0, local_iface, remote_iface)?;
            }
        }
        Ok(())
    }

    /// Processes of a device, most preferred first
    fn by_preference(device: &Device) -> Vec<&Process> {
        let mut processes: Vec<&Process> = device.processes().iter().collect();
        processes.sort_by(|a, b| a.cmp_preference(b));
        processes
    }

    fn redistribution_edges(&mut self, device: &Device) -> Result<(), GeneratorError> {
        let processes = Self::by_preference(device);
        for redistributor in processes.iter() {
            for redistributee in processes.iter() {
                let weight = if redistributor.id() == redistributee.id() {
                    0.0
                } else if redistributee.protocol() == Protocol::Static {
                    continue;
                } else {
                    match redistributee.redistribution(redistributor.protocol()) {
                        Some(policy) => policy.metric.unwrap_or(0.0),
                        None => continue,
                    }
                };
                // traffic flows opposite to the redistributed routes
                let src = self.vertex(redistributee, VertexKind::In)?;
                let dst = self.vertex(redistributor, VertexKind::Out)?;
                self.etg.add_edge(src, dst, weight, EdgeKind::IntraDevice);
            }
        }
        Ok(())
    }

    fn adjust_redistribution_weights(
        &mut self,
        device: &Device,
        instances: &InstanceGraph,
    ) -> Result<(), GeneratorError> {
        let processes = Self::by_preference(device);
        for (priority, redistributor) in processes.iter().enumerate() {
            for redistributee in processes.iter() {
                let src = self.vertex(redistributee, VertexKind::In)?;
                let dst = self.vertex(redistributor, VertexKind::Out)?;
                let existing = match self.etg.edge_weight(src, dst) {
                    Some(w) => w,
                    None => continue,
                };

                let source_instance = instances
                    .instance_of(redistributee.id())
                    .ok_or_else(|| GeneratorError::VertexNotFound(redistributee.name().into()))?;
                let target_instance = instances
                    .instance_of(redistributor.id())
                    .ok_or_else(|| GeneratorError::VertexNotFound(redistributor.name().into()))?;

                let mut weight = source_instance.max_edge_weight();
                if let Some(w) =
                    instances.instance_edge_weight(source_instance.id(), target_instance.id())
                {
                    weight = weight.max(w);
                }
                weight *= source_instance.processes().len() as f64;
                if weight == 0.0 {
                    weight = 1.0;
                }
                weight *= priority as f64;
                weight += existing;
                self.etg.set_edge_weight(src, dst, weight);
            }
        }
        Ok(())
    }

    fn scale_weights(&mut self, instances: &InstanceGraph) -> Result<(), GeneratorError> {
        let factor = 10f64.powi(instances.instances().len() as i32);
        for e in self.etg.edge_ids() {
            if let Some(edge) = self.etg.edge_mut(e) {
                edge.weight *= factor;
            }
        }

        let mut unvisited: Vec<InstanceId> = instances.instances().iter().map(|i| i.id()).collect();
        while let Some(next) = unvisited.first().copied() {
            self.scale_instance(instances, next, &mut unvisited)?;
        }
        Ok(())
    }

    /// Scale the weights inside an instance below the smallest weight difference within its
    /// parents, after scaling the parents.
    fn scale_instance(
        &mut self,
        instances: &InstanceGraph,
        instance: InstanceId,
        unvisited: &mut Vec<InstanceId>,
    ) -> Result<(), GeneratorError> {
        unvisited.retain(|i| *i != instance);

        let parents = instances.parents(instance);
        if parents.is_empty() {
            return Ok(());
        }
        for parent in parents.iter() {
            if unvisited.contains(parent) {
                self.scale_instance(instances, *parent, unvisited)?;
            }
        }

        let edges = self.instance_edges(instances, instance)?;
        let instance_max: f64 =
            edges.iter().filter_map(|e| self.etg.edge(*e)).map(|e| e.weight).sum();
        let mut min_gap = INFINITE_WEIGHT;
        for parent in parents.iter() {
            min_gap = min_gap.min(self.minimum_weight_gap(instances, *parent)?);
        }
        let scale = min_gap / instance_max;

        let name = instances.instance(instance).map(|i| i.name()).unwrap_or("?");
        info!("{} minGap {} instanceMax {} scale {}", name, min_gap, instance_max, scale);
        if instance_max < min_gap {
            return Ok(());
        }
        for e in edges {
            if let Some(edge) = self.etg.edge_mut(e) {
                edge.weight *= scale;
            }
        }
        Ok(())
    }

    /// Edges leaving the vertices of the processes of an instance
    fn instance_edges(
        &self,
        instances: &InstanceGraph,
        instance: InstanceId,
    ) -> Result<Vec<EdgeId>, GeneratorError> {
        let mut edges = Vec::new();
        let processes = instances.instance(instance).map(|i| i.processes()).unwrap_or(&[]);
        for pid in processes {
            let process = self.net.process(*pid)?;
            for kind in [VertexKind::In, VertexKind::Out].iter() {
                edges.extend(self.etg.outgoing_edges(self.vertex(process, *kind)?));
            }
        }
        Ok(edges)
    }

    /// Smallest difference between two distinct edge weights in an instance, counting zero as a
    /// weight. Infinite if all weights are zero.
    fn minimum_weight_gap(
        &self,
        instances: &InstanceGraph,
        instance: InstanceId,
    ) -> Result<f64, GeneratorError> {
        let mut weights: Vec<f64> = vec![0.0];
        weights.extend(
            self.instance_edges(instances, instance)?
                .into_iter()
                .filter_map(|e| self.etg.edge(e))
                .map(|e| e.weight),
        );
        weights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        weights.dedup();
        Ok(weights.windows(2).map(|w| w[1] - w[0]).fold(INFINITE_WEIGHT, f64::min))
    }
}

impl TopologyGraph for ProcessGraph {
    type Element = ProcId;

    fn etg(&self) -> &Etg<ProcId> {
        &self.etg
    }

    fn etg_mut(&mut self) -> &mut Etg<ProcId> {
        &mut self.etg
    }

    fn construct_endpoint_edges(&mut self) -> Result<(), GeneratorError> {
        let flow = self.etg.flow().cloned().ok_or(GeneratorError::NotCustomized)?;
        let destination = self.etg.destination_vertex().ok_or(GeneratorError::NotCustomized)?;
        let sources: Vec<(PolicyGroup, VertexId)> =
            self.etg.source_vertices().iter().map(|(g, v)| (g.clone(), *v)).collect();
        for (group, source) in sources {
            self.source_endpoint_edges(&flow, &group, source, destination)?;
        }
        self.destination_endpoint_edges(&flow, destination)
    }

    fn customize_edges(&mut self) -> Result<(), GeneratorError> {
        let flow = self.etg.flow().cloned().ok_or(GeneratorError::NotCustomized)?;
        let net = self.base.net.clone();
        for process in net.processes() {
            let vin = self.etg.vertex_id(&process_vertex_name(process, VertexKind::In));
            let vout = self.etg.vertex_id(&process_vertex_name(process, VertexKind::Out));

            // a static route only matters for the destinations it covers
            if let Some(network) = process.static_network() {
                if !flow.destination.intersects(&PolicyGroup::from_prefix(&network, true)) {
                    for v in vin.into_iter().chain(vout) {
                        self.etg.remove_vertex(v);
                    }
                    continue;
                }
            }

            if let Some(vout) = vout {
                for e in self.etg.outgoing_edges(vout) {
                    self.block_outgoing(e, &flow)?;
                }
            }
            if let Some(vin) = vin {
                for e in self.etg.incoming_edges(vin) {
                    self.block_incoming(e, &flow)?;
                }
            }
        }
        Ok(())
    }

    fn remove_link(&mut self, link: &Link) {
        let net = self.base.net.clone();
        let etg = &self.etg;
        let device_name = |v: VertexId| -> Option<String> {
            let pid = etg.vertex(v)?.element()?;
            net.device(pid.device).ok().map(|d| d.name().to_string())
        };

        let mut to_remove = Vec::new();
        for e in self.etg.edge_ids() {
            let (s, d) = match self.etg.edge_endpoints(e) {
                Some(x) => x,
                None => continue,
            };
            let (s_kind, d_kind) = match (self.etg.vertex(s), self.etg.vertex(d)) {
                (Some(a), Some(b)) => (a.kind(), b.kind()),
                _ => continue,
            };
            if s_kind == VertexKind::Source
                || d_kind == VertexKind::Destination
                || (s_kind == VertexKind::In && d_kind == VertexKind::Out)
            {
                continue;
            }
            if let (Some(a), Some(b)) = (device_name(s), device_name(d)) {
                if link.connects(&a, &b) {
                    to_remove.push(e);
                }
            }
        }
        for e in to_remove {
            self.etg.remove_edge(e);
        }
    }
}
