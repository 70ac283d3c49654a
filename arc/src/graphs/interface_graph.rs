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

//! # Interface Graph
//!
//! Refines the process graph: every interface used by a routing process gets an `IN` and an `OUT`
//! vertex. Adjacency edges connect the two interfaces of the link they use, redistribution edges
//! connect every pair of interfaces of the two processes. When built from a customized process
//! graph, the edges of the flow endpoints are refined as well: the source connects to every
//! interface of the processes it reaches, and every interface of the processes reaching the
//! destination connects to the destination.

use super::edge::{DirectedEdge, EdgeKind};
use super::etg::{EdgeId, Etg, VertexId};
use super::process_graph::ProcessGraph;
use super::vertex::{Vertex, VertexKind};
use super::{GeneratorError, Link, TopologyGraph};
use crate::network::{IfaceId, Network, ProcId};
use crate::policy::PolicyGroup;
use log::*;
use std::sync::Arc;

#[derive(Debug)]
struct InterfaceBase {
    net: Arc<Network>,
    interfaces: Vec<IfaceId>,
}

/// # Interface Graph
#[derive(Debug, Clone)]
pub struct InterfaceGraph {
    etg: Etg<IfaceId>,
    base: Arc<InterfaceBase>,
}

impl InterfaceGraph {
    /// Build the interface graph from a process graph. If the process graph is customized, the new
    /// graph is customized for the same flow, and the endpoint edges of the process graph are
    /// mapped to the interfaces of their processes. An interface graph customized on its own only
    /// connects the endpoints to the interfaces inside the source and destination.
    pub fn new(processes: &ProcessGraph) -> Result<Self, GeneratorError> {
        let net = processes.network().clone();
        let mut etg = Etg::new();
        let mut interfaces = Vec::new();

        for process in net.processes() {
            for index in process.interfaces() {
                let id = IfaceId { device: process.id().device, index: *index };
                if interfaces.contains(&id) {
                    continue;
                }
                for kind in [VertexKind::In, VertexKind::Out].iter() {
                    etg.add_vertex(Vertex::new(iface_vertex_name(&net, id, *kind)?, *kind, id));
                }
                interfaces.push(id);
            }
        }

        let mut graph = Self { etg, base: Arc::new(InterfaceBase { net, interfaces }) };
        graph.construct_edges(processes)?;

        if let Some(flow) = processes.flow() {
            let sources: Vec<PolicyGroup> =
                processes.etg().source_vertices().keys().cloned().collect();
            graph.customize_sources(flow, &sources)?;
            graph.map_endpoint_edges(processes)?;
        }
        debug!(
            "Interface graph has {} vertices and {} edges",
            graph.etg.vertex_count(),
            graph.etg.edge_count()
        );
        Ok(graph)
    }

    /// The network the graph was built from
    pub fn network(&self) -> &Arc<Network> {
        &self.base.net
    }

    /// Interfaces used by some routing process
    pub fn interfaces(&self) -> &[IfaceId] {
        &self.base.interfaces
    }

    /// Vertex of an interface
    pub fn interface_vertex(&self, iface: IfaceId, kind: VertexKind) -> Option<VertexId> {
        let name = iface_vertex_name(&self.base.net, iface, kind).ok()?;
        self.etg.vertex_id(&name)
    }

    fn construct_edges(&mut self, processes: &ProcessGraph) -> Result<(), GeneratorError> {
        let net = self.base.net.clone();
        let process_etg = processes.etg();
        for e in process_etg.edge_ids() {
            let (edge, s, d) = match (process_etg.edge(e), process_etg.edge_endpoints(e)) {
                (Some(edge), Some((s, d))) => (edge, s, d),
                _ => continue,
            };
            let (s_proc, d_proc) = match (
                process_etg.vertex(s).and_then(|v| v.element()),
                process_etg.vertex(d).and_then(|v| v.element()),
            ) {
                (Some(a), Some(b)) => (a, b),
                // endpoint edges are rebuilt when customizing
                _ => continue,
            };

            match edge.kind {
                EdgeKind::InterDevice => {
                    let (src_iface, dst_iface) = match (edge.source_iface, edge.destination_iface) {
                        (Some(a), Some(b)) => (a, b),
                        _ => {
                            debug!(
                                "Edge {} -> {} has no interfaces",
                                process_etg.vertex_name(s),
                                process_etg.vertex_name(d)
                            );
                            continue;
                        }
                    };
                    let src = self.vertex(src_iface, VertexKind::Out)?;
                    let dst = self.vertex(dst_iface, VertexKind::In)?;
                    self.etg.add_edge_with_ifaces(
                        src,
                        dst,
                        edge.weight,
                        EdgeKind::InterDevice,
                        Some(src_iface),
                        Some(dst_iface),
                    );
                }
                EdgeKind::IntraDevice => {
                    let s_ifaces = net.process(s_proc)?.interfaces().to_vec();
                    let d_ifaces = net.process(d_proc)?.interfaces().to_vec();
                    for s_index in s_ifaces.iter() {
                        for d_index in d_ifaces.iter().filter(|i| *i != s_index) {
                            let src_iface = IfaceId { device: s_proc.device, index: *s_index };
                            let dst_iface = IfaceId { device: d_proc.device, index: *d_index };
                            let src = self.vertex(src_iface, VertexKind::In)?;
                            let dst = self.vertex(dst_iface, VertexKind::Out)?;
                            self.etg.add_edge_with_ifaces(
                                src,
                                dst,
                                edge.weight,
                                EdgeKind::IntraDevice,
                                Some(src_iface),
                                Some(dst_iface),
                            );
                        }
                    }
                }
                EdgeKind::InterInstance => {}
            }
        }
        Ok(())
    }

    fn map_endpoint_edges(&mut self, processes: &ProcessGraph) -> Result<(), GeneratorError> {
        let net = self.base.net.clone();
        let process_etg = processes.etg();
        let destination = self.etg.destination_vertex().ok_or(GeneratorError::NotCustomized)?;
        let process_destination = process_etg.destination_vertex();

        for e in process_etg.edge_ids() {
            let (edge, s, d) = match (process_etg.edge(e), process_etg.edge_endpoints(e)) {
                (Some(edge), Some((s, d))) => (edge, s, d),
                _ => continue,
            };
            let source = process_etg
                .source_vertices()
                .iter()
                .find(|(_, v)| **v == s)
                .and_then(|(group, _)| self.etg.source_vertex(group));

            match source {
                Some(source) if Some(d) == process_destination => {
                    self.add_endpoint_edge(source, destination, edge, None, None);
                }
                Some(source) => {
                    for iface in process_interfaces(&net, process_etg.vertex(d))? {
                        let vout = self.vertex(iface, VertexKind::Out)?;
                        self.add_endpoint_edge(source, vout, edge, None, Some(iface));
                    }
                }
                None if Some(d) == process_destination => {
                    for iface in process_interfaces(&net, process_etg.vertex(s))? {
                        let vin = self.vertex(iface, VertexKind::In)?;
                        self.add_endpoint_edge(vin, destination, edge, Some(iface), None);
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Add an endpoint edge mapped from the process graph, keeping its weight and whether it is
    /// blocked. Edges added by the interface layer itself take precedence.
    fn add_endpoint_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        mapped: &DirectedEdge,
        source_iface: Option<IfaceId>,
        destination_iface: Option<IfaceId>,
    ) {
        if self.etg.contains_edge(from, to) {
            return;
        }
        let e = self.etg.add_edge_with_ifaces(
            from,
            to,
            mapped.weight,
            EdgeKind::InterDevice,
            source_iface,
            destination_iface,
        );
        if let Some(edge) = self.etg.edge_mut(e) {
            edge.blocked = mapped.blocked;
        }
    }

    fn vertex(&self, iface: IfaceId, kind: VertexKind) -> Result<VertexId, GeneratorError> {
        let name = iface_vertex_name(&self.base.net, iface, kind)?;
        self.etg.vertex_id(&name).ok_or(GeneratorError::VertexNotFound(name))
    }

    fn block(&mut self, e: EdgeId, outgoing: bool) -> Result<(), GeneratorError> {
        let flow = self.etg.flow().cloned().ok_or(GeneratorError::NotCustomized)?;
        let net = self.base.net.clone();
        if let Some(edge) = self.etg.edge_mut(e) {
            if outgoing {
                edge.check_and_block_outgoing(&flow, &net)?;
            } else {
                edge.check_and_block_incoming(&flow, &net)?;
            }
        }
        Ok(())
    }
}

/// Interfaces of the process a vertex of the process graph stands for
fn process_interfaces(
    net: &Network,
    vertex: Option<&Vertex<ProcId>>,
) -> Result<Vec<IfaceId>, GeneratorError> {
    match vertex.and_then(|v| v.element()) {
        Some(pid) => Ok(net
            .process(pid)?
            .interfaces()
            .iter()
            .map(|index| IfaceId { device: pid.device, index: *index })
            .collect()),
        None => Ok(Vec::new()),
    }
}

fn iface_vertex_name(
    net: &Network,
    iface: IfaceId,
    kind: VertexKind,
) -> Result<String, GeneratorError> {
    let device = net.device(iface.device)?;
    let name = net.interface(iface)?.name();
    Ok(format!("{}.{}.{}", device.name(), name, kind))
}

impl TopologyGraph for InterfaceGraph {
    type Element = IfaceId;

    fn etg(&self) -> &Etg<IfaceId> {
        &self.etg
    }

    fn etg_mut(&mut self) -> &mut Etg<IfaceId> {
        &mut self.etg
    }

    fn construct_endpoint_edges(&mut self) -> Result<(), GeneratorError> {
        let flow = self.etg.flow().cloned().ok_or(GeneratorError::NotCustomized)?;
        let destination = self.etg.destination_vertex().ok_or(GeneratorError::NotCustomized)?;
        let sources: Vec<(PolicyGroup, VertexId)> =
            self.etg.source_vertices().iter().map(|(g, v)| (g.clone(), *v)).collect();
        let base = self.base.clone();

        for iface in base.interfaces.iter() {
            if !base.net.device(iface.device)?.is_external() {
                continue;
            }
            let vin = self.vertex(*iface, VertexKind::In)?;
            let vout = self.vertex(*iface, VertexKind::Out)?;
            for (group, source) in sources.iter() {
                if !group.is_internal() {
                    self.etg.add_edge(*source, vout, 0.0, EdgeKind::InterDevice);
                }
            }
            if !flow.destination.is_internal() {
                self.etg.add_edge(vin, destination, 0.0, EdgeKind::InterDevice);
            }
        }

        for iface in base.interfaces.iter() {
            let address = match base.net.interface(*iface)?.address() {
                Some(a) => a,
                None => continue,
            };
            let device = base.net.device(iface.device)?;

            if let Some((_, source)) = sources.iter().find(|(g, _)| g.contains_ip(address)) {
                if device.interface_inside(&flow.destination).is_some() {
                    if !self.etg.contains_edge(*source, destination) {
                        self.etg.add_edge(*source, destination, 0.0, EdgeKind::InterDevice);
                    }
                    continue;
                }
                let vout = self.vertex(*iface, VertexKind::Out)?;
                if !self.etg.contains_edge(*source, vout) {
                    let e = self.etg.add_edge_with_ifaces(
                        *source,
                        vout,
                        0.0,
                        EdgeKind::InterDevice,
                        None,
                        Some(*iface),
                    );
                    self.block(e, false)?;
                }
            } else if flow.destination.contains_ip(address) {
                let vin = self.vertex(*iface, VertexKind::In)?;
                if !self.etg.contains_edge(vin, destination) {
                    let e = self.etg.add_edge_with_ifaces(
                        vin,
                        destination,
                        0.0,
                        EdgeKind::InterDevice,
                        Some(*iface),
                        None,
                    );
                    self.block(e, true)?;
                }
            }
        }
        Ok(())
    }

    fn customize_edges(&mut self) -> Result<(), GeneratorError> {
        let base = self.base.clone();
        for iface in base.interfaces.iter() {
            if let Some(vout) = self.interface_vertex(*iface, VertexKind::Out) {
                for e in self.etg.outgoing_edges(vout) {
                    if self.etg.edge(e).map_or(false, |edge| edge.source_iface.is_some()) {
                        self.block(e, true)?;
                    }
                }
            }
            if let Some(vin) = self.interface_vertex(*iface, VertexKind::In) {
                for e in self.etg.incoming_edges(vin) {
                    if self.etg.edge(e).map_or(false, |edge| edge.destination_iface.is_some()) {
                        self.block(e, false)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_link(&mut self, link: &Link) {
        let net = self.base.net.clone();
        let etg = &self.etg;
        let device_name = |v: VertexId| -> Option<String> {
            let iface = etg.vertex(v)?.element()?;
            net.device(iface.device).ok().map(|d| d.name().to_string())
        };

        let to_remove: Vec<EdgeId> = etg
            .edge_ids()
            .into_iter()
            .filter(|e| {
                etg.edge_endpoints(*e)
                    .and_then(|(s, d)| Some((device_name(s)?, device_name(d)?)))
                    .map_or(false, |(a, b)| link.connects(&a, &b))
            })
            .collect();
        for e in to_remove {
            self.etg.remove_edge(e);
        }
    }
}
