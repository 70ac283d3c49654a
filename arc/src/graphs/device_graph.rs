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

//! # Device Graph
//!
//! One vertex per device, one edge per physical link. Links are discovered either from shared
//! subnets, or from interface descriptions of the form `INFRA:...:<device>:<interface>`.

use super::edge::EdgeKind;
use super::etg::{Etg, VertexId};
use super::vertex::{Vertex, VertexKind};
use super::{GeneratorError, Link, TopologyGraph};
use crate::network::{DeviceId, IfaceId, InterfaceType, Network, Prefix, PORT_CHANNEL_PREFIX};
use crate::settings::Settings;
use lazy_static::lazy_static;
use log::*;
use regex::Regex;
use std::sync::Arc;

lazy_static! {
    /// Abbreviations of interface names used in descriptions, with their full name prefix.
    static ref IFACE_ABBREVIATIONS: Vec<(Regex, &'static str)> = vec![
        (
            Regex::new(r"^((Te)|(TenGigabitEthernet))(?P<num>\d+/\d+(/\d+)?)").unwrap(),
            "TenGigabitEthernet"
        ),
        (
            Regex::new(r"^((G)|(Gi)|(gig)|(xe-)|(GigabitEthernet))(?P<num>\d+/\d+(/\d+)?)")
                .unwrap(),
            "GigabitEthernet"
        ),
        (
            Regex::new(
                r"^((e)|(et)|(eth)|(E)|(Et)|(Eth)|(ethernet)|(Ethernet))(?P<num>\d+/\d+(/\d+)?)"
            )
            .unwrap(),
            "Ethernet"
        ),
        (
            Regex::new(r"^((Po)|(po)|(Port-channel))(?P<num>\d+(/\d+)?)").unwrap(),
            PORT_CHANNEL_PREFIX
        ),
        (Regex::new(r"^((mg)|(mgmt))(?P<num>\d+(/\d+)?)").unwrap(), "mgmt"),
        (Regex::new(r"^((vl)|(Vlan))(?P<num>\d+(/\d+)?)").unwrap(), "Vlan"),
    ];
}

/// Expand an abbreviated interface name, as found in descriptions. Returns `None` if the name
/// has an unknown format.
pub(crate) fn normalize_interface_name(name: &str) -> Option<String> {
    let mut result = name.to_string();
    let mut matched = false;
    for (pattern, full) in IFACE_ABBREVIATIONS.iter() {
        let replaced = pattern
            .captures(&result)
            .and_then(|c| c.name("num"))
            .map(|num| format!("{}{}", full, num.as_str()));
        if let Some(replaced) = replaced {
            result = replaced;
            matched = true;
        }
    }
    if matched {
        Some(result)
    } else {
        None
    }
}

/// # Device Graph
///
/// Physical topology of the network. Links are stored as a single edge in one direction, with
/// the interfaces at both ends.
#[derive(Debug, Clone)]
pub struct DeviceGraph {
    etg: Etg<DeviceId>,
    net: Arc<Network>,
}

impl DeviceGraph {
    /// Build the graph for the network.
    pub fn new(net: Arc<Network>, settings: &Settings) -> Result<Self, GeneratorError> {
        let mut etg = Etg::new();
        for device in net.devices() {
            etg.add_vertex(Vertex::new(device.name(), VertexKind::Normal, device.id()));
        }
        let mut graph = Self { etg, net };
        if settings.use_descriptions {
            graph.construct_edges_by_description()?;
        } else {
            graph.construct_edges_by_subnet()?;
        }
        info!(
            "Device graph has {} vertices and {} edges",
            graph.etg.vertex_count(),
            graph.etg.edge_count()
        );
        Ok(graph)
    }

    /// The network the graph was built from
    pub fn network(&self) -> &Arc<Network> {
        &self.net
    }

    /// Vertex of a device
    pub fn device_vertex(&self, device: DeviceId) -> Result<VertexId, GeneratorError> {
        let name = self.net.device(device)?.name();
        self.etg.vertex_id(name).ok_or_else(|| GeneratorError::VertexNotFound(name.to_string()))
    }

    fn construct_edges_by_subnet(&mut self) -> Result<(), GeneratorError> {
        let mut subnets: Vec<(Prefix, Vec<IfaceId>)> = Vec::new();
        for device in self.net.devices() {
            for iface in device.interfaces() {
                let prefix = match iface.prefix() {
                    Some(p) => Prefix::new(p.network_address(), p.length),
                    None => continue,
                };
                match subnets.iter_mut().find(|(p, _)| *p == prefix) {
                    Some((_, members)) => members.push(iface.id()),
                    None => subnets.push((prefix, vec![iface.id()])),
                }
            }
        }

        for (prefix, members) in subnets {
            if members.len() > 2 {
                warn!("More than two interfaces in the subnet {}", prefix);
            }
            for (s, src) in members.iter().enumerate() {
                for dst in members.iter().skip(s + 1) {
                    self.add_link(*src, *dst)?;
                }
            }
        }
        Ok(())
    }

    fn construct_edges_by_description(&mut self) -> Result<(), GeneratorError> {
        let net = self.net.clone();
        for device in net.devices() {
            for iface in device.interfaces() {
                let description = match iface.description() {
                    Some(d) if iface.is_active() && d.starts_with("INFRA") => d,
                    _ => continue,
                };
                if iface.kind() != InterfaceType::Ethernet {
                    continue;
                }

                let parts: Vec<&str> = description.split(':').collect();
                if parts.len() < 3 {
                    warn!(
                        "Unknown interface description format for {} on {}: {}",
                        iface.name(),
                        device.name(),
                        description
                    );
                    continue;
                }
                let offset = if parts.len() == 3 { 1 } else { 2 };
                let neighbor_name = parts[offset].to_lowercase();
                let neighbor_iface = parts[offset + 1];

                let neighbor_iface = match normalize_interface_name(neighbor_iface) {
                    Some(n) => n,
                    None => {
                        warn!(
                            "Unknown interface type in description for {} on {}: {}",
                            iface.name(),
                            device.name(),
                            neighbor_iface
                        );
                        continue;
                    }
                };

                let neighbor = match net.device_by_name(&neighbor_name) {
                    Ok(n) if n.id() != device.id() => n,
                    _ => continue,
                };
                if let Some(remote) = neighbor.interface_by_name(&neighbor_iface) {
                    self.add_link(iface.id(), remote.id())?;
                }
            }
        }
        Ok(())
    }

    /// Add a link between two interfaces. Links between two port channels are expanded into links
    /// between their members, pairwise by position. A link is only added if the devices are not
    /// connected yet in either direction.
    pub fn add_link(&mut self, src: IfaceId, dst: IfaceId) -> Result<(), GeneratorError> {
        let src_iface = self.net.interface(src)?;
        let dst_iface = self.net.interface(dst)?;

        if src_iface.kind() == InterfaceType::PortChannel
            && dst_iface.kind() == InterfaceType::PortChannel
        {
            debug!("Connect port channels {:?} and {:?}", src, dst);
            if src_iface.sub_interfaces().is_empty() || dst_iface.sub_interfaces().is_empty() {
                warn!(
                    "No sub-interfaces for port channel {} or {}",
                    src_iface.name(),
                    dst_iface.name()
                );
                return Ok(());
            }
            let pairs: Vec<(usize, usize)> = src_iface
                .sub_interfaces()
                .iter()
                .copied()
                .zip(dst_iface.sub_interfaces().iter().copied())
                .collect();
            for (s, d) in pairs {
                self.add_link(
                    IfaceId { device: src.device, index: s },
                    IfaceId { device: dst.device, index: d },
                )?;
            }
            return Ok(());
        }

        let a = self.device_vertex(src.device)?;
        let b = self.device_vertex(dst.device)?;
        if !(self.etg.contains_edge(a, b) || self.etg.contains_edge(b, a)) {
            debug!("Add link from {:?} to {:?}", src, dst);
            self.etg.add_edge_with_ifaces(a, b, 0.0, EdgeKind::InterDevice, Some(src), Some(dst));
        }
        Ok(())
    }

    /// Interface at the other end of the link attached to the given interface
    pub fn connected_interface(&self, iface: IfaceId) -> Option<IfaceId> {
        let vertex = self.device_vertex(iface.device).ok()?;
        for e in self.etg.outgoing_edges(vertex) {
            if let Some(edge) = self.etg.edge(e) {
                if edge.source_iface == Some(iface) && edge.destination_iface.is_some() {
                    return edge.destination_iface;
                }
            }
        }
        for e in self.etg.incoming_edges(vertex) {
            if let Some(edge) = self.etg.edge(e) {
                if edge.destination_iface == Some(iface) && edge.source_iface.is_some() {
                    return edge.source_iface;
                }
            }
        }
        None
    }

    /// Device at the other end of the link attached to the given interface
    pub fn connected_device(&self, iface: IfaceId) -> Option<DeviceId> {
        self.connected_interface(iface).map(|i| i.device)
    }

    /// All links between devices
    pub fn links(&self) -> Vec<Link> {
        self.etg
            .edge_ids()
            .into_iter()
            .filter_map(|e| {
                let (s, d) = self.etg.edge_endpoints(e)?;
                match (self.etg.vertex(s)?.element(), self.etg.vertex(d)?.element()) {
                    (Some(_), Some(_)) => {
                        Some(Link::new(self.etg.vertex_name(s), self.etg.vertex_name(d)))
                    }
                    _ => None,
                }
            })
            .collect()
    }

    fn flow_endpoint_vertices(&self) -> Result<(Vec<VertexId>, VertexId), GeneratorError> {
        let sources = self.etg.source_vertices().values().copied().collect();
        let destination = self.etg.destination_vertex().ok_or(GeneratorError::NotCustomized)?;
        Ok((sources, destination))
    }
}

impl TopologyGraph for DeviceGraph {
    type Element = DeviceId;

    fn etg(&self) -> &Etg<DeviceId> {
        &self.etg
    }

    fn etg_mut(&mut self) -> &mut Etg<DeviceId> {
        &mut self.etg
    }

    fn construct_endpoint_edges(&mut self) -> Result<(), GeneratorError> {
        let flow = self.etg.flow().cloned().ok_or(GeneratorError::NotCustomized)?;
        let (_, destination) = self.flow_endpoint_vertices()?;
        let sources: Vec<_> =
            self.etg.source_vertices().iter().map(|(g, v)| (g.clone(), *v)).collect();
        let net = self.net.clone();

        // external groups are reached through the external devices
        for device in net.devices().iter().filter(|d| d.is_external()) {
            let vertex = self.device_vertex(device.id())?;
            for (group, source) in sources.iter() {
                if !group.is_internal() {
                    self.etg.add_edge(*source, vertex, 0.0, EdgeKind::InterDevice);
                }
            }
            if !flow.destination.is_internal() {
                self.etg.add_edge(vertex, destination, 0.0, EdgeKind::InterDevice);
            }
        }

        for device in net.devices() {
            let vertex = self.device_vertex(device.id())?;
            for iface in device.interfaces() {
                let address = match iface.address() {
                    Some(a) if iface.is_active() => a,
                    _ => continue,
                };
                if let Some((_, source)) = sources.iter().find(|(g, _)| g.contains_ip(address)) {
                    if !self.etg.contains_edge(*source, vertex) {
                        let e = self.etg.add_edge_with_ifaces(
                            *source,
                            vertex,
                            0.0,
                            EdgeKind::InterDevice,
                            None,
                            Some(iface.id()),
                        );
                        if let Some(edge) = self.etg.edge_mut(e) {
                            edge.check_and_block_incoming(&flow, &net)?;
                        }
                    }
                } else if flow.destination.contains_ip(address)
                    && !self.etg.contains_edge(vertex, destination)
                {
                    let e = self.etg.add_edge_with_ifaces(
                        vertex,
                        destination,
                        0.0,
                        EdgeKind::InterDevice,
                        Some(iface.id()),
                        None,
                    );
                    if let Some(edge) = self.etg.edge_mut(e) {
                        edge.check_and_block_outgoing(&flow, &net)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn customize_edges(&mut self) -> Result<(), GeneratorError> {
        let flow = self.etg.flow().cloned().ok_or(GeneratorError::NotCustomized)?;
        let net = self.net.clone();
        for device in net.devices() {
            let vertex = self.device_vertex(device.id())?;
            for e in self.etg.outgoing_edges(vertex) {
                if let Some(edge) = self.etg.edge_mut(e) {
                    if edge.source_iface.map_or(false, |i| i.device == device.id()) {
                        edge.check_and_block_outgoing(&flow, &net)?;
                    }
                }
            }
            for e in self.etg.incoming_edges(vertex) {
                if let Some(edge) = self.etg.edge_mut(e) {
                    if edge.destination_iface.map_or(false, |i| i.device == device.id()) {
                        edge.check_and_block_incoming(&flow, &net)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_link(&mut self, link: &Link) {
        let a = self.etg.vertex_id(&link.source_device);
        let b = self.etg.vertex_id(&link.destination_device);
        if let (Some(a), Some(b)) = (a, b) {
            for (s, d) in [(a, b), (b, a)].iter() {
                if let Some(e) = self.etg.find_edge(*s, *d) {
                    self.etg.remove_edge(e);
                }
            }
        }
    }
}
