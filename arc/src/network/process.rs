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

//! Module containing the routing processes of a device

use super::config::{BgpConfig, OspfConfig, Redistribution, StaticRouteConfig};
use super::device::Device;
use super::types::{ProcId, Protocol};
use crate::policy::PolicyGroup;
use std::cmp::Ordering;
use std::net::Ipv4Addr;

/// Configuration of a routing process, by protocol
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessConfig {
    /// BGP process
    Bgp(BgpConfig),
    /// OSPF process
    Ospf(OspfConfig),
    /// A single static route
    Static(StaticRouteConfig),
}

/// # Routing Process
///
/// A routing protocol instance on one device, together with the interfaces (on the same device)
/// on which it talks to its neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    id: ProcId,
    name: String,
    config: ProcessConfig,
    interfaces: Vec<usize>,
}

impl Process {
    pub(super) fn new(
        id: ProcId,
        device: &str,
        config: ProcessConfig,
        interfaces: Vec<usize>,
    ) -> Self {
        let name = match &config {
            ProcessConfig::Bgp(c) => format!("{}.bgp.{}", device, c.asn),
            ProcessConfig::Ospf(c) => format!("{}.ospf.{}", device, c.pid),
            ProcessConfig::Static(c) => {
                format!("{}.static.{}", device, u32::from(c.network.network_address()))
            }
        };
        Self { id, name, config, interfaces }
    }

    /// Identifier of the process
    pub fn id(&self) -> ProcId {
        self.id
    }

    /// Name of the process
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration of the process
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Routing protocol of the process
    pub fn protocol(&self) -> Protocol {
        match self.config {
            ProcessConfig::Bgp(_) => Protocol::Bgp,
            ProcessConfig::Ospf(_) => Protocol::Ospf,
            ProcessConfig::Static(_) => Protocol::Static,
        }
    }

    /// AS number (BGP), process id (OSPF) or destination network as integer (static).
    pub fn pid(&self) -> u32 {
        match &self.config {
            ProcessConfig::Bgp(c) => c.asn,
            ProcessConfig::Ospf(c) => c.pid,
            ProcessConfig::Static(c) => u32::from(c.network.network_address()),
        }
    }

    /// Administrative distance of the routes learned by this process
    pub fn administrative_distance(&self) -> u32 {
        match self.config {
            ProcessConfig::Static(_) => 1,
            ProcessConfig::Bgp(_) => 20,
            ProcessConfig::Ospf(_) => 110,
        }
    }

    /// Indices of the interfaces (on the same device) used by the process
    pub fn interfaces(&self) -> &[usize] {
        &self.interfaces
    }

    /// Redistribution policies of the process. Static routes have none.
    pub fn redistributions(&self) -> &[Redistribution] {
        match &self.config {
            ProcessConfig::Bgp(c) => &c.redistribute,
            ProcessConfig::Ospf(c) => &c.redistribute,
            ProcessConfig::Static(_) => &[],
        }
    }

    /// Returns the redistribution policy importing routes of the given protocol.
    pub fn redistribution(&self, protocol: Protocol) -> Option<&Redistribution> {
        self.redistributions().iter().find(|r| r.protocol == protocol)
    }

    /// BGP neighbors, empty for other protocols
    pub fn bgp_neighbors(&self) -> &[Ipv4Addr] {
        match &self.config {
            ProcessConfig::Bgp(c) => &c.neighbors,
            _ => &[],
        }
    }

    /// Compare two processes by preference: lower administrative distance first, then by process
    /// id among processes of the same protocol.
    pub fn cmp_preference(&self, other: &Self) -> Ordering {
        self.administrative_distance().cmp(&other.administrative_distance()).then_with(|| {
            match (self.protocol(), other.protocol()) {
                (Protocol::Ospf, Protocol::Ospf) | (Protocol::Bgp, Protocol::Bgp) => {
                    self.pid().cmp(&other.pid())
                }
                _ => Ordering::Equal,
            }
        })
    }

    /// Returns the first interface of the process whose network contains the address, as an index
    /// on the device.
    pub fn interface_to_reach(&self, device: &Device, ip: Ipv4Addr) -> Option<usize> {
        self.interfaces.iter().copied().find(|i| {
            device.interface(*i).and_then(|iface| iface.prefix()).map_or(false, |p| p.contains(ip))
        })
    }

    /// Returns true if the process originates routes towards the destination, either by a network
    /// statement, or by redistributing connected routes or another process originating them.
    pub fn advertises(&self, destination: &PolicyGroup, device: &Device) -> bool {
        match &self.config {
            ProcessConfig::Static(_) => false,
            ProcessConfig::Bgp(c) => {
                if c.networks.iter().any(|p| destination.within(p)) {
                    return true;
                }
                if let Some(policy) = self.redistribution(Protocol::Connected) {
                    return policy.route_map.is_some() || device.connects(destination);
                }
                if let Some(policy) = self.redistribution(Protocol::Ospf) {
                    let ospf = device.processes().iter().find(|p| {
                        p.protocol() == Protocol::Ospf
                            && policy.ospf_pid.map_or(true, |pid| pid == p.pid())
                    });
                    return ospf.map_or(false, |p| p.advertises(destination, device));
                }
                false
            }
            ProcessConfig::Ospf(_) => {
                let on_interface = self.interfaces.iter().any(|i| {
                    device
                        .interface(*i)
                        .and_then(|iface| iface.prefix())
                        .map_or(false, |p| destination.within(&p))
                });
                if on_interface {
                    return true;
                }
                if let Some(policy) = self.redistribution(Protocol::Connected) {
                    return policy.route_map.is_some() || device.connects(destination);
                }
                false
            }
        }
    }

    /// Destination network of a static route
    pub fn static_network(&self) -> Option<crate::network::Prefix> {
        match &self.config {
            ProcessConfig::Static(c) => Some(c.network),
            _ => None,
        }
    }
}
