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

//! # Network Configuration
//!
//! Structured, vendor-independent description of a network, as produced by a configuration
//! parser. All structures can be (de)serialized with serde, and have small builder methods to
//! write them down in code.
//!
//! ```rust
//! use arc::network::config::*;
//! use arc::network::Network;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NetworkConfig::new()
//!     .device(
//!         DeviceConfig::new("r1")
//!             .interface(
//!                 InterfaceConfig::new("GigabitEthernet0/0").prefix("10.0.0.1/30".parse()?),
//!             )
//!             .ospf(OspfConfig::new(1).network("10.0.0.0/8".parse()?)),
//!     )
//!     .device(
//!         DeviceConfig::new("r2")
//!             .interface(
//!                 InterfaceConfig::new("GigabitEthernet0/0").prefix("10.0.0.2/30".parse()?),
//!             )
//!             .ospf(OspfConfig::new(1).network("10.0.0.0/8".parse()?)),
//!     );
//! let net = Network::from_config(&config)?;
//! assert_eq!(net.devices().len(), 2);
//! # Ok(())
//! # }
//! ```

use super::acl::{ExtendedAcl, PrefixList, RouteMap, StandardAcl};
use super::interface::SwitchportMode;
use super::types::{Prefix, Protocol, VlanRange};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

fn default_true() -> bool {
    true
}

/// Configuration of the whole network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// All devices
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    /// Explicit traffic classes. If empty, they are derived from the interface prefixes.
    #[serde(default)]
    pub policy_groups: Vec<PolicyGroupConfig>,
}

impl NetworkConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device
    pub fn device(mut self, device: DeviceConfig) -> Self {
        self.devices.push(device);
        self
    }

    /// Add an explicit policy group
    pub fn policy_group(mut self, prefix: Prefix, internal: bool) -> Self {
        self.policy_groups.push(PolicyGroupConfig { prefix, internal });
        self
    }
}

/// Explicit traffic class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyGroupConfig {
    /// Address range of the traffic class
    pub prefix: Prefix,
    /// Whether the addresses belong to the network
    #[serde(default = "default_true")]
    pub internal: bool,
}

/// Configuration of a single device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Hostname, must be unique in the network
    pub hostname: String,
    /// External devices have no configuration of their own.
    #[serde(default)]
    pub external: bool,
    /// Interfaces, in configuration order
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
    /// BGP process
    #[serde(default)]
    pub bgp: Option<BgpConfig>,
    /// OSPF processes
    #[serde(default)]
    pub ospf: Vec<OspfConfig>,
    /// Static routes, one process each
    #[serde(default)]
    pub static_routes: Vec<StaticRouteConfig>,
    /// Standard access lists
    #[serde(default)]
    pub standard_acls: Vec<StandardAcl>,
    /// Extended access lists
    #[serde(default)]
    pub extended_acls: Vec<ExtendedAcl>,
    /// Prefix lists
    #[serde(default)]
    pub prefix_lists: Vec<PrefixList>,
    /// Route maps
    #[serde(default)]
    pub route_maps: Vec<RouteMap>,
}

impl DeviceConfig {
    /// Create an internal device without any configuration
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            external: false,
            interfaces: Vec::new(),
            bgp: None,
            ospf: Vec::new(),
            static_routes: Vec::new(),
            standard_acls: Vec::new(),
            extended_acls: Vec::new(),
            prefix_lists: Vec::new(),
            route_maps: Vec::new(),
        }
    }

    /// Create an external device
    pub fn external(hostname: impl Into<String>) -> Self {
        Self { external: true, ..Self::new(hostname) }
    }

    /// Add an interface
    pub fn interface(mut self, iface: InterfaceConfig) -> Self {
        self.interfaces.push(iface);
        self
    }

    /// Set the BGP process
    pub fn bgp(mut self, bgp: BgpConfig) -> Self {
        self.bgp = Some(bgp);
        self
    }

    /// Add an OSPF process
    pub fn ospf(mut self, ospf: OspfConfig) -> Self {
        self.ospf.push(ospf);
        self
    }

    /// Add a static route
    pub fn static_route(mut self, route: StaticRouteConfig) -> Self {
        self.static_routes.push(route);
        self
    }

    /// Add a standard access list
    pub fn standard_acl(mut self, acl: StandardAcl) -> Self {
        self.standard_acls.push(acl);
        self
    }

    /// Add an extended access list
    pub fn extended_acl(mut self, acl: ExtendedAcl) -> Self {
        self.extended_acls.push(acl);
        self
    }

    /// Add a prefix list
    pub fn prefix_list(mut self, list: PrefixList) -> Self {
        self.prefix_lists.push(list);
        self
    }

    /// Add a route map
    pub fn route_map(mut self, map: RouteMap) -> Self {
        self.route_maps.push(map);
        self
    }
}

/// Configuration of an interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Name, e.g. `GigabitEthernet0/1`. The interface type is derived from it.
    pub name: String,
    /// Address and prefix length
    #[serde(default)]
    pub prefix: Option<Prefix>,
    /// `false` if the interface is shut down
    #[serde(default = "default_true")]
    pub active: bool,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Bandwidth in bits per second
    #[serde(default)]
    pub bandwidth: Option<f64>,
    /// Configured OSPF cost
    #[serde(default)]
    pub ospf_cost: Option<f64>,
    /// Name of the access list applied to incoming traffic
    #[serde(default)]
    pub incoming_filter: Option<String>,
    /// Name of the access list applied to outgoing traffic
    #[serde(default)]
    pub outgoing_filter: Option<String>,
    /// Switchport mode
    #[serde(default)]
    pub switchport: SwitchportMode,
    /// VLAN of an access port
    #[serde(default)]
    pub access_vlan: Option<u16>,
    /// VLANs allowed on a trunk port
    #[serde(default)]
    pub allowed_vlans: Vec<VlanRange>,
    /// Port channel this interface is a member of
    #[serde(default)]
    pub channel_group: Option<u32>,
}

impl InterfaceConfig {
    /// Create an active interface without address
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            active: true,
            description: None,
            bandwidth: None,
            ospf_cost: None,
            incoming_filter: None,
            outgoing_filter: None,
            switchport: SwitchportMode::None,
            access_vlan: None,
            allowed_vlans: Vec::new(),
            channel_group: None,
        }
    }

    /// Set the address
    pub fn prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Shut the interface down
    pub fn shutdown(mut self) -> Self {
        self.active = false;
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the bandwidth
    pub fn bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    /// Set the OSPF cost
    pub fn ospf_cost(mut self, cost: f64) -> Self {
        self.ospf_cost = Some(cost);
        self
    }

    /// Set the incoming filter
    pub fn incoming_filter(mut self, name: impl Into<String>) -> Self {
        self.incoming_filter = Some(name.into());
        self
    }

    /// Set the outgoing filter
    pub fn outgoing_filter(mut self, name: impl Into<String>) -> Self {
        self.outgoing_filter = Some(name.into());
        self
    }

    /// Make this an access port in the given VLAN
    pub fn access(mut self, vlan: u16) -> Self {
        self.switchport = SwitchportMode::Access;
        self.access_vlan = Some(vlan);
        self
    }

    /// Make this a trunk port. An empty list allows all VLANs.
    pub fn trunk(mut self, allowed: Vec<VlanRange>) -> Self {
        self.switchport = SwitchportMode::Trunk;
        self.allowed_vlans = allowed;
        self
    }

    /// Add this interface to a port channel
    pub fn channel_group(mut self, group: u32) -> Self {
        self.channel_group = Some(group);
        self
    }
}

/// Route redistribution into a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redistribution {
    /// Protocol whose routes are imported
    pub protocol: Protocol,
    /// Metric assigned to the imported routes
    #[serde(default)]
    pub metric: Option<f64>,
    /// Route map filtering the imported routes
    #[serde(default)]
    pub route_map: Option<String>,
    /// OSPF process from which routes are imported
    #[serde(default)]
    pub ospf_pid: Option<u32>,
}

impl Redistribution {
    /// Import all routes of a protocol, without metric
    pub fn new(protocol: Protocol) -> Self {
        Self { protocol, metric: None, route_map: None, ospf_pid: None }
    }

    /// Set the metric
    pub fn metric(mut self, metric: f64) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Set the route map
    pub fn route_map(mut self, name: impl Into<String>) -> Self {
        self.route_map = Some(name.into());
        self
    }

    /// Set the OSPF process id
    pub fn ospf_pid(mut self, pid: u32) -> Self {
        self.ospf_pid = Some(pid);
        self
    }
}

/// BGP process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpConfig {
    /// AS number
    pub asn: u32,
    /// Neighbor addresses
    #[serde(default)]
    pub neighbors: Vec<Ipv4Addr>,
    /// Announced networks
    #[serde(default)]
    pub networks: Vec<Prefix>,
    /// Redistribution into BGP
    #[serde(default)]
    pub redistribute: Vec<Redistribution>,
}

impl BgpConfig {
    /// Create a BGP process without neighbors
    pub fn new(asn: u32) -> Self {
        Self { asn, neighbors: Vec::new(), networks: Vec::new(), redistribute: Vec::new() }
    }

    /// Add a neighbor
    pub fn neighbor(mut self, address: Ipv4Addr) -> Self {
        self.neighbors.push(address);
        self
    }

    /// Announce a network
    pub fn network(mut self, prefix: Prefix) -> Self {
        self.networks.push(prefix);
        self
    }

    /// Redistribute routes into BGP
    pub fn redistribute(mut self, redistribution: Redistribution) -> Self {
        self.redistribute.push(redistribution);
        self
    }
}

/// OSPF process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OspfConfig {
    /// Process id
    pub pid: u32,
    /// Network statements
    #[serde(default)]
    pub networks: Vec<Prefix>,
    /// `passive-interface default`: only interfaces in `active_interfaces` participate.
    #[serde(default)]
    pub passive_default: bool,
    /// Interfaces that never participate
    #[serde(default)]
    pub passive_interfaces: Vec<String>,
    /// Interfaces that participate even if `passive_default` is set
    #[serde(default)]
    pub active_interfaces: Vec<String>,
    /// Redistribution into OSPF
    #[serde(default)]
    pub redistribute: Vec<Redistribution>,
}

impl OspfConfig {
    /// Create an OSPF process without networks
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            networks: Vec::new(),
            passive_default: false,
            passive_interfaces: Vec::new(),
            active_interfaces: Vec::new(),
            redistribute: Vec::new(),
        }
    }

    /// Add a network statement
    pub fn network(mut self, prefix: Prefix) -> Self {
        self.networks.push(prefix);
        self
    }

    /// Mark an interface as passive
    pub fn passive(mut self, iface: impl Into<String>) -> Self {
        self.passive_interfaces.push(iface.into());
        self
    }

    /// Redistribute routes into OSPF
    pub fn redistribute(mut self, redistribution: Redistribution) -> Self {
        self.redistribute.push(redistribution);
        self
    }
}

/// Static route configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRouteConfig {
    /// Destination network
    pub network: Prefix,
    /// Next hop address
    #[serde(default)]
    pub next_hop: Option<Ipv4Addr>,
    /// Next hop interface
    #[serde(default)]
    pub next_hop_interface: Option<String>,
}

impl StaticRouteConfig {
    /// Static route towards a next hop address
    pub fn via(network: Prefix, next_hop: Ipv4Addr) -> Self {
        Self { network, next_hop: Some(next_hop), next_hop_interface: None }
    }

    /// Static route out of an interface
    pub fn out(network: Prefix, iface: impl Into<String>) -> Self {
        Self { network, next_hop: None, next_hop_interface: Some(iface.into()) }
    }
}
