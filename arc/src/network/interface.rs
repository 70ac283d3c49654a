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

//! Module containing the interface of a device

use super::config::InterfaceConfig;
use super::types::{IfaceId, Prefix, VlanRange};
use super::NetworkError;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Reference bandwidth used to derive the OSPF cost from the bandwidth
pub const OSPF_REFERENCE_BANDWIDTH: f64 = 1e8;

/// Kind of an interface, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    /// Physical ethernet port
    Ethernet,
    /// VLAN (switched virtual) interface
    Vlan,
    /// Bundle of physical ports
    PortChannel,
    /// Loopback interface
    Loopback,
    /// Management port
    Management,
    /// Tunnel
    Tunnel,
}

impl InterfaceType {
    /// Derive the type from the interface name.
    pub fn from_name(name: &str) -> Result<Self, NetworkError> {
        let lower = name.to_lowercase();
        if lower.contains("vlan") {
            Ok(Self::Vlan)
        } else if name.contains("Port-channel") {
            Ok(Self::PortChannel)
        } else if lower.contains("loopback") {
            Ok(Self::Loopback)
        } else if lower.contains("mgmt") {
            Ok(Self::Management)
        } else if lower.contains("ethernet") {
            Ok(Self::Ethernet)
        } else if lower.contains("tunnel") {
            Ok(Self::Tunnel)
        } else {
            Err(NetworkError::UnknownInterfaceType(name.to_string()))
        }
    }
}

/// Switchport mode of a layer-2 interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchportMode {
    /// Routed port
    None,
    /// Access port in a single VLAN
    Access,
    /// Trunk port carrying multiple VLANs
    Trunk,
}

impl Default for SwitchportMode {
    fn default() -> Self {
        Self::None
    }
}

/// # Interface
///
/// An interface belongs to exactly one device. VLAN interfaces and port channels additionally keep
/// the list of their member interfaces (called sub-interfaces).
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    id: IfaceId,
    name: String,
    kind: InterfaceType,
    prefix: Option<Prefix>,
    active: bool,
    description: Option<String>,
    bandwidth: Option<f64>,
    ospf_cost: Option<f64>,
    incoming_filter: Option<String>,
    outgoing_filter: Option<String>,
    switchport: SwitchportMode,
    access_vlan: Option<u16>,
    allowed_vlans: Vec<VlanRange>,
    channel_group: Option<u32>,
    sub_interfaces: Vec<usize>,
}

impl Interface {
    /// Create the interface from its configuration.
    pub fn from_config(id: IfaceId, config: &InterfaceConfig) -> Result<Self, NetworkError> {
        let kind = InterfaceType::from_name(&config.name)?;

        let access_vlan = if kind == InterfaceType::Vlan {
            let number = config.name.to_lowercase().replace("vlan", "");
            Some(
                number
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| NetworkError::InvalidVlanName(config.name.clone()))?,
            )
        } else {
            config.access_vlan
        };

        let allowed_vlans = match (config.switchport, config.allowed_vlans.is_empty()) {
            (SwitchportMode::Trunk, true) => vec![VlanRange::new(1, 4095)],
            (SwitchportMode::Access, true) => {
                access_vlan.map(|v| vec![VlanRange::new(v, v)]).unwrap_or_default()
            }
            _ => config.allowed_vlans.clone(),
        };

        Ok(Self {
            id,
            name: config.name.clone(),
            kind,
            prefix: config.prefix,
            active: config.active,
            description: config.description.clone(),
            bandwidth: config.bandwidth,
            ospf_cost: config.ospf_cost,
            incoming_filter: config.incoming_filter.clone(),
            outgoing_filter: config.outgoing_filter.clone(),
            switchport: config.switchport,
            access_vlan,
            allowed_vlans,
            channel_group: config.channel_group,
            sub_interfaces: Vec::new(),
        })
    }

    /// Identifier of the interface
    pub fn id(&self) -> IfaceId {
        self.id
    }

    /// Name of the interface
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the interface
    pub fn kind(&self) -> InterfaceType {
        self.kind
    }

    /// Address and prefix length, if configured
    pub fn prefix(&self) -> Option<Prefix> {
        self.prefix
    }

    /// Address of the interface, if configured
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.prefix.map(|p| p.address)
    }

    /// Returns `false` if the interface is shut down.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Description of the interface
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// OSPF cost: the configured cost, or the reference bandwidth divided by the bandwidth.
    pub fn ospf_cost(&self) -> Option<f64> {
        match (self.ospf_cost, self.bandwidth) {
            (Some(cost), _) => Some(cost),
            (None, Some(bw)) if bw > 0.0 => Some(OSPF_REFERENCE_BANDWIDTH / bw),
            _ => None,
        }
    }

    /// Access list applied to incoming traffic
    pub fn incoming_filter(&self) -> Option<&str> {
        self.incoming_filter.as_deref()
    }

    /// Access list applied to outgoing traffic
    pub fn outgoing_filter(&self) -> Option<&str> {
        self.outgoing_filter.as_deref()
    }

    /// Switchport mode
    pub fn switchport(&self) -> SwitchportMode {
        self.switchport
    }

    /// VLAN of an access port, or the VLAN number of a VLAN interface
    pub fn access_vlan(&self) -> Option<u16> {
        self.access_vlan
    }

    /// VLANs carried by the interface
    pub fn allowed_vlans(&self) -> &[VlanRange] {
        &self.allowed_vlans
    }

    /// Port channel number, if the interface is bundled
    pub fn channel_group(&self) -> Option<u32> {
        self.channel_group
    }

    /// Indices (on the same device) of the member interfaces
    pub fn sub_interfaces(&self) -> &[usize] {
        &self.sub_interfaces
    }

    /// Add a member interface. Only VLAN interfaces and port channels can have members.
    pub fn add_sub_interface(&mut self, index: usize) -> Result<(), NetworkError> {
        match self.kind {
            InterfaceType::Vlan | InterfaceType::PortChannel => {
                self.sub_interfaces.push(index);
                Ok(())
            }
            _ => Err(NetworkError::InvalidSubInterfaceParent(self.name.clone())),
        }
    }
}
