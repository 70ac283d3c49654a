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

//! Module containing a single network device

use super::acl::{ExtendedAcl, PrefixList, RouteMap, StandardAcl};
use super::config::{DeviceConfig, OspfConfig, StaticRouteConfig};
use super::interface::{Interface, InterfaceType};
use super::process::{Process, ProcessConfig};
use super::types::{DeviceId, IfaceId, ProcId};
use super::NetworkError;
use crate::policy::PolicyGroup;
use log::*;
use std::collections::HashMap;

/// Name prefix of port channel interfaces
pub const PORT_CHANNEL_PREFIX: &str = "Port-channel";
/// Name prefix of VLAN interfaces
pub const VLAN_PREFIX: &str = "Vlan";

/// # Device
///
/// A router or switch, with its interfaces, its routing processes and its filters. External
/// devices represent neighbors outside of the administrative domain and carry no configuration.
///
/// Devices are built once from the configuration and never change afterwards. Two devices are
/// equal if they have the same name.
#[derive(Debug, Clone)]
pub struct Device {
    id: DeviceId,
    name: String,
    external: bool,
    interfaces: Vec<Interface>,
    interface_names: HashMap<String, usize>,
    processes: Vec<Process>,
    standard_acls: HashMap<String, StandardAcl>,
    extended_acls: HashMap<String, ExtendedAcl>,
    prefix_lists: HashMap<String, PrefixList>,
    route_maps: HashMap<String, RouteMap>,
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Device {}

impl Device {
    /// Build the device from its configuration. This attaches port channel and VLAN members to
    /// their parent interfaces, and creates the routing processes (BGP first, then OSPF, then
    /// static routes).
    pub fn from_config(id: DeviceId, config: &DeviceConfig) -> Result<Self, NetworkError> {
        let mut interfaces = Vec::with_capacity(config.interfaces.len());
        let mut interface_names = HashMap::new();
        for (index, iface_config) in config.interfaces.iter().enumerate() {
            let iface = Interface::from_config(IfaceId { device: id, index }, iface_config)?;
            if interface_names.insert(iface.name().to_string(), index).is_some() {
                return Err(NetworkError::DuplicateInterface(
                    config.hostname.clone(),
                    iface.name().to_string(),
                ));
            }
            interfaces.push(iface);
        }

        let mut device = Self {
            id,
            name: config.hostname.clone(),
            external: config.external,
            interfaces,
            interface_names,
            processes: Vec::new(),
            standard_acls: config
                .standard_acls
                .iter()
                .map(|a| (a.name.clone(), a.clone()))
                .collect(),
            extended_acls: config
                .extended_acls
                .iter()
                .map(|a| (a.name.clone(), a.clone()))
                .collect(),
            prefix_lists: config.prefix_lists.iter().map(|l| (l.name.clone(), l.clone())).collect(),
            route_maps: config.route_maps.iter().map(|m| (m.name.clone(), m.clone())).collect(),
        };

        device.attach_sub_interfaces()?;

        if let Some(bgp) = config.bgp.as_ref() {
            let mut ifaces = Vec::new();
            for neighbor in bgp.neighbors.iter() {
                let found = device
                    .interfaces
                    .iter()
                    .position(|i| i.prefix().map_or(false, |p| p.contains(*neighbor)));
                if let Some(index) = found {
                    if !ifaces.contains(&index) {
                        ifaces.push(index);
                    }
                }
            }
            device.push_process(ProcessConfig::Bgp(bgp.clone()), ifaces);
        }
        for ospf in config.ospf.iter() {
            let ifaces = device.ospf_interfaces(ospf);
            device.push_process(ProcessConfig::Ospf(ospf.clone()), ifaces);
        }
        for route in config.static_routes.iter() {
            let ifaces = device.static_interfaces(route);
            device.push_process(ProcessConfig::Static(route.clone()), ifaces);
        }

        Ok(device)
    }

    fn attach_sub_interfaces(&mut self) -> Result<(), NetworkError> {
        let mut attachments: Vec<(usize, usize)> = Vec::new();
        for (index, iface) in self.interfaces.iter().enumerate() {
            if let Some(group) = iface.channel_group() {
                let parent_name = format!("{}{}", PORT_CHANNEL_PREFIX, group);
                match self.interface_names.get(&parent_name) {
                    Some(parent) => attachments.push((*parent, index)),
                    None => {
                        return Err(NetworkError::MissingPortChannel(
                            self.name.clone(),
                            iface.name().to_string(),
                        ))
                    }
                }
            }
            if iface.kind() == InterfaceType::Vlan {
                continue;
            }
            if let Some(vlan) = iface.access_vlan() {
                let parent_name = format!("{}{}", VLAN_PREFIX, vlan);
                match self.interface_names.get(&parent_name) {
                    Some(parent) => attachments.push((*parent, index)),
                    None => warn!("No vlan {} for interface {}:{}", vlan, self.name, iface.name()),
                }
            } else if !iface.allowed_vlans().is_empty() {
                for (parent, vlan_iface) in self.interfaces.iter().enumerate() {
                    if vlan_iface.kind() != InterfaceType::Vlan {
                        continue;
                    }
                    let allowed = vlan_iface
                        .access_vlan()
                        .map_or(false, |v| iface.allowed_vlans().iter().any(|r| r.contains(v)));
                    if allowed {
                        attachments.push((parent, index));
                    }
                }
            }
        }
        for (parent, child) in attachments {
            self.interfaces[parent].add_sub_interface(child)?;
        }
        Ok(())
    }

    fn ospf_interfaces(&self, ospf: &OspfConfig) -> Vec<usize> {
        let mut ifaces = Vec::new();
        for network in ospf.networks.iter() {
            for (index, iface) in self.interfaces.iter().enumerate() {
                let name = iface.name().to_string();
                if ospf.passive_interfaces.contains(&name) {
                    continue;
                }
                if ospf.passive_default && !ospf.active_interfaces.contains(&name) {
                    continue;
                }
                let inside = iface.address().map_or(false, |a| network.contains(a));
                if inside && !ifaces.contains(&index) {
                    ifaces.push(index);
                }
            }
        }
        ifaces
    }

    fn static_interfaces(&self, route: &StaticRouteConfig) -> Vec<usize> {
        if let Some(name) = route.next_hop_interface.as_ref() {
            if name.starts_with("Null") {
                return Vec::new();
            }
            return match self.interface_names.get(name) {
                Some(index) => vec![*index],
                None => {
                    warn!(
                        "No interface {} on {} for static route {}",
                        name, self.name, route.network
                    );
                    Vec::new()
                }
            };
        }
        route
            .next_hop
            .and_then(|hop| {
                self.interfaces.iter().position(|i| i.prefix().map_or(false, |p| p.contains(hop)))
            })
            .into_iter()
            .collect()
    }

    fn push_process(&mut self, config: ProcessConfig, interfaces: Vec<usize>) {
        let id = ProcId { device: self.id, index: self.processes.len() };
        let process = Process::new(id, &self.name, config, interfaces);
        self.processes.push(process);
    }

    /// Identifier of the device
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Hostname
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the device is outside of the administrative domain.
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// All interfaces, in configuration order
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Interface at the given position
    pub fn interface(&self, index: usize) -> Option<&Interface> {
        self.interfaces.get(index)
    }

    /// Interface with the given name
    pub fn interface_by_name(&self, name: &str) -> Option<&Interface> {
        self.interface_names.get(name).and_then(|i| self.interfaces.get(*i))
    }

    /// All routing processes, BGP first, then OSPF, then static routes
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Routing process at the given position
    pub fn process(&self, index: usize) -> Option<&Process> {
        self.processes.get(index)
    }

    /// Standard access list with the given name
    pub fn standard_acl(&self, name: &str) -> Option<&StandardAcl> {
        self.standard_acls.get(name)
    }

    /// Extended access list with the given name
    pub fn extended_acl(&self, name: &str) -> Option<&ExtendedAcl> {
        self.extended_acls.get(name)
    }

    /// Prefix list with the given name
    pub fn prefix_list(&self, name: &str) -> Option<&PrefixList> {
        self.prefix_lists.get(name)
    }

    /// Route map with the given name
    pub fn route_map(&self, name: &str) -> Option<&RouteMap> {
        self.route_maps.get(name)
    }

    /// Returns true if the policy group lies inside the network of one of the interfaces.
    pub fn connects(&self, group: &PolicyGroup) -> bool {
        self.interfaces.iter().filter_map(|i| i.prefix()).any(|p| group.within(&p))
    }

    /// Returns the first interface whose network lies inside the policy group.
    pub fn interface_inside(&self, group: &PolicyGroup) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.prefix().map_or(false, |p| group.contains_prefix(&p)))
    }
}
