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

//! # Network Model
//!
//! Devices, interfaces, routing processes and filters, as they are read from a
//! [`NetworkConfig`](config::NetworkConfig). The model is built once and then shared (read-only,
//! behind an `Arc`) by every graph generated from it.

#![deny(missing_debug_implementations)]

pub mod acl;
pub mod config;
mod device;
mod interface;
mod process;
mod types;

pub use device::{Device, PORT_CHANNEL_PREFIX, VLAN_PREFIX};
pub use interface::{Interface, InterfaceType, SwitchportMode, OSPF_REFERENCE_BANDWIDTH};
pub use process::{Process, ProcessConfig};
pub use types::{
    DeviceId, IfaceId, LineAction, Prefix, PrefixError, ProcId, Protocol, VlanRange,
};

use crate::policy::PolicyGroup;
use config::NetworkConfig;
use log::*;
use std::collections::HashMap;
use thiserror::Error;

/// Errors in the structure of the network configuration. These errors are always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A prefix cannot be parsed
    #[error("Invalid prefix: {0}")]
    PrefixError(#[from] PrefixError),
    /// Two devices have the same hostname
    #[error("Duplicate hostname: {0}")]
    DuplicateHostname(String),
    /// Two interfaces on the same device have the same name
    #[error("Duplicate interface on {0}: {1}")]
    DuplicateInterface(String, String),
    /// The type of an interface cannot be derived from its name
    #[error("Unknown interface type: {0}")]
    UnknownInterfaceType(String),
    /// The VLAN number of a VLAN interface cannot be derived from its name
    #[error("Cannot derive the VLAN number of {0}")]
    InvalidVlanName(String),
    /// Sub-interfaces can only be added to VLAN interfaces and port channels
    #[error("Interface {0} cannot have sub-interfaces")]
    InvalidSubInterfaceParent(String),
    /// An interface is a member of a port channel which does not exist
    #[error("No port channel for interface {0}:{1}")]
    MissingPortChannel(String, String),
    /// Device is not present in the network
    #[error("Network device was not found: {0:?}")]
    DeviceNotFound(DeviceId),
    /// Device name is not present in the network
    #[error("Network device name was not found: {0}")]
    DeviceNameNotFound(String),
    /// Interface is not present in the network
    #[error("Interface was not found: {0:?}")]
    InterfaceNotFound(IfaceId),
    /// Process is not present in the network
    #[error("Routing process was not found: {0:?}")]
    ProcessNotFound(ProcId),
}

/// # Network
///
/// All devices of the network, indexed by [`DeviceId`], together with the traffic classes
/// ([`PolicyGroup`]) that are analyzed.
#[derive(Debug, Clone)]
pub struct Network {
    devices: Vec<Device>,
    names: HashMap<String, DeviceId>,
    policy_groups: Vec<PolicyGroup>,
}

impl Network {
    /// Build the network from its configuration.
    ///
    /// If the configuration lists no policy groups, one internal group is derived for the network
    /// of every active interface with an address.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, NetworkError> {
        let mut devices = Vec::with_capacity(config.devices.len());
        let mut names = HashMap::new();
        for (index, device_config) in config.devices.iter().enumerate() {
            let id = DeviceId(index);
            if names.insert(device_config.hostname.clone(), id).is_some() {
                return Err(NetworkError::DuplicateHostname(device_config.hostname.clone()));
            }
            devices.push(Device::from_config(id, device_config)?);
        }

        let mut policy_groups: Vec<PolicyGroup> = Vec::new();
        if config.policy_groups.is_empty() {
            for iface in devices.iter().flat_map(|d| d.interfaces().iter()) {
                if !iface.is_active() {
                    continue;
                }
                if let Some(prefix) = iface.prefix() {
                    let group = PolicyGroup::from_prefix(&prefix, true);
                    if !policy_groups.contains(&group) {
                        policy_groups.push(group);
                    }
                }
            }
        } else {
            for group_config in config.policy_groups.iter() {
                let group = PolicyGroup::from_prefix(&group_config.prefix, group_config.internal);
                if !policy_groups.contains(&group) {
                    policy_groups.push(group);
                }
            }
        }
        policy_groups.sort();

        info!(
            "Loaded {} devices and {} policy groups",
            devices.len(),
            policy_groups.len()
        );

        Ok(Self { devices, names, policy_groups })
    }

    /// All devices, indexed by [`DeviceId`]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Device with the given id
    pub fn device(&self, id: DeviceId) -> Result<&Device, NetworkError> {
        self.devices.get(id.0).ok_or(NetworkError::DeviceNotFound(id))
    }

    /// Device with the given name
    pub fn device_by_name(&self, name: &str) -> Result<&Device, NetworkError> {
        self.names
            .get(name)
            .and_then(|id| self.devices.get(id.0))
            .ok_or_else(|| NetworkError::DeviceNameNotFound(name.to_string()))
    }

    /// Interface with the given id
    pub fn interface(&self, id: IfaceId) -> Result<&Interface, NetworkError> {
        self.device(id.device)?.interface(id.index).ok_or(NetworkError::InterfaceNotFound(id))
    }

    /// Routing process with the given id
    pub fn process(&self, id: ProcId) -> Result<&Process, NetworkError> {
        self.device(id.device)?.process(id.index).ok_or(NetworkError::ProcessNotFound(id))
    }

    /// Iterate over all routing processes of all devices, device by device.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.devices.iter().flat_map(|d| d.processes().iter())
    }

    /// Traffic classes of the network, sorted by address
    pub fn policy_groups(&self) -> &[PolicyGroup] {
        &self.policy_groups
    }
}
