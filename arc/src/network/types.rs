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

//! Module containing the basic type definitions of the network model

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Device Identification (index into the list of devices of a
/// [`Network`](crate::network::Network))
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub usize);

/// Interface Identification: the device and the position of the interface on that device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IfaceId {
    /// Device owning the interface
    pub device: DeviceId,
    /// Position of the interface on the device
    pub index: usize,
}

/// Routing Process Identification: the device and the position of the process on that device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcId {
    /// Device running the process
    pub device: DeviceId,
    /// Position of the process on the device
    pub index: usize,
}

/// Error while parsing an address prefix
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrefixError {
    /// The prefix has no `/len` part
    #[error("Prefix has no length: {0}")]
    MissingLength(String),
    /// The address part is not a valid IPv4 address
    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),
    /// The length is not a number between 0 and 32
    #[error("Invalid prefix length: {0}")]
    InvalidLength(String),
}

/// # IPv4 Prefix
///
/// An address together with a prefix length. For interfaces, the address is the address of the
/// interface itself (not the network address), as it is written in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix {
    /// Address
    pub address: Ipv4Addr,
    /// Prefix length, between 0 and 32
    pub length: u8,
}

impl Prefix {
    /// Create a new prefix. Lengths above 32 are clamped to 32.
    pub fn new(address: Ipv4Addr, length: u8) -> Self {
        Self { address, length: length.min(32) }
    }

    /// Network mask as an integer
    pub fn mask(&self) -> u32 {
        if self.length == 0 {
            0
        } else {
            u32::MAX << (32 - self.length as u32)
        }
    }

    /// First address of the network
    pub fn network_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & self.mask())
    }

    /// Last address of the network
    pub fn end_address(&self) -> Ipv4Addr {
        Ipv4Addr::from((u32::from(self.address) & self.mask()) | !self.mask())
    }

    /// Number of addresses in the network
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.length as u32)
    }

    /// Returns true if the address is part of the network.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & self.mask() == u32::from(self.address) & self.mask()
    }

    /// Returns true if the whole `other` network is part of this network.
    pub fn contains_prefix(&self, other: &Prefix) -> bool {
        other.length >= self.length && self.contains(other.address)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.length)
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, '/');
        let address = parts.next().unwrap_or_default();
        let length = parts.next().ok_or_else(|| PrefixError::MissingLength(s.to_string()))?;
        let address = address
            .parse::<Ipv4Addr>()
            .map_err(|_| PrefixError::InvalidAddress(address.to_string()))?;
        let length = match length.parse::<u8>() {
            Ok(l) if l <= 32 => l,
            _ => return Err(PrefixError::InvalidLength(length.to_string())),
        };
        Ok(Self { address, length })
    }
}

impl TryFrom<String> for Prefix {
    type Error = PrefixError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Prefix> for String {
    fn from(p: Prefix) -> String {
        p.to_string()
    }
}

/// Routing protocol, used both for process types and for redistribution sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Border Gateway Protocol
    Bgp,
    /// Open Shortest Path First
    Ospf,
    /// Static routes
    Static,
    /// Directly connected networks
    Connected,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bgp => write!(f, "bgp"),
            Self::Ospf => write!(f, "ospf"),
            Self::Static => write!(f, "static"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Action of an ACL, prefix-list or route-map line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineAction {
    /// Let the traffic (or route) pass
    Permit,
    /// Drop the traffic (or route)
    Deny,
}

/// Inclusive range of VLAN numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VlanRange {
    /// First VLAN of the range
    pub start: u16,
    /// Last VLAN of the range
    pub end: u16,
}

impl VlanRange {
    /// Create a new range
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Returns true if the VLAN is inside the range
    pub fn contains(&self, vlan: u16) -> bool {
        vlan >= self.start && vlan <= self.end
    }
}
