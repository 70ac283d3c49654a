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

//! Module containing the policy group, a traffic class endpoint

use crate::network::Prefix;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::Ipv4Addr;

/// Lowest port of the default port range
pub const MIN_PORT: u16 = 1;
/// Highest port of the default port range
pub const MAX_PORT: u16 = 65535;

/// # Policy Group
///
/// A contiguous range of addresses and ports, describing one endpoint of a traffic class. The
/// `internal` flag tells whether the addresses belong to the analyzed network; it does not take
/// part in comparisons.
#[derive(Debug, Clone)]
pub struct PolicyGroup {
    start: Ipv4Addr,
    end: Ipv4Addr,
    start_port: u16,
    end_port: u16,
    internal: bool,
}

impl PolicyGroup {
    /// Create a policy group covering all ports of an address range.
    pub fn new(start: Ipv4Addr, end: Ipv4Addr, internal: bool) -> Self {
        Self { start, end, start_port: MIN_PORT, end_port: MAX_PORT, internal }
    }

    /// Create a policy group covering the whole network of a prefix.
    pub fn from_prefix(prefix: &Prefix, internal: bool) -> Self {
        Self::new(prefix.network_address(), prefix.end_address(), internal)
    }

    /// Restrict the group to a range of ports.
    pub fn with_ports(mut self, start_port: u16, end_port: u16) -> Self {
        self.start_port = start_port;
        self.end_port = end_port;
        self
    }

    /// First address
    pub fn start(&self) -> Ipv4Addr {
        self.start
    }

    /// Last address
    pub fn end(&self) -> Ipv4Addr {
        self.end
    }

    /// Returns true if the addresses belong to the analyzed network.
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// Number of addresses in the group
    pub fn size(&self) -> u64 {
        (u32::from(self.end) as u64 + 1).saturating_sub(u32::from(self.start) as u64)
    }

    /// Returns true if the address lies in the group.
    pub fn contains_ip(&self, ip: Ipv4Addr) -> bool {
        self.start <= ip && ip <= self.end
    }

    /// Returns true if the whole network of the prefix lies in the group.
    pub fn contains_prefix(&self, prefix: &Prefix) -> bool {
        self.start <= prefix.network_address() && prefix.end_address() <= self.end
    }

    /// Returns true if the other group (addresses and ports) lies in this group.
    pub fn contains(&self, other: &PolicyGroup) -> bool {
        other.start_port >= self.start_port
            && other.end_port <= self.end_port
            && other.start >= self.start
            && other.end <= self.end
    }

    /// Returns true if the whole group lies in the network of the prefix.
    pub fn within(&self, prefix: &Prefix) -> bool {
        self.start >= prefix.network_address() && self.end <= prefix.end_address()
    }

    /// Returns true if the groups share at least one address and one port.
    pub fn intersects(&self, other: &PolicyGroup) -> bool {
        !(self.end_port < other.start_port
            || self.start_port > other.end_port
            || self.end < other.start
            || self.start > other.end)
    }

    fn key(&self) -> (Ipv4Addr, Ipv4Addr, u16, u16) {
        (self.start, self.end, self.start_port, self.end_port)
    }
}

impl PartialEq for PolicyGroup {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PolicyGroup {}

impl Hash for PolicyGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl PartialOrd for PolicyGroup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PolicyGroup {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for PolicyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} {}-{}", self.start, self.end, self.start_port, self.end_port)
    }
}
