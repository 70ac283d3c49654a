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

//! Networks for testing

use crate::network::config::NetworkConfig;
use crate::network::{Network, NetworkError, Prefix};
use crate::policy::{Flow, PolicyGroup};
use std::net::Ipv4Addr;

mod two_routers;
pub use two_routers::TwoRouters;

mod ring_net;
pub use ring_net::RingNet;

mod firewall_net;
pub use firewall_net::FirewallNet;

/// Trait for easier access to example networks.
pub trait ExampleNetwork {
    /// Get the configuration of the network
    fn config() -> NetworkConfig;

    /// The flow the network is built to exercise
    fn flow(net: &Network) -> Flow;

    /// Get the network
    fn net() -> Result<Network, NetworkError> {
        Network::from_config(&Self::config())
    }
}

/// Prefix from its four octets and length
pub(crate) fn prefix(a: u8, b: u8, c: u8, d: u8, length: u8) -> Prefix {
    Prefix::new(Ipv4Addr::new(a, b, c, d), length)
}

/// Flow between the policy groups containing the two addresses. Falls back to the whole address
/// space if no policy group contains an address.
pub(crate) fn flow_between(net: &Network, source: Ipv4Addr, destination: Ipv4Addr) -> Flow {
    let group = |ip: Ipv4Addr| {
        net.policy_groups()
            .iter()
            .find(|g| g.contains_ip(ip))
            .cloned()
            .unwrap_or_else(|| PolicyGroup::from_prefix(&prefix(0, 0, 0, 0, 0), false))
    };
    Flow::new(group(source), group(destination))
}
