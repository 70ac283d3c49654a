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

//! # Two Routers

use super::{flow_between, prefix, ExampleNetwork};
use crate::network::config::*;
use crate::network::{Network, Protocol};
use crate::policy::Flow;
use std::net::Ipv4Addr;

/// # Two Routers
///
/// Two routers with a LAN each, connected by a single link. Both run OSPF on all interfaces and
/// an iBGP session across the link. BGP redistributes OSPF with metric 5.
///
/// ```text
/// 10.1.0.0/24 -- a ---------- b -- 10.2.0.0/24
///                  10.0.0.0/30
/// ```
pub struct TwoRouters {}

impl ExampleNetwork for TwoRouters {
    fn config() -> NetworkConfig {
        let router = |name: &str, link: u8, lan: u8, peer: u8| {
            DeviceConfig::new(name)
                .interface(
                    InterfaceConfig::new("GigabitEthernet0/0")
                        .prefix(prefix(10, 0, 0, link, 30))
                        .ospf_cost(1.0),
                )
                .interface(
                    InterfaceConfig::new("GigabitEthernet0/1")
                        .prefix(prefix(10, lan, 0, 1, 24))
                        .ospf_cost(1.0),
                )
                .ospf(OspfConfig::new(1).network(prefix(10, 0, 0, 0, 8)))
                .bgp(
                    BgpConfig::new(100)
                        .neighbor(Ipv4Addr::new(10, 0, 0, peer))
                        .redistribute(Redistribution::new(Protocol::Ospf).metric(5.0)),
                )
        };
        NetworkConfig::new()
            .device(router("a", 1, 1, 2))
            .device(router("b", 2, 2, 1))
            .policy_group(prefix(10, 1, 0, 0, 24), true)
            .policy_group(prefix(10, 2, 0, 0, 24), true)
    }

    /// From the LAN of `a` to the LAN of `b`
    fn flow(net: &Network) -> Flow {
        flow_between(net, Ipv4Addr::new(10, 1, 0, 1), Ipv4Addr::new(10, 2, 0, 1))
    }
}
