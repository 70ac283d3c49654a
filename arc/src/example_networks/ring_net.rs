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

//! # Ring Network

use super::{flow_between, prefix, ExampleNetwork};
use crate::network::config::*;
use crate::network::Network;
use crate::policy::Flow;
use std::net::Ipv4Addr;

/// Number of routers in the ring
const N: u8 = 4;

/// # Ring Network
///
/// Four routers in a ring, running OSPF only. Router `ri` has the LAN `10.(10+i).0.0/24`, and the
/// link from `ri` to the next router uses `10.0.i.0/30`. Two links must fail to separate any two
/// LANs.
///
/// ```text
/// r0 ---- r1
///  |      |
/// r3 ---- r2
/// ```
pub struct RingNet {}

impl ExampleNetwork for RingNet {
    fn config() -> NetworkConfig {
        let mut config = NetworkConfig::new();
        for i in 0..N {
            let previous = (i + N - 1) % N;
            config = config
                .device(
                    DeviceConfig::new(format!("r{}", i))
                        .interface(
                            InterfaceConfig::new("GigabitEthernet0/0")
                                .prefix(prefix(10, 0, i, 1, 30))
                                .ospf_cost(1.0),
                        )
                        .interface(
                            InterfaceConfig::new("GigabitEthernet0/1")
                                .prefix(prefix(10, 0, previous, 2, 30))
                                .ospf_cost(1.0),
                        )
                        .interface(
                            InterfaceConfig::new("GigabitEthernet0/2")
                                .prefix(prefix(10, 10 + i, 0, 1, 24))
                                .ospf_cost(1.0),
                        )
                        .ospf(OspfConfig::new(1).network(prefix(10, 0, 0, 0, 8))),
                )
                .policy_group(prefix(10, 10 + i, 0, 0, 24), true);
        }
        config
    }

    /// From the LAN of `r0` to the LAN of `r2`
    fn flow(net: &Network) -> Flow {
        flow_between(net, Ipv4Addr::new(10, 10, 0, 1), Ipv4Addr::new(10, 12, 0, 1))
    }
}
