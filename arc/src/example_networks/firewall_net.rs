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

//! # Firewall Network

use super::two_routers::TwoRouters;
use super::ExampleNetwork;
use crate::network::acl::{StandardAcl, StandardAclLine};
use crate::network::config::*;
use crate::network::{LineAction, Network};
use crate::policy::Flow;

/// # Firewall Network
///
/// The network of [`TwoRouters`], where the LAN interface of `a` filters all traffic sourced in
/// the LAN of `a`, in both directions. Traffic from the LAN of `b` passes.
pub struct FirewallNet {}

impl ExampleNetwork for FirewallNet {
    fn config() -> NetworkConfig {
        let mut config = TwoRouters::config();
        let line = |action, a, b, c, d, len| StandardAclLine {
            action,
            source: super::prefix(a, b, c, d, len),
        };
        let acl = StandardAcl {
            name: "LAN_A".to_string(),
            lines: vec![
                line(LineAction::Deny, 10, 1, 0, 0, 24),
                line(LineAction::Permit, 0, 0, 0, 0, 0),
            ],
        };
        for device in config.devices.iter_mut().filter(|d| d.hostname == "a") {
            device.standard_acls.push(acl.clone());
            for iface in device.interfaces.iter_mut().filter(|i| i.name == "GigabitEthernet0/1") {
                iface.incoming_filter = Some("LAN_A".to_string());
                iface.outgoing_filter = Some("LAN_A".to_string());
            }
        }
        config
    }

    /// From the LAN of `a` to the LAN of `b`, blocked by the filter
    fn flow(net: &Network) -> Flow {
        TwoRouters::flow(net)
    }
}
