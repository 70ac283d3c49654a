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

use arc::example_networks::{ExampleNetwork, FirewallNet, RingNet, TwoRouters};
use arc::network::config::NetworkConfig;
use clap::ValueEnum;
use std::fmt;

/// Networks shipped with the library
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Topology {
    TwoRouters,
    Ring,
    Firewall,
}

impl Topology {
    /// Configuration of the selected network
    pub fn config(&self) -> NetworkConfig {
        match self {
            Topology::TwoRouters => TwoRouters::config(),
            Topology::Ring => RingNet::config(),
            Topology::Firewall => FirewallNet::config(),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Topology::TwoRouters => write!(f, "TwoRouters"),
            Topology::Ring => write!(f, "RingNet"),
            Topology::Firewall => write!(f, "FirewallNet"),
        }
    }
}
