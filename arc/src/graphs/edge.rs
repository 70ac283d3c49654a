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

//! Module containing the edge type shared by all graph layers

use crate::network::{IfaceId, Network, NetworkError};
use crate::policy::Flow;
use std::fmt;

/// Weight of an edge which cannot be used
pub const INFINITE_WEIGHT: f64 = f64::MAX;

/// Kind of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Edge crossing a physical link
    InterDevice,
    /// Edge inside a device, e.g. route redistribution
    IntraDevice,
    /// Edge between two routing instances
    InterInstance,
}

/// # Directed Edge
///
/// Edge attributes. The endpoints are stored in the graph itself, so an edge is always looked up
/// by its endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectedEdge {
    /// Cost of using the edge. [`INFINITE_WEIGHT`] marks an edge that cannot be used.
    pub weight: f64,
    /// Kind of the edge
    pub kind: EdgeKind,
    /// The edge is blocked for the flow the graph is customized for.
    pub blocked: bool,
    /// Interface on which traffic leaves the source of the edge
    pub source_iface: Option<IfaceId>,
    /// Interface on which traffic enters the destination of the edge
    pub destination_iface: Option<IfaceId>,
}

impl DirectedEdge {
    /// Create an unblocked edge without interfaces
    pub fn new(weight: f64, kind: EdgeKind) -> Self {
        Self { weight, kind, blocked: false, source_iface: None, destination_iface: None }
    }

    /// Returns true if the edge has infinite weight.
    pub fn is_infinite(&self) -> bool {
        self.weight >= INFINITE_WEIGHT
    }

    /// Block the edge if the outgoing filter of the source interface drops the flow.
    pub fn check_and_block_outgoing(
        &mut self,
        flow: &Flow,
        net: &Network,
    ) -> Result<(), NetworkError> {
        if let Some(id) = self.source_iface {
            let iface = net.interface(id)?;
            if let Some(filter) = iface.outgoing_filter() {
                if flow.is_blocked_by_filter(filter, net.device(id.device)?) {
                    self.blocked = true;
                }
            }
        }
        Ok(())
    }

    /// Block the edge if the incoming filter of the destination interface drops the flow.
    pub fn check_and_block_incoming(
        &mut self,
        flow: &Flow,
        net: &Network,
    ) -> Result<(), NetworkError> {
        if let Some(id) = self.destination_iface {
            let iface = net.interface(id)?;
            if let Some(filter) = iface.incoming_filter() {
                if flow.is_blocked_by_filter(filter, net.device(id.device)?) {
                    self.blocked = true;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for DirectedEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "INF")?;
        } else {
            write!(f, "{}", self.weight)?;
        }
        if self.blocked {
            write!(f, " (blocked)")?;
        }
        Ok(())
    }
}
