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

//! Flows blocked on the currently preferred path

use super::{endpoints, EtgMap, Verifier, VerifierError};
use crate::graphs::{TopologyGraph, INFINITE_WEIGHT};
use crate::policy::Flow;
use log::*;
use petgraph::algo::astar;
use petgraph::visit::EdgeRef;

/// # Currently Blocked
///
/// Computes the cheapest path from the source to the destination, the path the control plane
/// selects without failures. The flow is blocked if there is no path of finite cost, or if any
/// edge on the path is blocked by an ACL.
#[derive(Debug)]
pub struct CurrentlyBlocked<G> {
    etgs: EtgMap<G>,
}

impl<G: TopologyGraph> CurrentlyBlocked<G> {
    /// Create the verifier
    pub fn new(etgs: EtgMap<G>) -> Self {
        Self { etgs }
    }
}

impl<G: TopologyGraph> Verifier for CurrentlyBlocked<G> {
    type Arg = ();

    fn flows(&self) -> Vec<Flow> {
        self.etgs.keys().cloned().collect()
    }

    fn verify(&self, flow: &Flow, _: &()) -> Result<bool, VerifierError> {
        let (etg, source, destination) = endpoints(&self.etgs, flow)?;
        let etg = etg.etg();
        let (cost, path) = match astar(
            etg.graph(),
            source,
            |v| v == destination,
            |e| e.weight().weight,
            |_| 0.0,
        ) {
            Some(x) => x,
            None => return Ok(true),
        };
        if cost >= INFINITE_WEIGHT {
            return Ok(true);
        }

        let blocked = path.windows(2).any(|hop| {
            etg.find_edge(hop[0], hop[1]).and_then(|e| etg.edge(e)).map_or(true, |e| e.blocked)
        });
        trace!("Current path of {} has cost {}, blocked: {}", flow, cost, blocked);
        Ok(blocked)
    }

    fn name(&self) -> &'static str {
        "CurrentlyBlocked"
    }
}
