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

//! Flows that are blocked under every failure scenario

use super::{endpoints, EtgMap, Verifier, VerifierError};
use crate::graphs::TopologyGraph;
use crate::policy::Flow;
use petgraph::algo::has_path_connecting;
use petgraph::visit::{EdgeFiltered, EdgeRef};

/// # Always Blocked
///
/// A flow is always blocked if no path of usable edges (neither blocked nor of infinite weight)
/// leads from the source to the destination. Failures only remove edges, so such a flow stays
/// blocked whatever fails.
#[derive(Debug)]
pub struct AlwaysBlocked<G> {
    etgs: EtgMap<G>,
}

impl<G: TopologyGraph> AlwaysBlocked<G> {
    /// Create the verifier
    pub fn new(etgs: EtgMap<G>) -> Self {
        Self { etgs }
    }
}

impl<G: TopologyGraph> Verifier for AlwaysBlocked<G> {
    type Arg = ();

    fn flows(&self) -> Vec<Flow> {
        self.etgs.keys().cloned().collect()
    }

    fn verify(&self, flow: &Flow, _: &()) -> Result<bool, VerifierError> {
        let (etg, source, destination) = endpoints(&self.etgs, flow)?;
        let usable = EdgeFiltered::from_fn(etg.etg().graph(), |e| {
            !e.weight().blocked && !e.weight().is_infinite()
        });
        Ok(!has_path_connecting(&usable, source, destination, None))
    }

    fn name(&self) -> &'static str {
        "AlwaysBlocked"
    }
}
