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

//! Isolation of two flows

use super::{EtgMap, Verifier, VerifierError};
use crate::graphs::{Etg, TopologyGraph};
use crate::policy::Flow;
use std::collections::HashSet;
use std::fmt;

/// # Always Isolated
///
/// Two flows are isolated if their graphs have no edge in common, ignoring the edges of the flow
/// endpoints. Edges are matched by the names of their vertices.
#[derive(Debug)]
pub struct AlwaysIsolated<G> {
    etgs: EtgMap<G>,
}

impl<G: TopologyGraph> AlwaysIsolated<G> {
    /// Create the verifier
    pub fn new(etgs: EtgMap<G>) -> Self {
        Self { etgs }
    }
}

fn inner_edges<T: Copy + fmt::Debug>(etg: &Etg<T>) -> HashSet<(&str, &str)> {
    etg.edge_ids()
        .into_iter()
        .filter_map(|e| etg.edge_endpoints(e))
        .filter(|(s, d)| !etg.is_endpoint(*s) && !etg.is_endpoint(*d))
        .map(|(s, d)| (etg.vertex_name(s), etg.vertex_name(d)))
        .collect()
}

impl<G: TopologyGraph> Verifier for AlwaysIsolated<G> {
    /// The flow to compare with
    type Arg = Flow;

    fn flows(&self) -> Vec<Flow> {
        self.etgs.keys().cloned().collect()
    }

    fn verify(&self, flow: &Flow, other: &Flow) -> Result<bool, VerifierError> {
        let mine = self.etgs.get(flow).ok_or_else(|| VerifierError::NoEtg(flow.clone()))?;
        let theirs = self.etgs.get(other).ok_or_else(|| VerifierError::NoEtg(other.clone()))?;
        let mine = inner_edges(mine.etg());
        Ok(inner_edges(theirs.etg()).is_disjoint(&mine))
    }

    fn name(&self) -> &'static str {
        "AlwaysIsolated"
    }
}
