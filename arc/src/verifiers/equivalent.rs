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

//! Equivalence of two sets of graphs, e.g. before and after a configuration change

use super::{EtgMap, Verifier, VerifierError};
use crate::graphs::{Canonicalizer, TopologyGraph};
use crate::policy::Flow;
use log::*;
use std::fmt;
use std::sync::Arc;

/// # Equivalent
///
/// Compares the graph of a flow with the graph of the same flow in another map. Without a
/// canonicalizer, only the structure is compared. A flow missing in the other map is not
/// equivalent.
pub struct Equivalent<G> {
    etgs: EtgMap<G>,
    canonicalizer: Option<Arc<dyn Canonicalizer>>,
}

impl<G: TopologyGraph> Equivalent<G> {
    /// Create the verifier
    pub fn new(etgs: EtgMap<G>, canonicalizer: Option<Arc<dyn Canonicalizer>>) -> Self {
        Self { etgs, canonicalizer }
    }
}

impl<G> fmt::Debug for Equivalent<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equivalent")
            .field("flows", &self.etgs.len())
            .field("canonicalizer", &self.canonicalizer.is_some())
            .finish()
    }
}

impl<G: TopologyGraph> Verifier for Equivalent<G> {
    /// The graphs to compare with
    type Arg = EtgMap<G>;

    fn flows(&self) -> Vec<Flow> {
        self.etgs.keys().cloned().collect()
    }

    fn verify(&self, flow: &Flow, others: &EtgMap<G>) -> Result<bool, VerifierError> {
        let mine = self.etgs.get(flow).ok_or_else(|| VerifierError::NoEtg(flow.clone()))?;
        match others.get(flow) {
            Some(theirs) => Ok(mine.is_equivalent(theirs, self.canonicalizer.as_deref())),
            None => {
                debug!("{} has no graph to compare with", flow);
                Ok(false)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Equivalent"
    }
}
