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

//! Reachability under link failures

use super::{endpoints, EtgMap, Verifier, VerifierError};
use crate::graphs::TopologyGraph;
use crate::maxflow::{unit_capacity_graph, FlowCache};
use crate::policy::Flow;
use log::*;
use std::sync::Arc;

/// # Always Reachable
///
/// The flow stays reachable with up to `k` failed links if more than `k` links have to fail to
/// disconnect the source from the destination: the min-cut of the graph where every edge crossing
/// a physical link has capacity 1 must be larger than `k`.
#[derive(Debug)]
pub struct AlwaysReachable<G> {
    etgs: EtgMap<G>,
    cache: Arc<FlowCache>,
}

impl<G: TopologyGraph> AlwaysReachable<G> {
    /// Create the verifier. The cache may be shared with other verifiers.
    pub fn new(etgs: EtgMap<G>, cache: Arc<FlowCache>) -> Self {
        Self { etgs, cache }
    }

    /// The cache used for the min-cut computations
    pub fn cache(&self) -> &Arc<FlowCache> {
        &self.cache
    }

    /// Number of links that must fail to disconnect the flow.
    pub fn min_cut(&self, flow: &Flow) -> Result<i64, VerifierError> {
        let (etg, source, destination) = endpoints(&self.etgs, flow)?;
        let etg = etg.etg();
        let graph = unit_capacity_graph(etg);
        let cut =
            self.cache.max_flow(&graph, etg.vertex_name(source), etg.vertex_name(destination))?;
        debug!("Min-cut of {}: {}", flow, cut);
        Ok(cut)
    }
}

impl<G: TopologyGraph> Verifier for AlwaysReachable<G> {
    type Arg = usize;

    fn flows(&self) -> Vec<Flow> {
        self.etgs.keys().cloned().collect()
    }

    fn verify(&self, flow: &Flow, max_failures: &usize) -> Result<bool, VerifierError> {
        Ok(self.min_cut(flow)? > *max_failures as i64)
    }

    fn name(&self) -> &'static str {
        "AlwaysReachable"
    }
}
