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

//! Cache of flow computations, shared between verification workers

use super::{CapacityGraph, FlowError, MaxFlow, UNBOUNDED};
use log::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Entry = Arc<Mutex<Option<MaxFlow>>>;

/// # Flow Cache
///
/// Stores the last flow computed for every pair of source and destination names. Each entry has
/// its own lock, so workers only wait for each other when they query the same pair.
#[derive(Debug, Default)]
pub struct FlowCache {
    entries: Mutex<HashMap<(String, String), Entry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl FlowCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Max-flow from `source` to `destination` in the graph. If the pair was computed before, the
    /// cached flow is updated with the changes to the graph, otherwise the flow is computed from
    /// scratch and stored.
    pub fn max_flow(
        &self,
        graph: &CapacityGraph,
        source: &str,
        destination: &str,
    ) -> Result<i64, FlowError> {
        let entry = {
            let mut entries = self.entries.lock().map_err(|_| FlowError::LockPoisoned)?;
            entries
                .entry((source.to_string(), destination.to_string()))
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };

        let mut slot = entry.lock().map_err(|_| FlowError::LockPoisoned)?;
        match slot.as_mut() {
            Some(flow) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                flow.recompute_delta(graph)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let mut flow = MaxFlow::new(graph, source, destination)?;
                let value = flow.compute(UNBOUNDED);
                trace!("Max-flow {} -> {} computed from scratch: {}", source, destination, value);
                *slot = Some(flow);
                Ok(value)
            }
        }
    }

    /// Number of queries answered by updating a cached flow
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of queries computed from scratch
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of cached pairs
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all cached flows.
    pub fn clear(&self) -> Result<(), FlowError> {
        self.entries.lock().map_err(|_| FlowError::LockPoisoned)?.clear();
        Ok(())
    }
}
