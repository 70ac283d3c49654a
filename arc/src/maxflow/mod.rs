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

//! # Incremental Max-Flow
//!
//! Computes the maximum flow (equal to the minimum cut) between two vertices of a
//! [`CapacityGraph`]. The [`FlowCache`] keeps the last result for every pair of source and
//! destination names, and updates it for the next graph with the same pair by only applying the
//! capacity changes, instead of starting from scratch.
//!
//! ```
//! use arc::maxflow::{CapacityGraph, FlowCache};
//!
//! let mut graph = CapacityGraph::new();
//! graph.add_capacity("s", "a", 1.0);
//! graph.add_capacity("a", "d", 1.0);
//! graph.add_capacity("s", "d", 1.0);
//!
//! let cache = FlowCache::new();
//! assert_eq!(cache.max_flow(&graph, "s", "d").unwrap(), 2);
//!
//! graph.set_capacity("s", "d", 0);
//! assert_eq!(cache.max_flow(&graph, "s", "d").unwrap(), 1);
//! assert_eq!(cache.hits(), 1);
//! ```

mod cache;
mod capacity;
mod engine;

pub use cache::FlowCache;
pub use capacity::{unit_capacity_graph, weighted_capacity_graph, CapacityGraph};
pub use engine::MaxFlow;

use thiserror::Error;

/// Capacities are saturated at this value. An edge with at least this capacity is treated as
/// unconstrained.
pub const CAPACITY_LIMIT: i64 = 10_000;

/// Flow value used as limit when computing an unbounded flow
pub const UNBOUNDED: i64 = i64::MAX;

/// Errors of the flow engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A lock on the cache was poisoned by a panicking thread.
    #[error("Flow cache lock poisoned")]
    LockPoisoned,
    /// The source or destination is not a vertex of the graph.
    #[error("Vertex not in the capacity graph: {0}")]
    UnknownVertex(String),
}
