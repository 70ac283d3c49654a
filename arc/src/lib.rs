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

#![deny(missing_docs)]

//! # ARC: Abstract Representation for Control planes
//!
//! This library compiles the control-plane configuration of a network (routers, interfaces, ACLs,
//! and BGP, OSPF and static routing) into a layered graph model, the *Extended Topology Graph*
//! (ETG), and answers reachability and isolation questions on it.
//!
//! ## Layers
//!
//! The ETG is built in layers, each derived from the one below:
//!
//! 1. [`DeviceGraph`](graphs::DeviceGraph): one vertex per device, one edge per physical link.
//! 2. [`ProcessGraph`](graphs::ProcessGraph): an `IN`/`OUT` vertex pair per routing process.
//!    Edges model protocol adjacencies and route redistribution. Its weights are adjusted using
//!    the embedded [`InstanceGraph`](graphs::InstanceGraph), the graph of routing instances.
//! 3. [`InterfaceGraph`](graphs::InterfaceGraph): an optional refinement of the process graph on
//!    the level of interfaces.
//!
//! Each layer can be *customized* for a [`Flow`](policy::Flow) of traffic: endpoint vertices for
//! the source and destination are added, and edges are marked as blocked when an ACL on them
//! drops the traffic.
//!
//! ## Verification
//!
//! The customized graphs are checked by the [`verifiers`]. The most involved one is
//! [`AlwaysReachable`](verifiers::AlwaysReachable), which asks whether a flow survives any `k`
//! link failures. It computes a minimum cut with the incremental max-flow engine in [`maxflow`],
//! which reuses earlier results for the same source and destination.
//!
//! ## Example usage
//!
//! ```rust
//! use arc::example_networks::{ExampleNetwork, TwoRouters};
//! use arc::graphs::{DeviceGraph, ProcessGraph, TopologyGraph};
//! use arc::maxflow::FlowCache;
//! use arc::verifiers::{AlwaysReachable, Verifier};
//! use arc::Settings;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let net = Arc::new(TwoRouters::net()?);
//!     let devices = DeviceGraph::new(net.clone(), &settings)?;
//!     let base = ProcessGraph::new(&devices, &settings)?;
//!
//!     let flow = TwoRouters::flow(&net);
//!     let mut etg = base.clone();
//!     assert!(etg.customize(&flow)?);
//!
//!     let etgs = Arc::new(vec![(flow.clone(), Arc::new(etg))].into_iter().collect());
//!     let verifier = AlwaysReachable::new(etgs, Arc::new(FlowCache::new()));
//!     assert!(verifier.verify(&flow, &0)?);
//!     Ok(())
//! }
//! ```

pub mod construct;
pub mod error;
pub mod example_networks;
pub mod graphs;
pub mod maxflow;
pub mod network;
pub mod policy;
pub mod settings;
pub mod verifiers;

pub use error::Error;
pub use settings::Settings;

#[cfg(test)]
mod test;
