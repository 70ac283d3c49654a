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

//! # Traffic Classes
//!
//! [`PolicyGroup`]s describe endpoints of traffic, and a [`Flow`] connects two of them. The flow
//! also knows how to evaluate access lists, prefix lists and route maps on itself.

mod flow;
mod policy_group;

pub use flow::Flow;
pub use policy_group::{PolicyGroup, MAX_PORT, MIN_PORT};

use crate::network::acl::RouteMapMatch;
use thiserror::Error;

/// Error while evaluating a policy on a flow
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// The route map uses a match condition which cannot be evaluated on a flow
    #[error("Route map {0} has an unsupported match condition: {1:?}")]
    UnsupportedMatch(String, RouteMapMatch),
}
