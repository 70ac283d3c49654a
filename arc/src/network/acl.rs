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

//! # Filters
//!
//! Access lists, prefix lists and route maps as they are stored on a device. The graph layers
//! only refer to them by name; evaluating them against a flow is done in
//! [`Flow`](crate::policy::Flow).

use super::types::{LineAction, Prefix};
use serde::{Deserialize, Serialize};

/// Standard access list, matching on the source address only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardAcl {
    /// Name of the access list
    pub name: String,
    /// Lines, evaluated in order
    #[serde(default)]
    pub lines: Vec<StandardAclLine>,
}

/// Line of a [`StandardAcl`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardAclLine {
    /// Action
    pub action: LineAction,
    /// Source network
    pub source: Prefix,
}

/// Extended access list, matching on source and destination address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedAcl {
    /// Name of the access list
    pub name: String,
    /// Lines, evaluated in order
    #[serde(default)]
    pub lines: Vec<ExtendedAclLine>,
}

/// Line of an [`ExtendedAcl`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedAclLine {
    /// Action
    pub action: LineAction,
    /// Source network
    pub source: Prefix,
    /// Destination network
    pub destination: Prefix,
}

/// Prefix list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixList {
    /// Name of the prefix list
    pub name: String,
    /// Lines, evaluated in order
    #[serde(default)]
    pub lines: Vec<PrefixListLine>,
}

/// Line of a [`PrefixList`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixListLine {
    /// Action
    pub action: LineAction,
    /// Network
    pub prefix: Prefix,
}

/// Route map, a sequence of clauses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMap {
    /// Name of the route map
    pub name: String,
    /// Clauses (evaluated in the order of their sequence number)
    #[serde(default)]
    pub clauses: Vec<RouteMapClause>,
}

impl RouteMap {
    /// Returns the clauses sorted by sequence number.
    pub fn sorted_clauses(&self) -> Vec<&RouteMapClause> {
        let mut clauses: Vec<&RouteMapClause> = self.clauses.iter().collect();
        clauses.sort_by_key(|c| c.seq);
        clauses
    }
}

/// Clause of a [`RouteMap`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMapClause {
    /// Sequence number
    pub seq: u32,
    /// Action
    pub action: LineAction,
    /// Match conditions; all of them must match. A clause without conditions matches everything.
    #[serde(default)]
    pub matches: Vec<RouteMapMatch>,
}

/// Match condition of a [`RouteMapClause`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "names", rename_all = "snake_case")]
pub enum RouteMapMatch {
    /// Match on prefix lists
    PrefixList(Vec<String>),
    /// Match on access lists
    AccessList(Vec<String>),
    /// Match on a route tag
    Tag(Vec<String>),
    /// Match on a BGP community list
    Community(Vec<String>),
}
