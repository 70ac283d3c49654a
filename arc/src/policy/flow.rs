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

//! Module containing the flow and its blocking predicates

use super::{PolicyError, PolicyGroup};
use crate::network::acl::{ExtendedAcl, PrefixList, RouteMap, RouteMapMatch, StandardAcl};
use crate::network::{Device, LineAction};
use std::fmt;

/// # Flow
///
/// Traffic from a source policy group to a destination policy group. A flow without source (a
/// *wildcard* flow) stands for all sources sending to the destination with the same blocking
/// behavior.
///
/// All blocking predicates return `false` for a wildcard flow, since there is no single source to
/// evaluate them for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Flow {
    /// Entities sending traffic. `None` for a wildcard flow.
    pub source: Option<PolicyGroup>,
    /// Entities receiving traffic
    pub destination: PolicyGroup,
}

impl Flow {
    /// Create a flow from a source to a destination.
    pub fn new(source: PolicyGroup, destination: PolicyGroup) -> Self {
        Self { source: Some(source), destination }
    }

    /// Create a wildcard flow towards the destination.
    pub fn wildcard(destination: PolicyGroup) -> Self {
        Self { source: None, destination }
    }

    /// Returns true if the flow has no concrete source.
    pub fn has_wildcard_source(&self) -> bool {
        self.source.is_none()
    }

    /// Evaluate a standard access list: the first line whose network contains the whole source
    /// decides. Traffic matching no line is blocked.
    pub fn is_blocked_by_standard_acl(&self, acl: &StandardAcl) -> bool {
        let source = match self.source.as_ref() {
            Some(s) => s,
            None => return false,
        };
        acl.lines
            .iter()
            .find(|line| source.within(&line.source))
            .map_or(true, |line| line.action == LineAction::Deny)
    }

    /// Evaluate an extended access list: the first line matching both source and destination
    /// decides. Traffic matching no line is blocked.
    pub fn is_blocked_by_extended_acl(&self, acl: &ExtendedAcl) -> bool {
        let source = match self.source.as_ref() {
            Some(s) => s,
            None => return false,
        };
        acl.lines
            .iter()
            .find(|line| source.within(&line.source) && self.destination.within(&line.destination))
            .map_or(true, |line| line.action == LineAction::Deny)
    }

    /// Evaluate a prefix list on the destination. Destinations matching no line are blocked.
    pub fn is_blocked_by_prefix_list(&self, list: &PrefixList) -> bool {
        if self.source.is_none() {
            return false;
        }
        list.lines
            .iter()
            .find(|line| self.destination.within(&line.prefix))
            .map_or(true, |line| line.action == LineAction::Deny)
    }

    /// Evaluate a route map. The clauses are evaluated by sequence number, and the first clause
    /// whose match conditions all hold decides. A clause without conditions matches everything.
    /// Prefix-list conditions use the first named list; access-list conditions look for a standard
    /// list first, then for an extended one. Other conditions cannot be evaluated for a flow.
    pub fn is_blocked_by_route_map(
        &self,
        map: &RouteMap,
        device: &Device,
    ) -> Result<bool, PolicyError> {
        if self.source.is_none() {
            return Ok(false);
        }
        for clause in map.sorted_clauses() {
            let mut matches = true;
            for condition in clause.matches.iter() {
                let permitted = match condition {
                    RouteMapMatch::PrefixList(names) => names
                        .first()
                        .and_then(|n| device.prefix_list(n))
                        .map_or(false, |l| !self.is_blocked_by_prefix_list(l)),
                    RouteMapMatch::AccessList(names) => names
                        .first()
                        .map(|n| !self.is_blocked_by_filter(n, device))
                        .unwrap_or(false),
                    other => {
                        return Err(PolicyError::UnsupportedMatch(map.name.clone(), other.clone()))
                    }
                };
                if !permitted {
                    matches = false;
                    break;
                }
            }
            if matches {
                return Ok(clause.action == LineAction::Deny);
            }
        }
        Ok(true)
    }

    /// Evaluate the access list with the given name on the device, looking for a standard list
    /// first and for an extended list second. Unknown filters do not block anything.
    pub fn is_blocked_by_filter(&self, name: &str, device: &Device) -> bool {
        if let Some(acl) = device.standard_acl(name) {
            self.is_blocked_by_standard_acl(acl)
        } else if let Some(acl) = device.extended_acl(name) {
            self.is_blocked_by_extended_acl(acl)
        } else {
            false
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source.as_ref() {
            Some(source) => write!(f, "{} -> {}", source, self.destination),
            None => write!(f, "* -> {}", self.destination),
        }
    }
}
