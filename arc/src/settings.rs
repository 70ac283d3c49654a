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

//! # Settings
//!
//! Switches controlling how the graphs are generated and how the verification is run. The
//! settings can be loaded from a JSON file, or set on the command line.

use serde::{Deserialize, Serialize};

/// Run-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log violated assumptions during graph construction as warnings, instead of aborting with an
    /// error.
    pub warn_assumptions: bool,
    /// Discover physical links from interface descriptions, instead of shared subnets.
    pub use_descriptions: bool,
    /// Remove blocked edges and dead vertices from every flow-specific graph.
    pub prune: bool,
    /// Build and verify interface-level graphs instead of process-level graphs.
    pub interface_based: bool,
    /// Only consider flows between internal policy groups.
    pub internal_only: bool,
    /// Skip policy groups with fewer addresses than this.
    pub min_hosts: u64,
    /// Generate and verify the flow-specific graphs on multiple threads.
    pub parallelize: bool,
    /// Number of worker threads. `None` uses one thread per CPU.
    pub n_threads: Option<usize>,
    /// Log the time spent on every flow.
    pub per_flow_timing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            warn_assumptions: true,
            use_descriptions: false,
            prune: false,
            interface_based: false,
            internal_only: false,
            min_hosts: 0,
            parallelize: false,
            n_threads: None,
            per_flow_timing: false,
        }
    }
}

impl Settings {
    /// Returns the number of worker threads to spawn.
    pub fn threads(&self) -> usize {
        match self.n_threads {
            Some(n) if n > 0 => n,
            _ => num_cpus::get(),
        }
    }
}
