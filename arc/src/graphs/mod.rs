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

//! # Extended Topology Graphs
//!
//! All layers share one graph container, [`Etg`]. Each layer wraps it and implements
//! [`TopologyGraph`], which supplies the layer-specific steps of customization: adding the edges
//! of the flow endpoints, blocking edges by ACLs, and removing failed links.
//!
//! The layers are built on top of each other:
//!
//! ```text
//! Network --> DeviceGraph --> ProcessGraph --> InterfaceGraph
//!                                  |
//!                                  '--> InstanceGraph
//! ```
//!
//! Every layer keeps its construction data (the network, derived lookup tables) behind an `Arc`,
//! so cloning a layer only copies its vertices and edges.

pub mod canonical;
mod device_graph;
mod edge;
mod etg;
mod instance_graph;
mod interface_graph;
mod process_graph;
mod vertex;

#[cfg(test)]
pub(crate) use device_graph::normalize_interface_name;
pub use canonical::{Canonicalizer, RankCanonicalizer};
pub use device_graph::DeviceGraph;
pub use edge::{DirectedEdge, EdgeKind, INFINITE_WEIGHT};
pub use etg::{EdgeId, Etg, VertexId};
pub use instance_graph::{Instance, InstanceGraph, InstanceId};
pub use interface_graph::InterfaceGraph;
pub use process_graph::ProcessGraph;
pub use vertex::{Anchor, Vertex, VertexKind};

use crate::network::NetworkError;
use crate::policy::{Flow, PolicyError, PolicyGroup};
use crate::settings::Settings;
use log::*;
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors while generating a graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    /// An assumption about the configuration does not hold, and
    /// [`Settings::warn_assumptions`] is not set.
    #[error("Assumption violated: {0}")]
    AssumptionViolated(String),
    /// A device has more than one interface with the same address
    #[error("{0} has more than one interface with the address {1}")]
    DuplicateAddress(String, Ipv4Addr),
    /// A vertex expected in the graph is missing
    #[error("Vertex not found: {0}")]
    VertexNotFound(String),
    /// The operation requires a customized graph
    #[error("The graph is not customized for a flow")]
    NotCustomized,
    /// A worker thread constructing flow-specific graphs failed
    #[error("Generation task failed: {0}")]
    TaskFailed(String),
    /// Error in the network model
    #[error("Network Error: {0}")]
    NetworkError(#[from] NetworkError),
    /// Error while evaluating a policy
    #[error("Policy Error: {0}")]
    PolicyError(#[from] PolicyError),
}

/// Report a violated assumption. Depending on [`Settings::warn_assumptions`], this either logs a
/// warning and returns `Ok`, or returns [`GeneratorError::AssumptionViolated`].
pub fn assumption_violated(settings: &Settings, message: String) -> Result<(), GeneratorError> {
    if settings.warn_assumptions {
        warn!("Assumption violated: {}", message);
        Ok(())
    } else {
        Err(GeneratorError::AssumptionViolated(message))
    }
}

/// Physical link between two devices, used to simulate failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    /// Device on one end
    pub source_device: String,
    /// Device on the other end
    pub destination_device: String,
}

impl Link {
    /// Create a link between two devices
    pub fn new(source_device: impl Into<String>, destination_device: impl Into<String>) -> Self {
        Self { source_device: source_device.into(), destination_device: destination_device.into() }
    }

    /// Returns true if the two devices are the two ends of the link, in any order.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source_device == a && self.destination_device == b)
            || (self.source_device == b && self.destination_device == a)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.source_device, self.destination_device)
    }
}

/// # Topology Graph
///
/// A graph layer, built on an [`Etg`]. The trait provides the customization protocol:
///
/// 1. [`customize`](TopologyGraph::customize) stores the flow and adds the endpoint vertices. It
///    returns `false` if the graph was customized before.
/// 2. The layer adds the edges of the endpoints ([`construct_endpoint_edges`]).
/// 3. For flows with a concrete source, the layer marks edges blocked by ACLs
///    ([`customize_edges`]).
///
/// [`construct_endpoint_edges`]: TopologyGraph::construct_endpoint_edges
/// [`customize_edges`]: TopologyGraph::customize_edges
pub trait TopologyGraph: Clone + fmt::Debug + Send + Sync {
    /// Element the vertices of this layer stand for
    type Element: Copy + fmt::Debug + Send + Sync;

    /// The underlying graph
    fn etg(&self) -> &Etg<Self::Element>;

    /// The underlying graph, mutable
    fn etg_mut(&mut self) -> &mut Etg<Self::Element>;

    /// Add the edges from the source vertices and to the destination vertex.
    fn construct_endpoint_edges(&mut self) -> Result<(), GeneratorError>;

    /// Mark the edges blocked for the flow.
    fn customize_edges(&mut self) -> Result<(), GeneratorError>;

    /// Remove the edges using a physical link.
    fn remove_link(&mut self, link: &Link);

    /// Customize the graph for a flow. A wildcard flow gets no source vertex; use
    /// [`customize_sources`](TopologyGraph::customize_sources) to give it one per source.
    fn customize(&mut self, flow: &Flow) -> Result<bool, GeneratorError> {
        let sources: Vec<PolicyGroup> = flow.source.iter().cloned().collect();
        self.customize_sources(flow, &sources)
    }

    /// Customize the graph for a flow, with one source vertex for each of the given sources.
    fn customize_sources(
        &mut self,
        flow: &Flow,
        sources: &[PolicyGroup],
    ) -> Result<bool, GeneratorError> {
        if !self.etg_mut().begin_customize(flow, sources) {
            return Ok(false);
        }
        self.construct_endpoint_edges()?;
        if !flow.has_wildcard_source() {
            self.customize_edges()?;
        }
        Ok(true)
    }

    /// Remove every given link.
    fn remove_links(&mut self, links: &[Link]) {
        for link in links {
            self.remove_link(link);
        }
    }

    /// Remove unusable edges and dead vertices. See [`Etg::prune`].
    fn prune(&mut self) {
        self.etg_mut().prune()
    }

    /// Flow the graph is customized for
    fn flow(&self) -> Option<&Flow> {
        self.etg().flow()
    }

    /// Check if two graphs are equivalent. See [`Etg::is_equivalent`].
    fn is_equivalent(&self, other: &Self, canonicalizer: Option<&dyn Canonicalizer>) -> bool {
        self.etg().is_equivalent(other.etg(), canonicalizer)
    }
}
