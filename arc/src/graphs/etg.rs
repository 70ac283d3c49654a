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

//! # Extended Topology Graph
//!
//! The graph container shared by all layers. It stores the vertices and edges, the optional flow
//! customization (source and destination vertices), and implements pruning and equivalence
//! checking. The layer-specific parts are implemented in the
//! [`TopologyGraph`](super::TopologyGraph) trait.

use super::canonical::{Canonicalizer, NamedEdge};
use super::edge::{DirectedEdge, EdgeKind};
use super::vertex::Vertex;
use crate::network::IfaceId;
use crate::policy::{Flow, PolicyGroup};
use log::*;
use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

type IndexType = u32;
/// Vertex identification (index into the graph)
pub type VertexId = NodeIndex<IndexType>;
/// Edge identification (index into the graph)
pub type EdgeId = EdgeIndex<IndexType>;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// # Extended Topology Graph
///
/// Vertices are unique by name, and at most one edge exists between an ordered pair of vertices.
/// Cloning the graph copies all vertices and edges, so a clone can be customized without touching
/// the original.
#[derive(Debug, Clone)]
pub struct Etg<T> {
    graph: StableGraph<Vertex<T>, DirectedEdge, Directed, IndexType>,
    names: HashMap<String, VertexId>,
    flow: Option<Flow>,
    sources: BTreeMap<PolicyGroup, VertexId>,
    destination: Option<VertexId>,
}

impl<T: Copy + fmt::Debug> Default for Etg<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + fmt::Debug> Etg<T> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            graph: StableGraph::default(),
            names: HashMap::new(),
            flow: None,
            sources: BTreeMap::new(),
            destination: None,
        }
    }

    /// Add a vertex. If a vertex with the same name exists, it is kept and its id is returned.
    pub fn add_vertex(&mut self, vertex: Vertex<T>) -> VertexId {
        if let Some(id) = self.names.get(vertex.name()) {
            return *id;
        }
        let name = vertex.name().to_string();
        let id = self.graph.add_node(vertex);
        self.names.insert(name, id);
        id
    }

    /// Remove a vertex together with all its edges.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<Vertex<T>> {
        let vertex = self.graph.remove_node(id)?;
        self.names.remove(vertex.name());
        self.sources.retain(|_, v| *v != id);
        if self.destination == Some(id) {
            self.destination = None;
        }
        Some(vertex)
    }

    /// Returns the id of the vertex with the given name.
    pub fn vertex_id(&self, name: &str) -> Option<VertexId> {
        self.names.get(name).copied()
    }

    /// Returns the vertex with the given name.
    pub fn get_vertex(&self, name: &str) -> Option<&Vertex<T>> {
        self.vertex_id(name).and_then(|id| self.graph.node_weight(id))
    }

    /// Returns the vertex with the given id.
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex<T>> {
        self.graph.node_weight(id)
    }

    /// Returns the name of a vertex, or an empty string if it does not exist.
    pub fn vertex_name(&self, id: VertexId) -> &str {
        self.graph.node_weight(id).map(|v| v.name()).unwrap_or("")
    }

    /// Ids of all vertices
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.graph.node_indices().collect()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Ids of all edges
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.graph.edge_indices().collect()
    }

    /// Add an edge. If the edge exists already, its weight and kind are updated, and the existing
    /// edge is returned.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        destination: VertexId,
        weight: f64,
        kind: EdgeKind,
    ) -> EdgeId {
        match self.graph.find_edge(source, destination) {
            Some(id) => {
                if let Some(edge) = self.graph.edge_weight_mut(id) {
                    edge.weight = weight;
                    edge.kind = kind;
                }
                id
            }
            None => self.graph.add_edge(source, destination, DirectedEdge::new(weight, kind)),
        }
    }

    /// Add an edge annotated with the interfaces it uses. Like [`Etg::add_edge`], an existing edge
    /// is updated (including its interfaces) and returned.
    pub fn add_edge_with_ifaces(
        &mut self,
        source: VertexId,
        destination: VertexId,
        weight: f64,
        kind: EdgeKind,
        source_iface: Option<IfaceId>,
        destination_iface: Option<IfaceId>,
    ) -> EdgeId {
        let id = self.add_edge(source, destination, weight, kind);
        if let Some(edge) = self.graph.edge_weight_mut(id) {
            edge.source_iface = source_iface;
            edge.destination_iface = destination_iface;
        }
        id
    }

    /// Remove an edge
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<DirectedEdge> {
        self.graph.remove_edge(id)
    }

    /// Returns the edge from `source` to `destination`, if it exists.
    pub fn find_edge(&self, source: VertexId, destination: VertexId) -> Option<EdgeId> {
        self.graph.find_edge(source, destination)
    }

    /// Returns true if there is an edge from `source` to `destination`.
    pub fn contains_edge(&self, source: VertexId, destination: VertexId) -> bool {
        self.graph.find_edge(source, destination).is_some()
    }

    /// Attributes of an edge
    pub fn edge(&self, id: EdgeId) -> Option<&DirectedEdge> {
        self.graph.edge_weight(id)
    }

    /// Mutable attributes of an edge
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut DirectedEdge> {
        self.graph.edge_weight_mut(id)
    }

    /// Source and destination of an edge
    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(VertexId, VertexId)> {
        self.graph.edge_endpoints(id)
    }

    /// Weight of an edge, or `None` if the edge does not exist.
    pub fn edge_weight(&self, source: VertexId, destination: VertexId) -> Option<f64> {
        self.find_edge(source, destination).and_then(|e| self.edge(e)).map(|e| e.weight)
    }

    /// Change the weight of the edge from `source` to `destination`. Returns false if there is no
    /// such edge.
    pub fn set_edge_weight(
        &mut self,
        source: VertexId,
        destination: VertexId,
        weight: f64,
    ) -> bool {
        match self.find_edge(source, destination).and_then(|e| self.graph.edge_weight_mut(e)) {
            Some(edge) => {
                edge.weight = weight;
                true
            }
            None => false,
        }
    }

    /// Edges ending at the vertex
    pub fn incoming_edges(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.graph.edges_directed(vertex, Incoming).map(|e| e.id()).collect()
    }

    /// Edges starting at the vertex
    pub fn outgoing_edges(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.graph.edges_directed(vertex, Outgoing).map(|e| e.id()).collect()
    }

    /// The underlying graph
    pub fn graph(&self) -> &StableGraph<Vertex<T>, DirectedEdge, Directed, IndexType> {
        &self.graph
    }

    /// Flow the graph is customized for
    pub fn flow(&self) -> Option<&Flow> {
        self.flow.as_ref()
    }

    /// Source vertices, by policy group
    pub fn source_vertices(&self) -> &BTreeMap<PolicyGroup, VertexId> {
        &self.sources
    }

    /// Source vertex of the given policy group
    pub fn source_vertex(&self, group: &PolicyGroup) -> Option<VertexId> {
        self.sources.get(group).copied()
    }

    /// Destination vertex
    pub fn destination_vertex(&self) -> Option<VertexId> {
        self.destination
    }

    /// Returns true if the vertex is a flow source or destination.
    pub fn is_endpoint(&self, vertex: VertexId) -> bool {
        self.graph.node_weight(vertex).map_or(false, |v| v.is_endpoint())
    }

    /// Store the flow and add the endpoint vertices. Returns false, without changing anything, if
    /// the graph is already customized.
    pub(crate) fn begin_customize(&mut self, flow: &Flow, sources: &[PolicyGroup]) -> bool {
        if self.flow.is_some() {
            return false;
        }
        self.flow = Some(flow.clone());
        for group in sources {
            let id = self.add_vertex(Vertex::source(group));
            self.sources.insert(group.clone(), id);
        }
        self.destination = Some(self.add_vertex(Vertex::destination(&flow.destination)));
        true
    }

    /// Remove all edges that are blocked or have infinite weight, then repeatedly remove vertices
    /// (other than flow endpoints) without incoming or without outgoing edges.
    pub fn prune(&mut self) {
        let unusable: Vec<EdgeId> = self
            .graph
            .edge_indices()
            .filter(|e| self.graph.edge_weight(*e).map_or(false, |e| e.blocked || e.is_infinite()))
            .collect();
        for e in unusable {
            self.graph.remove_edge(e);
        }

        loop {
            let dead: Vec<VertexId> = self
                .graph
                .node_indices()
                .filter(|v| !self.is_endpoint(*v))
                .filter(|v| {
                    self.graph.edges_directed(*v, Incoming).next().is_none()
                        || self.graph.edges_directed(*v, Outgoing).next().is_none()
                })
                .collect();
            if dead.is_empty() {
                break;
            }
            for v in dead {
                self.remove_vertex(v);
            }
        }
    }

    /// All edges as `(source name, destination name, weight)`
    pub fn named_edges(&self) -> Vec<NamedEdge> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (s, d) = self.graph.edge_endpoints(e)?;
                let weight = self.graph.edge_weight(e)?.weight;
                Some((self.vertex_name(s).to_string(), self.vertex_name(d).to_string(), weight))
            })
            .collect()
    }

    /// Check if two graphs have the same structure: the same vertices, and for every edge an edge
    /// between vertices with the same names. If a canonicalizer is given, the canonical edge
    /// weights must match as well. Without it, weights are not compared.
    pub fn is_equivalent(&self, other: &Etg<T>, canonicalizer: Option<&dyn Canonicalizer>) -> bool {
        if self.vertex_count() != other.vertex_count() {
            return false;
        }
        for vertex in self.graph.node_indices().filter_map(|v| self.graph.node_weight(v)) {
            match other.get_vertex(vertex.name()) {
                Some(v) if v.kind() == vertex.kind() => {}
                _ => return false,
            }
        }

        if self.edge_count() != other.edge_count() {
            return false;
        }
        let edges = self.named_edges();
        for (s, d, _) in edges.iter() {
            let found = match (other.vertex_id(s), other.vertex_id(d)) {
                (Some(a), Some(b)) => other.contains_edge(a, b),
                _ => false,
            };
            if !found {
                return false;
            }
        }

        match canonicalizer {
            Some(canonicalizer) => {
                let mine = canonicalizer.canonicalize(&edges);
                let theirs = canonicalizer.canonicalize(&other.named_edges());
                mine.iter().all(|(key, w)| {
                    theirs.get(key).map_or(false, |v| (v - w).abs() <= WEIGHT_TOLERANCE)
                })
            }
            None => {
                warn!("No canonicalizer available, comparing the structure only");
                true
            }
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Display for Etg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(flow) = self.flow.as_ref() {
            writeln!(f, "Flow: {}", flow)?;
        }
        for e in self.graph.edge_indices() {
            if let (Some((s, d)), Some(edge)) =
                (self.graph.edge_endpoints(e), self.graph.edge_weight(e))
            {
                writeln!(f, "{} -> {} {}", self.vertex_name(s), self.vertex_name(d), edge)?;
            }
        }
        Ok(())
    }
}
