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

//! Capacity matrices over named vertices

use super::CAPACITY_LIMIT;
use crate::graphs::{EdgeKind, Etg};
use std::collections::HashMap;
use std::fmt;

/// # Capacity Graph
///
/// Dense capacity matrix. Vertices are identified by name, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    capacity: Vec<Vec<i64>>,
}

impl CapacityGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex, if it does not exist yet, and return its index.
    pub fn add_vertex(&mut self, name: &str) -> usize {
        if let Some(i) = self.index.get(name) {
            return *i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        for row in self.capacity.iter_mut() {
            row.push(0);
        }
        self.capacity.push(vec![0; i + 1]);
        i
    }

    /// Index of a vertex
    pub fn vertex(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Vertex names, by index
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Add capacity to the edge between two vertices (adding the vertices if needed). Weights above
    /// [`CAPACITY_LIMIT`] saturate, fractional weights are truncated.
    pub fn add_capacity(&mut self, from: &str, to: &str, weight: f64) {
        let a = self.add_vertex(from);
        let b = self.add_vertex(to);
        let cell = &mut self.capacity[a][b];
        *cell = if weight > CAPACITY_LIMIT as f64 {
            CAPACITY_LIMIT
        } else {
            (*cell + weight.max(0.0) as i64).min(CAPACITY_LIMIT)
        };
    }

    /// Set the capacity of an edge, adding the vertices if needed. The value is saturated.
    pub fn set_capacity(&mut self, from: &str, to: &str, capacity: i64) {
        let a = self.add_vertex(from);
        let b = self.add_vertex(to);
        self.capacity[a][b] = capacity.max(0).min(CAPACITY_LIMIT);
    }

    /// Capacity between two vertices, by index
    pub fn capacity(&self, from: usize, to: usize) -> i64 {
        self.capacity.get(from).and_then(|row| row.get(to)).copied().unwrap_or(0)
    }

    /// Capacity between two vertices, by name. Zero if either vertex is unknown.
    pub fn capacity_by_name(&self, from: &str, to: &str) -> i64 {
        match (self.vertex(from), self.vertex(to)) {
            (Some(a), Some(b)) => self.capacity(a, b),
            _ => 0,
        }
    }

    /// Number of edges with non-zero capacity
    pub fn edge_count(&self) -> usize {
        self.capacity.iter().flatten().filter(|c| **c > 0).count()
    }
}

impl fmt::Display for CapacityGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (a, row) in self.capacity.iter().enumerate() {
            for (b, c) in row.iter().enumerate().filter(|(_, c)| **c > 0) {
                writeln!(f, "{} -> {} {}", self.names[a], self.names[b], c)?;
            }
        }
        Ok(())
    }
}

/// Capacity graph where every edge crossing a physical link has capacity 1, and every other edge
/// is unconstrained. The minimum cut is the number of links that need to fail to disconnect two
/// vertices.
pub fn unit_capacity_graph<T: Copy + fmt::Debug>(etg: &Etg<T>) -> CapacityGraph {
    build(etg, |kind, _| if kind == EdgeKind::InterDevice { 1.0 } else { f64::MAX })
}

/// Capacity graph using the edge weights as capacities
pub fn weighted_capacity_graph<T: Copy + fmt::Debug>(etg: &Etg<T>) -> CapacityGraph {
    build(etg, |_, weight| weight)
}

fn build<T, F>(etg: &Etg<T>, capacity: F) -> CapacityGraph
where
    T: Copy + fmt::Debug,
    F: Fn(EdgeKind, f64) -> f64,
{
    let mut graph = CapacityGraph::new();
    for v in etg.vertex_ids() {
        graph.add_vertex(etg.vertex_name(v));
    }
    for e in etg.edge_ids() {
        if let (Some((s, d)), Some(edge)) = (etg.edge_endpoints(e), etg.edge(e)) {
            let c = capacity(edge.kind, edge.weight);
            graph.add_capacity(etg.vertex_name(s), etg.vertex_name(d), c);
        }
    }
    graph
}
