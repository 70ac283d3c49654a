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

//! Edmonds-Karp max-flow with incremental updates

use super::{CapacityGraph, FlowError, UNBOUNDED};
use log::*;
use std::collections::{HashMap, VecDeque};

/// # Max-Flow State
///
/// Capacity and residual matrices for a fixed source and destination. The net flow on an edge
/// `(u, v)` is `capacity[u][v] - residual[u][v]`.
#[derive(Debug, Clone)]
pub struct MaxFlow {
    names: Vec<String>,
    index: HashMap<String, usize>,
    capacity: Vec<Vec<i64>>,
    residual: Vec<Vec<i64>>,
    source: usize,
    destination: usize,
    value: i64,
}

impl MaxFlow {
    /// Prepare a flow computation on the graph. No flow is computed yet.
    pub fn new(graph: &CapacityGraph, source: &str, destination: &str) -> Result<Self, FlowError> {
        let s = graph.vertex(source).ok_or_else(|| FlowError::UnknownVertex(source.into()))?;
        let d = graph
            .vertex(destination)
            .ok_or_else(|| FlowError::UnknownVertex(destination.into()))?;
        let n = graph.len();
        let capacity: Vec<Vec<i64>> =
            (0..n).map(|a| (0..n).map(|b| graph.capacity(a, b)).collect()).collect();
        Ok(Self {
            names: graph.names().to_vec(),
            index: graph.names().iter().cloned().enumerate().map(|(i, n)| (n, i)).collect(),
            residual: capacity.clone(),
            capacity,
            source: s,
            destination: d,
            value: 0,
        })
    }

    /// Current flow value
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Number of vertices tracked by the matrices
    pub fn num_vertices(&self) -> usize {
        self.names.len()
    }

    /// Name of the source vertex
    pub fn source(&self) -> &str {
        &self.names[self.source]
    }

    /// Name of the destination vertex
    pub fn destination(&self) -> &str {
        &self.names[self.destination]
    }

    /// Net flow on the edge between two vertices
    pub fn flow_on(&self, from: &str, to: &str) -> i64 {
        match (self.index.get(from), self.index.get(to)) {
            (Some(a), Some(b)) => self.capacity[*a][*b] - self.residual[*a][*b],
            _ => 0,
        }
    }

    /// Compute the max-flow from scratch, stopping once `limit` units are pushed. Returns the flow
    /// value.
    pub fn compute(&mut self, limit: i64) -> i64 {
        self.residual = self.capacity.clone();
        self.value = if self.source == self.destination {
            0
        } else {
            self.augment(self.source, self.destination, limit)
        };
        self.value
    }

    /// Update the flow for a new graph with the same source and destination. Only edges whose
    /// capacity changed are touched: flow exceeding a reduced capacity is rerouted, or drained back
    /// to the source and destination, and the flow is then augmented again. Vertices missing from
    /// the new graph are dropped once no flow passes them. Returns the new value.
    pub fn recompute_delta(&mut self, graph: &CapacityGraph) -> Result<i64, FlowError> {
        for name in [self.source().to_string(), self.destination().to_string()].iter() {
            if graph.vertex(name).is_none() {
                return Err(FlowError::UnknownVertex(name.clone()));
            }
        }

        // map the new vertices onto the cached indices
        let mapping: Vec<usize> = graph.names().iter().map(|n| self.add_vertex(n)).collect();
        let n = self.names.len();
        let mut updated = vec![vec![0; n]; n];
        for (a, ma) in mapping.iter().enumerate() {
            for (b, mb) in mapping.iter().enumerate() {
                updated[*ma][*mb] = graph.capacity(a, b);
            }
        }

        let mut added = Vec::new();
        let mut removed = Vec::new();
        for (u, row) in updated.iter().enumerate() {
            for (v, c) in row.iter().enumerate() {
                let old = self.capacity[u][v];
                if *c > old {
                    added.push((u, v, *c - old));
                } else if *c < old {
                    removed.push((u, v, old - *c));
                }
            }
        }
        trace!("Delta: {} edges added, {} removed", added.len(), removed.len());

        for (u, v, delta) in removed {
            if !self.decrease(u, v, delta) {
                warn!(
                    "Could not drain the flow over {} -> {}, computing from scratch",
                    self.names[u], self.names[v]
                );
                self.capacity = updated;
                self.residual = self.capacity.clone();
                self.compact(graph);
                return Ok(self.compute(UNBOUNDED));
            }
        }
        for (u, v, delta) in added {
            self.capacity[u][v] += delta;
            self.residual[u][v] += delta;
        }
        if self.source != self.destination {
            self.value += self.augment(self.source, self.destination, UNBOUNDED);
        }
        self.compact(graph);
        Ok(self.value)
    }

    /// Drop the vertices that are not part of `graph` and carry neither capacity nor flow.
    fn compact(&mut self, graph: &CapacityGraph) {
        let n = self.names.len();
        let keep: Vec<usize> = (0..n)
            .filter(|i| {
                *i == self.source
                    || *i == self.destination
                    || graph.vertex(&self.names[*i]).is_some()
                    || self.is_used(*i)
            })
            .collect();
        if keep.len() == n {
            return;
        }
        trace!("Dropping {} stale vertices", n - keep.len());

        let select = |m: &[Vec<i64>]| -> Vec<Vec<i64>> {
            keep.iter().map(|a| keep.iter().map(|b| m[*a][*b]).collect()).collect()
        };
        self.capacity = select(&self.capacity);
        self.residual = select(&self.residual);
        // `keep` is sorted and contains both endpoints
        self.source = keep.iter().take_while(|i| **i < self.source).count();
        self.destination = keep.iter().take_while(|i| **i < self.destination).count();
        self.names = keep.iter().map(|i| self.names[*i].clone()).collect();
        self.index = self.names.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect();
    }

    fn is_used(&self, v: usize) -> bool {
        let matrices = [&self.capacity, &self.residual];
        matrices.iter().any(|m| m[v].iter().any(|c| *c != 0) || m.iter().any(|row| row[v] != 0))
    }

    fn add_vertex(&mut self, name: &str) -> usize {
        if let Some(i) = self.index.get(name) {
            return *i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        for row in self.capacity.iter_mut().chain(self.residual.iter_mut()) {
            row.push(0);
        }
        self.capacity.push(vec![0; i + 1]);
        self.residual.push(vec![0; i + 1]);
        i
    }

    /// Reduce the capacity of an edge, keeping the flow valid. Returns false if the flow exceeding
    /// the new capacity could not be removed.
    fn decrease(&mut self, u: usize, v: usize, delta: i64) -> bool {
        let net = self.capacity[u][v] - self.residual[u][v];
        self.capacity[u][v] -= delta;
        self.residual[u][v] -= delta;
        let excess = net - self.capacity[u][v];
        if excess <= 0 {
            return true;
        }

        // the edge itself has negative residual capacity now, so it is never used below
        let rerouted = self.augment(u, v, excess);
        self.cancel(u, v, rerouted);
        let remaining = excess - rerouted;
        if remaining == 0 {
            return true;
        }

        if u != self.source && self.augment(u, self.source, remaining) < remaining {
            return false;
        }
        if v != self.destination && self.augment(self.destination, v, remaining) < remaining {
            return false;
        }
        self.cancel(u, v, remaining);
        self.value -= remaining;
        true
    }

    /// Remove `amount` units of flow from the edge `(u, v)`.
    fn cancel(&mut self, u: usize, v: usize, amount: i64) {
        self.residual[u][v] += amount;
        self.residual[v][u] -= amount;
    }

    /// Push up to `limit` units along augmenting paths from `from` to `to`. Returns the amount
    /// pushed.
    fn augment(&mut self, from: usize, to: usize, limit: i64) -> i64 {
        let mut total = 0;
        while total < limit {
            let (pred, bottleneck) = match self.bfs(from, to, limit - total) {
                Some(x) => x,
                None => break,
            };
            let mut node = to;
            while node != from {
                let prev = pred[node];
                self.residual[prev][node] -= bottleneck;
                self.residual[node][prev] += bottleneck;
                node = prev;
            }
            total += bottleneck;
        }
        total
    }

    /// Shortest augmenting path from `from` to `to`, as predecessor list and bottleneck capacity.
    fn bfs(&self, from: usize, to: usize, limit: i64) -> Option<(Vec<usize>, i64)> {
        let n = self.names.len();
        let mut pred = vec![usize::MAX; n];
        let mut bottleneck = vec![0; n];
        pred[from] = from;
        bottleneck[from] = limit;
        let mut queue = VecDeque::new();
        queue.push_back(from);
        while let Some(node) = queue.pop_front() {
            if node == to {
                return Some((pred, bottleneck[to]));
            }
            for next in 0..n {
                let residual = self.residual[node][next];
                if residual > 0 && pred[next] == usize::MAX {
                    pred[next] = node;
                    bottleneck[next] = bottleneck[node].min(residual);
                    queue.push_back(next);
                }
            }
        }
        None
    }
}
