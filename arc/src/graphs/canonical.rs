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

//! Canonical edge weights, used to compare graphs whose weights differ only in scale

use super::edge::INFINITE_WEIGHT;
use std::collections::HashMap;

/// Edge given by the names of its endpoints and its weight
pub type NamedEdge = (String, String, f64);

/// Maps every edge of a graph to a normalized weight. Two graphs whose edges are ordered the same
/// way by weight should get the same canonical weights.
pub trait Canonicalizer: Send + Sync {
    /// Compute the canonical weight of every edge, keyed by the endpoint names.
    fn canonicalize(&self, edges: &[NamedEdge]) -> HashMap<(String, String), f64>;
}

/// Replaces every finite weight by its rank among the distinct finite weights of the graph.
/// Infinite weights stay infinite.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankCanonicalizer;

impl Canonicalizer for RankCanonicalizer {
    fn canonicalize(&self, edges: &[NamedEdge]) -> HashMap<(String, String), f64> {
        let mut weights: Vec<f64> =
            edges.iter().map(|(_, _, w)| *w).filter(|w| *w < INFINITE_WEIGHT).collect();
        weights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        weights.dedup();

        edges
            .iter()
            .map(|(s, d, w)| {
                let rank = if *w >= INFINITE_WEIGHT {
                    INFINITE_WEIGHT
                } else {
                    weights.iter().position(|x| x == w).unwrap_or(0) as f64
                };
                ((s.clone(), d.clone()), rank)
            })
            .collect()
    }
}
