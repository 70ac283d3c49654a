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

//! Module containing the vertex type shared by all graph layers

use crate::policy::PolicyGroup;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Role of a vertex in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VertexKind {
    /// Entry point of a process or interface
    In,
    /// Exit point of a process or interface
    Out,
    /// Plain vertex (devices and instances)
    Normal,
    /// Flow source
    Source,
    /// Flow destination
    Destination,
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::Normal => write!(f, "NORMAL"),
            Self::Source => write!(f, "SOURCE"),
            Self::Destination => write!(f, "DESTINATION"),
        }
    }
}

/// What a vertex stands for: a network element of the layer, or a policy group for the flow
/// endpoints.
#[derive(Debug, Clone)]
pub enum Anchor<T> {
    /// Device, process, interface or instance, depending on the layer
    Element(T),
    /// Policy group of a flow endpoint
    Group(PolicyGroup),
}

/// # Vertex
///
/// Vertices are identified by their name and kind. The anchor only refers to the element by its
/// identifier; the element itself lives in the [`Network`](crate::network::Network).
#[derive(Debug, Clone)]
pub struct Vertex<T> {
    name: String,
    kind: VertexKind,
    anchor: Anchor<T>,
}

impl<T: Copy> Vertex<T> {
    /// Create a vertex for a network element.
    pub fn new(name: impl Into<String>, kind: VertexKind, element: T) -> Self {
        Self { name: name.into(), kind, anchor: Anchor::Element(element) }
    }

    /// Create the source vertex of a policy group.
    pub fn source(group: &PolicyGroup) -> Self {
        Self {
            name: format!("{}.{}", VertexKind::Source, group),
            kind: VertexKind::Source,
            anchor: Anchor::Group(group.clone()),
        }
    }

    /// Create the destination vertex of a policy group.
    pub fn destination(group: &PolicyGroup) -> Self {
        Self {
            name: format!("{}.{}", VertexKind::Destination, group),
            kind: VertexKind::Destination,
            anchor: Anchor::Group(group.clone()),
        }
    }

    /// Name of the vertex
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the vertex
    pub fn kind(&self) -> VertexKind {
        self.kind
    }

    /// Anchor of the vertex
    pub fn anchor(&self) -> &Anchor<T> {
        &self.anchor
    }

    /// The network element, or `None` for flow endpoints
    pub fn element(&self) -> Option<T> {
        match self.anchor {
            Anchor::Element(e) => Some(e),
            Anchor::Group(_) => None,
        }
    }

    /// The policy group of a flow endpoint
    pub fn group(&self) -> Option<&PolicyGroup> {
        match &self.anchor {
            Anchor::Group(g) => Some(g),
            Anchor::Element(_) => None,
        }
    }

    /// Returns true for the source and destination vertices of a flow.
    pub fn is_endpoint(&self) -> bool {
        matches!(self.kind, VertexKind::Source | VertexKind::Destination)
    }
}

impl<T> PartialEq for Vertex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl<T> Eq for Vertex<T> {}

impl<T> Hash for Vertex<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
    }
}

impl<T> fmt::Display for Vertex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
