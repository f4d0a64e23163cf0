//! Graph value types
//!
//! A [`Graph`] is built fresh on every projection; nothing here is persisted.
//! Nodes and edges keep their insertion order and are indexed by address, so
//! enumeration is deterministic and repeated adds of the same address are
//! no-ops.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Node kinds produced by the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Topic,
    Post,
    User,
}

/// Edge kinds produced by the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// user → topic or user → post
    Authors,
    /// topic → post
    Contains,
    /// newer post → the post it replies to
    RepliesTo,
}

/// An addressed graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub address: Address,
    pub kind: NodeKind,
    /// Human-readable description (markdown)
    pub description: String,
    /// Creation timestamp (epoch milliseconds); user nodes carry none
    pub timestamp_ms: Option<i64>,
}

/// An addressed, directed graph edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub address: Address,
    pub kind: EdgeKind,
    pub source: Address,
    pub destination: Address,
    pub timestamp_ms: Option<i64>,
}

/// The projected graph: addressed nodes and edges in insertion order
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    node_index: AHashMap<Address, usize>,
    edges: Vec<Edge>,
    edge_index: AHashMap<Address, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; a repeated address is ignored (first write wins).
    pub fn add_node(&mut self, node: Node) {
        if self.node_index.contains_key(&node.address) {
            return;
        }
        self.node_index.insert(node.address.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Add an edge; a repeated address is ignored (first write wins).
    pub fn add_edge(&mut self, edge: Edge) {
        if self.edge_index.contains_key(&edge.address) {
            return;
        }
        self.edge_index.insert(edge.address.clone(), self.edges.len());
        self.edges.push(edge);
    }

    /// Get a node by address (O(1))
    pub fn node(&self, address: &Address) -> Option<&Node> {
        self.node_index.get(address).map(|i| &self.nodes[*i])
    }

    /// Get an edge by address (O(1))
    pub fn edge(&self, address: &Address) -> Option<&Edge> {
        self.edge_index.get(address).map(|i| &self.edges[*i])
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Nodes of one kind (O(N) scan)
    pub fn nodes_by_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.kind == kind).collect()
    }

    /// Edges of one kind (O(E) scan)
    pub fn edges_by_kind(&self, kind: EdgeKind) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
