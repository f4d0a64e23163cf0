//! Deterministic graph projection over a mirrored replica.
//!
//! Projects one origin's replica (see `threadgraph-mirror`) into a typed
//! node/edge graph: topic, post, and user nodes joined by authors, contains,
//! and repliesTo edges. Addresses are hierarchical token sequences namespaced
//! by kind and origin, so graphs built from several origins compose into one
//! global analysis graph without collisions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use threadgraph_graph::build_graph;
//!
//! mirror.synchronize().await?;
//! let graph = build_graph("https://forum.example", &mirror)?;
//! ```

pub mod address;
pub mod builder;
pub mod domain;
pub mod error;

pub use address::{
    authors_address, contains_address, post_address, replies_to_address, topic_address,
    user_address, Address, ContentKind,
};
pub use builder::build_graph;
pub use domain::{Edge, EdgeKind, Graph, Node, NodeKind};
pub use error::{GraphError, Result};
