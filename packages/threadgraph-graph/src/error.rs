//! Error types for threadgraph-graph

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// Malformed origin identifier supplied to the projection
    #[error("invalid origin: {0}")]
    Validation(String),

    /// A replica read failed while projecting
    #[error(transparent)]
    Replica(#[from] threadgraph_mirror::MirrorError),
}
