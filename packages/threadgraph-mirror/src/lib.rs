//! Local durable replica of a remote forum-style content source.
//!
//! The remote source exposes only partial, overlapping views of its data: a
//! latest-id probe, a bounded recent-posts feed, and per-item point lookups.
//! [`SqliteMirror::synchronize`] combines the three into an idempotent
//! catch-up pass, so re-fetching everything is never required and a network
//! fault only costs the data not yet downloaded.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use threadgraph_mirror::{HttpEntitySource, SourceOptions, SqliteMirror};
//!
//! let source = Arc::new(HttpEntitySource::new(SourceOptions {
//!     base_url: "https://forum.example".into(),
//!     api_key: "...".into(),
//!     api_username: "credbot".into(),
//! })?);
//! let mirror = SqliteMirror::new("forum.db", source, "https://forum.example")?;
//! let report = mirror.synchronize().await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::{EntitySource, Post, PostId, ReplicaReader, Topic, TopicId, TopicWithPosts};
pub use error::{ErrorKind, MirrorError, Result};
pub use infrastructure::{HttpEntitySource, SourceOptions, SqliteMirror, SyncReport};
