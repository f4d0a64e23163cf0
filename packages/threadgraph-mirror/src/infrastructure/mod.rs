//! Adapters: the SQLite replica and the HTTP source

pub mod http;
pub mod sqlite;

pub use http::{HttpEntitySource, SourceOptions};
pub use sqlite::{SqliteMirror, SyncReport};
