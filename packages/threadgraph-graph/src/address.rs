//! Hierarchical addresses for graph entities
//!
//! Every address is a token sequence of the form
//! `[namespace, kind, origin, local id...]`. Two addresses are equal iff
//! their token sequences are equal, so distinct kinds, distinct origins, and
//! distinct local ids can never collide — including edges that share both
//! endpoints with a same-kind edge of a different relation, whose addresses
//! still differ in the kind or content-kind token.

use serde::{Deserialize, Serialize};
use std::fmt;

use threadgraph_mirror::{PostId, TopicId};

/// Namespace token leading every address minted by this crate.
const NAMESPACE: &str = "threadgraph";

/// A hierarchical, globally-unique identifier for a node or edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(Vec<String>);

impl Address {
    pub fn new(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("\u{0}"))
    }
}

/// The kind of content an authors edge points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Topic,
    Post,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Topic => "topic",
            ContentKind::Post => "post",
        }
    }
}

pub fn topic_address(origin: &str, id: TopicId) -> Address {
    let id = id.to_string();
    Address::new([NAMESPACE, "topic", origin, id.as_str()])
}

pub fn post_address(origin: &str, id: PostId) -> Address {
    let id = id.to_string();
    Address::new([NAMESPACE, "post", origin, id.as_str()])
}

pub fn user_address(origin: &str, name: &str) -> Address {
    Address::new([NAMESPACE, "user", origin, name])
}

/// Authors edge: user → topic or user → post. The content-kind token keeps a
/// topic and a post with the same numeric id apart.
pub fn authors_address(
    content: ContentKind,
    origin: &str,
    author_name: &str,
    content_id: u64,
) -> Address {
    let content_id = content_id.to_string();
    Address::new([
        NAMESPACE,
        "authors",
        content.as_str(),
        origin,
        author_name,
        content_id.as_str(),
    ])
}

/// Contains edge: topic → post.
pub fn contains_address(origin: &str, topic_id: TopicId, post_id: PostId) -> Address {
    let topic_id = topic_id.to_string();
    let post_id = post_id.to_string();
    Address::new([
        NAMESPACE,
        "contains",
        origin,
        topic_id.as_str(),
        post_id.as_str(),
    ])
}

/// RepliesTo edge: the newer post → the post it replies to.
pub fn replies_to_address(origin: &str, reply_post_id: PostId, base_post_id: PostId) -> Address {
    let reply_post_id = reply_post_id.to_string();
    let base_post_id = base_post_id.to_string();
    Address::new([
        NAMESPACE,
        "replies_to",
        origin,
        reply_post_id.as_str(),
        base_post_id.as_str(),
    ])
}
