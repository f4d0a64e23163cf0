//! Domain models and ports for the mirror
//!
//! # Domain Models
//!
//! - `Topic`: a user-authored container of posts
//! - `Post`: a single post, numbered within its topic
//! - `TopicWithPosts`: a topic together with the posts the source bundled
//!
//! # Port Traits
//!
//! - `EntitySource`: the remote source capability (four operations)
//! - `ReplicaReader`: read accessors over a mirrored replica

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Topic ID on the remote source
pub type TopicId = u64;

/// Post ID on the remote source
pub type PostId = u64;

/// A user-authored topic
///
/// Immutable once mirrored: the mirror never revises a stored topic, so
/// edits and deletions on the source are not captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic ID (primary key on the source)
    pub id: TopicId,
    /// Topic title
    pub title: String,
    /// Creation timestamp (epoch milliseconds)
    pub created_at_ms: i64,
    /// Author username
    pub author_name: String,
}

/// A single post within a topic
///
/// Immutable once mirrored, like [`Topic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post ID (primary key on the source)
    pub id: PostId,
    /// Topic this post belongs to
    pub topic_id: TopicId,
    /// 1-based position of this post within its topic
    pub number_within_topic: u32,
    /// `number_within_topic` of the post this one replies to, if any.
    /// The source leaves this unset both for the first post of a topic and
    /// for replies to the first post.
    pub reply_to_number_within_topic: Option<u32>,
    /// Creation timestamp (epoch milliseconds)
    pub created_at_ms: i64,
    /// Author username
    pub author_name: String,
}

/// A topic together with the posts the source bundled with it
///
/// Not guaranteed to contain every post in the topic; posts missing from the
/// bundle are recovered through the recent-posts feed and point lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicWithPosts {
    pub topic: Topic,
    pub posts: Vec<Post>,
}

/// Remote source capability
///
/// The source exposes only partial, overlapping views of its data: a latest-id
/// probe, per-item lookups, and a bounded recent-posts feed. Synchronization
/// combines all four operations to cover the full id space.
///
/// Withdrawn entities (hidden/removed/not found) are reported as `Ok(None)`,
/// never as errors; they are expected steady-state behavior. Every other
/// non-success outcome is an error.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Get the id of the latest topic on the source.
    ///
    /// # Errors
    ///
    /// Fails with `ErrorKind::Transport` on any non-success status.
    async fn latest_topic_id(&self) -> Result<TopicId>;

    /// Retrieve a topic together with any posts the source bundles with it.
    ///
    /// Returns `None` when the topic is withdrawn.
    async fn topic_with_posts(&self, id: TopicId) -> Result<Option<TopicWithPosts>>;

    /// Retrieve an individual post by id.
    ///
    /// Returns `None` when the post is withdrawn.
    async fn post(&self, id: PostId) -> Result<Option<Post>>;

    /// Retrieve the recent-posts feed: a bounded window of the newest posts,
    /// not necessarily covering every id since the last synchronization.
    async fn latest_posts(&self) -> Result<Vec<Post>>;
}

/// Read accessors over a mirrored replica
///
/// The graph projection consumes a replica through this port so it can run
/// against non-SQLite stand-ins in tests.
pub trait ReplicaReader {
    /// All mirrored topics, in stored order (ascending id).
    fn topics(&self) -> Result<Vec<Topic>>;

    /// All mirrored posts, in stored order (ascending id).
    fn posts(&self) -> Result<Vec<Post>>;

    /// Find the numbered post within a topic.
    ///
    /// Returns `None` when no such post was mirrored.
    fn find_post_in_topic(
        &self,
        topic_id: TopicId,
        number_within_topic: u32,
    ) -> Result<Option<PostId>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_serde() {
        let post = Post {
            id: 7,
            topic_id: 3,
            number_within_topic: 2,
            reply_to_number_within_topic: Some(1),
            created_at_ms: 2003,
            author_name: "credbot".to_string(),
        };

        let json = serde_json::to_string(&post).unwrap();
        let back: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn test_topic_serde() {
        let topic = Topic {
            id: 5,
            title: "topic 5".to_string(),
            created_at_ms: 1000,
            author_name: "credbot".to_string(),
        };

        let json = serde_json::to_string(&topic).unwrap();
        let back: Topic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, topic);
    }
}
