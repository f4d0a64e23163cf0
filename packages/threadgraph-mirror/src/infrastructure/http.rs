//! HTTP adapter for the remote source API
//!
//! The source's JSON endpoints return far more than the mirror cares about,
//! so the adapter deserializes only the fields it needs and maps them onto
//! the domain models.
//!
//! Status interpretation: per-item lookups treat 403 and 404 as withdrawn
//! content (the item may be hidden from the API user, and ids are observed to
//! 404 occasionally in production) and report them as `Ok(None)`. Feed-level
//! endpoints have no withdrawn notion; any non-success status there is a
//! transport error.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{EntitySource, Post, PostId, Topic, TopicId, TopicWithPosts};
use crate::error::MirrorError;
use crate::Result;

/// Credentials and base URL for one origin.
///
/// Use a dedicated read-only API user: a permissioned user (e.g. an admin
/// account) would let the mirror see hidden and deleted posts, leaking
/// private information into the replica.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub base_url: String,
    pub api_key: String,
    pub api_username: String,
}

/// reqwest-backed [`EntitySource`]
#[derive(Debug)]
pub struct HttpEntitySource {
    client: reqwest::Client,
    options: SourceOptions,
}

impl HttpEntitySource {
    /// # Errors
    ///
    /// Returns `ErrorKind::Validation` when the base URL is not an http(s)
    /// URL or carries a trailing slash.
    pub fn new(options: SourceOptions) -> Result<Self> {
        if !options.base_url.starts_with("http") || options.base_url.ends_with('/') {
            return Err(MirrorError::validation(format!(
                "invalid base url: {}",
                options.base_url
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            options,
        })
    }

    async fn get(&self, endpoint: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.options.base_url, endpoint);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.options.api_key)
            .header("Api-Username", &self.options.api_username)
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok(response)
    }

    /// Feed-level endpoints must succeed; 403/404 get hints because they
    /// usually mean misconfiguration rather than withdrawn content.
    fn ensure_feed_success(status: StatusCode, endpoint: &str) -> Result<()> {
        if status == StatusCode::NOT_FOUND {
            return Err(MirrorError::transport(format!(
                "404 Not Found on {}; maybe a bad base url?",
                endpoint
            )));
        }
        if status == StatusCode::FORBIDDEN {
            return Err(MirrorError::transport(
                "403 Forbidden: bad API username or key?",
            ));
        }
        if !status.is_success() {
            return Err(MirrorError::transport(format!(
                "not OK status {} on {}",
                status, endpoint
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EntitySource for HttpEntitySource {
    async fn latest_topic_id(&self) -> Result<TopicId> {
        let endpoint = "/latest.json?order=created";
        let response = self.get(endpoint).await?;
        Self::ensure_feed_success(response.status(), endpoint)?;

        let body = response.text().await?;
        let envelope: LatestTopicsEnvelope = serde_json::from_str(&body)?;
        match envelope.topic_list.topics.first() {
            Some(summary) => Ok(summary.id),
            None => Err(MirrorError::malformed_response(
                "no topics in the latest-topics feed",
            )),
        }
    }

    async fn topic_with_posts(&self, id: TopicId) -> Result<Option<TopicWithPosts>> {
        let endpoint = format!("/t/{}.json", id);
        let response = self.get(&endpoint).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            // Hidden, deleted, or one of the ids that 404 in production.
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MirrorError::transport(format!(
                "not OK status {} on {}",
                status, endpoint
            )));
        }

        let body = response.text().await?;
        let envelope: TopicEnvelope = serde_json::from_str(&body)?;
        let topic = Topic {
            id: envelope.id,
            title: envelope.title,
            created_at_ms: parse_timestamp_ms(&envelope.created_at)?,
            author_name: envelope.details.created_by.username,
        };
        let posts = envelope
            .post_stream
            .posts
            .into_iter()
            .map(WirePost::into_post)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(TopicWithPosts { topic, posts }))
    }

    async fn post(&self, id: PostId) -> Result<Option<Post>> {
        let endpoint = format!("/posts/{}.json", id);
        let response = self.get(&endpoint).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MirrorError::transport(format!(
                "not OK status {} on {}",
                status, endpoint
            )));
        }

        let body = response.text().await?;
        let wire: WirePost = serde_json::from_str(&body)?;
        Ok(Some(wire.into_post()?))
    }

    async fn latest_posts(&self) -> Result<Vec<Post>> {
        let endpoint = "/posts.json";
        let response = self.get(endpoint).await?;
        Self::ensure_feed_success(response.status(), endpoint)?;

        let body = response.text().await?;
        let envelope: PostsFeedEnvelope = serde_json::from_str(&body)?;
        envelope
            .latest_posts
            .into_iter()
            .map(WirePost::into_post)
            .collect()
    }
}

fn parse_timestamp_ms(created_at: &str) -> Result<i64> {
    chrono::DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.timestamp_millis())
        .map_err(|err| {
            MirrorError::malformed_response(format!("bad created_at {:?}", created_at))
                .with_source(err)
        })
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct LatestTopicsEnvelope {
    topic_list: WireTopicList,
}

#[derive(Debug, Deserialize)]
struct WireTopicList {
    topics: Vec<WireTopicSummary>,
}

#[derive(Debug, Deserialize)]
struct WireTopicSummary {
    id: TopicId,
}

#[derive(Debug, Deserialize)]
struct TopicEnvelope {
    id: TopicId,
    title: String,
    created_at: String,
    details: WireTopicDetails,
    post_stream: WirePostStream,
}

#[derive(Debug, Deserialize)]
struct WireTopicDetails {
    created_by: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct WirePostStream {
    posts: Vec<WirePost>,
}

#[derive(Debug, Deserialize)]
struct PostsFeedEnvelope {
    latest_posts: Vec<WirePost>,
}

#[derive(Debug, Deserialize)]
struct WirePost {
    id: PostId,
    topic_id: TopicId,
    post_number: u32,
    reply_to_post_number: Option<u32>,
    created_at: String,
    username: String,
}

impl WirePost {
    fn into_post(self) -> Result<Post> {
        Ok(Post {
            id: self.id,
            topic_id: self.topic_id,
            number_within_topic: self.post_number,
            reply_to_number_within_topic: self.reply_to_post_number,
            created_at_ms: parse_timestamp_ms(&self.created_at)?,
            author_name: self.username,
        })
    }
}
