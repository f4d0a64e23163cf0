//! SQLite replica of one origin's topics and posts
//!
//! Persists a local copy of the remote source so that re-loading the graph
//! does not re-do expensive network IO, and so that a network fault only
//! costs the data not yet downloaded. The replica is append-only: content is
//! never updated after it is first mirrored, so source-side edits and
//! deletions are not captured. Replace the database file periodically if
//! staleness matters.
//!
//! Each replica is permanently bound to a single origin. Mirroring several
//! origins requires one replica per origin.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::domain::{EntitySource, Post, PostId, ReplicaReader, Topic, TopicId};
use crate::error::MirrorError;
use crate::Result;

/// Bumped whenever the table layout changes, so stale replicas are rejected
/// on reopen instead of being misread.
const SCHEMA_VERSION: &str = "threadgraph_mirror_v1";

/// Singleton configuration record, serialized to a canonical JSON string and
/// written exactly once per replica.
#[derive(Debug, Serialize)]
struct ReplicaConfig<'a> {
    schema_version: &'a str,
    origin_id: &'a str,
}

/// Counts of work performed by one [`SqliteMirror::synchronize`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Topics upserted during this call
    pub topics_mirrored: usize,
    /// Posts upserted during this call (all three phases)
    pub posts_mirrored: usize,
    /// Per-post point lookups issued to fill feed gaps
    pub point_lookups: usize,
}

/// SQLite-backed replica bound to one origin and one [`EntitySource`]
pub struct SqliteMirror {
    conn: Arc<Mutex<Connection>>,
    source: Arc<dyn EntitySource>,
    origin: String,
}

impl fmt::Debug for SqliteMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteMirror")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl SqliteMirror {
    /// Open (or create) a replica at the given path and bind it to `origin`.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::IncompatibleOrigin` when the database was
    /// previously bound to a different origin or schema version; the store is
    /// left unchanged in that case.
    pub fn new(
        db_path: impl AsRef<Path>,
        source: Arc<dyn EntitySource>,
        origin: impl Into<String>,
    ) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::bind(conn, source, origin.into())
    }

    /// Create an in-memory replica (for testing)
    pub fn in_memory(source: Arc<dyn EntitySource>, origin: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bind(conn, source, origin.into())
    }

    fn bind(mut conn: Connection, source: Arc<dyn EntitySource>, origin: String) -> Result<Self> {
        // The `posts.topic_id ... REFERENCES topics(id)` clause is declarative:
        // a post whose topic was withdrawn is still mirrored and projected (see
        // the builder's "[unknown topic]" fallback). SQLite leaves foreign keys
        // unenforced by default, but this build enables them, so turn them back
        // off to match the schema's intended semantics. Must run outside the
        // schema transaction opened below.
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        Self::compare_and_initialize(&mut conn, &origin)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            source,
            origin,
        })
    }

    /// First write wins: the first ever bind stores the configuration and
    /// creates the schema; every later bind must present the identical
    /// configuration. Runs in a single transaction so a rejected bind cannot
    /// leave partial schema behind.
    fn compare_and_initialize(conn: &mut Connection, origin: &str) -> Result<()> {
        let tx = conn.transaction()?;

        // The config lives in a singleton table whose unique row has primary
        // key 0. Only the first insert ever succeeds.
        tx.execute(
            "CREATE TABLE IF NOT EXISTS meta (
                zero INTEGER PRIMARY KEY,
                config TEXT NOT NULL
            )",
            [],
        )?;

        let config = serde_json::to_string(&ReplicaConfig {
            schema_version: SCHEMA_VERSION,
            origin_id: origin,
        })?;

        let existing: Option<String> = tx
            .query_row("SELECT config FROM meta", [], |row| row.get(0))
            .optional()?;

        match existing {
            Some(ref found) if *found == config => {
                // Already set up; nothing to do.
                debug!("replica already bound to {}", origin);
                return Ok(());
            }
            Some(found) => {
                // Dropping the transaction rolls it back, so the store keeps
                // its previous bytes.
                return Err(MirrorError::incompatible_origin(format!(
                    "replica already bound to {}, refusing {}",
                    found, config
                )));
            }
            None => {
                tx.execute(
                    "INSERT INTO meta (zero, config) VALUES (0, ?1)",
                    params![config],
                )?;
                tx.execute(
                    "CREATE TABLE topics (
                        id INTEGER PRIMARY KEY,
                        title TEXT NOT NULL,
                        created_at_ms INTEGER NOT NULL,
                        author_name TEXT NOT NULL
                    )",
                    [],
                )?;
                tx.execute(
                    "CREATE TABLE posts (
                        id INTEGER PRIMARY KEY,
                        created_at_ms INTEGER NOT NULL,
                        author_name TEXT NOT NULL,
                        topic_id INTEGER NOT NULL REFERENCES topics(id),
                        number_within_topic INTEGER NOT NULL,
                        reply_to_number_within_topic INTEGER
                    )",
                    [],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// The origin this replica is bound to
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Bring the replica up to date with the source.
    ///
    /// Catch-up runs in three phases, each covering ids the previous one can
    /// miss: new topics are enumerated with their bundled posts, the
    /// recent-posts feed fills in posts added to older topics, and point
    /// lookups recover any id the bounded feed window skipped. Together the
    /// phases cover every non-withdrawn id exactly once.
    ///
    /// Every upsert is individually atomic, so an aborted call keeps all rows
    /// committed so far and a retry resumes from the persisted maxima instead
    /// of re-processing them. Not safe to invoke concurrently on the same
    /// replica; callers must serialize synchronization per origin.
    ///
    /// # Errors
    ///
    /// Any transport or parse failure other than a withdrawn-entity signal
    /// aborts the call immediately and propagates. Withdrawn topics and posts
    /// are skipped permanently, without retry or placeholder rows.
    pub async fn synchronize(&self) -> Result<SyncReport> {
        let latest_topic_id = self.source.latest_topic_id().await?;
        let last_local_topic_id = self.max_topic_id()?;
        let last_local_post_id = self.max_post_id()?;

        info!(
            "mirror sync starting (origin={}, local topics<={}, local posts<={}, remote topics<={})",
            self.origin, last_local_topic_id, last_local_post_id, latest_topic_id
        );

        // Scoped to this call: ids upserted by an earlier phase must never
        // trigger a point lookup in a later one.
        let mut encountered: HashSet<PostId> = HashSet::new();
        let mut report = SyncReport::default();

        // Phase 1: new topics, with whatever posts the source bundles.
        for topic_id in (last_local_topic_id + 1)..=latest_topic_id {
            match self.source.topic_with_posts(topic_id).await? {
                None => {
                    debug!("skipping withdrawn topic {}", topic_id);
                }
                Some(bundle) => {
                    self.upsert_topic(&bundle.topic)?;
                    report.topics_mirrored += 1;
                    for post in &bundle.posts {
                        self.upsert_post(post)?;
                        encountered.insert(post.id);
                        report.posts_mirrored += 1;
                    }
                }
            }
        }

        // Phase 2: the recent-posts feed, which catches posts added to topics
        // that were already mirrored.
        let feed = self.source.latest_posts().await?;
        for post in &feed {
            if !encountered.contains(&post.id) && post.id > last_local_post_id {
                self.upsert_post(post)?;
                encountered.insert(post.id);
                report.posts_mirrored += 1;
            }
        }

        // Phase 3: the feed is a bounded window and may skip ids under high
        // volume; point lookups are the only way to fill such gaps. Ids at or
        // beyond the feed maximum need no lookup: the feed itself covered
        // them.
        let newest_feed_id = feed.iter().map(|post| post.id).max().unwrap_or(0);
        for post_id in (last_local_post_id + 1)..newest_feed_id {
            if encountered.contains(&post_id) {
                continue;
            }
            report.point_lookups += 1;
            match self.source.post(post_id).await? {
                None => {
                    debug!("skipping withdrawn post {}", post_id);
                }
                Some(post) => {
                    self.upsert_post(&post)?;
                    encountered.insert(post.id);
                    report.posts_mirrored += 1;
                }
            }
        }

        info!(
            "mirror sync finished (origin={}, topics={}, posts={}, point lookups={})",
            self.origin, report.topics_mirrored, report.posts_mirrored, report.point_lookups
        );
        Ok(report)
    }

    fn max_topic_id(&self) -> Result<TopicId> {
        let conn = self.conn.lock().unwrap();
        let max: Option<i64> = conn.query_row("SELECT MAX(id) FROM topics", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0) as TopicId)
    }

    fn max_post_id(&self) -> Result<PostId> {
        let conn = self.conn.lock().unwrap();
        let max: Option<i64> = conn.query_row("SELECT MAX(id) FROM posts", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0) as PostId)
    }

    fn upsert_topic(&self, topic: &Topic) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO topics (id, title, created_at_ms, author_name)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                topic.id as i64,
                &topic.title,
                topic.created_at_ms,
                &topic.author_name
            ],
        )?;
        Ok(())
    }

    fn upsert_post(&self, post: &Post) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO posts
             (id, created_at_ms, author_name, topic_id, number_within_topic, reply_to_number_within_topic)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                post.id as i64,
                post.created_at_ms,
                &post.author_name,
                post.topic_id as i64,
                post.number_within_topic as i64,
                post.reply_to_number_within_topic.map(|n| n as i64),
            ],
        )?;
        Ok(())
    }
}

impl ReplicaReader for SqliteMirror {
    fn topics(&self) -> Result<Vec<Topic>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, created_at_ms, author_name FROM topics ORDER BY id",
        )?;
        let topics = stmt
            .query_map([], |row| {
                Ok(Topic {
                    id: row.get::<_, i64>(0)? as TopicId,
                    title: row.get(1)?,
                    created_at_ms: row.get(2)?,
                    author_name: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(topics)
    }

    fn posts(&self) -> Result<Vec<Post>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, created_at_ms, author_name, topic_id, number_within_topic,
                    reply_to_number_within_topic
             FROM posts ORDER BY id",
        )?;
        let posts = stmt
            .query_map([], |row| {
                Ok(Post {
                    id: row.get::<_, i64>(0)? as PostId,
                    created_at_ms: row.get(1)?,
                    author_name: row.get(2)?,
                    topic_id: row.get::<_, i64>(3)? as TopicId,
                    number_within_topic: row.get::<_, i64>(4)? as u32,
                    reply_to_number_within_topic: row
                        .get::<_, Option<i64>>(5)?
                        .map(|n| n as u32),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }

    fn find_post_in_topic(
        &self,
        topic_id: TopicId,
        number_within_topic: u32,
    ) -> Result<Option<PostId>> {
        let conn = self.conn.lock().unwrap();
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM posts WHERE topic_id = ?1 AND number_within_topic = ?2",
                params![topic_id as i64, number_within_topic as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| id as PostId))
    }
}
