//! Projection from a mirrored replica into the graph
//!
//! A pure read-then-compute pass: enumerate the replica's topics and posts in
//! stored order and emit addressed nodes and edges. Running it twice against
//! an unchanged replica yields identical node and edge address sets.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use threadgraph_mirror::{ReplicaReader, TopicId};

use crate::address::{
    authors_address, contains_address, post_address, replies_to_address, topic_address,
    user_address, ContentKind,
};
use crate::domain::{Edge, EdgeKind, Graph, Node, NodeKind};
use crate::error::GraphError;
use crate::Result;

/// Build the graph for one origin from its replica.
///
/// The origin identifier must not end in `/`; addresses and descriptions
/// embed it verbatim, so a trailing separator would make them ambiguous.
///
/// # Errors
///
/// - `GraphError::Validation` when the origin ends in `/` (checked before any
///   node is created).
/// - `GraphError::Replica` when a replica read fails.
pub fn build_graph<R: ReplicaReader>(origin: &str, replica: &R) -> Result<Graph> {
    if origin.ends_with('/') {
        return Err(GraphError::Validation(format!(
            "origin must not end with '/': {}",
            origin
        )));
    }

    let mut graph = Graph::new();

    // Users are deduplicated by name within one build.
    let mut seen_users: AHashSet<String> = AHashSet::new();
    let mut add_user = |graph: &mut Graph, name: &str| {
        if !seen_users.insert(name.to_string()) {
            return;
        }
        graph.add_node(Node {
            address: user_address(origin, name),
            kind: NodeKind::User,
            description: format!("[@{}]({}/u/{}/)", name, origin, name),
            timestamp_ms: None,
        });
    };

    let mut topic_titles: AHashMap<TopicId, String> = AHashMap::new();

    for topic in replica.topics()? {
        let address = topic_address(origin, topic.id);
        topic_titles.insert(topic.id, topic.title.clone());
        graph.add_node(Node {
            address: address.clone(),
            kind: NodeKind::Topic,
            description: format!("[{}]({}/t/{})", topic.title, origin, topic.id),
            timestamp_ms: Some(topic.created_at_ms),
        });
        add_user(&mut graph, &topic.author_name);

        graph.add_edge(Edge {
            address: authors_address(ContentKind::Topic, origin, &topic.author_name, topic.id),
            kind: EdgeKind::Authors,
            source: user_address(origin, &topic.author_name),
            destination: address,
            timestamp_ms: Some(topic.created_at_ms),
        });
    }

    for post in replica.posts()? {
        let address = post_address(origin, post.id);
        // The topic may be missing: it was withdrawn while one of its posts
        // was still individually fetched.
        let topic_title = topic_titles
            .get(&post.topic_id)
            .map(String::as_str)
            .unwrap_or("[unknown topic]");
        graph.add_node(Node {
            address: address.clone(),
            kind: NodeKind::Post,
            description: format!(
                "[post #{} on {}]({}/t/{}/{})",
                post.number_within_topic, topic_title, origin, post.topic_id, post.id
            ),
            timestamp_ms: Some(post.created_at_ms),
        });
        add_user(&mut graph, &post.author_name);

        graph.add_edge(Edge {
            address: authors_address(ContentKind::Post, origin, &post.author_name, post.id),
            kind: EdgeKind::Authors,
            source: user_address(origin, &post.author_name),
            destination: address.clone(),
            timestamp_ms: Some(post.created_at_ms),
        });

        graph.add_edge(Edge {
            address: contains_address(origin, post.topic_id, post.id),
            kind: EdgeKind::Contains,
            source: topic_address(origin, post.topic_id),
            destination: address.clone(),
            timestamp_ms: Some(post.created_at_ms),
        });

        if let Some(reply_to_number) = post.reply_to_number_within_topic {
            match replica.find_post_in_topic(post.topic_id, reply_to_number)? {
                Some(base_post_id) => {
                    graph.add_edge(Edge {
                        address: replies_to_address(origin, post.id, base_post_id),
                        kind: EdgeKind::RepliesTo,
                        source: address,
                        destination: post_address(origin, base_post_id),
                        timestamp_ms: Some(post.created_at_ms),
                    });
                }
                None => {
                    // Expected: the target was withdrawn or never mirrored.
                    debug!(
                        "omitting reply edge from post {}: no post #{} in topic {}",
                        post.id, reply_to_number, post.topic_id
                    );
                }
            }
        }
    }

    Ok(graph)
}
