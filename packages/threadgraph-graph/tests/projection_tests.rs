//! End-to-end: synchronize a scripted source into a replica, then project it.

use std::sync::Arc;

use async_trait::async_trait;
use threadgraph_graph::{
    authors_address, build_graph, contains_address, post_address, replies_to_address,
    topic_address, user_address, ContentKind, EdgeKind, NodeKind,
};
use threadgraph_mirror::{
    EntitySource, Post, PostId, Result, SqliteMirror, Topic, TopicId, TopicWithPosts,
};

const ORIGIN: &str = "https://forum.example";

/// One topic (id 5) with two posts: #1, and #2 replying to #1.
struct SingleTopicSource;

impl SingleTopicSource {
    fn posts() -> Vec<Post> {
        vec![
            Post {
                id: 1,
                topic_id: 5,
                number_within_topic: 1,
                reply_to_number_within_topic: None,
                created_at_ms: 2003,
                author_name: "credbot".to_string(),
            },
            Post {
                id: 2,
                topic_id: 5,
                number_within_topic: 2,
                reply_to_number_within_topic: Some(1),
                created_at_ms: 2004,
                author_name: "credbot".to_string(),
            },
        ]
    }
}

#[async_trait]
impl EntitySource for SingleTopicSource {
    async fn latest_topic_id(&self) -> Result<TopicId> {
        Ok(5)
    }

    async fn topic_with_posts(&self, id: TopicId) -> Result<Option<TopicWithPosts>> {
        if id != 5 {
            return Ok(None);
        }
        Ok(Some(TopicWithPosts {
            topic: Topic {
                id: 5,
                title: "topic 5".to_string(),
                created_at_ms: 1000,
                author_name: "credbot".to_string(),
            },
            posts: Self::posts(),
        }))
    }

    async fn post(&self, id: PostId) -> Result<Option<Post>> {
        Ok(Self::posts().into_iter().find(|p| p.id == id))
    }

    async fn latest_posts(&self) -> Result<Vec<Post>> {
        Ok(vec![Self::posts().pop().unwrap()])
    }
}

#[tokio::test]
async fn test_synchronized_replica_projects_expected_nodes_and_edges() {
    let mirror = SqliteMirror::in_memory(Arc::new(SingleTopicSource), ORIGIN).unwrap();
    mirror.synchronize().await.unwrap();

    let graph = build_graph(ORIGIN, &mirror).unwrap();

    // Nodes: topic 5, both posts, and the shared author exactly once.
    assert_eq!(graph.node_count(), 4);
    assert!(graph.node(&topic_address(ORIGIN, 5)).is_some());
    assert!(graph.node(&post_address(ORIGIN, 1)).is_some());
    assert!(graph.node(&post_address(ORIGIN, 2)).is_some());
    assert!(graph.node(&user_address(ORIGIN, "credbot")).is_some());
    assert_eq!(graph.nodes_by_kind(NodeKind::User).len(), 1);

    // Edges: one authors edge per authored item, contains for both posts,
    // and the resolved reply.
    assert_eq!(graph.edge_count(), 6);
    assert!(graph
        .edge(&authors_address(ContentKind::Topic, ORIGIN, "credbot", 5))
        .is_some());
    assert!(graph
        .edge(&authors_address(ContentKind::Post, ORIGIN, "credbot", 1))
        .is_some());
    assert!(graph
        .edge(&authors_address(ContentKind::Post, ORIGIN, "credbot", 2))
        .is_some());
    assert!(graph.edge(&contains_address(ORIGIN, 5, 1)).is_some());
    assert!(graph.edge(&contains_address(ORIGIN, 5, 2)).is_some());

    let replies = graph.edge(&replies_to_address(ORIGIN, 2, 1)).unwrap();
    assert_eq!(replies.kind, EdgeKind::RepliesTo);
    assert_eq!(replies.source, post_address(ORIGIN, 2));
    assert_eq!(replies.destination, post_address(ORIGIN, 1));
}

#[tokio::test]
async fn test_repeated_projection_of_unchanged_replica_is_identical() {
    let mirror = SqliteMirror::in_memory(Arc::new(SingleTopicSource), ORIGIN).unwrap();
    mirror.synchronize().await.unwrap();

    let first = build_graph(ORIGIN, &mirror).unwrap();
    let second = build_graph(ORIGIN, &mirror).unwrap();

    let node_addresses =
        |g: &threadgraph_graph::Graph| g.nodes().map(|n| n.address.clone()).collect::<Vec<_>>();
    let edge_addresses =
        |g: &threadgraph_graph::Graph| g.edges().map(|e| e.address.clone()).collect::<Vec<_>>();

    assert_eq!(node_addresses(&first), node_addresses(&second));
    assert_eq!(edge_addresses(&first), edge_addresses(&second));
}
