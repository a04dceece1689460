#![cfg(feature = "test-utils")]

// Three-degree influence resolution.
//
// Requirements: Docker (for Neo4j via testcontainers)
//
// Run with: cargo test -p emosns-graph --features test-utils --test influence_test

mod common;

use common::setup;
use emosns_common::ReactionType;
use emosns_graph::{GraphWriter, InfluenceResolver};

async fn post(writer: &GraphWriter, user: &str, content: &str) -> String {
    writer.create_post_with_emotions(user, content, &[]).await.unwrap()
}

/// React and register the matching influence, as the engagement flow does.
async fn react(writer: &GraphWriter, user: &str, post_id: &str, reaction: ReactionType) {
    writer.add_reaction(post_id, user, reaction).await.unwrap();
    writer.add_influence(user, post_id, reaction.as_str()).await.unwrap();
}

#[tokio::test]
async fn post_without_influence_has_empty_degrees() {
    let (_c, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let root = post(&writer, "alice", "root").await;

    let influence = InfluenceResolver::new(client).get_post_influence(&root).await.unwrap();

    assert_eq!(influence.post_id, root);
    assert!(influence.first_degree.is_empty());
    assert!(influence.second_degree.is_empty());
    assert!(influence.third_degree.is_empty());
    assert_eq!(influence.summary.total_users, 0);
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let (_c, client) = setup().await;
    let err = InfluenceResolver::new(client)
        .get_post_influence("missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn influence_propagates_through_same_topic_posts() {
    let (_c, client) = setup().await;
    let writer = GraphWriter::new(client.clone());

    let root = post(&writer, "alice", "root").await;
    react(&writer, "bob", &root, ReactionType::Like).await;

    let bob_post = post(&writer, "bob", "bob follows up").await;
    writer.add_same_topic_relation(&bob_post, &root).await.unwrap();
    react(&writer, "carol", &bob_post, ReactionType::Love).await;

    let carol_post = post(&writer, "carol", "carol follows up").await;
    writer.add_same_topic_relation(&carol_post, &root).await.unwrap();
    react(&writer, "dave", &carol_post, ReactionType::Wow).await;

    // Unrelated post by a first-degree user does not propagate.
    let off_topic = post(&writer, "bob", "something else").await;
    react(&writer, "erin", &off_topic, ReactionType::Cry).await;

    let influence = InfluenceResolver::new(client).get_post_influence(&root).await.unwrap();

    assert_eq!(influence.first_degree.len(), 1);
    assert_eq!(influence.first_degree[0].user_id, "bob");
    assert_eq!(influence.first_degree[0].influence_type, "like");
    assert_eq!(influence.first_degree[0].through_post_id, None);

    assert_eq!(influence.second_degree.len(), 1);
    assert_eq!(influence.second_degree[0].user_id, "carol");
    assert_eq!(influence.second_degree[0].through_post_id.as_deref(), Some(bob_post.as_str()));

    assert_eq!(influence.third_degree.len(), 1);
    assert_eq!(influence.third_degree[0].user_id, "dave");
    assert_eq!(influence.third_degree[0].through_post_id.as_deref(), Some(carol_post.as_str()));

    let summary = &influence.summary;
    assert_eq!(summary.total_users, 3);
    assert_eq!(summary.by_type.get("like"), Some(&1));
    assert_eq!(summary.by_type.get("love"), Some(&1));
    assert_eq!(summary.by_type.get("wow"), Some(&1));
    assert_eq!(summary.by_type.get("cry"), None);
    assert_eq!(summary.by_degree.get("first"), Some(&1));
    assert_eq!(summary.by_degree.get("second"), Some(&1));
    assert_eq!(summary.by_degree.get("third"), Some(&1));
}

#[tokio::test]
async fn users_appear_only_at_their_lowest_degree() {
    let (_c, client) = setup().await;
    let writer = GraphWriter::new(client.clone());

    let root = post(&writer, "alice", "root").await;
    react(&writer, "bob", &root, ReactionType::Like).await;
    react(&writer, "carol", &root, ReactionType::Angry).await;

    let bob_post = post(&writer, "bob", "follow up").await;
    writer.add_same_topic_relation(&bob_post, &root).await.unwrap();
    // carol is already first degree; bob reacting to his own post is first degree too.
    react(&writer, "carol", &bob_post, ReactionType::Love).await;
    react(&writer, "bob", &bob_post, ReactionType::Wow).await;

    let influence = InfluenceResolver::new(client).get_post_influence(&root).await.unwrap();

    let first: Vec<_> = influence.first_degree.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(first, vec!["bob", "carol"]);
    assert!(influence.second_degree.is_empty());
    assert!(influence.third_degree.is_empty());
    assert_eq!(influence.summary.total_users, 2);
}
