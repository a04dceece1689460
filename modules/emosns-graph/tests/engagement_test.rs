#![cfg(feature = "test-utils")]

// Reactions, replies and the influence edges they register.
//
// Requirements: Docker (for Neo4j via testcontainers)
//
// Run with: cargo test -p emosns-graph --features test-utils --test engagement_test

mod common;

use common::{count, node_count, score, setup, MockAnalyzer};
use emosns_common::EmotionTag;
use emosns_graph::{query, EngagementEngine, GraphReader, GraphWriter, SocialError};

async fn seed_post(writer: &GraphWriter) -> String {
    writer
        .create_post_with_emotions("alice", "First snow of the year", &[EmotionTag::new("joy", 0.8)])
        .await
        .unwrap()
}

#[tokio::test]
async fn second_reaction_replaces_the_first() {
    let (_c, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client.clone());
    let engagement = EngagementEngine::new(client.clone(), MockAnalyzer::new().into_arc());
    let post_id = seed_post(&writer).await;

    engagement.react(&post_id, "bob", "like").await.unwrap();
    engagement.react(&post_id, "bob", "love").await.unwrap();

    let reactions = reader.get_reactions(&post_id).await.unwrap();
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions.get("love"), Some(&1));

    let edges = count(
        &client,
        query("MATCH (:User {id: 'bob'})-[r:REACTED]->(:Post {id: $id}) RETURN count(r) AS n")
            .param("id", post_id.as_str()),
    )
    .await;
    assert_eq!(edges, 1);

    // Both reactions are separate influence types.
    let influences = count(
        &client,
        query("MATCH (:User {id: 'bob'})-[i:INFLUENCED]->(:Post {id: $id}) RETURN count(i) AS n")
            .param("id", post_id.as_str()),
    )
    .await;
    assert_eq!(influences, 2);
}

#[tokio::test]
async fn reacting_to_missing_post_writes_nothing() {
    let (_c, client) = setup().await;
    let engagement = EngagementEngine::new(client.clone(), MockAnalyzer::new().into_arc());

    let err = engagement.react("missing", "ghost", "like").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(node_count(&client, "User", "ghost").await, 0);
}

#[tokio::test]
async fn unknown_reaction_type_is_rejected() {
    let (_c, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let engagement = EngagementEngine::new(client.clone(), MockAnalyzer::new().into_arc());
    let post_id = seed_post(&writer).await;

    let err = engagement.react(&post_id, "bob", "meh").await.unwrap_err();
    assert!(matches!(err, SocialError::Validation(_)));

    let edges = count(&client, query("MATCH ()-[r:REACTED]->() RETURN count(r) AS n")).await;
    assert_eq!(edges, 0);
}

#[tokio::test]
async fn reply_registers_one_influence_per_distinct_emotion() {
    let (_c, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client.clone());
    let analyzer = MockAnalyzer::new().reply_emotions(vec![
        score("joy", 0.7),
        score("joy", 0.5),
        score("surprise", 0.2),
    ]);
    let engagement = EngagementEngine::new(client.clone(), analyzer.into_arc());
    let post_id = seed_post(&writer).await;

    let outcome = engagement.reply(&post_id, "bob", "So pretty!").await.unwrap();

    assert_eq!(outcome.emotions.len(), 3);
    let types = count(
        &client,
        query("MATCH (:User {id: 'bob'})-[i:INFLUENCED]->(:Post {id: $id}) RETURN count(DISTINCT i.type) AS n")
            .param("id", post_id.as_str()),
    )
    .await;
    let edges = count(
        &client,
        query("MATCH (:User {id: 'bob'})-[i:INFLUENCED]->(:Post {id: $id}) RETURN count(i) AS n")
            .param("id", post_id.as_str()),
    )
    .await;
    assert_eq!(types, 2);
    assert_eq!(edges, 2);

    let replies = reader.get_replies(&post_id).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].reply_id, outcome.reply_id);
    assert_eq!(replies[0].user_id, "bob");
    assert_eq!(
        replies[0].emotions,
        vec![EmotionTag::new("joy", 0.5), EmotionTag::new("surprise", 0.2)]
    );
}

#[tokio::test]
async fn reply_to_missing_post_is_not_found() {
    let (_c, client) = setup().await;
    let engagement = EngagementEngine::new(client.clone(), MockAnalyzer::new().into_arc());

    let err = engagement.reply("missing", "bob", "hello?").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(count(&client, query("MATCH (r:Reply) RETURN count(r) AS n")).await, 0);
}

#[tokio::test]
async fn replies_are_listed_by_id() {
    let (_c, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client.clone());
    let post_id = seed_post(&writer).await;

    for (user, text) in [("bob", "one"), ("carol", "two"), ("dave", "three")] {
        writer
            .add_reply_with_emotions(&post_id, user, text, &[])
            .await
            .unwrap();
    }

    let replies = reader.get_replies(&post_id).await.unwrap();
    let ids: Vec<_> = replies.iter().map(|r| r.reply_id.clone()).collect();
    let mut sorted = ids.clone();
    sorted.sort();

    assert_eq!(replies.len(), 3);
    assert_eq!(ids, sorted);
    assert!(replies.iter().all(|r| r.emotions.is_empty()));
}

#[tokio::test]
async fn influence_requires_existing_user() {
    let (_c, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let post_id = seed_post(&writer).await;

    let err = writer.add_influence("nobody", &post_id, "joy").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(node_count(&client, "User", "nobody").await, 0);
}
