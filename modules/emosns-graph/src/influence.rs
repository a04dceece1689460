//! Three-degree influence propagation around a root post.
//!
//! First degree: users with an INFLUENCED edge to the root.
//! Second degree: users influenced by a post that a first-degree user wrote
//! and that is SAME_TOPIC with the root.
//! Third degree: the same step again, starting from second-degree users.
//!
//! A user belongs to at most one degree per response: the lowest one they reach.

use std::collections::{BTreeMap, HashSet};

use neo4rs::{query, Txn};
use serde::Deserialize;
use tracing::debug;

use emosns_common::{InfluenceSummary, InfluenceUser, PostInfluence};

use crate::client::{fetch_in, finish};
use crate::error::{Result, SocialError};
use crate::GraphClient;

const FIRST_DEGREE: &str = "first";
const SECOND_DEGREE: &str = "second";
const THIRD_DEGREE: &str = "third";

/// Reads the influence ledger. All three degrees are read inside one
/// transaction so they describe the same snapshot.
#[derive(Clone)]
pub struct InfluenceResolver {
    client: GraphClient,
}

/// Raw influence row. Any field may be null in a malformed graph.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct InfluenceRow {
    pub user_id: Option<String>,
    pub influence_type: Option<String>,
    pub through_post_id: Option<String>,
}

impl InfluenceResolver {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get_post_influence(&self, post_id: &str) -> Result<PostInfluence> {
        let mut txn = self.client.begin().await?;
        let outcome = resolve_in(&mut txn, post_id).await;
        let influence = finish(txn, outcome).await?;

        debug!(
            post_id,
            total_users = influence.summary.total_users,
            "Influence resolved"
        );
        Ok(influence)
    }
}

async fn resolve_in(txn: &mut Txn, post_id: &str) -> Result<PostInfluence> {
    let exists = fetch_in(
        txn,
        query("MATCH (p:Post {id: $post_id}) RETURN p.id AS id").param("post_id", post_id),
    )
    .await?;
    if exists.is_empty() {
        return Err(SocialError::not_found("Post", post_id));
    }

    let first_rows = decode(
        fetch_in(
            txn,
            query(
                "MATCH (u:User)-[i:INFLUENCED]->(:Post {id: $post_id})
                 RETURN DISTINCT u.id AS user_id, i.type AS influence_type, null AS through_post_id
                 ORDER BY user_id, influence_type",
            )
            .param("post_id", post_id),
        )
        .await?,
    )?;
    let mut seen = HashSet::new();
    let first = resolve_degree(first_rows, &seen, false);
    seen.extend(user_ids(&first));

    let second_rows = next_degree_rows(txn, post_id, &user_ids(&first), &seen).await?;
    let second = resolve_degree(second_rows, &seen, true);
    seen.extend(user_ids(&second));

    let third_rows = next_degree_rows(txn, post_id, &user_ids(&second), &seen).await?;
    let third = resolve_degree(third_rows, &seen, true);

    Ok(assemble(post_id, first, second, third))
}

/// Users influenced by a post that one of `via` authored and that shares a
/// topic with the root post. `exclude` is applied again in `resolve_degree`.
async fn next_degree_rows(
    txn: &mut Txn,
    post_id: &str,
    via: &[String],
    exclude: &HashSet<String>,
) -> Result<Vec<InfluenceRow>> {
    if via.is_empty() {
        return Ok(Vec::new());
    }

    let q = query(
        "MATCH (author:User)-[:POSTED]->(through:Post)-[:SAME_TOPIC]->(:Post {id: $post_id})
         WHERE author.id IN $via
         MATCH (u:User)-[i:INFLUENCED]->(through)
         WHERE NOT u.id IN $exclude
         RETURN DISTINCT u.id AS user_id, i.type AS influence_type, through.id AS through_post_id
         ORDER BY user_id, influence_type, through_post_id",
    )
    .param("post_id", post_id)
    .param("via", via.to_vec())
    .param("exclude", exclude.iter().cloned().collect::<Vec<_>>());

    decode(fetch_in(txn, q).await?)
}

fn decode(rows: Vec<neo4rs::Row>) -> Result<Vec<InfluenceRow>> {
    rows.iter()
        .map(|row| row.to::<InfluenceRow>().map_err(SocialError::from))
        .collect()
}

/// Turn raw rows into one degree's entries: drop rows with a blank user or
/// type, drop users already placed at a lower degree, and de-duplicate on
/// (user, type, through post). Order of first appearance is kept.
pub(crate) fn resolve_degree(
    rows: Vec<InfluenceRow>,
    excluded: &HashSet<String>,
    keep_through_post: bool,
) -> Vec<InfluenceUser> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for row in rows {
        let user_id = row.user_id.unwrap_or_default();
        let influence_type = row.influence_type.unwrap_or_default();
        if user_id.is_empty() || influence_type.is_empty() || excluded.contains(&user_id) {
            continue;
        }

        let through_post_id = if keep_through_post {
            row.through_post_id.filter(|id| !id.is_empty())
        } else {
            None
        };

        let entry = InfluenceUser {
            user_id,
            influence_type,
            through_post_id,
        };
        if seen.insert(entry.clone()) {
            entries.push(entry);
        }
    }

    entries
}

fn user_ids(entries: &[InfluenceUser]) -> Vec<String> {
    let mut ids: Vec<String> = entries.iter().map(|e| e.user_id.clone()).collect();
    ids.sort();
    ids.dedup();
    ids
}

pub(crate) fn assemble(
    post_id: &str,
    first: Vec<InfluenceUser>,
    second: Vec<InfluenceUser>,
    third: Vec<InfluenceUser>,
) -> PostInfluence {
    let summary = summarize(&first, &second, &third);
    PostInfluence {
        post_id: post_id.to_string(),
        first_degree: first,
        second_degree: second,
        third_degree: third,
        summary,
    }
}

/// Distinct users overall, entries per influence type, entries per degree.
pub(crate) fn summarize(
    first: &[InfluenceUser],
    second: &[InfluenceUser],
    third: &[InfluenceUser],
) -> InfluenceSummary {
    let all = first.iter().chain(second).chain(third);

    let total_users = all
        .clone()
        .map(|e| e.user_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut by_type = BTreeMap::new();
    for entry in all {
        *by_type.entry(entry.influence_type.clone()).or_insert(0) += 1;
    }

    let by_degree = BTreeMap::from([
        (FIRST_DEGREE.to_string(), first.len()),
        (SECOND_DEGREE.to_string(), second.len()),
        (THIRD_DEGREE.to_string(), third.len()),
    ]);

    InfluenceSummary {
        total_users,
        by_type,
        by_degree,
    }
}
