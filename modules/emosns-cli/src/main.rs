//! Command-line front end for the emotion-aware social graph.
//!
//! Every command prints its result as JSON on stdout.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use emosns_common::Config;
use emosns_graph::{
    migrate, AccountService, EngagementEngine, FeedAggregator, GraphClient, GraphReader,
    GraphWriter, InfluenceResolver, PostIngestor,
};
use emotion_client::{EmotionAnalyzer, EmotionClient};

#[derive(Parser)]
#[command(name = "emosns")]
#[command(about = "Emotion-aware social graph")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create constraints and indexes
    Migrate,

    /// Register a user account
    Register {
        username: String,
        email: String,
        password: String,
    },

    /// Check a user's credentials
    Login { email: String, password: String },

    /// Publish a post; emotions are detected automatically
    Post { user_id: String, content: String },

    /// Show one post with its emotion tags
    Show { post_id: String },

    /// React to a post (like, love, cry, angry, wow)
    React {
        post_id: String,
        user_id: String,
        reaction: String,
    },

    /// Show reaction counts for a post
    Reactions { post_id: String },

    /// Reply to a post
    Reply {
        post_id: String,
        user_id: String,
        content: String,
    },

    /// List replies to a post
    Replies { post_id: String },

    /// Follow another user
    Follow { user_id: String, target_user_id: String },

    /// Stop following a user
    Unfollow { user_id: String, target_user_id: String },

    /// Followers and following of a user
    Network { user_id: String },

    /// Home feed, optionally limited to one emotion
    Feed {
        #[arg(long)]
        emotion: Option<String>,
    },

    /// Posts written by one user
    UserPosts { user_id: String },

    /// Three-degree influence around a post
    Influence { post_id: String },

    /// Every emotion label in use
    Emotions,

    /// Profile details for a user
    User { user_id: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Network {
    followers: Vec<emosns_common::UserSummary>,
    following: Vec<emosns_common::UserSummary>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("emosns=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = Config::from_env();
    let client = GraphClient::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password).await?;
    info!(uri = %config.neo4j_uri, "Connected to Neo4j");

    let analyzer: Arc<dyn EmotionAnalyzer> = Arc::new(EmotionClient::new(
        config.emotion_api_url.clone(),
        config.emotion_api_timeout,
    )?);

    run(cli.command, client, analyzer).await
}

async fn run(command: Commands, client: GraphClient, analyzer: Arc<dyn EmotionAnalyzer>) -> Result<()> {
    let reader = GraphReader::new(client.clone());
    let writer = GraphWriter::new(client.clone());

    match command {
        Commands::Migrate => {
            migrate(&client).await?;
            print(&serde_json::json!({ "migrated": true }))
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let id = AccountService::new(client)
                .register(&username, &email, &password)
                .await?;
            print(&serde_json::json!({ "id": id }))
        }
        Commands::Login { email, password } => {
            print(&AccountService::new(client).authenticate(&email, &password).await?)
        }
        Commands::Post { user_id, content } => {
            print(&PostIngestor::new(client, analyzer).publish(&user_id, &content).await?)
        }
        Commands::Show { post_id } => print(&reader.get_post_with_emotions(&post_id).await?),
        Commands::React {
            post_id,
            user_id,
            reaction,
        } => {
            let reaction = EngagementEngine::new(client, analyzer)
                .react(&post_id, &user_id, &reaction)
                .await?;
            print(&serde_json::json!({ "postId": post_id, "reaction": reaction }))
        }
        Commands::Reactions { post_id } => print(&reader.get_reactions(&post_id).await?),
        Commands::Reply {
            post_id,
            user_id,
            content,
        } => print(
            &EngagementEngine::new(client, analyzer)
                .reply(&post_id, &user_id, &content)
                .await?,
        ),
        Commands::Replies { post_id } => print(&reader.get_replies(&post_id).await?),
        Commands::Follow {
            user_id,
            target_user_id,
        } => {
            writer.follow_user(&user_id, &target_user_id).await?;
            print(&serde_json::json!({ "following": true }))
        }
        Commands::Unfollow {
            user_id,
            target_user_id,
        } => {
            let removed = writer.unfollow_user(&user_id, &target_user_id).await?;
            print(&serde_json::json!({ "removed": removed }))
        }
        Commands::Network { user_id } => print(&Network {
            followers: reader.list_followers(&user_id).await?,
            following: reader.list_following(&user_id).await?,
        }),
        Commands::Feed { emotion } => {
            print(&FeedAggregator::new(client).get_feed(emotion.as_deref()).await?)
        }
        Commands::UserPosts { user_id } => {
            print(&FeedAggregator::new(client).get_user_posts(&user_id).await?)
        }
        Commands::Influence { post_id } => {
            print(&InfluenceResolver::new(client).get_post_influence(&post_id).await?)
        }
        Commands::Emotions => print(&reader.get_all_emotion_tags().await?),
        Commands::User { user_id } => print(&reader.get_user_with_details(&user_id).await?),
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
