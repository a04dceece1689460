pub mod accounts;
pub mod client;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod influence;
pub mod ingest;
pub mod migrate;
pub mod password;
pub mod reader;
pub mod writer;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use accounts::AccountService;
pub use client::GraphClient;
pub use engagement::{EngagementEngine, ReplyOutcome};
pub use error::{Result, SocialError};
pub use feed::FeedAggregator;
pub use influence::InfluenceResolver;
pub use ingest::{PostIngestor, PublishOutcome};
pub use migrate::migrate;
pub use reader::GraphReader;
pub use writer::GraphWriter;

pub use neo4rs::query;
