pub mod analysis;
pub mod app_config;
pub mod config;
pub mod posts;

use thiserror::Error;

pub use analysis::{InsightType, PostAnalysis, TagCategory};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use posts::{normalize_ticker, AuthorRank, AuthorStanding, Sentiment, SignalPost};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid sentiment: {0}")]
    InvalidSentiment(String),
    #[error("invalid insight type: {0}")]
    InvalidInsightType(String),
}
