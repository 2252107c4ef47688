use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("post store error: {0}")]
    Store(#[from] stockfeed_db::DbError),

    #[error("quote error: {0}")]
    Quote(#[from] stockfeed_market::MarketError),

    #[error("text generation error: {0}")]
    Generator(String),

    #[error("text generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("unparseable generator output: {0}")]
    Parse(String),
}
