use thiserror::Error;

/// Errors returned by the market quote client.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The quote API reported an error in its envelope.
    #[error("quote API error: {0}")]
    ApiError(String),

    /// The API answered but returned no quote for the symbol.
    #[error("no quote returned for {0}")]
    NotFound(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
