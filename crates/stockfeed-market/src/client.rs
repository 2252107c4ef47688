//! HTTP client for the Yahoo Finance quote API.
//!
//! Wraps `reqwest` with quote-specific error handling and typed response
//! deserialization. Every call is a single attempt: callers decide how to
//! degrade when a quote is unavailable.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::MarketError;
use crate::types::{MarketQuote, QuoteEnvelope};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/";
const QUOTE_PATH: &str = "v7/finance/quote";

/// Client for the Yahoo Finance quote endpoint.
///
/// Use [`QuoteClient::new`] for production or [`QuoteClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: Client,
    base_url: Url,
}

impl QuoteClient {
    /// Creates a new client pointed at the production quote API.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, MarketError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`MarketError::ApiError`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("Mozilla/5.0 (compatible; stockfeed/0.1)")
            .build()?;

        // Exactly one trailing slash so `join` appends rather than replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| MarketError::ApiError(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Fetches the current quote for `symbol`.
    ///
    /// # Errors
    ///
    /// - [`MarketError::Http`] on network failure or non-2xx HTTP status.
    /// - [`MarketError::ApiError`] if the envelope carries an error.
    /// - [`MarketError::NotFound`] if the result list is empty.
    /// - [`MarketError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn get_quote(&self, symbol: &str) -> Result<MarketQuote, MarketError> {
        let url = self.build_url(symbol)?;
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        let envelope: QuoteEnvelope =
            serde_json::from_str(&body).map_err(|e| MarketError::Deserialize {
                context: format!("quote(symbol={symbol})"),
                source: e,
            })?;

        if let Some(err) = envelope.quote_response.error {
            let msg = err
                .description
                .or(err.code)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(MarketError::ApiError(msg));
        }

        let quote = envelope
            .quote_response
            .result
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
            .map(MarketQuote::from)
            .ok_or_else(|| MarketError::NotFound(symbol.to_string()))?;

        tracing::debug!(symbol, price = ?quote.price, "fetched quote");
        Ok(quote)
    }

    /// Builds the quote URL with the symbol percent-encoded.
    fn build_url(&self, symbol: &str) -> Result<Url, MarketError> {
        let mut url = self
            .base_url
            .join(QUOTE_PATH)
            .map_err(|e| MarketError::ApiError(format!("invalid quote URL: {e}")))?;
        url.query_pairs_mut().append_pair("symbols", symbol);
        Ok(url)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
