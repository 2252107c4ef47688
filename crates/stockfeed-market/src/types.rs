//! Yahoo Finance quote response types.
//!
//! The `/v7/finance/quote` endpoint wraps results in
//! `{"quoteResponse": {"result": [...], "error": null}}`.

use serde::{Deserialize, Serialize};

/// Top-level envelope for the quote endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteEnvelope {
    pub quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteResponse {
    #[serde(default)]
    pub result: Vec<RawQuote>,
    #[serde(default)]
    pub error: Option<QuoteApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteApiError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One entry of `quoteResponse.result`. Every numeric field is optional:
/// indices, pre-market symbols and halted listings omit different subsets.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawQuote {
    pub symbol: String,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub regular_market_change_percent: Option<f64>,
    #[serde(default)]
    pub regular_market_day_high: Option<f64>,
    #[serde(default)]
    pub regular_market_day_low: Option<f64>,
    #[serde(default)]
    pub regular_market_volume: Option<u64>,
    #[serde(default)]
    pub fifty_day_average: Option<f64>,
    #[serde(default)]
    pub two_hundred_day_average: Option<f64>,
}

/// A live market quote for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub fifty_day_average: Option<f64>,
    pub two_hundred_day_average: Option<f64>,
}

impl From<RawQuote> for MarketQuote {
    fn from(raw: RawQuote) -> Self {
        Self {
            symbol: raw.symbol,
            price: raw.regular_market_price,
            change_percent: raw.regular_market_change_percent,
            day_high: raw.regular_market_day_high,
            day_low: raw.regular_market_day_low,
            volume: raw.regular_market_volume,
            fifty_day_average: raw.fifty_day_average,
            two_hundred_day_average: raw.two_hundred_day_average,
        }
    }
}

impl MarketQuote {
    /// Intraday volatility in percent.
    ///
    /// `(high - low) / low * 100` when both bounds are present and non-zero,
    /// otherwise the absolute change percent, otherwise `0.0`.
    #[must_use]
    pub fn intraday_volatility(&self) -> f64 {
        match (self.day_high, self.day_low) {
            (Some(high), Some(low)) if high != 0.0 && low != 0.0 => (high - low) / low * 100.0,
            _ => self.change_percent.unwrap_or(0.0).abs(),
        }
    }
}
