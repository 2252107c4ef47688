use serde::{Deserialize, Serialize};

use crate::narrator::{FAILURE_REASONING, FAILURE_STRATEGY};
use crate::tally::{ExpertConsensus, SignalStrength};

/// Per-ticker signal returned by [`crate::SignalAggregator::get_signal`].
///
/// Built fresh on every call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResult {
    pub ticker: String,
    /// Weighted community score in `-100..=100`.
    pub sentiment_score: i32,
    pub signal_strength: SignalStrength,
    pub expert_consensus: ExpertConsensus,
    pub strategy: String,
    pub reasoning: String,
    pub breakdown: Breakdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub community_sentiment: i32,
    pub expert_sentiment: i32,
    /// Intraday volatility in percent.
    pub volatility: f64,
}

impl SignalResult {
    /// The zeroed result returned when the aggregation itself failed.
    #[must_use]
    pub fn failed(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            sentiment_score: 0,
            signal_strength: SignalStrength::Neutral,
            expert_consensus: ExpertConsensus::NoData,
            strategy: FAILURE_STRATEGY.to_string(),
            reasoning: FAILURE_REASONING.to_string(),
            breakdown: Breakdown::default(),
        }
    }
}
