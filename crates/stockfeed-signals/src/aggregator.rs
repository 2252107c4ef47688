//! Per-ticker signal aggregation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::collaborators::{PostStore, QuoteProvider, TextGenerator};
use crate::error::SignalError;
use crate::narrator::{narrate, NarrationInputs};
use crate::tally::{classify, Tally};
use crate::types::{Breakdown, SignalResult};

const DEFAULT_NARRATION_TIMEOUT: Duration = Duration::from_secs(30);
const LOOKBACK_HOURS: i64 = 24;

/// Combines the recent post corpus, live volatility and a generated
/// strategy blurb into a [`SignalResult`].
///
/// Collaborators are shared handles; one aggregator serves every request.
#[derive(Clone)]
pub struct SignalAggregator {
    posts: Arc<dyn PostStore>,
    quotes: Arc<dyn QuoteProvider>,
    generator: Arc<dyn TextGenerator>,
    narration_timeout: Duration,
}

impl std::fmt::Debug for SignalAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalAggregator")
            .field("narration_timeout", &self.narration_timeout)
            .finish_non_exhaustive()
    }
}

impl SignalAggregator {
    #[must_use]
    pub fn new(
        posts: Arc<dyn PostStore>,
        quotes: Arc<dyn QuoteProvider>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            posts,
            quotes,
            generator,
            narration_timeout: DEFAULT_NARRATION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_narration_timeout(mut self, timeout: Duration) -> Self {
        self.narration_timeout = timeout;
        self
    }

    /// Compute the signal for `ticker` over the trailing 24 hours.
    ///
    /// Never fails. Quote and generation failures degrade to fallback values;
    /// a post store failure yields [`SignalResult::failed`].
    pub async fn get_signal(&self, ticker: &str) -> SignalResult {
        match self.compute(ticker).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(ticker, error = %e, "signal aggregation failed");
                SignalResult::failed(ticker)
            }
        }
    }

    async fn compute(&self, ticker: &str) -> Result<SignalResult, SignalError> {
        let since = Utc::now() - chrono::Duration::hours(LOOKBACK_HOURS);

        let (posts, volatility) =
            tokio::join!(self.posts.find_posts(ticker, since), self.volatility(ticker));
        let posts = posts?;

        let tally = Tally::from_posts(&posts);
        let score = tally.normalized_score();
        let strength = classify(score);
        let consensus = tally.consensus();

        let inputs = NarrationInputs {
            ticker,
            score,
            strength,
            consensus,
            volatility,
            post_count: posts.len(),
        };
        let narrative = narrate(self.generator.as_ref(), &inputs, self.narration_timeout).await;

        tracing::debug!(
            ticker,
            posts = posts.len(),
            score,
            strength = %strength,
            consensus = %consensus,
            "signal computed"
        );

        Ok(SignalResult {
            ticker: ticker.to_string(),
            sentiment_score: score,
            signal_strength: strength,
            expert_consensus: consensus,
            strategy: narrative.strategy,
            reasoning: narrative.reasoning,
            breakdown: Breakdown {
                community_sentiment: score,
                expert_sentiment: tally.expert_sentiment(),
                volatility,
            },
        })
    }

    async fn volatility(&self, ticker: &str) -> f64 {
        match self.quotes.quote(ticker).await {
            Ok(quote) => quote.intraday_volatility(),
            Err(e) => {
                tracing::warn!(ticker, error = %e, "volatility unavailable, using 0");
                0.0
            }
        }
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
