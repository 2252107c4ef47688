//! Market pulse: a fear/greed reading over the major US indices.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stockfeed_market::MarketQuote;

use crate::collaborators::{QuoteProvider, TextGenerator};
use crate::tally::round_half_up;

const SP500: &str = "^GSPC";
const NASDAQ: &str = "^IXIC";
const DOW: &str = "^DJI";
const VIX: &str = "^VIX";

const DEFAULT_SUMMARY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_VIX: f64 = 15.0;
const PENDING_SUMMARY: &str = "Market data is currently being analyzed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    #[serde(rename = "Extreme Fear")]
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    #[serde(rename = "Extreme Greed")]
    ExtremeGreed,
}

/// Day change percent of each index, and the VIX level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseIndices {
    pub spy: f64,
    pub qqq: f64,
    pub dia: f64,
    pub vix: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseReport {
    /// Fear/greed score in `0..=100`.
    pub score: i32,
    pub mood: Mood,
    pub summary: String,
    pub indices: PulseIndices,
}

/// Mood from the mean index change. Later bands override earlier ones.
#[must_use]
pub fn mood_for(avg_change: f64) -> Mood {
    let mut mood = Mood::Neutral;
    if avg_change > 0.5 {
        mood = Mood::Greed;
    }
    if avg_change > 1.0 {
        mood = Mood::ExtremeGreed;
    }
    if avg_change < -0.5 {
        mood = Mood::Fear;
    }
    if avg_change < -1.0 {
        mood = Mood::ExtremeFear;
    }
    mood
}

/// `50 + avg * 20`, shifted by the VIX level, rounded and clamped to `0..=100`.
#[must_use]
pub fn fear_greed_score(avg_change: f64, vix: f64) -> i32 {
    let mut score = 50.0 + avg_change * 20.0;
    if vix > 20.0 {
        score -= 10.0;
    }
    if vix > 30.0 {
        score -= 20.0;
    }
    if vix < 15.0 {
        score += 10.0;
    }
    round_half_up(score).clamp(0, 100)
}

#[must_use]
pub fn fallback_summary(avg_change: f64) -> &'static str {
    if avg_change > 0.5 {
        "Markets are rallying led by strong buying momentum."
    } else if avg_change < -0.5 {
        "Markets are under pressure with broad-based selling."
    } else {
        "Markets are trading mixed with little direction today."
    }
}

/// Builds [`PulseReport`]s from live index quotes.
#[derive(Clone)]
pub struct MarketPulse {
    quotes: Arc<dyn QuoteProvider>,
    generator: Arc<dyn TextGenerator>,
    summary_timeout: Duration,
}

impl std::fmt::Debug for MarketPulse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketPulse")
            .field("summary_timeout", &self.summary_timeout)
            .finish_non_exhaustive()
    }
}

impl MarketPulse {
    #[must_use]
    pub fn new(quotes: Arc<dyn QuoteProvider>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            quotes,
            generator,
            summary_timeout: DEFAULT_SUMMARY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_summary_timeout(mut self, timeout: Duration) -> Self {
        self.summary_timeout = timeout;
        self
    }

    /// Fetch the four index quotes concurrently and derive the report.
    ///
    /// Missing quotes count as a flat day (VIX as 15); a failed summary
    /// generation falls back to a canned sentence.
    pub async fn report(&self) -> PulseReport {
        let symbols = [SP500, NASDAQ, DOW, VIX];
        let quotes = futures::future::join_all(symbols.iter().map(|s| self.fetch(s))).await;

        let change = |q: &Option<MarketQuote>| {
            q.as_ref()
                .and_then(|q| q.change_percent)
                .unwrap_or(0.0)
        };
        let spy = change(&quotes[0]);
        let qqq = change(&quotes[1]);
        let dia = change(&quotes[2]);
        let vix = quotes[3]
            .as_ref()
            .and_then(|q| q.price)
            .filter(|p| *p != 0.0)
            .unwrap_or(DEFAULT_VIX);

        let avg = (spy + qqq + dia) / 3.0;
        let indices = PulseIndices { spy, qqq, dia, vix };

        PulseReport {
            score: fear_greed_score(avg, vix),
            mood: mood_for(avg),
            summary: self.summary(&indices, avg).await,
            indices,
        }
    }

    async fn fetch(&self, symbol: &str) -> Option<MarketQuote> {
        match self.quotes.quote(symbol).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "index quote unavailable");
                None
            }
        }
    }

    async fn summary(&self, indices: &PulseIndices, avg: f64) -> String {
        let prompt = format!(
            "You are a financial analyst. In one short sentence, summarize today's market \
             mood from these figures. Do not use markdown.\n\
             S&P 500: {:.2}%\nNasdaq: {:.2}%\nDow: {:.2}%\nVIX: {}\n",
            indices.spy, indices.qqq, indices.dia, indices.vix
        );

        let result = tokio::time::timeout(
            self.summary_timeout,
            self.generator.generate(&prompt, self.summary_timeout),
        )
        .await;

        match result {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => PENDING_SUMMARY.to_string(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "market summary generation failed");
                fallback_summary(avg).to_string()
            }
            Err(_) => {
                tracing::warn!("market summary generation timed out");
                fallback_summary(avg).to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{FakeGenerator, FakeQuotes, Reply};

    fn index(symbol: &str, change: f64, price: f64) -> MarketQuote {
        MarketQuote {
            symbol: symbol.to_string(),
            change_percent: Some(change),
            price: Some(price),
            ..MarketQuote::default()
        }
    }

    #[test]
    fn mood_bands_override_in_order() {
        assert_eq!(mood_for(0.0), Mood::Neutral);
        assert_eq!(mood_for(0.5), Mood::Neutral);
        assert_eq!(mood_for(0.8), Mood::Greed);
        assert_eq!(mood_for(1.2), Mood::ExtremeGreed);
        assert_eq!(mood_for(-0.8), Mood::Fear);
        assert_eq!(mood_for(-1.5), Mood::ExtremeFear);
    }

    #[test]
    fn score_adjusts_for_vix() {
        assert_eq!(fear_greed_score(0.0, 15.0), 50);
        assert_eq!(fear_greed_score(0.0, 12.0), 60);
        assert_eq!(fear_greed_score(0.0, 25.0), 40);
        assert_eq!(fear_greed_score(0.0, 35.0), 20);
        assert_eq!(fear_greed_score(1.0, 15.0), 70);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(fear_greed_score(5.0, 10.0), 100);
        assert_eq!(fear_greed_score(-5.0, 40.0), 0);
    }

    #[test]
    fn mood_serializes_with_spaces() {
        assert_eq!(
            serde_json::to_value(Mood::ExtremeGreed).expect("serialize"),
            serde_json::json!("Extreme Greed")
        );
    }

    #[tokio::test]
    async fn report_combines_quotes_and_summary() {
        let quotes = FakeQuotes::default()
            .with(index("^GSPC", 1.0, 5000.0))
            .with(index("^IXIC", 1.5, 16000.0))
            .with(index("^DJI", 0.5, 39000.0))
            .with(index("^VIX", -3.0, 13.0));
        let quotes = Arc::new(quotes);
        let generator = Arc::new(FakeGenerator::new(Reply::Text(
            "  Stocks climbed on broad strength.\n".to_string(),
        )));

        let report = MarketPulse::new(quotes.clone(), generator.clone())
            .report()
            .await;

        assert_eq!(report.mood, Mood::Greed);
        // 50 + 1.0 * 20 + 10
        assert_eq!(report.score, 80);
        assert_eq!(report.summary, "Stocks climbed on broad strength.");
        assert!((report.indices.vix - 13.0).abs() < f64::EPSILON);
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 4);
        let prompt = generator.last_prompt().expect("prompt");
        assert!(prompt.contains("Nasdaq: 1.50%"));
    }

    #[tokio::test]
    async fn missing_quotes_default_to_flat_market() {
        let report = MarketPulse::new(
            Arc::new(FakeQuotes::default()),
            Arc::new(FakeGenerator::new(Reply::Fail)),
        )
        .report()
        .await;

        assert_eq!(report.mood, Mood::Neutral);
        assert_eq!(report.score, 50);
        assert!((report.indices.vix - DEFAULT_VIX).abs() < f64::EPSILON);
        assert_eq!(report.summary, fallback_summary(0.0));
    }

    #[tokio::test]
    async fn selloff_without_generator_uses_pressure_summary() {
        let quotes = FakeQuotes::default()
            .with(index("^GSPC", -1.0, 5000.0))
            .with(index("^IXIC", -2.0, 16000.0))
            .with(index("^DJI", -0.6, 39000.0))
            .with(index("^VIX", 8.0, 32.0));

        let report = MarketPulse::new(
            Arc::new(quotes),
            Arc::new(FakeGenerator::new(Reply::Hang)),
        )
        .with_summary_timeout(Duration::from_millis(20))
        .report()
        .await;

        assert_eq!(report.mood, Mood::ExtremeFear);
        // 50 - 24 - 10 - 20 = -4 -> 0
        assert_eq!(report.score, 0);
        assert_eq!(
            report.summary,
            "Markets are under pressure with broad-based selling."
        );
    }

    #[tokio::test]
    async fn blank_generation_keeps_pending_summary() {
        let report = MarketPulse::new(
            Arc::new(FakeQuotes::default()),
            Arc::new(FakeGenerator::new(Reply::Text("   ".to_string()))),
        )
        .report()
        .await;

        assert_eq!(report.summary, PENDING_SUMMARY);
    }
}
