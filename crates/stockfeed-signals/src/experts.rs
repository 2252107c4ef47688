//! Expert desk: turns live quotes into short analyst posts published under
//! a bot Oracle account, which the aggregator then weighs as expert input.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use stockfeed_core::{AuthorRank, InsightType, PostAnalysis, Sentiment};
use stockfeed_market::MarketQuote;

use crate::collaborators::{AuthorProfile, ExpertStore, QuoteProvider, TextGenerator};
use crate::error::SignalError;

/// The bot account expert posts are published under.
pub const ORACLE: AuthorProfile<'static> = AuthorProfile {
    username: "AI_Oracle",
    display_name: "AI Market Oracle",
    bio: "Real-time AI-powered market analysis",
    reputation_score: 980,
    rank: AuthorRank::Oracle,
};

/// Tickers covered when a sync names none.
pub const DEFAULT_WATCHLIST: [&str; 5] = ["NVDA", "TSLA", "AMD", "GME", "BTC"];
pub const MAX_TICKERS_PER_SYNC: usize = 5;

const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(15);
const RECENT_POST_WINDOW_MINUTES: i64 = 60;

const MAX_CONTENT_CHARS: usize = 200;
const MAX_SUMMARY_CHARS: usize = 100;
const DEFAULT_SUMMARY: &str = "Market analysis";
const DEFAULT_CONFIDENCE: f64 = 0.75;

const BASE_QUALITY: i32 = 70;
const MAX_QUALITY: i32 = 95;

const SENTIMENT_WORDS: [&str; 3] = ["BULLISH", "BEARISH", "NEUTRAL"];
const INSIGHT_WORDS: [&str; 3] = ["TECHNICAL", "FUNDAMENTAL", "MACRO"];

/// A drafted expert post, ready to store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpertPost {
    pub ticker: String,
    pub content: String,
    pub analysis: PostAnalysis,
}

/// Outcome of one sync, by ticker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub generated: Vec<String>,
    /// Tickers the bot already covered within the last hour.
    pub skipped: Vec<String>,
    /// Tickers with no quote, no reply or an unusable reply.
    pub failed: Vec<String>,
}

/// Figures the prompt and the quality heuristic are built from. Missing
/// quote fields read as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteFacts {
    pub price: f64,
    pub change_percent: f64,
    pub volume: u64,
    /// `(high - low) / low * 100`, or `0.0` without both bounds.
    pub volatility: f64,
    pub above_fifty_day: bool,
    pub above_two_hundred_day: bool,
}

impl From<&MarketQuote> for QuoteFacts {
    fn from(quote: &MarketQuote) -> Self {
        let price = quote.price.unwrap_or(0.0);
        let high = quote.day_high.unwrap_or(0.0);
        let low = quote.day_low.unwrap_or(0.0);
        let volatility = if high != 0.0 && low != 0.0 {
            (high - low) / low * 100.0
        } else {
            0.0
        };

        Self {
            price,
            change_percent: quote.change_percent.unwrap_or(0.0),
            volume: quote.volume.unwrap_or(0),
            volatility,
            above_fifty_day: price > quote.fifty_day_average.unwrap_or(0.0),
            above_two_hundred_day: price > quote.two_hundred_day_average.unwrap_or(0.0),
        }
    }
}

/// Conviction heuristic: 70, plus 10 for a move beyond 3%, 5 for an
/// intraday range above 2%, 10 when price sits above both moving averages.
#[must_use]
pub fn quality_score(facts: &QuoteFacts) -> i32 {
    let mut score = BASE_QUALITY;
    if facts.change_percent.abs() > 3.0 {
        score += 10;
    }
    if facts.volatility > 2.0 {
        score += 5;
    }
    if facts.above_fifty_day && facts.above_two_hundred_day {
        score += 10;
    }
    score.min(MAX_QUALITY)
}

#[must_use]
pub fn build_prompt(ticker: &str, facts: &QuoteFacts) -> String {
    format!(
        "You are a professional stock market analyst. Analyze {ticker} and provide an expert opinion.\n\n\
         Market Data:\n\
         - Current Price: ${price:.2}\n\
         - Daily Change: {change:.2}%\n\
         - Volume: {volume}\n\
         - Intraday Volatility: {volatility:.2}%\n\
         - Above 50-day MA: {fifty}\n\
         - Above 200-day MA: {two_hundred}\n\n\
         Provide a brief expert analysis in this EXACT format:\n\
         Sentiment: [BULLISH or BEARISH or NEUTRAL]\n\
         Content: [One sentence trading opinion, max 120 characters]\n\
         Type: [TECHNICAL or FUNDAMENTAL or MACRO]\n\
         Summary: [Brief 3-5 word summary]\n\
         Confidence: [0.60 to 0.95]\n\n\
         Example:\n\
         Sentiment: BULLISH\n\
         Content: Strong momentum above key moving averages. Accumulating on dips.\n\
         Type: TECHNICAL\n\
         Summary: Momentum breakout, MA support\n\
         Confidence: 0.82",
        price = facts.price,
        change = facts.change_percent,
        volume = group_thousands(facts.volume),
        volatility = facts.volatility,
        fifty = yes_no(facts.above_fifty_day),
        two_hundred = yes_no(facts.above_two_hundred_day),
    )
}

/// Parse a generator reply into an [`ExpertPost`].
///
/// `Sentiment:` and `Content:` are required; type, summary and confidence
/// fall back to `TECHNICAL`, "Market analysis" and 0.75. Labels match
/// case-insensitively anywhere in the reply.
#[must_use]
pub fn parse_expert_reply(ticker: &str, text: &str, facts: &QuoteFacts) -> Option<ExpertPost> {
    let sentiment = label_values(text, "sentiment")
        .into_iter()
        .find_map(|rest| leading_word(rest, &SENTIMENT_WORDS))
        .and_then(|word| word.parse::<Sentiment>().ok())?;
    let content = label_values(text, "content")
        .into_iter()
        .find_map(line_value)
        .map(|line| truncate_chars(line, MAX_CONTENT_CHARS))?;

    let insight_type = label_values(text, "type")
        .into_iter()
        .find_map(|rest| leading_word(rest, &INSIGHT_WORDS))
        .and_then(|word| word.parse::<InsightType>().ok())
        .unwrap_or(InsightType::Technical);
    let summary = label_values(text, "summary")
        .into_iter()
        .find_map(line_value)
        .map_or_else(
            || DEFAULT_SUMMARY.to_string(),
            |line| truncate_chars(line, MAX_SUMMARY_CHARS),
        );
    let confidence = label_values(text, "confidence")
        .into_iter()
        .find_map(leading_fraction)
        .unwrap_or(DEFAULT_CONFIDENCE);

    Some(ExpertPost {
        ticker: ticker.to_string(),
        content,
        analysis: PostAnalysis {
            tags: Vec::new(),
            sentiment,
            quality_score: quality_score(facts),
            insight_type,
            summary,
            confidence,
        }
        .normalized(),
    })
}

/// Text after every case-insensitive `label:` in `text`, leading whitespace
/// (newlines included) skipped.
fn label_values<'a>(text: &'a str, label: &str) -> Vec<&'a str> {
    let needle = format!("{label}:");
    text.to_ascii_lowercase()
        .match_indices(&needle)
        .map(|(start, _)| text[start + needle.len()..].trim_start())
        .collect()
}

fn leading_word(rest: &str, words: &[&'static str]) -> Option<&'static str> {
    words.iter().copied().find(|word| {
        rest.get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word))
    })
}

fn line_value(rest: &str) -> Option<&str> {
    let line = rest.lines().next()?.trim();
    (!line.is_empty()).then_some(line)
}

/// A leading `0.<digits>` value.
fn leading_fraction(rest: &str) -> Option<f64> {
    let digits = rest.strip_prefix("0.")?;
    let len = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if len == 0 {
        return None;
    }
    rest[..2 + len].parse().ok()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Deduplicated, normalized tickers for one sync, capped at
/// [`MAX_TICKERS_PER_SYNC`]. An empty request covers [`DEFAULT_WATCHLIST`].
fn select_tickers(requested: &[String]) -> Vec<String> {
    let candidates: Vec<String> = if requested.is_empty() {
        DEFAULT_WATCHLIST.iter().map(ToString::to_string).collect()
    } else {
        requested
            .iter()
            .filter_map(|t| stockfeed_core::normalize_ticker(t))
            .collect()
    };

    let mut selected: Vec<String> = Vec::with_capacity(MAX_TICKERS_PER_SYNC);
    for ticker in candidates {
        if selected.len() == MAX_TICKERS_PER_SYNC {
            break;
        }
        if !selected.contains(&ticker) {
            selected.push(ticker);
        }
    }
    selected
}

/// Drafts and publishes expert posts for a handful of tickers.
#[derive(Clone)]
pub struct ExpertDesk {
    store: Arc<dyn ExpertStore>,
    quotes: Arc<dyn QuoteProvider>,
    generator: Arc<dyn TextGenerator>,
    generation_timeout: Duration,
}

impl std::fmt::Debug for ExpertDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpertDesk")
            .field("generation_timeout", &self.generation_timeout)
            .finish_non_exhaustive()
    }
}

impl ExpertDesk {
    #[must_use]
    pub fn new(
        store: Arc<dyn ExpertStore>,
        quotes: Arc<dyn QuoteProvider>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            store,
            quotes,
            generator,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Draft a post for `ticker`. `None` when the quote, the generator or
    /// the reply parse fails; each case is logged.
    pub async fn draft(&self, ticker: &str) -> Option<ExpertPost> {
        let quote = match self.quotes.quote(ticker).await {
            Ok(quote) => quote,
            Err(e) => {
                tracing::warn!(ticker, error = %e, "expert draft skipped: no quote");
                return None;
            }
        };
        let facts = QuoteFacts::from(&quote);
        let prompt = build_prompt(ticker, &facts);

        let reply = match tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&prompt, self.generation_timeout),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(ticker, error = %e, "expert generation failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(ticker, "expert generation timed out");
                return None;
            }
        };

        let post = parse_expert_reply(ticker, &reply, &facts);
        if post.is_none() {
            tracing::warn!(ticker, "expert reply lacked sentiment or content");
        }
        post
    }

    /// Publish a fresh expert post for each requested ticker the bot has not
    /// covered within the last hour.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Store`] if the author upsert, the recent-post
    /// check or a publish fails. Quote and generation failures only mark
    /// the ticker as failed.
    pub async fn sync(&self, tickers: &[String]) -> Result<SyncReport, SignalError> {
        let tickers = select_tickers(tickers);
        let author_id = self.store.ensure_author(&ORACLE).await?;
        let mut report = SyncReport::default();

        for ticker in tickers {
            let since = Utc::now() - chrono::Duration::minutes(RECENT_POST_WINDOW_MINUTES);
            if self.store.has_recent_post(author_id, &ticker, since).await? {
                tracing::debug!(ticker = %ticker, "recent expert post exists, skipping");
                report.skipped.push(ticker);
                continue;
            }

            match self.draft(&ticker).await {
                Some(post) => {
                    self.store.publish(author_id, &post).await?;
                    tracing::info!(
                        ticker = %ticker,
                        sentiment = %post.analysis.sentiment,
                        "expert post published"
                    );
                    report.generated.push(ticker);
                }
                None => report.failed.push(ticker),
            }
        }

        tracing::info!(
            generated = report.generated.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "expert sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{FakeExperts, FakeGenerator, FakeQuotes, Reply};

    const REPLY: &str = "Sentiment: BULLISH\n\
                         Content: Strong momentum above key moving averages. Accumulating on dips.\n\
                         Type: TECHNICAL\n\
                         Summary: Momentum breakout, MA support\n\
                         Confidence: 0.82";

    fn quote(symbol: &str) -> MarketQuote {
        MarketQuote {
            symbol: symbol.to_string(),
            price: Some(880.45),
            change_percent: Some(2.5),
            day_high: Some(890.0),
            day_low: Some(860.0),
            volume: Some(1_500_000),
            fifty_day_average: Some(800.0),
            two_hundred_day_average: Some(650.0),
        }
    }

    fn facts() -> QuoteFacts {
        QuoteFacts::from(&quote("NVDA"))
    }

    fn desk(store: &Arc<FakeExperts>, quotes: FakeQuotes, reply: Reply) -> ExpertDesk {
        ExpertDesk::new(
            Arc::clone(store) as Arc<dyn ExpertStore>,
            Arc::new(quotes),
            Arc::new(FakeGenerator::new(reply)),
        )
    }

    #[test]
    fn facts_read_missing_fields_as_zero() {
        let bare = QuoteFacts::from(&MarketQuote {
            symbol: "GME".to_string(),
            price: Some(14.5),
            day_high: Some(15.0),
            ..MarketQuote::default()
        });
        assert!(bare.volatility.abs() < f64::EPSILON);
        assert_eq!(bare.volume, 0);
        assert!(bare.above_fifty_day);
        assert!(bare.above_two_hundred_day);
    }

    #[test]
    fn facts_compare_price_to_moving_averages() {
        let f = facts();
        assert!(f.above_fifty_day && f.above_two_hundred_day);
        assert!((f.volatility - 30.0 / 860.0 * 100.0).abs() < 1e-9);

        let below = QuoteFacts::from(&MarketQuote {
            fifty_day_average: Some(900.0),
            ..quote("NVDA")
        });
        assert!(!below.above_fifty_day);
    }

    #[test]
    fn quality_adds_each_boost() {
        let calm = QuoteFacts {
            price: 10.0,
            change_percent: 3.0,
            volume: 0,
            volatility: 2.0,
            above_fifty_day: true,
            above_two_hundred_day: false,
        };
        assert_eq!(quality_score(&calm), 70);

        let busy = QuoteFacts {
            change_percent: -3.5,
            volatility: 2.1,
            above_two_hundred_day: true,
            ..calm
        };
        assert_eq!(quality_score(&busy), 95);
        assert_eq!(quality_score(&facts()), 85);
    }

    #[test]
    fn prompt_embeds_market_data() {
        let prompt = build_prompt("NVDA", &facts());
        assert!(prompt.contains("Analyze NVDA"));
        assert!(prompt.contains("Current Price: $880.45"));
        assert!(prompt.contains("Daily Change: 2.50%"));
        assert!(prompt.contains("Volume: 1,500,000"));
        assert!(prompt.contains("Intraday Volatility: 3.49%"));
        assert!(prompt.contains("Above 50-day MA: Yes"));
        assert!(prompt.contains("Above 200-day MA: Yes"));
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
    }

    #[test]
    fn parses_full_reply() {
        let post = parse_expert_reply("NVDA", REPLY, &facts()).expect("parsed");
        assert_eq!(post.ticker, "NVDA");
        assert_eq!(
            post.content,
            "Strong momentum above key moving averages. Accumulating on dips."
        );
        assert_eq!(post.analysis.sentiment, Sentiment::Bullish);
        assert_eq!(post.analysis.insight_type, InsightType::Technical);
        assert_eq!(post.analysis.summary, "Momentum breakout, MA support");
        assert!((post.analysis.confidence - 0.82).abs() < 1e-9);
        assert_eq!(post.analysis.quality_score, 85);
        assert!(post.analysis.tags.is_empty());
    }

    #[test]
    fn optional_fields_fall_back() {
        let post = parse_expert_reply(
            "TSLA",
            "Here is my take.\nsentiment: bearish\ncontent:   Fading the bounce.\nConfidence: 1.0",
            &facts(),
        )
        .expect("parsed");
        assert_eq!(post.analysis.sentiment, Sentiment::Bearish);
        assert_eq!(post.content, "Fading the bounce.");
        assert_eq!(post.analysis.insight_type, InsightType::Technical);
        assert_eq!(post.analysis.summary, DEFAULT_SUMMARY);
        assert!((post.analysis.confidence - DEFAULT_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn content_on_following_line_is_used() {
        let post = parse_expert_reply(
            "AMD",
            "Sentiment: NEUTRAL\nContent:\n  Range-bound until earnings.\nType: macro",
            &facts(),
        )
        .expect("parsed");
        assert_eq!(post.content, "Range-bound until earnings.");
        assert_eq!(post.analysis.insight_type, InsightType::Macro);
    }

    #[test]
    fn long_fields_are_truncated() {
        let reply = format!(
            "Sentiment: BULLISH\nContent: {}\nSummary: {}",
            "c".repeat(300),
            "s".repeat(150)
        );
        let post = parse_expert_reply("NVDA", &reply, &facts()).expect("parsed");
        assert_eq!(post.content.chars().count(), MAX_CONTENT_CHARS);
        assert_eq!(post.analysis.summary.chars().count(), MAX_SUMMARY_CHARS);
    }

    #[test]
    fn missing_sentiment_or_content_is_rejected() {
        assert!(parse_expert_reply("NVDA", "Content: Looks fine.", &facts()).is_none());
        assert!(parse_expert_reply("NVDA", "Sentiment: BULLISH", &facts()).is_none());
        assert!(
            parse_expert_reply("NVDA", "Sentiment: MOON\nContent: Up only.", &facts()).is_none()
        );
    }

    #[test]
    fn ticker_selection_normalizes_dedups_and_caps() {
        assert_eq!(select_tickers(&[]), DEFAULT_WATCHLIST.map(String::from).to_vec());

        let requested: Vec<String> = ["$nvda", "NVDA", " ", "tsla", "amd", "gme", "btc", "spy"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            select_tickers(&requested),
            vec!["NVDA", "TSLA", "AMD", "GME", "BTC"]
        );
    }

    #[tokio::test]
    async fn sync_publishes_skips_and_fails_per_ticker() {
        let store = Arc::new(FakeExperts::default().with_recent("TSLA"));
        let quotes = FakeQuotes::default().with(quote("NVDA")).with(quote("TSLA"));
        let desk = desk(&store, quotes, Reply::Text(REPLY.to_string()));

        let tickers: Vec<String> = vec!["NVDA".into(), "TSLA".into(), "AMD".into()];
        let report = desk.sync(&tickers).await.expect("sync");

        assert_eq!(report.generated, vec!["NVDA"]);
        assert_eq!(report.skipped, vec!["TSLA"]);
        assert_eq!(report.failed, vec!["AMD"]);

        let published = store.published.lock().expect("lock");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].ticker, "NVDA");
        assert_eq!(published[0].analysis.sentiment, Sentiment::Bullish);
    }

    #[tokio::test]
    async fn sync_upserts_the_oracle_author() {
        let store = Arc::new(FakeExperts::default());
        let desk = desk(&store, FakeQuotes::default(), Reply::Fail);

        desk.sync(&["NVDA".to_string()]).await.expect("sync");

        let authors = store.authors.lock().expect("lock");
        assert_eq!(
            authors.as_slice(),
            &[("AI_Oracle".to_string(), 980, AuthorRank::Oracle)]
        );
    }

    #[tokio::test]
    async fn generation_failure_publishes_nothing() {
        let store = Arc::new(FakeExperts::default());
        let quotes = FakeQuotes::default().with(quote("NVDA"));
        let desk = desk(&store, quotes, Reply::Fail);

        let report = desk.sync(&["NVDA".to_string()]).await.expect("sync");

        assert_eq!(report.failed, vec!["NVDA"]);
        assert!(store.published.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn generation_timeout_marks_ticker_failed() {
        let store = Arc::new(FakeExperts::default());
        let quotes = FakeQuotes::default().with(quote("NVDA"));
        let desk = desk(&store, quotes, Reply::Hang)
            .with_generation_timeout(Duration::from_millis(20));

        let report = desk.sync(&["NVDA".to_string()]).await.expect("sync");
        assert_eq!(report.failed, vec!["NVDA"]);
    }

    #[tokio::test]
    async fn recent_ticker_skips_quote_and_generation() {
        let store = Arc::new(FakeExperts::default().with_recent("NVDA"));
        let quotes = Arc::new(FakeQuotes::default().with(quote("NVDA")));
        let generator = Arc::new(FakeGenerator::new(Reply::Text(REPLY.to_string())));
        let desk = ExpertDesk::new(
            Arc::clone(&store) as Arc<dyn ExpertStore>,
            Arc::clone(&quotes) as Arc<dyn QuoteProvider>,
            Arc::clone(&generator) as Arc<dyn TextGenerator>,
        );

        let report = desk.sync(&["NVDA".to_string()]).await.expect("sync");

        assert_eq!(report.skipped, vec!["NVDA"]);
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn publish_failure_is_an_error() {
        let store = Arc::new(FakeExperts::failing_publish());
        let quotes = FakeQuotes::default().with(quote("NVDA"));
        let desk = desk(&store, quotes, Reply::Text(REPLY.to_string()));

        let err = desk.sync(&["NVDA".to_string()]).await.unwrap_err();
        assert!(matches!(err, SignalError::Store(_)), "got {err:?}");
    }
}
