//! Strategy narration: asks the text generator for a strategy name and a
//! one-sentence rationale, and falls back to fixed wording when it cannot.

use std::time::Duration;

use crate::collaborators::TextGenerator;
use crate::tally::{ExpertConsensus, SignalStrength};

pub const DEFAULT_STRATEGY: &str = "Hold and Monitor";
pub const INSUFFICIENT_DATA_REASONING: &str = "Insufficient data to generate a strategy.";
pub const UNAVAILABLE_REASONING: &str = "AI unavailable. Based on sentiment score.";
pub const AI_ANALYSIS_STRATEGY: &str = "AI Analysis";
pub(crate) const FAILURE_STRATEGY: &str = "Error";
pub(crate) const FAILURE_REASONING: &str = "Failed to calculate signals.";

/// Unlabeled replies at or under this many characters are ignored.
const FALLBACK_MIN_CHARS: usize = 10;
const FALLBACK_EXCERPT_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub strategy: String,
    pub reasoning: String,
}

impl Narrative {
    fn new(strategy: &str, reasoning: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            reasoning: reasoning.to_string(),
        }
    }

    #[must_use]
    pub fn insufficient_data() -> Self {
        Self::new(DEFAULT_STRATEGY, INSUFFICIENT_DATA_REASONING)
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(DEFAULT_STRATEGY, UNAVAILABLE_REASONING)
    }
}

/// Figures the prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct NarrationInputs<'a> {
    pub ticker: &'a str,
    pub score: i32,
    pub strength: SignalStrength,
    pub consensus: ExpertConsensus,
    pub volatility: f64,
    pub post_count: usize,
}

#[must_use]
pub fn build_prompt(inputs: &NarrationInputs<'_>) -> String {
    format!(
        "You are a quantitative trading desk. Propose a trading strategy for {ticker} \
         from the following signals.\n\
         - Weighted Sentiment Score: {score} (scale -100 to 100)\n\
         - Signal Strength: {strength}\n\
         - Expert Consensus: {consensus}\n\
         - Recent Volatility: {volatility:.2}%\n\
         - Post Volume: {posts}\n\n\
         Answer in exactly this format:\n\
         Strategy: <short strategy name, e.g. Momentum Long or Mean Reversion>\n\
         Reasoning: <one sentence>\n",
        ticker = inputs.ticker,
        score = inputs.score,
        strength = inputs.strength,
        consensus = inputs.consensus,
        volatility = inputs.volatility,
        posts = inputs.post_count,
    )
}

/// Parse a generator reply into a [`Narrative`].
///
/// Labels are matched case-insensitively anywhere in a line, so
/// `**Recommended Strategy:** X` still yields `X`. A label with
/// nothing after the colon takes the next non-blank line. Without a
/// `Strategy:` label, a reply longer than a few characters becomes an
/// "AI Analysis" excerpt.
#[must_use]
pub fn parse_reply(text: &str) -> Narrative {
    let strategy = labeled_value(text, "strategy");
    let reasoning = labeled_value(text, "reasoning");

    match strategy {
        Some(strategy) => Narrative {
            strategy,
            reasoning: reasoning.unwrap_or_else(|| INSUFFICIENT_DATA_REASONING.to_string()),
        },
        None if text.chars().count() > FALLBACK_MIN_CHARS => Narrative {
            strategy: AI_ANALYSIS_STRATEGY.to_string(),
            reasoning: excerpt(text),
        },
        None => Narrative {
            strategy: DEFAULT_STRATEGY.to_string(),
            reasoning: reasoning.unwrap_or_else(|| INSUFFICIENT_DATA_REASONING.to_string()),
        },
    }
}

/// Ask `generator` for a narrative. Never fails: an empty corpus skips the
/// call, and a generator error or timeout yields [`Narrative::unavailable`].
pub async fn narrate(
    generator: &dyn TextGenerator,
    inputs: &NarrationInputs<'_>,
    timeout: Duration,
) -> Narrative {
    if inputs.post_count == 0 {
        return Narrative::insufficient_data();
    }

    let prompt = build_prompt(inputs);
    match tokio::time::timeout(timeout, generator.generate(&prompt, timeout)).await {
        Ok(Ok(reply)) => parse_reply(&reply),
        Ok(Err(e)) => {
            tracing::warn!(ticker = inputs.ticker, error = %e, "strategy generation failed");
            Narrative::unavailable()
        }
        Err(_) => {
            tracing::warn!(
                ticker = inputs.ticker,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "strategy generation timed out"
            );
            Narrative::unavailable()
        }
    }
}

fn is_markup(c: char) -> bool {
    matches!(c, '*' | '_')
}

/// Value following `label:` on the first line that contains it.
fn labeled_value(text: &str, label: &str) -> Option<String> {
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let Some(rest) = strip_label(line, label) else {
            continue;
        };
        let value = clean_value(rest);
        if !value.is_empty() {
            return Some(value.to_string());
        }
        let next = lines
            .find(|l| !l.trim().is_empty())
            .map(|l| clean_value(l).to_string());
        return Some(next.unwrap_or_default());
    }
    None
}

/// Text after the first `label:` anywhere in `line`. `label` is lowercase.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let lower = line.to_ascii_lowercase();
    lower.match_indices(label).find_map(|(start, _)| {
        line[start + label.len()..]
            .trim_start_matches(is_markup)
            .strip_prefix(':')
    })
}

fn clean_value(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches(is_markup)
        .trim_end_matches(is_markup)
        .trim()
}

fn excerpt(text: &str) -> String {
    let mut out: String = text
        .replace('\n', " ")
        .chars()
        .take(FALLBACK_EXCERPT_CHARS)
        .collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{FakeGenerator, Reply};

    fn inputs(post_count: usize) -> NarrationInputs<'static> {
        NarrationInputs {
            ticker: "NVDA",
            score: 64,
            strength: SignalStrength::StrongBuy,
            consensus: ExpertConsensus::Bullish,
            volatility: 3.456,
            post_count,
        }
    }

    #[test]
    fn prompt_embeds_every_input() {
        let prompt = build_prompt(&inputs(7));
        assert!(prompt.contains("NVDA"));
        assert!(prompt.contains("Weighted Sentiment Score: 64"));
        assert!(prompt.contains("Signal Strength: Strong Buy"));
        assert!(prompt.contains("Expert Consensus: Bullish"));
        assert!(prompt.contains("Recent Volatility: 3.46%"));
        assert!(prompt.contains("Post Volume: 7"));
    }

    #[test]
    fn parses_both_labels() {
        let n = parse_reply("Strategy: Momentum Long\nReasoning: Experts and crowd agree.\n");
        assert_eq!(n.strategy, "Momentum Long");
        assert_eq!(n.reasoning, "Experts and crowd agree.");
    }

    #[test]
    fn labels_are_case_insensitive_and_tolerate_markdown() {
        let n = parse_reply("Here you go:\n**STRATEGY:** Mean Reversion\n- **reasoning**: Overextended rally.");
        assert_eq!(n.strategy, "Mean Reversion");
        assert_eq!(n.reasoning, "Overextended rally.");
    }

    #[test]
    fn label_is_found_mid_line() {
        let n = parse_reply("Recommended Strategy: Momentum Long\nReasoning: Crowd and experts agree.");
        assert_eq!(n.strategy, "Momentum Long");
        assert_eq!(n.reasoning, "Crowd and experts agree.");
    }

    #[test]
    fn single_line_reply_keeps_rest_of_line_as_strategy() {
        let n = parse_reply("Strategy: Swing Long. Reasoning: Bids are strong.");
        assert_eq!(n.strategy, "Swing Long. Reasoning: Bids are strong.");
        assert_eq!(n.reasoning, "Bids are strong.");
    }

    #[test]
    fn empty_label_value_takes_next_line() {
        let n = parse_reply("Strategy:\n\n  Breakout Long  \nReasoning: Volume spike.");
        assert_eq!(n.strategy, "Breakout Long");
        assert_eq!(n.reasoning, "Volume spike.");
    }

    #[test]
    fn strategy_without_reasoning_keeps_default_reasoning() {
        let n = parse_reply("Strategy: Covered Calls");
        assert_eq!(n.strategy, "Covered Calls");
        assert_eq!(n.reasoning, INSUFFICIENT_DATA_REASONING);
    }

    #[test]
    fn unlabeled_reply_becomes_ai_analysis_excerpt() {
        let reply = format!("The stock looks strong.\nBuy dips. {}", "x".repeat(300));
        let n = parse_reply(&reply);
        assert_eq!(n.strategy, AI_ANALYSIS_STRATEGY);
        assert!(n.reasoning.starts_with("The stock looks strong. Buy dips."));
        assert!(n.reasoning.ends_with("..."));
        assert_eq!(n.reasoning.chars().count(), FALLBACK_EXCERPT_CHARS + 3);
        assert!(!n.reasoning.contains('\n'));
    }

    #[test]
    fn unlabeled_reply_overrides_reasoning_label() {
        let n = parse_reply("Reasoning: volume is thin today");
        assert_eq!(n.strategy, AI_ANALYSIS_STRATEGY);
        assert_eq!(n.reasoning, "Reasoning: volume is thin today...");
    }

    #[test]
    fn short_unlabeled_reply_keeps_defaults() {
        assert_eq!(parse_reply("ok"), Narrative::insufficient_data());
        assert_eq!(parse_reply("0123456789"), Narrative::insufficient_data());
    }

    #[tokio::test]
    async fn empty_corpus_skips_generation() {
        let generator = FakeGenerator::new(Reply::Text("Strategy: X".to_string()));
        let n = narrate(&generator, &inputs(0), Duration::from_secs(1)).await;
        assert_eq!(n, Narrative::insufficient_data());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generator_error_is_unavailable() {
        let generator = FakeGenerator::new(Reply::Fail);
        let n = narrate(&generator, &inputs(3), Duration::from_secs(1)).await;
        assert_eq!(n, Narrative::unavailable());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generator_timeout_is_unavailable() {
        let generator = FakeGenerator::new(Reply::Hang);
        let n = narrate(&generator, &inputs(3), Duration::from_millis(20)).await;
        assert_eq!(n, Narrative::unavailable());
    }

    #[tokio::test]
    async fn successful_generation_is_parsed() {
        let generator =
            FakeGenerator::new(Reply::Text("Strategy: Swing Long\nReasoning: Strong bids.".into()));
        let n = narrate(&generator, &inputs(2), Duration::from_secs(1)).await;
        assert_eq!(n.strategy, "Swing Long");
        assert_eq!(n.reasoning, "Strong bids.");
        let prompt = generator.last_prompt().expect("prompt recorded");
        assert!(prompt.contains("Post Volume: 2"));
    }
}
