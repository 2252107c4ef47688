//! Reputation-weighted sentiment tally for one ticker's post corpus.

use serde::{Deserialize, Serialize};
use stockfeed_core::{Sentiment, SignalPost};

/// Discretized trading signal derived from the normalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStrength {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl SignalStrength {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignalStrength::StrongBuy => "Strong Buy",
            SignalStrength::Buy => "Buy",
            SignalStrength::Neutral => "Neutral",
            SignalStrength::Sell => "Sell",
            SignalStrength::StrongSell => "Strong Sell",
        }
    }
}

impl std::fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the raw votes cast by `Expert`/`Oracle` authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpertConsensus {
    Bullish,
    Bearish,
    Neutral,
    #[serde(rename = "No Data")]
    NoData,
}

impl ExpertConsensus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExpertConsensus::Bullish => "Bullish",
            ExpertConsensus::Bearish => "Bearish",
            ExpertConsensus::Neutral => "Neutral",
            ExpertConsensus::NoData => "No Data",
        }
    }
}

impl std::fmt::Display for ExpertConsensus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Threshold {
    Above(i32),
    Below(i32),
}

impl Threshold {
    fn matches(self, score: i32) -> bool {
        match self {
            Threshold::Above(bound) => score > bound,
            Threshold::Below(bound) => score < bound,
        }
    }
}

/// Checked in order; the first matching band wins.
const STRENGTH_BANDS: [(Threshold, SignalStrength); 4] = [
    (Threshold::Above(50), SignalStrength::StrongBuy),
    (Threshold::Above(20), SignalStrength::Buy),
    (Threshold::Below(-50), SignalStrength::StrongSell),
    (Threshold::Below(-20), SignalStrength::Sell),
];

/// Map a normalized score in `-100..=100` to its signal band.
#[must_use]
pub fn classify(score: i32) -> SignalStrength {
    STRENGTH_BANDS
        .iter()
        .find(|(threshold, _)| threshold.matches(score))
        .map_or(SignalStrength::Neutral, |&(_, strength)| strength)
}

/// Directional vote of a post. `None` for neutral or not-yet-analyzed posts,
/// which take no part in the tally at all.
fn vote(sentiment: Option<Sentiment>) -> Option<i32> {
    match sentiment? {
        Sentiment::Bullish => Some(1),
        Sentiment::Bearish => Some(-1),
        Sentiment::Neutral => None,
    }
}

/// Weight of one post: `0.5 + reputation/200`, doubled for experts, plus
/// `quality/100` when an insight is attached.
#[must_use]
pub fn post_weight(post: &SignalPost) -> f64 {
    let mut weight = 0.5 + f64::from(post.author.reputation_score) / 200.0;
    if post.author.rank.is_expert() {
        weight *= 2.0;
    }
    if let Some(quality) = post.insight_quality {
        weight += f64::from(quality) / 100.0;
    }
    weight
}

/// JavaScript-style `Math.round`: halves round toward positive infinity.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn round_half_up(value: f64) -> i32 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i32
}

/// Running sums over the scorable posts of a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tally {
    pub weighted_sum: f64,
    pub weight_sum: f64,
    pub expert_sum: i32,
    pub expert_count: u32,
}

impl Tally {
    #[must_use]
    pub fn from_posts(posts: &[SignalPost]) -> Self {
        let mut tally = Self::default();
        for post in posts {
            let Some(score) = vote(post.sentiment) else {
                continue;
            };
            let weight = post_weight(post);
            tally.weighted_sum += f64::from(score) * weight;
            tally.weight_sum += weight;
            if post.author.rank.is_expert() {
                tally.expert_sum += score;
                tally.expert_count += 1;
            }
        }
        tally
    }

    /// Weighted mean vote in `[-1, 1]`; zero when nothing carried weight.
    #[must_use]
    pub fn final_score(&self) -> f64 {
        if self.weight_sum > 0.0 {
            self.weighted_sum / self.weight_sum
        } else {
            0.0
        }
    }

    /// `round(final * 100)`, clamped to `-100..=100`.
    #[must_use]
    pub fn normalized_score(&self) -> i32 {
        round_half_up(self.final_score() * 100.0).clamp(-100, 100)
    }

    #[must_use]
    pub fn consensus(&self) -> ExpertConsensus {
        if self.expert_count == 0 {
            return ExpertConsensus::NoData;
        }
        match self.expert_sum.signum() {
            1 => ExpertConsensus::Bullish,
            -1 => ExpertConsensus::Bearish,
            _ => ExpertConsensus::Neutral,
        }
    }

    /// Mean expert vote scaled to `-100..=100`, zero without experts.
    #[must_use]
    pub fn expert_sentiment(&self) -> i32 {
        if self.expert_count == 0 {
            return 0;
        }
        round_half_up(f64::from(self.expert_sum) / f64::from(self.expert_count) * 100.0)
    }
}
