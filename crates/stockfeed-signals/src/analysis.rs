//! LLM-backed post analysis: tags, sentiment, quality and insight type.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use stockfeed_core::{InsightType, PostAnalysis, Sentiment};

use crate::collaborators::TextGenerator;
use crate::error::SignalError;

const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Shape the generator is asked to produce. Only `tags` may be omitted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    #[serde(default)]
    tags: Vec<String>,
    sentiment: String,
    quality_score: f64,
    insight_type: String,
    summary: String,
    confidence: f64,
}

/// Turns free-form post text into a [`PostAnalysis`].
#[derive(Clone)]
pub struct PostAnalyzer {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl std::fmt::Debug for PostAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostAnalyzer")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PostAnalyzer {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Analyze `content`. Any generator or parse failure is logged and
    /// replaced by [`PostAnalysis::fallback`].
    pub async fn analyze(&self, content: &str) -> PostAnalysis {
        match self.try_analyze(content).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "post analysis failed, using fallback");
                PostAnalysis::fallback()
            }
        }
    }

    async fn try_analyze(&self, content: &str) -> Result<PostAnalysis, SignalError> {
        let prompt = build_prompt(content);
        let reply = tokio::time::timeout(self.timeout, self.generator.generate(&prompt, self.timeout))
            .await
            .map_err(|_| SignalError::Timeout(self.timeout))??;
        parse_analysis(&reply)
    }
}

fn build_prompt(content: &str) -> String {
    format!(
        "Analyze the following stock trading post. Extract semantic tags (for example \
         \"Tech\", \"Earnings\", \"High Risk\"), decide the overall sentiment, score its \
         quality from 0 to 100 by how actionable and well reasoned it is, classify the \
         insight type and summarize the key insight in one sentence.\n\n\
         Reply with a single JSON object and nothing else, using these keys:\n\
         {{\"tags\": [string], \"sentiment\": \"BULLISH\" | \"BEARISH\" | \"NEUTRAL\", \
         \"qualityScore\": number, \"insightType\": \"FUNDAMENTAL\" | \"TECHNICAL\" | \
         \"MACRO\" | \"EARNINGS\" | \"RISK\" | \"GENERAL\", \"summary\": string, \
         \"confidence\": number between 0 and 1}}\n\n\
         Post Content:\n\"{content}\"\n"
    )
}

/// Parse the outermost `{...}` block of `reply` into a clamped analysis.
fn parse_analysis(reply: &str) -> Result<PostAnalysis, SignalError> {
    let start = reply
        .find('{')
        .ok_or_else(|| SignalError::Parse("no JSON object in reply".to_string()))?;
    let end = reply
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| SignalError::Parse("unterminated JSON object in reply".to_string()))?;

    let raw: RawAnalysis = serde_json::from_str(&reply[start..=end])
        .map_err(|e| SignalError::Parse(format!("analysis JSON: {e}")))?;

    let sentiment: Sentiment = raw
        .sentiment
        .parse()
        .map_err(|e| SignalError::Parse(format!("{e}")))?;
    let insight_type: InsightType = raw
        .insight_type
        .parse()
        .map_err(|e| SignalError::Parse(format!("{e}")))?;

    Ok(PostAnalysis {
        tags: raw.tags,
        sentiment,
        quality_score: quality_to_int(raw.quality_score),
        insight_type,
        summary: raw.summary,
        confidence: raw.confidence,
    }
    .normalized())
}

#[allow(clippy::cast_possible_truncation)]
fn quality_to_int(raw: f64) -> i32 {
    if raw.is_finite() {
        raw.clamp(0.0, 100.0).round() as i32
    } else {
        0
    }
}
