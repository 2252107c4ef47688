//! Post analysis output: the insight, tags and sentiment derived from a
//! post's text.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Sentiment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InsightType {
    Fundamental,
    Technical,
    Macro,
    Earnings,
    Risk,
    General,
}

impl InsightType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InsightType::Fundamental => "FUNDAMENTAL",
            InsightType::Technical => "TECHNICAL",
            InsightType::Macro => "MACRO",
            InsightType::Earnings => "EARNINGS",
            InsightType::Risk => "RISK",
            InsightType::General => "GENERAL",
        }
    }
}

impl FromStr for InsightType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FUNDAMENTAL" => Ok(InsightType::Fundamental),
            "TECHNICAL" => Ok(InsightType::Technical),
            "MACRO" => Ok(InsightType::Macro),
            "EARNINGS" => Ok(InsightType::Earnings),
            "RISK" => Ok(InsightType::Risk),
            "GENERAL" => Ok(InsightType::General),
            _ => Err(CoreError::InvalidInsightType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagCategory {
    Sector,
    Catalyst,
    Risk,
    Trend,
}

impl TagCategory {
    /// Bucket a free-form tag name. Anything unrecognised is a trend tag.
    #[must_use]
    pub fn classify(tag: &str) -> Self {
        match tag {
            "Tech" | "Finance" | "Energy" => TagCategory::Sector,
            "Earnings" | "Merger" | "IPO" => TagCategory::Catalyst,
            "High Risk" | "Safe Haven" => TagCategory::Risk,
            _ => TagCategory::Trend,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TagCategory::Sector => "SECTOR",
            TagCategory::Catalyst => "CATALYST",
            TagCategory::Risk => "RISK",
            TagCategory::Trend => "TREND",
        }
    }
}

/// Structured analysis of one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAnalysis {
    pub tags: Vec<String>,
    pub sentiment: Sentiment,
    /// Depth/reasoning score in `0..=100`.
    pub quality_score: i32,
    pub insight_type: InsightType,
    pub summary: String,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f64,
}

impl PostAnalysis {
    /// The analysis recorded when the analyzer could not produce one.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            tags: Vec::new(),
            sentiment: Sentiment::Neutral,
            quality_score: 0,
            insight_type: InsightType::General,
            summary: "Analysis failed".to_string(),
            confidence: 0.0,
        }
    }

    /// Clamp scores into range and drop blank or duplicate tags.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.quality_score = self.quality_score.clamp(0, 100);
        self.confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut seen = std::collections::HashSet::new();
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        self.summary = self.summary.trim().to_string();
        self
    }
}
