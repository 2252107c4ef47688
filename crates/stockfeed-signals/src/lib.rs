//! Signal engine for stockfeed.
//!
//! Reduces the last day of community posts for a ticker into a
//! reputation-weighted score, a discrete trading signal and an expert
//! consensus, then asks a local LLM for a short strategy blurb. The same
//! generator backs post analysis, the market pulse summary and the expert
//! desk that publishes Oracle posts from live quotes.
//!
//! All outside dependencies sit behind the traits in [`collaborators`] and
//! are injected at construction.

pub mod aggregator;
pub mod analysis;
pub mod collaborators;
pub mod error;
pub mod experts;
pub mod narrator;
pub mod ollama;
pub mod pulse;
pub mod tally;
pub mod types;

#[cfg(test)]
mod testing;

pub use aggregator::SignalAggregator;
pub use analysis::PostAnalyzer;
pub use collaborators::{
    AuthorProfile, ExpertStore, PgExpertStore, PgPostStore, PostStore, QuoteProvider,
    TextGenerator,
};
pub use error::SignalError;
pub use experts::{ExpertDesk, ExpertPost, SyncReport};
pub use narrator::Narrative;
pub use ollama::OllamaClient;
pub use pulse::{MarketPulse, Mood, PulseIndices, PulseReport};
pub use tally::{ExpertConsensus, SignalStrength};
pub use types::{Breakdown, SignalResult};
