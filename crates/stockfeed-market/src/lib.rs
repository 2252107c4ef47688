//! Market quote client for stockfeed.
//!
//! Fetches live quotes from the Yahoo Finance quote endpoint and exposes the
//! intraday volatility used by the signal aggregator and the market pulse.

pub mod client;
pub mod error;
pub mod types;

pub use client::QuoteClient;
pub use error::MarketError;
pub use types::MarketQuote;
