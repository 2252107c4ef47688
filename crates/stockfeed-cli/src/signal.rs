//! `signal`, `pulse` and `sync-experts` handlers: one-shot runs of the
//! signal engine.

use std::{sync::Arc, time::Duration};

use stockfeed_core::AppConfig;
use stockfeed_market::QuoteClient;
use stockfeed_signals::{
    ExpertDesk, MarketPulse, OllamaClient, PgExpertStore, PgPostStore, QuoteProvider,
    SignalAggregator, TextGenerator,
};

fn quote_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn QuoteProvider>> {
    Ok(Arc::new(QuoteClient::with_base_url(
        &config.quote_base_url,
        config.quote_timeout_secs,
    )?))
}

fn text_generator(config: &AppConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    Ok(Arc::new(OllamaClient::new(
        &config.ollama_url,
        &config.ollama_model,
    )?))
}

pub(crate) async fn run_signal(config: &AppConfig, raw_ticker: &str) -> anyhow::Result<()> {
    let ticker = stockfeed_core::normalize_ticker(raw_ticker)
        .ok_or_else(|| anyhow::anyhow!("ticker must not be blank"))?;

    let pool = crate::db::connect(config).await?;
    let aggregator = SignalAggregator::new(
        Arc::new(PgPostStore::new(pool)),
        quote_provider(config)?,
        text_generator(config)?,
    )
    .with_narration_timeout(Duration::from_secs(config.narration_timeout_secs));

    let result = aggregator.get_signal(&ticker).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub(crate) async fn run_pulse(config: &AppConfig) -> anyhow::Result<()> {
    let pulse = MarketPulse::new(quote_provider(config)?, text_generator(config)?)
        .with_summary_timeout(Duration::from_secs(config.pulse_timeout_secs));

    let report = pulse.report().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) async fn run_sync_experts(config: &AppConfig, tickers: &[String]) -> anyhow::Result<()> {
    let pool = crate::db::connect(config).await?;
    let desk = ExpertDesk::new(
        Arc::new(PgExpertStore::new(pool)),
        quote_provider(config)?,
        text_generator(config)?,
    )
    .with_generation_timeout(Duration::from_secs(config.expert_timeout_secs));

    let report = desk.sync(tickers).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
