mod api;
mod middleware;

use std::{sync::Arc, time::Duration};

use stockfeed_market::QuoteClient;
use stockfeed_signals::{
    ExpertDesk, MarketPulse, OllamaClient, PgExpertStore, PgPostStore, PostAnalyzer, PostStore,
    QuoteProvider, SignalAggregator, TextGenerator,
};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = stockfeed_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = stockfeed_db::PoolConfig::from_app_config(&config);
    let pool = stockfeed_db::connect_pool(&config.database_url, pool_config).await?;
    stockfeed_db::run_migrations(&pool).await?;

    let posts: Arc<dyn PostStore> = Arc::new(PgPostStore::new(pool.clone()));
    let quotes: Arc<dyn QuoteProvider> = Arc::new(QuoteClient::with_base_url(
        &config.quote_base_url,
        config.quote_timeout_secs,
    )?);
    let generator: Arc<dyn TextGenerator> =
        Arc::new(OllamaClient::new(&config.ollama_url, &config.ollama_model)?);

    let experts = ExpertDesk::new(
        Arc::new(PgExpertStore::new(pool.clone())),
        Arc::clone(&quotes),
        Arc::clone(&generator),
    )
    .with_generation_timeout(Duration::from_secs(config.expert_timeout_secs));

    let state = AppState {
        pool,
        signals: SignalAggregator::new(posts, Arc::clone(&quotes), Arc::clone(&generator))
            .with_narration_timeout(Duration::from_secs(config.narration_timeout_secs)),
        analyzer: PostAnalyzer::new(Arc::clone(&generator))
            .with_timeout(Duration::from_secs(config.analysis_timeout_secs)),
        pulse: MarketPulse::new(quotes, generator)
            .with_summary_timeout(Duration::from_secs(config.pulse_timeout_secs)),
        experts,
    };

    let auth = AuthState::from_env(matches!(
        config.env,
        stockfeed_core::Environment::Development
    ))?;
    let app = build_app(state, auth, default_rate_limit_state());

    tracing::info!(addr = %config.bind_addr, env = %config.env, "stockfeed server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
