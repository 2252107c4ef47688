mod db;
mod signal;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "stockfeed-cli")]
#[command(about = "stockfeed command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Compute the trading signal for a ticker and print it as JSON
    Signal {
        /// Ticker symbol, e.g. NVDA or $nvda
        ticker: String,
    },
    /// Print the current market pulse as JSON
    Pulse,
    /// Publish AI Oracle posts for up to five tickers and print the report
    SyncExperts {
        /// Tickers to cover; defaults to the built-in watchlist
        tickers: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Insert demo authors and analyzed posts
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = stockfeed_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_ping(&config).await,
            DbCommands::Migrate => db::run_migrate(&config).await,
            DbCommands::Seed => db::run_seed(&config).await,
        },
        Commands::Signal { ticker } => signal::run_signal(&config, &ticker).await,
        Commands::Pulse => signal::run_pulse(&config).await,
        Commands::SyncExperts { tickers } => signal::run_sync_experts(&config, &tickers).await,
    }
}

#[cfg(test)]
mod tests;
