use super::*;

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["stockfeed-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["stockfeed-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_command() {
    let cli =
        Cli::try_parse_from(["stockfeed-cli", "db", "seed"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn parses_signal_ticker() {
    let cli =
        Cli::try_parse_from(["stockfeed-cli", "signal", "$nvda"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Signal { ref ticker }) if ticker == "$nvda"
    ));
}

#[test]
fn signal_requires_ticker() {
    assert!(Cli::try_parse_from(["stockfeed-cli", "signal"]).is_err());
}

#[test]
fn parses_pulse_command() {
    let cli = Cli::try_parse_from(["stockfeed-cli", "pulse"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Pulse)));
}

#[test]
fn parses_sync_experts_tickers() {
    let cli = Cli::try_parse_from(["stockfeed-cli", "sync-experts", "NVDA", "$tsla"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::SyncExperts { ref tickers }) if tickers == &["NVDA", "$tsla"]
    ));
}

#[test]
fn sync_experts_tickers_are_optional() {
    let cli =
        Cli::try_parse_from(["stockfeed-cli", "sync-experts"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::SyncExperts { ref tickers }) if tickers.is_empty()
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["stockfeed-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}
