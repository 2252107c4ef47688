//! `db` sub-command handlers.

use stockfeed_core::AppConfig;

pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = stockfeed_db::PoolConfig::from_app_config(config);
    Ok(stockfeed_db::connect_pool(&config.database_url, pool_config).await?)
}

pub(crate) async fn run_ping(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    stockfeed_db::health_check(&pool).await?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let applied = stockfeed_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

pub(crate) async fn run_seed(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    stockfeed_db::run_migrations(&pool).await?;
    let inserted = stockfeed_db::seed_demo_data(&pool).await?;
    println!("seeded {inserted} post(s)");
    Ok(())
}
