use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Open a pool sized and timed from the `[database]` config section.
pub async fn connect_with_config(cfg: &configs::DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(cfg.url.clone());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs))
        .sqlx_logging(cfg.sqlx_logging);
    tracing::info!(max = cfg.max_connections, min = cfg.min_connections, "connecting to database");
    let db = Database::connect(opt).await?;
    Ok(db)
}
