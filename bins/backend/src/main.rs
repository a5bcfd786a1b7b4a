use std::time::Duration;

use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tracing::{info, warn};

use common::utils::logging::init_logging;
use models::db::connect_with_config;
use service::Services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = AppConfig::load_and_validate()?;
    init_logging(cfg.logging.json);

    let db = connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!("migrations applied");

    let services = Services::new(db, &cfg);
    services.cache.start_cleanup_interval(Duration::from_secs(cfg.cache.cleanup_interval_secs));

    match services.dashboard.summary().await {
        Ok(summary) => info!(summary = %serde_json::to_string(&summary)?, "dashboard ready"),
        Err(e) => warn!(error = %e, code = e.code(), "dashboard summary failed"),
    }

    info!("backend running; press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    services.cache.stop_cleanup_interval();
    info!("shutdown complete");
    Ok(())
}
