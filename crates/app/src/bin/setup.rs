//! Prepares the database for the contact relay: applies pending migrations
//! and reports how many submissions are already stored.

use tracing::info;

use contact_relay_app::telemetry;
use contact_relay_storage::Database;
use contact_relay_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(config.environment)?;

    info!(stage = "setup", "applying database migrations");
    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;

    let total = database.probe().await?;
    info!(
        stage = "setup",
        table = "contact_submissions",
        total,
        "database setup completed"
    );
    Ok(())
}
