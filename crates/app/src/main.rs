use std::net::SocketAddr;

use chrono_tz::Tz;
use tracing::{info, warn};

use contact_relay_app::{router, telemetry};
use contact_relay_mailer::Notifier;
use contact_relay_storage::Database;
use contact_relay_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(config.environment)?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;
    match database.probe().await {
        Ok(total) => info!(stage = "storage", total, "database connection verified"),
        Err(err) => warn!(stage = "storage", error = %err, "database probe failed"),
    }

    let timezone: Tz = config.notify_timezone.parse().map_err(|_| {
        format!(
            "NOTIFY_TIMEZONE must be an IANA timezone name (got {})",
            config.notify_timezone
        )
    })?;
    let notifier = Notifier::from_config(config.mail.as_ref(), timezone)?;

    let state = router::AppState::new(metrics, database, notifier, config.environment);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
