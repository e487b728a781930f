use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use matchmaker_api::app;
use matchmaker_api::config::{Config, StorageBackend};
use matchmaker_api::jobs::{JobScheduler, PoolMetricsJob, PruneExposuresJob};
use matchmaker_api::middleware;
use persistence::repositories::ExposureRepository;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!("Starting balloon matching service v{}", env!("CARGO_PKG_VERSION"));

    let mut scheduler = JobScheduler::new();
    let pool = match config.storage.backend {
        StorageBackend::Postgres => {
            let db_config: persistence::db::DatabaseConfig = (&config.database).into();
            let pool = persistence::db::create_pool(&db_config).await?;

            info!("Running database migrations...");
            sqlx::migrate!("../persistence/src/migrations")
                .run(&pool)
                .await?;
            info!("Migrations completed");

            scheduler.register(PoolMetricsJob::new(pool.clone()));
            scheduler.register(PruneExposuresJob::new(
                ExposureRepository::new(pool.clone()),
                config.matching.echo_chamber.history_days,
            ));
            Some(pool)
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store; state is lost on restart");
            None
        }
    };
    scheduler.start();

    let app = app::create_app(config.clone(), pool);

    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
