use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use fueleu_core::{ComplianceService, MemoryStore, Store};
use fueleu_engine::{
    config::{Config, StorageBackend},
    database::PgStore,
    handlers, EngineError,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .json()
        .init();

    info!("Starting FuelEU Engine...");

    // Load configuration
    let config = Config::from_env()?;
    config.validate().map_err(EngineError::Config)?;
    let params = config.compliance.params().map_err(EngineError::Config)?;

    info!(
        "Configuration loaded successfully (backend: {:?}, target intensity: {})",
        config.storage.backend, params.target_intensity
    );

    // Initialize storage
    let store: Arc<dyn Store> = match config.storage.backend {
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database).await.map_err(|e| {
                error!("Failed to connect to database: {}", e);
                e
            })?;
            store.health_check().await?;
            info!("Database health check passed");

            if config.database.run_migrations {
                store.migrate().await?;
                info!("Database migrations applied");
            }
            Arc::new(store)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, state will not survive a restart");
            Arc::new(MemoryStore::seeded())
        }
    };

    // Initialize service
    let service = Arc::new(ComplianceService::new(store, params));
    let service_data = web::Data::new(service);

    info!("Compliance service initialized successfully");

    // Start HTTP server
    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service_data.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    Ok(())
}
