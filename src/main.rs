//! Order intake server - main entry point.
//!
//! Starts the Actix-web server with the submission form and health routes.

use std::sync::Arc;
use std::time::Duration;

use actix_files::Files;
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use order_intake_lib::api;
use order_intake_lib::config::Config;
use order_intake_lib::db::DbPool;
use order_intake_lib::services::{self, IngestionPipeline, TimeSeededNames};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - UPLOAD_DIR must point to an existing directory");
            error!("  - In production, DATABASE_URL or DB_USER/DB_PASS/DB_HOST/DB_DB must be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Order Intake Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Initialize database
    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!("{}", e);
        std::process::exit(1);
    }

    // Start the orphan directory sweeper
    services::start_cleanup_task(services::CleanupConfig {
        upload_dir: config.upload_dir.clone(),
        grace_period: Duration::from_secs(config.sweep.grace_secs),
        interval: Duration::from_secs(config.sweep.interval_secs),
    });

    // Prepare shared state
    let bind_address = config.bind_address();
    let max_upload_size = config.max_upload_size;
    let static_dir = config.static_dir.clone();
    let session_key = Key::derive_from(config.session_key.as_bytes());
    let pipeline = web::Data::new(IngestionPipeline::new(
        config.upload_dir.clone(),
        Arc::new(TimeSeededNames::new()),
        pool.clone(),
    ));

    info!("Upload root: {}", config.upload_dir.display());
    info!("Upload limit: {}MB per submission", max_upload_size / 1024 / 1024);

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if config.is_development() {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        let mut app = App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(pipeline.clone())
            .app_data(web::Data::new(max_upload_size))
            .app_data(web::Data::new(session_key.clone()))
            .configure(api::configure_health_routes)
            .configure(api::configure_upload_routes);

        if let Some(ref dir) = static_dir {
            app = app.service(Files::new("/static", dir.clone()).prefer_utf8(true));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
