//! AirLibre - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use airlibre_lib::api::ApiDoc;
use airlibre_lib::config::Config;
use airlibre_lib::db::DbPool;
use airlibre_lib::services::{AqiClient, MediaStorage, SessionManager};
use airlibre_lib::{configure_app, middleware, views};

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::other(format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and AIRLIBRE_SESSION_SECRET must be set");
            error!("  - AQICN_TOKEN enables air quality lookups");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  AirLibre");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and AIRLIBRE_SESSION_SECRET");
    }

    let pool = DbPool::new(&config)
        .await
        .map_err(|e| startup_error("Failed to initialize database", e))?;
    info!("Database connection established");
    pool.run_migrations()
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;

    let media = MediaStorage::new(config.media_dir.clone());
    media
        .ensure_dirs()
        .await
        .map_err(|e| startup_error("Failed to create media directory", e))?;

    let aqi = AqiClient::new(&config.air_quality)
        .map_err(|e| startup_error("Failed to build air quality client", e))?;
    if aqi.is_configured() {
        info!("Air quality lookups enabled ({})", config.air_quality.base_url);
    } else {
        warn!("AQICN_TOKEN is not set: activity pages will show no air quality data");
    }

    let sessions = SessionManager::from_config(&config);

    // Prepare shared state
    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let static_dir = config.static_dir.clone();
    let media_dir = config.media_dir.clone();
    let pool = web::Data::new(pool);
    let aqi = web::Data::new(aqi);
    let sessions = web::Data::new(sessions);
    let media = web::Data::new(media);

    let worker_count = if is_development {
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

    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(pool.clone())
            .app_data(aqi.clone())
            .app_data(sessions.clone())
            .app_data(media.clone())
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api/openapi.json", ApiDoc::openapi()),
            )
            .service(Files::new("/static", static_dir.clone()).prefer_utf8(true))
            .service(Files::new("/media", media_dir.clone()))
            .configure(configure_app)
            .default_service(web::route().to(views::errors::not_found))
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
