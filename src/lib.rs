//! AirLibre library.
//!
//! Community outdoor activity sharing with air quality context: accounts and
//! profiles, an activity catalog with reservations, and AQI lookups against
//! the aqicn.org feed.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
pub mod views;

use actix_web::web;

/// Register the JSON API under `/api/v1` and every HTML page.
///
/// Shared state (`DbPool`, `SessionManager`, `AqiClient`, `MediaStorage`)
/// must be provided by the caller as `web::Data`. Query and form extraction
/// failures render the HTML 400 page, or a JSON body under `/api/v1`.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(views::errors::query_error))
        .app_data(web::FormConfig::default().error_handler(views::errors::form_error))
        .service(
            web::scope("/api/v1")
                .app_data(web::QueryConfig::default().error_handler(api::query_error))
                .configure(api::configure_health_routes)
                .configure(api::configure_air_quality_routes),
        )
        .configure(views::configure_routes);
}
