//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AirLibre",
        version = "0.1.0",
        description = "JSON endpoints of the AirLibre activity sharing site"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Air quality
        api::air_quality::get_air_quality,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Air quality
            services::AqiReading,
            services::AqiTier,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Air Quality", description = "Air quality index lookups")
    )
)]
pub struct ApiDoc;
