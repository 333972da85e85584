//! JSON air-quality endpoint.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::ErrorResponse;
use crate::services::{AqiClient, AqiError};

/// Query parameters for the air-quality endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AirQualityQuery {
    /// City name. Omit to let the provider geolocate the caller.
    pub city: Option<String>,
}

/// HTTP status for each lookup failure.
pub fn status_for(err: &AqiError) -> StatusCode {
    match err {
        AqiError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        AqiError::NotFound | AqiError::DataUnavailable => StatusCode::NOT_FOUND,
        AqiError::ProviderRejected(_)
        | AqiError::Transport(_)
        | AqiError::Network(_)
        | AqiError::Decode(_) => StatusCode::BAD_GATEWAY,
        AqiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Current air quality for a city.
///
/// GET /api/v1/air-quality?city=Paris
#[utoipa::path(
    get,
    path = "/api/v1/air-quality",
    tag = "Air Quality",
    params(AirQualityQuery),
    responses(
        (status = 200, description = "Current AQI reading", body = crate::services::AqiReading),
        (status = 404, description = "No reading for this location", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse),
        (status = 503, description = "Provider not configured", body = ErrorResponse)
    )
)]
#[get("/air-quality")]
pub async fn get_air_quality(
    client: web::Data<AqiClient>,
    query: web::Query<AirQualityQuery>,
) -> HttpResponse {
    let city = query.city.as_deref();
    match client.lookup(city).await {
        Ok(reading) => HttpResponse::Ok().json(reading),
        Err(e) => {
            tracing::warn!(city = ?city, error = %e, "Air quality lookup failed");
            HttpResponse::build(status_for(&e)).json(ErrorResponse {
                error: e.code().to_string(),
                message: e.user_message().to_string(),
            })
        }
    }
}

/// Configure air-quality routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_air_quality);
}
