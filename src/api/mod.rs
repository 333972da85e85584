//! JSON API endpoint modules, mounted under `/api/v1`.

pub mod air_quality;
pub mod health;
pub mod openapi;

pub use air_quality::configure_routes as configure_air_quality_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse};

use crate::error::ErrorResponse;

/// Malformed querystrings on API routes get a JSON 400.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse {
        error: "invalid_query".to_string(),
        message: err.to_string(),
    };
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}
