//! Custom error pages.

use actix_web::error::{InternalError, QueryPayloadError, UrlencodedError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use askama::Template;

use super::Nav;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    nav: Nav,
    status: u16,
    title: &'a str,
    message: &'a str,
}

fn title_for(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad request",
        StatusCode::UNAUTHORIZED => "Login required",
        StatusCode::FORBIDDEN => "Access denied",
        StatusCode::NOT_FOUND => "Page not found",
        _ if status.is_server_error() => "Server error",
        _ => "Error",
    }
}

/// Render the error page for `status`.
///
/// Falls back to plain text if the template itself fails.
pub fn render_error_page(status: StatusCode, message: &str) -> HttpResponse {
    let template = ErrorTemplate {
        nav: Nav::anonymous(),
        status: status.as_u16(),
        title: title_for(status),
        message,
    };
    match template.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            tracing::error!("Failed to render error page: {}", e);
            HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(format!("{} {}", status.as_u16(), title_for(status)))
        }
    }
}

/// Malformed querystrings on HTML routes get the 400 page.
pub fn query_error(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected querystring");
    InternalError::from_response(
        err,
        render_error_page(StatusCode::BAD_REQUEST, "The request address is malformed."),
    )
    .into()
}

/// Undecodable form posts get the 400 page.
pub fn form_error(err: UrlencodedError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected form body");
    InternalError::from_response(
        err,
        render_error_page(
            StatusCode::BAD_REQUEST,
            "The submitted form could not be read. Please try again.",
        ),
    )
    .into()
}

/// Default service: unknown routes get the 404 page.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    tracing::debug!(path = %req.path(), "No route matched");
    render_error_page(
        StatusCode::NOT_FOUND,
        "The page you are looking for does not exist.",
    )
}
