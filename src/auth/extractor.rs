//! Actix-web extractors for cookie session authentication.

use actix_web::dev::Payload;
use actix_web::http::{Method, StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use futures_util::future::LocalBoxFuture;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::User;
use crate::services::session::{SESSION_COOKIE, SessionManager};

/// Authentication failure for extractors.
#[derive(Debug)]
pub enum AuthError {
    /// No valid session; redirect to the login page.
    LoginRequired { next: Option<String> },
    /// The session could not be resolved.
    Internal(AppError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::LoginRequired { .. } => write!(f, "Login required"),
            AuthError::Internal(e) => write!(f, "{}", e),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            AuthError::Internal(e) => e.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AuthError::LoginRequired { next } => login_redirect(next.as_deref()),
            AuthError::Internal(e) => e.error_response(),
        }
    }
}

/// Redirect to the login page, remembering where to come back to.
pub fn login_redirect(next: Option<&str>) -> HttpResponse {
    let location = match next {
        Some(next) => format!("/accounts/login/?next={}", urlencoding::encode(next)),
        None => "/accounts/login/".to_string(),
    };
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Resolve the user behind the session cookie, if any.
///
/// Invalid or expired tokens and deleted accounts count as anonymous.
async fn resolve_user(req: &HttpRequest) -> Result<Option<User>, AppError> {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return Ok(None);
    };
    if cookie.value().is_empty() {
        return Ok(None);
    }

    let sessions = req
        .app_data::<web::Data<SessionManager>>()
        .ok_or_else(|| AppError::Internal("Session manager not configured".to_string()))?;
    let pool = req
        .app_data::<web::Data<DbPool>>()
        .ok_or_else(|| AppError::Database("Database pool not configured".to_string()))?;

    let claims = match sessions.verify_token(cookie.value()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Ignoring session cookie: {}", e);
            return Ok(None);
        }
    };

    pool.get_user_by_id(claims.user_id).await
}

/// Extractor that requires a logged-in user.
///
/// Anonymous requests are redirected to `/accounts/login/`; for `GET`
/// requests the current path is passed along as `next`.
pub struct SessionUser {
    pub user: User,
}

impl FromRequest for SessionUser {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match resolve_user(&req).await {
                Ok(Some(user)) => Ok(SessionUser { user }),
                Ok(None) => {
                    let next = (req.method() == Method::GET).then(|| req.uri().to_string());
                    Err(AuthError::LoginRequired { next })
                }
                Err(e) => Err(AuthError::Internal(e)),
            }
        })
    }
}

/// Extractor for pages that work both anonymously and logged in.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequest for MaybeUser {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            resolve_user(&req)
                .await
                .map(MaybeUser)
                .map_err(AuthError::Internal)
        })
    }
}
