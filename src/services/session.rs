//! Cookie sessions.
//!
//! A successful login issues an HS256 JWT stored in the `airlibre_session`
//! HttpOnly cookie. Logging out clears the cookie; there is no server-side
//! session table, so a token stays valid until it expires.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{SessionClaims, User};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "airlibre_session";
/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "airlibre";

/// Issues and verifies session cookies. Shared as `web::Data`.
#[derive(Clone)]
pub struct SessionManager {
    secret: SecretString,
    ttl_secs: u64,
    secure: bool,
}

impl SessionManager {
    pub fn new(secret: SecretString, ttl_secs: u64, secure: bool) -> Self {
        Self {
            secret,
            ttl_secs,
            secure,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session.secret.clone(),
            config.session.ttl_secs,
            config.environment.is_production(),
        )
    }

    /// Create a signed session token for `user`.
    pub fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + chrono::Duration::seconds(self.ttl_secs as i64);

        let claims = SessionClaims {
            sub: user.id.to_string(),
            iss: SESSION_ISSUER.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
            user_id: user.id,
            username: user.username.clone(),
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::default(), &claims, &key)
            .map_err(|e| AppError::InvalidInput(format!("Failed to create session token: {}", e)))
    }

    /// Verify a session token and return its claims.
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, String> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.validate_aud = false;

        let token_data = decode::<SessionClaims>(token, &key, &validation)
            .map_err(|e| format!("Invalid session token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Session cookie carrying a fresh token for `user`.
    pub fn login_cookie(&self, user: &User) -> AppResult<Cookie<'static>> {
        let mut cookie = self.base_cookie(self.create_token(user)?);
        cookie.set_max_age(CookieDuration::seconds(self.ttl_secs as i64));
        Ok(cookie)
    }

    /// Expired cookie that removes the session from the browser.
    pub fn logout_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.base_cookie(String::new());
        cookie.set_max_age(CookieDuration::ZERO);
        cookie
    }

    fn base_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.secure);
        cookie
    }
}

/// Keep `next` only when it is a local absolute path.
///
/// Rejects scheme-relative (`//host`) and backslash tricks so a login link
/// cannot redirect off-site.
pub fn sanitize_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
    {
        Some(next.to_string())
    } else {
        None
    }
}
