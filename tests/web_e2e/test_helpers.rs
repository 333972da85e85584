//! Shared test helpers for website E2E tests.

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::{App, test, web};
use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

use airlibre_lib::config::AirQualitySettings;
use airlibre_lib::db::DbPool;
use airlibre_lib::middleware::RequestLogger;
use airlibre_lib::models::{NewActivity, NewUser, User};
use airlibre_lib::services::passwords::hash_password;
use airlibre_lib::services::session::SESSION_COOKIE;
use airlibre_lib::services::{AqiClient, MediaStorage, SessionManager};
use airlibre_lib::{configure_app, views};

/// Password given to every user created by [`TestEnv::create_user`].
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Database, sessions and media directory backing one test app.
pub struct TestEnv {
    pub pool: DbPool,
    pub sessions: SessionManager,
    pub media: MediaStorage,
    _media_dir: TempDir,
}

impl TestEnv {
    /// Fresh in-memory database with migrations applied.
    pub async fn new() -> Self {
        let pool = DbPool::connect("sqlite::memory:", 1, 1)
            .await
            .expect("Failed to open in-memory database");
        pool.run_migrations()
            .await
            .expect("Failed to run migrations");

        let media_dir = TempDir::new().expect("Failed to create media dir");
        let media = MediaStorage::new(media_dir.path());
        media.ensure_dirs().await.expect("Failed to create media dirs");

        let sessions = SessionManager::new(
            SecretString::from("web-e2e-secret-with-enough-length".to_string()),
            3600,
            false,
        );

        TestEnv {
            pool,
            sessions,
            media,
            _media_dir: media_dir,
        }
    }

    /// Insert a user directly and return it.
    pub async fn create_user(&self, username: &str) -> User {
        let new_user = NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username.to_lowercase()),
            first_name: String::new(),
            last_name: String::new(),
            password: TEST_PASSWORD.to_string(),
        };
        let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
        self.pool
            .create_user(&new_user, &hash)
            .await
            .expect("Failed to create user")
    }

    /// Session cookie for `user`, as set by a successful login.
    pub fn session_cookie(&self, user: &User) -> Cookie<'static> {
        self.sessions
            .login_cookie(user)
            .expect("Failed to create session cookie")
    }

    /// Insert an activity directly, bypassing form validation.
    pub async fn create_activity(
        &self,
        proposer: &User,
        title: &str,
        city: &str,
        start_time: DateTime<Utc>,
    ) -> i32 {
        let activity = NewActivity {
            title: title.to_string(),
            description: format!("{} with friends, bring water.", title),
            location_city: city.to_string(),
            start_time,
            end_time: start_time + Duration::hours(2),
            category_id: None,
        };
        self.pool
            .insert_activity(proposer.id, &activity)
            .await
            .expect("Failed to insert activity")
            .id
    }
}

/// Client settings with no token: lookups fail without network access.
pub fn unconfigured_aqi() -> AirQualitySettings {
    AirQualitySettings {
        token: None,
        base_url: "http://127.0.0.1:9".to_string(),
        timeout: StdDuration::from_secs(1),
    }
}

/// Build the full application.
pub async fn create_test_app(
    env: &TestEnv,
    aqi: AirQualitySettings,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let aqi = AqiClient::new(&aqi).expect("Failed to build AQI client");

    test::init_service(
        App::new()
            .wrap(RequestLogger)
            .app_data(web::Data::new(env.pool.clone()))
            .app_data(web::Data::new(env.sessions.clone()))
            .app_data(web::Data::new(env.media.clone()))
            .app_data(web::Data::new(aqi))
            .configure(configure_app)
            .default_service(web::route().to(views::errors::not_found)),
    )
    .await
}

/// `Location` header of a redirect response.
pub fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Session cookie set by a response, if any.
pub fn session_cookie_of(resp: &ServiceResponse) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
}

/// Read a response body as text.
pub async fn body_text(resp: ServiceResponse) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// `datetime-local` value for a time relative to now.
pub fn form_datetime(offset: Duration) -> String {
    (Utc::now() + offset).format("%Y-%m-%dT%H:%M").to_string()
}
