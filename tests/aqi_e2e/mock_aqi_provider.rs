//! Mock air quality provider for E2E tests.
//!
//! Starts an in-process HTTP server answering `/feed/{city}/` with canned
//! payloads chosen by city name, and records every request it receives.

use actix_web::{App, HttpResponse, HttpServer, get, web};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use airlibre_lib::config::AirQualitySettings;

/// Token the mock expects.
pub const TEST_TOKEN: &str = "test-token+/=";

/// One request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedHit {
    pub city: String,
    pub token: Option<String>,
}

#[derive(Default)]
pub struct MockAqiState {
    pub hits: Vec<RecordedHit>,
}

#[derive(Deserialize)]
struct FeedQuery {
    token: Option<String>,
}

#[get("/feed/{city}/")]
async fn feed(
    state: web::Data<Arc<Mutex<MockAqiState>>>,
    path: web::Path<String>,
    query: web::Query<FeedQuery>,
) -> HttpResponse {
    let city = path.into_inner();
    state.lock().unwrap().hits.push(RecordedHit {
        city: city.clone(),
        token: query.token.clone(),
    });

    match city.as_str() {
        "paris" => HttpResponse::Ok().json(json!({
            "status": "ok",
            "data": {
                "aqi": 42,
                "city": { "name": "Paris, France" },
                "time": { "s": "2026-10-16 09:00:00" }
            }
        })),
        "here" => HttpResponse::Ok().json(json!({
            "status": "ok",
            "data": { "aqi": "120", "city": { "name": "Nearest station" } }
        })),
        "atlantis" => HttpResponse::Ok().json(json!({
            "status": "error",
            "data": "Unknown station"
        })),
        "quiet" => HttpResponse::Ok().json(json!({ "status": "nope" })),
        "nodata" => HttpResponse::Ok().json(json!({ "status": "ok", "data": {} })),
        "dash" => HttpResponse::Ok().json(json!({ "status": "ok", "data": { "aqi": "-" } })),
        "gone" => HttpResponse::NotFound().finish(),
        "broken" => HttpResponse::InternalServerError().body("upstream exploded"),
        "garbage" => HttpResponse::Ok()
            .content_type("application/json")
            .body("<html>not json</html>"),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            HttpResponse::Ok().json(json!({ "status": "ok", "data": { "aqi": 10 } }))
        }
        _ => HttpResponse::Ok().json(json!({ "status": "ok", "data": { "aqi": 75 } })),
    }
}

/// Mock provider bound to an ephemeral port.
pub struct MockAqiProvider {
    pub base_url: String,
    pub state: Arc<Mutex<MockAqiState>>,
}

impl MockAqiProvider {
    /// Start the mock provider on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockAqiState::default()));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let state_data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state_data.clone()))
                .service(feed)
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Lives as long as the test runtime
        tokio::spawn(server);

        MockAqiProvider { base_url, state }
    }

    /// Client settings pointing at this mock.
    pub fn settings(&self) -> AirQualitySettings {
        AirQualitySettings {
            token: Some(SecretString::from(TEST_TOKEN.to_string())),
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(2),
        }
    }

    pub fn hits(&self) -> Vec<RecordedHit> {
        self.state.lock().unwrap().hits.clone()
    }
}
