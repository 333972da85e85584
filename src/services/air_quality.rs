//! Air-quality lookup against the WAQI (aqicn.org) feed API.
//!
//! One lookup issues exactly one `GET {base}/feed/{city|here}/?token=...`
//! and classifies the outcome into [`AqiReading`] or an [`AqiError`].
//! Nothing is cached or retried.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use utoipa::ToSchema;

use crate::config::AirQualitySettings;

/// HTTP connect timeout for provider calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Path segment asking the provider to geolocate the caller.
const HERE: &str = "here";

/// Qualitative band derived from an AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AqiTier {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiTier {
    /// Upper bounds are inclusive.
    pub fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::UnhealthyForSensitiveGroups,
            151..=200 => Self::Unhealthy,
            201..=300 => Self::VeryUnhealthy,
            _ => Self::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for sensitive groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    /// CSS modifier used by the detail page badge.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Good => "aqi-good",
            Self::Moderate => "aqi-moderate",
            Self::UnhealthyForSensitiveGroups => "aqi-sensitive",
            Self::Unhealthy => "aqi-unhealthy",
            Self::VeryUnhealthy => "aqi-very-unhealthy",
            Self::Hazardous => "aqi-hazardous",
        }
    }
}

/// Successful lookup.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AqiReading {
    pub aqi: u32,
    pub tier: AqiTier,
    /// Human-readable tier label.
    pub label: String,
    /// Station name reported by the provider, when present.
    pub station: Option<String>,
    /// Measurement time as reported by the provider.
    pub observed_at: Option<String>,
    /// Full provider payload.
    #[schema(value_type = Object)]
    pub payload: Value,
}

/// Classified lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AqiError {
    /// No API token configured
    #[error("Air-quality provider is not configured: {0}")]
    Configuration(String),

    /// Provider answered with a non-"ok" status
    #[error("Provider rejected the request: {0}")]
    ProviderRejected(String),

    /// Provider accepted the request but has no AQI value
    #[error("No AQI value in provider response")]
    DataUnavailable,

    /// HTTP 404 from the provider
    #[error("Location not found")]
    NotFound,

    /// Any other non-success HTTP status
    #[error("Provider returned HTTP {0}")]
    Transport(u16),

    /// DNS, connection or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Body is not valid JSON
    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AqiError {
    /// Non-technical message safe to show to end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            AqiError::Configuration(_) => "Air quality information is not available on this site.",
            AqiError::ProviderRejected(_) | AqiError::NotFound => {
                "No air quality station was found for this city."
            }
            AqiError::DataUnavailable => "No air quality reading is available for this location.",
            AqiError::Transport(_) | AqiError::Network(_) | AqiError::Decode(_) => {
                "The air quality service is unreachable right now. Please try again later."
            }
            AqiError::Unexpected(_) => "Air quality information could not be loaded.",
        }
    }

    /// Stable error code for JSON responses.
    pub fn code(&self) -> &'static str {
        match self {
            AqiError::Configuration(_) => "AQI_NOT_CONFIGURED",
            AqiError::ProviderRejected(_) => "AQI_PROVIDER_REJECTED",
            AqiError::DataUnavailable => "AQI_DATA_UNAVAILABLE",
            AqiError::NotFound => "AQI_NOT_FOUND",
            AqiError::Transport(_) => "AQI_TRANSPORT_ERROR",
            AqiError::Network(_) => "AQI_NETWORK_ERROR",
            AqiError::Decode(_) => "AQI_DECODE_ERROR",
            AqiError::Unexpected(_) => "AQI_UNEXPECTED_ERROR",
        }
    }
}

/// Classify a decoded provider payload.
pub fn classify_payload(payload: Value) -> Result<AqiReading, AqiError> {
    if payload.get("status").and_then(Value::as_str) != Some("ok") {
        let message = payload
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        return Err(AqiError::ProviderRejected(message.to_string()));
    }

    let data = payload.get("data");
    let aqi = data
        .and_then(|d| d.get("aqi"))
        .and_then(aqi_value)
        .ok_or(AqiError::DataUnavailable)?;

    let station = data
        .and_then(|d| d.pointer("/city/name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let observed_at = data
        .and_then(|d| d.pointer("/time/s"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let tier = AqiTier::from_aqi(aqi);
    Ok(AqiReading {
        aqi,
        tier,
        label: tier.label().to_string(),
        station,
        observed_at,
        payload,
    })
}

/// Non-negative integer AQI. The provider uses `"-"` when a station has no
/// current reading, and occasionally sends numbers as strings.
fn aqi_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Client for the provider feed endpoint.
#[derive(Clone)]
pub struct AqiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

impl AqiClient {
    pub fn new(settings: &AirQualitySettings) -> Result<Self, AqiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AqiError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Look up the AQI for `city`, or for the caller's location when absent.
    pub async fn lookup(&self, city: Option<&str>) -> Result<AqiReading, AqiError> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| AqiError::Configuration("AQICN_TOKEN is not set".to_string()))?;

        let city = city.map(str::trim).filter(|c| !c.is_empty());
        let segment = city.unwrap_or(HERE);
        debug!(city = segment, "Looking up air quality");

        let url = format!(
            "{}/feed/{}/?token={}",
            self.base_url,
            urlencoding::encode(segment),
            urlencoding::encode(token.expose_secret())
        );

        let response = self.http.get(&url).send().await.map_err(classify_transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AqiError::NotFound);
        }
        if !status.is_success() {
            return Err(AqiError::Transport(status.as_u16()));
        }

        let body = response.bytes().await.map_err(classify_transport)?;
        let payload: Value =
            serde_json::from_slice(&body).map_err(|e| AqiError::Decode(e.to_string()))?;

        classify_payload(payload)
    }
}

/// Map a reqwest failure. The URL carries the token, so it is stripped from
/// the message.
fn classify_transport(err: reqwest::Error) -> AqiError {
    let network = err.is_timeout() || err.is_connect() || err.is_request();
    let message = err.without_url().to_string();
    if network {
        AqiError::Network(message)
    } else {
        AqiError::Unexpected(message)
    }
}
