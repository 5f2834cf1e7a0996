use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::GeocodeConfig;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("invalid geocoding endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("geocoding request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("geocoding service returned HTTP {0}")]
    Status(StatusCode),

    #[error("unexpected geocoding response: {0}")]
    Parse(String),
}

/// First match for an address; both fields are null when nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Coordinates {
    pub fn unknown() -> Self {
        Self { lat: None, lon: None }
    }
}

/// Client for a Nominatim-compatible search endpoint.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    http: reqwest::Client,
    endpoint: Url,
    retries: u32,
}

impl GeocodeClient {
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let endpoint = Url::parse(&config.endpoint)?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(GeocodeError::Transport)?;

        Ok(Self {
            http,
            endpoint,
            retries: config.retries,
        })
    }

    /// Look up `address`, retrying transport failures up to the configured count.
    pub async fn lookup(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json")
            .append_pair("limit", "1");

        let mut attempt = 0;
        loop {
            match self.fetch(url.clone()).await {
                Err(GeocodeError::Transport(e)) if attempt < self.retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "geocoding request failed, retrying");
                }
                result => return result,
            }
        }
    }

    async fn fetch(&self, url: Url) -> Result<Coordinates, GeocodeError> {
        let response = self.http.get(url).send().await.map_err(GeocodeError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status));
        }

        let body = response.text().await.map_err(GeocodeError::Transport)?;
        let places: Vec<Value> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let Some(first) = places.first() else {
            debug!("geocoding returned no results");
            return Ok(Coordinates::unknown());
        };

        Ok(Coordinates {
            lat: Some(coordinate(first, "lat")?),
            lon: Some(coordinate(first, "lon")?),
        })
    }
}

/// Nominatim sends coordinates as strings; plain numbers are accepted too.
fn coordinate(place: &Value, field: &str) -> Result<f64, GeocodeError> {
    let parsed = match place.get(field) {
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| GeocodeError::Parse(format!("missing or invalid '{}' in result", field)))
}
