use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Closed set of library document types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Video,
    Document,
    Audio,
    Image,
    Program,
    Data,
}

impl DocumentType {
    pub const ALL: [DocumentType; 6] = [
        DocumentType::Video,
        DocumentType::Document,
        DocumentType::Audio,
        DocumentType::Image,
        DocumentType::Program,
        DocumentType::Data,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Video => "video",
            DocumentType::Document => "document",
            DocumentType::Audio => "audio",
            DocumentType::Image => "image",
            DocumentType::Program => "program",
            DocumentType::Data => "data",
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown document_type '{}'", s.trim()))
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored library document as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub tenant_id: String,
    pub document_type: DocumentType,
    pub blob_ref: Option<String>,
    pub url: Option<String>,
    pub type_metadata: Value,
    pub owner_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_m: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a document record
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub tenant_id: String,
    pub document_type: DocumentType,
    pub blob_ref: Option<String>,
    pub url: Option<String>,
    /// Any JSON value; the upload handler substitutes `{}` for missing or malformed input.
    pub type_metadata: Value,
    pub owner_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_m: Option<f64>,
}

/// Tenant-scoped search filters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub tenant_id: String,
    pub document_type: Option<DocumentType>,
    pub q: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub distance_mi: Option<f64>,
    pub limit: i64,
}

impl SearchParams {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            document_type: None,
            q: None,
            lat: None,
            lon: None,
            distance_mi: None,
            limit: 100,
        }
    }

    /// Center and radius, when all three are present.
    pub fn radius(&self) -> Option<(f64, f64, f64)> {
        match (self.lat, self.lon, self.distance_mi) {
            (Some(lat), Some(lon), Some(d)) => Some((lat, lon, d)),
            _ => None,
        }
    }
}

const EARTH_RADIUS_MI: f64 = 3958.8;

/// Great-circle distance in miles.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MI * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_parses_case_insensitively() {
        assert_eq!("Video".parse::<DocumentType>(), Ok(DocumentType::Video));
        assert_eq!("  DATA ".parse::<DocumentType>(), Ok(DocumentType::Data));
        assert!("invalid".parse::<DocumentType>().is_err());
        assert!("".parse::<DocumentType>().is_err());
    }

    #[test]
    fn document_type_serializes_lowercase() {
        let v = serde_json::to_value(DocumentType::Program).unwrap();
        assert_eq!(v, "program");
    }

    #[test]
    fn haversine_known_distance() {
        // New York -> Los Angeles, roughly 2445 miles
        let d = haversine_miles(40.7128, -74.0060, 34.0522, -118.2437);
        assert!((d - 2445.0).abs() < 15.0, "got {}", d);
        assert!(haversine_miles(10.0, 10.0, 10.0, 10.0).abs() < 1e-9);
    }

    #[test]
    fn radius_requires_all_parts() {
        let mut params = SearchParams::for_tenant("acme");
        params.lat = Some(1.0);
        params.lon = Some(2.0);
        assert_eq!(params.radius(), None);
        params.distance_mi = Some(5.0);
        assert_eq!(params.radius(), Some((1.0, 2.0, 5.0)));
    }
}
