//! Hazard report types.

use super::{
    deserialize_id, deserialize_lenient_f64, deserialize_lenient_i64, deserialize_lenient_string,
    Category,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable report identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(#[serde(deserialize_with = "deserialize_id")] pub i64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ReportId {
    fn from(id: i64) -> Self {
        ReportId(id)
    }
}

/// Canonical report status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReportStatus {
    /// Stable numeric code used by the backend.
    pub fn code(&self) -> i64 {
        match self {
            ReportStatus::Pending => 0,
            ReportStatus::Approved => 1,
            ReportStatus::Rejected => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Approved => "Approved",
            ReportStatus::Rejected => "Rejected",
        }
    }

    /// Approved and Rejected have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admin decision on a pending report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// Status the report ends in once the decision is accepted.
    pub fn target_status(&self) -> ReportStatus {
        match self {
            Decision::Approved => ReportStatus::Approved,
            Decision::Rejected => ReportStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.target_status().as_str()
    }
}

/// A valid map coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point only when both halves are present, finite and in range.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        let (latitude, longitude) = (latitude?, longitude?);
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }
}

/// Report exactly as the backend sent it. Category and status keep their
/// original encoding until normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    pub id: ReportId,
    #[serde(default, alias = "latitude", deserialize_with = "deserialize_lenient_f64")]
    pub loc_latitude: Option<f64>,
    #[serde(default, alias = "longitude", deserialize_with = "deserialize_lenient_f64")]
    pub loc_longitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Value,
    #[serde(default)]
    pub status: Value,
    #[serde(default, alias = "blobName", deserialize_with = "deserialize_lenient_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub created_at: Option<String>,
}

/// A normalized report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    /// `None` when the payload had no usable coordinates.
    pub location: Option<GeoPoint>,
    pub description: String,
    pub category: Category,
    pub status: ReportStatus,
    /// Evidence URL or backend-relative path.
    pub evidence: Option<String>,
    pub author_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Latitude, 0 when unknown.
    pub fn latitude(&self) -> f64 {
        self.location.map(|p| p.latitude).unwrap_or(0.0)
    }

    /// Longitude, 0 when unknown.
    pub fn longitude(&self) -> f64 {
        self.location.map(|p| p.longitude).unwrap_or(0.0)
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReportStatus::Pending
    }
}

/// Join a relative evidence path onto the API base; absolute URLs pass through.
pub fn resolve_evidence_url(api_base: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    let base = api_base.trim_end_matches('/');
    if path.starts_with('/') {
        Some(format!("{}{}", base, path))
    } else {
        Some(format!("{}/{}", base, path))
    }
}

/// Display model for a report card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCard {
    pub id: ReportId,
    /// Zero-padded four digit folio.
    pub folio: String,
    pub location_summary: String,
    pub category_label: &'static str,
    pub status: ReportStatus,
    pub description: String,
    pub evidence_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl ReportCard {
    pub fn from_report(report: &Report, api_base: &str) -> Self {
        Self {
            id: report.id,
            folio: format!("{:04}", report.id.0),
            location_summary: format!(
                "Lat: {:.4}, Lon: {:.4}",
                report.latitude(),
                report.longitude()
            ),
            category_label: report.category.label(),
            status: report.status,
            description: report.description.clone(),
            evidence_url: resolve_evidence_url(api_base, report.evidence.as_deref()),
            latitude: report.latitude(),
            longitude: report.longitude(),
        }
    }
}
