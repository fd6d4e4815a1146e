use crate::types::{NotificationId, ReportId, ReportStatus};
use thiserror::Error;

/// Errors surfaced by the synchronization core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The backend answered 401; the caller should send the user to re-authenticate.
    #[error("Session expired")]
    SessionExpired,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Report {id} cannot be evaluated from status {from}")]
    InvalidTransition { id: ReportId, from: ReportStatus },

    #[error("Report {0} already has an evaluation in flight")]
    AlreadyInFlight(ReportId),

    #[error("Unknown report: {0}")]
    UnknownReport(ReportId),

    #[error("Unknown notification: {0}")]
    UnknownNotification(NotificationId),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Whether the caller should redirect to re-authentication.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, SyncError::SessionExpired)
    }

    /// Build the error for a non-2xx response.
    pub fn from_status(status: u16, message: Option<&str>) -> Self {
        if status == 401 {
            return SyncError::SessionExpired;
        }
        match message {
            Some(msg) if !msg.is_empty() => {
                SyncError::NetworkFailure(format!("HTTP {}: {}", status, msg))
            }
            _ => SyncError::NetworkFailure(format!("HTTP {}", status)),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(401) {
            return SyncError::SessionExpired;
        }
        SyncError::NetworkFailure(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::NetworkFailure(format!("Malformed response body: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
