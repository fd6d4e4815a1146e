//! Backend collaborators.
//!
//! Each trait covers one REST surface. Every call takes the session
//! explicitly; implementations must map a 401 to
//! [`SyncError::SessionExpired`](crate::error::SyncError::SessionExpired)
//! and every other failure to `NetworkFailure`.

pub mod http;

use crate::error::Result;
use crate::types::{Decision, NotificationId, RawNotification, RawReport, ReportId, Session};
use async_trait::async_trait;

pub use http::HttpGateway;

/// `GET /api/reports/allreports` and `GET /api/reports/myreports`.
#[async_trait]
pub trait ReportGateway: Send + Sync {
    /// Every report (admin view).
    async fn list_all(&self, session: &Session) -> Result<Vec<RawReport>>;

    /// Reports authored by the session's user (citizen view).
    async fn list_mine(&self, session: &Session) -> Result<Vec<RawReport>>;
}

/// `POST /api/reports/evaluate`.
#[async_trait]
pub trait EvaluationGateway: Send + Sync {
    async fn evaluate(&self, session: &Session, id: ReportId, decision: Decision) -> Result<()>;
}

/// `GET /api/notifications` and `PUT /api/notifications/{id}/read`.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn list(&self, session: &Session) -> Result<Vec<RawNotification>>;

    async fn mark_read(&self, session: &Session, id: NotificationId) -> Result<()>;
}
