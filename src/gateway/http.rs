use super::{EvaluationGateway, NotificationGateway, ReportGateway};
use crate::error::{Result, SyncError};
use crate::types::{Decision, NotificationId, RawNotification, RawReport, ReportId, Session};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const ALL_REPORTS_PATH: &str = "/api/reports/allreports";
const MY_REPORTS_PATH: &str = "/api/reports/myreports";
const EVALUATE_PATH: &str = "/api/reports/evaluate";
const NOTIFICATIONS_PATH: &str = "/api/notifications";

/// REST client for the reporting backend.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    page_limit: u32,
}

impl HttpGateway {
    /// Create a new gateway against `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration, page_limit: u32) -> Self {
        let client = Client::builder()
            .user_agent("Ecocun/1.0 (Report Sync)")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_limit,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and turn any non-2xx answer into a `SyncError`.
    async fn send(&self, request: RequestBuilder, session: &Session) -> Result<Response> {
        let response = request.bearer_auth(&session.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| text.chars().take(200).collect());
        debug!("Backend returned {}: {}", status, message);
        Err(SyncError::from_status(status.as_u16(), Some(message.trim())))
    }

    async fn fetch_reports(&self, session: &Session, path: &str) -> Result<Vec<RawReport>> {
        let request = self
            .client
            .get(self.url(path))
            .query(&[("page", 1), ("limit", self.page_limit)]);
        let body: Value = self.send(request, session).await?.json().await?;
        Ok(decode_list(body, "report"))
    }
}

/// Pull the item list out of `{ "data": [...] }` or a bare array, skipping
/// items that cannot be decoded.
fn decode_list<T: DeserializeOwned>(body: Value, what: &str) -> Vec<T> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("Unexpected {} list envelope, treating as empty", what);
                Vec::new()
            }
        },
        _ => {
            warn!("Unexpected {} list body, treating as empty", what);
            Vec::new()
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping malformed {}: {}", what, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl ReportGateway for HttpGateway {
    async fn list_all(&self, session: &Session) -> Result<Vec<RawReport>> {
        self.fetch_reports(session, ALL_REPORTS_PATH).await
    }

    async fn list_mine(&self, session: &Session) -> Result<Vec<RawReport>> {
        self.fetch_reports(session, MY_REPORTS_PATH).await
    }
}

#[async_trait]
impl EvaluationGateway for HttpGateway {
    async fn evaluate(&self, session: &Session, id: ReportId, decision: Decision) -> Result<()> {
        let request = self.client.post(self.url(EVALUATE_PATH)).json(&json!({
            "reportId": id.0,
            "status": decision.as_str(),
        }));
        self.send(request, session).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for HttpGateway {
    async fn list(&self, session: &Session) -> Result<Vec<RawNotification>> {
        let request = self.client.get(self.url(NOTIFICATIONS_PATH));
        let body: Value = self.send(request, session).await?.json().await?;
        Ok(decode_list(body, "notification"))
    }

    async fn mark_read(&self, session: &Session, id: NotificationId) -> Result<()> {
        let request = self
            .client
            .put(format!("{}/{}/read", self.url(NOTIFICATIONS_PATH), id));
        self.send(request, session).await?;
        Ok(())
    }
}
