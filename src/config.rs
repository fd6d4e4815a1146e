use crate::error::{Result, SyncError};
use crate::types::{Session, ViewerRole};
use std::env;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without a trailing slash.
    pub api_url: String,
    /// Bearer token. `None` means no session.
    pub api_token: Option<String>,
    /// Role of the signed-in user.
    pub role: ViewerRole,
    /// Numeric id of the signed-in user.
    pub user_id: Option<i64>,
    /// Notification polling period (seconds).
    pub notification_poll_secs: u64,
    /// HTTP request timeout (seconds).
    pub request_timeout_secs: u64,
    /// Page size requested when listing reports.
    pub report_page_limit: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http://localhost:5000".to_string());

        Self {
            api_url,
            api_token: lookup("API_TOKEN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            role: lookup("USER_ROLE")
                .and_then(|v| ViewerRole::from_str(&v))
                .unwrap_or(ViewerRole::Citizen),
            user_id: lookup("USER_ID").and_then(|v| v.trim().parse().ok()),
            notification_poll_secs: lookup("NOTIFICATION_POLL_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(60),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(15),
            report_page_limit: lookup("REPORT_PAGE_LIMIT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(100),
        }
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "API_URL must be an http(s) URL, got {}",
                self.api_url
            )));
        }
        if self.notification_poll_secs == 0 {
            return Err(SyncError::Config(
                "NOTIFICATION_POLL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.report_page_limit == 0 {
            return Err(SyncError::Config(
                "REPORT_PAGE_LIMIT must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The session context, if a token is configured.
    pub fn session(&self) -> Option<Session> {
        self.api_token
            .as_ref()
            .map(|token| Session::new(token.clone(), self.role, self.user_id))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.notification_poll_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
