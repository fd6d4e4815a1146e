//! Explicit session context threaded into every gateway call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which report collection a viewer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerRole {
    /// Sees only their own reports.
    Citizen,
    /// Sees every report and may evaluate pending ones.
    Admin,
}

impl ViewerRole {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "citizen" | "user" => Some(ViewerRole::Citizen),
            "admin" => Some(ViewerRole::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewerRole::Citizen => "citizen",
            ViewerRole::Admin => "admin",
        }
    }
}

/// Authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    pub role: ViewerRole,
    pub user_id: Option<i64>,
}

impl Session {
    pub fn new(token: impl Into<String>, role: ViewerRole, user_id: Option<i64>) -> Self {
        Self {
            token: token.into(),
            role,
            user_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ViewerRole::Admin
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .finish()
    }
}
