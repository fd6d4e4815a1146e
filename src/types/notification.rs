//! Notification types for the notification feed.

use super::{
    deserialize_id, deserialize_lenient_bool, deserialize_lenient_string, parse_timestamp,
    MarkerColor,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable notification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(#[serde(deserialize_with = "deserialize_id")] pub i64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NotificationId {
    fn from(id: i64) -> Self {
        NotificationId(id)
    }
}

/// Notification type categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Success,
    Failed,
    Reminder,
    Campaign,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::Info => "info",
            NotificationType::Success => "success",
            NotificationType::Failed => "failed",
            NotificationType::Reminder => "reminder",
            NotificationType::Campaign => "campaign",
            NotificationType::System => "system",
        }
    }

    /// Unknown types fall back to `Info`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => NotificationType::Success,
            "failed" => NotificationType::Failed,
            "reminder" => NotificationType::Reminder,
            "campaign" => NotificationType::Campaign,
            "system" => NotificationType::System,
            _ => NotificationType::Info,
        }
    }

    /// Icon colour for the notification panel.
    pub fn marker_color(&self) -> MarkerColor {
        match self {
            NotificationType::Info => MarkerColor::Blue,
            NotificationType::Success => MarkerColor::Green,
            NotificationType::Failed => MarkerColor::Red,
            NotificationType::Reminder => MarkerColor::Orange,
            NotificationType::Campaign => MarkerColor::Purple,
            NotificationType::System => MarkerColor::Gray,
        }
    }
}

/// Notification exactly as the backend sent it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    pub id: NotificationId,
    #[serde(default, rename = "type", deserialize_with = "deserialize_lenient_string")]
    pub notification_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub read_at: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub created_at: Option<String>,
    /// Last server-side modification, when the backend reports one.
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub updated_at: Option<String>,
}

/// A normalized notification. `read_at` is `Some` exactly when `is_read`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Timestamp of the server state this copy reflects. `None` when the
    /// backend sent no usable timestamp.
    #[serde(skip)]
    pub server_stamp: Option<DateTime<Utc>>,
}

impl Notification {
    /// Normalize a raw notification. `received_at` stands in for missing
    /// display timestamps; it never becomes the server stamp.
    pub fn from_raw(raw: RawNotification, received_at: DateTime<Utc>) -> Self {
        let created = raw.created_at.as_deref().and_then(parse_timestamp);
        let server_read = raw.read_at.as_deref().and_then(parse_timestamp);
        let read_at = if raw.is_read {
            Some(server_read.unwrap_or(received_at))
        } else {
            None
        };
        let server_stamp = raw
            .updated_at
            .as_deref()
            .and_then(parse_timestamp)
            .or(if raw.is_read { server_read } else { None })
            .or(created);

        Self {
            id: raw.id,
            notification_type: raw
                .notification_type
                .as_deref()
                .map(NotificationType::from_str)
                .unwrap_or(NotificationType::Info),
            title: raw.title.unwrap_or_default(),
            message: raw.message.unwrap_or_default(),
            is_read: raw.is_read,
            read_at,
            created_at: created.unwrap_or(received_at),
            server_stamp,
        }
    }

    /// Short relative age, e.g. "5 min ago".
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.created_at);
        let minutes = elapsed.num_minutes();
        let hours = elapsed.num_hours();
        let days = elapsed.num_days();

        if minutes < 1 {
            "now".to_string()
        } else if minutes < 60 {
            format!("{} min ago", minutes)
        } else if hours < 24 {
            format!("{} hour{} ago", hours, if hours > 1 { "s" } else { "" })
        } else if days == 1 {
            "yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            self.created_at.format("%Y-%m-%d").to_string()
        }
    }
}
