//! Ecocun - report lifecycle and notification synchronization core

pub mod config;
pub mod error;
pub mod gateway;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SyncError};
pub use services::{NotificationSyncEngine, PollHandle, ReportLifecycleStore};
pub use types::*;
