pub mod markers;
pub mod normalizer;
pub mod notification_sync;
pub mod report_store;

pub use markers::{dispatch, marker_for, NEUTRAL_MARKER};
pub use normalizer::{normalize_category, normalize_report, normalize_status, CodeTable};
pub use notification_sync::{
    MarkReadOutcome, NotificationSyncEngine, PollHandle, RefreshOutcome, DEFAULT_POLL_INTERVAL,
};
pub use report_store::{LoadOutcome, ReportLifecycleStore};
