/**
 * Notification Sync Engine
 *
 * Keeps the local notification list in step with the backend feed.
 *
 * - Polling: `activate` starts a fixed-interval refresh loop and returns a
 *   `PollHandle`; disposing the handle stops the loop exactly once.
 * - Merge: the server is authoritative for read state, except that a local
 *   "marked read" is only reverted by a server state strictly newer than
 *   the local confirmation.
 * - Generations: deactivation and session changes bump a generation counter;
 *   fetches that started under an older generation are ignored on arrival.
 */

use crate::error::{Result, SyncError};
use crate::gateway::NotificationGateway;
use crate::types::{Notification, NotificationId, RawNotification, Session};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Default polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Result of a `refresh` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Merged `count` notifications; `unread` remain unread.
    Applied { count: usize, unread: usize },
    /// No session; nothing was fetched.
    NoSession,
    /// The engine was deactivated or re-bound while the fetch was outstanding.
    Discarded,
}

/// Result of a `mark_read` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkReadOutcome {
    /// The backend accepted the change.
    Confirmed,
    /// Already read locally; nothing was sent.
    AlreadyRead,
    /// Marked locally but the backend call failed. The local state is kept.
    Unconfirmed,
    /// Marked locally with no session to send it under.
    LocalOnly,
}

#[derive(Debug, Clone)]
struct TrackedNotification {
    notification: Notification,
    position: usize,
    /// When this client marked the notification read, until the server agrees.
    locally_read_at: Option<DateTime<Utc>>,
}

impl TrackedNotification {
    fn new(notification: Notification, position: usize) -> Self {
        Self {
            notification,
            position,
            locally_read_at: None,
        }
    }

    fn reconcile(&mut self, incoming: Notification, position: usize) {
        self.position = position;

        let confirmed_at = if self.notification.is_read {
            self.locally_read_at.or(self.notification.read_at)
        } else {
            None
        };

        match confirmed_at {
            // Only a server state stamped strictly after the local read may revert it.
            Some(confirmed_at)
                if !incoming.is_read
                    && incoming.server_stamp.map_or(true, |stamp| stamp <= confirmed_at) =>
            {
                let read_at = self.notification.read_at;
                self.notification = Notification {
                    is_read: true,
                    read_at,
                    ..incoming
                };
            }
            _ => {
                self.notification = incoming;
                self.locally_read_at = None;
            }
        }
    }
}

/// Local notification list reconciled against the backend feed.
pub struct NotificationSyncEngine {
    gateway: Arc<dyn NotificationGateway>,
    session: RwLock<Option<Session>>,
    notifications: DashMap<NotificationId, TrackedNotification>,
    generation: AtomicU64,
    poll_interval: Duration,
    session_expired: AtomicBool,
    unread_tx: watch::Sender<usize>,
}

impl NotificationSyncEngine {
    /// Create a new engine. `session` may be `None` until the user signs in.
    pub fn new(
        gateway: Arc<dyn NotificationGateway>,
        session: Option<Session>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let (unread_tx, _) = watch::channel(0);
        let poll_interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        Arc::new(Self {
            gateway,
            session: RwLock::new(session),
            notifications: DashMap::new(),
            generation: AtomicU64::new(0),
            poll_interval,
            session_expired: AtomicBool::new(false),
            unread_tx,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bind a new session (or none). Outstanding fetches are ignored and the
    /// list is cleared when the user changes or signs out.
    pub fn set_session(&self, session: Option<Session>) {
        let user_changed = {
            let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
            let changed = match (&*current, &session) {
                (Some(old), Some(new)) => old.user_id != new.user_id,
                _ => true,
            };
            *current = session;
            changed
        };

        self.generation.fetch_add(1, Ordering::SeqCst);
        self.session_expired.store(false, Ordering::SeqCst);
        if user_changed {
            self.notifications.clear();
            self.publish_unread();
        }
    }

    /// Whether the backend reported the session as expired during polling.
    pub fn is_session_expired(&self) -> bool {
        self.session_expired.load(Ordering::SeqCst)
    }

    /// Fetch the feed and merge it into the local list.
    ///
    /// Without a session this is a no-op. On failure the local list is left
    /// exactly as it was.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Some(session) = self.current_session() else {
            debug!("No session, skipping notification refresh");
            return Ok(RefreshOutcome::NoSession);
        };
        let generation = self.generation.load(Ordering::SeqCst);

        let result = self.gateway.list(&session).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Dropping notification response from generation {}", generation);
            return Ok(RefreshOutcome::Discarded);
        }

        let raws = match result {
            Ok(raws) => raws,
            Err(e) => {
                if e.is_session_expired() {
                    self.session_expired.store(true, Ordering::SeqCst);
                }
                warn!("Notification refresh failed: {}", e);
                return Err(e);
            }
        };

        let count = self.merge(raws, Utc::now());
        let unread = self.publish_unread();
        debug!("Merged {} notifications, {} unread", count, unread);
        Ok(RefreshOutcome::Applied { count, unread })
    }

    fn merge(&self, raws: Vec<RawNotification>, received_at: DateTime<Utc>) -> usize {
        let mut seen = HashSet::with_capacity(raws.len());

        for (position, raw) in raws.into_iter().enumerate() {
            let incoming = Notification::from_raw(raw, received_at);
            let id = incoming.id;
            seen.insert(id);

            match self.notifications.get_mut(&id) {
                Some(mut entry) => entry.reconcile(incoming, position),
                None => {
                    self.notifications
                        .insert(id, TrackedNotification::new(incoming, position));
                }
            }
        }

        self.notifications.retain(|id, _| seen.contains(id));
        seen.len()
    }

    /// Mark one notification read.
    ///
    /// The local state flips immediately and is never rolled back. A second
    /// call on a read notification sends nothing. Transport failures are
    /// logged and reported as `Unconfirmed`; only `SessionExpired` is returned
    /// as an error.
    pub async fn mark_read(&self, id: NotificationId) -> Result<MarkReadOutcome> {
        let now = Utc::now();
        {
            let mut entry = self
                .notifications
                .get_mut(&id)
                .ok_or(SyncError::UnknownNotification(id))?;
            if entry.notification.is_read {
                return Ok(MarkReadOutcome::AlreadyRead);
            }
            entry.notification.is_read = true;
            entry.notification.read_at = Some(now);
            entry.locally_read_at = Some(now);
        }
        self.publish_unread();

        let Some(session) = self.current_session() else {
            debug!("No session, notification {} marked read locally only", id);
            return Ok(MarkReadOutcome::LocalOnly);
        };

        match self.gateway.mark_read(&session, id).await {
            Ok(()) => Ok(MarkReadOutcome::Confirmed),
            Err(SyncError::SessionExpired) => {
                self.session_expired.store(true, Ordering::SeqCst);
                warn!("Session expired while marking notification {} read", id);
                Err(SyncError::SessionExpired)
            }
            Err(e) => {
                warn!("Failed to mark notification {} read: {}", id, e);
                Ok(MarkReadOutcome::Unconfirmed)
            }
        }
    }

    /// Notifications in feed order.
    pub fn notifications(&self) -> Vec<Notification> {
        let mut entries: Vec<(usize, Notification)> = self
            .notifications
            .iter()
            .map(|e| (e.position, e.notification.clone()))
            .collect();
        entries.sort_by_key(|(position, n)| (*position, n.id));
        entries.into_iter().map(|(_, n)| n).collect()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.notifications.get(&id).map(|e| e.notification.clone())
    }

    pub fn unread_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|e| !e.notification.is_read)
            .count()
    }

    /// Watch the unread count, e.g. for a badge.
    pub fn subscribe_unread(&self) -> watch::Receiver<usize> {
        self.unread_tx.subscribe()
    }

    fn publish_unread(&self) -> usize {
        let unread = self.unread_count();
        self.unread_tx.send_replace(unread);
        unread
    }

    /// Start polling every `poll_interval`, beginning immediately.
    pub fn activate(self: &Arc<Self>) -> PollHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let engine = Arc::clone(self);
        let period = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    result = engine.refresh() => {
                        if let Err(e) = result {
                            if e.is_session_expired() {
                                warn!("Session expired, notification polling stopped");
                                break;
                            }
                        }
                    }
                }
            }
            debug!("Notification poll loop exited");
        });

        info!("Notification polling every {:?}", period);
        PollHandle {
            engine: Arc::clone(self),
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Disposer for an active poll loop. Dropping it also disposes.
pub struct PollHandle {
    engine: Arc<NotificationSyncEngine>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop polling. Any fetch still outstanding is ignored on arrival.
    pub fn deactivate(mut self) {
        self.dispose();
    }

    /// Whether the loop task is still running.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    fn dispose(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.engine.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        task.abort();
        info!("Notification polling deactivated");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}
