//! In-memory backend shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use ecocun::gateway::{EvaluationGateway, NotificationGateway, ReportGateway};
use ecocun::{
    Decision, NotificationId, RawNotification, RawReport, ReportId, Session, SyncError,
    ViewerRole,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// A closed gate; calls that pick it up wait until `open` is called.
#[derive(Clone)]
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn new() -> Self {
        Gate(Arc::new(Semaphore::new(0)))
    }

    pub fn open(&self) {
        self.0.add_permits(1);
    }

    async fn pass(&self) {
        let _ = self.0.acquire().await;
    }
}

/// One scripted answer for a call.
pub struct Scripted<T> {
    pub gate: Option<Gate>,
    pub result: Result<T, SyncError>,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            gate: None,
            result: Ok(value),
        }
    }

    pub fn err(error: SyncError) -> Self {
        Self {
            gate: None,
            result: Err(error),
        }
    }

    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }
}

async fn answer<T: Clone>(
    queue: &Mutex<VecDeque<Scripted<T>>>,
    fallback: impl FnOnce() -> T,
) -> Result<T, SyncError> {
    let scripted = queue.lock().unwrap().pop_front();
    match scripted {
        Some(Scripted { gate, result }) => {
            if let Some(gate) = gate {
                gate.pass().await;
            }
            result
        }
        None => Ok(fallback()),
    }
}

pub fn raw_report(value: Value) -> RawReport {
    serde_json::from_value(value).unwrap()
}

pub fn raw_notification(value: Value) -> RawNotification {
    serde_json::from_value(value).unwrap()
}

#[derive(Default)]
pub struct MockBackend {
    pub reports: Mutex<Vec<RawReport>>,
    pub report_script: Mutex<VecDeque<Scripted<Vec<RawReport>>>>,
    pub list_all_calls: AtomicUsize,
    pub list_mine_calls: AtomicUsize,

    pub evaluate_script: Mutex<VecDeque<Scripted<()>>>,
    pub evaluations: Mutex<Vec<(ReportId, Decision)>>,

    pub notifications: Mutex<Vec<RawNotification>>,
    pub notification_script: Mutex<VecDeque<Scripted<Vec<RawNotification>>>>,
    pub notification_list_calls: AtomicUsize,
    pub mark_read_script: Mutex<VecDeque<Scripted<()>>>,
    pub mark_read_calls: Mutex<Vec<NotificationId>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_reports(values: Vec<Value>) -> Arc<Self> {
        let backend = Self::default();
        *backend.reports.lock().unwrap() = values.into_iter().map(raw_report).collect();
        Arc::new(backend)
    }

    pub fn with_notifications(values: Vec<Value>) -> Arc<Self> {
        let backend = Self::default();
        *backend.notifications.lock().unwrap() =
            values.into_iter().map(raw_notification).collect();
        Arc::new(backend)
    }

    pub fn set_notifications(&self, values: Vec<Value>) {
        *self.notifications.lock().unwrap() = values.into_iter().map(raw_notification).collect();
    }

    pub fn script_reports(&self, scripted: Scripted<Vec<RawReport>>) {
        self.report_script.lock().unwrap().push_back(scripted);
    }

    pub fn script_evaluate(&self, scripted: Scripted<()>) {
        self.evaluate_script.lock().unwrap().push_back(scripted);
    }

    pub fn script_notifications(&self, scripted: Scripted<Vec<RawNotification>>) {
        self.notification_script.lock().unwrap().push_back(scripted);
    }

    pub fn script_mark_read(&self, scripted: Scripted<()>) {
        self.mark_read_script.lock().unwrap().push_back(scripted);
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations.lock().unwrap().len()
    }

    pub fn mark_read_count(&self) -> usize {
        self.mark_read_calls.lock().unwrap().len()
    }

    pub fn notification_list_count(&self) -> usize {
        self.notification_list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportGateway for MockBackend {
    async fn list_all(&self, _session: &Session) -> Result<Vec<RawReport>, SyncError> {
        self.list_all_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.report_script, || self.reports.lock().unwrap().clone()).await
    }

    async fn list_mine(&self, session: &Session) -> Result<Vec<RawReport>, SyncError> {
        self.list_mine_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.report_script, || {
            self.reports
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == session.user_id)
                .cloned()
                .collect()
        })
        .await
    }
}

#[async_trait]
impl EvaluationGateway for MockBackend {
    async fn evaluate(
        &self,
        _session: &Session,
        id: ReportId,
        decision: Decision,
    ) -> Result<(), SyncError> {
        self.evaluations.lock().unwrap().push((id, decision));
        answer(&self.evaluate_script, || ()).await
    }
}

#[async_trait]
impl NotificationGateway for MockBackend {
    async fn list(&self, _session: &Session) -> Result<Vec<RawNotification>, SyncError> {
        self.notification_list_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.notification_script, || {
            self.notifications.lock().unwrap().clone()
        })
        .await
    }

    async fn mark_read(&self, _session: &Session, id: NotificationId) -> Result<(), SyncError> {
        self.mark_read_calls.lock().unwrap().push(id);
        answer(&self.mark_read_script, || ()).await
    }
}

pub fn admin_session() -> Session {
    Session::new("admin-token", ViewerRole::Admin, Some(1))
}

pub fn citizen_session(user_id: i64) -> Session {
    Session::new("citizen-token", ViewerRole::Citizen, Some(user_id))
}

/// Yield until `condition` holds. Panics after a bounded number of turns.
pub async fn settle_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
