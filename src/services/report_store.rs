/**
 * Report Lifecycle Store
 *
 * Holds the report working set for one view and drives evaluation.
 *
 * - Loads: every load takes a sequence number; only the response of the
 *   newest load is applied, older responses are dropped on arrival.
 * - Evaluation: Pending -> Approved | Rejected, applied optimistically with
 *   an in-flight flag and rolled back to Pending if the backend refuses.
 */

use crate::error::{Result, SyncError};
use crate::gateway::{EvaluationGateway, ReportGateway};
use crate::services::{markers, normalizer};
use crate::types::{
    Decision, PlacedMarker, RawReport, Report, ReportCard, ReportId, ReportStatus, Session,
    ViewerRole,
};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a `load` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was applied to the working set. `count` is the number
    /// of distinct report ids in the listing; duplicates collapse.
    Applied { count: usize },
    /// A newer load (or an invalidation) happened first; the response was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
struct TrackedReport {
    report: Report,
    /// Index in the most recent server listing.
    position: usize,
    evaluating: bool,
    /// Left out of a listing that landed mid-evaluation; removed once it settles.
    unlisted: bool,
}

/// Report working set for a citizen or admin view.
pub struct ReportLifecycleStore {
    reports_gateway: Arc<dyn ReportGateway>,
    evaluation_gateway: Arc<dyn EvaluationGateway>,
    session: Session,
    reports: DashMap<ReportId, TrackedReport>,
    load_seq: AtomicU64,
    loading: AtomicBool,
}

impl ReportLifecycleStore {
    /// Create a new store bound to one session.
    pub fn new(
        reports_gateway: Arc<dyn ReportGateway>,
        evaluation_gateway: Arc<dyn EvaluationGateway>,
        session: Session,
    ) -> Self {
        Self {
            reports_gateway,
            evaluation_gateway,
            session,
            reports: DashMap::new(),
            load_seq: AtomicU64::new(0),
            loading: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch the collection for `role` and replace the working set.
    ///
    /// On failure the previous working set is left in place (stale, not
    /// cleared) and the error is returned.
    pub async fn load(&self, role: ViewerRole) -> Result<LoadOutcome> {
        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading.store(true, Ordering::SeqCst);
        debug!("Loading {} reports (request {})", role.as_str(), seq);

        let result = match role {
            ViewerRole::Admin => self.reports_gateway.list_all(&self.session).await,
            ViewerRole::Citizen => self.reports_gateway.list_mine(&self.session).await,
        };

        if self.load_seq.load(Ordering::SeqCst) != seq {
            debug!("Dropping stale report response (request {})", seq);
            return Ok(LoadOutcome::Superseded);
        }
        self.loading.store(false, Ordering::SeqCst);

        let raws = result.map_err(|e| {
            warn!("Report load failed: {}", e);
            e
        })?;
        let count = self.apply(raws);
        info!("Loaded {} {} reports", count, role.as_str());
        Ok(LoadOutcome::Applied { count })
    }

    fn apply(&self, raws: Vec<RawReport>) -> usize {
        let mut seen = HashSet::with_capacity(raws.len());

        for (position, raw) in raws.into_iter().enumerate() {
            let report = normalizer::normalize_report(raw);
            let id = report.id;
            if !seen.insert(id) {
                debug!("Duplicate report {} in listing, keeping the later copy", id);
            }

            match self.reports.get_mut(&id) {
                // An evaluation in flight owns the local copy until it settles.
                Some(mut entry) if entry.evaluating => {
                    entry.position = position;
                    entry.unlisted = false;
                }
                Some(mut entry) => {
                    entry.report = report;
                    entry.position = position;
                    entry.unlisted = false;
                }
                None => {
                    self.reports.insert(
                        id,
                        TrackedReport {
                            report,
                            position,
                            evaluating: false,
                            unlisted: false,
                        },
                    );
                }
            }
        }

        self.reports.retain(|id, entry| {
            if seen.contains(id) {
                true
            } else if entry.evaluating {
                entry.unlisted = true;
                true
            } else {
                false
            }
        });
        seen.len()
    }

    /// Drop any load still in flight, e.g. when the view is discarded.
    pub fn invalidate(&self) {
        self.load_seq.fetch_add(1, Ordering::SeqCst);
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Evaluate a pending report.
    ///
    /// The decision is applied locally at once and the report is flagged as
    /// evaluating. On success the flag clears and the status sticks; on any
    /// failure the status returns to Pending and the error is returned.
    pub async fn evaluate(&self, id: ReportId, decision: Decision) -> Result<ReportStatus> {
        let target = decision.target_status();
        {
            let mut entry = self
                .reports
                .get_mut(&id)
                .ok_or(SyncError::UnknownReport(id))?;
            if entry.evaluating {
                return Err(SyncError::AlreadyInFlight(id));
            }
            if entry.report.status != ReportStatus::Pending {
                return Err(SyncError::InvalidTransition {
                    id,
                    from: entry.report.status,
                });
            }
            entry.evaluating = true;
            entry.report.status = target;
        }
        info!("Evaluating report {} as {}", id, decision.as_str());

        let result = self
            .evaluation_gateway
            .evaluate(&self.session, id, decision)
            .await;

        let outcome = match result {
            Ok(()) => {
                if let Some(mut entry) = self.reports.get_mut(&id) {
                    entry.evaluating = false;
                    entry.report.status = target;
                }
                info!("Report {} is now {}", id, target);
                Ok(target)
            }
            Err(e) => {
                if let Some(mut entry) = self.reports.get_mut(&id) {
                    entry.evaluating = false;
                    entry.report.status = ReportStatus::Pending;
                }
                warn!("Evaluation of report {} failed, rolled back: {}", id, e);
                Err(e)
            }
        };

        if self.reports.remove_if(&id, |_, entry| entry.unlisted).is_some() {
            debug!("Report {} left the listing during evaluation, dropped", id);
        }
        outcome
    }

    /// Whether a load is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_evaluating(&self, id: ReportId) -> bool {
        self.reports.get(&id).map(|e| e.evaluating).unwrap_or(false)
    }

    pub fn get(&self, id: ReportId) -> Option<Report> {
        self.reports.get(&id).map(|e| e.report.clone())
    }

    /// Reports in listing order.
    pub fn reports(&self) -> Vec<Report> {
        let mut entries: Vec<(usize, Report)> = self
            .reports
            .iter()
            .map(|e| (e.position, e.report.clone()))
            .collect();
        entries.sort_by_key(|(position, report)| (*position, report.id));
        entries.into_iter().map(|(_, report)| report).collect()
    }

    /// Reports still awaiting evaluation.
    pub fn pending(&self) -> Vec<Report> {
        self.reports()
            .into_iter()
            .filter(Report::is_pending)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn cards(&self, api_base: &str) -> Vec<ReportCard> {
        self.reports()
            .iter()
            .map(|report| ReportCard::from_report(report, api_base))
            .collect()
    }

    pub fn markers(&self) -> Vec<PlacedMarker> {
        markers::dispatch(&self.reports())
    }
}
