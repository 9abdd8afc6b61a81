//! Cycle reports and the sinks they are delivered to.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use courtq_state::{
    Anomaly, AssignmentKind, CourtId, CourtType, PlayerId, Qualification,
};

use crate::executor::SkippedPlacement;
use crate::trigger::Trigger;

/// One applied placement, shaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentNotice {
    pub player_id: PlayerId,
    pub player_name: String,
    pub qualification: Qualification,
    pub court_id: CourtId,
    pub court_name: String,
    pub court_type: CourtType,
    pub assignment_kind: AssignmentKind,
}

/// Everything one cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub trigger: Trigger,
    pub assignments: Vec<AssignmentNotice>,
    pub skipped: Vec<SkippedPlacement>,
    pub anomalies: Vec<Anomaly>,
    pub remaining_advanced: usize,
    pub remaining_intermediate: usize,
    /// Set when a store failure cut the cycle short.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl CycleReport {
    pub fn empty(trigger: Trigger) -> Self {
        Self {
            trigger,
            assignments: Vec::new(),
            skipped: Vec::new(),
            anomalies: Vec::new(),
            remaining_advanced: 0,
            remaining_intermediate: 0,
            aborted: None,
        }
    }
}

/// Receives a report after every cycle.
pub trait Notifier: Send + Sync {
    fn notify(&self, report: &CycleReport);
}

impl<F> Notifier for F
where
    F: Fn(&CycleReport) + Send + Sync,
{
    fn notify(&self, report: &CycleReport) {
        self(report)
    }
}

/// Writes reports to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &CycleReport) {
        for a in &report.assignments {
            info!(
                player = %a.player_name,
                player_id = a.player_id,
                qualification = %a.qualification,
                court = %a.court_name,
                court_id = a.court_id,
                court_type = %a.court_type,
                kind = %a.assignment_kind,
                "player assigned"
            );
        }
        if let Some(reason) = &report.aborted {
            warn!(%reason, "assignment cycle aborted");
        }
        debug!(
            trigger = ?report.trigger,
            assigned = report.assignments.len(),
            skipped = report.skipped.len(),
            remaining_advanced = report.remaining_advanced,
            remaining_intermediate = report.remaining_intermediate,
            "assignment cycle finished"
        );
    }
}

/// Fans reports out to any number of subscribers (e.g. a display).
///
/// Slow subscribers miss old reports rather than holding up the loop.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<CycleReport>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, report: &CycleReport) {
        if self.tx.send(report.clone()).is_err() {
            debug!("no report subscribers");
        }
    }
}
