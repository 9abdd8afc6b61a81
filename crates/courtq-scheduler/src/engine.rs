//! Assignment engine: one snapshot → plan → execute → notify cycle.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use courtq_placement::compute_plan;
use courtq_state::{Qualification, RosterStore};

use crate::error::SchedulerResult;
use crate::executor::execute;
use crate::notify::{CycleReport, Notifier};
use crate::trigger::Trigger;

/// Runs assignment cycles against a roster store.
///
/// Cycles are serialized: a manual [`run_cycle`](Self::run_cycle) and the
/// loop's own cycles never overlap.
pub struct AssignmentEngine {
    store: RosterStore,
    notifier: Arc<dyn Notifier>,
    cycle_lock: Mutex<()>,
}

impl AssignmentEngine {
    pub fn new(store: RosterStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    /// Run one full cycle and report it.
    ///
    /// A store failure while snapshotting ends the cycle with nothing
    /// applied. A store failure during execution keeps what was already
    /// applied, reports it, and then returns the error.
    pub async fn run_cycle(&self, trigger: Trigger) -> SchedulerResult<CycleReport> {
        let _guard = self.cycle_lock.lock().await;

        let snapshot = match self.store.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(?trigger, error = %e, "snapshot failed, cycle aborted");
                let mut report = CycleReport::empty(trigger);
                report.aborted = Some(e.to_string());
                self.notifier.notify(&report);
                return Err(e.into());
            }
        };

        let plan = compute_plan(&snapshot);
        let result = execute(&plan, &self.store);

        let report = CycleReport {
            trigger,
            remaining_advanced: plan.remaining_advanced
                + result.skipped_count(Qualification::Advanced),
            remaining_intermediate: plan.remaining_intermediate
                + result.skipped_count(Qualification::Intermediate),
            assignments: result.applied,
            skipped: result.skipped,
            anomalies: snapshot.anomalies,
            aborted: result.interrupted.as_ref().map(ToString::to_string),
        };

        if !report.assignments.is_empty() {
            info!(
                ?trigger,
                assigned = report.assignments.len(),
                remaining_advanced = report.remaining_advanced,
                remaining_intermediate = report.remaining_intermediate,
                "assignment cycle applied placements"
            );
        }
        self.notifier.notify(&report);

        match result.interrupted {
            Some(e) => Err(e.into()),
            None => Ok(report),
        }
    }
}
