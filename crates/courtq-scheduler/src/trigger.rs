//! Reasons to run a cycle, and the handle collaborators fire them through.

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use courtq_state::{CourtId, PlayerId};

/// What caused an assignment cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "trigger", content = "id", rename_all = "snake_case")]
pub enum Trigger {
    /// The loop was just started.
    Startup,
    /// Periodic safety-net tick.
    Tick,
    PlayerAdded(PlayerId),
    /// Inactive → active transition.
    PlayerActivated(PlayerId),
    /// All occupants sent back to their queues.
    CourtCleared(CourtId),
    CourtTypeChanged(CourtId),
    CourtAdded(CourtId),
    /// Explicit operator request.
    Manual,
}

/// Cloneable sender for cycle triggers.
///
/// At most one trigger is ever pending. A trigger fired while another is
/// pending is folded into it, so any burst of events costs at most one
/// extra cycle after the current one.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    tx: mpsc::Sender<Trigger>,
}

impl TriggerHandle {
    pub(crate) fn new(tx: mpsc::Sender<Trigger>) -> Self {
        Self { tx }
    }

    /// Request a cycle. Returns false when the request was folded into an
    /// already pending one or the loop is gone.
    pub fn fire(&self, trigger: Trigger) -> bool {
        match self.tx.try_send(trigger) {
            Ok(()) => {
                debug!(?trigger, "cycle requested");
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(?trigger, "cycle already pending, trigger coalesced");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(?trigger, "assignment loop is gone, trigger dropped");
                false
            }
        }
    }

    pub fn on_player_added(&self, player_id: PlayerId) -> bool {
        self.fire(Trigger::PlayerAdded(player_id))
    }

    pub fn on_player_activated(&self, player_id: PlayerId) -> bool {
        self.fire(Trigger::PlayerActivated(player_id))
    }

    pub fn on_court_cleared(&self, court_id: CourtId) -> bool {
        self.fire(Trigger::CourtCleared(court_id))
    }

    pub fn on_court_type_changed(&self, court_id: CourtId) -> bool {
        self.fire(Trigger::CourtTypeChanged(court_id))
    }

    pub fn request_cycle(&self) -> bool {
        self.fire(Trigger::Manual)
    }
}

/// The single-slot trigger channel behind a loop.
pub(crate) fn channel() -> (TriggerHandle, mpsc::Receiver<Trigger>) {
    let (tx, rx) = mpsc::channel(1);
    (TriggerHandle::new(tx), rx)
}
