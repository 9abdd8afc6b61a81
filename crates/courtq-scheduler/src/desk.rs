//! Operator-facing roster edits that wake the assignment loop.
//!
//! Every edit goes straight to the store as one write transaction, so it
//! races with running cycles exactly like any other writer. Edits that can
//! open up placements fire the matching trigger once they commit.

use tracing::info;

use courtq_state::{
    ActivityChange, Admission, CourtId, CourtRecord, CourtType, Outcome, PlayerId, PlayerRecord,
    Qualification, Rejection, RosterStore, Seating,
};

use crate::error::SchedulerResult;
use crate::trigger::{Trigger, TriggerHandle};

/// Front desk of the club: the manual side of the roster.
#[derive(Clone)]
pub struct ClubDesk {
    store: RosterStore,
    triggers: TriggerHandle,
}

impl ClubDesk {
    pub fn new(store: RosterStore, triggers: TriggerHandle) -> Self {
        Self { store, triggers }
    }

    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    /// Register a new, active player at the tail of its queue.
    pub fn register_player(
        &self,
        name: &str,
        qualification: Qualification,
    ) -> SchedulerResult<PlayerRecord> {
        let player = self.store.add_player(name, qualification)?;
        info!(player_id = player.id, name, %qualification, "player registered");
        self.triggers.on_player_added(player.id);
        Ok(player)
    }

    pub fn add_court(&self, name: &str, court_type: CourtType) -> SchedulerResult<CourtRecord> {
        let court = self.store.add_court(name, court_type)?;
        info!(court_id = court.id, name, %court_type, "court added");
        self.triggers.fire(Trigger::CourtAdded(court.id));
        Ok(court)
    }

    pub fn delete_player(&self, player_id: PlayerId) -> SchedulerResult<bool> {
        let removed = self.store.delete_player(player_id)?;
        if removed {
            info!(player_id, "player deleted");
        }
        Ok(removed)
    }

    /// Only an inactive → active transition wakes the loop; deactivation
    /// frees a seat but the periodic tick picks that up.
    pub fn set_player_active(
        &self,
        player_id: PlayerId,
        active: bool,
    ) -> SchedulerResult<Outcome<ActivityChange>> {
        let outcome = self.store.set_player_active(player_id, active)?;
        if let Outcome::Applied(change) = &outcome {
            if change.activated {
                self.triggers.on_player_activated(player_id);
            }
        }
        Ok(outcome)
    }

    pub fn set_player_qualification(
        &self,
        player_id: PlayerId,
        qualification: Qualification,
    ) -> SchedulerResult<Outcome<PlayerRecord>> {
        Ok(self.store.set_player_qualification(player_id, qualification)?)
    }

    pub fn set_court_type(
        &self,
        court_id: CourtId,
        court_type: CourtType,
    ) -> SchedulerResult<Outcome<CourtRecord>> {
        let outcome = self.store.set_court_type(court_id, court_type)?;
        if outcome.is_applied() {
            self.triggers.on_court_type_changed(court_id);
        }
        Ok(outcome)
    }

    /// End the game on a court: everyone on it goes back to the tail of
    /// their queue in seating order, then a cycle is requested right away.
    pub fn finish_game(&self, court_id: CourtId) -> SchedulerResult<Outcome<Vec<PlayerRecord>>> {
        let outcome = self.store.remove_all_from_court(court_id)?;
        if let Outcome::Applied(requeued) = &outcome {
            info!(court_id, requeued = requeued.len(), "game finished");
            self.triggers.on_court_cleared(court_id);
        }
        Ok(outcome)
    }

    /// Seat a queued player by hand. Manual seats follow the strict club
    /// rule: training courts or the player's own level only.
    pub fn assign_player(
        &self,
        player_id: PlayerId,
        court_id: CourtId,
    ) -> SchedulerResult<Outcome<Seating>> {
        let outcome = self
            .store
            .move_player_to_court(player_id, court_id, Admission::Strict)?;
        if let Outcome::Applied(seating) = &outcome {
            info!(player_id, court_id, court = %seating.court.name, "player assigned manually");
        }
        Ok(outcome)
    }

    /// Take a player off its court and back to the tail of its queue.
    pub fn release_player(&self, player_id: PlayerId) -> SchedulerResult<Outcome<PlayerRecord>> {
        let Some(player) = self.store.get_player(player_id)? else {
            return Ok(Outcome::Rejected(Rejection::PlayerNotFound(player_id)));
        };
        let left = player.court_id;
        let outcome = self.store.move_player_to_queue(player_id, player.qualification)?;
        if let (Outcome::Applied(_), Some(court_id)) = (&outcome, left) {
            info!(player_id, court_id, "player released to queue");
            self.triggers.on_court_cleared(court_id);
        }
        Ok(outcome)
    }

    pub fn reorder_queue(
        &self,
        qualification: Qualification,
        order: &[PlayerId],
    ) -> SchedulerResult<Outcome<Vec<PlayerRecord>>> {
        Ok(self.store.reorder_queue(qualification, order)?)
    }
}
