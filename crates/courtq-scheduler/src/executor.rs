//! Assignment executor: applies an [`AssignmentPlan`] to the roster.
//!
//! Placements are applied one at a time, in plan order. Each one is
//! re-validated by the store against live records, so a placement that
//! went stale since planning (court filled by an operator, player moved
//! or deactivated) is skipped without affecting the rest of the plan.
//! Skipped players keep their queue position and are reconsidered next
//! cycle.

use serde::Serialize;
use tracing::{debug, error, info};

use courtq_placement::{AssignmentPlan, kind_for};
use courtq_state::{
    Admission, CourtId, Outcome, PlayerId, Qualification, Rejection, RosterStore, StateError,
};

use crate::notify::AssignmentNotice;

/// A placement the store refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPlacement {
    pub player_id: PlayerId,
    pub qualification: Qualification,
    pub court_id: CourtId,
    pub reason: Rejection,
}

/// Result of executing a plan.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    pub applied: Vec<AssignmentNotice>,
    pub skipped: Vec<SkippedPlacement>,
    /// Store failure that stopped execution. Placements before it stay applied.
    pub interrupted: Option<StateError>,
}

impl ExecutionResult {
    pub fn skipped_count(&self, qualification: Qualification) -> usize {
        self.skipped
            .iter()
            .filter(|s| s.qualification == qualification)
            .count()
    }
}

/// Apply `plan` against `store`, one placement per write transaction.
pub fn execute(plan: &AssignmentPlan, store: &RosterStore) -> ExecutionResult {
    let mut result = ExecutionResult::default();

    for placement in &plan.placements {
        let outcome = store.move_player_to_court(
            placement.player_id,
            placement.court_id,
            Admission::Engine,
        );
        match outcome {
            Ok(Outcome::Applied(seating)) => {
                // Court type and player tier may both have changed since
                // planning; report what was actually committed.
                let qualification = seating.player.qualification;
                let kind = kind_for(seating.court.court_type, qualification)
                    .unwrap_or(placement.kind);
                info!(
                    player = %seating.player.name,
                    court = %seating.court.name,
                    %kind,
                    "placement applied"
                );
                result.applied.push(AssignmentNotice {
                    player_id: seating.player.id,
                    player_name: seating.player.name,
                    qualification,
                    court_id: seating.court.id,
                    court_name: seating.court.name,
                    court_type: seating.court.court_type,
                    assignment_kind: kind,
                });
            }
            Ok(Outcome::Rejected(reason)) => {
                debug!(
                    player_id = placement.player_id,
                    court_id = placement.court_id,
                    %reason,
                    "placement skipped"
                );
                result.skipped.push(SkippedPlacement {
                    player_id: placement.player_id,
                    qualification: placement.qualification,
                    court_id: placement.court_id,
                    reason,
                });
            }
            Err(e) => {
                error!(
                    player_id = placement.player_id,
                    court_id = placement.court_id,
                    error = %e,
                    "store failure, abandoning rest of plan"
                );
                result.interrupted = Some(e);
                break;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtq_placement::compute_plan;
    use courtq_state::{AssignmentKind, CourtType};

    fn test_store() -> RosterStore {
        RosterStore::open_in_memory().unwrap()
    }

    #[test]
    fn applies_plan_in_order() {
        let store = test_store();
        let court = store.add_court("Centre", CourtType::Advanced).unwrap();
        let p1 = store.add_player("P1", Qualification::Advanced).unwrap();
        let p2 = store.add_player("P2", Qualification::Advanced).unwrap();

        let plan = compute_plan(&store.snapshot().unwrap());
        let result = execute(&plan, &store);

        let ids: Vec<_> = result.applied.iter().map(|a| a.player_id).collect();
        assert_eq!(ids, vec![p1.id, p2.id]);
        assert!(result.skipped.is_empty());
        assert!(result.interrupted.is_none());
        assert_eq!(result.applied[0].court_name, "Centre");
        assert_eq!(result.applied[0].assignment_kind, AssignmentKind::Perfect);
        assert!(store.get_queue(Qualification::Advanced).unwrap().is_empty());
    }

    #[test]
    fn stale_placement_is_skipped_and_rest_applied() {
        let store = test_store();
        let c1 = store.add_court("C1", CourtType::Advanced).unwrap();
        let c2 = store.add_court("C2", CourtType::Intermediate).unwrap();
        let a = store.add_player("A", Qualification::Advanced).unwrap();
        let i = store.add_player("I", Qualification::Intermediate).unwrap();

        let plan = compute_plan(&store.snapshot().unwrap());
        assert_eq!(plan.placements.len(), 2);

        // An operator deactivates A between planning and execution.
        store.set_player_active(a.id, false).unwrap();

        let result = execute(&plan, &store);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].player_id, a.id);
        assert_eq!(result.skipped[0].reason, Rejection::PlayerInactive(a.id));
        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.applied[0].player_id, i.id);
        assert_eq!(result.applied[0].court_id, c2.id);
        assert!(store.court_occupants(c1.id).unwrap().is_empty());
    }

    #[test]
    fn court_filled_in_the_interim_is_not_overfilled() {
        let store = test_store();
        let court = store.add_court("C", CourtType::Training).unwrap();
        let queued: Vec<_> = (0..4)
            .map(|n| store.add_player(&format!("q{n}"), Qualification::Intermediate).unwrap())
            .collect();
        let plan = compute_plan(&store.snapshot().unwrap());
        assert_eq!(plan.placements.len(), 4);

        // Manual seats take two of the four slots.
        for n in 0..2 {
            let walk_in = store.add_player(&format!("w{n}"), Qualification::Advanced).unwrap();
            store
                .move_player_to_court(walk_in.id, court.id, Admission::Strict)
                .unwrap();
        }

        let result = execute(&plan, &store);
        assert_eq!(result.applied.len(), 2);
        assert_eq!(result.skipped_count(Qualification::Intermediate), 2);
        assert!(result
            .skipped
            .iter()
            .all(|s| s.reason == Rejection::CourtFull(court.id)));
        assert_eq!(store.court_occupants(court.id).unwrap().len(), 4);

        // Skipped players are still at the head of their queue.
        let queue = store.get_queue(Qualification::Intermediate).unwrap();
        let ids: Vec<_> = queue.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![queued[2].id, queued[3].id]);
    }

    #[test]
    fn kind_follows_court_retype() {
        let store = test_store();
        let court = store.add_court("C", CourtType::Advanced).unwrap();
        store.add_player("A", Qualification::Advanced).unwrap();
        let plan = compute_plan(&store.snapshot().unwrap());

        store.set_court_type(court.id, CourtType::Training).unwrap();

        let result = execute(&plan, &store);
        assert_eq!(result.applied[0].assignment_kind, AssignmentKind::Training);
        assert_eq!(result.applied[0].court_type, CourtType::Training);
    }

    #[test]
    fn notice_uses_live_qualification() {
        let store = test_store();
        let court = store.add_court("Int", CourtType::Intermediate).unwrap();
        let p = store.add_player("I", Qualification::Intermediate).unwrap();
        let plan = compute_plan(&store.snapshot().unwrap());
        assert_eq!(plan.placements[0].kind, AssignmentKind::Perfect);

        store
            .set_player_qualification(p.id, Qualification::Advanced)
            .unwrap();

        let result = execute(&plan, &store);
        let notice = &result.applied[0];
        assert_eq!(notice.court_id, court.id);
        assert_eq!(notice.qualification, Qualification::Advanced);
        assert_eq!(notice.assignment_kind, AssignmentKind::Overflow);
    }

    #[test]
    fn empty_plan_touches_nothing() {
        let store = test_store();
        store.add_court("C", CourtType::Advanced).unwrap();
        let before = store.snapshot().unwrap();

        let result = execute(&AssignmentPlan::default(), &store);
        assert!(result.applied.is_empty());
        assert!(result.skipped.is_empty());
        assert_eq!(store.snapshot().unwrap(), before);
    }
}
