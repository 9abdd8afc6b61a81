//! Placement engine: proposes seats for queued players.
//!
//! Given a snapshot, the planner walks the tiers from [`TIERS`] in order.
//! Within a tier, courts of the tier's type are visited by id and players
//! are taken from the head of the tier's queue, one per free slot. Free
//! slots are consumed as placements are proposed, so a plan never
//! over-commits a court.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::debug;

use courtq_state::{AssignmentKind, CourtId, PlayerId, Qualification, QueuedPlayer, RosterSnapshot};

use crate::eligibility::TIERS;

/// A proposed seat for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub player_id: PlayerId,
    /// Qualification as of the snapshot.
    pub qualification: Qualification,
    pub court_id: CourtId,
    pub kind: AssignmentKind,
}

/// Ordered placements plus what is left waiting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentPlan {
    pub placements: Vec<Placement>,
    pub remaining_advanced: usize,
    pub remaining_intermediate: usize,
}

impl AssignmentPlan {
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn remaining(&self, qualification: Qualification) -> usize {
        match qualification {
            Qualification::Advanced => self.remaining_advanced,
            Qualification::Intermediate => self.remaining_intermediate,
        }
    }
}

/// Compute the placements for one pass over `snapshot`.
///
/// Deterministic: the same snapshot always yields the same plan.
pub fn compute_plan(snapshot: &RosterSnapshot) -> AssignmentPlan {
    let mut queues: HashMap<Qualification, VecDeque<&QueuedPlayer>> = Qualification::ALL
        .into_iter()
        .map(|q| (q, snapshot.queue(q).iter().collect()))
        .collect();
    let mut free: HashMap<CourtId, u32> = snapshot
        .courts
        .iter()
        .map(|c| (c.id, c.free_slots()))
        .collect();

    let mut courts: Vec<_> = snapshot.courts.iter().collect();
    courts.sort_by_key(|c| c.id);

    let mut placements = Vec::new();

    for tier in TIERS {
        let Some(queue) = queues.get_mut(&tier.queue) else {
            continue;
        };
        for court in courts.iter().filter(|c| c.court_type == tier.court_type) {
            let slots = free.entry(court.id).or_insert(0);
            while *slots > 0 {
                let Some(player) = queue.pop_front() else {
                    break;
                };
                *slots -= 1;
                debug!(
                    player = player.id,
                    court = court.id,
                    kind = %tier.kind,
                    "placement proposed"
                );
                placements.push(Placement {
                    player_id: player.id,
                    qualification: player.qualification,
                    court_id: court.id,
                    kind: tier.kind,
                });
            }
        }
    }

    let remaining = |q: Qualification| queues.get(&q).map_or(0, VecDeque::len);
    AssignmentPlan {
        remaining_advanced: remaining(Qualification::Advanced),
        remaining_intermediate: remaining(Qualification::Intermediate),
        placements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtq_state::{COURT_CAPACITY, CourtType, CourtView, PlayerRef};

    fn queued(id: PlayerId, q: Qualification) -> QueuedPlayer {
        QueuedPlayer {
            id,
            name: format!("P{id}"),
            qualification: q,
        }
    }

    fn court(id: CourtId, court_type: CourtType, seated: u32) -> CourtView {
        CourtView {
            id,
            name: format!("Court {id}"),
            court_type,
            capacity: COURT_CAPACITY,
            occupants: (0..seated)
                .map(|i| PlayerRef {
                    id: 1000 + id * 10 + u64::from(i),
                    name: "seated".to_string(),
                    qualification: Qualification::Advanced,
                })
                .collect(),
        }
    }

    fn snapshot(
        advanced: &[PlayerId],
        intermediate: &[PlayerId],
        courts: Vec<CourtView>,
    ) -> RosterSnapshot {
        RosterSnapshot {
            advanced_queue: advanced
                .iter()
                .map(|&id| queued(id, Qualification::Advanced))
                .collect(),
            intermediate_queue: intermediate
                .iter()
                .map(|&id| queued(id, Qualification::Intermediate))
                .collect(),
            courts,
            anomalies: Vec::new(),
        }
    }

    fn seats(plan: &AssignmentPlan) -> Vec<(PlayerId, CourtId, AssignmentKind)> {
        plan.placements
            .iter()
            .map(|p| (p.player_id, p.court_id, p.kind))
            .collect()
    }

    #[test]
    fn advanced_pair_fills_empty_advanced_court() {
        let snap = snapshot(&[1, 2], &[], vec![court(1, CourtType::Advanced, 0)]);
        let plan = compute_plan(&snap);
        assert_eq!(
            seats(&plan),
            vec![(1, 1, AssignmentKind::Perfect), (2, 1, AssignmentKind::Perfect)]
        );
        assert_eq!(plan.remaining_advanced, 0);
        assert_eq!(plan.remaining_intermediate, 0);
    }

    #[test]
    fn advanced_overflows_onto_intermediate_court() {
        let snap = snapshot(
            &[3],
            &[],
            vec![court(1, CourtType::Advanced, 4), court(2, CourtType::Intermediate, 2)],
        );
        let plan = compute_plan(&snap);
        assert_eq!(seats(&plan), vec![(3, 2, AssignmentKind::Overflow)]);
    }

    #[test]
    fn intermediate_never_plays_up() {
        let snap = snapshot(&[], &[5, 6], vec![court(1, CourtType::Advanced, 0)]);
        let plan = compute_plan(&snap);
        assert!(plan.is_empty());
        assert_eq!(plan.remaining_intermediate, 2);
    }

    #[test]
    fn training_slot_goes_to_advanced_head_first() {
        let snap = snapshot(&[4], &[5], vec![court(1, CourtType::Training, 3)]);
        let plan = compute_plan(&snap);
        assert_eq!(seats(&plan), vec![(4, 1, AssignmentKind::Training)]);
        assert_eq!(plan.remaining_intermediate, 1);
        assert_eq!(plan.remaining_advanced, 0);
    }

    #[test]
    fn training_absorbs_before_overflow() {
        // One advanced player, a training slot and an intermediate slot:
        // training wins because it is considered first.
        let snap = snapshot(
            &[7],
            &[],
            vec![court(1, CourtType::Intermediate, 0), court(2, CourtType::Training, 0)],
        );
        let plan = compute_plan(&snap);
        assert_eq!(seats(&plan), vec![(7, 2, AssignmentKind::Training)]);
    }

    #[test]
    fn perfect_intermediates_take_their_court_before_advanced_overflow() {
        let snap = snapshot(
            &[1, 2, 3],
            &[10, 11],
            vec![court(1, CourtType::Advanced, 2), court(2, CourtType::Intermediate, 0)],
        );
        let plan = compute_plan(&snap);
        assert_eq!(
            seats(&plan),
            vec![
                (1, 1, AssignmentKind::Perfect),
                (2, 1, AssignmentKind::Perfect),
                (10, 2, AssignmentKind::Perfect),
                (11, 2, AssignmentKind::Perfect),
                (3, 2, AssignmentKind::Overflow),
            ]
        );
    }

    #[test]
    fn courts_visited_by_id_and_never_overcommitted() {
        let snap = snapshot(
            &[1, 2, 3, 4, 5, 6, 7],
            &[],
            vec![court(2, CourtType::Advanced, 1), court(9, CourtType::Advanced, 0)],
        );
        let plan = compute_plan(&snap);
        let on_2 = plan.placements.iter().filter(|p| p.court_id == 2).count();
        let on_9 = plan.placements.iter().filter(|p| p.court_id == 9).count();
        assert_eq!((on_2, on_9), (3, 4));
        assert_eq!(plan.placements[0].court_id, 2);
        assert_eq!(plan.remaining_advanced, 0);
    }

    #[test]
    fn excess_players_stay_queued_in_order() {
        let snap = snapshot(&[1, 2, 3, 4, 5, 6], &[], vec![court(1, CourtType::Advanced, 0)]);
        let plan = compute_plan(&snap);
        let placed: Vec<_> = plan.placements.iter().map(|p| p.player_id).collect();
        assert_eq!(placed, vec![1, 2, 3, 4]);
        assert_eq!(plan.remaining_advanced, 2);
    }

    #[test]
    fn queue_order_is_never_skipped_within_a_tier() {
        let queue: Vec<PlayerId> = (1..=11).collect();
        let snap = snapshot(
            &queue,
            &[],
            vec![
                court(1, CourtType::Advanced, 3),
                court(2, CourtType::Training, 2),
                court(3, CourtType::Intermediate, 1),
            ],
        );
        let plan = compute_plan(&snap);
        let placed: Vec<_> = plan.placements.iter().map(|p| p.player_id).collect();
        // Whatever gets placed is always a prefix of the queue.
        assert_eq!(placed, queue[..placed.len()].to_vec());
        assert_eq!(placed.len(), 1 + 2 + 3);
    }

    #[test]
    fn full_and_zero_capacity_courts_are_skipped() {
        let mut zero = court(2, CourtType::Advanced, 0);
        zero.capacity = 0;
        let snap = snapshot(&[1], &[], vec![court(1, CourtType::Advanced, 4), zero]);
        let plan = compute_plan(&snap);
        assert!(plan.is_empty());
        assert_eq!(plan.remaining(Qualification::Advanced), 1);
    }

    #[test]
    fn empty_snapshot_gives_empty_plan() {
        let plan = compute_plan(&RosterSnapshot::default());
        assert_eq!(plan, AssignmentPlan::default());
    }

    #[test]
    fn plan_is_deterministic() {
        let snap = snapshot(
            &[1, 2, 3, 4, 5],
            &[6, 7, 8],
            vec![
                court(3, CourtType::Training, 1),
                court(1, CourtType::Intermediate, 2),
                court(2, CourtType::Advanced, 3),
            ],
        );
        let first = compute_plan(&snap);
        for _ in 0..10 {
            assert_eq!(compute_plan(&snap), first);
        }
        let json = serde_json::to_string(&first).unwrap();
        assert!(json.contains("\"kind\":\"perfect\""));
    }
}
