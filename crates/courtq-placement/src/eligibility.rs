//! Court eligibility per planning tier.
//!
//! The planner runs these tiers in order. Each tier pairs one queue with
//! one court type:
//!
//! ```text
//! 1. perfect   advanced     → advanced courts
//!              intermediate → intermediate courts
//! 2. training  advanced     → training courts
//!              intermediate → training courts
//! 3. overflow  advanced     → intermediate courts
//! ```
//!
//! Intermediate players are never proposed for advanced courts.

use courtq_state::{AssignmentKind, CourtType, Qualification};

/// One queue draining into one court type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub queue: Qualification,
    pub court_type: CourtType,
    pub kind: AssignmentKind,
}

/// Tiers in planning order.
pub const TIERS: [Tier; 5] = [
    Tier {
        queue: Qualification::Advanced,
        court_type: CourtType::Advanced,
        kind: AssignmentKind::Perfect,
    },
    Tier {
        queue: Qualification::Intermediate,
        court_type: CourtType::Intermediate,
        kind: AssignmentKind::Perfect,
    },
    Tier {
        queue: Qualification::Advanced,
        court_type: CourtType::Training,
        kind: AssignmentKind::Training,
    },
    Tier {
        queue: Qualification::Intermediate,
        court_type: CourtType::Training,
        kind: AssignmentKind::Training,
    },
    Tier {
        queue: Qualification::Advanced,
        court_type: CourtType::Intermediate,
        kind: AssignmentKind::Overflow,
    },
];

/// Classify a seat, or `None` if the court type never admits the tier.
pub fn kind_for(court_type: CourtType, qualification: Qualification) -> Option<AssignmentKind> {
    TIERS
        .iter()
        .find(|t| t.court_type == court_type && t.queue == qualification)
        .map(|t| t.kind)
}
