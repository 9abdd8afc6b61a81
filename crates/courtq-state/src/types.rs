//! Persisted records and move outcomes for the roster store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use courtq_core::{
    Admission, AssignmentKind, COURT_CAPACITY, CourtId, CourtType, PlayerId, Qualification,
};

// ── Player ─────────────────────────────────────────────────────────

/// A registered club member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub qualification: Qualification,
    /// Inactive players are in neither a queue nor on a court.
    pub active: bool,
    /// Court the player currently occupies.
    pub court_id: Option<CourtId>,
    /// Order stamp, renewed whenever the player joins a queue or takes a
    /// seat. Queue order and seating order both sort by it.
    pub seq: u64,
    /// Unix timestamp (seconds) of registration.
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last change.
    pub updated_at: u64,
}

impl PlayerRecord {
    /// Waiting in its qualification's queue.
    pub fn is_queued(&self) -> bool {
        self.active && self.court_id.is_none()
    }
}

// ── Court ──────────────────────────────────────────────────────────

/// A physical court.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourtRecord {
    pub id: CourtId,
    pub name: String,
    pub court_type: CourtType,
    pub capacity: u32,
    pub created_at: u64,
    pub updated_at: u64,
}

// ── Outcomes ───────────────────────────────────────────────────────

/// Result of a roster write that may lose a race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Rejected(reason) => Some(reason),
        }
    }
}

/// Why a roster write was refused. These are expected under contention.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("court {0} not found")]
    CourtNotFound(CourtId),

    #[error("player {0} is not active")]
    PlayerInactive(PlayerId),

    #[error("player {player} is already on court {court}")]
    AlreadySeated { player: PlayerId, court: CourtId },

    #[error("court {0} is full")]
    CourtFull(CourtId),

    #[error("{court_type} court {court} does not admit {qualification} player {player}")]
    NotAdmitted {
        player: PlayerId,
        qualification: Qualification,
        court: CourtId,
        court_type: CourtType,
    },

    #[error("player {player} is {qualification}, not {requested}")]
    QueueMismatch {
        player: PlayerId,
        qualification: Qualification,
        requested: Qualification,
    },

    #[error("player {0} is not waiting in that queue")]
    NotQueued(PlayerId),

    #[error("player {0} appears more than once")]
    DuplicatePlayer(PlayerId),
}

/// A completed player → court move, with the records as committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seating {
    pub player: PlayerRecord,
    pub court: CourtRecord,
}

/// Result of toggling a player's active flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityChange {
    pub player: PlayerRecord,
    /// True only for an inactive → active transition.
    pub activated: bool,
}
