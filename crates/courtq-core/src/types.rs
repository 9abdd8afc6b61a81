//! Shared domain vocabulary: identifiers, skill tiers, court types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identity of a registered player.
pub type PlayerId = u64;

/// Stable identity of a physical court.
pub type CourtId = u64;

/// Every court seats a doubles game.
pub const COURT_CAPACITY: u32 = 4;

/// A player's skill tier. Also names the queue the player waits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualification {
    Advanced,
    Intermediate,
}

impl Qualification {
    /// Both tiers, in the order the planner considers their queues.
    pub const ALL: [Qualification; 2] = [Qualification::Advanced, Qualification::Intermediate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Qualification::Advanced => "advanced",
            Qualification::Intermediate => "intermediate",
        }
    }
}

/// What a court is reserved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtType {
    Advanced,
    Intermediate,
    /// Mixed-level practice; admits either tier.
    Training,
}

impl CourtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourtType::Advanced => "advanced",
            CourtType::Intermediate => "intermediate",
            CourtType::Training => "training",
        }
    }
}

/// Which placements a write is allowed to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// Assignment engine: exact match, training, and advanced overflow
    /// onto intermediate courts.
    Engine,
    /// Manual operator move: exact match or training only.
    Strict,
}

impl Admission {
    /// Whether a court of `court_type` may seat a player of `qualification`.
    ///
    /// Intermediate players never go onto advanced courts under any rule.
    pub fn permits(&self, court_type: CourtType, qualification: Qualification) -> bool {
        match (court_type, qualification) {
            (CourtType::Training, _) => true,
            (CourtType::Advanced, Qualification::Advanced) => true,
            (CourtType::Advanced, Qualification::Intermediate) => false,
            (CourtType::Intermediate, Qualification::Intermediate) => true,
            (CourtType::Intermediate, Qualification::Advanced) => *self == Admission::Engine,
        }
    }
}

/// Why a player ended up on a given court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    /// Court type equals the player's qualification.
    Perfect,
    /// Placed on a mixed training court.
    Training,
    /// Advanced player playing down on an intermediate court.
    Overflow,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::Perfect => "perfect",
            AssignmentKind::Training => "training",
            AssignmentKind::Overflow => "overflow",
        }
    }
}

/// Returned when parsing an unknown tier or court type name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseKindError {
    kind: &'static str,
    value: String,
}

impl FromStr for Qualification {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advanced" | "a" => Ok(Qualification::Advanced),
            "intermediate" | "i" => Ok(Qualification::Intermediate),
            other => Err(ParseKindError {
                kind: "qualification",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for CourtType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advanced" => Ok(CourtType::Advanced),
            "intermediate" => Ok(CourtType::Intermediate),
            "training" => Ok(CourtType::Training),
            other => Err(ParseKindError {
                kind: "court type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Qualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CourtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
