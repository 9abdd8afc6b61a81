//! courtq-scheduler: keeps the club's courts filled from the queues.
//!
//! Runs planning + execution cycles against the roster store. The
//! scheduler:
//!
//! - Snapshots the roster and asks the planner for placements
//! - Applies placements one at a time, skipping any that went stale
//! - Reports every applied placement to a notifier
//! - Re-runs on a fixed interval and whenever a trigger fires, never
//!   running two cycles at once
//!
//! # Architecture
//!
//! ```text
//! AssignmentLoop (periodic tick + coalesced triggers)
//!   └── AssignmentEngine::run_cycle
//!       ├── RosterStore::snapshot      (one read transaction)
//!       ├── courtq_placement::compute_plan
//!       ├── executor::execute          (one write transaction per placement)
//!       └── Notifier::notify           (CycleReport)
//!
//! ClubDesk (operator actions) ── writes RosterStore ── fires TriggerHandle
//! ```

pub mod desk;
pub mod engine;
pub mod error;
pub mod executor;
pub mod notify;
pub mod scheduler;
pub mod trigger;

pub use desk::ClubDesk;
pub use engine::AssignmentEngine;
pub use error::{SchedulerError, SchedulerResult};
pub use executor::{ExecutionResult, SkippedPlacement, execute};
pub use notify::{AssignmentNotice, BroadcastNotifier, CycleReport, LogNotifier, Notifier};
pub use scheduler::{AssignmentLoop, LoopState, MAX_INTERVAL, MIN_INTERVAL};
pub use trigger::{Trigger, TriggerHandle};
