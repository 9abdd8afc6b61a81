//! Courtq assignment planner: which queued players go onto which courts.
//!
//! This crate is pure: it reads a [`RosterSnapshot`](courtq_state::RosterSnapshot)
//! and proposes placements. It never touches the store; applying a plan
//! is the executor's job in `courtq-scheduler`.
//!
//! # Components
//!
//! - **`eligibility`**: which court types each tier may use, and how a
//!   placement is classified
//! - **`planner`**: tiered placement in queue order

pub mod eligibility;
pub mod planner;

pub use eligibility::{Tier, TIERS, kind_for};
pub use planner::{AssignmentPlan, Placement, compute_plan};
