//! courtq-state: the roster store for the club's courts and queues.
//!
//! Backed by [redb](https://docs.rs/redb), holds player and court records
//! and exposes the read/write primitives the assignment engine relies on.
//!
//! # Architecture
//!
//! All records are JSON-serialized into redb's `&[u8]` value columns,
//! keyed by numeric id. A player's queue membership is not stored
//! separately: a player is queued when it is active and has no court,
//! and the queue order is its `seq` stamp. Court occupants are the
//! active players pointing at the court.
//!
//! Every move is a single redb write transaction. redb runs one write
//! transaction at a time, so moves never interleave below "one full
//! move". Snapshots are a single read transaction and therefore always
//! internally consistent.
//!
//! The `RosterStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod snapshot;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use snapshot::*;
pub use store::RosterStore;
pub use types::*;
