//! redb table definitions for the roster store.
//!
//! Record tables use `u64` id keys and `&[u8]` values (JSON-serialized records).

use redb::TableDefinition;

/// Player records keyed by player id.
pub const PLAYERS: TableDefinition<u64, &[u8]> = TableDefinition::new("players");

/// Court records keyed by court id.
pub const COURTS: TableDefinition<u64, &[u8]> = TableDefinition::new("courts");

/// Monotonic counters keyed by name.
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

pub const NEXT_PLAYER_ID: &str = "next_player_id";
pub const NEXT_COURT_ID: &str = "next_court_id";
/// Source of queue and seating order stamps.
pub const NEXT_SEQ: &str = "next_seq";
