//! RosterStore: redb-backed player and court records for the club.
//!
//! Provides the read primitives the planner snapshots and the move
//! primitives the executor and operators write through. All values are
//! JSON-serialized into redb's `&[u8]` value columns. The store supports
//! both on-disk and in-memory backends (the latter for testing).
//!
//! Each move runs in exactly one write transaction and re-checks the live
//! records before writing, so a move planned against stale data is
//! rejected rather than applied twice or onto a full court.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::snapshot::RosterSnapshot;
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Serialize a record and insert it under its own id.
macro_rules! put {
    ($table:expr, $record:expr) => {{
        let value = serde_json::to_vec($record).map_err(map_err!(Serialize))?;
        $table
            .insert($record.id, value.as_slice())
            .map_err(map_err!(Write))?;
    }};
}

/// Thread-safe roster store backed by redb.
#[derive(Clone)]
pub struct RosterStore {
    db: Arc<Database>,
}

impl RosterStore {
    /// Open (or create) a persistent roster at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "roster store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory roster (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory roster store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PLAYERS).map_err(map_err!(Table))?;
        txn.open_table(COURTS).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Run `f` in one write transaction: commit when it applies, abort
    /// when it rejects or fails.
    fn write<T>(
        &self,
        f: impl FnOnce(&WriteTransaction) -> StateResult<Outcome<T>>,
    ) -> StateResult<Outcome<T>> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let outcome = f(&txn)?;
        match &outcome {
            Outcome::Applied(_) => txn.commit().map_err(map_err!(Transaction))?,
            Outcome::Rejected(reason) => {
                debug!(%reason, "roster write rejected");
                txn.abort().map_err(map_err!(Transaction))?;
            }
        }
        Ok(outcome)
    }

    /// Read every player and court in one read transaction.
    fn read_all(&self) -> StateResult<(Vec<PlayerRecord>, Vec<CourtRecord>)> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let players = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
        let courts = txn.open_table(COURTS).map_err(map_err!(Table))?;
        Ok((all_records(&players)?, all_records(&courts)?))
    }

    // ── Registration ───────────────────────────────────────────────

    /// Create a court with the standard capacity.
    pub fn add_court(&self, name: &str, court_type: CourtType) -> StateResult<CourtRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id = next_counter(&txn, NEXT_COURT_ID)?;
        let now = epoch_secs();
        let court = CourtRecord {
            id,
            name: name.to_string(),
            court_type,
            capacity: COURT_CAPACITY,
            created_at: now,
            updated_at: now,
        };
        {
            let mut table = txn.open_table(COURTS).map_err(map_err!(Table))?;
            put!(table, &court);
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(court_id = id, name, %court_type, "court added");
        Ok(court)
    }

    /// Register an active player at the tail of its qualification's queue.
    pub fn add_player(&self, name: &str, qualification: Qualification) -> StateResult<PlayerRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id = next_counter(&txn, NEXT_PLAYER_ID)?;
        let seq = next_counter(&txn, NEXT_SEQ)?;
        let now = epoch_secs();
        let player = PlayerRecord {
            id,
            name: name.to_string(),
            qualification,
            active: true,
            court_id: None,
            seq,
            created_at: now,
            updated_at: now,
        };
        {
            let mut table = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
            put!(table, &player);
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(player_id = id, name, %qualification, "player registered");
        Ok(player)
    }

    /// Delete a player wherever it is. Returns true if it existed.
    pub fn delete_player(&self, player_id: PlayerId) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
            existed = table.remove(player_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(player_id, existed, "player deleted");
        Ok(existed)
    }

    // ── Reads ──────────────────────────────────────────────────────

    pub fn get_player(&self, player_id: PlayerId) -> StateResult<Option<PlayerRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
        get_record(&table, player_id)
    }

    pub fn get_court(&self, court_id: CourtId) -> StateResult<Option<CourtRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(COURTS).map_err(map_err!(Table))?;
        get_record(&table, court_id)
    }

    /// All players, active or not, by id.
    pub fn list_players(&self) -> StateResult<Vec<PlayerRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
        all_records(&table)
    }

    /// Active players, queued or seated, in order of their last move.
    pub fn get_active_players(&self) -> StateResult<Vec<PlayerRecord>> {
        let mut players: Vec<PlayerRecord> = self
            .list_players()?
            .into_iter()
            .filter(|p| p.active)
            .collect();
        players.sort_by_key(|p| (p.seq, p.id));
        Ok(players)
    }

    /// All courts, by id.
    pub fn get_courts(&self) -> StateResult<Vec<CourtRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(COURTS).map_err(map_err!(Table))?;
        all_records(&table)
    }

    /// One queue, head first.
    pub fn get_queue(&self, qualification: Qualification) -> StateResult<Vec<PlayerRecord>> {
        let mut queue: Vec<PlayerRecord> = self
            .list_players()?
            .into_iter()
            .filter(|p| p.is_queued() && p.qualification == qualification)
            .collect();
        queue.sort_by_key(|p| (p.seq, p.id));
        Ok(queue)
    }

    /// Players seated on a court, in seating order.
    pub fn court_occupants(&self, court_id: CourtId) -> StateResult<Vec<PlayerRecord>> {
        let mut seated: Vec<PlayerRecord> = self
            .list_players()?
            .into_iter()
            .filter(|p| p.active && p.court_id == Some(court_id))
            .collect();
        seated.sort_by_key(|p| (p.seq, p.id));
        Ok(seated)
    }

    /// True when no players and no courts have been created.
    pub fn is_empty(&self) -> StateResult<bool> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let players = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
        let courts = txn.open_table(COURTS).map_err(map_err!(Table))?;
        Ok(players.first().map_err(map_err!(Read))?.is_none()
            && courts.first().map_err(map_err!(Read))?.is_none())
    }

    /// Queues and courts as of a single read transaction.
    pub fn snapshot(&self) -> StateResult<RosterSnapshot> {
        let (players, courts) = self.read_all()?;
        Ok(RosterSnapshot::build(players, courts))
    }

    // ── Moves ──────────────────────────────────────────────────────

    /// Seat a queued player on a court.
    ///
    /// Re-validates against the live records: the player must still be
    /// active and queued, the court must exist, admit the player under
    /// `admission`, and have a free slot.
    pub fn move_player_to_court(
        &self,
        player_id: PlayerId,
        court_id: CourtId,
        admission: Admission,
    ) -> StateResult<Outcome<Seating>> {
        self.write(|txn| {
            let mut players = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
            let courts = txn.open_table(COURTS).map_err(map_err!(Table))?;

            let Some(mut player) = get_record::<PlayerRecord>(&players, player_id)? else {
                return Ok(Outcome::Rejected(Rejection::PlayerNotFound(player_id)));
            };
            let Some(court) = get_record::<CourtRecord>(&courts, court_id)? else {
                return Ok(Outcome::Rejected(Rejection::CourtNotFound(court_id)));
            };
            if !player.active {
                return Ok(Outcome::Rejected(Rejection::PlayerInactive(player_id)));
            }
            if let Some(current) = player.court_id {
                return Ok(Outcome::Rejected(Rejection::AlreadySeated {
                    player: player_id,
                    court: current,
                }));
            }
            if !admission.permits(court.court_type, player.qualification) {
                return Ok(Outcome::Rejected(Rejection::NotAdmitted {
                    player: player_id,
                    qualification: player.qualification,
                    court: court_id,
                    court_type: court.court_type,
                }));
            }
            let seated = all_records::<PlayerRecord>(&players)?
                .iter()
                .filter(|p| p.active && p.court_id == Some(court_id))
                .count() as u32;
            if seated >= court.capacity {
                return Ok(Outcome::Rejected(Rejection::CourtFull(court_id)));
            }

            player.court_id = Some(court_id);
            player.seq = next_counter(txn, NEXT_SEQ)?;
            player.updated_at = epoch_secs();
            put!(players, &player);
            debug!(player_id, court_id, seated = seated + 1, "player seated");
            Ok(Outcome::Applied(Seating { player, court }))
        })
    }

    /// Put a player back at the tail of its queue, leaving its court.
    ///
    /// `qualification` names the queue; it must match the player's own.
    /// A player already waiting keeps its position.
    pub fn move_player_to_queue(
        &self,
        player_id: PlayerId,
        qualification: Qualification,
    ) -> StateResult<Outcome<PlayerRecord>> {
        self.write(|txn| {
            let mut players = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
            let Some(mut player) = get_record::<PlayerRecord>(&players, player_id)? else {
                return Ok(Outcome::Rejected(Rejection::PlayerNotFound(player_id)));
            };
            if !player.active {
                return Ok(Outcome::Rejected(Rejection::PlayerInactive(player_id)));
            }
            if player.qualification != qualification {
                return Ok(Outcome::Rejected(Rejection::QueueMismatch {
                    player: player_id,
                    qualification: player.qualification,
                    requested: qualification,
                }));
            }
            if player.court_id.is_none() {
                return Ok(Outcome::Applied(player));
            }

            let left = player.court_id.take();
            player.seq = next_counter(txn, NEXT_SEQ)?;
            player.updated_at = epoch_secs();
            put!(players, &player);
            debug!(player_id, court_id = ?left, "player returned to queue");
            Ok(Outcome::Applied(player))
        })
    }

    /// Send every occupant of a court to the tail of its queue, keeping
    /// their seating order. Returns the requeued players.
    pub fn remove_all_from_court(&self, court_id: CourtId) -> StateResult<Outcome<Vec<PlayerRecord>>> {
        self.write(|txn| {
            let mut players = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
            let courts = txn.open_table(COURTS).map_err(map_err!(Table))?;
            if get_record::<CourtRecord>(&courts, court_id)?.is_none() {
                return Ok(Outcome::Rejected(Rejection::CourtNotFound(court_id)));
            }

            let mut seated: Vec<PlayerRecord> = all_records::<PlayerRecord>(&players)?
                .into_iter()
                .filter(|p| p.court_id == Some(court_id))
                .collect();
            seated.sort_by_key(|p| (p.seq, p.id));

            let now = epoch_secs();
            let mut requeued = Vec::with_capacity(seated.len());
            for mut player in seated {
                player.court_id = None;
                player.updated_at = now;
                // Inactive holders are released without rejoining a queue.
                if player.active {
                    player.seq = next_counter(txn, NEXT_SEQ)?;
                }
                put!(players, &player);
                if player.active {
                    requeued.push(player);
                }
            }
            debug!(court_id, requeued = requeued.len(), "court cleared");
            Ok(Outcome::Applied(requeued))
        })
    }

    // ── Attribute changes ──────────────────────────────────────────

    /// Activate or deactivate a player.
    ///
    /// Deactivation releases any seat. Activation appends the player to
    /// the tail of its queue.
    pub fn set_player_active(
        &self,
        player_id: PlayerId,
        active: bool,
    ) -> StateResult<Outcome<ActivityChange>> {
        self.write(|txn| {
            let mut players = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
            let Some(mut player) = get_record::<PlayerRecord>(&players, player_id)? else {
                return Ok(Outcome::Rejected(Rejection::PlayerNotFound(player_id)));
            };
            if player.active == active {
                return Ok(Outcome::Applied(ActivityChange {
                    player,
                    activated: false,
                }));
            }

            player.active = active;
            player.court_id = None;
            if active {
                player.seq = next_counter(txn, NEXT_SEQ)?;
            }
            player.updated_at = epoch_secs();
            put!(players, &player);
            debug!(player_id, active, "player activity changed");
            Ok(Outcome::Applied(ActivityChange {
                player,
                activated: active,
            }))
        })
    }

    /// Reclassify a player. A waiting player joins the tail of its new
    /// queue; a seated player keeps its seat.
    pub fn set_player_qualification(
        &self,
        player_id: PlayerId,
        qualification: Qualification,
    ) -> StateResult<Outcome<PlayerRecord>> {
        self.write(|txn| {
            let mut players = txn.open_table(PLAYERS).map_err(map_err!(Table))?;
            let Some(mut player) = get_record::<PlayerRecord>(&players, player_id)? else {
                return Ok(Outcome::Rejected(Rejection::PlayerNotFound(player_id)));
            };
            if player.qualification == qualification {
                return Ok(Outcome::Applied(player));
            }

            player.qualification = qualification;
            if player.is_queued() {
                player.seq = next_counter(txn, NEXT_SEQ)?;
            }
            player.updated_at = epoch_secs();
            put!(players, &player);
            debug!(player_id, %qualification, "player reclassified");
            Ok(Outcome::Applied(player))
        })
    }

    /// Change what a court is reserved for. Occupants keep their seats.
    pub fn set_court_type(
        &self,
        court_id: CourtId,
        court_type: CourtType,
    ) -> StateResult<Outcome<CourtRecord>> {
        self.write(|txn| {
            let mut courts = txn.open_table(COURTS).map_err(map_err!(Table))?;
            let Some(mut court) = get_record::<CourtRecord>(&courts, court_id)? else {
                return Ok(Outcome::Rejected(Rejection::CourtNotFound(court_id)));
            };
            court.court_type = court_type;
            court.updated_at = epoch_secs();
            put!(courts, &court);
            debug!(court_id, %court_type, "court type changed");
            Ok(Outcome::Applied(court))
        })
    }

    /// Reorder waiting players of one queue.
    ///
    /// The listed players take over the queue positions they collectively
    /// hold, in the order given; unlisted players keep their positions.
    /// Returns the whole queue afterwards, head first.
    pub fn reorder_queue(
        &self,
        qualification: Qualification,
        order: &[PlayerId],
    ) -> StateResult<Outcome<Vec<PlayerRecord>>> {
        self.write(|txn| {
            let mut players = txn.open_table(PLAYERS).map_err(map_err!(Table))?;

            let mut seen = HashSet::new();
            let mut listed = Vec::with_capacity(order.len());
            for &player_id in order {
                if !seen.insert(player_id) {
                    return Ok(Outcome::Rejected(Rejection::DuplicatePlayer(player_id)));
                }
                let Some(player) = get_record::<PlayerRecord>(&players, player_id)? else {
                    return Ok(Outcome::Rejected(Rejection::PlayerNotFound(player_id)));
                };
                if !player.is_queued() || player.qualification != qualification {
                    return Ok(Outcome::Rejected(Rejection::NotQueued(player_id)));
                }
                listed.push(player);
            }

            let mut slots: Vec<u64> = listed.iter().map(|p| p.seq).collect();
            slots.sort_unstable();
            let now = epoch_secs();
            for (mut player, seq) in listed.into_iter().zip(slots) {
                if player.seq != seq {
                    player.seq = seq;
                    player.updated_at = now;
                    put!(players, &player);
                }
            }

            let mut queue: Vec<PlayerRecord> = all_records::<PlayerRecord>(&players)?
                .into_iter()
                .filter(|p| p.is_queued() && p.qualification == qualification)
                .collect();
            queue.sort_by_key(|p| (p.seq, p.id));
            debug!(%qualification, reordered = order.len(), "queue reordered");
            Ok(Outcome::Applied(queue))
        })
    }
}

/// Fetch and decode one record by id.
fn get_record<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StateResult<Option<T>> {
    match table.get(id).map_err(map_err!(Read))? {
        Some(guard) => {
            let record: T =
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

/// Decode every record in a table, in key order.
fn all_records<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
) -> StateResult<Vec<T>> {
    let mut results = Vec::new();
    for entry in table.iter().map_err(map_err!(Read))? {
        let (_, value) = entry.map_err(map_err!(Read))?;
        let record: T = serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
        results.push(record);
    }
    Ok(results)
}

/// Take the next value of a named counter. Counters start at 1.
fn next_counter(txn: &WriteTransaction, key: &str) -> StateResult<u64> {
    let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
    let next = meta
        .get(key)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(1);
    meta.insert(key, next + 1).map_err(map_err!(Write))?;
    Ok(next)
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
