//! Consistent, read-only view of queues and courts used for planning.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::types::*;

/// A player waiting in a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub qualification: Qualification,
}

/// Name and tier of a player, as shown in status views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
    pub qualification: Qualification,
}

/// A court with its occupants in seating order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtView {
    pub id: CourtId,
    pub name: String,
    pub court_type: CourtType,
    pub capacity: u32,
    pub occupants: Vec<PlayerRef>,
}

impl CourtView {
    pub fn free_slots(&self) -> u32 {
        self.capacity
            .saturating_sub(self.occupants.len() as u32)
    }
}

/// Inconsistent roster data found while taking a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "anomaly", rename_all = "snake_case")]
pub enum Anomaly {
    /// Player points at a court that does not exist. Excluded from planning.
    DanglingCourt { player_id: PlayerId, court_id: CourtId },
    /// Inactive player still holds a seat. Excluded from planning.
    InactiveSeated { player_id: PlayerId, court_id: CourtId },
    /// More occupants than seats; the court offers no free slots.
    OverCapacity {
        court_id: CourtId,
        occupants: u32,
        capacity: u32,
    },
}

/// Queues and courts frozen at a single instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterSnapshot {
    pub advanced_queue: Vec<QueuedPlayer>,
    pub intermediate_queue: Vec<QueuedPlayer>,
    /// Sorted by court id.
    pub courts: Vec<CourtView>,
    pub anomalies: Vec<Anomaly>,
}

impl RosterSnapshot {
    /// Partition raw records into queues and court occupancy.
    pub fn build(mut players: Vec<PlayerRecord>, mut courts: Vec<CourtRecord>) -> Self {
        players.sort_by_key(|p| (p.seq, p.id));
        courts.sort_by_key(|c| c.id);

        let mut anomalies = Vec::new();
        let mut seated: HashMap<CourtId, Vec<PlayerRef>> = HashMap::new();
        let mut queues: BTreeMap<Qualification, Vec<QueuedPlayer>> = BTreeMap::new();
        let court_ids: HashSet<CourtId> = courts.iter().map(|c| c.id).collect();

        for player in players {
            match player.court_id {
                Some(court_id) if !court_ids.contains(&court_id) => {
                    anomalies.push(Anomaly::DanglingCourt {
                        player_id: player.id,
                        court_id,
                    });
                }
                Some(court_id) if !player.active => {
                    anomalies.push(Anomaly::InactiveSeated {
                        player_id: player.id,
                        court_id,
                    });
                }
                Some(court_id) => {
                    seated.entry(court_id).or_default().push(PlayerRef {
                        id: player.id,
                        name: player.name,
                        qualification: player.qualification,
                    });
                }
                None if player.active => {
                    queues
                        .entry(player.qualification)
                        .or_default()
                        .push(QueuedPlayer {
                            id: player.id,
                            name: player.name,
                            qualification: player.qualification,
                        });
                }
                None => {}
            }
        }

        let courts: Vec<CourtView> = courts
            .into_iter()
            .map(|court| {
                let occupants = seated.remove(&court.id).unwrap_or_default();
                if occupants.len() as u32 > court.capacity {
                    anomalies.push(Anomaly::OverCapacity {
                        court_id: court.id,
                        occupants: occupants.len() as u32,
                        capacity: court.capacity,
                    });
                }
                CourtView {
                    id: court.id,
                    name: court.name,
                    court_type: court.court_type,
                    capacity: court.capacity,
                    occupants,
                }
            })
            .collect();

        for anomaly in &anomalies {
            warn!(?anomaly, "roster anomaly excluded from planning");
        }

        Self {
            advanced_queue: queues.remove(&Qualification::Advanced).unwrap_or_default(),
            intermediate_queue: queues
                .remove(&Qualification::Intermediate)
                .unwrap_or_default(),
            courts,
            anomalies,
        }
    }

    pub fn queue(&self, qualification: Qualification) -> &[QueuedPlayer] {
        match qualification {
            Qualification::Advanced => &self.advanced_queue,
            Qualification::Intermediate => &self.intermediate_queue,
        }
    }

    pub fn court_status(&self) -> Vec<CourtStatus> {
        self.courts
            .iter()
            .map(|court| CourtStatus {
                court_id: court.id,
                court_name: court.name.clone(),
                court_type: court.court_type,
                player_count: court.occupants.len() as u32,
                slots_available: court.free_slots(),
                is_full: court.free_slots() == 0,
                players: court.occupants.clone(),
            })
            .collect()
    }

    pub fn queue_status(&self) -> QueueStatus {
        let summarize = |queue: &[QueuedPlayer]| QueueSummary {
            count: queue.len(),
            players: queue
                .iter()
                .map(|p| PlayerRef {
                    id: p.id,
                    name: p.name.clone(),
                    qualification: p.qualification,
                })
                .collect(),
        };
        QueueStatus {
            advanced: summarize(&self.advanced_queue),
            intermediate: summarize(&self.intermediate_queue),
            total_in_queue: self.advanced_queue.len() + self.intermediate_queue.len(),
        }
    }
}

/// Occupancy of one court, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtStatus {
    pub court_id: CourtId,
    pub court_name: String,
    pub court_type: CourtType,
    pub player_count: u32,
    pub slots_available: u32,
    pub is_full: bool,
    pub players: Vec<PlayerRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub count: usize,
    pub players: Vec<PlayerRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub advanced: QueueSummary,
    pub intermediate: QueueSummary,
    pub total_in_queue: usize,
}
