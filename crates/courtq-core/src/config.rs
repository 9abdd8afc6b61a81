//! courtq.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{CourtType, Qualification};

/// Reference interval for the periodic safety-net cycle.
pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const MIN_INTERVAL_SECS: u64 = 1;
/// One day.
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Reject periodic intervals the scheduler cannot run.
pub fn check_interval_secs(secs: u64) -> anyhow::Result<u64> {
    if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&secs) {
        anyhow::bail!(
            "cycle interval must be between {MIN_INTERVAL_SECS} and {MAX_INTERVAL_SECS} seconds, got {secs}"
        );
    }
    Ok(secs)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourtqConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Courts seeded into an empty store.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub courts: Vec<CourtSeed>,
    /// Players seeded into an empty store, in queue order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<PlayerSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// redb file; in-memory when absent.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtSeed {
    pub name: String,
    pub court_type: CourtType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeed {
    pub name: String,
    pub qualification: Qualification,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CourtqConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CourtqConfig = toml::from_str(&content)?;
        check_interval_secs(config.scheduler.interval_secs)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a club layout: two courts per type and an on-disk store.
    pub fn scaffold(store_path: &str) -> Self {
        let mut courts = Vec::new();
        for court_type in [CourtType::Advanced, CourtType::Intermediate, CourtType::Training] {
            for n in 1..=2 {
                courts.push(CourtSeed {
                    name: format!("{} Court {n}", capitalize(court_type.as_str())),
                    court_type,
                });
            }
        }
        CourtqConfig {
            scheduler: SchedulerConfig::default(),
            store: StoreConfig {
                path: Some(PathBuf::from(store_path)),
            },
            courts,
            players: Vec::new(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
