//! Store setup from courtq.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;
use courtq_core::CourtqConfig;
use courtq_state::RosterStore;
use tracing::{info, warn};

/// File name used inside `--data-dir`.
pub const STORE_FILE: &str = "courtq.redb";

/// Where the roster lives: `--data-dir` wins over the config file; with
/// neither the store is in memory.
pub fn store_path(data_dir: Option<&Path>, config: &CourtqConfig) -> Option<PathBuf> {
    match data_dir {
        Some(dir) => Some(dir.join(STORE_FILE)),
        None => config.store.path.clone(),
    }
}

pub fn open_store(path: Option<&Path>) -> anyhow::Result<RosterStore> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            // redb holds an exclusive lock for as long as the file is open.
            let store = RosterStore::open(path).with_context(|| {
                format!(
                    "cannot open roster store {}; is `courtqd run` using it?",
                    path.display()
                )
            })?;
            info!(path = ?path, "roster store opened");
            Ok(store)
        }
        None => {
            warn!("no store path configured, roster is kept in memory");
            Ok(RosterStore::open_in_memory()?)
        }
    }
}

/// Seed the configured courts and players into an empty store.
///
/// A store that already holds anything is left alone. Returns whether
/// seeding happened.
pub fn seed_if_empty(store: &RosterStore, config: &CourtqConfig) -> anyhow::Result<bool> {
    if !store.is_empty()? {
        return Ok(false);
    }
    if config.courts.is_empty() && config.players.is_empty() {
        return Ok(false);
    }

    for court in &config.courts {
        store.add_court(&court.name, court.court_type)?;
    }
    for seed in &config.players {
        let player = store.add_player(&seed.name, seed.qualification)?;
        if !seed.active {
            store.set_player_active(player.id, false)?;
        }
    }
    info!(
        courts = config.courts.len(),
        players = config.players.len(),
        "seeded empty roster"
    );
    Ok(true)
}
