//! Cooperative pause/resume for in-flight archive runs.
//!
//! Each guild run owns a watch channel: the command side flips the flag
//! through [`PauseRegistry`], the orchestrator awaits [`wait_unpaused`] at
//! channel, message and attachment boundaries. Waiting is signal-driven
//! (no timed repolling), so resume takes effect on the next await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Receiver side handed to an archive run.
pub type PauseToken = watch::Receiver<bool>;

/// Blocks while the run is paused. A dropped controller counts as
/// resumed, so an orphaned token can never wedge a run.
pub async fn wait_unpaused(token: &mut Option<PauseToken>) {
    if let Some(rx) = token {
        while *rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Live pause flags keyed by guild id. Entries exist only while a run is
/// active; the [`PauseGuard`] removes its entry on every exit path.
#[derive(Clone, Default)]
pub struct PauseRegistry {
    inner: Arc<Mutex<HashMap<u64, watch::Sender<bool>>>>,
}

impl PauseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a run for `guild_id`, initially unpaused. Returns None
    /// if the guild already has a live run.
    pub fn begin(&self, guild_id: u64) -> Option<(PauseGuard, PauseToken)> {
        let mut map = self.inner.lock().unwrap();
        if map.contains_key(&guild_id) {
            return None;
        }
        let (tx, rx) = watch::channel(false);
        map.insert(guild_id, tx);
        Some((
            PauseGuard {
                registry: self.clone(),
                guild_id,
            },
            rx,
        ))
    }

    /// Flips the pause flag for a guild's run. Returns false when no run
    /// is active.
    pub fn set_paused(&self, guild_id: u64, paused: bool) -> bool {
        let map = self.inner.lock().unwrap();
        match map.get(&guild_id) {
            Some(tx) => tx.send(paused).is_ok(),
            None => false,
        }
    }

    pub fn is_paused(&self, guild_id: u64) -> bool {
        let map = self.inner.lock().unwrap();
        map.get(&guild_id).map(|tx| *tx.borrow()).unwrap_or(false)
    }

    fn remove(&self, guild_id: u64) {
        self.inner.lock().unwrap().remove(&guild_id);
    }
}

/// Scoped registration of one guild run; dropping it clears the flag so a
/// stale pause never leaks into the next run.
pub struct PauseGuard {
    registry: PauseRegistry,
    guild_id: u64,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.registry.remove(self.guild_id);
    }
}
