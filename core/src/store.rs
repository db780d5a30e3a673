//! Persisted episode collection and freshness marker.
//!
//! # Design
//! The synchronizer only needs "replace everything" and "remember when";
//! `save_refresh` does both in one transaction so readers never see a new
//! listing paired with an old marker, or a half-cleared collection. Reads are
//! unordered; `read_sorted` applies the `(season, episode)` order.
//!
//! Stores are synchronous. A commit is short and runs without suspension
//! points, which is what lets a cancelled refresh be dropped cleanly.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::episode::{sort_episodes, Episode};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate episode id {0} in replacement set")]
    DuplicateId(i64),

    #[error("corrupted data: {0}")]
    Corrupted(String),

    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait EpisodeStore: Send + Sync {
    /// Every stored episode, in no particular order.
    fn read_all(&self) -> StoreResult<Vec<Episode>>;

    /// Atomically swap the whole collection for `episodes`.
    fn replace_all(&self, episodes: &[Episode]) -> StoreResult<()>;

    /// When the last successful refresh finished, if ever.
    fn freshness_marker(&self) -> StoreResult<Option<DateTime<Utc>>>;

    fn set_freshness_marker(&self, at: DateTime<Utc>) -> StoreResult<()>;

    /// `replace_all` plus `set_freshness_marker`, committed together or not at all.
    fn save_refresh(&self, episodes: &[Episode], refreshed_at: DateTime<Utc>) -> StoreResult<()>;

    /// Drop all episodes and the freshness marker.
    fn reset(&self) -> StoreResult<()>;

    /// `read_all` ordered by `(season, episode)`.
    fn read_sorted(&self) -> StoreResult<Vec<Episode>> {
        let mut episodes = self.read_all()?;
        sort_episodes(&mut episodes);
        Ok(episodes)
    }
}

/// Reject a replacement set that would collapse two records into one.
pub(crate) fn check_unique(episodes: &[Episode]) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(episodes.len());
    for episode in episodes {
        if !seen.insert(episode.id) {
            return Err(StoreError::DuplicateId(episode.id));
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Snapshot {
    episodes: Vec<Episode>,
    last_refresh: Option<DateTime<Utc>>,
}

/// In-process store. Every write builds the new snapshot first and swaps it
/// in under the lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Snapshot>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl EpisodeStore for MemoryStore {
    fn read_all(&self) -> StoreResult<Vec<Episode>> {
        Ok(self.lock()?.episodes.clone())
    }

    fn replace_all(&self, episodes: &[Episode]) -> StoreResult<()> {
        check_unique(episodes)?;
        self.lock()?.episodes = episodes.to_vec();
        Ok(())
    }

    fn freshness_marker(&self) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.lock()?.last_refresh)
    }

    fn set_freshness_marker(&self, at: DateTime<Utc>) -> StoreResult<()> {
        self.lock()?.last_refresh = Some(at);
        Ok(())
    }

    fn save_refresh(&self, episodes: &[Episode], refreshed_at: DateTime<Utc>) -> StoreResult<()> {
        check_unique(episodes)?;
        let next = Snapshot {
            episodes: episodes.to_vec(),
            last_refresh: Some(refreshed_at),
        };
        *self.lock()? = next;
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        *self.lock()? = Snapshot::default();
        Ok(())
    }
}
