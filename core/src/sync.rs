//! Refresh cycle: fetch the full listing, replace the local collection,
//! stamp the freshness marker.
//!
//! # Design
//! At most one refresh runs at a time. The in-flight flag is claimed with a
//! compare-and-swap; a refresh that loses the race returns
//! `RefreshOutcome::Skipped` without touching the network or the store.
//! The flag is released by a guard, so dropping a refresh future part-way
//! through returns the synchronizer to `Idle`.
//!
//! The store is written only after the last page has arrived, and the write
//! itself has no suspension point. A cancelled refresh therefore either
//! committed in full before it was dropped or applied nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::remote::RemoteClient;
use crate::store::{EpisodeStore, StoreResult};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The listing was fetched and committed.
    Completed {
        episodes: usize,
        refreshed_at: DateTime<Utc>,
    },
    /// Another refresh was already running; nothing was done.
    Skipped,
}

pub struct Synchronizer<T: Transport, S: EpisodeStore> {
    remote: RemoteClient<T>,
    store: S,
    refreshing: AtomicBool,
    last_error: Mutex<Option<String>>,
}

/// Clears the in-flight flag when the refresh finishes or is dropped.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Transport, S: EpisodeStore> Synchronizer<T, S> {
    pub fn new(remote: RemoteClient<T>, store: S) -> Self {
        Self {
            remote,
            store,
            refreshing: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Detail fetches go straight through here; they never touch the store.
    pub fn remote(&self) -> &RemoteClient<T> {
        &self.remote
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> SyncState {
        if self.refreshing.load(Ordering::Acquire) {
            SyncState::Refreshing
        } else {
            SyncState::Idle
        }
    }

    /// Message of the most recent failed refresh, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_refresh(&self) -> StoreResult<Option<DateTime<Utc>>> {
        self.store.freshness_marker()
    }

    /// Run one refresh cycle, or return `Skipped` if one is already running.
    ///
    /// On error the stored collection and marker are exactly as they were
    /// before the call.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SyncError> {
        let Some(_guard) = self.try_begin() else {
            debug!("refresh already in progress, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        debug!("starting refresh");
        let result = self.run().await;
        match &result {
            Ok(RefreshOutcome::Completed {
                episodes,
                refreshed_at,
            }) => {
                info!(episodes, %refreshed_at, "refresh completed");
                self.record_error(None);
            }
            Ok(RefreshOutcome::Skipped) => {}
            Err(e) => {
                warn!(error = %e, "refresh failed");
                self.record_error(Some(e.to_string()));
            }
        }
        result
    }

    async fn run(&self) -> Result<RefreshOutcome, SyncError> {
        let episodes = self.remote.fetch_all_episodes().await?;

        // No await below this line.
        let refreshed_at = Utc::now();
        self.store.save_refresh(&episodes, refreshed_at)?;
        Ok(RefreshOutcome::Completed {
            episodes: episodes.len(),
            refreshed_at,
        })
    }

    fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(&self.refreshing))
    }

    fn record_error(&self, message: Option<String>) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = message;
    }
}
