//! Client-side synchronization core for a paginated episode catalog.
//!
//! # Overview
//! Fetches the remote episode listing page by page, derives typed fields
//! from loosely formatted strings, and replaces the local collection with
//! the latest full listing while tracking when that last happened.
//!
//! # Design
//! - `CatalogClient` is stateless and pure: `build_*` produces requests,
//!   `parse_*` consumes responses. `RemoteClient` runs the round-trip over a
//!   `Transport`, so tests swap the network for scripted responses.
//! - `Synchronizer` owns the single-flight guard and is the only writer of
//!   the `EpisodeStore`.
//! - Derived fields (`Episode::number`, `Character::status`, ...) are total:
//!   malformed input produces a documented default, never an error.
//! - Wire DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod character;
pub mod client;
pub mod config;
pub mod episode;
pub mod error;
pub mod export;
pub mod freshness;
pub mod http;
pub mod remote;
pub mod sqlite;
pub mod store;
pub mod sync;
pub mod transport;
pub mod types;

pub use character::{Character, CharacterStatus, Location, StatusColor};
pub use client::{CatalogClient, EpisodePage};
pub use config::CatalogConfig;
pub use episode::{sort_episodes, Episode, EpisodeNumber};
pub use error::{ApiError, SyncError};
pub use http::{HttpRequest, HttpResponse};
pub use remote::RemoteClient;
pub use sqlite::SqliteStore;
pub use store::{EpisodeStore, MemoryStore, StoreError, StoreResult};
pub use sync::{RefreshOutcome, SyncState, Synchronizer};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportFuture, TransportResult};
pub use types::{EpisodeDto, Page, PageInfo};
