//! Wire DTOs for the catalog API.
//!
//! # Design
//! These types mirror the remote JSON exactly and are converted into domain
//! records as soon as a page is decoded. The mock-server crate defines its
//! own copies; integration tests catch any schema drift between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::episode::Episode;

/// Pagination metadata carried by every listing response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub count: u64,
    pub pages: u64,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// One page of a listing: `{ info, results }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub info: PageInfo,
    pub results: Vec<T>,
}

/// An episode exactly as the remote sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeDto {
    pub id: i64,
    pub name: String,
    pub air_date: String,
    /// The `S01E01` code; the remote calls it `episode`.
    pub episode: String,
    pub characters: Vec<String>,
    pub url: String,
    pub created: String,
}

impl EpisodeDto {
    /// Convert into a domain record. `fetched_at` stands in for an
    /// unparseable `created` timestamp.
    pub fn into_episode(self, fetched_at: DateTime<Utc>) -> Episode {
        let created = DateTime::parse_from_rfc3339(&self.created)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(fetched_at);

        let id = self.id;
        let character_urls = self
            .characters
            .into_iter()
            .filter_map(|raw| match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    debug!(episode = id, url = %raw, error = %e, "dropping unparseable character url");
                    None
                }
            })
            .collect();

        Episode {
            id: self.id,
            name: self.name,
            air_date: self.air_date,
            code: self.episode,
            url: self.url,
            created,
            character_urls,
        }
    }
}
