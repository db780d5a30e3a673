//! Stateless request builder and response parser for the catalog API.
//!
//! # Design
//! `CatalogClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. `RemoteClient` runs the round-trip in between, which keeps
//! this half deterministic and testable without a network.

use chrono::Utc;
use serde::de::DeserializeOwned;
use url::Url;

use crate::character::Character;
use crate::episode::Episode;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{EpisodeDto, Page};

/// A decoded listing page.
#[derive(Debug, Clone)]
pub struct EpisodePage {
    pub episodes: Vec<Episode>,
    /// Absolute URL of the following page, if the chain continues.
    pub next: Option<Url>,
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// First page of the episode listing.
    pub fn build_list_episodes(&self) -> HttpRequest {
        HttpRequest::get(format!("{}/episode", self.base_url))
    }

    /// A follow-up page, addressed by the `next` URL the server handed out.
    pub fn build_page(&self, next: &Url) -> HttpRequest {
        HttpRequest::get(next.as_str())
    }

    pub fn build_get_episode(&self, id: i64) -> HttpRequest {
        HttpRequest::get(format!("{}/episode/{id}", self.base_url))
    }

    pub fn build_get_character(&self, id: i64) -> HttpRequest {
        HttpRequest::get(format!("{}/character/{id}", self.base_url))
    }

    pub fn parse_episode_page(&self, response: HttpResponse) -> Result<EpisodePage, ApiError> {
        let page: Page<EpisodeDto> = decode(&response)?;
        let fetched_at = Utc::now();
        let next = page.info.next.as_deref().and_then(|raw| Url::parse(raw).ok());
        let episodes = page
            .results
            .into_iter()
            .map(|dto| dto.into_episode(fetched_at))
            .collect();
        Ok(EpisodePage { episodes, next })
    }

    pub fn parse_episode(&self, response: HttpResponse) -> Result<Episode, ApiError> {
        let dto: EpisodeDto = decode(&response)?;
        Ok(dto.into_episode(Utc::now()))
    }

    pub fn parse_character(&self, response: HttpResponse) -> Result<Character, ApiError> {
        decode(&response)
    }
}

/// Reject anything but 200, then decode the body.
fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    if response.status != 200 {
        return Err(ApiError::remote(response.status, &response.body));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}
