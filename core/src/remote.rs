//! Async remote client: runs `CatalogClient` requests over a `Transport`.
//!
//! The client keeps no state beyond configuration, so one instance can serve
//! a refresh and any number of concurrent detail fetches.

use tracing::debug;

use crate::character::Character;
use crate::client::CatalogClient;
use crate::episode::Episode;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

pub struct RemoteClient<T: Transport> {
    client: CatalogClient,
    transport: T,
}

impl<T: Transport> RemoteClient<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: CatalogClient::new(base_url),
            transport,
        }
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch_episode(&self, id: i64) -> Result<Episode, ApiError> {
        let response = self.send(self.client.build_get_episode(id)).await?;
        self.client.parse_episode(response)
    }

    pub async fn fetch_character(&self, id: i64) -> Result<Character, ApiError> {
        let response = self.send(self.client.build_get_character(id)).await?;
        self.client.parse_character(response)
    }

    /// Walk the `next` chain from the collection root and return every
    /// episode in server order. Any failing page aborts the whole walk.
    ///
    /// The chain is trusted to be finite; no page limit is applied.
    pub async fn fetch_all_episodes(&self) -> Result<Vec<Episode>, ApiError> {
        let mut all = Vec::new();
        let mut request = Some(self.client.build_list_episodes());
        let mut page_number = 0usize;

        while let Some(req) = request.take() {
            page_number += 1;
            debug!(page = page_number, url = %req.url, "fetching episode page");

            let response = self.send(req).await?;
            let page = self.client.parse_episode_page(response)?;
            debug!(
                page = page_number,
                received = page.episodes.len(),
                total = all.len() + page.episodes.len(),
                "decoded episode page"
            );

            all.extend(page.episodes);
            request = page.next.as_ref().map(|next| self.client.build_page(next));
        }

        debug!(pages = page_number, episodes = all.len(), "episode listing complete");
        Ok(all)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        Ok(self.transport.execute(request).await?)
    }
}
