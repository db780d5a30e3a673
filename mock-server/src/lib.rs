//! In-process stand-in for the remote episode catalog.
//!
//! Serves `GET /api/episode[?page=n]` as `{ info, results }` pages and
//! `GET /api/episode/{id}` / `GET /api/character/{id}` as single objects, in
//! the same JSON shape as the public API. A page can be configured to fail
//! with a 500 so clients can be tested against a broken `next` chain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

const EPISODES_FIXTURE: &str = include_str!("../fixtures/episodes.json");
const CHARACTERS_FIXTURE: &str = include_str!("../fixtures/characters.json");

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Episode {
    pub id: i64,
    pub name: String,
    pub air_date: String,
    pub episode: String,
    pub characters: Vec<String>,
    pub url: String,
    pub created: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub species: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: String,
    pub origin: Location,
    pub location: Location,
    pub image: String,
    pub episode: Vec<String>,
    pub url: String,
    pub created: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub count: usize,
    pub pages: usize,
    pub next: Option<String>,
    pub prev: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub info: PageInfo,
    pub results: Vec<T>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// The data set and paging behaviour behind one server instance.
#[derive(Debug)]
pub struct Catalog {
    /// Scheme and authority clients use to reach this server; `next` links
    /// are built from it.
    pub public_url: String,
    pub page_size: usize,
    pub episodes: Vec<Episode>,
    pub characters: Vec<Character>,
    /// 1-based page number that answers 500 instead of data.
    pub fail_page: Option<usize>,
    listing_requests: AtomicUsize,
}

impl Catalog {
    pub fn new(public_url: &str, episodes: Vec<Episode>, characters: Vec<Character>) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            episodes,
            characters,
            fail_page: None,
            listing_requests: AtomicUsize::new(0),
        }
    }

    /// The bundled fixture data.
    pub fn sample(public_url: &str) -> Result<Self, serde_json::Error> {
        let episodes = serde_json::from_str(EPISODES_FIXTURE)?;
        let characters = serde_json::from_str(CHARACTERS_FIXTURE)?;
        Ok(Self::new(public_url, episodes, characters))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_page = Some(page);
        self
    }

    /// Number of listing pages served (or refused) so far.
    pub fn listing_requests(&self) -> usize {
        self.listing_requests.load(Ordering::SeqCst)
    }

    fn page_count(&self) -> usize {
        self.episodes.len().div_ceil(self.page_size)
    }

    fn page_url(&self, page: usize) -> String {
        format!("{}/api/episode?page={page}", self.public_url)
    }

    fn page(&self, page: usize) -> Option<Page<Episode>> {
        let pages = self.page_count();
        if page == 0 || (page > pages && !(pages == 0 && page == 1)) {
            return None;
        }
        let start = (page - 1) * self.page_size;
        let results = self
            .episodes
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();
        Some(Page {
            info: PageInfo {
                count: self.episodes.len(),
                pages,
                next: (page < pages).then(|| self.page_url(page + 1)),
                prev: (page > 1).then(|| self.page_url(page - 1)),
            },
            results,
        })
    }
}

pub type SharedCatalog = Arc<Catalog>;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

pub fn app(catalog: SharedCatalog) -> Router {
    Router::new()
        .route("/api/episode", get(list_episodes))
        .route("/api/episode/{id}", get(get_episode))
        .route("/api/character/{id}", get(get_character))
        .with_state(catalog)
}

pub async fn serve(listener: TcpListener, catalog: SharedCatalog) -> Result<(), std::io::Error> {
    axum::serve(listener, app(catalog)).await
}

/// Serve the fixture catalog with `page_size` episodes per page.
pub async fn run(listener: TcpListener, page_size: usize) -> Result<(), std::io::Error> {
    let public_url = format!("http://{}", listener.local_addr()?);
    let catalog = Catalog::sample(&public_url)
        .map_err(std::io::Error::other)?
        .with_page_size(page_size);
    serve(listener, Arc::new(catalog)).await
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
}

async fn list_episodes(
    State(catalog): State<SharedCatalog>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Episode>> {
    catalog.listing_requests.fetch_add(1, Ordering::SeqCst);
    let page = query.page.unwrap_or(1);
    if catalog.fail_page == Some(page) {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Something broke"));
    }
    catalog
        .page(page)
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "There is nothing here"))
}

async fn get_episode(State(catalog): State<SharedCatalog>, Path(id): Path<i64>) -> ApiResult<Episode> {
    catalog
        .episodes
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Episode not found"))
}

async fn get_character(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<i64>,
) -> ApiResult<Character> {
    catalog
        .characters
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Character not found"))
}
