//! Scripted transport shared by the synchronizer tests.
//!
//! Responses are keyed by exact URL; unknown URLs answer 404. Scripting the
//! same URL more than once plays the responses in order and then repeats
//! the last one. The first request can be held on a gate so tests control
//! when a refresh resumes.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use catalog_core::{HttpRequest, HttpResponse, Transport, TransportError, TransportFuture};
use tokio::sync::Notify;

pub const BASE_URL: &str = "http://catalog.test/api";

pub fn page_url(page: usize) -> String {
    if page == 1 {
        format!("{BASE_URL}/episode")
    } else {
        format!("{BASE_URL}/episode?page={page}")
    }
}

/// One page envelope holding episodes `(id, code)`.
pub fn page_body(episodes: &[(i64, &str)], next: Option<&str>) -> String {
    let results: Vec<serde_json::Value> = episodes
        .iter()
        .map(|(id, code)| {
            serde_json::json!({
                "id": id,
                "name": format!("Episode {id}"),
                "air_date": "December 2, 2013",
                "episode": code,
                "characters": [
                    "https://rickandmortyapi.com/api/character/1",
                    "https://rickandmortyapi.com/api/character/2"
                ],
                "url": format!("{BASE_URL}/episode/{id}"),
                "created": "2017-11-10T12:56:33.798Z"
            })
        })
        .collect();
    serde_json::json!({
        "info": {"count": 0, "pages": 0, "next": next, "prev": null},
        "results": results
    })
    .to_string()
}

#[derive(Clone)]
enum Scripted {
    Respond(u16, String),
    Fail(String),
}

#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.script(url, Scripted::Respond(status, body.into()))
    }

    pub fn fail(self, url: &str, message: &str) -> Self {
        self.script(url, Scripted::Fail(message.to_string()))
    }

    fn script(self, url: &str, response: Scripted) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    fn next_response(&self, url: &str) -> Option<Scripted> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    /// Hold the first request until `gate` is notified.
    pub fn gated(self, gate: Arc<Notify>) -> Self {
        *self.gate.lock().unwrap() = Some(gate);
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.url.clone());
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            match self.next_response(&request.url) {
                Some(Scripted::Respond(status, body)) => Ok(HttpResponse::new(status, body)),
                Some(Scripted::Fail(message)) => Err(TransportError::Connect(message)),
                None => Ok(HttpResponse::new(404, r#"{"error":"There is nothing here"}"#)),
            }
        })
    }
}

/// Two pages: `[1, 2]` then `[3]`.
pub fn two_page_listing() -> ScriptedTransport {
    ScriptedTransport::new()
        .respond(
            &page_url(1),
            200,
            page_body(&[(1, "S01E01"), (2, "S01E02")], Some(&page_url(2))),
        )
        .respond(&page_url(2), 200, page_body(&[(3, "S01E03")], None))
}
