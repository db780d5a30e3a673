//! Refresh-cycle behaviour against a scripted transport.

mod common;

use std::sync::Arc;
use std::time::Duration;

use catalog_core::{
    ApiError, EpisodeStore, MemoryStore, RefreshOutcome, RemoteClient, SqliteStore, StoreError,
    SyncError, SyncState, Synchronizer,
};
use chrono::{DateTime, Utc};
use common::{page_body, page_url, two_page_listing, ScriptedTransport, BASE_URL};
use tokio::sync::Notify;

fn synchronizer<S: EpisodeStore>(transport: ScriptedTransport, store: S) -> Synchronizer<ScriptedTransport, S> {
    Synchronizer::new(RemoteClient::new(BASE_URL, transport), store)
}

fn sorted_ids(store: &impl EpisodeStore) -> Vec<i64> {
    let mut ids: Vec<i64> = store.read_all().unwrap().into_iter().map(|e| e.id).collect();
    ids.sort_unstable();
    ids
}

/// Store pre-populated with two episodes that the remote no longer lists.
fn seeded_store() -> (MemoryStore, DateTime<Utc>) {
    let store = MemoryStore::new();
    let at = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
    let remote = RemoteClient::new(BASE_URL, ScriptedTransport::new());
    let seed = remote
        .catalog()
        .parse_episode_page(catalog_core::HttpResponse::new(
            200,
            page_body(&[(100, "S05E01"), (101, "S05E02")], None),
        ))
        .unwrap();
    store.save_refresh(&seed.episodes, at).unwrap();
    (store, at)
}

#[tokio::test]
async fn fetch_all_pages_concatenates_in_server_order() {
    let remote = RemoteClient::new(BASE_URL, two_page_listing());
    let episodes = remote.fetch_all_episodes().await.unwrap();

    let ids: Vec<i64> = episodes.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(remote.transport().requests(), vec![page_url(1), page_url(2)]);
}

#[tokio::test]
async fn unparseable_next_ends_the_walk() {
    let transport = ScriptedTransport::new()
        .respond(&page_url(1), 200, page_body(&[(1, "S01E01")], Some("page=2")))
        .respond(&page_url(2), 200, page_body(&[(2, "S01E02")], None));
    let remote = RemoteClient::new(BASE_URL, transport);

    let episodes = remote.fetch_all_episodes().await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(remote.transport().requests().len(), 1);
}

#[tokio::test]
async fn refresh_replaces_store_and_sets_marker() {
    let sync = synchronizer(two_page_listing(), MemoryStore::new());
    assert!(sync.last_refresh().unwrap().is_none());

    let before = Utc::now();
    let outcome = sync.refresh().await.unwrap();

    let RefreshOutcome::Completed { episodes, refreshed_at } = outcome else {
        panic!("expected a completed refresh, got {outcome:?}");
    };
    assert_eq!(episodes, 3);
    assert!(refreshed_at >= before);
    assert_eq!(sorted_ids(sync.store()), vec![1, 2, 3]);
    assert_eq!(sync.last_refresh().unwrap(), Some(refreshed_at));
    assert_eq!(sync.state(), SyncState::Idle);
    assert!(sync.last_error().is_none());
}

#[tokio::test]
async fn refresh_drops_stale_records() {
    let (store, _) = seeded_store();
    let sync = synchronizer(two_page_listing(), store);

    sync.refresh().await.unwrap();
    assert_eq!(sorted_ids(sync.store()), vec![1, 2, 3]);
}

#[tokio::test]
async fn repeated_refresh_is_idempotent_and_marker_advances() {
    let sync = synchronizer(two_page_listing(), MemoryStore::new());

    sync.refresh().await.unwrap();
    let first_ids = sorted_ids(sync.store());
    let first_marker = sync.last_refresh().unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    sync.refresh().await.unwrap();

    assert_eq!(sorted_ids(sync.store()), first_ids);
    assert!(sync.last_refresh().unwrap().unwrap() > first_marker);
}

#[tokio::test]
async fn concurrent_refreshes_collapse_into_one() {
    let gate = Arc::new(Notify::new());
    let sync = synchronizer(two_page_listing().gated(gate.clone()), MemoryStore::new());

    let (first, second) = tokio::join!(sync.refresh(), async {
        let outcome = sync.refresh().await;
        gate.notify_one();
        outcome
    });

    assert!(matches!(first.unwrap(), RefreshOutcome::Completed { episodes: 3, .. }));
    assert_eq!(second.unwrap(), RefreshOutcome::Skipped);
    assert_eq!(sync.remote().transport().requests(), vec![page_url(1), page_url(2)]);
}

#[tokio::test]
async fn state_reports_refreshing_while_in_flight() {
    let gate = Arc::new(Notify::new());
    let sync = synchronizer(two_page_listing().gated(gate.clone()), MemoryStore::new());

    let (outcome, observed) = tokio::join!(sync.refresh(), async {
        let observed = sync.state();
        gate.notify_one();
        observed
    });

    assert_eq!(observed, SyncState::Refreshing);
    assert!(outcome.is_ok());
    assert_eq!(sync.state(), SyncState::Idle);
}

#[tokio::test]
async fn failure_on_page_two_of_three_leaves_store_untouched() {
    let transport = ScriptedTransport::new()
        .respond(&page_url(1), 200, page_body(&[(1, "S01E01")], Some(&page_url(2))))
        .respond(&page_url(2), 500, "upstream exploded")
        .respond(&page_url(3), 200, page_body(&[(3, "S01E03")], None));
    let (store, seeded_at) = seeded_store();
    let before = store.read_all().unwrap();
    let sync = synchronizer(transport, store);

    let err = sync.refresh().await.unwrap_err();

    assert!(matches!(err, SyncError::Fetch(ApiError::Remote { status: 500, .. })));
    assert_eq!(sync.store().read_all().unwrap(), before);
    assert_eq!(sync.last_refresh().unwrap(), Some(seeded_at));
    assert_eq!(sync.remote().transport().requests(), vec![page_url(1), page_url(2)]);
    assert!(sync.last_error().unwrap().contains("500"));
    assert_eq!(sync.state(), SyncState::Idle);
}

#[tokio::test]
async fn transport_failure_is_surfaced() {
    let transport = ScriptedTransport::new().fail(&page_url(1), "connection refused");
    let (store, seeded_at) = seeded_store();
    let sync = synchronizer(transport, store);

    let err = sync.refresh().await.unwrap_err();

    assert!(matches!(err, SyncError::Fetch(ApiError::Transport(_))));
    assert_eq!(sorted_ids(sync.store()), vec![100, 101]);
    assert_eq!(sync.last_refresh().unwrap(), Some(seeded_at));
}

#[tokio::test]
async fn malformed_page_is_a_decode_error() {
    let transport = ScriptedTransport::new()
        .respond(&page_url(1), 200, page_body(&[(1, "S01E01")], Some(&page_url(2))))
        .respond(&page_url(2), 200, r#"{"info": {}, "results": "nope"}"#);
    let (store, _) = seeded_store();
    let sync = synchronizer(transport, store);

    let err = sync.refresh().await.unwrap_err();

    assert!(matches!(err, SyncError::Fetch(ApiError::Decode(_))));
    assert_eq!(sorted_ids(sync.store()), vec![100, 101]);
}

#[tokio::test]
async fn persistence_failure_rolls_back() {
    // The same id on two pages cannot be stored.
    let transport = ScriptedTransport::new()
        .respond(&page_url(1), 200, page_body(&[(1, "S01E01")], Some(&page_url(2))))
        .respond(&page_url(2), 200, page_body(&[(1, "S01E02")], None));
    let (store, seeded_at) = seeded_store();
    let sync = synchronizer(transport, store);

    let err = sync.refresh().await.unwrap_err();
    assert!(matches!(err, SyncError::Persistence(StoreError::DuplicateId(1))));
    assert_eq!(sorted_ids(sync.store()), vec![100, 101]);
    assert_eq!(sync.last_refresh().unwrap(), Some(seeded_at));
    assert!(sync.last_error().is_some());
}

#[tokio::test]
async fn success_clears_previous_error() {
    let transport = ScriptedTransport::new()
        .respond(&page_url(1), 503, "busy")
        .respond(&page_url(1), 200, page_body(&[(1, "S01E01")], None));
    let sync = synchronizer(transport, MemoryStore::new());

    let err = sync.refresh().await.unwrap_err();
    assert!(matches!(err, SyncError::Fetch(ApiError::Remote { status: 503, .. })));
    assert!(sync.last_error().unwrap().contains("busy"));

    sync.refresh().await.unwrap();
    assert!(sync.last_error().is_none());
    assert_eq!(sorted_ids(sync.store()), vec![1]);
}

#[tokio::test]
async fn cancelled_refresh_applies_nothing_and_releases_the_guard() {
    let gate = Arc::new(Notify::new());
    let (store, seeded_at) = seeded_store();
    let sync = synchronizer(two_page_listing().gated(gate), store);

    let cancelled = tokio::time::timeout(Duration::from_millis(20), sync.refresh()).await;
    assert!(cancelled.is_err(), "refresh should still be parked on the gate");

    assert_eq!(sync.state(), SyncState::Idle);
    assert_eq!(sorted_ids(sync.store()), vec![100, 101]);
    assert_eq!(sync.last_refresh().unwrap(), Some(seeded_at));

    // The gate only holds the first request, so a retry runs to completion.
    let outcome = sync.refresh().await.unwrap();
    assert!(matches!(outcome, RefreshOutcome::Completed { episodes: 3, .. }));
    assert_eq!(sorted_ids(sync.store()), vec![1, 2, 3]);
}

#[tokio::test]
async fn detail_fetch_bypasses_the_store() {
    let transport = two_page_listing().respond(
        &format!("{BASE_URL}/character/1"),
        200,
        r#"{"id": 1, "name": "Rick Sanchez", "status": "Alive", "species": "Human", "type": "",
            "gender": "Male", "origin": {"name": "Earth (C-137)", "url": ""},
            "location": {"name": "Citadel of Ricks", "url": ""},
            "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
            "episode": [], "url": "", "created": "2017-11-04T18:48:46.250Z"}"#,
    );
    let sync = synchronizer(transport, MemoryStore::new());

    let character = sync.remote().fetch_character(1).await.unwrap();
    assert_eq!(character.name, "Rick Sanchez");
    assert!(sync.store().read_all().unwrap().is_empty());
    assert!(sync.last_refresh().unwrap().is_none());

    let missing = sync.remote().fetch_character(2).await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn refresh_into_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("catalog.db")).unwrap();
    let sync = synchronizer(two_page_listing(), store);

    sync.refresh().await.unwrap();

    let codes: Vec<String> = sync
        .store()
        .read_sorted()
        .unwrap()
        .into_iter()
        .map(|e| e.code)
        .collect();
    assert_eq!(codes, vec!["S01E01", "S01E02", "S01E03"]);
    assert!(sync.last_refresh().unwrap().is_some());
}
