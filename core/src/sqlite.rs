//! SQLite-backed `EpisodeStore`.
//!
//! Each write runs inside one SQLite transaction; dropping an uncommitted
//! transaction rolls it back, so a failed save leaves the previous listing
//! and marker in place.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use url::Url;

use crate::episode::Episode;
use crate::store::{check_unique, EpisodeStore, StoreError, StoreResult};

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS episodes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    air_date TEXT NOT NULL,
    code TEXT NOT NULL,
    url TEXT NOT NULL,
    created_at TEXT NOT NULL,
    character_urls TEXT NOT NULL  -- JSON array of strings
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const LAST_REFRESH_KEY: &str = "last_refresh_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn write_episodes(conn: &Connection, episodes: &[Episode]) -> StoreResult<()> {
    conn.execute("DELETE FROM episodes", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO episodes (id, name, air_date, code, url, created_at, character_urls)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for episode in episodes {
        let urls: Vec<&str> = episode.character_urls.iter().map(Url::as_str).collect();
        stmt.execute(params![
            episode.id,
            episode.name,
            episode.air_date,
            episode.code,
            episode.url,
            format_timestamp(episode.created),
            serde_json::to_string(&urls)?,
        ])?;
    }
    Ok(())
}

fn write_marker(conn: &Connection, at: DateTime<Utc>) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![LAST_REFRESH_KEY, format_timestamp(at)],
    )?;
    Ok(())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupted(format!("invalid timestamp '{value}' in column '{column}'")))
}

struct EpisodeRow {
    id: i64,
    name: String,
    air_date: String,
    code: String,
    url: String,
    created_at: String,
    character_urls: String,
}

impl EpisodeRow {
    fn into_episode(self) -> StoreResult<Episode> {
        let raw_urls: Vec<String> = serde_json::from_str(&self.character_urls)?;
        let character_urls = raw_urls
            .iter()
            .map(|raw| {
                Url::parse(raw)
                    .map_err(|_| StoreError::Corrupted(format!("invalid character url '{raw}'")))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Episode {
            id: self.id,
            name: self.name,
            air_date: self.air_date,
            code: self.code,
            url: self.url,
            created: parse_timestamp(&self.created_at, "created_at")?,
            character_urls,
        })
    }
}

impl EpisodeStore for SqliteStore {
    fn read_all(&self) -> StoreResult<Vec<Episode>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, air_date, code, url, created_at, character_urls FROM episodes",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(EpisodeRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    air_date: row.get(2)?,
                    code: row.get(3)?,
                    url: row.get(4)?,
                    created_at: row.get(5)?,
                    character_urls: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(EpisodeRow::into_episode).collect()
    }

    fn replace_all(&self, episodes: &[Episode]) -> StoreResult<()> {
        check_unique(episodes)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_episodes(&tx, episodes)?;
        tx.commit()?;
        Ok(())
    }

    fn freshness_marker(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![LAST_REFRESH_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|v| parse_timestamp(&v, LAST_REFRESH_KEY))
            .transpose()
    }

    fn set_freshness_marker(&self, at: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.lock()?;
        write_marker(&conn, at)
    }

    fn save_refresh(&self, episodes: &[Episode], refreshed_at: DateTime<Utc>) -> StoreResult<()> {
        check_unique(episodes)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_episodes(&tx, episodes)?;
        write_marker(&tx, refreshed_at)?;
        tx.commit()?;
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM episodes", [])?;
        tx.execute("DELETE FROM settings", [])?;
        tx.commit()?;
        Ok(())
    }
}
