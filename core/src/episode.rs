//! The episode record and the fields derived from its raw strings.
//!
//! # Design
//! Derived values (`number`, `character_ids`, `formatted_air_date`) are
//! computed on read and never fail: a malformed code yields season and
//! episode `0`, an unparseable air date is returned verbatim, and character
//! URLs without a numeric final segment are skipped. One bad field in an
//! otherwise valid payload must not stop the listing from rendering.
//!
//! Ordering lives on `EpisodeNumber` rather than on `Episode` itself, so
//! `Episode`'s `Eq` keeps meaning "same record" while sorted listings use
//! `(season, episode)`.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Air-date layouts the remote catalog is known to use.
const AIR_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%Y-%m-%d"];

/// Display layout for a parsed air date.
const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// A single episode as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub name: String,
    /// Air date exactly as the remote sent it.
    pub air_date: String,
    /// `S<season>E<episode>`, e.g. `S01E02`.
    pub code: String,
    pub url: String,
    pub created: DateTime<Utc>,
    pub character_urls: Vec<Url>,
}

/// Season/episode pair parsed from an episode code.
///
/// Ordered by season first, then episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct EpisodeNumber {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeNumber {
    /// Parse `S<digits>E<digits>`. Anything else yields `(0, 0)`.
    pub fn parse(code: &str) -> Self {
        Self::try_parse(code).unwrap_or_default()
    }

    fn try_parse(code: &str) -> Option<Self> {
        let rest = code.strip_prefix('S')?;
        let (season, episode) = rest.split_once('E')?;
        Some(Self {
            season: parse_digits(season)?,
            episode: parse_digits(episode)?,
        })
    }
}

impl fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl Episode {
    pub fn number(&self) -> EpisodeNumber {
        EpisodeNumber::parse(&self.code)
    }

    pub fn season(&self) -> u32 {
        self.number().season
    }

    pub fn episode_in_season(&self) -> u32 {
        self.number().episode
    }

    /// Character IDs taken from the last path segment of each character URL,
    /// in order. URLs whose segment is not an integer are skipped.
    pub fn character_ids(&self) -> Vec<i64> {
        self.character_urls.iter().filter_map(id_from_url).collect()
    }

    /// Air date as `dd/mm/yyyy`, or the raw string when no known layout matches.
    pub fn formatted_air_date(&self) -> String {
        format_air_date(&self.air_date)
    }

    /// Compare by `(season, episode)`.
    pub fn cmp_by_number(&self, other: &Self) -> Ordering {
        self.number().cmp(&other.number())
    }
}

/// Sort episodes by `(season, episode)`. Ties keep their input order.
pub fn sort_episodes(episodes: &mut [Episode]) {
    episodes.sort_by_key(Episode::number);
}

pub(crate) fn id_from_url(url: &Url) -> Option<i64> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?
        .parse()
        .ok()
}

pub(crate) fn format_air_date(raw: &str) -> String {
    AIR_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw.trim(), format).ok())
        .map(|date| date.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}
