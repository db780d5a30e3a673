//! Characters referenced by episodes, fetched one at a time by ID.
//!
//! The wire shape decodes directly into `Character`; the derived accessors
//! follow the same fallback-over-failure rule as `Episode`.

use serde::{Deserialize, Serialize};
use url::Url;

/// A character as returned by `GET <base>/character/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    /// Raw status, usually `Alive`, `Dead` or `unknown`.
    pub status: String,
    pub species: String,
    /// Sub-type; often empty.
    #[serde(rename = "type")]
    pub type_tag: String,
    pub gender: String,
    pub origin: Location,
    pub location: Location,
    pub image: String,
    /// URLs of the episodes this character appears in.
    pub episode: Vec<String>,
    pub url: String,
    pub created: String,
}

/// A named place reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterStatus {
    Alive,
    Dead,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Red,
    Gray,
}

impl CharacterStatus {
    /// Case-insensitive; anything other than `alive` or `dead` is `Unknown`.
    pub fn from_raw(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("alive") {
            CharacterStatus::Alive
        } else if raw.eq_ignore_ascii_case("dead") {
            CharacterStatus::Dead
        } else {
            CharacterStatus::Unknown
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            CharacterStatus::Alive => "●",
            CharacterStatus::Dead => "✕",
            CharacterStatus::Unknown => "?",
        }
    }

    pub fn color(self) -> StatusColor {
        match self {
            CharacterStatus::Alive => StatusColor::Green,
            CharacterStatus::Dead => StatusColor::Red,
            CharacterStatus::Unknown => StatusColor::Gray,
        }
    }
}

impl Character {
    pub fn status(&self) -> CharacterStatus {
        CharacterStatus::from_raw(&self.status)
    }

    pub fn status_glyph(&self) -> &'static str {
        self.status().glyph()
    }

    pub fn status_color(&self) -> StatusColor {
        self.status().color()
    }

    pub fn episode_count(&self) -> usize {
        self.episode.len()
    }

    pub fn origin_name(&self) -> &str {
        &self.origin.name
    }

    pub fn current_location_name(&self) -> &str {
        &self.location.name
    }

    /// The avatar URL, or `None` when `image` is not an absolute URL.
    pub fn image_url(&self) -> Option<Url> {
        Url::parse(&self.image).ok()
    }
}
