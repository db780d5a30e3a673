//! CSV export of a single character.
//!
//! Fields are written as-is, without quoting. A name such as
//! `Mr. Poopybutthole, Jr.` therefore produces a row with an extra column;
//! consumers that need strict CSV must not rely on this format.

// TODO: quote fields per RFC 4180 once export consumers sign off on the format change.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::character::Character;

pub const CSV_HEADER: &str = "Name,Status,Species,Origin,Episode Count";

/// Header line plus one data row, each terminated by `\n`.
pub fn character_csv(character: &Character) -> Vec<u8> {
    format!(
        "{CSV_HEADER}\n{},{},{},{},{}\n",
        character.name,
        character.status,
        character.species,
        character.origin_name(),
        character.episode_count()
    )
    .into_bytes()
}

/// `character_<id>_<name>.csv`, with whitespace in the name turned into `_`
/// and anything other than alphanumerics, `-` and `_` dropped.
pub fn export_file_name(character: &Character) -> String {
    let name: String = character
        .name
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect();
    format!("character_{}_{name}.csv", character.id)
}

/// Write the CSV into `dir`, creating it if needed, and return the file path.
pub fn write_csv(dir: &Path, character: &Character) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(character));
    fs::write(&path, character_csv(character))?;
    Ok(path)
}
