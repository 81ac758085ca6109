// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Domain models and core data structures.
//!
//! This module defines the two comparable entities of a library, [`Track`]
//! and [`Album`], together with the normalized field data they carry and the
//! weights used when measuring how alike two entities are.
//!
//! Field values are resolved into a [`Value`] once, when the entity is built,
//! so that comparison never has to guess the shape of the data.

mod album;
mod track;

use std::{collections::BTreeMap, fmt, path::Path};

pub use album::Album;
pub use track::Track;

/// Which side of the reconciliation a library (or an entity) lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Old,
    New,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Old => "old",
            Side::New => "new",
        }
    }
}

/// The kind of entity a decision is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Track,
    Album,
}

/// Named fields of an entity.
///
/// Tracks and albums declare disjoint subsets of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Filename,
    AlbumName,
    Title,
    Artist,
    AlbumArtist,
    TrackNumber,
    Composer,
    Genre,
    Duration,
    FolderName,
    TrackCount,
    Artists,
    AlbumArtists,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Filename => "filename",
            Field::AlbumName => "album_name",
            Field::Title => "title",
            Field::Artist => "artist",
            Field::AlbumArtist => "album_artist",
            Field::TrackNumber => "track_number",
            Field::Composer => "composer",
            Field::Genre => "genre",
            Field::Duration => "duration",
            Field::FolderName => "folder_name",
            Field::TrackCount => "track_count",
            Field::Artists => "artists",
            Field::AlbumArtists => "album_artists",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, comparable field value.
///
/// `Unset` marks an absent field. It is never an empty string, so that the
/// comparator can tell "absent" apart from "different".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Unset,
    Text(String),
    Number(f64),
    Collection(Vec<Value>),
}

impl Value {
    /// Builds a text value from a raw tag, normalizing it.
    pub fn text(raw: &str) -> Self {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            Value::Unset
        } else {
            Value::Text(normalized)
        }
    }

    /// Builds a numeric value, treating non-positive or non-finite input as absent.
    pub fn number(n: f64) -> Self {
        if n.is_finite() && n > 0.0 {
            Value::Number(n)
        } else {
            Value::Unset
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unset => "unset",
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Collection(_) => "collection",
        }
    }
}

/// Normalizes a raw tag value.
///
/// A trailing bracketed annotation (`"Song [Live]"`) is cut off, everything
/// that is not alphanumeric is dropped and the rest is case-folded. The raw
/// form is not kept.
pub fn normalize(raw: &str) -> String {
    let trimmed = match raw.rfind(" [") {
        Some(idx) => &raw[..idx],
        None => raw,
    };

    trimmed
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Field data of one entity.
///
/// Every declared field is always present, holding [`Value::Unset`] until
/// data is supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    values: BTreeMap<Field, Value>,
}

impl FieldData {
    /// Creates field data with every declared field unset.
    pub fn with_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            values: fields.into_iter().map(|f| (f, Value::Unset)).collect(),
        }
    }

    /// Overlays the supplied values onto the declared fields.
    ///
    /// Fields the entity does not declare are ignored.
    pub fn set_data(&mut self, data: impl IntoIterator<Item = (Field, Value)>) {
        for (field, value) in data {
            match self.values.get_mut(&field) {
                Some(slot) => *slot = value,
                None => log::debug!("Ignoring undeclared field {field}"),
            }
        }
    }

    /// Returns the value of a field, `Unset` when the field is not declared.
    pub fn get(&self, field: Field) -> &Value {
        self.values.get(&field).unwrap_or(&Value::Unset)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &Value)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }
}

/// Capability shared by everything the comparator can score.
///
/// The comparator is written against this trait only, so tracks and albums
/// go through the identical algorithm with their own fields and weights.
pub trait Matchable {
    /// The stable identity of the entity: its filesystem path.
    fn key(&self) -> &Path;

    fn data(&self) -> &FieldData;

    /// Declared fields and their relative importance.
    fn weights(&self) -> &'static [(Field, u32)];

    /// A human readable label built from path segments.
    fn present(&self) -> String;
}

/// Joins the last `n` components of a path with `/`.
pub(crate) fn tail_segments(path: &Path, n: usize) -> String {
    let parts: Vec<String> = path
        .components()
        .rev()
        .take(n)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    parts.into_iter().rev().collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalize_drops_trailing_annotation_and_punctuation() {
        assert_eq!(normalize("Yesterday [Remastered 2009]"), "yesterday");
        assert_eq!(normalize("Don't Stop Me Now!"), "dontstopmenow");
        assert_eq!(normalize("  The Beatles  "), "thebeatles");
    }

    #[test]
    fn normalize_only_cuts_the_last_annotation() {
        assert_eq!(normalize("A [b] c [d]"), "abc");
    }

    #[test]
    fn empty_normalized_text_is_unset() {
        assert_eq!(Value::text("!!! "), Value::Unset);
        assert_eq!(Value::text("Song"), Value::Text("song".into()));
    }

    #[test]
    fn zero_numbers_are_unset() {
        assert_eq!(Value::number(0.0), Value::Unset);
        assert_eq!(Value::number(f64::NAN), Value::Unset);
        assert_eq!(Value::number(3.0), Value::Number(3.0));
    }

    #[test]
    fn set_data_keeps_declared_fields_and_ignores_others() {
        let mut data = FieldData::with_fields([Field::Title, Field::Artist]);
        data.set_data([
            (Field::Title, Value::text("Song")),
            (Field::FolderName, Value::text("Folder")),
        ]);

        assert_eq!(data.get(Field::Title), &Value::Text("song".into()));
        assert!(data.get(Field::Artist).is_unset());
        assert!(data.get(Field::FolderName).is_unset());
        assert_eq!(data.iter().count(), 2);
    }

    #[test]
    fn tail_segments_takes_last_components() {
        let p = PathBuf::from("/music/Artist/Album/01 Song.mp3");
        assert_eq!(tail_segments(&p, 2), "Album/01 Song.mp3");
        assert_eq!(tail_segments(&p, 1), "01 Song.mp3");
    }
}
