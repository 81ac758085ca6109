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

use std::path::{Path, PathBuf};

use crate::catalog::RawTags;

use super::{Field, FieldData, Matchable, Value, tail_segments};

/// One media file.
///
/// The path is the only identity a track has across runs; two tracks are
/// equal exactly when their paths are.
#[derive(Debug, Clone)]
pub struct Track {
    path: PathBuf,
    album: PathBuf,
    data: FieldData,
}

impl Track {
    pub const WEIGHTS: &'static [(Field, u32)] = &[
        (Field::Filename, 5),
        (Field::AlbumName, 6),
        (Field::Title, 6),
        (Field::Artist, 2),
        (Field::AlbumArtist, 6),
        (Field::TrackNumber, 2),
        (Field::Composer, 1),
        (Field::Genre, 1),
        (Field::Duration, 5),
    ];

    /// Creates a track from already normalized values.
    ///
    /// The owning album is the parent directory of `path`.
    pub fn new(path: PathBuf, data: impl IntoIterator<Item = (Field, Value)>) -> Self {
        let album = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut field_data = FieldData::with_fields(Self::WEIGHTS.iter().map(|(f, _)| *f));
        field_data.set_data(data);

        Self {
            path,
            album,
            data: field_data,
        }
    }

    /// Creates a track from raw tag data, normalizing every field.
    ///
    /// With `fill_gaps` a missing album artist is taken from the artist.
    pub fn from_tags(path: PathBuf, tags: &RawTags, fill_gaps: bool) -> Self {
        let album_artist = match (&tags.album_artist, fill_gaps) {
            (Some(a), _) => Some(a.as_str()),
            (None, true) => tags.artist.as_deref(),
            (None, false) => None,
        };

        let text = |s: Option<&str>| s.map(Value::text).unwrap_or_default();

        let filename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let data = [
            (Field::Filename, Value::text(&filename)),
            (Field::AlbumName, text(tags.album.as_deref())),
            (Field::Title, text(tags.title.as_deref())),
            (Field::Artist, text(tags.artist.as_deref())),
            (Field::AlbumArtist, text(album_artist)),
            (
                Field::TrackNumber,
                tags.track_number.map(|n| Value::number(f64::from(n))).unwrap_or_default(),
            ),
            (Field::Composer, text(tags.composer.as_deref())),
            (Field::Genre, text(tags.genre.as_deref())),
            (
                Field::Duration,
                tags.duration.map(|d| Value::number(d.as_secs_f64())).unwrap_or_default(),
            ),
        ];

        Self::new(path, data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the owning album. This is a back-reference only.
    pub fn album_path(&self) -> &Path {
        &self.album
    }

    /// The file stem, used to identify the track inside its album.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Track {}

impl Matchable for Track {
    fn key(&self) -> &Path {
        &self.path
    }

    fn data(&self) -> &FieldData {
        &self.data
    }

    fn weights(&self) -> &'static [(Field, u32)] {
        Self::WEIGHTS
    }

    fn present(&self) -> String {
        tail_segments(&self.path, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tags() -> RawTags {
        RawTags {
            album: Some("Help! [Deluxe]".into()),
            title: Some("Yesterday".into()),
            artist: Some("The Beatles".into()),
            album_artist: None,
            track_number: Some(13),
            composer: None,
            genre: Some("Pop".into()),
            duration: Some(Duration::from_secs(125)),
        }
    }

    #[test]
    fn from_tags_normalizes_and_fills_album_artist() {
        let t = Track::from_tags(PathBuf::from("/m/Beatles/Help/13 Yesterday.mp3"), &tags(), true);

        assert_eq!(t.data().get(Field::AlbumName), &Value::Text("help".into()));
        assert_eq!(t.data().get(Field::AlbumArtist), &Value::Text("thebeatles".into()));
        assert_eq!(t.data().get(Field::Filename), &Value::Text("13yesterday".into()));
        assert_eq!(t.data().get(Field::TrackNumber), &Value::Number(13.0));
        assert_eq!(t.data().get(Field::Duration), &Value::Number(125.0));
        assert!(t.data().get(Field::Composer).is_unset());
        assert_eq!(t.album_path(), Path::new("/m/Beatles/Help"));
    }

    #[test]
    fn from_tags_without_fill_gaps_leaves_album_artist_unset() {
        let t = Track::from_tags(PathBuf::from("/m/a/b.mp3"), &tags(), false);
        assert!(t.data().get(Field::AlbumArtist).is_unset());
    }

    #[test]
    fn tracks_are_equal_by_path() {
        let a = Track::new(PathBuf::from("/m/a/b.mp3"), [(Field::Title, Value::text("x"))]);
        let b = Track::new(PathBuf::from("/m/a/b.mp3"), [(Field::Title, Value::text("y"))]);
        let c = Track::new(PathBuf::from("/m/a/c.mp3"), [(Field::Title, Value::text("x"))]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn present_uses_album_dir_and_file_name() {
        let t = Track::new(PathBuf::from("/m/Artist/Album/01.mp3"), std::iter::empty());
        assert_eq!(t.present(), "Album/01.mp3");
    }
}
