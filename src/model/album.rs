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

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use super::{Field, FieldData, Matchable, Track, Value, tail_segments};

/// A directory grouping of tracks.
///
/// The album exclusively owns its tracks. Aggregate data (`track_count`,
/// `artists`, `album_artists`) always reflects the current track mapping.
#[derive(Debug, Clone)]
pub struct Album {
    path: PathBuf,
    tracks: BTreeMap<PathBuf, Track>,
    artists: BTreeSet<String>,
    album_artists: BTreeSet<String>,
    data: FieldData,
}

impl Album {
    pub const WEIGHTS: &'static [(Field, u32)] = &[
        (Field::FolderName, 5),
        (Field::TrackCount, 3),
        (Field::Artists, 2),
        (Field::AlbumArtists, 6),
    ];

    pub fn new(path: PathBuf) -> Self {
        let folder = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut data = FieldData::with_fields(Self::WEIGHTS.iter().map(|(f, _)| *f));
        data.set_data([(Field::FolderName, Value::text(&folder))]);

        Self {
            path,
            tracks: BTreeMap::new(),
            artists: BTreeSet::new(),
            album_artists: BTreeSet::new(),
            data,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tracks(&self) -> &BTreeMap<PathBuf, Track> {
        &self.tracks
    }

    pub fn track(&self, path: &Path) -> Option<&Track> {
        self.tracks.get(path)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Adds a track and folds its artists into the aggregate data.
    pub fn add_track(&mut self, track: Track) {
        if let Value::Text(a) = track.data().get(Field::Artist) {
            self.artists.insert(a.clone());
        }
        if let Value::Text(a) = track.data().get(Field::AlbumArtist) {
            self.album_artists.insert(a.clone());
        }

        self.tracks.insert(track.path().to_path_buf(), track);
        self.refresh_data();
    }

    /// Removes a track, rebuilding the aggregate data from the remaining ones.
    pub fn remove_track(&mut self, path: &Path) -> Option<Track> {
        let removed = self.tracks.remove(path)?;

        self.artists.clear();
        self.album_artists.clear();
        for track in self.tracks.values() {
            if let Value::Text(a) = track.data().get(Field::Artist) {
                self.artists.insert(a.clone());
            }
            if let Value::Text(a) = track.data().get(Field::AlbumArtist) {
                self.album_artists.insert(a.clone());
            }
        }

        self.refresh_data();
        Some(removed)
    }

    /// Finds a track of this album by its file stem.
    pub fn track_by_stem(&self, stem: &str) -> Option<&Track> {
        self.tracks.values().find(|t| t.stem() == stem)
    }

    fn refresh_data(&mut self) {
        let collection = |set: &BTreeSet<String>| {
            if set.is_empty() {
                Value::Unset
            } else {
                Value::Collection(set.iter().cloned().map(Value::Text).collect())
            }
        };

        let data = [
            (Field::TrackCount, Value::number(self.tracks.len() as f64)),
            (Field::Artists, collection(&self.artists)),
            (Field::AlbumArtists, collection(&self.album_artists)),
        ];
        self.data.set_data(data);
    }
}

impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Album {}

impl Matchable for Album {
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

    fn track(path: &str, artist: &str) -> Track {
        Track::new(
            PathBuf::from(path),
            [
                (Field::Artist, Value::text(artist)),
                (Field::AlbumArtist, Value::text(artist)),
            ],
        )
    }

    #[test]
    fn aggregates_follow_added_tracks() {
        let mut album = Album::new(PathBuf::from("/m/Artist/Some Album"));
        album.add_track(track("/m/Artist/Some Album/1.mp3", "Alpha"));
        album.add_track(track("/m/Artist/Some Album/2.mp3", "Beta"));
        album.add_track(track("/m/Artist/Some Album/3.mp3", "Alpha"));

        assert_eq!(album.data().get(Field::FolderName), &Value::Text("somealbum".into()));
        assert_eq!(album.data().get(Field::TrackCount), &Value::Number(3.0));
        assert_eq!(
            album.data().get(Field::Artists),
            &Value::Collection(vec![Value::Text("alpha".into()), Value::Text("beta".into())])
        );
    }

    #[test]
    fn removing_tracks_rebuilds_aggregates() {
        let mut album = Album::new(PathBuf::from("/m/A/B"));
        album.add_track(track("/m/A/B/1.mp3", "Alpha"));
        album.add_track(track("/m/A/B/2.mp3", "Beta"));

        let removed = album.remove_track(Path::new("/m/A/B/2.mp3"));
        assert!(removed.is_some());
        assert_eq!(album.len(), 1);
        assert_eq!(album.data().get(Field::TrackCount), &Value::Number(1.0));
        assert_eq!(
            album.data().get(Field::Artists),
            &Value::Collection(vec![Value::Text("alpha".into())])
        );

        album.remove_track(Path::new("/m/A/B/1.mp3"));
        assert!(album.is_empty());
        assert!(album.data().get(Field::TrackCount).is_unset());
        assert!(album.data().get(Field::Artists).is_unset());
    }

    #[test]
    fn track_by_stem_finds_owned_track() {
        let mut album = Album::new(PathBuf::from("/m/A/B"));
        album.add_track(track("/m/A/B/01 Intro.flac", "Alpha"));
        assert!(album.track_by_stem("01 Intro").is_some());
        assert!(album.track_by_stem("02 Outro").is_none());
    }
}
