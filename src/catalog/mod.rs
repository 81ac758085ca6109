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

//! Media catalog management.
//!
//! A [`Library`] owns the complete track and album graph found below one
//! root directory. Albums are keyed by directory and own their tracks; a
//! track refers back to its album by path only.
//!
//! The graph is kept up to date incrementally by [`Library::scan`], which
//! compares the files currently on disk with the tracks already known.

mod scan;
mod tags;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::model::{Album, Side, Track};

pub use scan::{ScanReport, ScanSettings, list_media_files};
pub use tags::{LoftyTagReader, RawTags, TagReader};

#[derive(Debug, Clone)]
pub struct Library {
    side: Side,
    path_base: PathBuf,
    albums: BTreeMap<PathBuf, Album>,
}

impl Library {
    pub fn new(side: Side, path_base: impl Into<PathBuf>) -> Self {
        Self {
            side,
            path_base: path_base.into(),
            albums: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn path_base(&self) -> &Path {
        &self.path_base
    }

    pub fn albums(&self) -> &BTreeMap<PathBuf, Album> {
        &self.albums
    }

    pub fn album(&self, path: &Path) -> Option<&Album> {
        self.albums.get(path)
    }

    /// All tracks of the library, in path order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        let mut tracks: Vec<&Track> = self.albums.values().flat_map(|a| a.tracks().values()).collect();
        tracks.sort_by(|a, b| a.path().cmp(b.path()));
        tracks.into_iter()
    }

    pub fn track(&self, path: &Path) -> Option<&Track> {
        path.parent()
            .and_then(|parent| self.albums.get(parent))
            .and_then(|album| album.track(path))
    }

    pub fn contains_track(&self, path: &Path) -> bool {
        self.track(path).is_some()
    }

    pub fn track_count(&self) -> usize {
        self.albums.values().map(Album::len).sum()
    }

    /// Attaches a track to the album of its parent directory, creating the
    /// album when it does not exist yet.
    pub fn insert_track(&mut self, track: Track) {
        let album_path = track.album_path().to_path_buf();
        self.albums
            .entry(album_path.clone())
            .or_insert_with(|| Album::new(album_path))
            .add_track(track);
    }

    /// Removes a track. Returns the album path as well when the album was
    /// left empty and has been removed with it.
    pub fn remove_track(&mut self, path: &Path) -> Option<(Track, Option<PathBuf>)> {
        let parent = path.parent()?;
        let album = self.albums.get_mut(parent)?;
        let track = album.remove_track(path)?;

        let removed_album = if album.is_empty() {
            self.albums.remove(parent);
            Some(parent.to_path_buf())
        } else {
            None
        };

        Some((track, removed_album))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Value};

    fn track(path: &str) -> Track {
        Track::new(PathBuf::from(path), [(Field::Title, Value::text(path))])
    }

    #[test]
    fn insert_creates_albums_per_directory() {
        let mut lib = Library::new(Side::Old, "/m");
        lib.insert_track(track("/m/A/X/1.mp3"));
        lib.insert_track(track("/m/A/X/2.mp3"));
        lib.insert_track(track("/m/B/Y/1.mp3"));

        assert_eq!(lib.albums().len(), 2);
        assert_eq!(lib.track_count(), 3);
        assert_eq!(lib.album(Path::new("/m/A/X")).map(Album::len), Some(2));
        assert!(lib.contains_track(Path::new("/m/B/Y/1.mp3")));
    }

    #[test]
    fn removing_last_track_removes_album() {
        let mut lib = Library::new(Side::Old, "/m");
        lib.insert_track(track("/m/A/X/1.mp3"));
        lib.insert_track(track("/m/A/X/2.mp3"));

        let (_, gone) = lib.remove_track(Path::new("/m/A/X/1.mp3")).unwrap();
        assert!(gone.is_none());

        let (_, gone) = lib.remove_track(Path::new("/m/A/X/2.mp3")).unwrap();
        assert_eq!(gone, Some(PathBuf::from("/m/A/X")));
        assert!(lib.albums().is_empty());
        assert!(lib.remove_track(Path::new("/m/A/X/2.mp3")).is_none());
    }

    #[test]
    fn tracks_iterate_in_path_order() {
        let mut lib = Library::new(Side::New, "/m");
        lib.insert_track(track("/m/B/1.mp3"));
        lib.insert_track(track("/m/A/2.mp3"));
        lib.insert_track(track("/m/A/1.mp3"));

        let paths: Vec<&Path> = lib.tracks().map(Track::path).collect();
        assert_eq!(
            paths,
            vec![Path::new("/m/A/1.mp3"), Path::new("/m/A/2.mp3"), Path::new("/m/B/1.mp3")]
        );
    }
}
