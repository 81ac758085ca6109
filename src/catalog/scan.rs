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

//! Incremental library scanning.
//!
//! This module handles the discovery of media files below a library root and
//! keeps the in-memory [`Library`] graph in step with the filesystem.
//!
//! It utilizes `WalkDir` for directory traversal and a [`TagReader`] for
//! metadata extraction.
//!
//! # Incremental updates
//!
//! Only the difference between the files on disk and the tracks already
//! known is processed: new files are read and attached, files that vanished
//! are forgotten. A second scan without filesystem changes does nothing.
//!
//! # Failures
//!
//! A file whose tags cannot be read is skipped and reported in the
//! [`ScanReport`]. It is not remembered, so it is retried on the next scan.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::model::Track;

use super::{Library, TagReader};

const PROGRESS_EVERY: usize = 1_000;

/// Settings that drive a scan.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Media file extensions, case-insensitive, without the dot.
    pub extensions: Vec<String>,
    /// Take a missing album artist from the artist tag.
    pub fill_gaps: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "m4a".into()],
            fill_gaps: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub added: Vec<PathBuf>,
    pub removed_tracks: Vec<PathBuf>,
    pub removed_albums: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

impl ScanReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed_tracks.is_empty()
    }

    /// Every removed path, tracks and albums alike.
    pub fn removed_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.removed_tracks.iter().chain(self.removed_albums.iter())
    }
}

fn is_media_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions
                .iter()
                .any(|e| e.trim().trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

/// Lists every media file below `root`.
pub fn list_media_files(root: &Path, extensions: &[String]) -> BTreeSet<PathBuf> {
    let mut found = BTreeSet::new();

    for entry in WalkDir::new(root).into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry below {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_file() && is_media_file(path, extensions) {
            found.insert(path.to_path_buf());
        }
    }

    found
}

impl Library {
    /// Synchronizes the library with the files currently below its root.
    ///
    /// Deleted files are forgotten first, removing albums left without
    /// tracks. New files are then read with `reader`, normalized and
    /// attached to the album of their parent directory.
    pub fn scan(&mut self, reader: &dyn TagReader, settings: &ScanSettings) -> ScanReport {
        let found = list_media_files(self.path_base(), &settings.extensions);
        self.apply_file_set(&found, reader, settings)
    }

    pub(crate) fn apply_file_set(
        &mut self,
        found: &BTreeSet<PathBuf>,
        reader: &dyn TagReader,
        settings: &ScanSettings,
    ) -> ScanReport {
        let existing: BTreeSet<PathBuf> = self.tracks().map(|t| t.path().to_path_buf()).collect();

        let new: Vec<&PathBuf> = found.difference(&existing).collect();
        let deleted: Vec<&PathBuf> = existing.difference(found).collect();

        let mut report = ScanReport::default();

        if !deleted.is_empty() {
            log::info!("Forgetting deleted tracks: {}", deleted.len());

            for path in deleted {
                if let Some((_, removed_album)) = self.remove_track(path) {
                    report.removed_tracks.push(path.clone());
                    report.removed_albums.extend(removed_album);
                }
            }
        }

        if !new.is_empty() {
            log::info!("Memorizing new tracks: {}", new.len());

            for (n, path) in new.into_iter().enumerate() {
                match reader.read(path) {
                    Ok(tags) => {
                        self.insert_track(Track::from_tags(path.clone(), &tags, settings.fill_gaps));
                        report.added.push(path.clone());
                    }
                    Err(e) => {
                        log::warn!("Skipping {}: {}", path.display(), e);
                        report.skipped.push(SkippedFile {
                            path: path.clone(),
                            reason: e.to_string(),
                        });
                    }
                }

                if (n + 1) % PROGRESS_EVERY == 0 {
                    log::debug!("Memorized {} tracks", n + 1);
                }
            }
        }

        report
    }
}
