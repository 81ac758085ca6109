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

//! Tag extraction.
//!
//! Embedded metadata is read through the [`TagReader`] trait so that the
//! scanner does not depend on a particular tagging library. The production
//! implementation uses `Lofty`.

use std::{path::Path, time::Duration};

use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use thiserror::Error;

/// The fixed set of raw tag fields the scanner consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTags {
    pub album: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub track_number: Option<u32>,
    pub composer: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("failed to read tags: {0}")]
    Read(#[from] lofty::error::LoftyError),
}

/// Reads raw tag data for one media file.
pub trait TagReader {
    fn read(&self, path: &Path) -> Result<RawTags, TagError>;
}

/// Tag reader backed by `Lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<RawTags, TagError> {
        let tagged_file = Probe::open(path).and_then(|p| p.read())?;

        let duration = Some(tagged_file.properties().duration()).filter(|d| !d.is_zero());

        // A file without any tag is still a valid track, it is matched on
        // its filename and duration only.
        let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
            return Ok(RawTags {
                duration,
                ..RawTags::default()
            });
        };

        let item_text = |key: ItemKey| {
            tag.get(key)
                .and_then(|item| item.value().text())
                .map(|s| s.to_string())
        };

        Ok(RawTags {
            album: tag.album().map(|s| s.to_string()),
            title: tag.title().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            album_artist: item_text(ItemKey::AlbumArtist),
            track_number: tag.track(),
            composer: item_text(ItemKey::Composer),
            genre: tag.genre().map(|s| s.to_string()),
            duration,
        })
    }
}
