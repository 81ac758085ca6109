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

//! Track alignment between two albums.
//!
//! Every track of the old album is paired with its best match among the
//! tracks of the new album that are still unclaimed. A paired new track
//! leaves the pool, so it can never be claimed twice. The assignment is
//! greedy: old tracks are visited in path order and there is no
//! backtracking.
//!
//! The inner pass is stricter than the album level: only the probable
//! threshold satisfies a pairing.

use std::path::PathBuf;

use crate::{
    decisions::MatchState,
    model::{Album, Matchable, Track},
};

use super::{CompareError, Thresholds, find_best_match};

/// One row of an alignment: an old track and its best new counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPair {
    pub old: PathBuf,
    pub new: Option<PathBuf>,
    pub score: f64,
}

/// Result of [`compare_albums`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    /// Old tracks with a confident enough partner.
    pub aligned: Vec<TrackPair>,
    /// Old tracks without one. `new` holds the best rejected candidate.
    pub misaligned: Vec<TrackPair>,
}

impl Alignment {
    /// The verdict the alignment suggests on its own: a full match when every
    /// old track found a partner, otherwise a partial one omitting the rest.
    pub fn proposal(&self) -> (MatchState, Vec<PathBuf>) {
        if self.misaligned.is_empty() {
            (MatchState::Matched, Vec::new())
        } else {
            (MatchState::Partial, self.omitted())
        }
    }

    pub fn omitted(&self) -> Vec<PathBuf> {
        self.misaligned.iter().map(|p| p.old.clone()).collect()
    }

    /// Moves the rows at the given indices between the two lists.
    ///
    /// `to_misaligned` indexes `aligned` and `to_aligned` indexes
    /// `misaligned`, both as they are before the call. Out of range indices
    /// are ignored.
    pub fn revise(&mut self, to_misaligned: &[usize], to_aligned: &[usize]) {
        let take = |rows: &mut Vec<TrackPair>, picks: &[usize]| {
            let mut moved = Vec::new();
            let mut kept = Vec::new();
            for (i, row) in rows.drain(..).enumerate() {
                if picks.contains(&i) {
                    moved.push(row);
                } else {
                    kept.push(row);
                }
            }
            *rows = kept;
            moved
        };

        let demoted = take(&mut self.aligned, to_misaligned);
        let promoted = take(&mut self.misaligned, to_aligned);
        self.aligned.extend(promoted);
        self.misaligned.extend(demoted);
    }

    /// Treats every old track as aligned.
    pub fn force_aligned(&mut self) {
        let rest: Vec<TrackPair> = self.misaligned.drain(..).collect();
        self.aligned.extend(rest);
    }
}

/// Aligns the tracks of `old` against the tracks of `new`.
pub fn compare_albums(old: &Album, new: &Album, thresholds: &Thresholds) -> Result<Alignment, CompareError> {
    let mut pool: Vec<&Track> = new.tracks().values().collect();
    let mut alignment = Alignment::default();

    for track in old.tracks().values() {
        let best = find_best_match(track, pool.iter().copied(), thresholds, false)?;

        let pair = TrackPair {
            old: track.path().to_path_buf(),
            new: best.candidate.map(|c| c.key().to_path_buf()),
            score: best.score,
        };

        match (best.satisfied, best.candidate) {
            (true, Some(claimed)) => {
                pool.retain(|t| t.path() != claimed.path());
                alignment.aligned.push(pair);
            }
            _ => alignment.misaligned.push(pair),
        }
    }

    Ok(alignment)
}
