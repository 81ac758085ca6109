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

//! Similarity scoring and candidate search.
//!
//! One comparison algorithm serves every [`Matchable`](crate::model::Matchable)
//! entity. Candidate search and album alignment are built on top of it.

mod align;
mod compare;
mod search;

pub use align::{Alignment, TrackPair, compare_albums};
pub use compare::{CompareError, measure_similarity, score_similarity};
pub use search::{Thresholds, Tier, find_best_match, find_best_matches, flatten_ranked};
