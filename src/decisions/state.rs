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

use std::fmt;

/// Verdict of a review.
///
/// * `Unknown`: looked at, left undecided. Offered again in the next pass.
/// * `Matched`: old and new are the same, down to every track.
/// * `Partial`: matched, but the decision's omit set lists old tracks that
///   are missing from new and remain unresolved.
/// * `Unmatched`: provisionally no match. Offered again when unmatched
///   albums are checked.
/// * `ConfirmedUnmatched`: no match, never offered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchState {
    Unknown,
    Matched,
    Partial,
    Unmatched,
    ConfirmedUnmatched,
}

impl MatchState {
    pub const ALL: [MatchState; 5] = [
        MatchState::Unknown,
        MatchState::Matched,
        MatchState::Partial,
        MatchState::Unmatched,
        MatchState::ConfirmedUnmatched,
    ];

    /// Stable numeric code used in persisted decisions.
    pub fn code(&self) -> i64 {
        match self {
            MatchState::Unknown => 0,
            MatchState::Matched => 1,
            MatchState::Partial => 2,
            MatchState::Unmatched => 3,
            MatchState::ConfirmedUnmatched => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Whether the state binds the old entity to a new one.
    pub fn is_match(&self) -> bool {
        matches!(self, MatchState::Matched | MatchState::Partial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchState::Unknown => "unknown",
            MatchState::Matched => "matched",
            MatchState::Partial => "partial",
            MatchState::Unmatched => "unmatched",
            MatchState::ConfirmedUnmatched => "confirmed-unmatched",
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
