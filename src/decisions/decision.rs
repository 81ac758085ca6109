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
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use xxhash_rust::xxh3::Xxh3;

use crate::model::{EntityKind, tail_segments};

use super::MatchState;

/// Identity of a decision, derived from what it binds and when it was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionId(pub u64);

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A verdict binding an old entity to a new one, or to nothing.
///
/// Entities are referenced by path, their only identity that survives a
/// restart.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub id: DecisionId,
    pub kind: EntityKind,
    pub old: PathBuf,
    pub new: Option<PathBuf>,
    pub state: MatchState,
    pub score: f64,
    /// Milliseconds since the Unix epoch.
    pub created_ms: i64,
    /// Tracks inside `old` excluded from the verdict.
    pub omit: BTreeSet<PathBuf>,
}

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

pub(crate) fn decision_id(kind: EntityKind, old: &Path, new: Option<&Path>, created_ms: i64) -> DecisionId {
    let mut hasher = Xxh3::new();
    hasher.update(&[kind as u8]);
    hasher.update(old.as_os_str().as_encoded_bytes());
    hasher.update(&[0]);
    if let Some(new) = new {
        hasher.update(new.as_os_str().as_encoded_bytes());
    }
    hasher.update(&created_ms.to_le_bytes());
    DecisionId(hasher.digest())
}

impl MatchDecision {
    /// Records a verdict made now.
    pub fn new(
        kind: EntityKind,
        old: PathBuf,
        new: Option<PathBuf>,
        state: MatchState,
        score: f64,
        omit: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self::at(kind, old, new, state, score, omit, now_ms())
    }

    /// Records a verdict with an explicit timestamp.
    pub fn at(
        kind: EntityKind,
        old: PathBuf,
        new: Option<PathBuf>,
        state: MatchState,
        score: f64,
        omit: impl IntoIterator<Item = PathBuf>,
        created_ms: i64,
    ) -> Self {
        let id = decision_id(kind, &old, new.as_deref(), created_ms);
        Self {
            id,
            kind,
            old,
            new,
            state,
            score,
            created_ms,
            omit: omit.into_iter().collect(),
        }
    }

    /// Label of the old side, built from path segments.
    pub fn present(&self) -> String {
        tail_segments(&self.old, 2)
    }

    fn present_new(&self) -> String {
        self.new
            .as_deref()
            .map(|p| tail_segments(p, 2))
            .unwrap_or_default()
    }

    /// Whether `keyword` (case-insensitive) appears in the presentation or
    /// in either raw path.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        let haystacks = [
            self.to_string(),
            self.old.to_string_lossy().into_owned(),
            self.new
                .as_deref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ];
        haystacks.iter().any(|h| h.to_lowercase().contains(&keyword))
    }
}

impl fmt::Display for MatchDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = self.present();
        match self.state {
            MatchState::Matched => write!(f, "{old:<80} = {}", self.present_new()),
            MatchState::Partial => write!(
                f,
                "{old:<80} ~ {} ({} omitted)",
                self.present_new(),
                self.omit.len()
            ),
            MatchState::Unmatched => write!(f, "{old:<80} x has no match"),
            MatchState::ConfirmedUnmatched => write!(f, "{old:<80} x confirmed no match"),
            MatchState::Unknown => write!(f, "{old:<80} ? undecided"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(state: MatchState) -> MatchDecision {
        MatchDecision::at(
            EntityKind::Album,
            PathBuf::from("/old/Artist/Album"),
            Some(PathBuf::from("/new/Artist/Album (Remaster)")),
            state,
            0.9,
            [PathBuf::from("/old/Artist/Album/09 Bonus.mp3")],
            1_000,
        )
    }

    #[test]
    fn ids_depend_on_content_and_time() {
        let a = decision(MatchState::Matched);
        let b = decision(MatchState::Partial);
        assert_eq!(a.id, b.id);

        let c = MatchDecision::at(
            EntityKind::Album,
            a.old.clone(),
            a.new.clone(),
            MatchState::Matched,
            0.9,
            Vec::new(),
            2_000,
        );
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn display_reflects_state() {
        assert!(decision(MatchState::Matched).to_string().contains("= Artist/Album (Remaster)"));
        assert!(decision(MatchState::Partial).to_string().contains("(1 omitted)"));
        assert!(decision(MatchState::Unmatched).to_string().ends_with("x has no match"));
        assert!(decision(MatchState::Unknown).to_string().ends_with("? undecided"));
    }

    #[test]
    fn keyword_search_covers_presentation_and_raw_paths() {
        let d = decision(MatchState::Matched);
        assert!(d.matches_keyword("REMASTER"));
        assert!(d.matches_keyword("/old/artist"));
        assert!(!d.matches_keyword("nothing like it"));
    }
}
