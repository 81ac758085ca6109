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

//! The decision log and the views derived from it.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use crate::{
    catalog::Library,
    model::{Album, EntityKind, Matchable, Track},
};

use super::{DecisionId, MatchDecision, MatchState};

/// Old entities up for review and the new entities they may be matched with.
#[derive(Debug)]
pub struct View<'a, T> {
    pub old: Vec<&'a T>,
    pub new: Vec<&'a T>,
}

/// Every decision taken so far, in the order they were taken.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionLog {
    decisions: Vec<MatchDecision>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_decisions(decisions: impl IntoIterator<Item = MatchDecision>) -> Self {
        let mut log = Self::new();
        for d in decisions {
            log.push(d);
        }
        log
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchDecision> {
        self.decisions.iter()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn get(&self, id: DecisionId) -> Option<&MatchDecision> {
        self.decisions.iter().find(|d| d.id == id)
    }

    /// Appends a decision, bumping its id if it collides with a logged one.
    pub fn push(&mut self, mut decision: MatchDecision) -> DecisionId {
        while self.get(decision.id).is_some() {
            decision.id = DecisionId(decision.id.0.wrapping_add(1));
        }
        let id = decision.id;
        self.decisions.push(decision);
        id
    }

    /// Decisions matching `keyword` against their presentation or raw paths.
    pub fn search(&self, keyword: &str) -> Vec<&MatchDecision> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Vec::new();
        }
        self.decisions.iter().filter(|d| d.matches_keyword(keyword)).collect()
    }

    /// Removes exactly the decisions with the given ids.
    pub fn remove(&mut self, ids: &[DecisionId]) -> Vec<MatchDecision> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .decisions
            .drain(..)
            .partition(|d| ids.contains(&d.id));
        self.decisions = kept;
        removed
    }

    /// Retracts every decision bound to a deleted path.
    ///
    /// A decision goes when its old entity is in `old_deleted` or its new
    /// entity is in `new_deleted`. Deleted old paths are also pruned from the
    /// omit sets of the decisions that stay.
    pub fn forget_deleted<'p>(
        &mut self,
        old_deleted: impl IntoIterator<Item = &'p PathBuf>,
        new_deleted: impl IntoIterator<Item = &'p PathBuf>,
    ) -> Vec<MatchDecision> {
        let old_deleted: BTreeSet<&Path> = old_deleted.into_iter().map(PathBuf::as_path).collect();
        let new_deleted: BTreeSet<&Path> = new_deleted.into_iter().map(PathBuf::as_path).collect();

        self.retract_where(
            |d| {
                old_deleted.contains(d.old.as_path())
                    || d.new.as_deref().is_some_and(|n| new_deleted.contains(n))
            },
            |omitted| !old_deleted.contains(omitted),
        )
    }

    /// Retracts decisions bound to entities missing from the libraries.
    pub fn retract_stale(&mut self, old: &Library, new: &Library) -> Vec<MatchDecision> {
        let exists = |lib: &Library, kind: EntityKind, path: &Path| match kind {
            EntityKind::Album => lib.album(path).is_some(),
            EntityKind::Track => lib.contains_track(path),
        };

        self.retract_where(
            |d| {
                !exists(old, d.kind, &d.old)
                    || d.new.as_deref().is_some_and(|n| !exists(new, d.kind, n))
            },
            |omitted| old.contains_track(omitted),
        )
    }

    fn retract_where(
        &mut self,
        retract: impl Fn(&MatchDecision) -> bool,
        keep_omitted: impl Fn(&Path) -> bool,
    ) -> Vec<MatchDecision> {
        let (retracted, mut kept): (Vec<_>, Vec<_>) =
            self.decisions.drain(..).partition(|d| retract(d));

        for d in &mut kept {
            d.omit.retain(|p| keep_omitted(p.as_path()));
        }
        self.decisions = kept;

        for d in &retracted {
            log::info!("Retracted decision {}: {}", d.id, d);
        }
        retracted
    }

    /// All states recorded per old entity of one kind.
    fn states(&self, kind: EntityKind) -> BTreeMap<&Path, BTreeSet<MatchState>> {
        let mut states: BTreeMap<&Path, BTreeSet<MatchState>> = BTreeMap::new();
        for d in self.decisions.iter().filter(|d| d.kind == kind) {
            states.entry(d.old.as_path()).or_default().insert(d.state);
        }
        states
    }

    /// New entities claimed by a matching decision of one kind.
    fn claimed(&self, kind: EntityKind) -> BTreeSet<&Path> {
        self.decisions
            .iter()
            .filter(|d| d.kind == kind && d.state.is_match())
            .filter_map(|d| d.new.as_deref())
            .collect()
    }

    fn view<'a, T: Matchable>(
        &self,
        kind: EntityKind,
        old: impl Iterator<Item = &'a T>,
        new: impl Iterator<Item = &'a T>,
        eligible: impl Fn(Option<&BTreeSet<MatchState>>) -> bool,
        skip_claimed: bool,
    ) -> View<'a, T> {
        let states = self.states(kind);
        let claimed = if skip_claimed {
            self.claimed(kind)
        } else {
            BTreeSet::new()
        };

        View {
            old: old.filter(|e| eligible(states.get(e.key()))).collect(),
            new: new.filter(|e| !claimed.contains(e.key())).collect(),
        }
    }

    /// Old albums without a terminal verdict, against unclaimed new albums.
    ///
    /// Deferred (`Unknown`) albums stay in this view.
    pub fn undecided_albums<'a>(&self, old: &'a Library, new: &'a Library) -> View<'a, Album> {
        self.view(
            EntityKind::Album,
            old.albums().values(),
            new.albums().values(),
            is_undecided,
            true,
        )
    }

    /// Old albums not yet matched, deferred or confirmed to have no match,
    /// against every new album.
    ///
    /// Albums that were never reviewed are part of this view.
    pub fn unconfirmed_albums<'a>(&self, old: &'a Library, new: &'a Library) -> View<'a, Album> {
        self.view(
            EntityKind::Album,
            old.albums().values(),
            new.albums().values(),
            is_unconfirmed,
            false,
        )
    }

    /// Old tracks without a track-level verdict, against unclaimed new tracks.
    pub fn undecided_tracks<'a>(&self, old: &'a Library, new: &'a Library) -> View<'a, Track> {
        self.view(EntityKind::Track, old.tracks(), new.tracks(), is_undecided, true)
    }

    /// Old tracks that still have to be carried over into the new library.
    ///
    /// These are the tracks of unmatched albums, the omitted tracks of
    /// partial matches and tracks individually found to have no match,
    /// except tracks of fully matched albums.
    pub fn carry_over_tracks(&self, old: &Library) -> BTreeSet<PathBuf> {
        let albums = self.states(EntityKind::Album);
        let tracks = self.states(EntityKind::Track);
        let mut wanted = BTreeSet::new();

        let omitted: BTreeSet<&Path> = self
            .decisions
            .iter()
            .filter(|d| d.kind == EntityKind::Album && d.state == MatchState::Partial)
            .flat_map(|d| d.omit.iter().map(PathBuf::as_path))
            .collect();

        for album in old.albums().values() {
            let states = albums.get(album.path());
            let fully_matched = states.is_some_and(|s| s.contains(&MatchState::Matched));
            let partial = states.is_some_and(|s| s.contains(&MatchState::Partial));
            let unmatched = states.is_some_and(|s| {
                s.contains(&MatchState::Unmatched) || s.contains(&MatchState::ConfirmedUnmatched)
            });

            if fully_matched {
                continue;
            }

            for track in album.tracks().values() {
                let path = track.path();
                let track_states = tracks.get(path);
                let track_matched = track_states.is_some_and(|s| s.iter().any(MatchState::is_match));
                let track_unmatched = track_states.is_some_and(|s| {
                    s.contains(&MatchState::Unmatched) || s.contains(&MatchState::ConfirmedUnmatched)
                });

                let carry = if partial {
                    omitted.contains(path)
                } else {
                    unmatched || (track_unmatched && !track_matched)
                };

                if carry {
                    wanted.insert(path.to_path_buf());
                }
            }
        }

        wanted
    }

    /// Number of decisions per state.
    pub fn counts(&self) -> BTreeMap<MatchState, usize> {
        let mut counts: BTreeMap<MatchState, usize> =
            MatchState::ALL.into_iter().map(|s| (s, 0)).collect();
        for d in &self.decisions {
            *counts.entry(d.state).or_default() += 1;
        }
        counts
    }
}

fn is_undecided(states: Option<&BTreeSet<MatchState>>) -> bool {
    states.is_none_or(|s| s.iter().all(|state| *state == MatchState::Unknown))
}

fn is_unconfirmed(states: Option<&BTreeSet<MatchState>>) -> bool {
    states.is_none_or(|s| {
        !s.iter().any(|state| {
            matches!(
                state,
                MatchState::Matched
                    | MatchState::Partial
                    | MatchState::Unknown
                    | MatchState::ConfirmedUnmatched
            )
        })
    })
}
