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

//! Review passes over the decision log.
//!
//! A pass walks one view of the log, asks a [`Reviewer`] for a verdict on
//! every entity it offers and records the resulting decisions. The reviewer
//! owns all presentation; a pass only turns verdict tokens into decisions.
//!
//! Work is never lost to an interruption: `Save` and `Quit` both write a
//! checkpoint, and every pass writes one when it ends.

use anyhow::Result;

use crate::{
    catalog::Library,
    decisions::{DecisionId, DecisionLog, MatchDecision, MatchState},
    matching::{
        Alignment, Thresholds, Tier, compare_albums, find_best_match, find_best_matches,
        flatten_ranked,
    },
    model::{Album, EntityKind, Matchable},
};

/// Score groups offered when an unmatched album is checked again.
const UNMATCHED_OPTIONS: usize = 10;

const TRACK_PROGRESS_EVERY: usize = 100;

/// Verdict on the best candidate for an undecided album.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateVerdict {
    Match,
    NoMatch,
    Open,
    Skip,
    Save,
    Quit,
}

/// Verdict on an album provisionally found to have no match.
///
/// Option indices are zero based positions in [`UnmatchedPrompt::options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedVerdict {
    ConfirmNoMatch,
    MatchWith(usize),
    Open(usize),
    Skip,
    Save,
    Quit,
}

/// Verdict on the track alignment of two albums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumVerdict {
    /// Take the alignment as it stands.
    Accept,
    /// Move rows between the aligned and misaligned lists, then ask again.
    Revise {
        to_misaligned: Vec<usize>,
        to_aligned: Vec<usize>,
    },
    ForceMatch,
    ForceUnmatch,
    /// Record the pair as undecided.
    Defer,
}

pub struct CandidatePrompt<'a> {
    pub old: &'a Album,
    pub candidate: &'a Album,
    pub score: f64,
    pub tier: Tier,
    pub position: usize,
    pub total: usize,
}

pub struct UnmatchedPrompt<'a> {
    pub old: &'a Album,
    pub options: &'a [(f64, &'a Album)],
    pub position: usize,
    pub total: usize,
}

pub struct AlignmentPrompt<'a> {
    pub old: &'a Album,
    pub new: &'a Album,
    pub alignment: &'a Alignment,
}

/// The human side of a review.
pub trait Reviewer {
    fn review_candidate(&mut self, prompt: &CandidatePrompt<'_>) -> Result<CandidateVerdict>;

    fn review_unmatched(&mut self, prompt: &UnmatchedPrompt<'_>) -> Result<UnmatchedVerdict>;

    fn review_alignment(&mut self, prompt: &AlignmentPrompt<'_>) -> Result<AlbumVerdict>;

    /// Shows two albums side by side.
    fn inspect(&mut self, old: &Album, new: &Album) -> Result<()>;

    /// Picks the decisions to remove among the ones found by an undo
    /// search. Returns positions in `found`.
    fn select_decisions(&mut self, found: &[&MatchDecision]) -> Result<Vec<usize>>;
}

/// Somewhere to persist the decision log mid-session.
pub trait Checkpoint {
    fn save(&mut self, log: &DecisionLog) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Finished,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub offered: usize,
    pub recorded: usize,
    pub outcome: PassOutcome,
}

impl Default for PassSummary {
    fn default() -> Self {
        Self {
            offered: 0,
            recorded: 0,
            outcome: PassOutcome::Finished,
        }
    }
}

/// Both libraries and the decision log for the length of one command.
pub struct Session<'a> {
    old: &'a Library,
    new: &'a Library,
    log: DecisionLog,
    thresholds: Thresholds,
}

impl<'a> Session<'a> {
    pub fn new(old: &'a Library, new: &'a Library, log: DecisionLog, thresholds: Thresholds) -> Self {
        Self {
            old,
            new,
            log,
            thresholds,
        }
    }

    pub fn log(&self) -> &DecisionLog {
        &self.log
    }

    /// Drops decisions bound to entities that are no longer in the libraries.
    pub fn retract_stale(&mut self) -> Vec<MatchDecision> {
        self.log.retract_stale(self.old, self.new)
    }

    fn record(&mut self, decision: MatchDecision, summary: &mut PassSummary) {
        log::info!("Recorded {}", decision);
        self.log.push(decision);
        summary.recorded += 1;
    }

    /// Offers every undecided old album its best candidate.
    ///
    /// A new album taken by a match leaves the pool for the rest of the pass.
    /// An album with no candidate left is recorded as unmatched without
    /// asking, so the check-unmatched pass and the sync pick it up.
    ///
    /// # Errors
    ///
    /// Fails on a comparison error, a reviewer error or a failed checkpoint.
    pub fn review_undecided(
        &mut self,
        reviewer: &mut dyn Reviewer,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<PassSummary> {
        let view = self.log.undecided_albums(self.old, self.new);
        let mut pool = view.new;
        let total = view.old.len();
        let mut summary = PassSummary::default();

        for (position, old) in view.old.into_iter().enumerate() {
            let best = find_best_match(old, pool.iter().copied(), &self.thresholds, true)?;
            let Some(candidate) = best.candidate else {
                log::info!("No candidate left for {}", old.present());
                self.record(unmatched(old, MatchState::Unmatched, 0.0), &mut summary);
                continue;
            };

            summary.offered += 1;
            let prompt = CandidatePrompt {
                old,
                candidate,
                score: best.score,
                tier: self.thresholds.tier(best.score),
                position,
                total,
            };

            loop {
                match reviewer.review_candidate(&prompt)? {
                    CandidateVerdict::Match => {
                        let decision = self.settle_album(reviewer, old, candidate, best.score)?;
                        if decision.state.is_match() {
                            pool.retain(|a| a.path() != candidate.path());
                        }
                        self.record(decision, &mut summary);
                        break;
                    }
                    CandidateVerdict::NoMatch => {
                        let decision = unmatched(old, MatchState::Unmatched, best.score);
                        self.record(decision, &mut summary);
                        break;
                    }
                    CandidateVerdict::Open => reviewer.inspect(old, candidate)?,
                    CandidateVerdict::Skip => break,
                    CandidateVerdict::Save => checkpoint.save(&self.log)?,
                    CandidateVerdict::Quit => {
                        checkpoint.save(&self.log)?;
                        summary.outcome = PassOutcome::Quit;
                        return Ok(summary);
                    }
                }
            }
        }

        checkpoint.save(&self.log)?;
        Ok(summary)
    }

    /// Offers every provisionally unmatched album its best ranked options
    /// from the whole new library, to confirm or overturn the verdict.
    ///
    /// # Errors
    ///
    /// Fails on a comparison error, a reviewer error or a failed checkpoint.
    pub fn check_unmatched(
        &mut self,
        reviewer: &mut dyn Reviewer,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<PassSummary> {
        let view = self.log.unconfirmed_albums(self.old, self.new);
        let total = view.old.len();
        let mut summary = PassSummary::default();

        for (position, old) in view.old.into_iter().enumerate() {
            let groups = find_best_matches(old, view.new.iter().copied(), UNMATCHED_OPTIONS)?;
            let options = flatten_ranked(&groups);
            summary.offered += 1;

            loop {
                let prompt = UnmatchedPrompt {
                    old,
                    options: &options,
                    position,
                    total,
                };

                match reviewer.review_unmatched(&prompt)? {
                    UnmatchedVerdict::ConfirmNoMatch => {
                        let score = options.first().map(|(s, _)| *s).unwrap_or_default();
                        let decision = unmatched(old, MatchState::ConfirmedUnmatched, score);
                        self.record(decision, &mut summary);
                        break;
                    }
                    UnmatchedVerdict::MatchWith(n) => match options.get(n) {
                        Some(&(score, candidate)) => {
                            let decision = self.settle_album(reviewer, old, candidate, score)?;
                            self.record(decision, &mut summary);
                            break;
                        }
                        None => log::warn!("No option {} for {}", n + 1, old.present()),
                    },
                    UnmatchedVerdict::Open(n) => match options.get(n) {
                        Some(&(_, candidate)) => reviewer.inspect(old, candidate)?,
                        None => log::warn!("No option {} for {}", n + 1, old.present()),
                    },
                    UnmatchedVerdict::Skip => break,
                    UnmatchedVerdict::Save => checkpoint.save(&self.log)?,
                    UnmatchedVerdict::Quit => {
                        checkpoint.save(&self.log)?;
                        summary.outcome = PassOutcome::Quit;
                        return Ok(summary);
                    }
                }
            }
        }

        checkpoint.save(&self.log)?;
        Ok(summary)
    }

    /// Decides every undecided old track without asking anyone.
    ///
    /// A candidate at or above the probable bar is recorded as a match and
    /// leaves the pool; otherwise the track is recorded as unmatched.
    ///
    /// # Errors
    ///
    /// Fails on a comparison error or a failed checkpoint.
    pub fn auto_tracks(&mut self, checkpoint: &mut dyn Checkpoint) -> Result<PassSummary> {
        let view = self.log.undecided_tracks(self.old, self.new);
        let mut pool = view.new;
        let total = view.old.len();
        let mut summary = PassSummary::default();

        for (n, old) in view.old.into_iter().enumerate() {
            let best = find_best_match(old, pool.iter().copied(), &self.thresholds, false)?;
            summary.offered += 1;

            let decision = match best.candidate {
                Some(candidate) if best.satisfied => {
                    pool.retain(|t| t.path() != candidate.path());
                    MatchDecision::new(
                        EntityKind::Track,
                        old.path().to_path_buf(),
                        Some(candidate.path().to_path_buf()),
                        MatchState::Matched,
                        best.score,
                        Vec::new(),
                    )
                }
                _ => MatchDecision::new(
                    EntityKind::Track,
                    old.path().to_path_buf(),
                    None,
                    MatchState::Unmatched,
                    best.score,
                    Vec::new(),
                ),
            };
            self.record(decision, &mut summary);

            if (n + 1) % TRACK_PROGRESS_EVERY == 0 {
                log::info!("Decided {} of {total} tracks", n + 1);
            }
        }

        checkpoint.save(&self.log)?;
        Ok(summary)
    }

    /// Aligns the tracks of two albums and turns the album verdict into a
    /// decision. A full alignment is a match without asking.
    fn settle_album(
        &self,
        reviewer: &mut dyn Reviewer,
        old: &Album,
        new: &Album,
        score: f64,
    ) -> Result<MatchDecision> {
        let mut alignment = compare_albums(old, new, &self.thresholds)?;
        if alignment.misaligned.is_empty() {
            return Ok(MatchDecision::new(
                EntityKind::Album,
                old.path().to_path_buf(),
                Some(new.path().to_path_buf()),
                MatchState::Matched,
                score,
                Vec::new(),
            ));
        }

        loop {
            let prompt = AlignmentPrompt {
                old,
                new,
                alignment: &alignment,
            };

            let (state, omit, target) = match reviewer.review_alignment(&prompt)? {
                AlbumVerdict::Accept => {
                    let (state, omit) = alignment.proposal();
                    (state, omit, Some(new))
                }
                AlbumVerdict::Revise {
                    to_misaligned,
                    to_aligned,
                } => {
                    alignment.revise(&to_misaligned, &to_aligned);
                    continue;
                }
                AlbumVerdict::ForceMatch => {
                    alignment.force_aligned();
                    let (state, omit) = alignment.proposal();
                    (state, omit, Some(new))
                }
                AlbumVerdict::ForceUnmatch => (MatchState::Unmatched, Vec::new(), None),
                AlbumVerdict::Defer => (MatchState::Unknown, Vec::new(), Some(new)),
            };

            return Ok(MatchDecision::new(
                EntityKind::Album,
                old.path().to_path_buf(),
                target.map(|a| a.path().to_path_buf()),
                state,
                score,
                omit,
            ));
        }
    }
}

fn unmatched(old: &Album, state: MatchState, score: f64) -> MatchDecision {
    MatchDecision::new(
        EntityKind::Album,
        old.path().to_path_buf(),
        None,
        state,
        score,
        Vec::new(),
    )
}

/// Searches the log for `keyword` and removes the decisions the reviewer
/// picks among the hits. Nothing is removed without an explicit pick.
///
/// # Errors
///
/// Fails when the reviewer fails.
pub fn undo(log: &mut DecisionLog, keyword: &str, reviewer: &mut dyn Reviewer) -> Result<Vec<MatchDecision>> {
    let found = log.search(keyword);
    if found.is_empty() {
        return Ok(Vec::new());
    }

    let picks = reviewer.select_decisions(&found)?;
    let ids: Vec<DecisionId> = picks
        .iter()
        .filter_map(|&i| found.get(i).map(|d| d.id))
        .collect();

    let removed = log.remove(&ids);
    for d in &removed {
        log::info!("Removed decision {}: {}", d.id, d);
    }
    Ok(removed)
}
