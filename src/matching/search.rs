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

//! Candidate search over a pool of entities.

use serde::{Deserialize, Serialize};

use crate::model::Matchable;

use super::{CompareError, score_similarity};

/// Ascending similarity cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub possible: f64,
    pub probable: f64,
    pub confident: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            possible: 0.65,
            probable: 0.80,
            confident: 0.97,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), String> {
        let ordered = 0.0 <= self.possible
            && self.possible <= self.probable
            && self.probable <= self.confident
            && self.confident <= 1.0;

        if ordered {
            Ok(())
        } else {
            Err(format!(
                "thresholds must satisfy 0 <= possible <= probable <= confident <= 1, got {} / {} / {}",
                self.possible, self.probable, self.confident
            ))
        }
    }

    pub fn tier(&self, score: f64) -> Tier {
        if score >= self.confident {
            Tier::Confident
        } else if score >= self.probable {
            Tier::Probable
        } else if score >= self.possible {
            Tier::Possible
        } else {
            Tier::Unlikely
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Confident,
    Probable,
    Possible,
    Unlikely,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Confident => "CONFIDENT",
            Tier::Probable => "LIKELY",
            Tier::Possible | Tier::Unlikely => "A STRETCH",
        }
    }
}

/// The outcome of [`find_best_match`].
#[derive(Debug)]
pub struct BestMatch<'a, T> {
    /// The highest scoring candidate, `None` when nothing scored above zero.
    pub candidate: Option<&'a T>,
    pub score: f64,
    /// Whether some candidate cleared the bar.
    pub satisfied: bool,
}

/// Scans the pool for the best match of `entity`.
///
/// Returns as soon as a candidate reaches the confident threshold. Otherwise
/// the highest scoring candidate is returned, and `satisfied` tells whether
/// any candidate reached the probable threshold, or the possible one when
/// `allow_unlikely` is set. Ties keep the candidate seen first.
pub fn find_best_match<'a, E, T>(
    entity: &E,
    pool: impl IntoIterator<Item = &'a T>,
    thresholds: &Thresholds,
    allow_unlikely: bool,
) -> Result<BestMatch<'a, T>, CompareError>
where
    E: Matchable + ?Sized,
    T: Matchable + 'a,
{
    let mut best = BestMatch {
        candidate: None,
        score: 0.0,
        satisfied: false,
    };

    for candidate in pool {
        let score = score_similarity(entity, candidate)?;

        if score >= thresholds.confident {
            return Ok(BestMatch {
                candidate: Some(candidate),
                score,
                satisfied: true,
            });
        }

        if score >= thresholds.probable || (allow_unlikely && score >= thresholds.possible) {
            best.satisfied = true;
        }

        if score > best.score {
            best.candidate = Some(candidate);
            best.score = score;
        }
    }

    Ok(best)
}

/// Candidates sharing one score.
#[derive(Debug)]
pub struct RankedGroup<'a, T> {
    pub score: f64,
    pub candidates: Vec<&'a T>,
}

/// Ranks the whole pool and returns the `n` best score groups.
///
/// Candidates with the same score are grouped together in pool order.
pub fn find_best_matches<'a, E, T>(
    entity: &E,
    pool: impl IntoIterator<Item = &'a T>,
    n: usize,
) -> Result<Vec<RankedGroup<'a, T>>, CompareError>
where
    E: Matchable + ?Sized,
    T: Matchable + 'a,
{
    let mut scored = Vec::new();
    for candidate in pool {
        scored.push((score_similarity(entity, candidate)?, candidate));
    }

    // Stable sort keeps pool order within equal scores.
    scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));

    let mut groups: Vec<RankedGroup<'a, T>> = Vec::new();
    for (score, candidate) in scored {
        match groups.last_mut() {
            Some(group) if group.score == score => group.candidates.push(candidate),
            _ => {
                if groups.len() == n {
                    break;
                }
                groups.push(RankedGroup {
                    score,
                    candidates: vec![candidate],
                });
            }
        }
    }

    Ok(groups)
}

/// Flattens ranked groups into numbered options, best first.
pub fn flatten_ranked<'a, T>(groups: &[RankedGroup<'a, T>]) -> Vec<(f64, &'a T)> {
    groups
        .iter()
        .flat_map(|g| g.candidates.iter().map(move |c| (g.score, *c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Track, Value};
    use std::path::{Path, PathBuf};

    fn track(path: &str, title: &str) -> Track {
        Track::new(PathBuf::from(path), [(Field::Title, Value::text(title))])
    }

    #[test]
    fn default_thresholds_are_ordered() {
        assert!(Thresholds::default().validate().is_ok());
        let broken = Thresholds {
            possible: 0.9,
            ..Thresholds::default()
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn tier_labels_follow_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.tier(0.99), Tier::Confident);
        assert_eq!(t.tier(0.85), Tier::Probable);
        assert_eq!(t.tier(0.70), Tier::Possible);
        assert_eq!(t.tier(0.10), Tier::Unlikely);
        assert_eq!(t.tier(0.70).label(), "A STRETCH");
    }

    #[test]
    fn confident_match_short_circuits() {
        let entity = track("/old/a.mp3", "abcdefghij");
        let pool = vec![
            track("/new/1.mp3", "abcdefghij"),
            track("/new/2.mp3", "abcdefghij"),
        ];

        let best = find_best_match(&entity, &pool, &Thresholds::default(), true).unwrap();
        assert!(best.satisfied);
        assert_eq!(best.score, 1.0);
        assert_eq!(best.candidate.map(Track::path), Some(Path::new("/new/1.mp3")));
    }

    #[test]
    fn best_candidate_is_returned_with_satisfaction_flag() {
        let entity = track("/old/a.mp3", "abcdefghij");
        // 0.7 similarity: possible but not probable.
        let pool = vec![track("/new/1.mp3", "zzzzzzzzzz"), track("/new/2.mp3", "abcdefgxyz")];

        let best = find_best_match(&entity, &pool, &Thresholds::default(), true).unwrap();
        assert!(best.satisfied);
        assert_eq!(best.candidate.map(Track::path), Some(Path::new("/new/2.mp3")));
        assert!((best.score - 0.7).abs() < 1e-9);

        let strict = find_best_match(&entity, &pool, &Thresholds::default(), false).unwrap();
        assert!(!strict.satisfied);
        assert_eq!(strict.candidate.map(Track::path), Some(Path::new("/new/2.mp3")));
    }

    #[test]
    fn empty_pool_has_no_candidate() {
        let entity = track("/old/a.mp3", "abc");
        let pool: Vec<Track> = Vec::new();
        let best = find_best_match(&entity, &pool, &Thresholds::default(), true).unwrap();
        assert!(best.candidate.is_none());
        assert!(!best.satisfied);
    }

    #[test]
    fn ranked_matches_group_ties_in_pool_order() {
        let entity = track("/old/a.mp3", "abcd");
        let pool = vec![
            track("/new/1.mp3", "abcx"),
            track("/new/2.mp3", "abcd"),
            track("/new/3.mp3", "abcy"),
            track("/new/4.mp3", "zzzz"),
        ];

        let groups = find_best_matches(&entity, &pool, 2).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].score, 1.0);
        assert_eq!(groups[0].candidates.len(), 1);
        let tied: Vec<&Path> = groups[1].candidates.iter().map(|t| t.path()).collect();
        assert_eq!(tied, vec![Path::new("/new/1.mp3"), Path::new("/new/3.mp3")]);

        let flat = flatten_ranked(&groups);
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[0].1.path(), Path::new("/new/2.mp3"));
    }
}
