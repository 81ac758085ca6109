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

//! Weighted field-by-field similarity.
//!
//! [`compare`] scores two [`Value`]s of the same shape:
//!
//! * **Text**: normalized Levenshtein similarity.
//! * **Number**: `min / max`, `0.0` when the larger value is not positive.
//! * **Collection**: symmetric best-match average. Every element of either
//!   side contributes its best score against the other side, the sum is
//!   divided by the combined element count. An empty side scores `0.0`.
//!
//! Any other pairing is a [`CompareError`]; a comparison across shapes means
//! the field data does not follow its schema.
//!
//! [`measure_similarity`] applies this to every declared field of a
//! [`Matchable`], skipping fields that are unset on either side.

use thiserror::Error;

use crate::model::{Field, Matchable, Value};

#[derive(Debug, Error, PartialEq)]
pub enum CompareError {
    #[error("cannot compare {left} with {right}")]
    Mismatch {
        left: &'static str,
        right: &'static str,
    },

    #[error("cannot compare {field}: {source}")]
    Field {
        field: Field,
        #[source]
        source: Box<CompareError>,
    },
}

/// Scores the similarity of two values in `[0, 1]`.
pub fn compare(a: &Value, b: &Value) -> Result<f64, CompareError> {
    match (a, b) {
        (Value::Text(a), Value::Text(b)) => Ok(compare_text(a, b)),
        (Value::Number(a), Value::Number(b)) => Ok(compare_numbers(*a, *b)),
        (Value::Collection(a), Value::Collection(b)) => compare_collections(a, b),
        (a, b) => Err(CompareError::Mismatch {
            left: a.kind(),
            right: b.kind(),
        }),
    }
}

fn compare_text(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

fn compare_numbers(a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi <= 0.0 || lo < 0.0 {
        return 0.0;
    }
    lo / hi
}

fn compare_collections(a: &[Value], b: &[Value]) -> Result<f64, CompareError> {
    if a.is_empty() || b.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for x in a {
        total += best_against(x, b)?;
    }
    for y in b {
        total += best_against(y, a)?;
    }

    Ok(total / (a.len() + b.len()) as f64)
}

fn best_against(x: &Value, pool: &[Value]) -> Result<f64, CompareError> {
    let mut best = 0.0_f64;
    for y in pool {
        best = best.max(compare(x, y)?);
    }
    Ok(best)
}

/// Per-field breakdown of a similarity measurement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Similarity {
    /// `(field, similarity, weight)` for every field present on both sides.
    pub parts: Vec<(Field, f64, u32)>,
}

impl Similarity {
    pub fn weight(&self) -> u32 {
        self.parts.iter().map(|(_, _, w)| w).sum()
    }

    /// Whether at least one field was present on both sides.
    pub fn is_comparable(&self) -> bool {
        self.weight() > 0
    }

    /// The weighted average of all contributions.
    ///
    /// An incomparable pair scores `0.0`.
    pub fn score(&self) -> f64 {
        let weight = self.weight();
        if weight == 0 {
            return 0.0;
        }

        let total: f64 = self.parts.iter().map(|(_, s, w)| s * f64::from(*w)).sum();
        (total / f64::from(weight)).clamp(0.0, 1.0)
    }
}

/// Measures every declared field of `a` against the same field of `b`.
pub fn measure_similarity(
    a: &(impl Matchable + ?Sized),
    b: &(impl Matchable + ?Sized),
) -> Result<Similarity, CompareError> {
    let mut parts = Vec::new();

    for &(field, weight) in a.weights() {
        let (x, y) = (a.data().get(field), b.data().get(field));
        if x.is_unset() || y.is_unset() {
            continue;
        }

        let n = compare(x, y).map_err(|e| CompareError::Field {
            field,
            source: Box::new(e),
        })?;
        parts.push((field, n, weight));
    }

    Ok(Similarity { parts })
}

/// The weighted similarity score of two entities in `[0, 1]`.
pub fn score_similarity(
    a: &(impl Matchable + ?Sized),
    b: &(impl Matchable + ?Sized),
) -> Result<f64, CompareError> {
    Ok(measure_similarity(a, b)?.score())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Album, Track};
    use std::path::PathBuf;

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    fn set(items: &[&str]) -> Value {
        Value::Collection(items.iter().map(|s| text(s)).collect())
    }

    #[test]
    fn identical_text_scores_one() {
        assert_eq!(compare(&text("yesterday"), &text("yesterday")), Ok(1.0));
    }

    #[test]
    fn numbers_use_symmetric_ratio() {
        assert_eq!(compare(&Value::Number(50.0), &Value::Number(100.0)), Ok(0.5));
        assert_eq!(compare(&Value::Number(100.0), &Value::Number(50.0)), Ok(0.5));
        assert_eq!(compare(&Value::Number(7.0), &Value::Number(7.0)), Ok(1.0));
    }

    #[test]
    fn zero_numbers_do_not_divide_by_zero() {
        assert_eq!(compare(&Value::Number(0.0), &Value::Number(0.0)), Ok(0.0));
        assert_eq!(compare(&Value::Number(0.0), &Value::Number(3.0)), Ok(0.0));
    }

    #[test]
    fn empty_collection_scores_zero() {
        assert_eq!(compare(&set(&[]), &set(&["a"])), Ok(0.0));
        assert_eq!(compare(&set(&["a"]), &set(&[])), Ok(0.0));
    }

    #[test]
    fn collections_average_best_matches_both_ways() {
        // a->a 1.0, b->b 1.0, a->a 1.0, b->b 1.0, c->best 0.0 => 4 / 5
        let score = compare(&set(&["a", "b"]), &set(&["a", "b", "c"])).unwrap();
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn comparison_is_symmetric() {
        let pairs = [
            (text("thebeatles"), text("beatles")),
            (Value::Number(125.0), Value::Number(126.0)),
            (set(&["alpha", "beta"]), set(&["alpha", "gamma", "delta"])),
        ];
        for (a, b) in pairs {
            let (ab, ba) = (compare(&a, &b).unwrap(), compare(&b, &a).unwrap());
            assert!((ab - ba).abs() < 1e-12, "{ab} != {ba}");
        }
    }

    #[test]
    fn mismatched_kinds_are_errors() {
        assert_eq!(
            compare(&text("a"), &Value::Number(1.0)),
            Err(CompareError::Mismatch {
                left: "text",
                right: "number"
            })
        );
        assert!(compare(&Value::Unset, &Value::Unset).is_err());
        assert!(compare(&set(&["a"]), &Value::Collection(vec![Value::Number(1.0)])).is_err());
    }

    #[test]
    fn yesterday_scenario_scores_above_threshold() {
        let a = Track::new(
            PathBuf::from("/old/a.mp3"),
            [
                (Field::Title, Value::text("Yesterday")),
                (Field::Artist, Value::text("Beatles")),
                (Field::Duration, Value::number(125.0)),
            ],
        );
        let b = Track::new(
            PathBuf::from("/new/b.mp3"),
            [
                (Field::Title, Value::text("Yesterday")),
                (Field::Artist, Value::text("The Beatles")),
                (Field::Duration, Value::number(126.0)),
            ],
        );

        let similarity = measure_similarity(&a, &b).unwrap();
        assert_eq!(similarity.weight(), 6 + 2 + 5);
        assert!(similarity.score() > 0.85, "score {}", similarity.score());
        assert_eq!(score_similarity(&a, &b).unwrap(), score_similarity(&b, &a).unwrap());
    }

    #[test]
    fn unset_fields_are_skipped_entirely() {
        let a = Track::new(
            PathBuf::from("/old/a.mp3"),
            [(Field::Title, Value::text("Song")), (Field::Genre, Value::text("Rock"))],
        );
        let b = Track::new(PathBuf::from("/new/b.mp3"), [(Field::Title, Value::text("Song"))]);

        let similarity = measure_similarity(&a, &b).unwrap();
        assert_eq!(similarity.parts.len(), 1);
        assert_eq!(similarity.score(), 1.0);
    }

    #[test]
    fn no_overlap_is_incomparable_and_scores_zero() {
        let a = Track::new(PathBuf::from("/old/a.mp3"), [(Field::Title, Value::text("x"))]);
        let b = Track::new(PathBuf::from("/new/b.mp3"), [(Field::Genre, Value::text("y"))]);

        let similarity = measure_similarity(&a, &b).unwrap();
        assert!(!similarity.is_comparable());
        assert_eq!(similarity.score(), 0.0);
    }

    #[test]
    fn albums_share_the_same_comparator() {
        let mut a = Album::new(PathBuf::from("/old/Artist/Greatest Hits"));
        let mut b = Album::new(PathBuf::from("/new/Artist/Greatest Hits Vol 1"));
        for album in [&mut a, &mut b] {
            let base = album.path().to_path_buf();
            album.add_track(Track::new(
                base.join("1.mp3"),
                [(Field::Artist, Value::text("Artist"))],
            ));
        }

        let score = score_similarity(&a, &b).unwrap();
        assert!((0.0..=1.0).contains(&score));
        // "greatesthits" vs "greatesthitsvol1"
        assert!(score > 0.8 && score < 1.0, "score {score}");
    }
}
