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

//! Versioned migration of persisted decisions.
//!
//! Every step upgrades a record by exactly one schema version and is pure.
//! Records already at [`CURRENT_SCHEMA`] pass through unchanged, so running
//! the chain twice gives the same result as running it once.

use std::path::PathBuf;

use crate::{catalog::Library, model::EntityKind};

use super::{DecisionError, DecisionId, MatchDecision, MatchState};

pub const CURRENT_SCHEMA: u32 = 3;

/// A decision as it is stored, in whatever schema it was written.
///
/// * v1 has no timestamp and no omit set.
/// * v2 adds the timestamp and stores omitted tracks by file stem.
/// * v3 stores omitted tracks by full path.
///
/// `omit` holds whichever form the schema uses, stems or paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedDecision {
    pub version: u32,
    pub id: DecisionId,
    pub kind: EntityKind,
    pub old: PathBuf,
    pub new: Option<PathBuf>,
    pub state: MatchState,
    pub score: f64,
    pub created_ms: Option<i64>,
    pub omit: Vec<PathBuf>,
}

impl PersistedDecision {
    pub fn is_current(&self) -> bool {
        self.version == CURRENT_SCHEMA
    }
}

impl From<&MatchDecision> for PersistedDecision {
    fn from(d: &MatchDecision) -> Self {
        Self {
            version: CURRENT_SCHEMA,
            id: d.id,
            kind: d.kind,
            old: d.old.clone(),
            new: d.new.clone(),
            state: d.state,
            score: d.score,
            created_ms: Some(d.created_ms),
            omit: d.omit.iter().cloned().collect(),
        }
    }
}

fn v1_to_v2(mut d: PersistedDecision) -> PersistedDecision {
    d.created_ms = Some(d.created_ms.unwrap_or(0));
    d.omit.clear();
    d.version = 2;
    d
}

fn v2_to_v3(mut d: PersistedDecision, old: &Library) -> PersistedDecision {
    let album = match d.kind {
        EntityKind::Album => old.album(&d.old),
        EntityKind::Track => None,
    };

    let stems = std::mem::take(&mut d.omit);
    for stem in stems {
        let track = stem
            .to_str()
            .and_then(|s| album.and_then(|a| a.track_by_stem(s)));
        match track {
            Some(track) => d.omit.push(track.path().to_path_buf()),
            None => log::warn!(
                "Dropping omitted track {stem:?} of {}: not in the old library",
                d.old.display()
            ),
        }
    }

    d.version = 3;
    d
}

/// Upgrades a persisted record to [`CURRENT_SCHEMA`].
///
/// Omitted tracks stored as stems are resolved against the current old
/// library.
///
/// # Errors
///
/// Fails for records written by a newer schema than this build knows.
pub fn upgrade(mut d: PersistedDecision, old: &Library) -> Result<PersistedDecision, DecisionError> {
    if d.version == 0 || d.version > CURRENT_SCHEMA {
        return Err(DecisionError::UnsupportedVersion(d.version));
    }

    let from = d.version;
    while d.version < CURRENT_SCHEMA {
        d = match d.version {
            1 => v1_to_v2(d),
            _ => v2_to_v3(d, old),
        };
    }

    if from != CURRENT_SCHEMA {
        log::info!("Migrated decision {} from v{from} to v{CURRENT_SCHEMA}", d.id);
    }
    Ok(d)
}

/// Rebuilds a live decision from a persisted record of any known schema.
///
/// # Errors
///
/// See [`upgrade`].
pub fn remake(d: PersistedDecision, old: &Library) -> Result<MatchDecision, DecisionError> {
    let d = upgrade(d, old)?;

    Ok(MatchDecision {
        id: d.id,
        kind: d.kind,
        old: d.old,
        new: d.new,
        state: d.state,
        score: d.score,
        created_ms: d.created_ms.unwrap_or(0),
        omit: d.omit.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Side, Track, Value};

    fn old_library() -> Library {
        let mut lib = Library::new(Side::Old, "/old");
        for name in ["01 Intro", "02 Song", "03 Outro"] {
            lib.insert_track(Track::new(
                PathBuf::from(format!("/old/Artist/Album/{name}.mp3")),
                [(Field::Title, Value::text(name))],
            ));
        }
        lib
    }

    fn persisted(version: u32, omit: &[&str], created_ms: Option<i64>) -> PersistedDecision {
        PersistedDecision {
            version,
            id: DecisionId(42),
            kind: EntityKind::Album,
            old: PathBuf::from("/old/Artist/Album"),
            new: Some(PathBuf::from("/new/Artist/Album")),
            state: MatchState::Partial,
            score: 0.9,
            created_ms,
            omit: omit.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn v1_gets_a_zero_timestamp_and_no_omit() {
        let d = remake(persisted(1, &["ignored"], None), &old_library()).unwrap();
        assert_eq!(d.created_ms, 0);
        assert!(d.omit.is_empty());
        assert_eq!(d.id, DecisionId(42));
    }

    #[test]
    fn v2_stems_resolve_to_track_paths() {
        let d = remake(persisted(2, &["03 Outro", "99 Missing"], Some(7)), &old_library()).unwrap();
        assert_eq!(d.created_ms, 7);
        assert_eq!(
            d.omit.into_iter().collect::<Vec<_>>(),
            vec![PathBuf::from("/old/Artist/Album/03 Outro.mp3")]
        );
    }

    #[test]
    fn current_records_are_left_alone() {
        let lib = old_library();
        let once = upgrade(persisted(2, &["02 Song"], Some(1)), &lib).unwrap();
        let twice = upgrade(once.clone(), &lib).unwrap();
        assert_eq!(once, twice);
        assert!(twice.is_current());
    }

    #[test]
    fn live_decisions_survive_a_persist_and_remake() {
        let d = MatchDecision::at(
            EntityKind::Album,
            PathBuf::from("/old/Artist/Album"),
            Some(PathBuf::from("/new/Artist/Album")),
            MatchState::Partial,
            0.8,
            [PathBuf::from("/old/Artist/Album/02 Song.mp3")],
            1234,
        );
        let back = remake(PersistedDecision::from(&d), &old_library()).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn unknown_versions_are_rejected() {
        let err = remake(persisted(CURRENT_SCHEMA + 1, &[], Some(0)), &old_library()).unwrap_err();
        assert_eq!(err, DecisionError::UnsupportedVersion(CURRENT_SCHEMA + 1));
    }
}
