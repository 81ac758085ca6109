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

//! Data access layer.
//!
//! This module keeps the session state in an SQLite database: the field data
//! of both libraries and the decision log. Albums are not stored, they are
//! rebuilt from their tracks on load.
//!
//! # Tables
//!
//! * `tracks` - Normalized field data of every known track, per side.
//! * `decisions` - One row per decision, tagged with its schema version.
//! * `decision_omit` - Tracks omitted from a decision.
//!
//! # Checkpoints
//!
//! Every write goes through a single transaction, so the libraries and the
//! decision log on disk never disagree with each other.

mod checkpoint;
mod model;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::{
    catalog::Library,
    decisions::{DecisionId, DecisionLog, PersistedDecision, remake},
    model::{Field, Side},
};

use model::{decision_from_row, track_fields, track_from_row};

pub const DB_FILE: &str = "reintegrate.db";

/// Handle on the session database.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) the database inside `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be initialized.
    pub fn open_in(state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir)
            .with_context(|| format!("Failed to create state directory {}", state_dir.display()))?;
        Self::open(&state_dir.join(DB_FILE))
    }

    /// Opens a connection to the database and configures it.
    ///
    /// * **WAL Mode**: Enables Write-Ahead Logging.
    /// * **Constraints**: Enforces foreign key integrity, so omitted entries
    ///   are removed together with their decision.
    /// * **Schema**: Executes [`create_schema`] to ensure all tables exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The database file cannot be opened.
    /// * The initial PRAGMA configurations fail.
    /// * The schema initialization fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;

        let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
        if journal_mode != "wal" {
            anyhow::bail!("Failed to switch to WAL mode. Current mode: {}", journal_mode);
        }

        conn.execute_batch(
            "
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        conn.set_prepared_statement_cache_capacity(32);

        create_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Rebuilds the library of one side from the stored tracks.
    ///
    /// A side that was never stored yields an empty library.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be mapped.
    pub fn load_library(&self, side: Side, path_base: &Path) -> Result<Library> {
        let columns = track_fields().map(|f| f.as_str()).collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT path, {columns} FROM tracks WHERE side = ? ORDER BY path");

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let tracks = stmt
            .query_map(params![side], track_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to load the {} library", side.as_str()))?;

        let mut library = Library::new(side, path_base);
        for track in tracks {
            library.insert_track(track);
        }

        log::debug!(
            "Loaded {} library: {} tracks in {} albums",
            side.as_str(),
            library.track_count(),
            library.albums().len()
        );
        Ok(library)
    }

    /// Loads the decision records exactly as stored, in log order.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a row cannot be mapped.
    pub fn load_persisted(&self) -> Result<Vec<PersistedDecision>> {
        let mut omit: HashMap<DecisionId, Vec<PathBuf>> = HashMap::new();
        {
            let mut stmt = self
                .conn
                .prepare_cached("SELECT decision_id, entry FROM decision_omit ORDER BY entry")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, DecisionId>(0)?, row.get::<_, String>(1)?)))?;
            for row in rows {
                let (id, entry) = row?;
                omit.entry(id).or_default().push(PathBuf::from(entry));
            }
        }

        let mut stmt = self.conn.prepare_cached(
            "SELECT id, schema_version, kind, old_path, new_path, state, score, created_ms
             FROM decisions
             ORDER BY position",
        )?;

        let mut records = stmt
            .query_map([], decision_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load decisions")?;

        for record in &mut records {
            record.omit = omit.remove(&record.id).unwrap_or_default();
        }

        Ok(records)
    }

    /// Loads the decision log, remaking older records at the current schema.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or a record has an unknown schema.
    pub fn load_decisions(&self, old: &Library) -> Result<DecisionLog> {
        let mut decisions = Vec::new();
        for record in self.load_persisted()? {
            let id = record.id;
            decisions.push(remake(record, old).with_context(|| format!("Failed to remake decision {id}"))?);
        }
        Ok(DecisionLog::from_decisions(decisions))
    }

    /// Stores both libraries and the decision log in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is stored in that case.
    pub fn checkpoint_scan(&mut self, old: &Library, new: &Library, log: &DecisionLog) -> Result<()> {
        let tx = self.conn.transaction()?;

        let old_count = checkpoint::write_library(&tx, old)?;
        let new_count = checkpoint::write_library(&tx, new)?;
        checkpoint::write_decisions(&tx, &persist(log))?;

        tx.commit().context("Failed to commit checkpoint")?;

        log::debug!(
            "Checkpoint: {old_count} old tracks, {new_count} new tracks, {} decisions",
            log.len()
        );
        Ok(())
    }

    /// Stores the decision log in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is stored in that case.
    pub fn save_decisions(&mut self, log: &DecisionLog) -> Result<()> {
        self.save_persisted(&persist(log))?;
        log::debug!("Checkpoint: {} decisions", log.len());
        Ok(())
    }

    /// Stores decision records as they are, whatever their schema.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is stored in that case.
    pub fn save_persisted(&mut self, records: &[PersistedDecision]) -> Result<()> {
        let tx = self.conn.transaction()?;
        checkpoint::write_decisions(&tx, records)?;
        tx.commit().context("Failed to commit decisions")
    }
}

fn persist(log: &DecisionLog) -> Vec<PersistedDecision> {
    log.iter().map(PersistedDecision::from).collect()
}

/// Create the database schema.
///
/// The `tracks` table has one nullable column per track field. Unset values
/// are stored as NULL.
///
/// This operation is wrapped in a single SQL transaction to ensure the schema
/// is updated atomically.
///
/// # Errors
///
/// Returns an error if the transaction fails, if there are permission issues
/// with the database file, or if the SQL syntax is invalid.
fn create_schema(conn: &Connection) -> Result<()> {
    let field_columns = track_fields()
        .map(|f| match f {
            Field::TrackNumber | Field::Duration => format!("{f} REAL"),
            _ => format!("{f} TEXT"),
        })
        .collect::<Vec<_>>()
        .join(",\n            ");

    conn.execute_batch(&format!(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS tracks (
            side TEXT NOT NULL,
            path TEXT NOT NULL,
            {field_columns},
            PRIMARY KEY (side, path)
        );

        CREATE TABLE IF NOT EXISTS decisions (
            id INTEGER PRIMARY KEY,
            position INTEGER NOT NULL,
            schema_version INTEGER NOT NULL,
            kind TEXT NOT NULL,
            old_path TEXT NOT NULL,
            new_path TEXT,
            state INTEGER NOT NULL,
            score REAL NOT NULL,
            created_ms INTEGER
        );

        CREATE TABLE IF NOT EXISTS decision_omit (
            decision_id INTEGER NOT NULL,
            entry TEXT NOT NULL,
            PRIMARY KEY (decision_id, entry),
            FOREIGN KEY (decision_id) REFERENCES decisions (id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_decision_omit_decision_id ON decision_omit (decision_id);

        COMMIT;"
    ))
    .context("Failed to create schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decisions::{CURRENT_SCHEMA, MatchDecision, MatchState},
        model::{EntityKind, Matchable, Track, Value},
    };

    fn library(side: Side, base: &str, names: &[&str]) -> Library {
        let mut lib = Library::new(side, base);
        for (i, name) in names.iter().enumerate() {
            lib.insert_track(Track::new(
                PathBuf::from(format!("{base}/{name}")),
                [
                    (Field::Title, Value::text(name)),
                    (Field::Artist, Value::text("Some Artist")),
                    (Field::TrackNumber, Value::number((i + 1) as f64)),
                    (Field::Duration, Value::number(180.5)),
                ],
            ));
        }
        lib
    }

    #[test]
    fn empty_database_loads_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in(&dir.path().join("state")).unwrap();

        let old = store.load_library(Side::Old, Path::new("/old")).unwrap();
        assert_eq!(old.track_count(), 0);
        assert!(store.load_decisions(&old).unwrap().is_empty());
    }

    #[test]
    fn libraries_and_decisions_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let old = library(Side::Old, "/old", &["A/1.mp3", "A/2.mp3", "B/1.mp3"]);
        let new = library(Side::New, "/new", &["A/1.flac"]);

        let log = DecisionLog::from_decisions([
            MatchDecision::new(
                EntityKind::Album,
                PathBuf::from("/old/A"),
                Some(PathBuf::from("/new/A")),
                MatchState::Partial,
                0.83,
                [PathBuf::from("/old/A/2.mp3")],
            ),
            MatchDecision::new(EntityKind::Album, PathBuf::from("/old/B"), None, MatchState::Unmatched, 0.2, Vec::new()),
        ]);

        {
            let mut store = Store::open_in(dir.path()).unwrap();
            store.checkpoint_scan(&old, &new, &log).unwrap();
        }

        let store = Store::open_in(dir.path()).unwrap();
        let old_back = store.load_library(Side::Old, Path::new("/old")).unwrap();
        let new_back = store.load_library(Side::New, Path::new("/new")).unwrap();

        assert_eq!(old_back.albums().keys().collect::<Vec<_>>(), old.albums().keys().collect::<Vec<_>>());
        for (a, b) in old_back.tracks().zip(old.tracks()) {
            assert_eq!(a.path(), b.path());
            assert_eq!(a.data(), b.data());
        }
        for (a, b) in old_back.albums().values().zip(old.albums().values()) {
            assert_eq!(a.data(), b.data());
        }
        assert_eq!(new_back.track_count(), 1);

        assert_eq!(store.load_decisions(&old_back).unwrap(), log);
    }

    #[test]
    fn saving_decisions_replaces_the_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let old = library(Side::Old, "/old", &["A/1.mp3"]);
        let mut store = Store::open_in(dir.path()).unwrap();

        let mut log = DecisionLog::new();
        log.push(MatchDecision::new(EntityKind::Album, PathBuf::from("/old/A"), None, MatchState::Unmatched, 0.1, Vec::new()));
        store.save_decisions(&log).unwrap();

        let ids: Vec<DecisionId> = log.iter().map(|d| d.id).collect();
        log.remove(&ids);
        store.save_decisions(&log).unwrap();

        assert!(store.load_decisions(&old).unwrap().is_empty());
    }

    #[test]
    fn older_records_are_remade_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let old = library(Side::Old, "/old", &["A/01 Intro.mp3", "A/02 Song.mp3"]);
        let mut store = Store::open_in(dir.path()).unwrap();

        store
            .save_persisted(&[PersistedDecision {
                version: 2,
                id: DecisionId(u64::MAX),
                kind: EntityKind::Album,
                old: PathBuf::from("/old/A"),
                new: Some(PathBuf::from("/new/A")),
                state: MatchState::Partial,
                score: 0.9,
                created_ms: Some(5),
                omit: vec!["02 Song".into()],
            }])
            .unwrap();

        let stored = store.load_persisted().unwrap();
        assert_eq!(stored[0].version, 2);
        assert_eq!(stored[0].id, DecisionId(u64::MAX));

        let log = store.load_decisions(&old).unwrap();
        let d = log.iter().next().unwrap();
        assert_eq!(d.omit.iter().collect::<Vec<_>>(), vec![Path::new("/old/A/02 Song.mp3")]);

        store.save_decisions(&log).unwrap();
        assert_eq!(store.load_persisted().unwrap()[0].version, CURRENT_SCHEMA);
    }

    #[cfg(unix)]
    #[test]
    fn omitted_paths_must_be_utf8() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open_in(dir.path()).unwrap();
        let old = library(Side::Old, "/old", &["A/1.mp3"]);

        let mut log = DecisionLog::new();
        log.push(MatchDecision::new(EntityKind::Album, PathBuf::from("/old/A"), None, MatchState::Unmatched, 0.1, Vec::new()));
        store.save_decisions(&log).unwrap();

        let bad = Path::new("/old/A").join(OsStr::from_bytes(b"2\xff.mp3"));
        let broken = DecisionLog::from_decisions([MatchDecision::new(
            EntityKind::Album,
            PathBuf::from("/old/A"),
            Some(PathBuf::from("/new/A")),
            MatchState::Partial,
            0.8,
            [bad],
        )]);

        let err = store.save_decisions(&broken).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));

        // The failed checkpoint left the previous log in place.
        let stored = store.load_decisions(&old).unwrap();
        assert_eq!(stored.iter().map(|d| d.state).collect::<Vec<_>>(), vec![MatchState::Unmatched]);
    }

    #[test]
    fn unset_fields_survive_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open_in(dir.path()).unwrap();
        let old = library(Side::Old, "/old", &["A/1.mp3"]);
        store.checkpoint_scan(&old, &Library::new(Side::New, "/new"), &DecisionLog::new()).unwrap();

        let back = store.load_library(Side::Old, Path::new("/old")).unwrap();
        let track = back.tracks().next().unwrap();
        assert!(track.data().get(Field::Composer).is_unset());
        assert_eq!(track.data().get(Field::Duration), &Value::Number(180.5));
    }
}
