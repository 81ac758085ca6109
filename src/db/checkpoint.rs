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

//! Writing the session state back to the database.
//!
//! Every write replaces the stored rows for what it covers. Callers run these
//! inside a single transaction, so a checkpoint is either fully applied or
//! not at all.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, ToSql, params};

use crate::{
    catalog::Library,
    decisions::PersistedDecision,
    model::{Field, Matchable},
};

use super::model::track_fields;

pub(super) fn path_text(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("Path contains invalid UTF-8: {}", path.display()))
}

/// Replaces the stored tracks of one side with the tracks of `library`.
///
/// # Errors
///
/// Returns an error if a path is not valid UTF-8 or an insert fails.
pub(super) fn write_library(conn: &Connection, library: &Library) -> Result<usize> {
    conn.execute("DELETE FROM tracks WHERE side = ?", params![library.side()])?;

    let fields: Vec<Field> = track_fields().collect();
    let columns = fields.iter().map(Field::as_str).collect::<Vec<_>>().join(", ");
    let placeholders = (0..fields.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("INSERT INTO tracks (side, path, {columns}) VALUES (?1, ?2, {placeholders})");

    let mut stmt = conn.prepare_cached(&sql)?;
    let side = library.side();
    let mut count = 0;

    for track in library.tracks() {
        let path = path_text(track.path())?;

        let mut values: Vec<&dyn ToSql> = vec![&side, &path];
        for field in &fields {
            values.push(track.data().get(*field));
        }

        stmt.execute(&*values)
            .with_context(|| format!("Failed to store track {path}"))?;
        count += 1;
    }

    Ok(count)
}

/// Replaces every stored decision.
///
/// # Errors
///
/// Returns an error if a path is not valid UTF-8 or an insert fails.
pub(super) fn write_decisions(conn: &Connection, decisions: &[PersistedDecision]) -> Result<()> {
    // Omitted entries go with their decision.
    conn.execute("DELETE FROM decisions", [])?;

    let mut insert = conn.prepare_cached(
        "INSERT INTO decisions
            (id, position, schema_version, kind, old_path, new_path, state, score, created_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    let mut omit = conn.prepare_cached("INSERT OR IGNORE INTO decision_omit (decision_id, entry) VALUES (?1, ?2)")?;

    for (position, d) in decisions.iter().enumerate() {
        let new = d.new.as_deref().map(path_text).transpose()?;

        insert
            .execute(params![
                d.id,
                position as i64,
                d.version,
                d.kind,
                path_text(&d.old)?,
                new,
                d.state,
                d.score,
                d.created_ms,
            ])
            .with_context(|| format!("Failed to store decision {}", d.id))?;

        for entry in &d.omit {
            omit.execute(params![d.id, path_text(entry)?])?;
        }
    }

    Ok(())
}
