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

//! Database row mapping for domain models.
//!
//! This module provides the conversion logic between raw SQLite values and
//! the domain types, so that queries can bind and extract them directly.

use std::path::PathBuf;

use rusqlite::{
    Result, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};

use crate::{
    decisions::{DecisionId, MatchState, PersistedDecision},
    model::{EntityKind, Field, Side, Track, Value},
};

/// Fields of a track, in column order after `path`.
pub(super) fn track_fields() -> impl Iterator<Item = Field> {
    Track::WEIGHTS.iter().map(|(f, _)| *f)
}

/// Maps a `tracks` row (`path` followed by [`track_fields`]) to a [`Track`].
pub(super) fn track_from_row(row: &Row) -> Result<Track> {
    let path: String = row.get(0)?;

    let mut data = Vec::new();
    for (i, field) in track_fields().enumerate() {
        data.push((field, row.get::<_, Value>(i + 1)?));
    }

    Ok(Track::new(PathBuf::from(path), data))
}

/// Maps a `decisions` row to a [`PersistedDecision`] without its omit set.
///
/// Expected columns: `id, schema_version, kind, old_path, new_path, state,
/// score, created_ms`.
pub(super) fn decision_from_row(row: &Row) -> Result<PersistedDecision> {
    let new: Option<String> = row.get(4)?;

    Ok(PersistedDecision {
        id: row.get(0)?,
        version: row.get(1)?,
        kind: row.get(2)?,
        old: PathBuf::from(row.get::<_, String>(3)?),
        new: new.map(PathBuf::from),
        state: row.get(5)?,
        score: row.get(6)?,
        created_ms: row.get(7)?,
        omit: Vec::new(),
    })
}

impl ToSql for Value {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        match self {
            Value::Unset => Ok(ToSqlOutput::from(rusqlite::types::Null)),
            Value::Text(s) => Ok(ToSqlOutput::from(s.as_str())),
            Value::Number(n) => Ok(ToSqlOutput::from(*n)),
            Value::Collection(_) => Err(rusqlite::Error::ToSqlConversionFailure(
                "collections are derived and never stored".into(),
            )),
        }
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Value::Unset),
            ValueRef::Text(_) => Ok(Value::Text(value.as_str()?.to_string())),
            ValueRef::Real(n) => Ok(Value::Number(n)),
            ValueRef::Integer(n) => Ok(Value::Number(n as f64)),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for Side {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Side {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "old" => Ok(Side::Old),
            "new" => Ok(Side::New),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for EntityKind {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        let val = match self {
            EntityKind::Track => "track",
            EntityKind::Album => "album",
        };
        Ok(ToSqlOutput::from(val))
    }
}

impl FromSql for EntityKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "track" => Ok(EntityKind::Track),
            "album" => Ok(EntityKind::Album),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for MatchState {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for MatchState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_i64()?;
        MatchState::from_code(code).ok_or(FromSqlError::OutOfRange(code))
    }
}

// SQLite integers are signed; the id keeps its bits.
impl ToSql for DecisionId {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0 as i64))
    }
}

impl FromSql for DecisionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(DecisionId(value.as_i64()? as u64))
    }
}
