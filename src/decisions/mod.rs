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

//! Match decisions and the bookkeeping around them.
//!
//! Decisions are taken by the review workflow. This module records them,
//! derives which entities still need a verdict and retracts decisions whose
//! entities disappeared.

mod decision;
mod ledger;
mod migrate;
mod state;

use thiserror::Error;

pub use decision::{DecisionId, MatchDecision};
pub use ledger::DecisionLog;
pub use migrate::{CURRENT_SCHEMA, PersistedDecision, remake};
pub use state::MatchState;

#[derive(Debug, Error, PartialEq)]
pub enum DecisionError {
    #[error("Unsupported decision schema version {0}")]
    UnsupportedVersion(u32),
}
