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

//! Application logic and command dispatching.
//!
//! # Organization
//!
//! * [`review`]: Review passes driven by a [`Reviewer`], recording decisions
//!   and writing checkpoints.
//! * [`commands`]: High-level application commands (scan, review, undo, sync
//!   and so on) wiring the store, the libraries and the passes together.

pub(crate) mod commands;
mod review;

pub use review::{
    AlbumVerdict, AlignmentPrompt, CandidatePrompt, CandidateVerdict, Reviewer, UnmatchedPrompt,
    UnmatchedVerdict,
};
