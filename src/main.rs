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

//! # Media library reintegration.
//!
//! Reconciles an old media library with a new one that has no shared
//! identifier, finding out which old albums and tracks already exist in the
//! new library, which must be carried over and which are genuinely gone.
//!
//! ## Architecture
//!
//! * **Catalog**: incremental scanning of both library roots into track and
//!   album graphs.
//! * **Matching**: a weighted fuzzy comparator shared by tracks and albums,
//!   candidate search and greedy track alignment.
//! * **Decisions**: the persisted decision log, the views derived from it,
//!   forgetting on delete and schema migration.
//! * **Actions**: review passes driven by a reviewer, and the commands
//!   exposed on the command line.
//!
//! All state is kept in an SQLite database in the state directory and
//! written at explicit checkpoints.

mod actions;
mod catalog;
mod commander;
mod config;
mod db;
mod decisions;
mod matching;
mod model;
mod sync;
mod util;

use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder as LoggerBuilder;
use log::LevelFilter;

use crate::{
    actions::commands::{AppCommand, handle_command},
    commander::ConsoleReviewer,
    config::load_config,
};

#[derive(Parser)]
#[command(version, about = "Reconcile an old media library with a new one")]
struct Opts {
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read settings from a legacy `KEY :: value` file instead of the
    /// application configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan both libraries and forget deleted files
    Scan,
    /// Review undecided albums
    Review,
    /// Confirm or overturn albums found to have no match
    CheckUnmatched,
    /// Decide undecided tracks automatically
    AutoTracks,
    /// List every decision
    Decisions,
    /// Remove decisions matching a keyword
    Undo {
        keyword: String,
    },
    /// Rewrite stored decisions at the current schema
    Migrate,
    /// Bring the cull directory in line with the decisions
    Sync {
        /// Print the plan without touching any file
        #[arg(long)]
        dry_run: bool,
    },
    /// Show library and decision counts
    Stats,
}

impl From<Command> for AppCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Scan => AppCommand::Scan,
            Command::Review => AppCommand::Review,
            Command::CheckUnmatched => AppCommand::CheckUnmatched,
            Command::AutoTracks => AppCommand::AutoTracks,
            Command::Decisions => AppCommand::Decisions,
            Command::Undo { keyword } => AppCommand::Undo(keyword),
            Command::Migrate => AppCommand::Migrate,
            Command::Sync { dry_run } => AppCommand::Sync { dry_run },
            Command::Stats => AppCommand::Stats,
        }
    }
}

fn init_env_logger(verbosity: u8) {
    let level_filter = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut logger_builder = LoggerBuilder::new();
    logger_builder.filter(None, level_filter);

    if let Ok(rust_log) = env::var("RUST_LOG") {
        logger_builder.parse_filters(&rust_log);
    }

    logger_builder.init();
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    init_env_logger(opts.verbose);

    let config = load_config(opts.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Configuration: {:?}", config);

    let mut reviewer = ConsoleReviewer::stdio();
    handle_command(&config, opts.command.into(), &mut reviewer)
}
