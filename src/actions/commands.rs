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

//! Application command processing.
//!
//! Every [`AppCommand`] loads the session state from the store, runs to
//! completion and writes back what it changed. Reports for the user go to
//! stdout.

use anyhow::{Context, Result};

use crate::{
    catalog::{Library, LoftyTagReader, ScanReport},
    config::AppConfig,
    db::Store,
    decisions::{CURRENT_SCHEMA, DecisionLog, MatchState},
    model::{EntityKind, Side},
    sync::{apply_sync, plan_sync},
};

use super::review::{Checkpoint, PassOutcome, PassSummary, Reviewer, Session, undo};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AppCommand {
    Scan,
    Review,
    CheckUnmatched,
    AutoTracks,
    Decisions,
    Undo(String),
    Migrate,
    Sync { dry_run: bool },
    Stats,
}

impl Checkpoint for Store {
    fn save(&mut self, log: &DecisionLog) -> Result<()> {
        self.save_decisions(log)
    }
}

/// Everything a command works on.
struct State {
    store: Store,
    old: Library,
    new: Library,
    log: DecisionLog,
}

fn load_state(config: &AppConfig) -> Result<State> {
    let store = Store::open_in(&config.state_dir)?;
    let old = store.load_library(Side::Old, &config.old_library)?;
    let new = store.load_library(Side::New, &config.new_library)?;
    let log = store.load_decisions(&old)?;

    Ok(State {
        store,
        old,
        new,
        log,
    })
}

/// Executes a single command.
///
/// # Errors
///
/// Returns an error if the state cannot be loaded or stored, or if the
/// command itself fails.
pub(crate) fn handle_command(
    config: &AppConfig,
    command: AppCommand,
    reviewer: &mut dyn Reviewer,
) -> Result<()> {
    let state = load_state(config).context("Failed to load session state")?;

    match command {
        AppCommand::Scan => scan(config, state),
        AppCommand::Review => review(config, state, reviewer, Pass::Undecided),
        AppCommand::CheckUnmatched => review(config, state, reviewer, Pass::Unconfirmed),
        AppCommand::AutoTracks => review(config, state, reviewer, Pass::Tracks),
        AppCommand::Decisions => {
            print_decisions(&state.log);
            Ok(())
        }
        AppCommand::Undo(keyword) => {
            let State { mut store, mut log, .. } = state;
            let removed = undo(&mut log, &keyword, reviewer)?;
            if removed.is_empty() {
                println!("Nothing removed");
            } else {
                store.save_decisions(&log)?;
                println!("Removed {} decisions", removed.len());
            }
            Ok(())
        }
        AppCommand::Migrate => {
            let State { mut store, log, .. } = state;
            let outdated = store
                .load_persisted()?
                .iter()
                .filter(|r| !r.is_current())
                .count();
            if outdated > 0 {
                store.save_decisions(&log)?;
            }
            println!("Migrated {outdated} of {} decisions to schema v{CURRENT_SCHEMA}", log.len());
            Ok(())
        }
        AppCommand::Sync { dry_run } => sync(config, &state, dry_run),
        AppCommand::Stats => {
            print_stats(&state);
            Ok(())
        }
    }
}

fn scan(config: &AppConfig, state: State) -> Result<()> {
    for root in [&config.old_library, &config.new_library] {
        // An unmounted library would otherwise look like every file was deleted.
        if !root.is_dir() {
            anyhow::bail!("Library root {} is not a directory", root.display());
        }
    }

    let State {
        mut store,
        mut old,
        mut new,
        mut log,
    } = state;

    let reader = LoftyTagReader;
    let settings = config.scan_settings();

    let old_report = old.scan(&reader, &settings);
    let new_report = new.scan(&reader, &settings);
    let retracted = log.forget_deleted(old_report.removed_paths(), new_report.removed_paths());

    store
        .checkpoint_scan(&old, &new, &log)
        .context("Failed to save scan results")?;

    print_report(&old, &old_report);
    print_report(&new, &new_report);
    if !retracted.is_empty() {
        println!("Retracted {} decisions bound to deleted files", retracted.len());
    }

    Ok(())
}

fn print_report(library: &Library, report: &ScanReport) {
    println!(
        "{} library {}: {} tracks in {} albums",
        library.side().as_str(),
        library.path_base().display(),
        library.track_count(),
        library.albums().len()
    );

    if report.is_unchanged() && report.skipped.is_empty() {
        println!("  unchanged");
        return;
    }

    println!(
        "  added {}, removed {} tracks and {} albums",
        report.added.len(),
        report.removed_tracks.len(),
        report.removed_albums.len()
    );
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
}

enum Pass {
    Undecided,
    Unconfirmed,
    Tracks,
}

fn review(config: &AppConfig, state: State, reviewer: &mut dyn Reviewer, pass: Pass) -> Result<()> {
    let State {
        mut store,
        old,
        new,
        log,
    } = state;

    let mut session = Session::new(&old, &new, log, config.thresholds);

    let retracted = session.retract_stale();
    if !retracted.is_empty() {
        println!("Retracted {} stale decisions", retracted.len());
    }

    let summary: PassSummary = match pass {
        Pass::Undecided => session.review_undecided(reviewer, &mut store)?,
        Pass::Unconfirmed => session.check_unmatched(reviewer, &mut store)?,
        Pass::Tracks => session.auto_tracks(&mut store)?,
    };

    println!(
        "Offered {}, recorded {} decisions, {} in total",
        summary.offered,
        summary.recorded,
        session.log().len()
    );
    if summary.outcome == PassOutcome::Quit {
        println!("Stopped early, progress saved");
    }

    Ok(())
}

fn print_decisions(log: &DecisionLog) {
    if log.is_empty() {
        println!("No decisions yet");
        return;
    }

    for d in log.iter() {
        let kind = match d.kind {
            EntityKind::Album => "album",
            EntityKind::Track => "track",
        };
        println!("{} {kind} {}", d.id, d);
    }
}

fn sync(config: &AppConfig, state: &State, dry_run: bool) -> Result<()> {
    if config.cull_dir.as_os_str().is_empty() {
        anyhow::bail!("No cull directory configured");
    }

    let wanted = state.log.carry_over_tracks(&state.old);
    let plan = plan_sync(&wanted, &config.old_library, &config.cull_dir, &config.extensions);

    println!(
        "{} tracks to carry over: {} to copy, {} to remove",
        wanted.len(),
        plan.copy.len(),
        plan.remove.len()
    );
    for path in &plan.outside {
        println!("  not below the old library, left out: {}", path.display());
    }

    if plan.is_empty() {
        println!("Cull directory is up to date");
        return Ok(());
    }

    if dry_run {
        for (source, _) in &plan.copy {
            println!("  copy   {}", source.display());
        }
        for path in &plan.remove {
            println!("  remove {}", path.display());
        }
        return Ok(());
    }

    apply_sync(&plan, &config.cull_dir)
}

fn print_stats(state: &State) {
    for library in [&state.old, &state.new] {
        println!(
            "{:<4} {} tracks in {} albums",
            library.side().as_str(),
            library.track_count(),
            library.albums().len()
        );
    }

    println!("decisions: {}", state.log.len());
    let counts = state.log.counts();
    for s in MatchState::ALL {
        println!("  {:<20} {}", s.as_str(), counts.get(&s).copied().unwrap_or_default());
    }

    println!(
        "undecided albums: {}",
        state.log.undecided_albums(&state.old, &state.new).old.len()
    );
    println!(
        "albums not confirmed unmatched: {}",
        state.log.unconfirmed_albums(&state.old, &state.new).old.len()
    );
    println!(
        "undecided tracks: {}",
        state.log.undecided_tracks(&state.old, &state.new).old.len()
    );
}
