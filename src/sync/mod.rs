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

//! Cull directory synchronization.
//!
//! The cull directory mirrors the part of the old library that still has to
//! be carried over, keeping each file's path relative to the old library
//! root. A sync first computes a [`SyncPlan`] and then applies it.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::catalog::list_media_files;

/// Copies and removals that bring the cull directory in line.
#[derive(Debug, Default, PartialEq)]
pub struct SyncPlan {
    /// `(source, destination)` pairs.
    pub copy: Vec<(PathBuf, PathBuf)>,
    pub remove: Vec<PathBuf>,
    /// Wanted files outside the old library root.
    pub outside: Vec<PathBuf>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.copy.is_empty() && self.remove.is_empty()
    }
}

/// Diffs the wanted old tracks against the media files in `cull_dir`.
pub fn plan_sync(
    wanted: &BTreeSet<PathBuf>,
    old_base: &Path,
    cull_dir: &Path,
    extensions: &[String],
) -> SyncPlan {
    let mut plan = SyncPlan::default();
    let mut destinations = BTreeSet::new();

    for source in wanted {
        let Ok(relative) = source.strip_prefix(old_base) else {
            log::warn!("Not below {}: {}", old_base.display(), source.display());
            plan.outside.push(source.clone());
            continue;
        };

        let destination = cull_dir.join(relative);
        if !destination.exists() {
            plan.copy.push((source.clone(), destination.clone()));
        }
        destinations.insert(destination);
    }

    if cull_dir.is_dir() {
        plan.remove = list_media_files(cull_dir, extensions)
            .into_iter()
            .filter(|p| !destinations.contains(p))
            .collect();
    }

    plan
}

/// Applies a plan, then removes directories it left empty.
///
/// # Errors
///
/// Stops at the first copy or removal that fails.
pub fn apply_sync(plan: &SyncPlan, cull_dir: &Path) -> Result<()> {
    for path in &plan.remove {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
        log::debug!("Removed {}", path.display());
    }

    for (source, destination) in &plan.copy {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(source, destination).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), destination.display())
        })?;
        log::debug!("Copied {}", source.display());
    }

    if !plan.remove.is_empty() {
        prune_empty_dirs(cull_dir);
    }

    Ok(())
}

fn prune_empty_dirs(root: &Path) {
    let dirs = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir());

    for dir in dirs {
        // Fails for directories that still have content.
        if fs::remove_dir(dir.path()).is_ok() {
            log::debug!("Removed empty directory {}", dir.path().display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn exts() -> Vec<String> {
        vec!["mp3".into()]
    }

    #[test]
    fn plan_copies_missing_and_removes_stale_files() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old");
        let cull = dir.path().join("cull");

        write(&old.join("A/1.mp3"), "a1");
        write(&old.join("A/2.mp3"), "a2");
        write(&cull.join("A/2.mp3"), "a2");
        write(&cull.join("B/1.mp3"), "stale");
        write(&cull.join("B/cover.jpg"), "not media");

        let wanted = BTreeSet::from([old.join("A/1.mp3"), old.join("A/2.mp3"), PathBuf::from("/elsewhere/x.mp3")]);
        let plan = plan_sync(&wanted, &old, &cull, &exts());

        assert_eq!(plan.copy, vec![(old.join("A/1.mp3"), cull.join("A/1.mp3"))]);
        assert_eq!(plan.remove, vec![cull.join("B/1.mp3")]);
        assert_eq!(plan.outside, vec![PathBuf::from("/elsewhere/x.mp3")]);
    }

    #[test]
    fn apply_then_replan_is_empty() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old");
        let cull = dir.path().join("cull");

        write(&old.join("A/1.mp3"), "a1");
        write(&cull.join("Gone/1.mp3"), "stale");

        let wanted = BTreeSet::from([old.join("A/1.mp3")]);
        let plan = plan_sync(&wanted, &old, &cull, &exts());
        apply_sync(&plan, &cull).unwrap();

        assert_eq!(fs::read_to_string(cull.join("A/1.mp3")).unwrap(), "a1");
        assert!(!cull.join("Gone").exists());
        assert!(plan_sync(&wanted, &old, &cull, &exts()).is_empty());
    }

    #[test]
    fn missing_cull_dir_only_copies() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old");
        write(&old.join("A/1.mp3"), "a1");

        let wanted = BTreeSet::from([old.join("A/1.mp3")]);
        let plan = plan_sync(&wanted, &old, &dir.path().join("cull"), &exts());
        assert_eq!(plan.copy.len(), 1);
        assert!(plan.remove.is_empty());
    }
}
