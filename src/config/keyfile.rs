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

//! The legacy key file.
//!
//! One `KEY :: value` pair per line. Blank lines and lines starting with `#`
//! are skipped.
//!
//! | Key            | Setting                           |
//! |----------------|-----------------------------------|
//! | `BASE_OLD`     | old library root                  |
//! | `BASE_NEW`     | new library root                  |
//! | `BASE_CULL`    | cull directory                    |
//! | `BASE_PICKLES` | state directory                   |
//! | `EXTS`         | comma separated media extensions  |

use std::{fs, path::Path};

use super::{AppConfig, ConfigError};

/// # Errors
///
/// See [`parse_key_file`].
pub fn read_key_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse_key_file(&text)
}

/// Parses the text of a key file.
///
/// Unknown keys are ignored with a warning.
///
/// # Errors
///
/// Fails on a line without `::` or when one of the four base keys is missing.
pub fn parse_key_file(text: &str) -> Result<AppConfig, ConfigError> {
    let mut cfg = AppConfig::default();
    let mut old = None;
    let mut new = None;
    let mut cull = None;
    let mut state = None;

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .split_once("::")
            .ok_or(ConfigError::MissingSeparator { line: idx + 1 })?;
        let value = value.trim();

        match key.trim() {
            "BASE_OLD" => old = Some(value.into()),
            "BASE_NEW" => new = Some(value.into()),
            "BASE_CULL" => cull = Some(value.into()),
            "BASE_PICKLES" => state = Some(value.into()),
            "EXTS" => {
                cfg.extensions = value
                    .split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect();
            }
            other => log::warn!("Ignoring unknown configuration key {other}"),
        }
    }

    cfg.old_library = old.ok_or(ConfigError::MissingKey("BASE_OLD"))?;
    cfg.new_library = new.ok_or(ConfigError::MissingKey("BASE_NEW"))?;
    cfg.cull_dir = cull.ok_or(ConfigError::MissingKey("BASE_CULL"))?;
    cfg.state_dir = state.ok_or(ConfigError::MissingKey("BASE_PICKLES"))?;

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const KEYS: &str = "\
# library roots
BASE_OLD :: /music/old
BASE_NEW :: /music/new

BASE_CULL :: /music/cull
BASE_PICKLES :: /home/me/.reintegrate
";

    #[test]
    fn parses_all_base_keys() {
        let cfg = parse_key_file(KEYS).unwrap();
        assert_eq!(cfg.old_library, PathBuf::from("/music/old"));
        assert_eq!(cfg.new_library, PathBuf::from("/music/new"));
        assert_eq!(cfg.cull_dir, PathBuf::from("/music/cull"));
        assert_eq!(cfg.state_dir, PathBuf::from("/home/me/.reintegrate"));
        assert_eq!(cfg.extensions, AppConfig::default().extensions);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn extensions_can_be_overridden() {
        let cfg = parse_key_file(&format!("{KEYS}EXTS :: .MP3, ogg,\nCOLOUR :: blue\n")).unwrap();
        assert_eq!(cfg.extensions, vec!["mp3".to_string(), "ogg".to_string()]);
    }

    #[test]
    fn value_may_contain_the_separator_once_split() {
        let cfg = parse_key_file(&KEYS.replace("/music/cull", "/music/a::b")).unwrap();
        assert_eq!(cfg.cull_dir, PathBuf::from("/music/a::b"));
    }

    #[test]
    fn missing_separator_reports_the_line() {
        let err = parse_key_file("BASE_OLD :: /a\nBASE_NEW /b\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSeparator { line: 2 }));
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = parse_key_file("BASE_OLD :: /a\nBASE_NEW :: /b\nBASE_CULL :: /c\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("BASE_PICKLES")));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reintegrate.keys");
        fs::write(&path, KEYS).unwrap();
        assert_eq!(read_key_file(&path).unwrap().old_library, PathBuf::from("/music/old"));
    }
}
