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

//! Application configuration.
//!
//! This module manages the application configuration file. The configuration
//! normally lives in the platform config directory and is managed by `confy`.
//! A legacy `KEY :: value` key file can be given instead, see [`keyfile`].

mod keyfile;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{catalog::ScanSettings, matching::Thresholds};

pub use keyfile::read_key_file;

const CONFIG_NAME: &str = "reintegrate";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Line {line}: expected `KEY :: value`")]
    MissingSeparator { line: usize },

    #[error("Missing required key {0}")]
    MissingKey(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Confy(#[from] confy::ConfyError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    pub old_library: PathBuf,
    pub new_library: PathBuf,
    pub cull_dir: PathBuf,
    pub state_dir: PathBuf,
    pub extensions: Vec<String>,
    pub thresholds: Thresholds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            old_library: PathBuf::new(),
            new_library: PathBuf::new(),
            cull_dir: PathBuf::new(),
            state_dir: PathBuf::new(),
            extensions: ScanSettings::default().extensions,
            thresholds: Thresholds::default(),
        }
    }
}

impl AppConfig {
    /// Checks that both libraries and the state directory are set and that
    /// the thresholds are ordered.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("old_library", &self.old_library),
            ("new_library", &self.new_library),
            ("state_dir", &self.state_dir),
        ];
        for (name, path) in required {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} is not set")));
            }
        }

        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid("extensions must not be empty".into()));
        }

        self.thresholds.validate().map_err(ConfigError::Invalid)
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            extensions: self.extensions.clone(),
            ..ScanSettings::default()
        }
    }
}

/// Loads the configuration, from `key_file` when given, otherwise from the
/// `confy` managed file (created with defaults on first use).
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or the result
/// does not validate.
pub fn load_config(key_file: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let cfg = match key_file {
        Some(path) => read_key_file(path)?,
        None => confy::load(CONFIG_NAME, None)?,
    };
    cfg.validate()?;
    Ok(cfg)
}
