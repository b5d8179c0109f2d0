// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Engine configuration.
//!
//! Settings are layered: defaults, then the user config file, then the
//! project `cinder.toml`, then `CINDER_*` environment variables. Command-line
//! flags are applied last by the caller through [`Config::set`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::runtime::DEFAULT_MAX_CALL_DEPTH;
use crate::{Error, Result};

/// Name of the per-project configuration file.
pub const PROJECT_CONFIG: &str = "cinder.toml";

/// What the driver does with a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// Execute the program
    #[default]
    Run,
    /// Print a listing of every unit
    Disasm,
    /// Print the artifact as JSON
    Json,
}

impl FromStr for EmitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "run" => Ok(EmitMode::Run),
            "disasm" => Ok(EmitMode::Disasm),
            "json" => Ok(EmitMode::Json),
            other => Err(Error::Config(format!(
                "unknown emit mode '{}' (expected run, disasm or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for EmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EmitMode::Run => "run",
            EmitMode::Disasm => "disasm",
            EmitMode::Json => "json",
        })
    }
}

/// Configuration for the engine and its driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Compile every program as strict code
    pub strict: bool,

    /// Nested call limit before a RangeError
    pub max_call_depth: usize,

    /// Count unit invocations by name
    pub trace_units: bool,

    /// Driver output
    pub emit: EmitMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace_units: false,
            emit: EmitMode::Run,
        }
    }
}

impl Config {
    /// Load configuration from default locations.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = user_config_path() {
            if path.exists() {
                config.merge_from_file(&path)?;
            }
        }

        let project = PathBuf::from(PROJECT_CONFIG);
        if project.exists() {
            config.merge_from_file(&project)?;
        }

        config.load_from_env(std::env::vars())?;
        Ok(config)
    }

    /// Merge settings from a TOML file. Keys the file leaves out keep their
    /// current values.
    pub fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let table: toml::Table = content.parse().map_err(|e: toml::de::Error| {
            Error::Config(format!("{}: {}", path.display(), e.message()))
        })?;

        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            self.set(&key, &value)?;
        }
        Ok(())
    }

    /// Apply `CINDER_*` variables, e.g. `CINDER_MAX_CALL_DEPTH=64`.
    pub fn load_from_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) -> Result<()> {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("CINDER_") {
                let config_key = config_key.to_lowercase().replace('_', "-");
                self.set(&config_key, &value)?;
            }
        }
        Ok(())
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "strict" => self.strict = parse_bool(key, value)?,
            "trace-units" => self.trace_units = parse_bool(key, value)?,
            "max-call-depth" => {
                self.max_call_depth = value.parse().map_err(|_| {
                    Error::Config(format!("max-call-depth must be a number, got '{}'", value))
                })?;
            }
            "emit" => self.emit = value.parse()?,
            _ => return Err(Error::Config(format!("unknown configuration key '{}'", key))),
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be true or false, got '{}'",
            key, value
        ))),
    }
}

/// Get the user config file path.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cinder").join("config.toml"))
}
