// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration store management.
//!
//! Dotf keeps exactly one configuration file per user at `$HOME/.dotf`. The
//! __config store__ knows where that file lives, and how to load or persist a
//! [`Config`] there. Persisting always replaces the entire file.

use crate::{
    config::{Config, ConfigError},
    path::config_file_path,
    system::SystemOps,
};

use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Environment variable pointing to user's home directory.
pub const HOME_VAR: &str = "HOME";

/// Load and persist dotf configuration through system operations.
#[derive(Debug)]
pub struct ConfigStore<'sys, S>
where
    S: SystemOps,
{
    system: &'sys S,
}

impl<'sys, S> ConfigStore<'sys, S>
where
    S: SystemOps,
{
    /// Construct new config store.
    pub fn new(system: &'sys S) -> Self {
        Self { system }
    }

    /// Determine path to configuration file without checking that it exists.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::MissingEnvironment`] if `$HOME` is unset or
    ///   empty.
    pub fn config_path(&self) -> Result<PathBuf> {
        let home = self
            .system
            .env_var(HOME_VAR)
            .filter(|home| !home.is_empty())
            .ok_or(StoreError::MissingEnvironment { var: HOME_VAR })?;

        Ok(config_file_path(home))
    }

    /// Determine path to existing configuration file.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::MissingEnvironment`] if `$HOME` is unset or
    ///   empty.
    /// - Return [`StoreError::ConfigNotFound`] if configuration file does not
    ///   exist yet.
    pub fn resolve_config_path(&self) -> Result<PathBuf> {
        let config_path = self.config_path()?;
        if !self.system.path_exists(&config_path) {
            return Err(StoreError::ConfigNotFound { config_path });
        }

        Ok(config_path)
    }

    /// Load configuration from target path.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ConfigRead`] if file cannot be read.
    /// - Return [`StoreError::ConfigParse`] if contents are not a valid
    ///   configuration.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&self, config_path: &Path) -> Result<Config> {
        let raw = self
            .system
            .read_file(config_path)
            .map_err(|err| StoreError::ConfigRead {
                source: err,
                config_path: config_path.to_path_buf(),
            })?;

        let parse_err = |source| StoreError::ConfigParse {
            source,
            config_path: config_path.to_path_buf(),
        };
        let content = String::from_utf8(raw).map_err(|err| parse_err(ConfigError::from(err)))?;
        let config = content.parse::<Config>().map_err(parse_err)?;
        debug!("loaded {} tracked files", config.tracked_files().len());

        Ok(config)
    }

    /// Persist configuration to target path, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ConfigSerialize`] if configuration cannot be
    ///   serialized.
    /// - Return [`StoreError::ConfigWrite`] if file cannot be written.
    #[instrument(skip(self, config), level = "debug")]
    pub fn save(&self, config_path: &Path, config: &Config) -> Result<()> {
        let content = config.serialize().map_err(StoreError::ConfigSerialize)?;
        self.system
            .write_file(config_path, content.as_bytes())
            .map_err(|err| StoreError::ConfigWrite {
                source: err,
                config_path: config_path.to_path_buf(),
            })
    }
}

/// All possible error types for config store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Required environment variable is unset or empty.
    #[error("{var} environment variable is not set")]
    MissingEnvironment { var: &'static str },

    /// Configuration file does not exist.
    #[error(
        "no dotf configuration found at {:?}, please run the 'init' command first",
        config_path.display()
    )]
    ConfigNotFound { config_path: PathBuf },

    /// Configuration file cannot be read.
    #[error("could not read dotf config at {:?}", config_path.display())]
    ConfigRead {
        #[source]
        source: std::io::Error,
        config_path: PathBuf,
    },

    /// Configuration file contents are invalid.
    #[error("could not deserialize dotf config at {:?}", config_path.display())]
    ConfigParse {
        #[source]
        source: ConfigError,
        config_path: PathBuf,
    },

    /// Configuration cannot be serialized.
    #[error("could not serialize dotf config")]
    ConfigSerialize(#[source] ConfigError),

    /// Configuration file cannot be written.
    #[error("could not write dotf config at {:?}", config_path.display())]
    ConfigWrite {
        #[source]
        source: std::io::Error,
        config_path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
