// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the dotf configuration file, and the registry of
//! tracked files stored inside of it. File I/O is left to the
//! [`ConfigStore`](crate::store::ConfigStore) to figure out.
//!
//! # General Layout
//!
//! The configuration file is a TOML document with three fields: the absolute
//! path to the dotfile repository, a flag that determines if backups should be
//! made before pulling, and an ordered listing of tracked files:
//!
//! ```toml
//! repo = "/home/blah/dotfiles"
//! createBackups = true
//!
//! [[trackedFiles]]
//! pathInRepo = "bashrc"
//! pathOnSystem = "/home/blah/.bashrc"
//! ```

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Dotf configuration layout.
///
/// The configuration is the single source of truth for dotf. Nothing is kept
/// in memory between invocations, so every operation loads it up fresh and
/// writes it back in full if it changed anything.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Absolute path to root of dotfile repository.
    pub repo: PathBuf,

    /// Copy system files to `<file>.bk` before pulling over them.
    pub create_backups: bool,

    /// Tracked files in insertion order.
    #[serde(default)]
    tracked_files: Vec<TrackedFile>,
}

impl Config {
    /// Construct new configuration with no tracked files.
    pub fn new(repo: impl Into<PathBuf>, create_backups: bool) -> Self {
        Self {
            repo: repo.into(),
            create_backups,
            tracked_files: Vec::new(),
        }
    }

    /// Track a new file.
    ///
    /// Appends entry to the end of the tracked file listing. Returns `false`
    /// without touching the listing if an entry with the same system path is
    /// already being tracked.
    pub fn track(&mut self, entry: TrackedFile) -> bool {
        if self.is_tracked(&entry.path_on_system) {
            return false;
        }

        self.tracked_files.push(entry);
        true
    }

    /// Stop tracking a file by its path on the system.
    ///
    /// Removes first entry whose system path matches exactly. Remaining entries
    /// keep their relative order.
    pub fn untrack(&mut self, path_on_system: impl AsRef<Path>) -> Option<TrackedFile> {
        let index = self
            .tracked_files
            .iter()
            .position(|entry| entry.path_on_system == path_on_system.as_ref())?;

        Some(self.tracked_files.remove(index))
    }

    /// Check if system path is currently tracked.
    pub fn is_tracked(&self, path_on_system: impl AsRef<Path>) -> bool {
        self.tracked_files
            .iter()
            .any(|entry| entry.path_on_system == path_on_system.as_ref())
    }

    /// List tracked files in insertion order.
    pub fn tracked_files(&self) -> &[TrackedFile] {
        self.tracked_files.as_slice()
    }

    /// Serialize configuration into TOML.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Serialize`] if a path cannot be represented in
    ///   TOML, e.g., it is not valid UTF-8.
    pub fn serialize(&self) -> Result<String> {
        toml::ser::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.serialize()?.as_str())
    }
}

/// A file tracked by dotf.
///
/// Pairs the location of a file on the system with its location inside of the
/// dotfile repository. Identity is the system path.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedFile {
    /// Path relative to root of dotfile repository.
    pub path_in_repo: PathBuf,

    /// Absolute path on the system.
    pub path_on_system: PathBuf,
}

impl TrackedFile {
    /// Construct new tracked file entry.
    pub fn new(path_in_repo: impl Into<PathBuf>, path_on_system: impl Into<PathBuf>) -> Self {
        Self {
            path_in_repo: path_in_repo.into(),
            path_on_system: path_on_system.into(),
        }
    }

    /// Path to backup copy of system file.
    pub fn backup_path(&self) -> PathBuf {
        let mut backup = self.path_on_system.clone().into_os_string();
        backup.push(".bk");
        PathBuf::from(backup)
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Configuration is not valid UTF-8.
    #[error(transparent)]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn config_with(entries: &[(&str, &str)]) -> Config {
        let mut config = Config::new("/home/blah/dotfiles", true);
        for (repo, system) in entries {
            config.track(TrackedFile::new(*repo, *system));
        }
        config
    }

    #[test]
    fn deserialize_config() -> anyhow::Result<()> {
        let result: Config = r#"
            repo = "/home/blah/dotfiles"
            createBackups = true

            [[trackedFiles]]
            pathInRepo = "bashrc"
            pathOnSystem = "/home/blah/.bashrc"

            [[trackedFiles]]
            pathInRepo = "vim/vimrc"
            pathOnSystem = "/home/blah/.vimrc"
        "#
        .parse()?;

        let expect = config_with(&[
            ("bashrc", "/home/blah/.bashrc"),
            ("vim/vimrc", "/home/blah/.vimrc"),
        ]);
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_config_without_tracked_files() -> anyhow::Result<()> {
        let result: Config = r#"
            repo = "/home/blah/dotfiles"
            createBackups = false
        "#
        .parse()?;

        assert_eq!(result, Config::new("/home/blah/dotfiles", false));

        Ok(())
    }

    #[test]
    fn deserialize_config_rejects_garbage() {
        let result = "ABC".parse::<Config>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn serialize_config() {
        let result = config_with(&[("bashrc", "/home/blah/.bashrc")]).to_string();
        let expect = indoc! {r#"
            repo = "/home/blah/dotfiles"
            createBackups = true

            [[trackedFiles]]
            pathInRepo = "bashrc"
            pathOnSystem = "/home/blah/.bashrc"
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn config_survives_round_trip() -> anyhow::Result<()> {
        for config in [
            Config::new("/home/blah/dotfiles", false),
            config_with(&[
                ("zshrc", "/home/blah/.zshrc"),
                ("bashrc", "/home/blah/.bashrc"),
                ("nvim/init.lua", "/home/blah/.config/nvim/init.lua"),
            ]),
        ] {
            let result: Config = config.serialize()?.parse()?;
            assert_eq!(result, config);
        }

        Ok(())
    }

    #[test]
    fn track_appends_in_order() {
        let config = config_with(&[("b", "/home/blah/b"), ("a", "/home/blah/a")]);
        let result = config
            .tracked_files()
            .iter()
            .map(|entry| entry.path_in_repo.clone())
            .collect::<Vec<_>>();

        assert_eq!(result, vec![PathBuf::from("b"), PathBuf::from("a")]);
    }

    #[test]
    fn track_rejects_duplicate_system_path() {
        let mut config = config_with(&[("bashrc", "/home/blah/.bashrc")]);

        assert!(!config.track(TrackedFile::new("other", "/home/blah/.bashrc")));
        assert_eq!(config.tracked_files().len(), 1);
        assert_eq!(config.tracked_files()[0].path_in_repo, PathBuf::from("bashrc"));
    }

    #[test]
    fn untrack_is_inverse_of_track() {
        let mut config = config_with(&[("a", "/home/blah/a"), ("c", "/home/blah/c")]);
        let expect = config.clone();

        config.track(TrackedFile::new("b", "/home/blah/b"));
        let removed = config.untrack("/home/blah/b");

        assert_eq!(removed, Some(TrackedFile::new("b", "/home/blah/b")));
        assert_eq!(config, expect);
    }

    #[test]
    fn untrack_preserves_order_of_remaining_entries() {
        let mut config = config_with(&[
            ("a", "/home/blah/a"),
            ("b", "/home/blah/b"),
            ("c", "/home/blah/c"),
        ]);

        config.untrack("/home/blah/b");

        assert_eq!(config, config_with(&[("a", "/home/blah/a"), ("c", "/home/blah/c")]));
    }

    #[test]
    fn untrack_missing_entry() {
        let mut config = config_with(&[("a", "/home/blah/a")]);
        assert_eq!(config.untrack("/home/blah/nope"), None);
        assert_eq!(config.tracked_files().len(), 1);
    }

    #[test]
    fn backup_path_appends_suffix() {
        let entry = TrackedFile::new("a.txt", "/home/a.txt");
        assert_eq!(entry.backup_path(), PathBuf::from("/home/a.txt.bk"));
    }
}
