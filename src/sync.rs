// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfile synchronization engine.
//!
//! The sync engine implements every user-facing operation of dotf: init, add,
//! remove, list, pull, and push. Each operation loads the configuration fresh
//! from the [`ConfigStore`], does its work, and writes the configuration back
//! in full if it changed anything.
//!
//! # Pulling and Pushing
//!
//! Pulling first brings the dotfile repository up to date, then copies every
//! tracked file from the repository over its location on the system. When
//! backups are enabled, the system file is copied to `<file>.bk` right before
//! it gets overwritten. Pushing copies every tracked file from the system into
//! the repository, then commits and pushes the result.
//!
//! Tracked files are always processed one at a time in the order they were
//! added. The first failing copy aborts the whole operation, and files handled
//! before it stay the way they were left, i.e., there is no rollback. A copy
//! whose source file does not exist is skipped instead of treated as an error.

use crate::{
    config::{Config, TrackedFile},
    path::repo_file_path,
    repo::{Git2Repo, RepoError, RepoSync},
    store::{ConfigStore, StoreError},
    system::{OsSystem, SystemOps},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Error as IoError, ErrorKind},
    path::{Path, PathBuf},
};
use tabled::{settings::Style, Table, Tabled};
use tracing::{debug, info, instrument, warn};

/// Question asked during init to determine backup behavior.
pub const BACKUP_PROMPT: &str = "Do you want to create backups of your dotfiles when pulling? (y/n):";

/// Dotfile synchronization engine.
///
/// Talks to the outside world only through [`SystemOps`] and [`RepoSync`].
#[derive(Debug, Default)]
pub struct SyncEngine<S = OsSystem, R = Git2Repo>
where
    S: SystemOps,
    R: RepoSync,
{
    system: S,
    repo: R,
}

impl<S, R> SyncEngine<S, R>
where
    S: SystemOps,
    R: RepoSync,
{
    /// Construct new sync engine.
    pub fn new(system: S, repo: R) -> Self {
        Self { system, repo }
    }

    /// Create configuration file for target dotfile repository.
    ///
    /// Does nothing if the configuration file already exists. Otherwise, the
    /// user is asked whether backups should be made when pulling until they
    /// answer with "y" or "n".
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Store`] if `$HOME` is not set, or the new
    ///   configuration cannot be written.
    /// - Return [`SyncError::PathResolution`] if repository path cannot be
    ///   made absolute.
    /// - Return [`SyncError::RepoNotFound`] if repository path is not an
    ///   existing directory.
    /// - Return [`SyncError::Prompt`] if user input cannot be read.
    #[instrument(skip(self), level = "debug")]
    pub fn init(&self, repo_path: &str) -> Result<InitOutcome> {
        self.try_init(repo_path).map_err(Error::wrap(Operation::Init))
    }

    /// Track a new file.
    ///
    /// Tracking is purely declarative, so the file does not need to exist yet.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Store`] if configuration cannot be loaded or
    ///   saved.
    /// - Return [`SyncError::PathResolution`] if either path is unusable.
    /// - Return [`SyncError::AlreadyTracked`] if system path is already
    ///   tracked.
    #[instrument(skip(self), level = "debug")]
    pub fn add(&self, system_path: &str, path_in_repo: &str) -> Result<TrackedFile> {
        self.try_add(system_path, path_in_repo)
            .map_err(Error::wrap(Operation::Add))
    }

    /// Stop tracking a file.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Store`] if configuration cannot be loaded or
    ///   saved.
    /// - Return [`SyncError::PathResolution`] if system path is unusable.
    /// - Return [`SyncError::TrackedFileNotFound`] if system path is not
    ///   tracked. Configuration is left untouched in this case.
    #[instrument(skip(self), level = "debug")]
    pub fn remove(&self, system_path: &str) -> Result<TrackedFile> {
        self.try_remove(system_path)
            .map_err(Error::wrap(Operation::Remove))
    }

    /// Show all tracked files as a table.
    ///
    /// The rendered table is printed, and returned.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Store`] if configuration cannot be loaded.
    #[instrument(skip(self), level = "debug")]
    pub fn list(&self) -> Result<String> {
        self.try_list().map_err(Error::wrap(Operation::List))
    }

    /// Update repository, and replace tracked files on system with repository
    /// versions.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Store`] if configuration cannot be loaded.
    /// - Return [`SyncError::RepoSync`] if repository cannot be updated.
    /// - Return [`SyncError::FileCopy`] if any copy fails. Files before the
    ///   failing one remain overwritten.
    #[instrument(skip(self), level = "debug")]
    pub fn pull(&self) -> Result<()> {
        self.try_pull().map_err(Error::wrap(Operation::Pull))
    }

    /// Copy tracked files into repository, then commit and push them.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Store`] if configuration cannot be loaded.
    /// - Return [`SyncError::FileCopy`] if any copy fails. Nothing is
    ///   committed in this case.
    /// - Return [`SyncError::RepoSync`] if commit or push fails.
    #[instrument(skip(self), level = "debug")]
    pub fn push(&self, message: &str) -> Result<()> {
        self.try_push(message).map_err(Error::wrap(Operation::Push))
    }

    fn store(&self) -> ConfigStore<'_, S> {
        ConfigStore::new(&self.system)
    }

    fn try_init(&self, repo_path: &str) -> SyncResult<InitOutcome> {
        let store = self.store();
        let config_path = store.config_path()?;
        if self.system.path_exists(&config_path) {
            self.system
                .print(&format!("{} already exists\n", config_path.display()));
            return Ok(InitOutcome::AlreadyExists(config_path));
        }

        let repo = self.expand_path(repo_path)?;
        if !self.system.is_dir(&repo) {
            return Err(SyncError::RepoNotFound { repo_path: repo });
        }

        let create_backups = self.ask_create_backups()?;
        store.save(&config_path, &Config::new(repo, create_backups))?;
        self.system.print(&format!(
            "Successfully created file at {}\n",
            config_path.display()
        ));

        Ok(InitOutcome::Created(config_path))
    }

    fn ask_create_backups(&self) -> SyncResult<bool> {
        loop {
            let response = self
                .system
                .read_line(BACKUP_PROMPT)
                .map_err(SyncError::Prompt)?;

            match response.trim() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                other => debug!("invalid response {other:?}, asking again"),
            }
        }
    }

    fn try_add(&self, system_path: &str, path_in_repo: &str) -> SyncResult<TrackedFile> {
        let path_on_system = self.expand_path(system_path)?;
        if path_in_repo.trim().is_empty() {
            return Err(SyncError::PathResolution {
                source: IoError::new(ErrorKind::InvalidInput, "path in repo is empty"),
                path: path_in_repo.into(),
            });
        }
        let (config_path, mut config) = self.load_config()?;

        let entry = TrackedFile::new(path_in_repo, path_on_system);
        if !config.track(entry.clone()) {
            return Err(SyncError::AlreadyTracked {
                path: entry.path_on_system,
            });
        }

        self.store().save(&config_path, &config)?;
        info!(
            "track {} as {}",
            entry.path_on_system.display(),
            entry.path_in_repo.display()
        );

        Ok(entry)
    }

    fn try_remove(&self, system_path: &str) -> SyncResult<TrackedFile> {
        let path_on_system = self.expand_path(system_path)?;
        let (config_path, mut config) = self.load_config()?;

        let entry = config
            .untrack(&path_on_system)
            .ok_or(SyncError::TrackedFileNotFound {
                path: path_on_system,
            })?;

        self.store().save(&config_path, &config)?;
        info!("stop tracking {}", entry.path_on_system.display());

        Ok(entry)
    }

    fn try_list(&self) -> SyncResult<String> {
        let (_, config) = self.load_config()?;
        let table = render_table(config.tracked_files());
        self.system.print(&format!("{table}\n"));

        Ok(table)
    }

    fn try_pull(&self) -> SyncResult<()> {
        let (_, config) = self.load_config()?;
        self.repo.update(&config.repo)?;

        for entry in config.tracked_files() {
            if config.create_backups {
                self.copy_if_exists(&entry.path_on_system, &entry.backup_path())?;
            }

            let from = repo_file_path(&config.repo, &entry.path_in_repo);
            self.copy_if_exists(&from, &entry.path_on_system)?;
        }

        info!("pulled {} tracked files", config.tracked_files().len());
        Ok(())
    }

    fn try_push(&self, message: &str) -> SyncResult<()> {
        let (_, config) = self.load_config()?;

        for entry in config.tracked_files() {
            let to = repo_file_path(&config.repo, &entry.path_in_repo);
            self.copy_if_exists(&entry.path_on_system, &to)?;
        }

        self.repo.commit_and_push(&config.repo, message)?;
        info!("pushed {} tracked files", config.tracked_files().len());

        Ok(())
    }

    /// Load configuration, and make sure its repository is still a directory.
    fn load_config(&self) -> SyncResult<(PathBuf, Config)> {
        let store = self.store();
        let config_path = store.resolve_config_path()?;
        let config = store.load(&config_path)?;

        if !self.system.is_dir(&config.repo) {
            return Err(SyncError::RepoNotFound {
                repo_path: config.repo,
            });
        }

        Ok((config_path, config))
    }

    fn expand_path(&self, path: &str) -> SyncResult<PathBuf> {
        self.system
            .expand_path(path)
            .map_err(|err| SyncError::PathResolution {
                source: err,
                path: path.into(),
            })
    }

    // INVARIANT: Missing source is skipped, not an error.
    fn copy_if_exists(&self, from: &Path, to: &Path) -> SyncResult<()> {
        if !self.system.path_exists(from) {
            warn!("skip copy of missing file {}", from.display());
            return Ok(());
        }

        debug!("copy {} to {}", from.display(), to.display());
        self.system
            .copy_file(from, to)
            .map_err(|err| SyncError::FileCopy {
                source: err,
                from: from.into(),
                to: to.into(),
            })
    }
}

/// Result of initializing dotf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// New configuration file was written.
    Created(PathBuf),

    /// Configuration file was already there, nothing was written.
    AlreadyExists(PathBuf),
}

#[derive(Tabled)]
struct TrackedFileRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Path in repo")]
    path_in_repo: String,
}

/// Render tracked files as a two column table.
pub fn render_table(tracked_files: &[TrackedFile]) -> String {
    let rows = tracked_files.iter().map(|entry| TrackedFileRow {
        file: entry.path_on_system.display().to_string(),
        path_in_repo: entry.path_in_repo.display().to_string(),
    });

    Table::new(rows).with(Style::ascii()).to_string()
}

/// User-facing operations of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    Add,
    Remove,
    List,
    Pull,
    Push,
}

impl Display for Operation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Init => "init",
            Self::Add => "add",
            Self::Remove => "rm",
            Self::List => "list",
            Self::Pull => "pull",
            Self::Push => "push",
        };

        fmt.write_str(name)
    }
}

/// Failure of a sync engine operation.
///
/// Tags the underlying [`SyncError`] with the operation it happened in.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed")]
pub struct Error {
    operation: Operation,
    #[source]
    source: SyncError,
}

impl Error {
    fn wrap(operation: Operation) -> impl FnOnce(SyncError) -> Self {
        move |source| Self { operation, source }
    }

    /// Operation that failed.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Reason the operation failed.
    pub fn kind(&self) -> &SyncError {
        &self.source
    }
}

/// All possible reasons for sync engine operations to fail.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Configuration cannot be located, loaded, or saved.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// User supplied path cannot be turned into an absolute path.
    #[error("could not build absolute path from {path:?}")]
    PathResolution {
        #[source]
        source: IoError,
        path: String,
    },

    /// Dotfile repository is not an existing directory.
    #[error("repository path {:?} is not an existing directory", repo_path.display())]
    RepoNotFound { repo_path: PathBuf },

    /// Dotfile repository cannot be synchronized with its remote.
    #[error("could not synchronize dotfile repository")]
    RepoSync(#[from] RepoError),

    /// Tracked file cannot be copied.
    #[error("could not copy {:?} to {:?}", from.display(), to.display())]
    FileCopy {
        #[source]
        source: IoError,
        from: PathBuf,
        to: PathBuf,
    },

    /// System path is not tracked.
    #[error("given file {:?} is not tracked", path.display())]
    TrackedFileNotFound { path: PathBuf },

    /// System path is tracked already.
    #[error("given file {:?} is already tracked", path.display())]
    AlreadyTracked { path: PathBuf },

    /// User input cannot be read.
    #[error("could not read user input")]
    Prompt(#[source] IoError),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SyncResult<T> = std::result::Result<T, SyncError>;
