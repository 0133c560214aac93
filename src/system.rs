// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! System operations.
//!
//! Everything dotf needs from the machine it runs on goes through the
//! [`SystemOps`] trait: environment lookup, path expansion, prompting the
//! user, and reading, writing, or copying files. The sync engine only ever
//! talks to this trait, so it can be driven by something other than the real
//! operating system.

use crate::path::clean_path;

use inquire::{InquireError, Text};
use std::{
    env, fs,
    io::{Error as IoError, Result as IoResult},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Layer of indirection for system interaction.
pub trait SystemOps {
    /// Look up environment variable. Unset and non-unicode are both `None`.
    fn env_var(&self, key: &str) -> Option<String>;

    /// Check if path exists on file system.
    fn path_exists(&self, path: &Path) -> bool;

    /// Check if path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Expand user supplied path into absolute, clean path.
    fn expand_path(&self, path: &str) -> IoResult<PathBuf>;

    /// Prompt user for a single line of input.
    fn read_line(&self, prompt: &str) -> IoResult<String>;

    /// Show text to the user.
    fn print(&self, text: &str);

    /// Read entire contents of file.
    fn read_file(&self, path: &Path) -> IoResult<Vec<u8>>;

    /// Replace entire contents of file.
    fn write_file(&self, path: &Path, contents: &[u8]) -> IoResult<()>;

    /// Copy file over, replacing destination if it exists.
    fn copy_file(&self, from: &Path, to: &Path) -> IoResult<()>;
}

/// System operations backed by the current process and its file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSystem;

impl OsSystem {
    /// Construct new system operation provider.
    pub fn new() -> Self {
        Self
    }
}

impl SystemOps for OsSystem {
    fn env_var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    /// Expand user supplied path into absolute, clean path.
    ///
    /// Performs shell expansion for `~` and environment variables first. Any
    /// relative path is then made absolute against the current working
    /// directory. Symbolic links are left alone, and the path does not need
    /// to exist.
    fn expand_path(&self, path: &str) -> IoResult<PathBuf> {
        let expanded = shellexpand::full(path).map_err(IoError::other)?;
        if expanded.is_empty() {
            return Err(IoError::other("cannot expand empty path"));
        }

        let absolute = std::path::absolute(&*expanded)?;
        Ok(clean_path(absolute))
    }

    fn read_line(&self, prompt: &str) -> IoResult<String> {
        Text::new(prompt).prompt().map_err(|err| match err {
            InquireError::IO(err) => err,
            err => IoError::other(err),
        })
    }

    fn print(&self, text: &str) {
        print!("{text}");
    }

    fn read_file(&self, path: &Path) -> IoResult<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> IoResult<()> {
        fs::write(path, contents)
    }

    /// Copy file over, replacing destination if it exists.
    ///
    /// Parent directories of the destination are created when missing.
    fn copy_file(&self, from: &Path, to: &Path) -> IoResult<()> {
        if let Some(parent) = to.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            if !parent.exists() {
                debug!("create missing parent directory {:?}", parent.display());
                mkdirp::mkdirp(parent)?;
            }
        }

        fs::copy(from, to)?;
        Ok(())
    }
}
