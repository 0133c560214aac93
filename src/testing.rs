// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! In-memory fakes of system operations and repository synchronization.
//!
//! Both fakes write into a shared [`Journal`] so tests can assert on the
//! exact order in which the sync engine touched the outside world.

use crate::{
    path::clean_path,
    repo::{RepoError, RepoSync},
    system::SystemOps,
};

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    io::{Error as IoError, ErrorKind, Result as IoResult},
    path::{Path, PathBuf},
    rc::Rc,
};

/// Working directory that relative paths are expanded against.
pub(crate) const FAKE_CWD: &str = "/work";

/// Observable side effect performed through a fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Copy { from: PathBuf, to: PathBuf },
    Write { path: PathBuf },
    Print(String),
    Update(PathBuf),
    CommitAndPush { path: PathBuf, message: String },
}

/// Shared, ordered record of side effects.
pub(crate) type Journal = Rc<RefCell<Vec<Call>>>;

#[derive(Debug, Default)]
pub(crate) struct FakeSystem {
    journal: Journal,
    env: HashMap<String, String>,
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: HashSet<PathBuf>,
    lines: RefCell<VecDeque<String>>,
    fail_reads: HashSet<PathBuf>,
    fail_writes: HashSet<PathBuf>,
    fail_copies: HashSet<PathBuf>,
}

impl FakeSystem {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub(crate) fn with_file(self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) -> Self {
        self.files
            .borrow_mut()
            .insert(path.into(), contents.as_ref().to_vec());
        self
    }

    pub(crate) fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.insert(path.into());
        self
    }

    pub(crate) fn with_lines(self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.lines
            .borrow_mut()
            .extend(lines.into_iter().map(Into::into));
        self
    }

    pub(crate) fn fail_read(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_reads.insert(path.into());
        self
    }

    pub(crate) fn fail_write(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_writes.insert(path.into());
        self
    }

    /// Fail any copy whose source is the given path.
    pub(crate) fn fail_copy(mut self, from: impl Into<PathBuf>) -> Self {
        self.fail_copies.insert(from.into());
        self
    }

    pub(crate) fn journal(&self) -> Journal {
        Rc::clone(&self.journal)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.journal.borrow().clone()
    }

    pub(crate) fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    pub(crate) fn file_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.file(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Number of lines still waiting to be read.
    pub(crate) fn pending_lines(&self) -> usize {
        self.lines.borrow().len()
    }
}

impl SystemOps for FakeSystem {
    fn env_var(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.dirs.contains(path) || self.files.borrow().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn expand_path(&self, path: &str) -> IoResult<PathBuf> {
        if path.is_empty() {
            return Err(IoError::other("cannot expand empty path"));
        }

        Ok(clean_path(Path::new(FAKE_CWD).join(path)))
    }

    fn read_line(&self, _prompt: &str) -> IoResult<String> {
        self.lines
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| IoError::from(ErrorKind::UnexpectedEof))
    }

    fn print(&self, text: &str) {
        self.journal.borrow_mut().push(Call::Print(text.into()));
    }

    fn read_file(&self, path: &Path) -> IoResult<Vec<u8>> {
        if self.fail_reads.contains(path) {
            return Err(IoError::from(ErrorKind::PermissionDenied));
        }

        self.file(path)
            .ok_or_else(|| IoError::from(ErrorKind::NotFound))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> IoResult<()> {
        if self.fail_writes.contains(path) {
            return Err(IoError::from(ErrorKind::PermissionDenied));
        }

        self.journal.borrow_mut().push(Call::Write { path: path.into() });
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> IoResult<()> {
        if self.fail_copies.contains(from) {
            return Err(IoError::from(ErrorKind::PermissionDenied));
        }

        let contents = self
            .file(from)
            .ok_or_else(|| IoError::from(ErrorKind::NotFound))?;
        self.journal.borrow_mut().push(Call::Copy {
            from: from.into(),
            to: to.into(),
        });
        self.files.borrow_mut().insert(to.to_path_buf(), contents);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeRepo {
    journal: Journal,
    fail_update: bool,
    fail_commit: bool,
}

impl FakeRepo {
    pub(crate) fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    pub(crate) fn fail_update(mut self) -> Self {
        self.fail_update = true;
        self
    }

    pub(crate) fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }
}

impl RepoSync for FakeRepo {
    fn update(&self, path: &Path) -> Result<(), RepoError> {
        if self.fail_update {
            return Err(RepoError::CannotFastForward {
                branch: "main".into(),
            });
        }

        self.journal.borrow_mut().push(Call::Update(path.into()));
        Ok(())
    }

    fn commit_and_push(&self, path: &Path, message: &str) -> Result<(), RepoError> {
        if self.fail_commit {
            return Err(RepoError::PushRejected {
                reason: "refs/heads/main: rejected".into(),
            });
        }

        self.journal.borrow_mut().push(Call::CommitAndPush {
            path: path.into(),
            message: message.into(),
        });
        Ok(())
    }
}
