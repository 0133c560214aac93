// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfile repository synchronization.
//!
//! Dotf only needs two things from the dotfile repository: bring it up to date
//! with its remote before pulling, and commit plus push whatever changed after
//! pushing. Both are modeled by the [`RepoSync`] trait so the sync engine never
//! needs to know how Git is being spoken to.
//!
//! # Remote Handling
//!
//! The [`Git2Repo`] implementation always works against the remote named
//! "origin", and the branch that HEAD currently points to. Updating the
//! repository is a fetch followed by a fast-forward. Dotf does not attempt
//! to resolve diverged histories, that is left to the user.

use auth_git2::{GitAuthenticator, Prompter};
use git2::{
    build::CheckoutBuilder, Config as GitConfig, FetchOptions, IndexAddOption, PushOptions,
    RemoteCallbacks, Repository, StatusOptions,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    path::Path,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument};

/// Name of remote to synchronize with.
pub const REMOTE_NAME: &str = "origin";

/// Layer of indirection for dotfile repository synchronization.
pub trait RepoSync {
    /// Bring repository up to date with its remote.
    ///
    /// Already being up to date counts as success.
    fn update(&self, path: &Path) -> Result<()>;

    /// Commit all changes in repository and push them to its remote.
    fn commit_and_push(&self, path: &Path, message: &str) -> Result<()>;
}

/// Repository synchronization through libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Repo;

impl Git2Repo {
    /// Construct new libgit2 repository synchronizer.
    pub fn new() -> Self {
        Self
    }
}

impl RepoSync for Git2Repo {
    /// Fetch current branch from remote, and fast-forward to it.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::DetachedHead`] if HEAD is not on a branch.
    /// - Return [`RepoError::DirtyWorkTree`] if tracked files have uncommitted
    ///   changes that the update would overwrite.
    /// - Return [`RepoError::CannotFastForward`] if local branch diverged.
    /// - Return [`RepoError::Git2`] if libgit2 operations fail.
    #[instrument(skip(self), level = "debug")]
    fn update(&self, path: &Path) -> Result<()> {
        let repository = Repository::open(path)?;
        let branch = current_branch(&repository)?;
        info!("update {:?} from {REMOTE_NAME}/{branch}", path.display());

        let bar = progress_bar(format!("fetch {REMOTE_NAME}/{branch}"))?;
        let prompter = IndicatifPrompter::new(bar.clone());
        let authenticator = GitAuthenticator::default().set_prompter(prompter);
        let config = GitConfig::open_default()?;

        let mut remote = repository.find_remote(REMOTE_NAME)?;
        let mut fo = FetchOptions::new();
        fo.remote_callbacks(remote_callbacks(&authenticator, &config, &bar));
        remote.fetch(&[&branch], Some(&mut fo), None)?;
        bar.finish_and_clear();

        let fetch_head = repository.find_reference("FETCH_HEAD")?;
        let fetch_commit = repository.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repository.merge_analysis(&[&fetch_commit])?;
        let refname = format!("refs/heads/{branch}");
        let reflog = format!("dotf: fast-forward to {}", fetch_commit.id());

        if analysis.is_up_to_date() {
            info!("{:?} already up to date", path.display());
            return Ok(());
        }

        if !analysis.is_unborn() && !analysis.is_fast_forward() {
            return Err(RepoError::CannotFastForward { branch });
        }

        // INVARIANT: Never move the branch over uncommitted work.
        ensure_clean(&repository)?;

        // INVARIANT: Working tree is updated before the branch moves.
        let target = repository.find_object(fetch_commit.id(), None)?;
        repository.checkout_tree(&target, Some(CheckoutBuilder::default().safe()))?;

        if analysis.is_unborn() {
            debug!("{refname} is unborn, point it at {}", fetch_commit.id());
            repository.reference(&refname, fetch_commit.id(), true, &reflog)?;
        } else {
            debug!("fast-forward {refname} to {}", fetch_commit.id());
            repository
                .find_reference(&refname)?
                .set_target(fetch_commit.id(), &reflog)?;
        }
        repository.set_head(&refname)?;

        Ok(())
    }

    /// Stage everything, commit it, and push current branch to remote.
    ///
    /// No commit is created if nothing changed since HEAD, but the branch is
    /// still pushed.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::DetachedHead`] if HEAD is not on a branch.
    /// - Return [`RepoError::PushRejected`] if remote refuses the update.
    /// - Return [`RepoError::Git2`] if libgit2 operations fail.
    #[instrument(skip(self), level = "debug")]
    fn commit_and_push(&self, path: &Path, message: &str) -> Result<()> {
        let repository = Repository::open(path)?;
        let branch = current_branch(&repository)?;

        // INVARIANT: Stage new, modified, and deleted files alike.
        let mut index = repository.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        let tree = repository.find_tree(tree_oid)?;

        let parent = repository
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        if parent.as_ref().is_some_and(|commit| commit.tree_id() == tree_oid) {
            info!("nothing to commit in {:?}", path.display());
        } else {
            let signature = repository.signature()?;
            let parents = parent.iter().collect::<Vec<_>>();
            let oid = repository.commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parents,
            )?;
            info!("commit {oid}: {message}");
        }

        let bar = progress_bar(format!("push {REMOTE_NAME}/{branch}"))?;
        let prompter = IndicatifPrompter::new(bar.clone());
        let authenticator = GitAuthenticator::default().set_prompter(prompter);
        let config = GitConfig::open_default()?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let mut rejection = None;

        {
            let mut rc = remote_callbacks(&authenticator, &config, &bar);
            rc.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejection = Some(format!("{refname}: {status}"));
                }
                Ok(())
            });

            let mut po = PushOptions::new();
            po.remote_callbacks(rc);
            repository
                .find_remote(REMOTE_NAME)?
                .push(&[&refspec], Some(&mut po))?;
        }
        bar.finish_and_clear();

        match rejection {
            Some(reason) => Err(RepoError::PushRejected { reason }),
            None => {
                info!("pushed {branch} to {REMOTE_NAME}");
                Ok(())
            }
        }
    }
}

/// Determine name of branch that HEAD points to.
///
/// Works for unborn branches too, i.e., a freshly initialized repository.
fn current_branch(repository: &Repository) -> Result<String> {
    let head = repository.find_reference("HEAD")?;
    let target = head.symbolic_target().ok_or(RepoError::DetachedHead)?;

    Ok(target.trim_start_matches("refs/heads/").to_owned())
}

/// Refuse to continue if any tracked file has uncommitted changes.
fn ensure_clean(repository: &Repository) -> Result<()> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(false).include_ignored(false);
    let statuses = repository.statuses(Some(&mut opts))?;

    let dirty = statuses
        .iter()
        .filter_map(|entry| entry.path().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    if dirty.is_empty() {
        return Ok(());
    }

    debug!("uncommitted changes in {dirty:?}");
    Err(RepoError::DirtyWorkTree { paths: dirty })
}

fn progress_bar(message: String) -> Result<ProgressBar> {
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
    )?
    .progress_chars("-Cco.");
    let bar = ProgressBar::new(0);
    bar.set_style(style);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    Ok(bar)
}

fn remote_callbacks<'a>(
    authenticator: &'a GitAuthenticator,
    config: &'a GitConfig,
    bar: &'a ProgressBar,
) -> RemoteCallbacks<'a> {
    let mut throttle = Instant::now();
    let mut rc = RemoteCallbacks::new();
    rc.credentials(authenticator.credentials(config));
    rc.transfer_progress(move |progress| {
        if throttle.elapsed() > Duration::from_millis(10) {
            throttle = Instant::now();
            bar.set_length(progress.total_objects() as u64);
            bar.set_position(progress.received_objects() as u64);
        }
        true
    });
    rc.push_transfer_progress(move |current, total, _bytes| {
        bar.set_length(total as u64);
        bar.set_position(current as u64);
    });

    rc
}

/// Git2 authentication prompter for progress bar.
///
/// Suspends the progress bar while the user types in credentials.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("passphrase")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

/// Repository synchronization error types.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// HEAD does not point to a branch.
    #[error("HEAD is detached, cannot determine branch to synchronize")]
    DetachedHead,

    /// Tracked files have uncommitted changes.
    #[error("uncommitted changes in dotfile repository: {}", paths.join(", "))]
    DirtyWorkTree { paths: Vec<String> },

    /// Local branch and remote branch diverged.
    #[error("cannot fast-forward {branch:?} to origin/{branch}, merge manually")]
    CannotFastForward { branch: String },

    /// Remote refused to accept pushed reference.
    #[error("push rejected by origin: {reason}")]
    PushRejected { reason: String },

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = RepoError> = std::result::Result<T, E>;
