// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Simple dotfile manager.
//!
//! Dotf keeps track of a user chosen set of files, and remembers where each of
//! them lives on the system and inside of a Git repository. Pulling copies the
//! repository versions onto the system, while pushing copies the system
//! versions into the repository before committing and pushing them.
//!
//! All state lives in one configuration file at `$HOME/.dotf`. See
//! [`config`] for its layout, and [`sync`] for the operations that read and
//! modify it.

pub mod config;
pub mod path;
pub mod repo;
pub mod store;
pub mod sync;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, TrackedFile};
pub use sync::{InitOutcome, SyncEngine};
