// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotf::{
    repo::Git2Repo,
    system::OsSystem,
    SyncEngine,
};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::{path::Path, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "dotf <command> [<command arguments>]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let engine = SyncEngine::new(OsSystem::new(), Git2Repo::new());
        match self.command {
            Command::Init(opts) => run_init(&engine, opts),
            Command::Add(opts) => run_add(&engine, opts),
            Command::Rm(opts) => run_rm(&engine, opts),
            Command::Pull => Ok(engine.pull()?),
            Command::Push(opts) => Ok(engine.push(&opts.message)?),
            Command::List => {
                let _ = engine.list()?;
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Initialize dotf with path to dotfile repository.
    #[command(visible_alias = "i", override_usage = "dotf init <repo_path>")]
    Init(InitOptions),

    /// Track a new file.
    #[command(visible_alias = "a", override_usage = "dotf add <system_path> [<repo_path>]")]
    Add(AddOptions),

    /// Stop tracking a file.
    #[command(visible_alias = "r", override_usage = "dotf rm <system_path>")]
    Rm(RmOptions),

    /// Update dotfile repository, and replace tracked files with its versions.
    #[command(override_usage = "dotf pull")]
    Pull,

    /// Copy tracked files into dotfile repository, then commit and push them.
    #[command(override_usage = "dotf push <message>")]
    Push(PushOptions),

    /// Show all tracked files.
    #[command(visible_alias = "l", override_usage = "dotf list")]
    List,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Path to dotfile repository.
    #[arg(value_name = "repo_path")]
    pub repo_path: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct AddOptions {
    /// Path to file on system.
    #[arg(value_name = "system_path")]
    pub system_path: String,

    /// Path to file inside of dotfile repository [default: file name of system path].
    #[arg(value_name = "repo_path")]
    pub repo_path: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RmOptions {
    /// Path to tracked file on system.
    #[arg(value_name = "system_path")]
    pub system_path: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PushOptions {
    /// Commit message.
    #[arg(value_name = "message")]
    pub message: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_init(engine: &SyncEngine, opts: InitOptions) -> Result<()> {
    let _ = engine.init(&opts.repo_path)?;
    Ok(())
}

fn run_add(engine: &SyncEngine, opts: AddOptions) -> Result<()> {
    let repo_path = match opts.repo_path {
        Some(repo_path) => repo_path,
        None => Path::new(&opts.system_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("cannot determine file name of {:?}", opts.system_path))?,
    };

    let _ = engine.add(&opts.system_path, &repo_path)?;
    Ok(())
}

fn run_rm(engine: &SyncEngine, opts: RmOptions) -> Result<()> {
    let _ = engine.remove(&opts.system_path)?;
    Ok(())
}
