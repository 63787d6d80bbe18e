//! `aud` — the Auditor command-line front-end.

mod cli;
mod commands;
mod exit;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let root = match project_root(args.root) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(exit::USER_ERROR as u8);
        }
    };

    let code = match args.command {
        Command::Index => commands::index::run(&root),
        Command::Analyze => commands::analyze::run(&root),
        Command::Taint => commands::taint::run(&root),
        Command::Deps {
            check_latest,
            allow_prerelease,
            upgrade_all,
        } => commands::deps::run(&root, check_latest, allow_prerelease, upgrade_all),
        Command::Docs { action } => commands::docs::run(&root, action),
        Command::Full => commands::full::run(&root),
    };

    ExitCode::from(code as u8)
}

fn project_root(arg: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let root = match arg {
        Some(root) => root,
        None => std::env::current_dir().context("cannot resolve current directory")?,
    };
    anyhow::ensure!(root.is_dir(), "project root {} does not exist", root.display());
    Ok(root)
}
