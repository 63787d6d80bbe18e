//! Argument surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "aud",
    version,
    about = "Offline static analysis and code intelligence"
)]
pub struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse, extract, normalize, and flush the Fact Store.
    Index,
    /// Run analyzers against an existing Fact Store.
    Analyze,
    /// Run the taint engine against an existing Fact Store.
    Taint,
    /// Inspect dependency manifests.
    Deps {
        /// Query registries for newer versions.
        #[arg(long)]
        check_latest: bool,
        /// Accept pre-release versions as upgrade candidates.
        #[arg(long)]
        allow_prerelease: bool,
        /// Print the proposed upgrade for every dependency.
        #[arg(long)]
        upgrade_all: bool,
    },
    /// Fetch, view, or list external documentation.
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },
    /// Run the whole pipeline: index, analyze, taint.
    Full,
}

#[derive(Subcommand)]
pub enum DocsAction {
    /// Fetch documentation for a package.
    Fetch {
        package: String,
        #[arg(long)]
        version: String,
        /// Ecosystem directory name (py, npm, cargo).
        #[arg(long, default_value = "py")]
        ecosystem: String,
        /// Maximum pages fetched.
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// List fetched capsules.
    List,
    /// Print a fetched page.
    View {
        /// `package@version`.
        capsule: String,
        /// File name inside the capsule (defaults to the first).
        file: Option<String>,
        /// Ecosystem directory name.
        #[arg(long, default_value = "py")]
        ecosystem: String,
    },
}
