//! CLI argument definitions for vendor-sync.
//!
//! This module defines the command-line interface using clap. It is
//! separated from the main entrypoint to keep the binary small and
//! focused on orchestration.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

/// What a run does with each manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Replace local copies with freshly fetched artifacts.
    Update,
    /// Compare local copies against freshly fetched artifacts.
    Verify,
    /// Print integrity strings for entries whose hashes are missing or
    /// stale.
    MakeSri,
}

/// Synchronise third-party front-end libraries into the vendor tree.
#[derive(Parser, Debug)]
#[command(name = "vendor-sync")]
#[command(version, about)]
#[command(long_about = concat!(
    "Synchronise third-party front-end libraries into the vendor tree.\n\n",
    "Each entry in the manifest names a module and declares how to fetch ",
    "it: a single file, a set of files, or a tarball with an optional ",
    "remapping of extracted paths. Downloads are checked against the ",
    "SRI-style integrity strings recorded in the manifest.\n\n",
    "`update` replaces the local copies, `verify` reports every file that ",
    "differs from the upstream source, and `make-sri` prints the integrity ",
    "strings to paste into the manifest.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Check every vendored library against upstream:\n",
    "    $ vendor-sync verify\n\n",
    "  Refresh a single module:\n",
    "    $ vendor-sync update jquery\n\n",
    "  Fill in missing integrity hashes:\n",
    "    $ vendor-sync make-sri\n",
))]
pub struct Cli {
    /// Action to perform.
    #[arg(value_enum)]
    pub action: Action,

    /// Module to process, or `all`.
    #[arg(default_value = "all")]
    pub module: String,

    /// Print per-module progress.
    #[arg(short, long)]
    pub verbose: bool,

    /// Manifest file to read.
    #[arg(long, value_name = "FILE", default_value = "foreign-resources.yaml")]
    pub manifest: Utf8PathBuf,

    /// Root directory of the vendor tree.
    #[arg(long, value_name = "DIR", default_value = "resources/lib")]
    pub dest_root: Utf8PathBuf,
}
