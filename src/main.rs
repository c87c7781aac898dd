//! vendor-sync CLI entrypoint.
//!
//! Reads the manifest, runs the requested action over the selected
//! modules, and maps the outcome to the process exit code: non-zero on
//! any fatal error or when `verify` found differences.

use clap::Parser;
use std::io::Write;

use vendor_sync::cli::Cli;
use vendor_sync::error::{Result, SyncError};
use vendor_sync::fetch::HttpDownloader;
use vendor_sync::manifest;
use vendor_sync::output::write_line;
use vendor_sync::sync::{self, SyncContext, SyncOutcome};

fn main() {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, out: &mut dyn Write, progress: &mut dyn Write) -> Result<SyncOutcome> {
    let text =
        std::fs::read_to_string(&cli.manifest).map_err(|source| SyncError::ManifestRead {
            path: cli.manifest.clone(),
            source,
        })?;
    let root = manifest::parse(&text)?;

    let ctx = SyncContext {
        action: cli.action,
        module_filter: cli.module.clone(),
        dest_root: cli.dest_root.clone(),
        scratch_root: std::env::temp_dir().join("vendor-sync-work"),
        verbose: cli.verbose,
    };
    sync::run(&ctx, &root, &HttpDownloader, out, progress)
}

fn exit_code_for_run_result(result: Result<SyncOutcome>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(SyncOutcome { failed: false }) => 0,
        Ok(SyncOutcome { failed: true }) => {
            write_line(stderr, "verification failed");
            1
        }
        Err(err) => {
            write_line(stderr, err);
            1
        }
    }
}
