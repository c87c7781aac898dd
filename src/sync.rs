//! The resource synchroniser: per-module dispatch and filesystem effects.
//!
//! Modules are processed one at a time in manifest order. Each module
//! gets a freshly wiped scratch workspace that is removed on every exit
//! path, including fatal aborts. Fatal conditions surface as
//! [`SyncError`] and stop the run; `verify` differences are reported as
//! they are found and only flip the deferred-failure flag, so one pass
//! reports every mismatch across all modules.

use camino::Utf8PathBuf;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::Action;
use crate::error::{Result, SyncError};
use crate::extract;
use crate::fetch::Downloader;
use crate::integrity::{self, DEFAULT_ALGORITHM};
use crate::manifest::NodeRef;
use crate::output::{mismatch_line, missing_line, sri_line, write_line};
use crate::pattern;
use crate::resource::{FileSpec, ResourceSpec, TarSpec};

/// Settings for one synchronisation run.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// The requested action.
    pub action: Action,
    /// Module name to process, or `all`.
    pub module_filter: String,
    /// Root of the vendor tree (each module lands under
    /// `<dest_root>/<module>`).
    pub dest_root: Utf8PathBuf,
    /// Fixed scratch workspace path, wiped and recreated per module.
    pub scratch_root: PathBuf,
    /// Emit per-module progress lines.
    pub verbose: bool,
}

/// The aggregate result of a run that did not abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// True when any `verify` comparison found a difference.
    pub failed: bool,
}

/// Scratch workspace guard: wiped on creation, removed on drop.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Remove any leftover workspace and create it fresh.
    fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            std::fs::remove_dir_all(path).map_err(|source| SyncError::WorkspaceCreate {
                path: path.to_owned(),
                source,
            })?;
        }
        std::fs::create_dir_all(path).map_err(|source| SyncError::WorkspaceCreate {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            path: path.to_owned(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        // Removal must happen on every exit path; failures here are not
        // worth aborting over.
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Run the requested action over every selected manifest module.
///
/// `out` receives `make-sri` integrity strings and `verify` reports;
/// `progress` receives status lines.
///
/// # Errors
///
/// Returns the first fatal [`SyncError`]; deferred `verify` differences
/// are reflected in [`SyncOutcome::failed`] instead.
pub fn run(
    ctx: &SyncContext,
    manifest: &NodeRef,
    downloader: &dyn Downloader,
    out: &mut dyn Write,
    progress: &mut dyn Write,
) -> Result<SyncOutcome> {
    let modules: Vec<(String, NodeRef)> = manifest
        .borrow()
        .entries()
        .map(<[(String, NodeRef)]>::to_vec)
        .unwrap_or_default();

    let mut sync = Synchronizer {
        ctx,
        downloader,
        out,
        progress,
        failed: false,
    };

    let mut matched = false;
    for (module, node) in &modules {
        if ctx.module_filter != "all" && ctx.module_filter != *module {
            continue;
        }
        matched = true;
        sync.process_module(module, node)?;
    }

    if !matched && ctx.module_filter != "all" {
        write_line(
            sync.progress,
            format!("no module named {} in the manifest", ctx.module_filter),
        );
    }

    Ok(SyncOutcome { failed: sync.failed })
}

struct Synchronizer<'a> {
    ctx: &'a SyncContext,
    downloader: &'a dyn Downloader,
    out: &'a mut dyn Write,
    progress: &'a mut dyn Write,
    failed: bool,
}

impl Synchronizer<'_> {
    fn process_module(&mut self, module: &str, node: &NodeRef) -> Result<()> {
        // The guard wipes leftovers now and removes the workspace when
        // this frame unwinds, fatal errors included.
        let scratch = ScratchDir::create(&self.ctx.scratch_root)?;
        let spec = ResourceSpec::from_node(module, node)?;

        if self.ctx.verbose {
            write_line(
                self.progress,
                format!("Processing {module} ({})...", spec.kind()),
            );
        }

        // The module's vendor directory is replaced wholesale on update,
        // so files dropped from the manifest do not linger.
        if self.ctx.action == Action::Update {
            remove_dir_if_present(self.ctx.dest_root.join(module).as_std_path())?;
        }

        match &spec {
            ResourceSpec::File(file) => self.handle_file(module, file),
            ResourceSpec::MultiFile(files) => self.handle_multi_file(module, files),
            ResourceSpec::Tar(tar) => self.handle_tar(module, tar, &scratch),
        }
    }

    /// Download `url` and check it against the declared integrity.
    ///
    /// Under `make-sri` a mismatch or a missing integrity value emits the
    /// computed string instead of failing; under any other action a
    /// mismatch is fatal.
    fn fetch_verified(&mut self, url: &str, expected: Option<&str>) -> Result<Vec<u8>> {
        let bytes = self.downloader.fetch(url)?;
        match expected {
            Some(expected) => {
                let algorithm = integrity::algorithm_of(expected)?;
                let actual = integrity::compute(algorithm, &bytes);
                if actual != expected {
                    if self.ctx.action == Action::MakeSri {
                        write_line(self.out, sri_line(&actual, url));
                    } else {
                        return Err(SyncError::IntegrityMismatch {
                            url: url.to_owned(),
                            expected: expected.to_owned(),
                            actual,
                        });
                    }
                }
            }
            None => {
                if self.ctx.action == Action::MakeSri {
                    let actual = integrity::compute(DEFAULT_ALGORITHM, &bytes);
                    write_line(self.out, sri_line(&actual, url));
                }
            }
        }
        Ok(bytes)
    }

    fn handle_file(&mut self, module: &str, spec: &FileSpec) -> Result<()> {
        let bytes = self.fetch_verified(&spec.src, spec.integrity.as_deref())?;
        self.apply_file(module, &spec.dest, &bytes)
    }

    fn handle_multi_file(&mut self, module: &str, files: &[FileSpec]) -> Result<()> {
        // Each file is independent: a verify difference in one never
        // stops the rest of the module.
        for spec in files {
            let bytes = self.fetch_verified(&spec.src, spec.integrity.as_deref())?;
            self.apply_file(module, &spec.dest, &bytes)?;
        }
        Ok(())
    }

    /// Apply the action to a single fetched file.
    fn apply_file(&mut self, module: &str, dest_rel: &str, bytes: &[u8]) -> Result<()> {
        let dest = self.ctx.dest_root.join(module).join(dest_rel);
        let dest = dest.as_std_path();
        match self.ctx.action {
            Action::Verify => self.verify_bytes(module, dest, bytes)?,
            Action::Update => {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(dest, bytes)?;
            }
            Action::MakeSri => {}
        }
        Ok(())
    }

    fn verify_bytes(&mut self, module: &str, dest: &Path, bytes: &[u8]) -> Result<()> {
        if !dest.exists() {
            write_line(self.out, missing_line(module, dest));
            self.failed = true;
            return Ok(());
        }
        if integrity::sha256_file(dest)? != integrity::sha256_bytes(bytes) {
            write_line(self.out, mismatch_line(module, dest));
            self.failed = true;
        }
        Ok(())
    }

    fn handle_tar(&mut self, module: &str, spec: &TarSpec, scratch: &ScratchDir) -> Result<()> {
        let bytes = self.fetch_verified(&spec.src, spec.integrity.as_deref())?;

        let archive_path = scratch.path().join("archive.tar");
        std::fs::write(&archive_path, &bytes)?;
        let tree = scratch.path().join("tree");
        std::fs::create_dir_all(&tree)?;
        extract::extract(&archive_path, &tree)?;

        let module_dest = self.ctx.dest_root.join(module);
        let operations = plan_copies(&tree, module_dest.as_std_path(), spec.dest.as_deref())?;

        for (source, dest) in operations {
            log::debug!("{}: {} -> {}", module, source.display(), dest.display());
            match self.ctx.action {
                Action::Verify => self.verify_tree(module, &source, &dest)?,
                Action::Update => move_into_place(&source, &dest)?,
                Action::MakeSri => {}
            }
        }
        Ok(())
    }

    /// Compare a scratch source (file or directory) against the vendor
    /// tree, recording every differing file.
    fn verify_tree(&mut self, module: &str, source: &Path, dest: &Path) -> Result<()> {
        if source.is_dir() {
            let mut entries: Vec<_> =
                std::fs::read_dir(source)?.collect::<std::io::Result<_>>()?;
            entries.sort_by_key(std::fs::DirEntry::file_name);
            for entry in entries {
                self.verify_tree(module, &entry.path(), &dest.join(entry.file_name()))?;
            }
            return Ok(());
        }
        if !dest.exists() {
            write_line(self.out, missing_line(module, dest));
            self.failed = true;
            return Ok(());
        }
        if integrity::sha256_file(source)? != integrity::sha256_file(dest)? {
            write_line(self.out, mismatch_line(module, dest));
            self.failed = true;
        }
        Ok(())
    }
}

/// Compute the `(scratch source, vendor destination)` copy operations for
/// an extracted tarball.
///
/// # Errors
///
/// Fails when a pattern is malformed or matches nothing in the tree.
fn plan_copies(
    tree: &Path,
    module_dest: &Path,
    mapping: Option<&[(String, Option<String>)]>,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let Some(mapping) = mapping else {
        return Ok(vec![(tree.to_owned(), module_dest.to_owned())]);
    };

    let mut operations = Vec::new();
    for (pattern_text, target) in mapping {
        let matches =
            pattern::expand(tree, pattern_text).map_err(|e| SyncError::BadPattern {
                pattern: pattern_text.clone(),
                reason: e.to_string(),
            })?;
        if matches.is_empty() {
            return Err(SyncError::PatternNotFound {
                pattern: pattern_text.clone(),
            });
        }
        for matched in matches {
            let Some(name) = matched.file_name() else {
                continue;
            };
            let dest = match target {
                Some(subpath) => module_dest.join(subpath).join(name),
                None => module_dest.join(name),
            };
            operations.push((matched, dest));
        }
    }
    Ok(operations)
}

/// Move a scratch source into the vendor tree, replacing what was there.
///
/// The scratch workspace may live on a different filesystem from the
/// vendor tree, so a failed rename falls back to copy-and-remove.
fn move_into_place(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if dest.is_dir() {
        std::fs::remove_dir_all(dest)?;
    } else if dest.exists() {
        std::fs::remove_file(dest)?;
    }

    if std::fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    copy_then_remove(source, dest).map_err(|e| SyncError::MoveFailed {
        from: source.to_owned(),
        to: dest.to_owned(),
        reason: e.to_string(),
    })
}

/// Cross-filesystem fallback for `move_into_place`: copy the tree to the
/// destination, then delete the source.
fn copy_then_remove(source: &Path, dest: &Path) -> std::io::Result<()> {
    copy_recursive(source, dest)?;
    if source.is_dir() {
        std::fs::remove_dir_all(source)
    } else {
        std::fs::remove_file(source)
    }
}

fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn copy_recursive(source: &Path, dest: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        std::fs::create_dir_all(dest)?;
        for entry in std::fs::read_dir(source)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        std::fs::copy(source, dest)?;
    }
    Ok(())
}
