//! Error types for the vendor-sync CLI.
//!
//! Every variant here is fatal: it aborts the whole run after the scratch
//! workspace has been cleaned up. Per-file differences found by `verify`
//! are not errors; they accumulate into the deferred-failure flag on
//! [`SyncOutcome`](crate::sync::SyncOutcome) instead.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::fetch::DownloadError;
use crate::manifest::ParseError;

/// Errors that abort a synchronisation run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The manifest file could not be read.
    #[error("cannot read manifest {path}: {source}")]
    ManifestRead {
        /// Path to the manifest file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest text was malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A module entry had no `type` key.
    #[error("module {module} has no type")]
    MissingType {
        /// Name of the offending module.
        module: String,
    },

    /// A module entry declared a type the tool does not know.
    #[error("module {module} has unknown type {kind}")]
    UnknownType {
        /// Name of the offending module.
        module: String,
        /// The unrecognised type value.
        kind: String,
    },

    /// A `file` or `tar` entry (or a `multi-file` sub-entry) had no `src`.
    #[error("module {module} is missing src for {item}")]
    MissingSource {
        /// Name of the offending module.
        module: String,
        /// Which part lacked the source URL.
        item: String,
    },

    /// A `multi-file` entry had no `files` mapping.
    #[error("module {module} has no files mapping")]
    MissingFiles {
        /// Name of the offending module.
        module: String,
    },

    /// An integrity string did not name a supported hash algorithm.
    #[error("unsupported integrity algorithm in {value}")]
    UnsupportedAlgorithm {
        /// The integrity string as written in the manifest.
        value: String,
    },

    /// Downloaded bytes did not match the declared integrity.
    #[error("integrity mismatch for {url}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// The URL that was fetched.
        url: String,
        /// The integrity string from the manifest.
        expected: String,
        /// The integrity computed from the downloaded bytes.
        actual: String,
    },

    /// A download failed or was redirected.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Tarball extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The scratch workspace could not be created.
    #[error("cannot create scratch workspace {path}: {source}")]
    WorkspaceCreate {
        /// The scratch workspace path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A tar `dest` glob could not be compiled.
    #[error("invalid pattern {pattern}: {reason}")]
    BadPattern {
        /// The pattern as written in the manifest.
        pattern: String,
        /// Description of the syntax error.
        reason: String,
    },

    /// A tar `dest` glob matched nothing in the extracted tree.
    #[error("pattern {pattern} not found in archive")]
    PatternNotFound {
        /// The pattern as written in the manifest.
        pattern: String,
    },

    /// An extracted file or tree could not be moved into place.
    #[error("cannot move {from} to {to}: {reason}")]
    MoveFailed {
        /// Source path inside the scratch workspace.
        from: std::path::PathBuf,
        /// Destination path in the vendor tree.
        to: std::path::PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`SyncError`].
pub type Result<T> = std::result::Result<T, SyncError>;
