//! Tarball extraction for `tar`-type resources.
//!
//! Extracts gzip-compressed or plain tar archives into a scratch
//! directory with path traversal protection, so no archive entry can
//! escape the extraction root.

use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Component, Path};

/// Gzip magic bytes, used to sniff compressed archives.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },
}

/// Extract the archive at `archive_path` into `dest_dir`.
///
/// Gzip compression is detected from the file's magic bytes; anything
/// else is read as a plain tar stream.
///
/// # Errors
///
/// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
/// escape the destination directory, or [`ExtractionError::Io`] on I/O
/// failures.
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractionError> {
    let mut file = std::fs::File::open(archive_path)?;
    let mut magic = [0u8; 2];
    let sniffed = file.read(&mut magic)?;
    drop(file);

    let file = std::fs::File::open(archive_path)?;
    let reader: Box<dyn Read> = if sniffed == 2 && magic == GZIP_MAGIC {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    unpack_tar(reader, dest_dir)
}

fn unpack_tar(reader: Box<dyn Read>, dest_dir: &Path) -> Result<(), ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&dest_path)?;
    }
    Ok(())
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}
