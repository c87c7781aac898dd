//! Typed view over parsed manifest entries.
//!
//! The parser produces an untyped node tree; this module validates each
//! module entry into a [`ResourceSpec`], failing fast on a missing or
//! unknown `type` and on missing source URLs.

use crate::error::{Result, SyncError};
use crate::manifest::{Node, NodeRef, get, get_str};

/// One file to download: where it comes from, where it lands relative to
/// the module's vendor directory, and the expected integrity if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Source URL.
    pub src: String,
    /// Destination path relative to the module directory.
    pub dest: String,
    /// SRI-style integrity string, when declared.
    pub integrity: Option<String>,
}

/// A tarball to download, extract, and map into the vendor directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarSpec {
    /// Source URL of the tarball.
    pub src: String,
    /// SRI-style integrity string, when declared.
    pub integrity: Option<String>,
    /// `None` copies the whole extracted tree to the module directory;
    /// otherwise each glob pattern maps matches into the given
    /// subdirectory (or the module root when the target is null).
    pub dest: Option<Vec<(String, Option<String>)>>,
}

/// A validated manifest module entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSpec {
    /// A single downloaded file.
    File(FileSpec),
    /// Several independent downloaded files.
    MultiFile(Vec<FileSpec>),
    /// A tarball with optional destination remapping.
    Tar(TarSpec),
}

impl ResourceSpec {
    /// The manifest `type` value this spec was built from.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::File(_) => "file",
            ResourceSpec::MultiFile(_) => "multi-file",
            ResourceSpec::Tar(_) => "tar",
        }
    }

    /// Build a typed spec from a module's manifest node.
    ///
    /// # Errors
    ///
    /// Fails on a missing or unknown `type`, a missing `src`, or a
    /// `multi-file` entry without a `files` mapping. All of these abort
    /// the run.
    pub fn from_node(module: &str, node: &NodeRef) -> Result<Self> {
        let kind = get_str(node, "type").ok_or_else(|| SyncError::MissingType {
            module: module.to_owned(),
        })?;
        match kind.as_str() {
            "file" => Ok(ResourceSpec::File(file_spec(module, node)?)),
            "multi-file" => Ok(ResourceSpec::MultiFile(multi_file_specs(module, node)?)),
            "tar" => Ok(ResourceSpec::Tar(tar_spec(module, node)?)),
            other => Err(SyncError::UnknownType {
                module: module.to_owned(),
                kind: other.to_owned(),
            }),
        }
    }
}

fn require_src(module: &str, node: &NodeRef, item: &str) -> Result<String> {
    get_str(node, "src").ok_or_else(|| SyncError::MissingSource {
        module: module.to_owned(),
        item: item.to_owned(),
    })
}

/// Final path segment of a URL, used as the default destination name.
fn url_basename(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_owned()
}

fn file_spec(module: &str, node: &NodeRef) -> Result<FileSpec> {
    let src = require_src(module, node, "entry")?;
    let dest = get_str(node, "dest").unwrap_or_else(|| url_basename(&src));
    Ok(FileSpec {
        src,
        dest,
        integrity: get_str(node, "integrity"),
    })
}

fn multi_file_specs(module: &str, node: &NodeRef) -> Result<Vec<FileSpec>> {
    let files = get(node, "files").ok_or_else(|| SyncError::MissingFiles {
        module: module.to_owned(),
    })?;
    let borrowed = files.borrow();
    let entries = borrowed.entries().ok_or_else(|| SyncError::MissingFiles {
        module: module.to_owned(),
    })?;

    let mut specs = Vec::with_capacity(entries.len());
    for (dest, file_node) in entries {
        let src = require_src(module, file_node, dest)?;
        specs.push(FileSpec {
            src,
            dest: dest.clone(),
            integrity: get_str(file_node, "integrity"),
        });
    }
    Ok(specs)
}

fn tar_spec(module: &str, node: &NodeRef) -> Result<TarSpec> {
    let src = require_src(module, node, "entry")?;
    let dest = match get(node, "dest") {
        None => None,
        Some(dest_node) => {
            let borrowed = dest_node.borrow();
            match &*borrowed {
                // `dest:` with nothing nested is the same as no dest.
                Node::Undetermined => None,
                Node::Mapping(entries) => Some(
                    entries
                        .iter()
                        .map(|(pattern, target)| {
                            let target = target.borrow().as_str().map(str::to_owned);
                            (pattern.clone(), target)
                        })
                        .collect(),
                ),
                Node::Scalar(_) => Some(Vec::new()),
            }
        }
    };
    Ok(TarSpec {
        src,
        integrity: get_str(node, "integrity"),
        dest,
    })
}
