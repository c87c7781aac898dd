//! Glob matching with brace alternation for tar `dest` mappings.
//!
//! The `glob` crate has no `{a,b}` support, so patterns are pre-expanded
//! into plain globs before matching. Expansion handles nesting
//! (`dist/{js/*.{js,map},css}`); an unclosed brace is taken literally.

use std::path::{Path, PathBuf};

use glob::Pattern;

/// Expand the first brace group in `pattern`, recursing into the results.
///
/// Returns the pattern unchanged (as a single element) when it contains
/// no well-formed brace group.
#[must_use]
pub fn brace_expand(pattern: &str) -> Vec<String> {
    let Some(group) = find_brace_group(pattern) else {
        return vec![pattern.to_owned()];
    };
    let prefix = &pattern[..group.start];
    let suffix = &pattern[group.end + 1..];
    let mut expanded = Vec::new();
    for alternative in split_alternatives(&pattern[group.start + 1..group.end]) {
        let candidate = format!("{prefix}{alternative}{suffix}");
        expanded.extend(brace_expand(&candidate));
    }
    expanded
}

struct BraceGroup {
    start: usize,
    end: usize,
}

/// Locate the first top-level `{...}` pair, honouring nesting.
fn find_brace_group(pattern: &str) -> Option<BraceGroup> {
    let start = pattern.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in pattern[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(BraceGroup {
                        start,
                        end: start + offset,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a brace group body on top-level commas only.
fn split_alternatives(body: &str) -> Vec<&str> {
    let mut alternatives = Vec::new();
    let mut depth = 0usize;
    let mut piece_start = 0;
    for (offset, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                alternatives.push(&body[piece_start..offset]);
                piece_start = offset + 1;
            }
            _ => {}
        }
    }
    alternatives.push(&body[piece_start..]);
    alternatives
}

/// Expand `pattern` (brace alternation plus glob wildcards) against the
/// tree rooted at `root`, returning matches in sorted order.
///
/// The root itself is escaped, so metacharacters in the filesystem path
/// do not act as wildcards.
///
/// # Errors
///
/// Returns the underlying [`glob::PatternError`] for a malformed glob.
pub fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, glob::PatternError> {
    let escaped_root = Pattern::escape(&root.to_string_lossy());
    let mut matches = Vec::new();
    for piece in brace_expand(pattern) {
        let full = format!("{escaped_root}/{piece}");
        for path in glob::glob(&full)?.flatten() {
            matches.push(path);
        }
    }
    matches.sort();
    matches.dedup();
    Ok(matches)
}
