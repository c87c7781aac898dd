//! Progress and report output for the CLI.
//!
//! User-facing progress goes to the error stream; `make-sri` integrity
//! strings and `verify` mismatch reports go to the output stream, so the
//! interesting lines survive a `2>/dev/null`.

use std::io::Write;

/// Write one line to a stream, swallowing write failures.
pub fn write_line(stream: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stream, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Format a `make-sri` report line: digest first, sha256sum-style.
#[must_use]
pub fn sri_line(computed: &str, url: &str) -> String {
    format!("{computed}  {url}")
}

/// Format a `verify` report for a file that differs from the source.
#[must_use]
pub fn mismatch_line(module: &str, path: &std::path::Path) -> String {
    format!("{module}: mismatch: {}", path.display())
}

/// Format a `verify` report for a file missing from the vendor tree.
#[must_use]
pub fn missing_line(module: &str, path: &std::path::Path) -> String {
    format!("{module}: missing: {}", path.display())
}
