//! Path exclusion predicates applied during bundle construction.
//!
//! Two independent checks at different traversal granularities: hidden
//! version-control style segments (`.git`, `.svn`) and editor backup files
//! (trailing `~`). Stateless and side-effect free.

use std::path::Path;

/// True iff the segment starts with a literal dot followed by at least one
/// word character (`[A-Za-z0-9_]`). Bare `.` and `..` are not excluded.
pub fn is_excluded_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    if chars.next() != Some('.') {
        return false;
    }
    matches!(chars.next(), Some(c) if c.is_ascii_alphanumeric() || c == '_')
}

/// True iff the filename ends with `~`.
pub fn is_excluded_file(filename: &str) -> bool {
    filename.ends_with('~')
}

/// True iff any component of `path` is an excluded segment.
pub fn path_has_excluded_segment(path: &Path) -> bool {
    path.components()
        .any(|c| is_excluded_segment(&c.as_os_str().to_string_lossy()))
}
