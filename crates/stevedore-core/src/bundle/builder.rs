//! Bundle construction from a local directory tree.
//!
//! Two construction modes, selected by deployment flavor:
//!
//! - **flatten** (proxy flavor): the whole tree is walked recursively and
//!   every surviving file keeps its root-relative path.
//! - **nest** (application flavor): descriptor entries come first, then only
//!   the top level of the root is inspected; each qualifying subdirectory is
//!   zipped independently and stored as a single opaque entry, which keeps
//!   dependency trees from blowing up the outer archive's entry count.

use std::fs;
use std::path::Path;

use anyhow::Context;

use super::filter;
use super::Bundle;
use crate::error::Error;

/// Build a flatten-mode bundle: every file reachable from `root` whose
/// relative path has no excluded segment and whose name is not a backup
/// file, stored verbatim at its relative path.
pub fn build_flat(root: &Path) -> Result<Bundle, Error> {
    let mut bundle = Bundle::new();
    walk(&mut bundle, root, Path::new(""), true).map_err(Error::Packaging)?;
    Ok(bundle)
}

/// Build a nest-mode bundle.
///
/// `descriptors` are added first at their well-known paths. Then each
/// top-level entry of `root` is handled: an entry named `skip_name` (the
/// configured output archive) is skipped, an excluded-by-segment entry is
/// skipped entirely, a directory is sub-archived as one opaque
/// `{resource_prefix}/{name}.zip` entry, and a plain non-backup file lands
/// at `{resource_prefix}/{name}`.
pub fn build_nested(
    root: &Path,
    descriptors: Vec<(String, String)>,
    resource_prefix: &str,
    skip_name: Option<&str>,
) -> Result<Bundle, Error> {
    let mut bundle = Bundle::new();

    for (path, content) in descriptors {
        bundle
            .add_entry(path, content.into_bytes())
            .map_err(Error::Packaging)?;
    }

    let result = (|| -> anyhow::Result<()> {
        for entry in sorted_entries(root)? {
            let name = entry.file_name().to_string_lossy().into_owned();

            if Some(name.as_str()) == skip_name {
                tracing::info!("Skipping {} which is the output archive", name);
                continue;
            }
            if filter::is_excluded_segment(&name) {
                continue;
            }

            let path = entry.path();
            if path.is_dir() {
                tracing::debug!("Sub-archiving directory: {}", path.display());
                let nested = zip_subdirectory(&path)?;
                bundle.add_entry(format!("{}/{}.zip", resource_prefix, name), nested)?;
            } else if !filter::is_excluded_file(&name) {
                let bytes = fs::read(&path)
                    .with_context(|| format!("Failed to read file: {}", path.display()))?;
                bundle.add_entry(format!("{}/{}", resource_prefix, name), bytes)?;
            }
        }
        Ok(())
    })();
    result.map_err(Error::Packaging)?;

    Ok(bundle)
}

/// Serialize a subdirectory as an independent zip archive with entry paths
/// relative to the subdirectory. Only the backup-file exclusion is applied;
/// the dot-segment exclusion is not re-applied inside the nested walk.
fn zip_subdirectory(dir: &Path) -> anyhow::Result<Vec<u8>> {
    let mut nested = Bundle::new();
    walk(&mut nested, dir, Path::new(""), false)?;
    nested.to_zip_bytes()
}

/// Recursive flatten walk. With `exclude_segments` set, a directory whose
/// name is an excluded segment is skipped together with its whole subtree,
/// so no path containing an excluded segment ever reaches the bundle.
fn walk(
    bundle: &mut Bundle,
    dir: &Path,
    relative: &Path,
    exclude_segments: bool,
) -> anyhow::Result<()> {
    for entry in sorted_entries(dir)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        let rel = relative.join(&name);

        if path.is_dir() {
            if exclude_segments && filter::is_excluded_segment(&name) {
                continue;
            }
            walk(bundle, &path, &rel, exclude_segments)?;
        } else if !filter::is_excluded_file(&name) {
            let bytes = fs::read(&path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            bundle.add_entry(archive_path(&rel), bytes)?;
        }
    }
    Ok(())
}

/// Directory entries in sorted order so the produced archive is
/// byte-reproducible for identical inputs.
fn sorted_entries(dir: &Path) -> anyhow::Result<Vec<fs::DirEntry>> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to read directory entry in: {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Forward-slash archive path for a relative filesystem path.
fn archive_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
