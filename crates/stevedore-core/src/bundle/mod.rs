//! In-memory gateway bundle archive.
//!
//! A [`Bundle`] is an ordered mapping from archive-internal path to byte
//! content, built entirely in memory, optionally persisted to a local zip
//! file, then handed to the remote gateway and discarded. Nothing survives
//! past one run.

pub mod builder;
pub mod filter;
pub mod manifest;

use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::Context;

/// Archive path prefix for node application resources in nest mode.
pub const RESOURCE_PREFIX: &str = "apiproxy/resources/node";

/// Ordered, unique mapping from archive path to content.
///
/// Paths are forward-slash separated regardless of the host platform.
/// Entry order is insertion order and is preserved in the serialized zip.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    entries: Vec<(String, Vec<u8>)>,
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Fails if the path is already present; all content is
    /// resolved before any entry is finalized, so a duplicate means the
    /// builder produced an inconsistent layout.
    pub fn add_entry(&mut self, path: impl Into<String>, bytes: Vec<u8>) -> anyhow::Result<()> {
        let path = path.into();
        if self.entries.iter().any(|(p, _)| *p == path) {
            anyhow::bail!("duplicate bundle entry: {}", path);
        }
        self.entries.push((path, bytes));
        Ok(())
    }

    /// Archive paths in insertion order.
    pub fn entry_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    /// Content of the entry at `path`, if present.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, b)| b.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize all entries into an in-memory zip archive.
    pub fn to_zip_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);

            for (path, bytes) in &self.entries {
                zip.start_file(path.as_str(), options)
                    .with_context(|| format!("Failed to start zip entry: {}", path))?;
                zip.write_all(bytes)
                    .with_context(|| format!("Failed to write zip entry: {}", path))?;
            }

            zip.finish().context("Failed to finish zip archive")?;
        }
        Ok(buf.into_inner())
    }

    /// Persist the serialized archive to `path`, overwriting any existing
    /// file of the same name.
    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            tracing::info!("Overwriting existing archive: {}", path.display());
        }
        let bytes = self.to_zip_bytes()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write archive: {}", path.display()))
    }
}
