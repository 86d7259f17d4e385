//! Extractor for .zip archives, the usual packaging for macOS app bundles.

use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::debug;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use super::ArchiveExtractor;

pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".zip")
    }

    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting zip archive to {:?}...", extract_to);
        let mut reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // zip requires Read + Seek, but Runtime::open returns Box<dyn Read + Send>,
        // so the archive is buffered in memory for seeking.
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
        let cursor = std::io::Cursor::new(buffer);

        let mut archive = ZipArchive::new(cursor).with_context(|| "Failed to parse ZIP archive")?;

        runtime.create_dir_all(extract_to)?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;

            // enclosed_name rejects absolute paths and parent traversal.
            let entry_path = match entry.enclosed_name() {
                Some(path) => path.to_path_buf(),
                None => {
                    debug!("Skipping entry with invalid path: {}", entry.name());
                    continue;
                }
            };

            let full_path = extract_to.join(&entry_path);

            if entry.is_dir() {
                runtime.create_dir_all(&full_path)?;
                continue;
            }

            if let Some(parent) = full_path.parent() {
                runtime.create_dir_all(parent)?;
            }

            let mut writer = runtime
                .create_file(&full_path)
                .with_context(|| format!("Failed to create {:?}", full_path))?;
            std::io::copy(&mut entry, &mut writer)
                .with_context(|| format!("Failed to write {:?}", full_path))?;
            drop(writer);

            if let Some(mode) = entry.unix_mode() {
                runtime.set_permissions(&full_path, mode)?;
            }
        }

        debug!("Zip extraction complete.");
        Ok(())
    }
}
