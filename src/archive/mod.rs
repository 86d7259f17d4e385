//! Archive extraction for downloaded install artifacts.

mod tar_gz;
mod zip;

use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use std::path::Path;

pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

/// Trait for format-specific archive extractors.
pub trait ArchiveExtractor: Send + Sync {
    /// Check if this extractor can handle the given archive format.
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Extract the archive's contents into the given directory.
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()>;
}

/// Dispatcher that selects the appropriate extractor based on archive format.
pub struct ExtractorDispatch {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl Default for ExtractorDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorDispatch {
    pub fn new() -> Self {
        Self {
            tar_gz: TarGzExtractor,
            zip: ZipExtractor,
        }
    }
}

impl ArchiveExtractor for ExtractorDispatch {
    fn can_handle(&self, archive_path: &Path) -> bool {
        self.tar_gz.can_handle(archive_path) || self.zip.can_handle(archive_path)
    }

    #[tracing::instrument(skip(self, runtime, archive_path, extract_to))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        if self.tar_gz.can_handle(archive_path) {
            return self.tar_gz.extract(runtime, archive_path, extract_to);
        }
        if self.zip.can_handle(archive_path) {
            return self.zip.extract(runtime, archive_path, extract_to);
        }
        Err(anyhow!(
            "Unsupported archive format: {}",
            archive_path.display()
        ))
    }
}
