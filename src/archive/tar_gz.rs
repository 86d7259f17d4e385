//! Extractor for .tar.gz / .tgz archives.

use crate::runtime::Runtime;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::debug;
use std::path::{Component, Path};
use tar::{Archive, EntryType};

use super::ArchiveExtractor;

pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting tar.gz archive to {:?}...", extract_to);
        let reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        let mut archive = Archive::new(GzDecoder::new(reader));
        runtime.create_dir_all(extract_to)?;

        for entry in archive
            .entries()
            .with_context(|| "Failed to parse tar.gz archive")?
        {
            let mut entry = entry.with_context(|| "Failed to read tar entry")?;
            let entry_path = entry.path()?.into_owned();

            if !is_safe_entry_path(&entry_path) {
                debug!("Skipping entry with invalid path: {:?}", entry_path);
                continue;
            }
            let full_path = extract_to.join(&entry_path);

            match entry.header().entry_type() {
                EntryType::Directory => {
                    runtime.create_dir_all(&full_path)?;
                }
                EntryType::Regular => {
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    let mut writer = runtime
                        .create_file(&full_path)
                        .with_context(|| format!("Failed to create {:?}", full_path))?;
                    std::io::copy(&mut entry, &mut writer)
                        .with_context(|| format!("Failed to write {:?}", full_path))?;
                    drop(writer);

                    if let Ok(mode) = entry.header().mode() {
                        runtime.set_permissions(&full_path, mode)?;
                    }
                }
                other => {
                    debug!("Skipping unsupported tar entry type {:?}: {:?}", other, entry_path);
                }
            }
        }

        debug!("Tar.gz extraction complete.");
        Ok(())
    }
}

/// Relative, downward-only paths; everything else is skipped.
fn is_safe_entry_path(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::tempdir;

    fn create_tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
        let mut tar_builder = tar::Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_path(name).unwrap();
            header.set_mode(0o644);
            header.set_cksum();
            tar_builder.append(&header, content.as_bytes()).unwrap();
        }
        let tar = tar_builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_can_handle() {
        let extractor = TarGzExtractor;
        assert!(extractor.can_handle(Path::new("a.tar.gz")));
        assert!(extractor.can_handle(Path::new("a.tgz")));
        assert!(!extractor.can_handle(Path::new("a.zip")));
    }

    #[test]
    fn test_extract_files() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("bundle.tar.gz");
        let extract_to = dir.path().join("staging");

        let bytes = create_tar_gz(&[
            ("Demo.app/Contents/Info.plist", "<plist/>"),
            ("Demo.app/Contents/MacOS/demo", "bin"),
        ]);
        std::fs::write(&archive_path, bytes).unwrap();

        TarGzExtractor
            .extract(&runtime, &archive_path, &extract_to)
            .unwrap();

        assert!(extract_to.join("Demo.app/Contents/Info.plist").is_file());
        assert!(extract_to.join("Demo.app/Contents/MacOS/demo").is_file());
    }

    #[test]
    fn test_safe_entry_path() {
        assert!(is_safe_entry_path(Path::new("a/b/c")));
        assert!(is_safe_entry_path(Path::new("./a")));
        assert!(!is_safe_entry_path(Path::new("../escape")));
        assert!(!is_safe_entry_path(Path::new("/absolute")));
        assert!(!is_safe_entry_path(Path::new("a/../../b")));
    }
}
