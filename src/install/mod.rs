//! The install action: everything between a validated manifest and an app
//! bundle sitting in the applications directory.
//!
//! Order matters here. The platform gate and dependency check run before
//! any network activity; the checksum policy is enforced on the downloaded
//! archive before extraction; zap paths are never touched.

mod error;
mod receipt;

pub use error::InstallError;
pub use receipt::Receipt;

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::archive::ArchiveExtractor;
use crate::checksum;
use crate::cleanup::{CleanupGuard, SharedCleanupContext, new_shared};
use crate::download::download_archive;
use crate::http::HttpClient;
use crate::manifest::{Catalog, ChecksumPolicy, Manifest, validate};
use crate::platform;
use crate::runtime::Runtime;

pub struct InstallAction<'a, R: Runtime, E: ArchiveExtractor> {
    runtime: &'a R,
    extractor: &'a E,
    http: &'a HttpClient,
    root: &'a Path,
    applications_dir: &'a Path,
    require_checksum: bool,
}

impl<'a, R: Runtime + 'static, E: ArchiveExtractor> InstallAction<'a, R, E> {
    pub fn new(
        runtime: &'a R,
        extractor: &'a E,
        http: &'a HttpClient,
        root: &'a Path,
        applications_dir: &'a Path,
        require_checksum: bool,
    ) -> Self {
        Self {
            runtime,
            extractor,
            http,
            root,
            applications_dir,
            require_checksum,
        }
    }

    /// Install a package: gate, fetch, verify, extract, place, record.
    #[tracing::instrument(skip(self, manifest, catalog), fields(package = %manifest.identifier))]
    pub async fn install(&self, manifest: &Manifest, catalog: &Catalog) -> Result<Receipt> {
        validate::ensure_valid(manifest)?;

        // Both gates run before any network activity.
        self.platform_gate(manifest)?;
        self.check_dependencies(manifest, catalog)?;

        if self.require_checksum && manifest.sha256 == ChecksumPolicy::NoCheck {
            return Err(InstallError::ChecksumRequired(manifest.identifier.clone()).into());
        }

        let url = manifest.resolved_url()?;
        let cleanup_ctx = new_shared();
        let result = self.fetch_and_place(manifest, &url, &cleanup_ctx).await;
        if result.is_err() {
            cleanup_ctx.lock().unwrap().cleanup();
        }
        let app_path = result?;

        let receipt = Receipt {
            identifier: manifest.identifier.clone(),
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            url,
            checksum_verified: matches!(manifest.sha256, ChecksumPolicy::Sha256(_)),
            app_path,
            installed_at: Receipt::now_timestamp(),
        };
        receipt.store(self.runtime, self.root)?;

        info!(
            "Installed {} {} to {}",
            manifest.name,
            manifest.version,
            receipt.app_path.display()
        );
        Ok(receipt)
    }

    /// Abort when the manifest requires a newer macOS than the system runs.
    fn platform_gate(&self, manifest: &Manifest) -> Result<()> {
        let Some(requirement) = manifest.platform_requirement()? else {
            debug!("No platform requirement declared");
            return Ok(());
        };
        let current = platform::current_version(self.runtime)?;
        if !requirement.satisfied_by(current) {
            return Err(InstallError::PlatformUnsupported {
                required: requirement.to_string(),
                current: current.to_string(),
            }
            .into());
        }
        debug!("Platform gate passed: {} satisfies {}", current, requirement);
        Ok(())
    }

    /// Every declared dependency must already have an install receipt.
    fn check_dependencies(&self, manifest: &Manifest, catalog: &Catalog) -> Result<()> {
        for dep in &manifest.depends {
            if Receipt::exists(self.runtime, self.root, dep) {
                continue;
            }
            if catalog.find(dep).is_none() {
                warn!("Dependency '{}' is not in the manifest catalog either", dep);
            }
            return Err(InstallError::UnresolvedDependency(dep.clone()).into());
        }
        Ok(())
    }

    async fn fetch_and_place(
        &self,
        manifest: &Manifest,
        url: &str,
        cleanup_ctx: &SharedCleanupContext,
    ) -> Result<PathBuf> {
        let cache_dir = self.root.join("cache");
        self.runtime.create_dir_all(&cache_dir)?;

        let archive_path = cache_dir.join(archive_file_name(manifest, url));
        let archive_guard = CleanupGuard::new(cleanup_ctx.clone(), archive_path.clone());

        download_archive(self.runtime, url, &archive_path, self.http).await?;
        checksum::verify(self.runtime, &archive_path, &manifest.sha256)?;

        let staging_dir = cache_dir.join(format!("{}-staging", manifest.identifier));
        if self.runtime.exists(&staging_dir) {
            self.runtime.remove_dir_all(&staging_dir)?;
        }
        let staging_guard = CleanupGuard::new(cleanup_ctx.clone(), staging_dir.clone());

        self.extractor
            .extract(self.runtime, &archive_path, &staging_dir)?;

        let bundle_src = staging_dir.join(&manifest.app);
        if !self.runtime.exists(&bundle_src) {
            return Err(InstallError::AppBundleMissing(manifest.app.clone()).into());
        }

        self.runtime.create_dir_all(self.applications_dir)?;
        let target = self.applications_dir.join(manifest.app_bundle_name());
        if self.runtime.exists(&target) {
            info!("Replacing existing bundle at {}", target.display());
            self.runtime.remove_dir_all(&target)?;
        }
        self.move_bundle(&bundle_src, &target)?;

        // Success: drop the temp archive and staging dir for real.
        archive_guard.success();
        staging_guard.success();
        self.runtime.remove_file(&archive_path)?;
        if self.runtime.exists(&staging_dir) {
            self.runtime.remove_dir_all(&staging_dir)?;
        }

        Ok(target)
    }

    /// Move the extracted bundle into place. Rename when possible, fall back
    /// to a recursive copy when the applications dir is on another volume.
    fn move_bundle(&self, from: &Path, to: &Path) -> Result<()> {
        if self.runtime.rename(from, to).is_ok() {
            return Ok(());
        }
        debug!("Rename failed, copying bundle to {}", to.display());
        copy_recursive(self.runtime, from, to)?;
        self.runtime.remove_dir_all(from)?;
        Ok(())
    }
}

/// File name to download the archive under, taken from the resolved URL.
fn archive_file_name(manifest: &Manifest, url: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("{}-{}.zip", manifest.identifier, manifest.version))
}

/// Recursively copy a directory tree through the runtime.
fn copy_recursive<R: Runtime>(runtime: &R, from: &Path, to: &Path) -> Result<()> {
    if !runtime.is_dir(from) {
        runtime
            .copy(from, to)
            .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
        return Ok(());
    }
    runtime.create_dir_all(to)?;
    for entry in runtime.read_dir(from)? {
        let name = entry
            .file_name()
            .ok_or_else(|| anyhow!("Unnamed entry under {}", from.display()))?;
        copy_recursive(runtime, &entry, &to.join(name))?;
    }
    Ok(())
}
