//! Uninstall and purge.
//!
//! Plain uninstall removes the app bundle and the receipt, nothing else.
//! Purge additionally deletes the manifest's zap paths under the user's
//! home; a missing path counts as already clean, never as an error.

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::install::{InstallError, Receipt};
use crate::manifest::{Manifest, validate};
use crate::runtime::Runtime;

pub struct RemoveAction<'a, R: Runtime> {
    runtime: &'a R,
    root: &'a Path,
}

/// Outcome of a purge run over a manifest's zap paths.
#[derive(Debug, Default, PartialEq)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
    pub already_clean: Vec<String>,
}

impl<'a, R: Runtime> RemoveAction<'a, R> {
    pub fn new(runtime: &'a R, root: &'a Path) -> Self {
        Self { runtime, root }
    }

    /// Remove the app bundle and receipt. Fails with `NotInstalled` when no
    /// receipt exists.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, identifier: &str) -> Result<Receipt> {
        if !Receipt::exists(self.runtime, self.root, identifier) {
            return Err(InstallError::NotInstalled(identifier.to_string()).into());
        }
        let receipt = Receipt::load(self.runtime, self.root, identifier)?;

        if self.runtime.exists(&receipt.app_path) {
            self.runtime
                .remove_dir_all(&receipt.app_path)
                .with_context(|| {
                    format!("Failed to remove app bundle {}", receipt.app_path.display())
                })?;
            info!("Removed {}", receipt.app_path.display());
        } else {
            debug!(
                "App bundle {} already absent, removing receipt only",
                receipt.app_path.display()
            );
        }

        self.runtime
            .remove_file(&Receipt::path_for(self.root, identifier))?;
        Ok(receipt)
    }

    /// Delete every zap path that exists. Paths are re-validated against the
    /// home-only rule at purge time, then expanded against the home
    /// directory. The final path component may carry a glob pattern.
    #[tracing::instrument(skip(self, manifest), fields(package = %manifest.identifier))]
    pub fn purge(&self, manifest: &Manifest) -> Result<PurgeReport> {
        let home = self
            .runtime
            .home_dir()
            .ok_or_else(|| anyhow!("Cannot purge: no home directory"))?;

        let mut report = PurgeReport::default();
        for raw in &manifest.zap {
            validate::check_zap_path(raw)
                .with_context(|| format!("Refusing unsafe zap path '{}'", raw))?;

            let matches = self.expand_zap_path(&home, raw)?;
            if matches.is_empty() {
                debug!("Zap path {} already absent", raw);
                report.already_clean.push(raw.clone());
                continue;
            }
            for path in matches {
                if self.runtime.is_dir(&path) {
                    self.runtime.remove_dir_all(&path)?;
                } else {
                    self.runtime.remove_file(&path)?;
                }
                info!("Purged {}", path.display());
                report.removed.push(path);
            }
        }
        Ok(report)
    }

    /// Expand a `~/`-relative zap entry to the existing paths it names.
    fn expand_zap_path(&self, home: &Path, raw: &str) -> Result<Vec<PathBuf>> {
        // check_zap_path already guaranteed the prefix.
        let rest = raw.strip_prefix("~/").unwrap_or(raw);
        let full = home.join(rest);

        let file_name = match full.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => return Ok(Vec::new()),
        };

        if !file_name.contains(['*', '?', '[']) {
            if self.runtime.exists(&full) {
                return Ok(vec![full]);
            }
            return Ok(Vec::new());
        }

        let parent = full
            .parent()
            .ok_or_else(|| anyhow!("Zap pattern '{}' has no parent directory", raw))?
            .to_path_buf();
        if !self.runtime.is_dir(&parent) {
            return Ok(Vec::new());
        }

        let pattern = glob::Pattern::new(&file_name)
            .with_context(|| format!("Invalid zap pattern '{}'", raw))?;
        let mut matches: Vec<PathBuf> = self
            .runtime
            .read_dir(&parent)?
            .into_iter()
            .filter(|entry| {
                entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| pattern.matches(n))
            })
            .collect();
        matches.sort();
        Ok(matches)
    }
}
