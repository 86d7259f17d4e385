//! Install receipts: the mutable state the installer keeps per installed
//! package, stored separately from the read-only manifests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::runtime::Runtime;

/// Record of one installed package.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Receipt {
    pub identifier: String,
    pub name: String,
    pub version: String,
    /// The concrete URL the archive was fetched from.
    pub url: String,
    /// False when the manifest declared `sha256 = "no-check"`.
    pub checksum_verified: bool,
    /// Where the app bundle was placed.
    pub app_path: PathBuf,
    /// Unix timestamp of the install.
    pub installed_at: u64,
}

impl Receipt {
    pub fn now_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Path of the receipt file for a package under the install root.
    pub fn path_for(root: &Path, identifier: &str) -> PathBuf {
        root.join("receipts").join(format!("{}.json", identifier))
    }

    #[tracing::instrument(skip(runtime, root))]
    pub fn load<R: Runtime>(runtime: &R, root: &Path, identifier: &str) -> Result<Self> {
        let path = Self::path_for(root, identifier);
        let content = runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read receipt {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid receipt {}", path.display()))
    }

    /// Whether a receipt exists for the package.
    pub fn exists<R: Runtime>(runtime: &R, root: &Path, identifier: &str) -> bool {
        runtime.exists(&Self::path_for(root, identifier))
    }

    #[tracing::instrument(skip(self, runtime, root))]
    pub fn store<R: Runtime>(&self, runtime: &R, root: &Path) -> Result<()> {
        let path = Self::path_for(root, &self.identifier);
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize receipt")?;
        runtime.write(&path, json.as_bytes())?;
        Ok(())
    }

    /// Load every receipt under the install root, sorted by identifier.
    #[tracing::instrument(skip(runtime))]
    pub fn load_all<R: Runtime>(runtime: &R, root: &Path) -> Result<Vec<Self>> {
        let dir = root.join("receipts");
        if !runtime.is_dir(&dir) {
            return Ok(Vec::new());
        }
        let mut receipts = Vec::new();
        let mut entries = runtime.read_dir(&dir)?;
        entries.sort();
        for entry in entries {
            if entry.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = runtime.read_to_string(&entry)?;
            let receipt: Receipt = serde_json::from_str(&content)
                .with_context(|| format!("Invalid receipt {}", entry.display()))?;
            receipts.push(receipt);
        }
        Ok(receipts)
    }
}
