//! The install manifest: a declarative, side-effect-free record describing
//! how to fetch and install one application.
//!
//! Manifests are TOML documents, one per package, authored once per release.
//! They carry no mutable runtime state; everything the installer records
//! about an actual installation lives in receipts instead.

mod catalog;
pub mod template;
pub mod validate;

pub use catalog::Catalog;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::platform::PlatformRequirement;
use crate::runtime::Runtime;

/// Whether the downloaded archive's integrity is verified before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChecksumPolicy {
    /// No integrity guarantee; the download is trusted by source origin only.
    NoCheck,
    /// Verify the downloaded archive against this SHA-256 hex digest.
    Sha256(String),
}

impl From<String> for ChecksumPolicy {
    fn from(value: String) -> Self {
        match value.trim() {
            "no-check" | "no_check" => ChecksumPolicy::NoCheck,
            digest => ChecksumPolicy::Sha256(digest.to_lowercase()),
        }
    }
}

impl From<ChecksumPolicy> for String {
    fn from(policy: ChecksumPolicy) -> Self {
        match policy {
            ChecksumPolicy::NoCheck => "no-check".to_string(),
            ChecksumPolicy::Sha256(digest) => digest,
        }
    }
}

/// Declarative install manifest for a single package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Unique token naming the package within a catalog.
    pub identifier: String,
    /// Released version; the URL template is resolved against it.
    pub version: String,
    /// Download URL, optionally templated with `{version}`.
    pub url: String,
    /// SHA-256 digest of the archive, or `"no-check"` to skip verification.
    pub sha256: ChecksumPolicy,
    /// Human-readable display name.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// Minimum macOS version, e.g. `">= 10.15"` or `">= catalina"`.
    #[serde(default)]
    pub macos: Option<String>,
    /// Identifiers of packages that must be installed first.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Path of the app bundle inside the extracted archive.
    pub app: String,
    /// Home-relative paths removed only on an explicit purge.
    #[serde(default)]
    pub zap: Vec<String>,
    /// Notice shown to the user after install; informational only.
    #[serde(default)]
    pub caveats: Option<String>,
}

impl Manifest {
    /// Parse a manifest from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse manifest TOML")
    }

    /// Load a manifest file through the runtime.
    #[tracing::instrument(skip(runtime, path))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))
    }

    /// The concrete download URL for this manifest's version.
    /// Pure substitution; the same version always yields the same URL.
    pub fn resolved_url(&self) -> Result<String> {
        template::resolve_checked(&self.url, &self.version)
    }

    /// The parsed platform requirement, if the manifest declares one.
    pub fn platform_requirement(&self) -> Result<Option<PlatformRequirement>> {
        match &self.macos {
            None => Ok(None),
            Some(raw) => Ok(Some(raw.parse::<PlatformRequirement>()?)),
        }
    }

    /// File name of the app bundle, e.g. `Pi Menu.app`.
    pub fn app_bundle_name(&self) -> &str {
        Path::new(&self.app)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.app)
    }
}

#[cfg(test)]
pub(crate) fn sample_manifest() -> Manifest {
    Manifest::parse(
        r#"
        identifier = "pi-menu"
        version = "2.0.0"
        url = "https://example.com/releases/v{version}/Pi_Menu_v{version}_macOS.zip"
        sha256 = "no-check"
        name = "Pi Menu"
        description = "Circular application launcher"
        homepage = "https://example.com/pi-menu"
        macos = ">= catalina"
        depends = ["python-runtime"]
        app = "Pi Menu.app"
        zap = [
            "~/Library/Preferences/com.example.pi-menu.plist",
            "~/Library/Application Support/Pi Menu",
            "~/.pi-menu",
        ]
        caveats = "Pi Menu requires PyQt6 to be installed."
        "#,
    )
    .unwrap()
}
