//! Manifest catalog: every `.toml` manifest found in the manifest directory.

use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::Path;

use crate::runtime::Runtime;

use super::{Manifest, validate};

/// An in-memory collection of loaded manifests, keyed by identifier.
#[derive(Debug)]
pub struct Catalog {
    manifests: BTreeMap<String, Manifest>,
}

impl Catalog {
    /// Load every manifest under `dir`. Identifiers must be unique across
    /// the directory; a duplicate aborts the load.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, dir: &Path) -> Result<Self> {
        let mut manifests = BTreeMap::new();

        if !runtime.is_dir(dir) {
            warn!("Manifest directory {} does not exist", dir.display());
            return Ok(Self { manifests });
        }

        let mut entries = runtime.read_dir(dir)?;
        entries.sort();
        for entry in entries {
            if entry.extension().and_then(|e| e.to_str()) != Some("toml") {
                debug!("Skipping non-manifest entry {}", entry.display());
                continue;
            }
            let manifest = Manifest::load(runtime, &entry)?;
            if manifests.contains_key(&manifest.identifier) {
                return Err(anyhow!(
                    "Duplicate manifest identifier '{}' (second definition in {})",
                    manifest.identifier,
                    entry.display()
                ));
            }
            manifests.insert(manifest.identifier.clone(), manifest);
        }

        debug!("Loaded {} manifests from {}", manifests.len(), dir.display());
        Ok(Self { manifests })
    }

    /// Look up a manifest, failing with a user-facing message when unknown.
    pub fn get(&self, identifier: &str) -> Result<&Manifest> {
        self.manifests.get(identifier).ok_or_else(|| {
            anyhow!(
                "No manifest for '{}' (searched {} manifests)",
                identifier,
                self.manifests.len()
            )
        })
    }

    pub fn find(&self, identifier: &str) -> Option<&Manifest> {
        self.manifests.get(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Manifest> {
        self.manifests.values()
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Validate every manifest; returns `(identifier, problems)` for each
    /// manifest that failed.
    pub fn check(&self) -> Vec<(String, Vec<String>)> {
        self.manifests
            .values()
            .filter_map(|m| {
                let problems = validate::problems(m);
                if problems.is_empty() {
                    None
                } else {
                    Some((m.identifier.clone(), problems))
                }
            })
            .collect()
    }
}
