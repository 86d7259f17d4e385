//! Manifest validation.
//!
//! The loading contract a manifest must satisfy before the installer will
//! act on it. Zap paths get particular scrutiny: purge deletes them
//! unconditionally once confirmed, so they must stay inside the user's own
//! home hierarchy.

use anyhow::{Result, anyhow};
use std::path::Component;
use std::path::Path;

use crate::platform::PlatformRequirement;

use super::{ChecksumPolicy, Manifest, template};

/// Check one manifest and return every problem found, in field order.
/// An empty vector means the manifest is valid.
pub fn problems(manifest: &Manifest) -> Vec<String> {
    let mut problems = Vec::new();

    if manifest.identifier.trim().is_empty() {
        problems.push("identifier must not be empty".to_string());
    } else if manifest
        .identifier
        .chars()
        .any(|c| c.is_whitespace() || c == '/')
    {
        problems.push(format!(
            "identifier '{}' must not contain whitespace or '/'",
            manifest.identifier
        ));
    }

    if manifest.version.trim().is_empty() {
        problems.push("version must not be empty".to_string());
    }

    if manifest.name.trim().is_empty() {
        problems.push("name must not be empty".to_string());
    }

    if manifest.url.trim().is_empty() {
        problems.push("url must not be empty".to_string());
    } else {
        match template::resolve_checked(&manifest.url, &manifest.version) {
            Err(e) => problems.push(format!("url does not resolve: {:#}", e)),
            Ok(resolved) => {
                // The declared version must be recoverable from the URL,
                // whether templated or written out literally.
                if !resolved.contains(manifest.version.trim()) {
                    problems.push(format!(
                        "url '{}' does not embed version '{}'",
                        manifest.url, manifest.version
                    ));
                }
            }
        }
    }

    if let ChecksumPolicy::Sha256(digest) = &manifest.sha256
        && (digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()))
    {
        problems.push(format!(
            "sha256 '{}' is not a 64-character hex digest (use \"no-check\" to skip verification)",
            digest
        ));
    }

    if let Some(raw) = &manifest.macos
        && let Err(e) = raw.parse::<PlatformRequirement>()
    {
        problems.push(format!("macos requirement invalid: {:#}", e));
    }

    if manifest.app.trim().is_empty() {
        problems.push("app must not be empty".to_string());
    }

    for dep in &manifest.depends {
        if dep.trim().is_empty() {
            problems.push("depends entries must not be empty".to_string());
        } else if dep == &manifest.identifier {
            problems.push(format!("package '{}' cannot depend on itself", dep));
        }
    }

    for zap in &manifest.zap {
        if let Err(e) = check_zap_path(zap) {
            problems.push(format!("zap path '{}': {:#}", zap, e));
        }
    }

    problems
}

/// Validate a manifest, failing on the first report with all problems listed.
pub fn ensure_valid(manifest: &Manifest) -> Result<()> {
    let problems = problems(manifest);
    if problems.is_empty() {
        return Ok(());
    }
    Err(anyhow!(
        "Manifest '{}' is invalid:\n  - {}",
        manifest.identifier,
        problems.join("\n  - ")
    ))
}

/// Zap paths must be home-relative (`~/...`) and must not escape upward.
pub fn check_zap_path(path: &str) -> Result<()> {
    let rest = path
        .strip_prefix("~/")
        .ok_or_else(|| anyhow!("must start with '~/'"))?;
    if rest.is_empty() {
        return Err(anyhow!("must name something inside the home directory"));
    }
    for component in Path::new(rest).components() {
        match component {
            Component::ParentDir => return Err(anyhow!("must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(anyhow!("must stay relative to the home directory"));
            }
            _ => {}
        }
    }
    Ok(())
}
