//! URL template resolution.
//!
//! A manifest's `url` may embed the `{version}` token. Resolution is plain
//! textual substitution and nothing else, so the resolved URL is a pure
//! function of the version.

use anyhow::{Context, Result};

/// Token substituted with the manifest version.
pub const VERSION_TOKEN: &str = "{version}";

/// Substitute every occurrence of the version token.
pub fn resolve(template: &str, version: &str) -> String {
    template.replace(VERSION_TOKEN, version)
}

/// Substitute the version token and verify the result is a syntactically
/// valid URL.
pub fn resolve_checked(template: &str, version: &str) -> Result<String> {
    let resolved = resolve(template, version);
    reqwest::Url::parse(&resolved)
        .with_context(|| format!("Resolved download URL '{}' is not a valid URL", resolved))?;
    Ok(resolved)
}

/// Whether the template carries the version token at all.
pub fn is_templated(template: &str) -> bool {
    template.contains(VERSION_TOKEN)
}
