use anyhow::Result;

use crate::install::Receipt;
use crate::manifest::Catalog;
use crate::runtime::Runtime;

use super::config::Config;

/// List installed packages, flagging those whose manifest declares a
/// different version.
#[tracing::instrument(skip(config))]
pub fn list<R: Runtime>(config: &Config<R>) -> Result<()> {
    let receipts = Receipt::load_all(&config.runtime, &config.paths.root)?;
    if receipts.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }

    let catalog = Catalog::load(&config.runtime, &config.paths.manifest_dir)?;
    for receipt in receipts {
        let note = match catalog.find(&receipt.identifier) {
            Some(manifest) if manifest.version != receipt.version => {
                format!("  (manifest has {})", manifest.version)
            }
            Some(_) => String::new(),
            None => "  (no manifest)".to_string(),
        };
        println!("{} {}{}", receipt.identifier, receipt.version, note);
    }
    Ok(())
}
