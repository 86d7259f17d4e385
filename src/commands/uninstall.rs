use anyhow::Result;
use log::{debug, warn};

use crate::install::InstallError;
use crate::manifest::{Catalog, Manifest};
use crate::runtime::Runtime;
use crate::uninstall::RemoveAction;

use super::config::Config;

/// Uninstall a package; with `purge` also delete its zap paths.
#[tracing::instrument(skip(config))]
pub fn uninstall<R: Runtime>(
    config: &Config<R>,
    identifier: &str,
    purge: bool,
    yes: bool,
) -> Result<()> {
    let action = RemoveAction::new(&config.runtime, &config.paths.root);

    if !purge {
        if !yes
            && !config
                .runtime
                .confirm(&format!("Remove '{}'?", identifier))?
        {
            println!("Removal cancelled.");
            return Ok(());
        }
        let receipt = action.remove(identifier)?;
        println!("Removed {} {}", receipt.name, receipt.version);
        return Ok(());
    }

    // Purge needs the manifest for its zap list.
    if config.runtime.is_privileged() {
        warn!("Purging as root: zap paths resolve against root's home directory");
    }
    let catalog = Catalog::load(&config.runtime, &config.paths.manifest_dir)?;
    let manifest = catalog.get(identifier)?;

    show_purge_plan(manifest);
    if !yes && !config.runtime.confirm("Proceed with purge?")? {
        println!("Purge cancelled.");
        return Ok(());
    }

    match action.remove(identifier) {
        Ok(receipt) => println!("Removed {} {}", receipt.name, receipt.version),
        Err(e) if is_not_installed(&e) => {
            debug!("{} not installed, purging leftover files only", identifier);
            println!("{} is not installed; purging leftover files.", identifier);
        }
        Err(e) => return Err(e),
    }

    let report = action.purge(manifest)?;
    for path in &report.removed {
        println!("Purged {}", path.display());
    }
    println!(
        "Purge complete: {} removed, {} already clean.",
        report.removed.len(),
        report.already_clean.len()
    );
    Ok(())
}

fn show_purge_plan(manifest: &Manifest) {
    println!("Purging {} will additionally delete:", manifest.name);
    if manifest.zap.is_empty() {
        println!("  (no zap paths declared)");
    }
    for path in &manifest.zap {
        println!("  {}", path);
    }
}

fn is_not_installed(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<InstallError>(),
        Some(InstallError::NotInstalled(_))
    )
}
