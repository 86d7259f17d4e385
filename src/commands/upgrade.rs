use anyhow::Result;
use log::debug;

use crate::install::{InstallAction, InstallError, Receipt};
use crate::manifest::Catalog;
use crate::runtime::Runtime;

use super::config::Config;

/// Reinstall a package when its manifest declares a different version than
/// the install receipt. Zap paths are never touched on upgrade.
#[tracing::instrument(skip(config))]
pub async fn upgrade<R: Runtime + 'static>(config: Config<R>, identifier: &str) -> Result<()> {
    let catalog = Catalog::load(&config.runtime, &config.paths.manifest_dir)?;
    let manifest = catalog.get(identifier)?;

    if !Receipt::exists(&config.runtime, &config.paths.root, identifier) {
        return Err(InstallError::NotInstalled(identifier.to_string()).into());
    }
    let receipt = Receipt::load(&config.runtime, &config.paths.root, identifier)?;

    if receipt.version == manifest.version {
        println!(
            "{} is already up to date ({}).",
            manifest.name, manifest.version
        );
        return Ok(());
    }

    debug!(
        "Upgrading {} {} -> {}",
        identifier, receipt.version, manifest.version
    );
    println!(
        "Upgrading {} {} -> {}",
        manifest.name, receipt.version, manifest.version
    );

    let action = InstallAction::new(
        &config.runtime,
        &config.extractor,
        &config.http,
        &config.paths.root,
        &config.paths.applications_dir,
        config.require_checksum,
    );
    let new_receipt = action.install(manifest, &catalog).await?;

    println!(
        "Upgraded {} to {} at {}",
        new_receipt.name,
        new_receipt.version,
        new_receipt.app_path.display()
    );
    Ok(())
}
