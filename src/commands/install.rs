use anyhow::Result;
use log::debug;

use crate::install::{InstallAction, Receipt};
use crate::manifest::Catalog;
use crate::runtime::Runtime;

use super::config::Config;

/// Install a package by manifest identifier.
#[tracing::instrument(skip(config))]
pub async fn install<R: Runtime + 'static>(config: Config<R>, identifier: &str) -> Result<()> {
    let catalog = Catalog::load(&config.runtime, &config.paths.manifest_dir)?;
    let manifest = catalog.get(identifier)?;

    if let Ok(existing) = Receipt::load(&config.runtime, &config.paths.root, identifier)
        && existing.version == manifest.version
    {
        println!(
            "{} {} is already installed at {}",
            manifest.name,
            manifest.version,
            existing.app_path.display()
        );
        return Ok(());
    }

    debug!("Installing {} {}", manifest.identifier, manifest.version);
    let action = InstallAction::new(
        &config.runtime,
        &config.extractor,
        &config.http,
        &config.paths.root,
        &config.paths.applications_dir,
        config.require_checksum,
    );
    let receipt = action.install(manifest, &catalog).await?;

    println!(
        "Installed {} {} to {}",
        receipt.name,
        receipt.version,
        receipt.app_path.display()
    );
    if !receipt.checksum_verified {
        println!("Warning: archive integrity was not verified (sha256 = \"no-check\").");
    }
    if let Some(caveats) = &manifest.caveats {
        println!();
        println!("==> Caveats");
        println!("{}", caveats.trim_end());
    }
    Ok(())
}
