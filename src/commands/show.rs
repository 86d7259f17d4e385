use anyhow::Result;

use crate::install::Receipt;
use crate::manifest::{Catalog, ChecksumPolicy};
use crate::runtime::Runtime;

use super::config::Config;

/// Show a manifest's fields and the package's install state.
#[tracing::instrument(skip(config))]
pub fn show<R: Runtime>(config: &Config<R>, identifier: &str) -> Result<()> {
    let catalog = Catalog::load(&config.runtime, &config.paths.manifest_dir)?;
    let manifest = catalog.get(identifier)?;

    println!("{}: {}", manifest.identifier, manifest.name);
    if let Some(description) = &manifest.description {
        println!("  {}", description);
    }
    println!("  version:  {}", manifest.version);
    println!("  url:      {}", manifest.resolved_url()?);
    match &manifest.sha256 {
        ChecksumPolicy::NoCheck => println!("  sha256:   not checked"),
        ChecksumPolicy::Sha256(digest) => println!("  sha256:   {}", digest),
    }
    if let Some(homepage) = &manifest.homepage {
        println!("  homepage: {}", homepage);
    }
    if let Some(macos) = &manifest.macos {
        println!("  macos:    {}", macos);
    }
    if !manifest.depends.is_empty() {
        println!("  depends:  {}", manifest.depends.join(", "));
    }
    println!("  app:      {}", manifest.app);
    for zap in &manifest.zap {
        println!("  zap:      {}", zap);
    }

    match Receipt::load(&config.runtime, &config.paths.root, identifier) {
        Ok(receipt) => {
            println!(
                "  installed: {} at {}",
                receipt.version,
                receipt.app_path.display()
            );
        }
        Err(_) => println!("  installed: no"),
    }

    if let Some(caveats) = &manifest.caveats {
        println!();
        println!("==> Caveats");
        println!("{}", caveats.trim_end());
    }
    Ok(())
}
