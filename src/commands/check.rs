use anyhow::{Result, anyhow};

use crate::manifest::Catalog;
use crate::runtime::Runtime;

use super::config::Config;

/// Validate every manifest in the catalog.
#[tracing::instrument(skip(config))]
pub fn check<R: Runtime>(config: &Config<R>) -> Result<()> {
    let catalog = Catalog::load(&config.runtime, &config.paths.manifest_dir)?;
    if catalog.is_empty() {
        println!(
            "No manifests found in {}",
            config.paths.manifest_dir.display()
        );
        return Ok(());
    }

    let report = catalog.check();
    if report.is_empty() {
        println!("{} manifests OK", catalog.len());
        return Ok(());
    }

    for (identifier, problems) in &report {
        println!("{}:", identifier);
        for problem in problems {
            println!("  - {}", problem);
        }
    }
    Err(anyhow!(
        "{} of {} manifests invalid",
        report.len(),
        catalog.len()
    ))
}
