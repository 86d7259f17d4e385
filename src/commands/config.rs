//! Shared wiring for all CLI commands: resolved paths and constructed
//! collaborators (HTTP client, extractor).

use anyhow::{Context, Result, anyhow};
use log::debug;
use reqwest::Client;
use std::path::PathBuf;

use crate::archive::ExtractorDispatch;
use crate::http::HttpClient;
use crate::runtime::Runtime;

/// The three directories every command works against.
#[derive(Debug, Clone)]
pub struct Paths {
    /// State root: receipts and the download cache live here.
    pub root: PathBuf,
    /// Where package manifests (`*.toml`) are read from.
    pub manifest_dir: PathBuf,
    /// Where app bundles are placed.
    pub applications_dir: PathBuf,
}

impl Paths {
    /// Resolve paths from CLI overrides, falling back to defaults under the
    /// user's home directory.
    pub fn resolve<R: Runtime>(
        runtime: &R,
        root: Option<PathBuf>,
        manifest_dir: Option<PathBuf>,
        applications_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let home = || {
            runtime
                .home_dir()
                .ok_or_else(|| anyhow!("Could not determine the home directory"))
        };

        let root = match root {
            Some(root) => root,
            None => home()?.join(".caskit"),
        };
        let manifest_dir = manifest_dir.unwrap_or_else(|| root.join("manifests"));
        let applications_dir = match applications_dir {
            Some(dir) => dir,
            None => home()?.join("Applications"),
        };

        debug!(
            "Paths: root={:?} manifests={:?} applications={:?}",
            root, manifest_dir, applications_dir
        );
        Ok(Self {
            root,
            manifest_dir,
            applications_dir,
        })
    }
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub http: HttpClient,
    pub extractor: ExtractorDispatch,
    pub paths: Paths,
    pub require_checksum: bool,
}

impl<R: Runtime> Config<R> {
    pub fn new(
        runtime: R,
        root: Option<PathBuf>,
        manifest_dir: Option<PathBuf>,
        applications_dir: Option<PathBuf>,
        require_checksum: bool,
    ) -> Result<Self> {
        let paths = Paths::resolve(&runtime, root, manifest_dir, applications_dir)?;

        let client = Client::builder()
            .user_agent("caskit-cli")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            runtime,
            http: HttpClient::new(client),
            extractor: ExtractorDispatch::new(),
            paths,
            require_checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::test_home;

    #[test]
    fn test_paths_default_under_home() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| Some(test_home()));

        let paths = Paths::resolve(&runtime, None, None, None).unwrap();
        assert_eq!(paths.root, test_home().join(".caskit"));
        assert_eq!(paths.manifest_dir, test_home().join(".caskit/manifests"));
        assert_eq!(paths.applications_dir, test_home().join("Applications"));
    }

    #[test]
    fn test_paths_overrides_win() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| Some(test_home()));

        let paths = Paths::resolve(
            &runtime,
            Some(PathBuf::from("/srv/caskit")),
            Some(PathBuf::from("/srv/manifests")),
            Some(PathBuf::from("/Applications")),
        )
        .unwrap();
        assert_eq!(paths.root, PathBuf::from("/srv/caskit"));
        assert_eq!(paths.manifest_dir, PathBuf::from("/srv/manifests"));
        assert_eq!(paths.applications_dir, PathBuf::from("/Applications"));
    }

    #[test]
    fn test_paths_manifest_dir_follows_root_override() {
        let runtime = MockRuntime::new();
        let paths = Paths::resolve(
            &runtime,
            Some(PathBuf::from("/srv/caskit")),
            None,
            Some(PathBuf::from("/Applications")),
        )
        .unwrap();
        assert_eq!(paths.manifest_dir, PathBuf::from("/srv/caskit/manifests"));
    }

    #[test]
    fn test_paths_no_home_fails() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| None);
        assert!(Paths::resolve(&runtime, None, None, None).is_err());
    }
}
