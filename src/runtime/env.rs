//! Environment and system information operations.

use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::PathBuf;
use std::process::Command;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn os_version_impl(&self) -> Result<String> {
        // The override exists so the platform gate stays testable on any host.
        if let Ok(version) = env::var("CASKIT_MACOS_VERSION") {
            return Ok(version.trim().to_string());
        }

        let output = Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .context("Failed to run sw_vers to detect the macOS version")?;
        if !output.status.success() {
            return Err(anyhow!(
                "sw_vers exited with status {}",
                output.status
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_privileged_impl(&self) -> bool {
        #[cfg(unix)]
        return nix::unistd::geteuid().as_raw() == 0;

        #[cfg(not(unix))]
        return false;
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_real_runtime_env_and_dirs() {
        let runtime = RealRuntime;

        // PATH should exist on all systems
        assert!(runtime.env_var("PATH").is_ok());
        assert!(runtime.env_var("CASKIT_DOES_NOT_EXIST").is_err());

        // home_dir should exist for most systems
        assert!(runtime.home_dir().is_some());
    }

    #[test]
    fn test_os_version_env_override() {
        let runtime = RealRuntime;
        // No other unit test reads this variable.
        unsafe { std::env::set_var("CASKIT_MACOS_VERSION", "13.4 ") };
        let version = runtime.os_version().unwrap();
        unsafe { std::env::remove_var("CASKIT_MACOS_VERSION") };
        assert_eq!(version, "13.4");
    }
}
