//! macOS version handling and the pre-install platform gate.
//!
//! Manifests may constrain the minimum macOS release either numerically
//! (`">= 10.15"`) or by marketing name (`">= catalina"`). The gate compares
//! that constraint against the running system and must be evaluated before
//! any network activity.

use anyhow::{Result, anyhow};
use std::fmt;
use std::str::FromStr;

use crate::runtime::Runtime;

/// A macOS product version such as `10.15.7` or `14.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MacosVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl MacosVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Resolve a macOS marketing name to its version number.
    /// Accepts underscores or hyphens as separators (`high_sierra`, `high-sierra`).
    pub fn from_release_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        let version = match normalized.as_str() {
            "sierra" => Self::new(10, 12, 0),
            "high_sierra" => Self::new(10, 13, 0),
            "mojave" => Self::new(10, 14, 0),
            "catalina" => Self::new(10, 15, 0),
            "big_sur" => Self::new(11, 0, 0),
            "monterey" => Self::new(12, 0, 0),
            "ventura" => Self::new(13, 0, 0),
            "sonoma" => Self::new(14, 0, 0),
            "sequoia" => Self::new(15, 0, 0),
            _ => return None,
        };
        Some(version)
    }
}

impl FromStr for MacosVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty macOS version string"));
        }
        if let Some(named) = Self::from_release_name(s) {
            return Ok(named);
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 3 {
            return Err(anyhow!("Too many components in macOS version '{}'", s));
        }
        let component = |idx: usize| -> Result<u32> {
            match parts.get(idx) {
                None => Ok(0),
                Some(raw) => raw.parse::<u32>().map_err(|_| {
                    anyhow!("Invalid component '{}' in macOS version '{}'", raw, s)
                }),
            }
        };

        Ok(Self::new(component(0)?, component(1)?, component(2)?))
    }
}

impl fmt::Display for MacosVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

/// Minimum-version constraint from a manifest's `macos` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRequirement {
    pub minimum: MacosVersion,
}

impl PlatformRequirement {
    pub fn satisfied_by(&self, current: MacosVersion) -> bool {
        current >= self.minimum
    }
}

impl FromStr for PlatformRequirement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let rest = trimmed
            .strip_prefix(">=")
            .ok_or_else(|| anyhow!("Platform requirement '{}' must start with '>='", trimmed))?;
        let minimum = rest.trim().parse::<MacosVersion>()?;
        Ok(Self { minimum })
    }
}

impl fmt::Display for PlatformRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">= {}", self.minimum)
    }
}

/// Detect the macOS version of the running system.
#[tracing::instrument(skip(runtime))]
pub fn current_version<R: Runtime>(runtime: &R) -> Result<MacosVersion> {
    let raw = runtime.os_version()?;
    raw.parse::<MacosVersion>()
        .map_err(|e| anyhow!("Could not parse reported macOS version '{}': {}", raw, e))
}
