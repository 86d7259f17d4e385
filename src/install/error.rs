//! Install-time error taxonomy.

/// Errors with a definite, user-facing cause. Network failures stay as
/// contextual `anyhow` errors from the HTTP layer.
#[derive(Debug)]
pub enum InstallError {
    /// A declared dependency is not installed.
    UnresolvedDependency(String),
    /// The running macOS is older than the manifest requires.
    PlatformUnsupported { required: String, current: String },
    /// The downloaded archive does not match the declared digest.
    ChecksumMismatch { expected: String, actual: String },
    /// The manifest opts out of verification but --require-checksum is set.
    ChecksumRequired(String),
    /// The extracted archive does not contain the declared app bundle.
    AppBundleMissing(String),
    /// The package has no install receipt.
    NotInstalled(String),
}

impl std::fmt::Display for InstallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallError::UnresolvedDependency(name) => {
                write!(
                    f,
                    "Dependency '{}' is not installed. Install it first.",
                    name
                )
            }
            InstallError::PlatformUnsupported { required, current } => {
                write!(
                    f,
                    "This package requires macOS {} but this system reports {}.",
                    required, current
                )
            }
            InstallError::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "Checksum mismatch: expected sha256 {} but the download hashed to {}. Refusing to install.",
                    expected, actual
                )
            }
            InstallError::ChecksumRequired(identifier) => {
                write!(
                    f,
                    "Manifest '{}' declares sha256 = \"no-check\" and --require-checksum is set.",
                    identifier
                )
            }
            InstallError::AppBundleMissing(path) => {
                write!(
                    f,
                    "The archive does not contain the declared app bundle '{}'.",
                    path
                )
            }
            InstallError::NotInstalled(identifier) => {
                write!(f, "Package '{}' is not installed.", identifier)
            }
        }
    }
}

impl std::error::Error for InstallError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = InstallError::UnresolvedDependency("python-runtime".to_string());
        assert!(err.to_string().contains("python-runtime"));
        assert!(err.to_string().contains("not installed"));

        let err = InstallError::PlatformUnsupported {
            required: ">= 10.15".to_string(),
            current: "10.13".to_string(),
        };
        assert!(err.to_string().contains(">= 10.15"));
        assert!(err.to_string().contains("10.13"));

        let err = InstallError::ChecksumMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert!(err.to_string().contains("Refusing to install"));

        let err = InstallError::ChecksumRequired("pkg".to_string());
        assert!(err.to_string().contains("--require-checksum"));

        let err = InstallError::AppBundleMissing("App.app".to_string());
        assert!(err.to_string().contains("App.app"));

        let err = InstallError::NotInstalled("pkg".to_string());
        assert!(err.to_string().contains("not installed"));
    }
}
