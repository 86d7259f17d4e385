//! Archive integrity verification.
//!
//! A manifest either carries a SHA-256 digest or explicitly opts out with
//! `"no-check"`. Opting out leaves the download trusted by origin only, so
//! that path always logs a warning; `--require-checksum` turns it into a
//! hard error at the install layer.

use anyhow::{Context, Result};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::install::InstallError;
use crate::manifest::ChecksumPolicy;
use crate::runtime::Runtime;

/// Compute the SHA-256 digest of a file, streaming through the runtime.
#[tracing::instrument(skip(runtime))]
pub fn sha256_file<R: Runtime>(runtime: &R, path: &Path) -> Result<String> {
    let mut reader = runtime
        .open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {} while hashing", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify a downloaded archive against the manifest's checksum policy.
#[tracing::instrument(skip(runtime, path))]
pub fn verify<R: Runtime>(runtime: &R, path: &Path, policy: &ChecksumPolicy) -> Result<()> {
    match policy {
        ChecksumPolicy::NoCheck => {
            warn!(
                "Integrity NOT verified for {}: the manifest declares sha256 = \"no-check\"",
                path.display()
            );
            Ok(())
        }
        ChecksumPolicy::Sha256(expected) => {
            let actual = sha256_file(runtime, path)?;
            if &actual != expected {
                return Err(InstallError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                }
                .into());
            }
            debug!("Checksum verified for {}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    // SHA-256 of the ASCII string "hello"
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn runtime_with_file(content: &'static [u8]) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_open()
            .returning(move |_| Ok(Box::new(std::io::Cursor::new(content))));
        runtime
    }

    #[test]
    fn test_sha256_file() {
        let runtime = runtime_with_file(b"hello");
        let digest = sha256_file(&runtime, Path::new("/tmp/archive.zip")).unwrap();
        assert_eq!(digest, HELLO_SHA256);
    }

    #[test]
    fn test_verify_matching_digest() {
        let runtime = runtime_with_file(b"hello");
        let policy = ChecksumPolicy::Sha256(HELLO_SHA256.to_string());
        assert!(verify(&runtime, Path::new("/tmp/a.zip"), &policy).is_ok());
    }

    #[test]
    fn test_verify_mismatch() {
        let runtime = runtime_with_file(b"tampered");
        let policy = ChecksumPolicy::Sha256(HELLO_SHA256.to_string());
        let err = verify(&runtime, Path::new("/tmp/a.zip"), &policy).unwrap_err();
        let install_err = err.downcast_ref::<InstallError>().unwrap();
        assert!(matches!(
            install_err,
            InstallError::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn test_verify_no_check_succeeds_without_reading() {
        // Strict mock: verify must not even open the file when skipping.
        let runtime = MockRuntime::new();
        assert!(verify(&runtime, Path::new("/tmp/a.zip"), &ChecksumPolicy::NoCheck).is_ok());
    }
}
