//! Tracks temporary paths (downloads, extraction staging) that should be
//! removed if an operation is interrupted partway.

use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Tracks paths that need cleanup on interruption.
#[derive(Default)]
pub struct CleanupContext {
    #[cfg(test)]
    pub paths: Vec<PathBuf>,
    #[cfg(not(test))]
    paths: Vec<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path to be cleaned up on interruption.
    pub fn add(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    /// Remove a path from the cleanup list (e.g., when the operation succeeds).
    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    /// Clean up all registered paths.
    pub fn cleanup(&self) {
        for path in &self.paths {
            debug!("Cleaning up: {:?}", path);
            if path.is_dir() {
                let _ = std::fs::remove_dir_all(path);
            } else {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

/// Type alias for shared cleanup context.
pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

/// Create a new shared cleanup context.
pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

/// RAII guard that removes a path from the cleanup context when the
/// operation it belongs to completes successfully.
pub struct CleanupGuard {
    ctx: SharedCleanupContext,
    path: PathBuf,
}

impl CleanupGuard {
    /// Create a new cleanup guard and register the path.
    pub fn new(ctx: SharedCleanupContext, path: PathBuf) -> Self {
        {
            let mut guard = ctx.lock().unwrap();
            guard.add(path.clone());
        }
        Self { ctx, path }
    }

    /// Mark the operation as successful, removing the path from cleanup.
    pub fn success(self) {
        let mut guard = self.ctx.lock().unwrap();
        guard.remove(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_context_add_remove() {
        let mut ctx = CleanupContext::new();
        ctx.add(PathBuf::from("/tmp/a"));
        ctx.add(PathBuf::from("/tmp/b"));
        assert_eq!(ctx.paths.len(), 2);

        ctx.remove(Path::new("/tmp/a"));
        assert_eq!(ctx.paths, vec![PathBuf::from("/tmp/b")]);
    }

    #[test]
    fn test_cleanup_removes_registered_files_and_dirs() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("partial.zip");
        let staging = dir.path().join("staging");
        std::fs::write(&file, b"x").unwrap();
        std::fs::create_dir(&staging).unwrap();
        std::fs::write(staging.join("inner"), b"y").unwrap();

        let mut ctx = CleanupContext::new();
        ctx.add(file.clone());
        ctx.add(staging.clone());
        ctx.cleanup();

        assert!(!file.exists());
        assert!(!staging.exists());
    }

    #[test]
    fn test_guard_success_deregisters() {
        let ctx = new_shared();
        let guard = CleanupGuard::new(ctx.clone(), PathBuf::from("/tmp/x"));
        assert_eq!(ctx.lock().unwrap().paths.len(), 1);

        guard.success();
        assert!(ctx.lock().unwrap().paths.is_empty());
    }
}
