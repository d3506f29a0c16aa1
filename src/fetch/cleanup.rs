//! Interrupt-safe temp-directory tracking.
//!
//! Every in-flight temporary clone is registered here. Normal and error
//! paths remove it through [`TempDirGuard`]; on an external interrupt
//! the signal listener in `main` drains the registry before the process
//! exits.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

static PENDING: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

fn register(path: &Path) {
    PENDING.lock().push(path.to_path_buf());
}

fn unregister(path: &Path) {
    PENDING.lock().retain(|p| p != path);
}

/// Remove every registered temp directory. Best effort; failures are
/// logged and do not stop the drain.
pub fn remove_all() {
    let pending: Vec<PathBuf> = std::mem::take(&mut *PENDING.lock());
    for path in pending {
        if path.exists() {
            if let Err(err) = std::fs::remove_dir_all(&path) {
                warn!(path = %path.display(), %err, "failed to remove temp clone");
            }
        }
    }
}

/// Scoped ownership of a temporary clone directory: registered on
/// creation, removed and deregistered on drop, whichever way the
/// enclosing fetch exits.
pub struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    pub fn new(path: PathBuf) -> Self {
        register(&path);
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(err) = std::fs::remove_dir_all(&self.path) {
                warn!(path = %self.path.display(), %err, "failed to remove temp clone");
            }
        }
        unregister(&self.path);
    }
}
