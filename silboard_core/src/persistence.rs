// silboard_core/src/persistence.rs

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::BoardError;

/// Directory, under the store root, that holds one subdirectory per namespace.
pub const MEMORY_DIR: &str = "silboard_memory";
/// The single blob file inside a namespace directory.
pub const MEMORY_FILE: &str = "mem.bin";

/// Emulated non-volatile memory: one opaque blob per instance namespace.
///
/// The content is never interpreted here. There is no versioning and no checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentStore {
    root: PathBuf,
    namespace: String,
}

impl PersistentStore {
    /// A store rooted at `root`. `namespace` may carry leading or trailing slashes
    /// (e.g. `/uav1/`); they are stripped.
    pub fn new(root: impl Into<PathBuf>, namespace: &str) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.trim_matches('/').to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The namespace-scoped directory holding the blob.
    pub fn directory(&self) -> PathBuf {
        let base = self.root.join(MEMORY_DIR);
        if self.namespace.is_empty() {
            base
        } else {
            base.join(&self.namespace)
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory().join(MEMORY_FILE)
    }

    /// Replaces the stored blob with `bytes`, creating the directory first.
    pub fn write(&self, bytes: &[u8]) -> Result<(), BoardError> {
        let dir = self.directory();
        fs::create_dir_all(&dir).map_err(|source| BoardError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(MEMORY_FILE);
        fs::write(&path, bytes).map_err(|source| BoardError::WriteMemory {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Copies the stored blob into `dest` and returns the number of bytes copied,
    /// `min(dest.len(), blob length)`. Bytes past that count are left untouched,
    /// as is all of `dest` on error.
    pub fn read(&self, dest: &mut [u8]) -> Result<usize, BoardError> {
        let path = self.path();
        let contents = fs::read(&path).map_err(|source| BoardError::ReadMemory {
            path: path.clone(),
            source,
        })?;

        let len = dest.len().min(contents.len());
        dest[..len].copy_from_slice(&contents[..len]);
        debug!("Read {} bytes from {}", len, path.display());
        Ok(len)
    }
}
