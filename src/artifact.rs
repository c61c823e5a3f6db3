//! File-backed artifact store with atomic publish
//!
//! Every task output is a named JSON blob on disk. The existence of the file
//! at its final path is the sole completeness signal: there is no journal and
//! no metadata sidecar. Writes stage into a sibling temporary path and publish
//! with a single rename, so readers can never observe a partially written
//! artifact. Replacement is wholesale; nothing ever mutates an artifact in
//! place.
//!
//! No cross-process locking is provided. Two writers racing on the same name
//! both produce complete files and the last rename wins — a documented
//! limitation of the single-operator model, not a correctness guarantee.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Logical name of one artifact in the store.
///
/// Names are flat, deterministic, and derived from the producing task
/// (e.g. `"saved_tracks"`, `"saved_album_ids"`). The store maps a name to
/// `<root>/<name>.json`.
pub type ArtifactName = String;

/// Monotonic nonce so concurrent stagings within one process never collide.
static STAGE_NONCE: AtomicU64 = AtomicU64::new(0);

/// File-backed store of named artifacts under a single root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. The directory is created if absent.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The root directory this store publishes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final on-disk path for `name`.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Whether the artifact exists at its final path.
    ///
    /// This is the completeness check the task graph uses for skip-if-exists;
    /// staged temporaries are invisible to it.
    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Write `payload` to the artifact's final path via stage-then-rename.
    ///
    /// The payload lands in a sibling `.tmp` path first and becomes visible
    /// only through the terminal `fs::rename`, which is atomic on the same
    /// filesystem. A crash mid-write leaves a stray temporary but never a
    /// partial artifact at the final name.
    pub fn write_atomically(&self, name: &str, payload: &[u8]) -> Result<()> {
        let final_path = self.path(name);
        if let Some(parent) = final_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let staged = self.stage_path(name);
        std::fs::write(&staged, payload)?;
        std::fs::rename(&staged, &final_path)?;

        tracing::debug!(artifact = name, bytes = payload.len(), "published artifact");
        Ok(())
    }

    /// Read the artifact's raw bytes.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(Error::ArtifactNotFound(name.to_string()));
        }
        Ok(std::fs::read(path)?)
    }

    /// Serialize `value` as JSON and publish it atomically under `name`.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.write_atomically(name, &payload)
    }

    /// Read and deserialize the JSON artifact stored under `name`.
    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let payload = self.read(name)?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// Sibling staging path for `name`, unique within this process.
    fn stage_path(&self, name: &str) -> PathBuf {
        let nonce = STAGE_NONCE.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!("{name}.json.tmp-{}-{nonce}", std::process::id()))
    }
}
