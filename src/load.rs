//! Warehouse loading boundary
//!
//! The actual upsert mechanics belong to an external collaborator; this
//! module only fixes the interface: a [`LoadJob`] names the target table, its
//! column order, the uniqueness key, and the artifact holding the rows, and a
//! [`Warehouse`] implementation consumes them. The crate ships the job list
//! for the playlist tables as the pipeline's downstream contract.

use crate::artifact::{ArtifactName, ArtifactStore};
use crate::error::Result;
use crate::tasks::artifacts;

/// Description of one table load handed to the warehouse collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadJob {
    /// Target table name
    pub table: String,
    /// Ordered column list of the table
    pub columns: Vec<String>,
    /// Subset of `columns` forming the uniqueness key for upserts
    pub key_columns: Vec<String>,
    /// Artifact whose rows feed the table
    pub artifact: ArtifactName,
}

impl LoadJob {
    /// Convenience constructor from string slices.
    pub fn new(table: &str, columns: &[&str], key_columns: &[&str], artifact: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            artifact: artifact.to_string(),
        }
    }
}

/// Destination of the normalized tables.
///
/// Implementations read rows out of the named artifact and perform the
/// warehouse write; how they upsert is their concern.
#[async_trait::async_trait]
pub trait Warehouse: Send + Sync {
    /// Load one table from its artifact.
    async fn copy(&self, job: &LoadJob, store: &ArtifactStore) -> Result<()>;
}

/// Warehouse that accepts every job and writes nothing. Used in tests and
/// dry runs.
#[derive(Debug, Default)]
pub struct NoOpWarehouse;

#[async_trait::async_trait]
impl Warehouse for NoOpWarehouse {
    async fn copy(&self, job: &LoadJob, _store: &ArtifactStore) -> Result<()> {
        tracing::debug!(table = %job.table, artifact = %job.artifact, "no-op warehouse copy");
        Ok(())
    }
}

/// Run the given jobs sequentially against `warehouse`.
///
/// Stops at the first failure; the artifacts feeding later jobs remain on
/// disk and the batch can be re-issued after the cause is fixed.
pub async fn load_all(
    warehouse: &dyn Warehouse,
    jobs: &[LoadJob],
    store: &ArtifactStore,
) -> Result<()> {
    for job in jobs {
        tracing::info!(table = %job.table, artifact = %job.artifact, "loading table");
        warehouse.copy(job, store).await?;
    }
    Ok(())
}

/// The load jobs for the playlist tables, as the warehouse expects them.
///
/// Both tables call the playlist-name column `genre_name`: curated playlists
/// are genre playlists, and the name is the genre label downstream.
pub fn playlist_table_jobs() -> Vec<LoadJob> {
    vec![
        LoadJob::new(
            "playlist_x_tracks",
            &["track_id", "genre_name"],
            &["track_id", "genre_name"],
            artifacts::PLAYLIST_TRACKS,
        ),
        LoadJob::new(
            "playlists",
            &["playlist_id", "genre_name"],
            &["playlist_id", "genre_name"],
            artifacts::FILTERED_PLAYLISTS,
        ),
    ]
}
