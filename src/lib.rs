//! # spotify-etl
//!
//! Incremental ETL for a Spotify music library: saved tracks, albums,
//! artists, audio features, and curated playlists, extracted through a
//! paginated OAuth-protected API, normalized into flat rows, and described to
//! a warehouse loader.
//!
//! ## Design Philosophy
//!
//! - **Artifact-backed idempotency** - every task output is a file published
//!   atomically; existence of the file is the only completeness signal, so an
//!   interrupted run resumes for free
//! - **Fail fast, resume cheap** - two attempts per page, no backoff; the
//!   operator diagnoses persistent failures and re-runs, paying only for the
//!   missing artifacts
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//! - **Explicit wiring** - the task graph, the credential store, and the
//!   warehouse are values composed by the caller, not ambient singletons
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use spotify_etl::{
//!     ArtifactStore, Config, CredentialStore, Fetcher, Pipeline, TaskRunner, TokenManager,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!
//!     let credentials = CredentialStore::new(&config.storage.credentials_path);
//!     let tokens = TokenManager::new(
//!         credentials,
//!         config.api.token_url.clone(),
//!         config.api.request_timeout(),
//!     )?;
//!     let fetcher = Arc::new(Fetcher::new(tokens, config.api.request_timeout())?);
//!
//!     let pipeline = Pipeline::new(&config, fetcher);
//!     let runner = TaskRunner::new(ArtifactStore::new(&config.storage.artifact_dir)?);
//!
//!     let summary = runner.run(pipeline.extract_all()).await?;
//!     println!("executed: {:?}, skipped: {:?}", summary.executed, summary.skipped);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// File-backed artifact store with atomic publish
pub mod artifact;
/// Batch chunking for bulk-lookup endpoints
pub mod chunk;
/// Configuration types
pub mod config;
/// Credential persistence and token lifecycle
pub mod credentials;
/// Error types
pub mod error;
/// Resilient paginated fetching
pub mod fetch;
/// Dependency-resolved task execution
pub mod graph;
/// Warehouse loading boundary
pub mod load;
/// Typed records for the upstream API
pub mod model;
/// Bounded-attempt retry helper
pub mod retry;
/// Concrete extraction tasks
pub mod tasks;

// Re-export commonly used types
pub use artifact::{ArtifactName, ArtifactStore};
pub use config::{ApiConfig, Config, PlaylistFilterConfig, StorageConfig};
pub use credentials::{CredentialStore, Credentials, REFRESH_MARGIN_SECS, TokenManager};
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use graph::{RunSummary, Task, TaskRunner};
pub use load::{LoadJob, NoOpWarehouse, Warehouse, load_all, playlist_table_jobs};
pub use tasks::Pipeline;
