//! Configuration types for spotify-etl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Upstream API endpoints and HTTP behavior
///
/// Groups settings for the data API and the authorization endpoint.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the data API (default: "https://api.spotify.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Token refresh endpoint (default: "https://accounts.spotify.com/api/token")
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Page size requested from paginated endpoints (default: 50)
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Per-request timeout in seconds (default: 30)
    ///
    /// The bound here is the pipeline's only cancellation primitive; without
    /// it a hung socket stalls the whole run.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_url: default_token_url(),
            page_limit: default_page_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// On-disk locations for artifacts and credentials
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory the artifact store publishes into (default: "./artifacts")
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Path of the JSON credentials file (default: "./secrets.json")
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            credentials_path: default_credentials_path(),
        }
    }
}

/// Which playlists count as curated genre playlists
///
/// The operator keeps genre playlists in a contiguous run of the playlist
/// list, bracketed by two marker playlists. Both markers are exclusive. With
/// no markers configured, every playlist passes the filter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlaylistFilterConfig {
    /// Playlist name immediately before the curated run (exclusive)
    #[serde(default)]
    pub start_marker: Option<String>,

    /// Playlist name immediately after the curated run (exclusive)
    #[serde(default)]
    pub end_marker: Option<String>,
}

/// Main configuration for the ETL pipeline
///
/// Fields are organized into logical sub-configs:
/// - [`api`](ApiConfig) — endpoints, page size, request timeout
/// - [`storage`](StorageConfig) — artifact directory, credentials file
/// - [`playlists`](PlaylistFilterConfig) — curated-playlist markers
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// On-disk storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Curated-playlist filter markers
    #[serde(default)]
    pub playlists: PlaylistFilterConfig,
}

fn default_api_base() -> String {
    "https://api.spotify.com".to_string()
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_page_limit() -> u32 {
    50
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("./secrets.json")
}
