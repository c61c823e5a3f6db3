//! Credential persistence and token lifecycle
//!
//! The OAuth credential state lives in a small JSON file so it outlives any
//! single pipeline run. Consumers never cache the access token in memory: the
//! file is re-read on every use, because a refresh may have happened
//! out-of-band (another run, or a manual re-authorization).
//!
//! A refresh rewrites all fields as one atomic file replacement. There is no
//! cross-process lock; a concurrent reader during the write window can observe
//! a stale value. The pipeline's single-process, single-writer assumption makes
//! this acceptable.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Refresh the access token once it is older than this many seconds.
///
/// 59 minutes: a safety margin under the nominal 60-minute token lifetime, so
/// a token is never presented in its final seconds of validity.
pub const REFRESH_MARGIN_SECS: i64 = 3540;

/// The persisted OAuth credential state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// OAuth client id of the registered application
    pub client_id: String,
    /// OAuth client secret of the registered application
    pub client_secret: String,
    /// Current bearer access token
    pub access_token: String,
    /// Long-lived refresh token used for the refresh exchange
    pub refresh_token: String,
    /// Unix timestamp at which the access token was issued, taken from the
    /// authorization server's own `Date` response header
    pub issued_at: i64,
}

impl Credentials {
    /// Whether the access token is still inside the freshness margin.
    pub fn is_fresh(&self, now: i64) -> bool {
        now - self.issued_at <= REFRESH_MARGIN_SECS
    }
}

/// File-backed store for [`Credentials`].
///
/// Passed by reference into every component that needs tokens; there is no
/// ambient global, which keeps tests deterministic with an injected store.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store backed by the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current credential state from disk.
    pub fn load(&self) -> Result<Credentials> {
        let payload = std::fs::read(&self.path).map_err(|e| Error::Config {
            message: format!("cannot read credentials file {}: {e}", self.path.display()),
            key: Some("credentials_path".to_string()),
        })?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// Persist the credential state, replacing all fields as a unit.
    ///
    /// Stage-then-rename, same discipline as the artifact store, so a crash
    /// mid-save never leaves a torn credentials file.
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let staged = self.path.with_extension("json.tmp");
        std::fs::write(&staged, serde_json::to_vec_pretty(creds)?)?;
        std::fs::rename(&staged, &self.path)?;
        Ok(())
    }
}

/// Body of a successful refresh exchange.
///
/// The server may omit `refresh_token`, in which case the previous one stays
/// valid and is retained.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

/// Keeps the access token valid for use.
///
/// Call [`TokenManager::access_token`] immediately before every outbound API
/// request; never hold the returned token across requests.
#[derive(Debug, Clone)]
pub struct TokenManager {
    store: CredentialStore,
    token_url: String,
    http: reqwest::Client,
}

impl TokenManager {
    /// Create a manager around `store`, refreshing against `token_url`.
    ///
    /// The refresh exchange runs on its own client bounded by
    /// `request_timeout`, so a hung authorization endpoint cannot stall the
    /// pipeline any longer than a data request could.
    pub fn new(
        store: CredentialStore,
        token_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            store,
            token_url: token_url.into(),
            http,
        })
    }

    /// Return an access token that is valid right now.
    ///
    /// Re-reads the credential file on every call. If the token has passed the
    /// freshness margin, a refresh exchange runs synchronously first and the
    /// rotated state is persisted before the token is handed out.
    pub async fn access_token(&self) -> Result<String> {
        let creds = self.store.load()?;
        let now = chrono::Utc::now().timestamp();

        if creds.is_fresh(now) {
            return Ok(creds.access_token);
        }

        tracing::info!(
            age_secs = now - creds.issued_at,
            "access token past freshness margin, refreshing"
        );
        let refreshed = self.refresh(creds).await?;
        Ok(refreshed.access_token)
    }

    /// Perform the refresh exchange and persist the rotated credential state.
    async fn refresh(&self, creds: Credentials) -> Result<Credentials> {
        let form = [
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", creds.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth {
                status: status.as_u16(),
                body,
            });
        }

        // The issuance timestamp comes from the server's own Date header, not
        // the local clock, so clock skew between this host and the
        // authorization server cannot shorten or extend the token's life.
        let issued_at = response
            .headers()
            .get(reqwest::header::DATE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| chrono::DateTime::parse_from_rfc2822(value).ok())
            .map(|date| date.timestamp())
            .unwrap_or_else(|| chrono::Utc::now().timestamp());

        let tokens: TokenResponse = response.json().await?;

        let refreshed = Credentials {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token.unwrap_or(creds.refresh_token),
            issued_at,
            ..creds
        };
        self.store.save(&refreshed)?;
        tracing::info!("token refresh complete, credential state persisted");
        Ok(refreshed)
    }
}
