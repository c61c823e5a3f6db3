//! Resilient paginated fetching
//!
//! All extraction traffic goes through [`Fetcher`]: cursor-following listing
//! endpoints, single-shot lookups, and bulk id lookups. Every request carries
//! a bearer token obtained from the [`TokenManager`] immediately beforehand,
//! so a token that expires mid-run is refreshed transparently between pages.
//!
//! Each page fetch is allowed [`DEFAULT_MAX_ATTEMPTS`](crate::retry::DEFAULT_MAX_ATTEMPTS)
//! attempts and no backoff; persistent failure surfaces to the task graph as a
//! task failure. A sequence is not restartable mid-way — a fresh `fetch_all`
//! starts again from page one, and idempotency lives at the artifact level
//! instead.

use crate::credentials::TokenManager;
use crate::error::{Error, Result};
use crate::model::Page;
use crate::retry::{DEFAULT_MAX_ATTEMPTS, attempt};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP access to the upstream API with token-per-request and bounded retry.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
    tokens: TokenManager,
}

impl Fetcher {
    /// Create a fetcher with the given per-request timeout.
    ///
    /// The timeout is the pipeline's only cancellation primitive; without it a
    /// hung socket would stall the whole run.
    pub fn new(tokens: TokenManager, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, tokens })
    }

    /// Fetch every page of a cursor-paginated listing, in order.
    ///
    /// `params` are sent with the start URL only; each `next` cursor returned
    /// by the server is a fully-qualified URL that already absorbs them. The
    /// loop ends when `next` is null. A page with an empty item list but a
    /// non-null cursor continues the loop.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        start_url: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor = Some(start_url.to_string());
        let mut first_page = true;

        while let Some(url) = cursor {
            let page: Page<T> = if first_page {
                self.get_with_retry(&url, params).await?
            } else {
                self.get_with_retry(&url, &[]).await?
            };
            first_page = false;

            tracing::debug!(%url, page_items = page.items.len(), has_next = page.next.is_some());
            items.extend(page.items);
            cursor = page.next;
        }

        tracing::info!(%start_url, total_items = items.len(), "pagination complete");
        Ok(items)
    }

    /// Fetch a single endpoint with the same token-and-retry discipline as a
    /// page fetch. Used for profile lookups and bulk id lookups.
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        self.get_with_retry(url, params).await
    }

    /// One GET with a freshly obtained token per attempt.
    ///
    /// The URL is validated up front; a malformed endpoint or cursor fails
    /// before any token or network traffic.
    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let target = url::Url::parse(url)?;

        attempt(DEFAULT_MAX_ATTEMPTS, || async {
            // Re-acquire on every attempt: the token may have expired between
            // pages of a long extraction.
            let token = self.tokens.access_token().await?;

            let mut request = self.http.get(target.clone()).bearer_auth(token);
            if !params.is_empty() {
                request = request.query(params);
            }
            let response = request.send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(Error::Transient {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.json::<T>().await?)
        })
        .await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialStore, Credentials};
    use serde::Deserialize;
    use tempfile::TempDir;
    use wiremock::matchers::{bearer_token, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    fn fresh_credentials(temp: &TempDir) -> CredentialStore {
        let store = CredentialStore::new(temp.path().join("secrets.json"));
        store
            .save(&Credentials {
                client_id: "client".into(),
                client_secret: "secret".into(),
                access_token: "test-token".into(),
                refresh_token: "refresh".into(),
                issued_at: chrono::Utc::now().timestamp(),
            })
            .unwrap();
        store
    }

    fn fetcher(temp: &TempDir, token_url: String) -> Fetcher {
        let tokens =
            TokenManager::new(fresh_credentials(temp), token_url, Duration::from_secs(5)).unwrap();
        Fetcher::new(tokens, Duration::from_secs(5)).unwrap()
    }

    fn page_json(ids: &[&str], next: Option<String>) -> serde_json::Value {
        serde_json::json!({
            "items": ids.iter().map(|id| serde_json::json!({"id": id})).collect::<Vec<_>>(),
            "next": next,
        })
    }

    #[tokio::test]
    async fn three_pages_of_two_items_yield_six_in_order() {
        let temp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        let base = format!("{}/v1/me/tracks", server.uri());

        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
                &["a", "b"],
                Some(format!("{base}?offset=2")),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
                &["c", "d"],
                Some(format!("{base}?offset=4")),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .and(query_param("offset", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["e", "f"], None)))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&temp, format!("{}/api/token", server.uri()));
        let items: Vec<Item> = fetcher
            .fetch_all(&base, &[("limit", "50".to_string())])
            .await
            .unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[tokio::test]
    async fn empty_page_with_cursor_does_not_end_the_loop() {
        let temp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        let base = format!("{}/v1/me/tracks", server.uri());

        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
                &[],
                Some(format!("{base}?offset=50")),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .and(query_param("offset", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["z"], None)))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&temp, format!("{}/api/token", server.uri()));
        let items: Vec<Item> = fetcher
            .fetch_all(&base, &[("limit", "50".to_string())])
            .await
            .unwrap();
        assert_eq!(items, vec![Item { id: "z".into() }]);
    }

    #[tokio::test]
    async fn always_500_makes_exactly_two_attempts_then_fails() {
        let temp = TempDir::new().unwrap();
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = fetcher(&temp, format!("{}/api/token", server.uri()));
        let url = format!("{}/v1/me/tracks", server.uri());
        let result: Result<Vec<Item>> = fetcher.fetch_all(&url, &[]).await;

        match result {
            Err(Error::RetryExhausted {
                url: failed,
                status,
                attempts,
            }) => {
                assert_eq!(failed, url);
                assert_eq!(status, 500);
                assert_eq!(attempts, 2);
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_transient_failure_recovers_on_the_second_attempt() {
        let temp = TempDir::new().unwrap();
        let server = MockServer::start().await;

        // First attempt fails; the mounted 200 mock answers the retry.
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "user1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&temp, format!("{}/api/token", server.uri()));
        let profile: crate::model::UserProfile = fetcher
            .get(&format!("{}/v1/me", server.uri()), &[])
            .await
            .unwrap();
        assert_eq!(profile.id, "user1");
    }

    #[tokio::test]
    async fn malformed_url_fails_before_any_request() {
        let temp = TempDir::new().unwrap();
        // No server: a relative or garbage URL must be rejected up front.
        let fetcher = fetcher(&temp, "http://127.0.0.1:1/api/token".to_string());

        let result: Result<Vec<Item>> = fetcher.fetch_all("v1/me/tracks", &[]).await;
        assert!(matches!(result, Err(Error::Url(_))));
    }

    #[tokio::test]
    async fn requests_carry_the_current_bearer_token() {
        let temp = TempDir::new().unwrap();
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(bearer_token("test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "user1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&temp, format!("{}/api/token", server.uri()));
        let profile: crate::model::UserProfile = fetcher
            .get(&format!("{}/v1/me", server.uri()), &[])
            .await
            .unwrap();
        assert_eq!(profile.id, "user1");
    }

    #[tokio::test]
    async fn stale_token_refreshes_once_before_the_data_request() {
        let temp = TempDir::new().unwrap();
        let server = MockServer::start().await;

        let store = CredentialStore::new(temp.path().join("secrets.json"));
        store
            .save(&Credentials {
                client_id: "client".into(),
                client_secret: "secret".into(),
                access_token: "expired-token".into(),
                refresh_token: "refresh".into(),
                issued_at: chrono::Utc::now().timestamp() - 3541,
            })
            .unwrap();

        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "renewed-token"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(bearer_token("renewed-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "user1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = TokenManager::new(
            store,
            format!("{}/api/token", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let fetcher = Fetcher::new(tokens, Duration::from_secs(5)).unwrap();
        let profile: crate::model::UserProfile = fetcher
            .get(&format!("{}/v1/me", server.uri()), &[])
            .await
            .unwrap();
        assert_eq!(profile.id, "user1");
    }
}
