//! Shared helpers for integration tests: a fake API covering every endpoint
//! the pipeline touches, plus credential fixtures.

#![allow(dead_code)]

use spotify_etl::{Config, CredentialStore, Credentials};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Write a fresh credentials file (token well inside the freshness margin).
pub fn write_fresh_credentials(dir: &Path) -> CredentialStore {
    write_credentials_with_age(dir, 0)
}

/// Write a credentials file whose access token is `age_secs` old.
pub fn write_credentials_with_age(dir: &Path, age_secs: i64) -> CredentialStore {
    let store = CredentialStore::new(dir.join("secrets.json"));
    store
        .save(&Credentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
            access_token: "test-token".into(),
            refresh_token: "refresh".into(),
            issued_at: chrono::Utc::now().timestamp() - age_secs,
        })
        .expect("write credentials fixture");
    store
}

/// Config pointed at the mock server with artifacts under `dir`.
pub fn test_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.api_base = server.uri();
    config.api.token_url = format!("{}/api/token", server.uri());
    config.storage.artifact_dir = dir.join("artifacts");
    config.storage.credentials_path = dir.join("secrets.json");
    config
}

/// Mount a fake library API: two pages of saved tracks, bulk album / artist /
/// audio-feature lookups, the user profile, one playlist page, and that
/// playlist's tracks.
pub async fn mount_library_api(server: &MockServer) {
    let base = server.uri();

    // Saved tracks: page 1 -> page 2 -> end
    Mock::given(method("GET"))
        .and(path("/v1/me/tracks"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                saved_track("t1", "Song One", "al1", "ar1"),
                saved_track("t2", "Song Two", "al1", "ar2"),
            ],
            "next": format!("{base}/v1/me/tracks?offset=2"),
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/tracks"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [saved_track("t3", "Song Three", "al2", "ar1")],
            "next": null,
        })))
        .mount(server)
        .await;

    // Bulk lookups
    Mock::given(method("GET"))
        .and(path("/v1/albums"))
        .and(query_param("ids", "al1,al2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "albums": [
                {"id": "al1", "name": "Album One", "release_date": "2020-01-01", "label": "Label", "popularity": 50},
                {"id": "al2", "name": "Album Two", "release_date": "2021", "label": "Label", "popularity": 40},
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/artists"))
        .and(query_param("ids", "ar1,ar2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "artists": [
                {"id": "ar1", "name": "Artist One", "genres": ["ambient"], "popularity": 61},
                {"id": "ar2", "name": "Artist Two", "genres": [], "popularity": 30},
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/audio-features"))
        .and(query_param("ids", "t1,t2,t3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "audio_features": [
                {"id": "t1", "danceability": 0.8, "energy": 0.6, "tempo": 121.0},
                null,
                {"id": "t3", "danceability": 0.3, "energy": 0.2, "tempo": 80.0},
            ]
        })))
        .mount(server)
        .await;

    // Profile and playlists
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "user1"})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/users/user1/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "pl1",
                    "name": "Ambient",
                    "tracks": {"href": format!("{base}/v1/playlists/pl1/tracks")},
                },
            ],
            "next": null,
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"track": {"id": "t1"}},
                {"track": {"id": null}},
                {"track": {"id": "t3"}},
            ],
            "next": null,
        })))
        .mount(server)
        .await;
}

fn saved_track(id: &str, name: &str, album: &str, artist: &str) -> serde_json::Value {
    serde_json::json!({
        "added_at": "2024-03-01T10:00:00Z",
        "track": {
            "id": id,
            "name": name,
            "album": {"id": album, "name": format!("Album {album}")},
            "artists": [{"id": artist, "name": format!("Artist {artist}")}],
            "duration_ms": 200_000,
            "popularity": 55,
        }
    })
}
