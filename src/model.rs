//! Typed records for the upstream API
//!
//! The API returns deeply nested JSON. Payloads are converted into these
//! explicit shapes at the boundary instead of threading dynamic maps through
//! the pipeline. Only the fields the tables need are kept; unknown fields are
//! ignored by serde.

use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
///
/// `next` is the opaque cursor to the following page; `None` signals the end
/// of the sequence. A page may carry an empty `items` list while `next` is
/// still populated — a server pagination artifact, not the end.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Fully-qualified URL of the next page, absent on the last page
    #[serde(default)]
    pub next: Option<String>,
}

/// A track the user saved to their library, with the save timestamp.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedTrack {
    /// When the user saved the track (RFC 3339)
    pub added_at: String,
    /// The track itself
    pub track: Track,
}

/// A track as embedded in library and playlist listings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Track {
    /// Track id; null for local files, which the pipeline drops
    pub id: Option<String>,
    /// Track title
    #[serde(default)]
    pub name: String,
    /// The album the track appears on
    pub album: AlbumRef,
    /// Credited artists, in listing order
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    /// Track length in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
    /// Popularity score 0-100
    #[serde(default)]
    pub popularity: u32,
}

/// Minimal album reference embedded in a track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlbumRef {
    /// Album id
    pub id: Option<String>,
    /// Album title
    #[serde(default)]
    pub name: String,
}

/// Minimal artist reference embedded in a track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtistRef {
    /// Artist id
    pub id: Option<String>,
    /// Artist name
    #[serde(default)]
    pub name: String,
}

/// Full album record from the bulk albums endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Album {
    /// Album id
    pub id: String,
    /// Album title
    #[serde(default)]
    pub name: String,
    /// Release date, precision varies (year, month, or day)
    #[serde(default)]
    pub release_date: String,
    /// Label that released the album
    #[serde(default)]
    pub label: String,
    /// Popularity score 0-100
    #[serde(default)]
    pub popularity: u32,
}

/// Full artist record from the bulk artists endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artist {
    /// Artist id
    pub id: String,
    /// Artist name
    #[serde(default)]
    pub name: String,
    /// Genre labels assigned to the artist
    #[serde(default)]
    pub genres: Vec<String>,
    /// Popularity score 0-100
    #[serde(default)]
    pub popularity: u32,
}

/// Audio analysis features for one track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Track id the features belong to
    pub id: String,
    /// Danceability 0.0-1.0
    #[serde(default)]
    pub danceability: f64,
    /// Energy 0.0-1.0
    #[serde(default)]
    pub energy: f64,
    /// Estimated key as pitch-class notation, -1 when undetected
    #[serde(default)]
    pub key: i32,
    /// Overall loudness in dB
    #[serde(default)]
    pub loudness: f64,
    /// Modality: 1 major, 0 minor
    #[serde(default)]
    pub mode: i32,
    /// Speechiness 0.0-1.0
    #[serde(default)]
    pub speechiness: f64,
    /// Acousticness 0.0-1.0
    #[serde(default)]
    pub acousticness: f64,
    /// Instrumentalness 0.0-1.0
    #[serde(default)]
    pub instrumentalness: f64,
    /// Liveness 0.0-1.0
    #[serde(default)]
    pub liveness: f64,
    /// Valence (musical positiveness) 0.0-1.0
    #[serde(default)]
    pub valence: f64,
    /// Tempo in BPM
    #[serde(default)]
    pub tempo: f64,
    /// Estimated time signature, 3 to 7
    #[serde(default)]
    pub time_signature: i32,
}

/// A playlist owned or followed by the user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Playlist {
    /// Playlist id
    pub id: String,
    /// Playlist name
    #[serde(default)]
    pub name: String,
    /// Link to the playlist's tracks sub-resource
    pub tracks: TracksLink,
}

/// Pagination entry point for a playlist's tracks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TracksLink {
    /// Fully-qualified URL of the first tracks page
    pub href: String,
}

/// The authenticated user's profile; only the id is needed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id, used to build the playlists URL
    pub id: String,
}

/// Envelope of the bulk albums endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlbumsEnvelope {
    /// Requested albums, in request order
    #[serde(default)]
    pub albums: Vec<Option<Album>>,
}

/// Envelope of the bulk artists endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtistsEnvelope {
    /// Requested artists, in request order
    #[serde(default)]
    pub artists: Vec<Option<Artist>>,
}

/// Envelope of the bulk audio-features endpoint.
///
/// Entries are null for ids the analysis service does not know; those are
/// dropped during extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioFeaturesEnvelope {
    /// Requested feature records, in request order
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeatures>>,
}

/// A track entry inside a playlist-tracks page, projected via the `fields`
/// filter down to the id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaylistTrackEntry {
    /// The embedded track; null for entries the server can no longer resolve
    pub track: Option<PlaylistTrackRef>,
}

/// The id-only track projection inside a playlist-tracks page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaylistTrackRef {
    /// Track id; null for local files
    pub id: Option<String>,
}

/// One row of the playlist-to-track mapping artifact.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistTrackRow {
    /// Playlist id
    pub playlist_id: String,
    /// Playlist name, doubling as the genre label
    pub playlist_name: String,
    /// Track id
    pub track_id: String,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_tolerates_missing_items_and_next() {
        let page: Page<SavedTrack> = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn saved_track_parses_nested_payload_and_ignores_extras() {
        let raw = serde_json::json!({
            "added_at": "2024-03-01T10:00:00Z",
            "track": {
                "id": "t1",
                "name": "Song",
                "href": "https://api.example.com/v1/tracks/t1",
                "album": {"id": "al1", "name": "Record", "album_type": "album"},
                "artists": [{"id": "ar1", "name": "Band", "uri": "spotify:artist:ar1"}],
                "duration_ms": 215000,
                "popularity": 61,
                "explicit": false
            }
        });
        let saved: SavedTrack = serde_json::from_value(raw).unwrap();
        assert_eq!(saved.track.id.as_deref(), Some("t1"));
        assert_eq!(saved.track.album.id.as_deref(), Some("al1"));
        assert_eq!(saved.track.artists[0].name, "Band");
        assert_eq!(saved.track.duration_ms, 215000);
    }

    #[test]
    fn local_file_track_has_null_id() {
        let raw = serde_json::json!({
            "added_at": "2024-03-01T10:00:00Z",
            "track": {"id": null, "name": "Bootleg", "album": {"id": null, "name": ""}}
        });
        let saved: SavedTrack = serde_json::from_value(raw).unwrap();
        assert!(saved.track.id.is_none());
        assert!(saved.track.album.id.is_none());
    }

    #[test]
    fn audio_features_envelope_keeps_null_slots() {
        let raw = serde_json::json!({
            "audio_features": [
                {"id": "t1", "danceability": 0.7, "tempo": 120.0},
                null
            ]
        });
        let envelope: AudioFeaturesEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(envelope.audio_features.len(), 2);
        assert!(envelope.audio_features[1].is_none());
    }

    #[test]
    fn playlist_track_page_parses_fields_projection() {
        let raw = serde_json::json!({
            "items": [
                {"track": {"id": "t1"}},
                {"track": {"id": null}},
                {"track": null}
            ],
            "next": null
        });
        let page: Page<PlaylistTrackEntry> = serde_json::from_value(raw).unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(
            page.items[0].track.as_ref().unwrap().id.as_deref(),
            Some("t1")
        );
        assert!(page.items[2].track.is_none());
    }
}
