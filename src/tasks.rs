//! Concrete extraction tasks
//!
//! Leaf tasks pull raw data from the API; downstream tasks compose their
//! artifacts. Every task reads its inputs from the artifact store and
//! publishes complete JSON artifacts atomically, so any interrupted run can
//! resume by re-requesting the terminal task.
//!
//! The dependency shape mirrors the warehouse tables: saved tracks fan out
//! into album, artist, and audio-feature lookups, while the playlist chain
//! narrows the full playlist listing down to curated playlists and their
//! track memberships.

use crate::artifact::{ArtifactName, ArtifactStore};
use crate::chunk::{
    ALBUMS_BATCH_LIMIT, ARTISTS_BATCH_LIMIT, AUDIO_FEATURES_BATCH_LIMIT, chunk, join_ids,
    unique_in_order,
};
use crate::config::{Config, PlaylistFilterConfig};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::graph::Task;
use crate::model::{
    Album, AlbumsEnvelope, Artist, ArtistsEnvelope, AudioFeatures, AudioFeaturesEnvelope,
    Playlist, PlaylistTrackEntry, PlaylistTrackRow, SavedTrack, UserProfile,
};
use std::sync::Arc;

/// Artifact names published by the extraction tasks.
pub mod artifacts {
    /// Raw saved-track records
    pub const SAVED_TRACKS: &str = "saved_tracks";
    /// Ordered unique album ids from the saved tracks
    pub const SAVED_ALBUM_IDS: &str = "saved_album_ids";
    /// Ordered unique artist ids from the saved tracks
    pub const SAVED_ARTIST_IDS: &str = "saved_artist_ids";
    /// Ordered unique track ids from the saved tracks
    pub const SAVED_TRACK_IDS: &str = "saved_track_ids";
    /// Full album records
    pub const ALBUMS: &str = "albums";
    /// Full artist records
    pub const ARTISTS: &str = "artists";
    /// Audio-feature records
    pub const AUDIO_FEATURES: &str = "audio_features";
    /// Every playlist of the user
    pub const PLAYLISTS: &str = "playlists";
    /// Playlists inside the curated-marker window
    pub const FILTERED_PLAYLISTS: &str = "filtered_playlists";
    /// Playlist-to-track membership rows
    pub const PLAYLIST_TRACKS: &str = "playlist_tracks";
}

/// Extracts the user's saved tracks and fans out the id sets the bulk
/// lookups need.
pub struct ExtractSavedTracks {
    fetcher: Arc<Fetcher>,
    api_base: String,
    page_limit: u32,
}

#[async_trait::async_trait]
impl Task for ExtractSavedTracks {
    fn name(&self) -> &str {
        "saved_tracks"
    }

    fn outputs(&self) -> Vec<ArtifactName> {
        vec![
            artifacts::SAVED_TRACKS.into(),
            artifacts::SAVED_ALBUM_IDS.into(),
            artifacts::SAVED_ARTIST_IDS.into(),
            artifacts::SAVED_TRACK_IDS.into(),
        ]
    }

    async fn run(&self, store: &ArtifactStore) -> Result<()> {
        let url = format!("{}/v1/me/tracks", self.api_base);
        let saved: Vec<SavedTrack> = self
            .fetcher
            .fetch_all(&url, &[("limit", self.page_limit.to_string())])
            .await?;
        tracing::info!(count = saved.len(), "fetched saved tracks");

        // Local files carry null ids and are droppable for every lookup.
        let album_ids =
            unique_in_order(saved.iter().filter_map(|s| s.track.album.id.clone()));
        let artist_ids = unique_in_order(
            saved
                .iter()
                .flat_map(|s| s.track.artists.iter())
                .filter_map(|a| a.id.clone()),
        );
        let track_ids = unique_in_order(saved.iter().filter_map(|s| s.track.id.clone()));

        store.write_json(artifacts::SAVED_TRACKS, &saved)?;
        store.write_json(artifacts::SAVED_ALBUM_IDS, &album_ids)?;
        store.write_json(artifacts::SAVED_ARTIST_IDS, &artist_ids)?;
        store.write_json(artifacts::SAVED_TRACK_IDS, &track_ids)?;
        Ok(())
    }
}

/// Bulk-fetches full album records for the saved-track album ids.
pub struct ExtractAlbums {
    fetcher: Arc<Fetcher>,
    api_base: String,
    saved_tracks: Arc<ExtractSavedTracks>,
}

#[async_trait::async_trait]
impl Task for ExtractAlbums {
    fn name(&self) -> &str {
        "albums"
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![self.saved_tracks.clone()]
    }

    fn outputs(&self) -> Vec<ArtifactName> {
        vec![artifacts::ALBUMS.into()]
    }

    async fn run(&self, store: &ArtifactStore) -> Result<()> {
        let ids: Vec<String> = store.read_json(artifacts::SAVED_ALBUM_IDS)?;
        let url = format!("{}/v1/albums", self.api_base);

        let mut albums: Vec<Album> = Vec::with_capacity(ids.len());
        for group in chunk(&ids, ALBUMS_BATCH_LIMIT) {
            let envelope: AlbumsEnvelope = self
                .fetcher
                .get(&url, &[("ids", join_ids(&group))])
                .await?;
            albums.extend(envelope.albums.into_iter().flatten());
        }

        tracing::info!(count = albums.len(), "fetched albums");
        store.write_json(artifacts::ALBUMS, &albums)
    }
}

/// Bulk-fetches full artist records for the saved-track artist ids.
pub struct ExtractArtists {
    fetcher: Arc<Fetcher>,
    api_base: String,
    saved_tracks: Arc<ExtractSavedTracks>,
}

#[async_trait::async_trait]
impl Task for ExtractArtists {
    fn name(&self) -> &str {
        "artists"
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![self.saved_tracks.clone()]
    }

    fn outputs(&self) -> Vec<ArtifactName> {
        vec![artifacts::ARTISTS.into()]
    }

    async fn run(&self, store: &ArtifactStore) -> Result<()> {
        let ids: Vec<String> = store.read_json(artifacts::SAVED_ARTIST_IDS)?;
        let url = format!("{}/v1/artists", self.api_base);

        let mut artists: Vec<Artist> = Vec::with_capacity(ids.len());
        for group in chunk(&ids, ARTISTS_BATCH_LIMIT) {
            let envelope: ArtistsEnvelope = self
                .fetcher
                .get(&url, &[("ids", join_ids(&group))])
                .await?;
            artists.extend(envelope.artists.into_iter().flatten());
        }

        tracing::info!(count = artists.len(), "fetched artists");
        store.write_json(artifacts::ARTISTS, &artists)
    }
}

/// Bulk-fetches audio features for the saved-track ids.
///
/// The analysis service returns null for tracks it has not analyzed; those
/// slots are dropped rather than written as empty records.
pub struct ExtractAudioFeatures {
    fetcher: Arc<Fetcher>,
    api_base: String,
    saved_tracks: Arc<ExtractSavedTracks>,
}

#[async_trait::async_trait]
impl Task for ExtractAudioFeatures {
    fn name(&self) -> &str {
        "audio_features"
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![self.saved_tracks.clone()]
    }

    fn outputs(&self) -> Vec<ArtifactName> {
        vec![artifacts::AUDIO_FEATURES.into()]
    }

    async fn run(&self, store: &ArtifactStore) -> Result<()> {
        let ids: Vec<String> = store.read_json(artifacts::SAVED_TRACK_IDS)?;
        let url = format!("{}/v1/audio-features", self.api_base);

        let mut features: Vec<AudioFeatures> = Vec::with_capacity(ids.len());
        for group in chunk(&ids, AUDIO_FEATURES_BATCH_LIMIT) {
            let envelope: AudioFeaturesEnvelope = self
                .fetcher
                .get(&url, &[("ids", join_ids(&group))])
                .await?;
            features.extend(envelope.audio_features.into_iter().flatten());
        }

        tracing::info!(count = features.len(), "fetched audio features");
        store.write_json(artifacts::AUDIO_FEATURES, &features)
    }
}

/// Extracts every playlist of the authenticated user.
///
/// The user id comes from the profile endpoint first; the playlist listing is
/// then paginated under `/v1/users/{id}/playlists`.
pub struct ExtractPlaylists {
    fetcher: Arc<Fetcher>,
    api_base: String,
    page_limit: u32,
}

#[async_trait::async_trait]
impl Task for ExtractPlaylists {
    fn name(&self) -> &str {
        "playlists"
    }

    fn outputs(&self) -> Vec<ArtifactName> {
        vec![artifacts::PLAYLISTS.into()]
    }

    async fn run(&self, store: &ArtifactStore) -> Result<()> {
        let profile: UserProfile = self
            .fetcher
            .get(&format!("{}/v1/me", self.api_base), &[])
            .await?;

        let url = format!("{}/v1/users/{}/playlists", self.api_base, profile.id);
        let playlists: Vec<Playlist> = self
            .fetcher
            .fetch_all(&url, &[("limit", self.page_limit.to_string())])
            .await?;

        tracing::info!(user = %profile.id, count = playlists.len(), "fetched playlists");
        store.write_json(artifacts::PLAYLISTS, &playlists)
    }
}

/// Narrows the playlist listing to the curated window between the configured
/// marker playlists.
pub struct FilterPlaylists {
    filter: PlaylistFilterConfig,
    playlists: Arc<ExtractPlaylists>,
}

#[async_trait::async_trait]
impl Task for FilterPlaylists {
    fn name(&self) -> &str {
        "filter_playlists"
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![self.playlists.clone()]
    }

    fn outputs(&self) -> Vec<ArtifactName> {
        vec![artifacts::FILTERED_PLAYLISTS.into()]
    }

    async fn run(&self, store: &ArtifactStore) -> Result<()> {
        let playlists: Vec<Playlist> = store.read_json(artifacts::PLAYLISTS)?;
        let filtered = filter_by_markers(playlists, &self.filter);
        tracing::info!(count = filtered.len(), "filtered curated playlists");
        store.write_json(artifacts::FILTERED_PLAYLISTS, &filtered)
    }
}

/// Keep the playlists strictly between the start and end markers.
///
/// Both markers are exclusive. A missing or unmatched start marker opens the
/// window at the beginning of the list; a missing or unmatched end marker
/// leaves it open to the end. An unmatched configured marker is logged, since
/// it usually means the operator renamed the marker playlist.
fn filter_by_markers(
    playlists: Vec<Playlist>,
    filter: &PlaylistFilterConfig,
) -> Vec<Playlist> {
    let start = match &filter.start_marker {
        Some(marker) => match playlists.iter().position(|p| &p.name == marker) {
            Some(idx) => idx + 1,
            None => {
                tracing::warn!(marker = %marker, "start marker not found, keeping from list start");
                0
            }
        },
        None => 0,
    };
    let end = match &filter.end_marker {
        Some(marker) => match playlists.iter().position(|p| &p.name == marker) {
            Some(idx) => idx,
            None => {
                tracing::warn!(marker = %marker, "end marker not found, keeping to list end");
                playlists.len()
            }
        },
        None => playlists.len(),
    };

    if start >= end {
        return Vec::new();
    }
    playlists
        .into_iter()
        .skip(start)
        .take(end - start)
        .collect()
}

/// Extracts the track membership of every curated playlist.
///
/// Each playlist's tracks sub-resource paginates independently via its own
/// `href`, with the payload projected down to track ids by the `fields`
/// parameter.
pub struct ExtractPlaylistTracks {
    fetcher: Arc<Fetcher>,
    filtered: Arc<FilterPlaylists>,
}

#[async_trait::async_trait]
impl Task for ExtractPlaylistTracks {
    fn name(&self) -> &str {
        "playlist_tracks"
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![self.filtered.clone()]
    }

    fn outputs(&self) -> Vec<ArtifactName> {
        vec![artifacts::PLAYLIST_TRACKS.into()]
    }

    async fn run(&self, store: &ArtifactStore) -> Result<()> {
        let playlists: Vec<Playlist> = store.read_json(artifacts::FILTERED_PLAYLISTS)?;

        let mut rows: Vec<PlaylistTrackRow> = Vec::new();
        for playlist in &playlists {
            let entries: Vec<PlaylistTrackEntry> = self
                .fetcher
                .fetch_all(
                    &playlist.tracks.href,
                    &[
                        ("limit", "100".to_string()),
                        ("fields", "items(track(id)),next".to_string()),
                    ],
                )
                .await?;

            let before = rows.len();
            rows.extend(entries.into_iter().filter_map(|entry| {
                let id = entry.track.and_then(|t| t.id)?;
                Some(PlaylistTrackRow {
                    playlist_id: playlist.id.clone(),
                    playlist_name: playlist.name.clone(),
                    track_id: id,
                })
            }));
            tracing::debug!(
                playlist = %playlist.name,
                tracks = rows.len() - before,
                "collected playlist tracks"
            );
        }

        tracing::info!(rows = rows.len(), "collected playlist track rows");
        store.write_json(artifacts::PLAYLIST_TRACKS, &rows)
    }
}

/// Terminal no-output task depending on every extraction.
///
/// Requesting it materializes the whole pipeline; it performs no work of its
/// own.
pub struct ExtractAll {
    deps: Vec<Arc<dyn Task>>,
}

#[async_trait::async_trait]
impl Task for ExtractAll {
    fn name(&self) -> &str {
        "extract_all"
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        self.deps.clone()
    }

    fn outputs(&self) -> Vec<ArtifactName> {
        Vec::new()
    }

    async fn run(&self, _store: &ArtifactStore) -> Result<()> {
        Ok(())
    }
}

/// The fully wired task graph for one account.
///
/// Individual tasks are exposed so an operator can request any sub-graph;
/// [`Pipeline::extract_all`] is the terminal covering everything.
pub struct Pipeline {
    /// Saved-track extraction (fan-out producer)
    pub saved_tracks: Arc<ExtractSavedTracks>,
    /// Album bulk lookup
    pub albums: Arc<ExtractAlbums>,
    /// Artist bulk lookup
    pub artists: Arc<ExtractArtists>,
    /// Audio-feature bulk lookup
    pub audio_features: Arc<ExtractAudioFeatures>,
    /// Playlist listing
    pub playlists: Arc<ExtractPlaylists>,
    /// Curated-playlist filter
    pub filter_playlists: Arc<FilterPlaylists>,
    /// Playlist track membership
    pub playlist_tracks: Arc<ExtractPlaylistTracks>,
}

impl Pipeline {
    /// Wire the task graph against `fetcher` using the endpoints and filter
    /// markers in `config`.
    pub fn new(config: &Config, fetcher: Arc<Fetcher>) -> Self {
        let api_base = config.api.api_base.trim_end_matches('/').to_string();
        let page_limit = config.api.page_limit;

        let saved_tracks = Arc::new(ExtractSavedTracks {
            fetcher: fetcher.clone(),
            api_base: api_base.clone(),
            page_limit,
        });
        let albums = Arc::new(ExtractAlbums {
            fetcher: fetcher.clone(),
            api_base: api_base.clone(),
            saved_tracks: saved_tracks.clone(),
        });
        let artists = Arc::new(ExtractArtists {
            fetcher: fetcher.clone(),
            api_base: api_base.clone(),
            saved_tracks: saved_tracks.clone(),
        });
        let audio_features = Arc::new(ExtractAudioFeatures {
            fetcher: fetcher.clone(),
            api_base: api_base.clone(),
            saved_tracks: saved_tracks.clone(),
        });
        let playlists = Arc::new(ExtractPlaylists {
            fetcher: fetcher.clone(),
            api_base,
            page_limit,
        });
        let filter_playlists = Arc::new(FilterPlaylists {
            filter: config.playlists.clone(),
            playlists: playlists.clone(),
        });
        let playlist_tracks = Arc::new(ExtractPlaylistTracks {
            fetcher,
            filtered: filter_playlists.clone(),
        });

        Self {
            saved_tracks,
            albums,
            artists,
            audio_features,
            playlists,
            filter_playlists,
            playlist_tracks,
        }
    }

    /// Terminal task whose closure is the entire pipeline.
    pub fn extract_all(&self) -> Arc<dyn Task> {
        Arc::new(ExtractAll {
            deps: vec![
                self.albums.clone(),
                self.artists.clone(),
                self.audio_features.clone(),
                self.playlist_tracks.clone(),
            ],
        })
    }
}
