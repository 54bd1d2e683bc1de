// SPDX-License-Identifier: GPL-3.0-or-later

//! Production implementations of the cascade ports.

use crate::candidate_selection::SearchHit;
use crate::ports::{
    ArtworkSource, FingerprintExtractor, FingerprintLookup, RecordingCatalog, RecordingDetails,
};
use async_trait::async_trait;
use audiotheque_domain::{year_from_date, ArtworkBuffer, ARTIST_JOIN};
use audiotheque_fingerprint::{AcoustidClient, Fingerprint, FingerprintError, FpcalcExtractor};
use audiotheque_metadata::{CoverArtClient, CoverArtError};
use audiotheque_musicbrainz::{MusicBrainzClient, MusicBrainzError, Recording, SearchQuery};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

#[async_trait]
impl FingerprintExtractor for FpcalcExtractor {
    async fn extract(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        self.fingerprint(path).await
    }
}

#[async_trait]
impl FingerprintLookup for AcoustidClient {
    async fn best_recording(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<String>, FingerprintError> {
        Ok(self
            .best_recording_id(fingerprint)
            .await?
            .map(|id| id.to_string()))
    }
}

#[async_trait]
impl ArtworkSource for CoverArtClient {
    async fn fetch_front_cover(
        &self,
        release_id: &str,
    ) -> Result<Option<ArtworkBuffer>, CoverArtError> {
        CoverArtClient::fetch_front_cover(self, release_id).await
    }
}

/// MusicBrainz-backed catalog.
pub struct MusicBrainzCatalog {
    client: MusicBrainzClient,
    search_limit: u32,
}

impl MusicBrainzCatalog {
    pub fn new(client: MusicBrainzClient, search_limit: u32) -> Self {
        Self {
            client,
            search_limit,
        }
    }

    /// Year of the first release, falling back to its release group's first
    /// release date. A failed release-group lookup just leaves the year empty.
    async fn release_year(&self, recording: &Recording) -> String {
        let Some(release) = recording.first_release() else {
            return String::new();
        };

        if let Some(year) = release.date.as_deref().and_then(year_from_date) {
            return year;
        }

        let Some(group) = release.release_group.as_ref() else {
            return String::new();
        };

        if let Some(year) = group.first_release_date.as_deref().and_then(year_from_date) {
            return year;
        }

        match self.client.lookup_release_group(group.id).await {
            Ok(group) => group
                .first_release_date
                .as_deref()
                .and_then(year_from_date)
                .unwrap_or_default(),
            Err(error) => {
                debug!(target: "musicbrainz", release_group = %group.id, error = %error, "release group lookup failed");
                String::new()
            }
        }
    }
}

#[async_trait]
impl RecordingCatalog for MusicBrainzCatalog {
    async fn recording_details(
        &self,
        recording_id: &str,
    ) -> Result<RecordingDetails, MusicBrainzError> {
        let mbid = Uuid::parse_str(recording_id.trim()).map_err(|e| {
            MusicBrainzError::InvalidResponse(format!("invalid recording id {}: {}", recording_id, e))
        })?;

        let recording = self.client.lookup_recording(mbid).await?;
        if !recording.is_complete() {
            return Err(MusicBrainzError::IncompleteRecord(mbid));
        }

        let year = self.release_year(&recording).await;
        let release = recording.first_release();

        Ok(RecordingDetails {
            recording_id: recording.id.to_string(),
            title: recording.title.clone(),
            artist: recording.artist_names().join(ARTIST_JOIN),
            album: release.map(|r| r.title.clone()).unwrap_or_default(),
            release_id: release.map(|r| r.id.to_string()),
            year,
            track_number: release
                .and_then(|r| r.track_number())
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn search_recordings(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<SearchHit>, MusicBrainzError> {
        let query = SearchQuery::recording(Some(artist), title).limit(self.search_limit);
        debug!(target: "musicbrainz", query = %query.query, "text search");

        let response = self.client.search_recordings(query).await?;
        Ok(response
            .results
            .recordings
            .into_iter()
            .map(|recording| {
                let first_release = recording.first_release();
                SearchHit {
                    recording_id: Some(recording.id.to_string()),
                    score: recording.score.unwrap_or(0),
                    title: recording.title.clone(),
                    artist: recording.artist_names().join(ARTIST_JOIN),
                    first_release_title: first_release
                        .map(|r| r.title.clone())
                        .filter(|t| !t.is_empty()),
                    first_release_year: first_release
                        .and_then(|r| r.date.as_deref())
                        .and_then(year_from_date),
                }
            })
            .collect())
    }
}
