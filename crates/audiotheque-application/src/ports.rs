// SPDX-License-Identifier: GPL-3.0-or-later

//! Collaborators the resolution cascade talks to.
//!
//! Each trait has one production adapter (see [`crate::adapters`]) and is
//! replaced by scripted fakes in tests.

use crate::candidate_selection::SearchHit;
use async_trait::async_trait;
use audiotheque_domain::{ArtworkBuffer, CandidateRecord, Provenance};
use audiotheque_fingerprint::{Fingerprint, FingerprintError};
use audiotheque_metadata::CoverArtError;
use audiotheque_musicbrainz::MusicBrainzError;
use std::path::Path;

#[async_trait]
pub trait FingerprintExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<Fingerprint, FingerprintError>;
}

#[async_trait]
pub trait FingerprintLookup: Send + Sync {
    /// Recording id of the best match, if any.
    async fn best_recording(&self, fingerprint: &Fingerprint)
        -> Result<Option<String>, FingerprintError>;
}

/// Detailed recording data used to build a suggestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingDetails {
    pub recording_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub release_id: Option<String>,
    pub year: String,
    pub track_number: String,
}

impl RecordingDetails {
    pub fn into_candidate(self, provenance: Provenance) -> CandidateRecord {
        CandidateRecord {
            recording_id: Some(self.recording_id),
            title: self.title,
            artist: self.artist,
            album: self.album,
            release_id: self.release_id,
            year: self.year,
            track_number: self.track_number,
            score: None,
            provenance,
        }
    }
}

#[async_trait]
pub trait RecordingCatalog: Send + Sync {
    /// Title, artists and first release of a recording.
    ///
    /// Fails with [`MusicBrainzError::IncompleteRecord`] when the recording has
    /// no title or no artist.
    async fn recording_details(&self, recording_id: &str)
        -> Result<RecordingDetails, MusicBrainzError>;

    /// Raw text-search hits, unfiltered, in provider order.
    async fn search_recordings(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<SearchHit>, MusicBrainzError>;
}

#[async_trait]
pub trait ArtworkSource: Send + Sync {
    /// Front cover of a release, or `None` when the release has none.
    async fn fetch_front_cover(&self, release_id: &str)
        -> Result<Option<ArtworkBuffer>, CoverArtError>;
}
