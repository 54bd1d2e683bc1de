// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Recording (a distinct audio performance) from MusicBrainz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recording {
    /// MusicBrainz recording ID (MBID).
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    /// Length in milliseconds.
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
    /// Releases containing this recording, in the order MusicBrainz returns them.
    #[serde(default)]
    pub releases: Vec<Release>,
    /// Search score 0-100 (only present in search results).
    #[serde(default, deserialize_with = "score_from_number_or_string")]
    pub score: Option<u8>,
}

impl Recording {
    /// Names of the credited artists, in credit order.
    pub fn artist_names(&self) -> Vec<&str> {
        self.artist_credit
            .iter()
            .map(|credit| credit.artist.name.as_str())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Title and at least one artist are present.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.artist_names().is_empty()
    }

    /// The release used for album, year and cover art.
    pub fn first_release(&self) -> Option<&Release> {
        self.releases.first()
    }
}

/// Artist credit entry (artist contribution to a recording).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtistCredit {
    /// Name as credited.
    #[serde(default)]
    pub name: String,
    pub artist: ArtistRef,
    /// Join phrase (e.g., " & ", " feat. ").
    #[serde(default)]
    pub joinphrase: Option<String>,
}

/// Reference to an artist (minimal info).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtistRef {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "sort-name", default)]
    pub sort_name: String,
}

/// Release (a concrete product: album edition, single, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    /// Release date (YYYY, YYYY-MM, or YYYY-MM-DD).
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "release-group", default)]
    pub release_group: Option<ReleaseGroup>,
    /// Only populated when media were requested; each medium lists the matching track.
    #[serde(default)]
    pub media: Vec<Medium>,
}

impl Release {
    /// Track number of the recording on this release, when media were included.
    pub fn track_number(&self) -> Option<&str> {
        self.media
            .iter()
            .flat_map(|medium| medium.tracks.iter())
            .map(|track| track.number.as_str())
            .find(|number| !number.is_empty())
    }
}

/// Release group (the abstract "album").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseGroup {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "primary-type", default)]
    pub primary_type: Option<String>,
    /// First release date (YYYY, YYYY-MM, or YYYY-MM-DD).
    #[serde(rename = "first-release-date", default)]
    pub first_release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medium {
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    /// Printed track number ("3", "A2", ...).
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub title: String,
}

/// Search query parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Lucene query string.
    pub query: String,
    /// Maximum number of results (default 25, max 100).
    pub limit: Option<u32>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
        }
    }

    /// Recording search by phrase: `recording:"<title>"`, plus
    /// ` AND artist:"<artist>"` when an artist is known. Double quotes inside
    /// the values are backslash-escaped.
    pub fn recording(artist: Option<&str>, title: &str) -> Self {
        let mut parts = vec![format!("recording:\"{}\"", escape_phrase(title))];
        if let Some(artist) = artist.map(str::trim).filter(|artist| !artist.is_empty()) {
            parts.push(format!("artist:\"{}\"", escape_phrase(artist)));
        }
        Self::new(parts.join(" AND "))
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

fn escape_phrase(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Generic search response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(flatten)]
    pub results: T,
}

/// Recording search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSearchResult {
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

// Older mirrors send the search score as a string.
fn score_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Score>::deserialize(deserializer)? {
        Some(Score::Number(value)) => Some(value.min(100) as u8),
        Some(Score::Text(text)) => text.trim().parse::<u64>().ok().map(|value| value.min(100) as u8),
        None => None,
    })
}
