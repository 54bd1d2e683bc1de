// SPDX-License-Identifier: GPL-3.0-or-later

//! MusicBrainz API client for recording identification.
//!
//! Covers the three calls the tagger needs: recording lookup by MBID,
//! release-group lookup (for the first release date) and recording search.
//! Every request goes through a [`RateLimiter`] that spaces calls from the
//! completion of the previous one, as the MusicBrainz etiquette asks.

pub mod client;
pub mod error;
pub mod models;
pub mod rate_limiter;

pub use client::{MusicBrainzClient, MusicBrainzClientBuilder};
pub use error::{MusicBrainzError, Result};
pub use models::{
    ArtistCredit, ArtistRef, Medium, Recording, RecordingSearchResult, Release, ReleaseGroup,
    SearchQuery, SearchResponse, Track,
};
pub use rate_limiter::{RateLimiter, RatePermit};
