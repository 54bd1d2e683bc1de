// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, MusicBrainzError>;

#[derive(Debug, Error)]
pub enum MusicBrainzError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid response from MusicBrainz API: {0}")]
    InvalidResponse(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// The recording exists but lacks a title or an artist credit.
    #[error("Recording {0} has no title or artist")]
    IncompleteRecord(Uuid),
}
