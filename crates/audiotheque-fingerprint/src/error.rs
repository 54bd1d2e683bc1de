// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FingerprintError>;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("fpcalc executable not found: {0}")]
    ToolNotFound(String),

    #[error("fpcalc failed (exit code: {code:?}): {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    #[error("Malformed fpcalc output: {0}")]
    MalformedOutput(String),

    #[error("Failed to run fpcalc: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("AcoustID API error: {0}")]
    AcoustidError(String),

    #[error("Invalid response from AcoustID API: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
