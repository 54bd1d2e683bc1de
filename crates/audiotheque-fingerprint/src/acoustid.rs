// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{FingerprintError, Result};
use crate::fingerprint::Fingerprint;
use audiotheque_musicbrainz::RateLimiter;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

const ACOUSTID_API_BASE: &str = "https://api.acoustid.org/v2";
const USER_AGENT: &str = concat!("Audiotheque/", env!("CARGO_PKG_VERSION"));
const LOOKUP_META: &str = "recordings releases releasegroups";

/// One AcoustID track matching the fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupResult {
    /// AcoustID track ID.
    pub id: String,
    /// Match score (0-1).
    #[serde(default)]
    pub score: f32,
    /// MusicBrainz recordings linked to the AcoustID track.
    #[serde(default)]
    pub recordings: Vec<RecordingMatch>,
}

/// MusicBrainz recording linked to an AcoustID track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingMatch {
    /// MusicBrainz recording ID.
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<RecordingArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingArtist {
    pub id: Uuid,
    pub name: String,
}

/// AcoustID API client for fingerprint lookup.
#[derive(Debug, Clone)]
pub struct AcoustidClient {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl AcoustidClient {
    /// Create a new AcoustID client.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder(api_key: impl Into<String>) -> AcoustidClientBuilder {
        AcoustidClientBuilder::new(api_key)
    }

    /// Lookup a fingerprint and return every matching AcoustID track, in the
    /// order the service ranks them.
    ///
    /// # Example
    /// ```no_run
    /// # use audiotheque_fingerprint::{AcoustidClient, Fingerprint};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = AcoustidClient::new("your-api-key")?;
    /// let fp = Fingerprint::new("AQADtEmUSEkSJUmY", 215);
    /// let results = client.lookup(&fp).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Vec<LookupResult>> {
        fingerprint.validate()?;

        let mut url = Url::parse(&format!("{}/lookup", self.base_url))
            .map_err(|e| FingerprintError::InvalidResponse(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("client", &self.api_key)
            .append_pair("fingerprint", &fingerprint.hash)
            .append_pair("duration", &fingerprint.duration.to_string())
            .append_pair("meta", LOOKUP_META);

        let _permit = self.rate_limiter.acquire().await;
        trace!(target: "acoustid", duration = fingerprint.duration, "AcoustID lookup");

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        debug!(target: "acoustid", "AcoustID response status: {}", status);

        let body = response.text().await?;
        trace!(target: "acoustid", "AcoustID response: {}", body);

        if !status.is_success() {
            let message = serde_json::from_str::<AcoustidResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .map(|error| error.message())
                .unwrap_or(body);
            return Err(FingerprintError::AcoustidError(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        let api_response: AcoustidResponse = serde_json::from_str(&body)?;

        if !api_response.status.eq_ignore_ascii_case("ok") {
            return Err(FingerprintError::AcoustidError(
                api_response
                    .error
                    .map(|error| error.message())
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(api_response.results)
    }

    /// Recording ID of the first recording attached to the top-ranked result.
    ///
    /// Only the first result is considered; the remaining ones are ignored
    /// even when the first carries no recordings.
    pub async fn best_recording_id(&self, fingerprint: &Fingerprint) -> Result<Option<Uuid>> {
        let results = self.lookup(fingerprint).await?;
        let best = first_recording_id(&results);
        debug!(target: "acoustid", results = results.len(), recording = ?best, "AcoustID lookup done");
        Ok(best)
    }
}

fn first_recording_id(results: &[LookupResult]) -> Option<Uuid> {
    results
        .first()
        .and_then(|result| result.recordings.first())
        .map(|recording| recording.id)
}

/// AcoustID API response structure.
#[derive(Debug, Deserialize)]
struct AcoustidResponse {
    status: String,
    #[serde(default)]
    results: Vec<LookupResult>,
    #[serde(default)]
    error: Option<AcoustidErrorBody>,
}

/// The service reports errors as `{"code": n, "message": "..."}`; some
/// proxies flatten that to a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AcoustidErrorBody {
    Detailed { code: Option<i64>, message: String },
    Text(String),
}

impl AcoustidErrorBody {
    fn message(self) -> String {
        match self {
            Self::Detailed {
                code: Some(code),
                message,
            } => format!("{} (code {})", message, code),
            Self::Detailed { message, .. } => message,
            Self::Text(message) => message,
        }
    }
}

/// Builder for AcoustID client.
#[derive(Debug)]
pub struct AcoustidClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    rate_limit_interval: Duration,
}

impl AcoustidClientBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ACOUSTID_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit_interval: Duration::from_millis(333),
        }
    }

    /// Set a custom base URL (useful for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pause enforced after each lookup.
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    /// Build the AcoustID client.
    ///
    /// # Errors
    /// Returns an error if the base URL is not a valid URL or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<AcoustidClient> {
        Url::parse(&self.base_url)
            .map_err(|e| FingerprintError::AcoustidError(format!("Invalid base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(AcoustidClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key,
            rate_limiter: RateLimiter::new(self.rate_limit_interval, "acoustid"),
        })
    }
}
