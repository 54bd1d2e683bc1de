// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{MusicBrainzError, Result};
use crate::models::{Recording, RecordingSearchResult, ReleaseGroup, SearchQuery, SearchResponse};
use crate::rate_limiter::RateLimiter;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";
const APP_NAME: &str = "Audiotheque";

/// Includes requested on recording lookups: enough to build a complete
/// candidate (artists, first release, its release group and track number).
const RECORDING_INCLUDES: &str = "artist-credits+releases+release-groups+media";

fn user_agent(contact: Option<&str>) -> String {
    match contact.map(str::trim).filter(|contact| !contact.is_empty()) {
        Some(contact) => format!("{}/{} ( {} )", APP_NAME, env!("CARGO_PKG_VERSION"), contact),
        None => format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")),
    }
}

/// MusicBrainz API client with rate limiting.
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    client: Client,
    base_url: String,
    user_agent: String,
    rate_limiter: RateLimiter,
}

impl MusicBrainzClient {
    /// Create a new MusicBrainz client with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder() -> MusicBrainzClientBuilder {
        MusicBrainzClientBuilder::default()
    }

    /// User-Agent sent with every request; reused by other services that
    /// identify the application the same way.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Look up a recording by MusicBrainz ID, including artist credits,
    /// releases, release groups and media.
    ///
    /// # Example
    /// ```no_run
    /// # use audiotheque_musicbrainz::MusicBrainzClient;
    /// # use uuid::Uuid;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = MusicBrainzClient::new()?;
    /// let mbid = Uuid::parse_str("e5a3f0c4-1fae-4f2e-8f76-0c3b4f1e4fa6")?;
    /// let recording = client.lookup_recording(mbid).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn lookup_recording(&self, mbid: Uuid) -> Result<Recording> {
        let url = format!(
            "{}/recording/{}?fmt=json&inc={}",
            self.base_url, mbid, RECORDING_INCLUDES
        );
        self.get(&url).await
    }

    /// Look up a release group; used for its first release date.
    pub async fn lookup_release_group(&self, mbid: Uuid) -> Result<ReleaseGroup> {
        let url = format!("{}/release-group/{}?fmt=json", self.base_url, mbid);
        self.get(&url).await
    }

    /// Search recordings with a Lucene query.
    ///
    /// # Example
    /// ```no_run
    /// # use audiotheque_musicbrainz::{MusicBrainzClient, SearchQuery};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = MusicBrainzClient::new()?;
    /// let query = SearchQuery::recording(Some("Radiohead"), "Airbag").limit(10);
    /// let response = client.search_recordings(query).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search_recordings(
        &self,
        query: SearchQuery,
    ) -> Result<SearchResponse<RecordingSearchResult>> {
        let mut url = Url::parse(&format!("{}/recording", self.base_url))
            .map_err(|e| MusicBrainzError::InvalidResponse(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("query", &query.query)
            .append_pair("fmt", "json");

        if let Some(limit) = query.limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }

        self.get(url.as_str()).await
    }

    /// Rate-limited GET. The permit is held until the body has been read so
    /// the next call waits from this one's completion, error paths included.
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let _permit = self.rate_limiter.acquire().await;

        trace!(target: "musicbrainz", "GET {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        debug!(target: "musicbrainz", "response status: {}", status);

        if status == 404 {
            return Err(MusicBrainzError::NotFound(url.to_string()));
        }

        if status == 503 {
            return Err(MusicBrainzError::RateLimitExceeded);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MusicBrainzError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        trace!(target: "musicbrainz", "response body: {}", body);

        serde_json::from_str(&body).map_err(|e| {
            MusicBrainzError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }
}

/// Builder for configuring a MusicBrainz client.
#[derive(Debug)]
pub struct MusicBrainzClientBuilder {
    base_url: String,
    contact: Option<String>,
    timeout: Duration,
    rate_limit_interval: Duration,
}

impl Default for MusicBrainzClientBuilder {
    fn default() -> Self {
        Self {
            base_url: MUSICBRAINZ_API_BASE.to_string(),
            contact: None,
            timeout: Duration::from_secs(30),
            rate_limit_interval: Duration::from_millis(1100),
        }
    }
}

impl MusicBrainzClientBuilder {
    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Contact address appended to the User-Agent.
    pub fn contact(mut self, contact: Option<String>) -> Self {
        self.contact = contact;
        self
    }

    /// Set request timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pause enforced after each request.
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    /// Build the MusicBrainz client.
    pub fn build(self) -> Result<MusicBrainzClient> {
        Url::parse(&self.base_url)
            .map_err(|e| MusicBrainzError::InvalidResponse(format!("Invalid base URL: {}", e)))?;

        let user_agent = user_agent(self.contact.as_deref());
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(user_agent.clone())
            .build()?;

        Ok(MusicBrainzClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            user_agent,
            rate_limiter: RateLimiter::new(self.rate_limit_interval, "musicbrainz"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_contact() {
        assert!(user_agent(Some("me@example.org")).ends_with("( me@example.org )"));
        assert!(!user_agent(None).contains('('));
        assert!(!user_agent(Some("  ")).contains('('));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(MusicBrainzClient::builder()
            .base_url("not a url")
            .build()
            .is_err());
    }
}
