// SPDX-License-Identifier: GPL-3.0-or-later
use audiotheque_domain::{ArtworkBuffer, ArtworkMime};
use moka::sync::Cache;
use reqwest::{header, Client, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

const COVER_ART_ARCHIVE_BASE: &str = "https://coverartarchive.org";
const ACCEPT_IMAGES: &str = "image/jpeg, image/png";

#[derive(Debug, Error)]
pub enum CoverArtError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status}")]
    HttpStatus { status: StatusCode },
    #[error("Failed to store artwork: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
struct CachedCover {
    bytes: Arc<[u8]>,
    mime: ArtworkMime,
}

/// Downloads front covers of releases.
///
/// Image bytes are cached per release id for the lifetime of the client, but
/// every call writes a fresh temporary file so each caller owns its buffer.
pub struct CoverArtClient {
    client: Client,
    base_url: String,
    temp_dir: Option<PathBuf>,
    cache: Cache<String, CachedCover>,
}

impl CoverArtClient {
    /// `timeout` bounds the whole request; past it the fetch fails.
    pub fn new(
        base_url: Option<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, CoverArtError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or_else(|| COVER_ART_ARCHIVE_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            temp_dir: None,
            cache: Cache::new(256),
        })
    }

    /// Write temporary artwork files into `dir` instead of the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Download the front cover of a release into a temporary file.
    ///
    /// `Ok(None)` when the release has no front cover.
    #[instrument(skip(self), fields(release_id = release_id))]
    pub async fn fetch_front_cover(
        &self,
        release_id: &str,
    ) -> Result<Option<ArtworkBuffer>, CoverArtError> {
        let release_id = release_id.trim();
        if release_id.is_empty() {
            return Ok(None);
        }

        let cover = match self.cache.get(release_id) {
            Some(cached) => {
                debug!(target: "cover-art", "cover served from cache");
                cached
            }
            None => match self.download(release_id).await? {
                Some(cover) => {
                    self.cache.insert(release_id.to_string(), cover.clone());
                    cover
                }
                None => return Ok(None),
            },
        };

        let buffer = ArtworkBuffer::write(self.temp_dir.as_deref(), &cover.bytes, cover.mime)?;
        debug!(target: "cover-art", path = %buffer.path().display(), mime = cover.mime.as_str(), "cover stored");
        Ok(Some(buffer))
    }

    async fn download(&self, release_id: &str) -> Result<Option<CachedCover>, CoverArtError> {
        let url = format!("{}/release/{}/front", self.base_url, release_id);
        debug!(target: "cover-art", url = %url, "fetching front cover");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, ACCEPT_IMAGES)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(target: "cover-art", "no front cover (404)");
            return Ok(None);
        }
        if !status.is_success() {
            warn!(target: "cover-art", status = %status, "cover art request failed");
            return Err(CoverArtError::HttpStatus { status });
        }

        let mime = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ArtworkMime::from_content_type)
            .unwrap_or(ArtworkMime::Jpeg);

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            debug!(target: "cover-art", "empty cover body");
            return Ok(None);
        }

        Ok(Some(CachedCover {
            bytes: Arc::from(bytes.as_ref()),
            mime,
        }))
    }
}
