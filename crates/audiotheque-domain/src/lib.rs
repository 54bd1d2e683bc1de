// SPDX-License-Identifier: GPL-3.0-or-later
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::warn;

/// Delimiter placed between the names of multiple credited artists.
pub const ARTIST_JOIN: &str = " & ";

// ============================================================================
// Audio files
// ============================================================================

/// Container family of an audio file. Each family has its own tagging scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// MPEG audio carrying ID3v2 frames.
    Mp3,
    /// Native FLAC with Vorbis comments and PICTURE blocks.
    Flac,
    /// Ogg Vorbis (Vorbis comments).
    OggVorbis,
    /// Ogg Opus (Vorbis comments in OpusTags).
    OggOpus,
    /// MP4/M4A with an `ilst` atom.
    Mp4,
}

impl ContainerFormat {
    /// Best guess from a file extension. `.ogg` is assumed to be Vorbis; the
    /// tag writer confirms the real family from the file content.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" | "oga" => Some(Self::OggVorbis),
            "opus" => Some(Self::OggOpus),
            "m4a" | "mp4" | "m4b" => Some(Self::Mp4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3/ID3",
            Self::Flac => "FLAC/Vorbis",
            Self::OggVorbis => "OGG-Vorbis",
            Self::OggOpus => "OGG-Opus",
            Self::Mp4 => "MP4/M4A",
        }
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audio file discovered under the library root. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub format: Option<ContainerFormat>,
    pub already_tagged: bool,
}

impl AudioTrack {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ContainerFormat::from_extension);
        Self {
            path,
            format,
            already_tagged: false,
        }
    }

    pub fn with_existing_tags(mut self, already_tagged: bool) -> Self {
        self.already_tagged = already_tagged;
        self
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// ============================================================================
// Candidates and resolved metadata
// ============================================================================

/// Which identification strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    Fingerprint,
    TextSearch,
    FilenameRaw,
    Manual,
}

impl Provenance {
    /// Whether the record came out of MusicBrainz and may carry a release id.
    pub fn is_musicbrainz(&self) -> bool {
        matches!(self, Self::Fingerprint | Self::TextSearch)
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Fingerprint => write!(f, "MusicBrainz (fingerprint)"),
            Provenance::TextSearch => write!(f, "MusicBrainz (text search)"),
            Provenance::FilenameRaw => write!(f, "Filename (raw)"),
            Provenance::Manual => write!(f, "Manual"),
        }
    }
}

/// A proposed identification for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub recording_id: Option<String>,
    pub title: String,
    /// Display string; several artists are joined with [`ARTIST_JOIN`].
    pub artist: String,
    pub album: String,
    pub release_id: Option<String>,
    /// Four digit year, or empty.
    pub year: String,
    pub track_number: String,
    /// Relevance score 0-100, only for text-search candidates.
    pub score: Option<u8>,
    pub provenance: Provenance,
}

impl CandidateRecord {
    /// Raw guess taken straight from the filename.
    pub fn from_filename(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            recording_id: None,
            title: title.into(),
            artist: artist.into(),
            album: String::new(),
            release_id: None,
            year: String::new(),
            track_number: String::new(),
            score: None,
            provenance: Provenance::FilenameRaw,
        }
    }

    /// Title and artist are both present.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.artist.trim().is_empty()
    }

    pub fn fields(&self) -> TrackFields {
        TrackFields {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            year: self.year.clone(),
            track_number: self.track_number.clone(),
        }
    }
}

/// The text values written into a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFields {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub track_number: String,
}

impl TrackFields {
    /// At least one of title, artist, album or year is non-empty.
    pub fn has_content(&self) -> bool {
        [&self.title, &self.artist, &self.album, &self.year]
            .iter()
            .any(|value| !value.trim().is_empty())
    }
}

/// Final decision for a file: the fields to write plus optional artwork.
#[derive(Debug)]
pub struct ResolvedMetadata {
    pub fields: TrackFields,
    pub provenance: Provenance,
    pub artwork: Option<ArtworkBuffer>,
}

impl ResolvedMetadata {
    pub fn new(fields: TrackFields, provenance: Provenance) -> Self {
        Self {
            fields,
            provenance,
            artwork: None,
        }
    }

    pub fn with_artwork(mut self, artwork: Option<ArtworkBuffer>) -> Self {
        self.artwork = artwork;
        self
    }

    /// Only records with some content are ever written.
    pub fn is_writable(&self) -> bool {
        self.fields.has_content()
    }
}

/// Extract a four digit year from a `YYYY`, `YYYY-MM` or `YYYY-MM-DD` date.
pub fn year_from_date(date: &str) -> Option<String> {
    let prefix = date.trim().get(..4)?;
    prefix
        .chars()
        .all(|c| c.is_ascii_digit())
        .then(|| prefix.to_string())
}

// ============================================================================
// Artwork
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtworkMime {
    Jpeg,
    Png,
}

impl ArtworkMime {
    /// PNG when the content type says so, JPEG otherwise.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.to_ascii_lowercase().contains("png") {
            Self::Png
        } else {
            Self::Jpeg
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
        }
    }
}

/// Downloaded cover art held in a temporary file.
///
/// The file is owned by a single file-processing iteration. It is deleted by
/// [`ArtworkBuffer::release`] or, failing that, when the buffer is dropped.
#[derive(Debug)]
pub struct ArtworkBuffer {
    path: TempPath,
    mime: ArtworkMime,
}

impl ArtworkBuffer {
    /// Write `bytes` to a fresh temp file, in `dir` or the system temp directory.
    pub fn write(dir: Option<&Path>, bytes: &[u8], mime: ArtworkMime) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("audiotheque-cover-").suffix(mime.suffix());
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            path: file.into_temp_path(),
            mime,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime(&self) -> ArtworkMime {
        self.mime
    }

    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    /// Delete the temp file now.
    pub fn release(self) {
        let location = self.path.to_path_buf();
        if let Err(error) = self.path.close() {
            warn!(target: "artwork", path = %location.display(), error = %error, "failed to remove temporary artwork");
        }
    }
}

// ============================================================================
// Run accounting
// ============================================================================

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    AlreadyTagged,
    Updated,
    Skipped,
    Failed,
    /// The run was stopped while this file was being processed.
    Stopped,
}

/// Counters accumulated over a run and returned at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_found: usize,
    pub already_tagged: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn new(total_found: usize) -> Self {
        Self {
            total_found,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::AlreadyTagged => self.already_tagged += 1,
            FileOutcome::Updated => self.updated += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed => self.errors += 1,
            FileOutcome::Stopped => {}
        }
    }

    pub fn skipped_or_errored(&self) -> usize {
        self.skipped + self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_format_from_extension() {
        assert_eq!(ContainerFormat::from_extension("MP3"), Some(ContainerFormat::Mp3));
        assert_eq!(ContainerFormat::from_extension("flac"), Some(ContainerFormat::Flac));
        assert_eq!(ContainerFormat::from_extension("ogg"), Some(ContainerFormat::OggVorbis));
        assert_eq!(ContainerFormat::from_extension("opus"), Some(ContainerFormat::OggOpus));
        assert_eq!(ContainerFormat::from_extension("m4a"), Some(ContainerFormat::Mp4));
        assert_eq!(ContainerFormat::from_extension("wav"), None);
    }

    #[test]
    fn audio_track_stem_and_format() {
        let track = AudioTrack::new("/music/Daft Punk - One More Time.flac");
        assert_eq!(track.stem(), "Daft Punk - One More Time");
        assert_eq!(track.format, Some(ContainerFormat::Flac));
        assert!(!track.already_tagged);
        assert!(track.with_existing_tags(true).already_tagged);
    }

    #[test]
    fn provenance_musicbrainz_sources() {
        assert!(Provenance::Fingerprint.is_musicbrainz());
        assert!(Provenance::TextSearch.is_musicbrainz());
        assert!(!Provenance::FilenameRaw.is_musicbrainz());
        assert!(!Provenance::Manual.is_musicbrainz());
        assert!(Provenance::Fingerprint.to_string().starts_with("MusicBrainz"));
    }

    #[test]
    fn filename_candidate_has_no_musicbrainz_data() {
        let candidate = CandidateRecord::from_filename("", "Intro");
        assert_eq!(candidate.provenance, Provenance::FilenameRaw);
        assert!(candidate.release_id.is_none());
        assert!(candidate.album.is_empty());
        assert!(!candidate.is_complete());
    }

    #[test]
    fn resolved_metadata_write_guard() {
        let empty = ResolvedMetadata::new(TrackFields::default(), Provenance::Manual);
        assert!(!empty.is_writable());

        let whitespace = ResolvedMetadata::new(
            TrackFields {
                title: "  ".to_string(),
                track_number: "3".to_string(),
                ..TrackFields::default()
            },
            Provenance::Manual,
        );
        assert!(!whitespace.is_writable());

        let year_only = ResolvedMetadata::new(
            TrackFields {
                year: "1999".to_string(),
                ..TrackFields::default()
            },
            Provenance::Manual,
        );
        assert!(year_only.is_writable());
    }

    #[test]
    fn year_extraction() {
        assert_eq!(year_from_date("1997-05-21").as_deref(), Some("1997"));
        assert_eq!(year_from_date("2001").as_deref(), Some("2001"));
        assert_eq!(year_from_date("19"), None);
        assert_eq!(year_from_date("abcd-01"), None);
        assert_eq!(year_from_date(""), None);
    }

    #[test]
    fn artwork_mime_from_content_type() {
        assert_eq!(ArtworkMime::from_content_type("image/PNG"), ArtworkMime::Png);
        assert_eq!(ArtworkMime::from_content_type("image/jpeg"), ArtworkMime::Jpeg);
        assert_eq!(ArtworkMime::from_content_type("application/octet-stream"), ArtworkMime::Jpeg);
        assert_eq!(ArtworkMime::Png.suffix(), ".png");
    }

    #[test]
    fn artwork_buffer_is_removed_on_release_and_drop() {
        let dir = tempfile::tempdir().unwrap();

        let released = ArtworkBuffer::write(Some(dir.path()), b"jpeg bytes", ArtworkMime::Jpeg).unwrap();
        let released_path = released.path().to_path_buf();
        assert!(released_path.exists());
        assert_eq!(released.read_bytes().unwrap(), b"jpeg bytes");
        assert!(released_path.to_string_lossy().ends_with(".jpg"));
        released.release();
        assert!(!released_path.exists());

        let dropped = ArtworkBuffer::write(Some(dir.path()), b"png bytes", ArtworkMime::Png).unwrap();
        let dropped_path = dropped.path().to_path_buf();
        drop(dropped);
        assert!(!dropped_path.exists());

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn releasing_vanished_artwork_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let artwork = ArtworkBuffer::write(Some(dir.path()), b"jpeg bytes", ArtworkMime::Jpeg).unwrap();
        std::fs::remove_file(artwork.path()).unwrap();

        artwork.release();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn run_summary_accumulates() {
        let mut summary = RunSummary::new(5);
        summary.record(FileOutcome::AlreadyTagged);
        summary.record(FileOutcome::Updated);
        summary.record(FileOutcome::Skipped);
        summary.record(FileOutcome::Failed);
        summary.record(FileOutcome::Stopped);
        assert_eq!(summary.total_found, 5);
        assert_eq!(summary.already_tagged, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped_or_errored(), 2);
    }
}
