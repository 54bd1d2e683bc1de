// SPDX-License-Identifier: GPL-3.0-or-later

//! Inspection of tags already present in a file.
//!
//! A file counts as tagged when its primary tag has a non-empty title,
//! artist and album. Such files are left alone and cost no lookups.

use lofty::prelude::*;
use lofty::probe::Probe;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EmbeddedTagError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read tags: {0}")]
    Read(#[from] lofty::error::LoftyError),

    #[error("Failed to open file: {0}")]
    Io(#[from] std::io::Error),
}

pub type EmbeddedTagResult<T> = Result<T, EmbeddedTagError>;

/// Which of the essential fields are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EssentialTags {
    pub title: bool,
    pub artist: bool,
    pub album: bool,
}

impl EssentialTags {
    pub fn is_complete(&self) -> bool {
        self.title && self.artist && self.album
    }
}

fn present(value: Option<std::borrow::Cow<'_, str>>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Read the essential fields of the primary tag.
pub fn read_essential_tags(path: impl AsRef<Path>) -> EmbeddedTagResult<EssentialTags> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EmbeddedTagError::FileNotFound(path.display().to_string()));
    }

    let tagged = Probe::open(path)?.guess_file_type()?.read()?;
    let Some(tag) = tagged.primary_tag() else {
        return Ok(EssentialTags::default());
    };

    Ok(EssentialTags {
        title: present(tag.title()),
        artist: present(tag.artist()),
        album: present(tag.album()),
    })
}

/// True when title, artist and album are all set. Unreadable files count
/// as untagged.
pub fn has_essential_tags(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match read_essential_tags(path) {
        Ok(tags) => {
            debug!(target: "tagging", file = %path.display(), ?tags, "existing tags");
            tags.is_complete()
        }
        Err(error) => {
            warn!(target: "tagging", file = %path.display(), error = %error, "could not read existing tags");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag_writer::tests::write_flac_fixture;
    use crate::tag_writer::TagWriter;
    use audiotheque_domain::{Provenance, ResolvedMetadata, TrackFields};

    fn write(path: &Path, title: &str, artist: &str, album: &str) {
        let fields = TrackFields {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            ..TrackFields::default()
        };
        TagWriter::new()
            .write(path, ResolvedMetadata::new(fields, Provenance::Manual))
            .unwrap();
    }

    #[test]
    fn missing_file_is_an_error_and_untagged() {
        let result = read_essential_tags("does_not_exist.mp3");
        assert!(matches!(result, Err(EmbeddedTagError::FileNotFound(_))));
        assert!(!has_essential_tags("does_not_exist.mp3"));
    }

    #[test]
    fn untagged_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_flac_fixture(dir.path(), "bare.flac");
        assert_eq!(read_essential_tags(&path).unwrap(), EssentialTags::default());
        assert!(!has_essential_tags(&path));
    }

    #[test]
    fn fully_tagged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_flac_fixture(dir.path(), "tagged.flac");
        write(&path, "Airbag", "Radiohead", "OK Computer");
        assert!(has_essential_tags(&path));
    }

    #[test]
    fn missing_album_is_not_enough() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_flac_fixture(dir.path(), "partial.flac");
        write(&path, "Airbag", "Radiohead", "");

        let tags = read_essential_tags(&path).unwrap();
        assert!(tags.title && tags.artist && !tags.album);
        assert!(!has_essential_tags(&path));
    }

    #[test]
    fn garbage_file_counts_as_untagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"not audio at all").unwrap();
        assert!(!has_essential_tags(&path));
    }
}
