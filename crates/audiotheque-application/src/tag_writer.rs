// SPDX-License-Identifier: GPL-3.0-or-later

//! Writing resolved metadata into audio files.
//!
//! Text fields go through lofty's generic tag model for every container.
//! Artwork differs per family: ID3v2, FLAC and MP4 take an embedded front
//! cover, Ogg Vorbis/Opus take a `METADATA_BLOCK_PICTURE` comment, anything
//! else gets text only and a warning.

use audiotheque_domain::{ArtworkBuffer, ArtworkMime, ContainerFormat, ResolvedMetadata, TrackFields};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lofty::config::WriteOptions;
use lofty::error::LoftyError;
use lofty::file::{FileType, TaggedFile};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemValue, Tag, TagItem, TagType};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Vorbis comment key holding a picture.
pub const PICTURE_COMMENT: &str = "METADATA_BLOCK_PICTURE";

const ID3V2_HEADER_LEN: u64 = 10;

#[derive(Debug, Error)]
pub enum TagWriteError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: LoftyError,
    },

    #[error("Failed to detect the container of {path}: {source}")]
    Detect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognised audio container: {0}")]
    UnknownFormat(PathBuf),

    #[error("{0} has no FLAC metadata block after STREAMINFO to rewrite")]
    StreamInfoOnly(PathBuf),

    #[error("{path} does not accept {tag_type:?} tags")]
    TagUnsupported { path: PathBuf, tag_type: TagType },

    #[error("Failed to save tags to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: LoftyError,
    },

    #[error("Failed to read artwork: {0}")]
    Artwork(#[from] std::io::Error),

    #[error("Nothing to write")]
    NothingToWrite,
}

pub type TagWriteResult<T> = Result<T, TagWriteError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkOutcome {
    Embedded,
    /// The container has no artwork path; text tags were still written.
    Unsupported,
    NotRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    /// `None` for containers outside the five supported families.
    pub family: Option<ContainerFormat>,
    pub artwork: ArtworkOutcome,
}

impl WriteReport {
    pub fn is_partial(&self) -> bool {
        self.artwork == ArtworkOutcome::Unsupported
    }
}

/// One container family's way of storing tags.
pub trait ContainerTagger {
    fn family(&self) -> Option<ContainerFormat>;

    /// Refuse layouts that cannot be rewritten in place.
    fn check_layout(&self, _path: &Path) -> TagWriteResult<()> {
        Ok(())
    }

    /// Replace the text fields. Empty values are not written.
    fn write_text_tags(&self, path: &Path, fields: &TrackFields) -> TagWriteResult<()> {
        write_text_fields(path, fields)
    }

    /// Replace any existing artwork with `artwork` as the front cover.
    fn attach_artwork(&self, path: &Path, artwork: &ArtworkBuffer)
        -> TagWriteResult<ArtworkOutcome>;
}

/// ID3v2 in MP3 (and raw AAC).
pub struct Id3Tagger;

pub struct FlacTagger;

pub struct Mp4Tagger;

/// Vorbis comments inside an Ogg stream.
pub struct OggCommentTagger {
    family: ContainerFormat,
}

/// Containers with a tag format but no artwork handling here.
pub struct TextOnlyTagger {
    file_type: FileType,
}

impl ContainerTagger for Id3Tagger {
    fn family(&self) -> Option<ContainerFormat> {
        Some(ContainerFormat::Mp3)
    }

    fn attach_artwork(&self, path: &Path, artwork: &ArtworkBuffer) -> TagWriteResult<ArtworkOutcome> {
        replace_embedded_picture(path, artwork)
    }
}

impl ContainerTagger for FlacTagger {
    fn family(&self) -> Option<ContainerFormat> {
        Some(ContainerFormat::Flac)
    }

    fn check_layout(&self, path: &Path) -> TagWriteResult<()> {
        ensure_block_after_stream_info(path)
    }

    fn attach_artwork(&self, path: &Path, artwork: &ArtworkBuffer) -> TagWriteResult<ArtworkOutcome> {
        replace_embedded_picture(path, artwork)
    }
}

impl ContainerTagger for Mp4Tagger {
    fn family(&self) -> Option<ContainerFormat> {
        Some(ContainerFormat::Mp4)
    }

    fn attach_artwork(&self, path: &Path, artwork: &ArtworkBuffer) -> TagWriteResult<ArtworkOutcome> {
        replace_embedded_picture(path, artwork)
    }
}

impl ContainerTagger for OggCommentTagger {
    fn family(&self) -> Option<ContainerFormat> {
        Some(self.family)
    }

    fn attach_artwork(&self, path: &Path, artwork: &ArtworkBuffer) -> TagWriteResult<ArtworkOutcome> {
        let uri = picture_data_uri(artwork.mime(), &artwork.read_bytes()?);
        let mut tagged = open_tagged(path)?;
        let tag = primary_tag_mut(&mut tagged, path)?;

        remove_all_pictures(tag);
        tag.retain(|item| !is_picture_comment(item));
        tag.insert_unchecked(TagItem::new(
            ItemKey::Unknown(PICTURE_COMMENT.to_string()),
            ItemValue::Text(uri),
        ));

        save(tag, path)?;
        Ok(ArtworkOutcome::Embedded)
    }
}

impl ContainerTagger for TextOnlyTagger {
    fn family(&self) -> Option<ContainerFormat> {
        None
    }

    fn attach_artwork(&self, path: &Path, _artwork: &ArtworkBuffer) -> TagWriteResult<ArtworkOutcome> {
        warn!(
            target: "tagging",
            file = %path.display(),
            file_type = ?self.file_type,
            "cover art is not supported for this container"
        );
        Ok(ArtworkOutcome::Unsupported)
    }
}

/// Pick the tagger from the file's content, not its extension.
pub fn tagger_for(path: &Path) -> TagWriteResult<Box<dyn ContainerTagger>> {
    let probe = Probe::open(path)
        .map_err(|source| TagWriteError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .guess_file_type()
        .map_err(|source| TagWriteError::Detect {
            path: path.to_path_buf(),
            source,
        })?;

    let tagger: Box<dyn ContainerTagger> = match probe.file_type() {
        Some(FileType::Mpeg) | Some(FileType::Aac) => Box::new(Id3Tagger),
        Some(FileType::Flac) => Box::new(FlacTagger),
        Some(FileType::Vorbis) => Box::new(OggCommentTagger {
            family: ContainerFormat::OggVorbis,
        }),
        Some(FileType::Opus) => Box::new(OggCommentTagger {
            family: ContainerFormat::OggOpus,
        }),
        Some(FileType::Mp4) => Box::new(Mp4Tagger),
        Some(file_type) => Box::new(TextOnlyTagger { file_type }),
        None => return Err(TagWriteError::UnknownFormat(path.to_path_buf())),
    };
    Ok(tagger)
}

/// `data:<mime>;base64,<payload>`, the value stored under
/// [`PICTURE_COMMENT`] for Ogg files.
pub fn picture_data_uri(mime: ArtworkMime, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime.as_str(), STANDARD.encode(bytes))
}

fn is_picture_comment(item: &TagItem) -> bool {
    matches!(item.key(), ItemKey::Unknown(key) if key.eq_ignore_ascii_case(PICTURE_COMMENT))
}

fn open_tagged(path: &Path) -> TagWriteResult<TaggedFile> {
    let open_error = |source| TagWriteError::Open {
        path: path.to_path_buf(),
        source,
    };
    Probe::open(path)
        .map_err(open_error)?
        .guess_file_type()
        .map_err(|source| TagWriteError::Detect {
            path: path.to_path_buf(),
            source,
        })?
        .read()
        .map_err(open_error)
}

fn primary_tag_mut<'a>(tagged: &'a mut TaggedFile, path: &Path) -> TagWriteResult<&'a mut Tag> {
    let tag_type = tagged.primary_tag_type();
    if tagged.tag(tag_type).is_none() {
        tagged.insert_tag(Tag::new(tag_type));
    }
    tagged
        .tag_mut(tag_type)
        .ok_or_else(|| TagWriteError::TagUnsupported {
            path: path.to_path_buf(),
            tag_type,
        })
}

fn save(tag: &Tag, path: &Path) -> TagWriteResult<()> {
    tag.save_to_path(path, WriteOptions::default())
        .map_err(|source| TagWriteError::Save {
            path: path.to_path_buf(),
            source,
        })
}

/// lofty's FLAC writer needs another metadata block after STREAMINFO; a
/// file whose only block is STREAMINFO would be corrupted or abort the run.
fn ensure_block_after_stream_info(path: &Path) -> TagWriteResult<()> {
    let detect_error = |source| TagWriteError::Detect {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(detect_error)?;
    let mut marker = [0u8; 4];
    file.read_exact(&mut marker).map_err(detect_error)?;

    // Skip a leading ID3v2 tag: minor version, flags, then a syncsafe size.
    if marker[..3] == *b"ID3" {
        let mut header = [0u8; 6];
        file.read_exact(&mut header).map_err(detect_error)?;
        let size = header[2..]
            .iter()
            .fold(0u64, |size, byte| (size << 7) | u64::from(byte & 0x7F));
        let footer = if header[1] & 0x10 != 0 { ID3V2_HEADER_LEN } else { 0 };
        file.seek(SeekFrom::Start(ID3V2_HEADER_LEN + size + footer))
            .map_err(detect_error)?;
        file.read_exact(&mut marker).map_err(detect_error)?;
    }

    if marker != *b"fLaC" {
        return Ok(());
    }

    let mut block_header = [0u8; 1];
    file.read_exact(&mut block_header).map_err(detect_error)?;
    let last_block = block_header[0] & 0x80 != 0;
    let stream_info = block_header[0] & 0x7F == 0;
    if last_block && stream_info {
        return Err(TagWriteError::StreamInfoOnly(path.to_path_buf()));
    }
    Ok(())
}

fn remove_all_pictures(tag: &mut Tag) {
    while !tag.pictures().is_empty() {
        tag.remove_picture(0);
    }
}

fn write_text_fields(path: &Path, fields: &TrackFields) -> TagWriteResult<()> {
    let mut tagged = open_tagged(path)?;
    let primary = tagged.primary_tag_type();
    let secondary: Vec<TagType> = tagged
        .tags()
        .iter()
        .map(Tag::tag_type)
        .filter(|tag_type| *tag_type != primary)
        .collect();

    let tag = primary_tag_mut(&mut tagged, path)?;
    tag.clear();

    let entries = [
        (ItemKey::TrackTitle, &fields.title),
        (ItemKey::TrackArtist, &fields.artist),
        (ItemKey::AlbumTitle, &fields.album),
        (ItemKey::RecordingDate, &fields.year),
        (ItemKey::TrackNumber, &fields.track_number),
    ];
    for (key, value) in entries {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if !tag.insert_text(key.clone(), value.to_string()) {
            debug!(target: "tagging", key = ?key, value = %value, "value not accepted by this tag format");
        }
    }

    save(tag, path)?;
    strip_secondary_tags(path, &secondary);
    Ok(())
}

/// An ID3v1 trailer, APE tag or RIFF INFO list left in place would still
/// carry the old values, and some players read those first.
fn strip_secondary_tags(path: &Path, tag_types: &[TagType]) {
    for tag_type in tag_types {
        match tag_type.remove_from_path(path) {
            Ok(()) => debug!(target: "tagging", file = %path.display(), ?tag_type, "removed secondary tag"),
            Err(error) => warn!(
                target: "tagging",
                file = %path.display(),
                ?tag_type,
                error = %error,
                "could not remove secondary tag"
            ),
        }
    }
}

fn replace_embedded_picture(path: &Path, artwork: &ArtworkBuffer) -> TagWriteResult<ArtworkOutcome> {
    let data = artwork.read_bytes()?;
    let mime = match artwork.mime() {
        ArtworkMime::Jpeg => MimeType::Jpeg,
        ArtworkMime::Png => MimeType::Png,
    };

    let mut tagged = open_tagged(path)?;
    let tag = primary_tag_mut(&mut tagged, path)?;
    remove_all_pictures(tag);
    tag.push_picture(Picture::new_unchecked(
        PictureType::CoverFront,
        Some(mime),
        None,
        data,
    ));

    save(tag, path)?;
    Ok(ArtworkOutcome::Embedded)
}

/// Writes [`ResolvedMetadata`] using the right [`ContainerTagger`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TagWriter;

impl TagWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write text tags, then artwork. The artwork temp file is removed
    /// whatever happens.
    pub fn write(&self, path: &Path, resolved: ResolvedMetadata) -> TagWriteResult<WriteReport> {
        let ResolvedMetadata {
            fields,
            provenance,
            artwork,
        } = resolved;

        let result = Self::apply(path, &fields, artwork.as_ref());
        if let Some(artwork) = artwork {
            artwork.release();
        }

        if let Ok(report) = &result {
            info!(
                target: "tagging",
                file = %path.display(),
                provenance = %provenance,
                artwork = ?report.artwork,
                "tags written"
            );
        }
        result
    }

    fn apply(
        path: &Path,
        fields: &TrackFields,
        artwork: Option<&ArtworkBuffer>,
    ) -> TagWriteResult<WriteReport> {
        if !fields.has_content() {
            return Err(TagWriteError::NothingToWrite);
        }

        let tagger = tagger_for(path)?;
        tagger.check_layout(path)?;
        tagger.write_text_tags(path, fields)?;

        let artwork = match artwork {
            Some(artwork) => tagger.attach_artwork(path, artwork)?,
            None => ArtworkOutcome::NotRequested,
        };

        Ok(WriteReport {
            family: tagger.family(),
            artwork,
        })
    }
}
