// SPDX-License-Identifier: GPL-3.0-or-later

//! Discovery of audio files under the library root.

use audiotheque_domain::AudioTrack;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Music directory does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Music directory is not a directory: {0}")]
    NotADirectory(PathBuf),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Audio files found under a root, in path order.
#[derive(Debug, Clone)]
pub struct LibraryScan {
    pub root: PathBuf,
    pub tracks: Vec<AudioTrack>,
}

impl LibraryScan {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Path relative to the root, for display.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

fn has_audio_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Recursively collect files whose extension is in `extensions`
/// (case-insensitive). Unreadable entries are logged and skipped.
pub fn scan_library(root: &Path, extensions: &[String]) -> LibraryResult<LibraryScan> {
    if !root.exists() {
        return Err(LibraryError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(LibraryError::NotADirectory(root.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(target: "library", error = %error, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_audio_extension(path, extensions))
        .collect();
    paths.sort();

    info!(target: "library", root = %root.display(), files = paths.len(), "library scanned");
    Ok(LibraryScan {
        root: root.to_path_buf(),
        tracks: paths.into_iter().map(AudioTrack::new).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiotheque_domain::ContainerFormat;
    use std::fs;

    fn extensions() -> Vec<String> {
        [".mp3", ".flac", ".ogg", ".opus", ".m4a"]
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn finds_audio_recursively_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/nested")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/nested/z.FLAC"), b"").unwrap();
        fs::write(root.join("a/song.mp3"), b"").unwrap();
        fs::write(root.join("a/cover.jpg"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::write(root.join("c.opus"), b"").unwrap();

        let scan = scan_library(root, &extensions()).unwrap();
        let found: Vec<_> = scan
            .tracks
            .iter()
            .map(|t| scan.relative(&t.path).to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("a/song.mp3"),
                PathBuf::from("b/nested/z.FLAC"),
                PathBuf::from("c.opus"),
            ]
        );
        assert_eq!(scan.tracks[1].format, Some(ContainerFormat::Flac));
    }

    #[test]
    fn empty_library() {
        let dir = tempfile::tempdir().unwrap();
        let scan = scan_library(dir.path(), &extensions()).unwrap();
        assert!(scan.is_empty());
    }

    #[test]
    fn missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_library(&missing, &extensions()),
            Err(LibraryError::RootNotFound(_))
        ));
    }

    #[test]
    fn root_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.mp3");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            scan_library(&file, &extensions()),
            Err(LibraryError::NotADirectory(_))
        ));
    }
}
