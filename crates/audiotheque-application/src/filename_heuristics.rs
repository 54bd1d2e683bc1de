// SPDX-License-Identifier: GPL-3.0-or-later

//! Filename-based artist/title guessing.
//!
//! Downloaded files are often named `NN - Artist - Title (Official Video) [1080p]`.
//! The parser strips that noise and splits on the first `" - "`. It never
//! touches the filesystem or the network.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Artist/title pair guessed from a filename stem. `artist` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameGuess {
    pub artist: String,
    pub title: String,
}

impl FilenameGuess {
    /// Something to search for or fall back on.
    pub fn is_usable(&self) -> bool {
        !self.artist.is_empty() || !self.title.is_empty()
    }
}

lazy_static! {
    // Order matters: each substitution feeds the next.
    static ref NOISE_PATTERNS: Vec<Regex> = [
        r"(?i)\[[^\]]+\]$",
        r"(?i)\([^)]*official[^)]*\)",
        r"(?i)\([^)]*lyric[^)]*\)",
        r"(?i)\([^)]*audio[^)]*\)",
        r"(?i)\s*HD$",
        r"(?i)\s*4K$",
        r"(?i)^\d+\s*-\s*",
        r"(?i)\([^)]*visualizer[^)]*\)",
        r"(?i)\([^)]*music video[^)]*\)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect();
}

const SEPARATOR: &str = " - ";

fn strip_once(text: &str) -> String {
    NOISE_PATTERNS.iter().fold(text.trim().to_string(), |text, pattern| {
        pattern.replace_all(&text, "").trim().to_string()
    })
}

/// Remove download noise from a stem.
///
/// The pattern set is re-applied until the text stops changing, so
/// `clean_stem(clean_stem(s)) == clean_stem(s)` for every input.
pub fn clean_stem(stem: &str) -> String {
    let mut current = strip_once(stem);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Guess artist and title from a filename stem (extension already removed).
///
/// Returns `None` when nothing is left after cleaning.
pub fn parse_stem(stem: &str) -> Option<FilenameGuess> {
    let cleaned = clean_stem(stem);
    if cleaned.is_empty() {
        debug!(target: "filename", stem = %stem, "nothing left after cleaning");
        return None;
    }

    let guess = match cleaned.split_once(SEPARATOR) {
        Some((artist, title)) => FilenameGuess {
            artist: artist.trim().to_string(),
            title: title.trim().to_string(),
        },
        None => FilenameGuess {
            artist: String::new(),
            title: cleaned,
        },
    };

    debug!(
        target: "filename",
        stem = %stem,
        artist = %guess.artist,
        title = %guess.title,
        "parsed filename"
    );
    Some(guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guess(artist: &str, title: &str) -> Option<FilenameGuess> {
        Some(FilenameGuess {
            artist: artist.to_string(),
            title: title.to_string(),
        })
    }

    #[test]
    fn strips_track_prefix_and_official_marker() {
        assert_eq!(
            parse_stem("05 - Daft Punk - One More Time (Official Video)"),
            guess("Daft Punk", "One More Time")
        );
    }

    #[test]
    fn simple_artist_title() {
        assert_eq!(parse_stem("A - B"), guess("A", "B"));
    }

    #[test]
    fn splits_on_first_separator_only() {
        assert_eq!(
            parse_stem("Artist - Title - Live at Wembley"),
            guess("Artist", "Title - Live at Wembley")
        );
    }

    #[test]
    fn no_separator_goes_to_title() {
        assert_eq!(parse_stem("Intro"), guess("", "Intro"));
        assert_eq!(parse_stem("Artist-Title"), guess("", "Artist-Title"));
    }

    #[test]
    fn strips_trailing_bracket_and_quality_markers() {
        assert_eq!(
            parse_stem("Queen - Bohemian Rhapsody [Remastered 2011]"),
            guess("Queen", "Bohemian Rhapsody")
        );
        assert_eq!(parse_stem("Muse - Uprising HD"), guess("Muse", "Uprising"));
        assert_eq!(parse_stem("Muse - Uprising 4k"), guess("Muse", "Uprising"));
    }

    #[test]
    fn strips_parenthetical_markers_case_insensitively() {
        assert_eq!(
            parse_stem("Adele - Hello (LYRICS)"),
            guess("Adele", "Hello")
        );
        assert_eq!(
            parse_stem("Adele - Hello (Official Audio)"),
            guess("Adele", "Hello")
        );
        assert_eq!(
            parse_stem("Tame Impala - Borderline (Visualizer)"),
            guess("Tame Impala", "Borderline")
        );
        assert_eq!(
            parse_stem("Blur - Song 2 (Music Video)"),
            guess("Blur", "Song 2")
        );
    }

    #[test]
    fn keeps_unrelated_parentheticals() {
        assert_eq!(
            parse_stem("Nirvana - Lithium (Live)"),
            guess("Nirvana", "Lithium (Live)")
        );
    }

    #[test]
    fn empty_after_cleaning_is_none() {
        assert_eq!(parse_stem(""), None);
        assert_eq!(parse_stem("   "), None);
        assert_eq!(parse_stem("[1080p]"), None);
        assert_eq!(parse_stem("(Official Video)"), None);
    }

    #[test]
    fn leading_number_without_dash_is_kept() {
        assert_eq!(parse_stem("10 Years - Wasteland"), guess("10 Years", "Wasteland"));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let stems = [
            "05 - Daft Punk - One More Time (Official Video)",
            "01 - 02 - Song",
            "Song [a] [b]",
            "Track HD 4K HD",
            "Nirvana - Lithium (Live)",
            "",
            "  spaced  ",
        ];
        for stem in stems {
            let once = clean_stem(stem);
            assert_eq!(clean_stem(&once), once, "stem: {:?}", stem);
        }
    }

    #[test]
    fn usable_guess() {
        assert!(FilenameGuess { artist: String::new(), title: "x".into() }.is_usable());
        assert!(!FilenameGuess::default().is_usable());
    }
}
