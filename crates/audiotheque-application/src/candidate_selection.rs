// SPDX-License-Identifier: GPL-3.0-or-later

//! Ranking of text-search hits and disambiguation choices.

use audiotheque_domain::{CandidateRecord, Provenance};
use std::fmt;
use tracing::debug;

/// Hits scoring below this are never offered.
pub const MIN_SEARCH_SCORE: u8 = 80;

/// One raw hit from a recording text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub recording_id: Option<String>,
    pub score: u8,
    pub title: String,
    /// Joined artist credit.
    pub artist: String,
    pub first_release_title: Option<String>,
    pub first_release_year: Option<String>,
}

impl SearchHit {
    fn into_candidate(self) -> CandidateRecord {
        CandidateRecord {
            recording_id: self.recording_id,
            title: self.title,
            artist: self.artist,
            album: self.first_release_title.unwrap_or_default(),
            release_id: None,
            year: self.first_release_year.unwrap_or_default(),
            track_number: String::new(),
            score: Some(self.score),
            provenance: Provenance::TextSearch,
        }
    }

    fn is_offerable(&self) -> bool {
        self.score >= MIN_SEARCH_SCORE
            && self
                .recording_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty())
            && !self.title.trim().is_empty()
            && !self.artist.trim().is_empty()
    }
}

/// Drop weak or incomplete hits and sort the rest by descending score.
///
/// The sort is stable: equal scores keep the provider's order.
pub fn rank_hits(hits: Vec<SearchHit>) -> Vec<CandidateRecord> {
    let total = hits.len();
    let mut kept: Vec<SearchHit> = hits.into_iter().filter(SearchHit::is_offerable).collect();
    kept.sort_by(|a, b| b.score.cmp(&a.score));

    debug!(target: "selection", total, kept = kept.len(), "ranked search hits");
    kept.into_iter().map(SearchHit::into_candidate).collect()
}

/// What the ranked list calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing worth offering; fall through to the next strategy.
    Empty,
    /// Exactly one candidate; taken without asking.
    Single(CandidateRecord),
    /// Several candidates; the user must choose.
    Ambiguous(Vec<CandidateRecord>),
}

impl Selection {
    pub fn from_ranked(mut ranked: Vec<CandidateRecord>) -> Self {
        match ranked.len() {
            0 => Self::Empty,
            1 => Self::Single(ranked.remove(0)),
            _ => Self::Ambiguous(ranked),
        }
    }
}

/// Answer to the disambiguation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateChoice {
    /// Index into the offered list.
    Candidate(usize),
    /// None of these; use the raw filename guess.
    UseFilename,
    Manual,
    Skip,
    Stop,
}

impl CandidateChoice {
    /// The four entries listed after the candidates.
    pub const CONTROLS: [CandidateChoice; 4] = [
        CandidateChoice::UseFilename,
        CandidateChoice::Manual,
        CandidateChoice::Skip,
        CandidateChoice::Stop,
    ];
}

impl fmt::Display for CandidateChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateChoice::Candidate(index) => write!(f, "Candidate #{}", index + 1),
            CandidateChoice::UseFilename => write!(f, "None of these (use raw filename)"),
            CandidateChoice::Manual => write!(f, "None of these (enter manually)"),
            CandidateChoice::Skip => write!(f, "Skip this file"),
            CandidateChoice::Stop => write!(f, "Stop"),
        }
    }
}

/// Menu label: `Title - Artist (Album) [Year] (Score: N)`.
pub fn candidate_label(candidate: &CandidateRecord) -> String {
    let mut label = format!("{} - {}", candidate.title, candidate.artist);
    if !candidate.album.is_empty() {
        label.push_str(&format!(" ({})", candidate.album));
    }
    if !candidate.year.is_empty() {
        label.push_str(&format!(" [{}]", candidate.year));
    }
    if let Some(score) = candidate.score {
        label.push_str(&format!(" (Score: {})", score));
    }
    label
}
