// SPDX-License-Identifier: GPL-3.0-or-later

//! User decisions needed while resolving a file.
//!
//! Prompts return typed values. `Decision::Cancelled` (Esc, Ctrl-C, closed
//! terminal) is always treated as a request to stop the whole run.

use crate::candidate_selection::CandidateChoice;
use crate::resolution::Suggestion;
use audiotheque_domain::{CandidateRecord, TrackFields};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<T> {
    Chosen(T),
    Cancelled,
}

/// Review menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Accept,
    Modify,
    Manual,
    Skip,
    Stop,
}

impl ReviewAction {
    pub const WITH_SUGGESTION: [ReviewAction; 5] = [
        ReviewAction::Accept,
        ReviewAction::Modify,
        ReviewAction::Manual,
        ReviewAction::Skip,
        ReviewAction::Stop,
    ];

    /// Accept and Modify are only offered when there is something to accept.
    pub const WITHOUT_SUGGESTION: [ReviewAction; 3] =
        [ReviewAction::Manual, ReviewAction::Skip, ReviewAction::Stop];

    pub fn offered(has_suggestion: bool) -> &'static [ReviewAction] {
        if has_suggestion {
            &Self::WITH_SUGGESTION
        } else {
            &Self::WITHOUT_SUGGESTION
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReviewAction::Accept => "Accept suggestion",
            ReviewAction::Modify => "Modify suggestion",
            ReviewAction::Manual => "Enter manually",
            ReviewAction::Skip => "Skip this file",
            ReviewAction::Stop => "Stop",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type InteractionResult<T> = Result<Decision<T>, InteractionError>;

/// Front end driving the per-file prompts.
pub trait Interaction {
    /// Announce the file about to be processed (1-based position).
    fn file_header(&mut self, position: usize, total: usize, relative_path: &Path);

    /// Progress or status line.
    fn notice(&mut self, message: &str);

    /// Pick among several ranked candidates, or one of
    /// [`CandidateChoice::CONTROLS`].
    fn choose_candidate(&mut self, candidates: &[CandidateRecord])
        -> InteractionResult<CandidateChoice>;

    /// Show the suggestion (if any) and ask what to do with it. Only the
    /// actions in [`ReviewAction::offered`] may be returned.
    fn review(&mut self, suggestion: Option<&Suggestion>) -> InteractionResult<ReviewAction>;

    /// Prompt for title, artist, album and year, pre-filled with `defaults`.
    /// The track number is carried over from `defaults` unchanged.
    fn edit_fields(&mut self, heading: &str, defaults: &TrackFields)
        -> InteractionResult<TrackFields>;

    /// Whether to embed the fetched cover after a modification.
    fn keep_artwork(&mut self) -> InteractionResult<bool>;

    /// Asked after an unexpected failure on one file.
    fn confirm_continue_after_error(&mut self, message: &str) -> InteractionResult<bool>;
}
