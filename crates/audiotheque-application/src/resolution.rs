// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-file resolution cascade.
//!
//! Strategies run in order: acoustic fingerprint, then a text search built
//! from the filename, then the raw filename guess. Whatever comes out is
//! shown for review before anything is written. Fetched artwork is owned by
//! the [`Suggestion`] and released on every path that does not hand it to the
//! tag writer.

use crate::candidate_selection::{rank_hits, CandidateChoice, Selection};
use crate::filename_heuristics::{parse_stem, FilenameGuess};
use crate::interaction::{Decision, Interaction, InteractionError, ReviewAction};
use crate::ports::{ArtworkSource, FingerprintExtractor, FingerprintLookup, RecordingCatalog};
use crate::run::StopSignal;
use audiotheque_domain::{
    ArtworkBuffer, AudioTrack, CandidateRecord, Provenance, ResolvedMetadata, TrackFields,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Candidate offered for review, with its cover if one was fetched.
#[derive(Debug)]
pub struct Suggestion {
    pub candidate: CandidateRecord,
    pub artwork: Option<ArtworkBuffer>,
}

fn discard(suggestion: Option<Suggestion>) {
    if let Some(suggestion) = suggestion {
        release_artwork(suggestion.artwork);
    }
}

fn release_artwork(artwork: Option<ArtworkBuffer>) {
    if let Some(artwork) = artwork {
        artwork.release();
    }
}

/// Outcome of the cascade for one file.
#[derive(Debug)]
pub enum Resolution {
    Write(ResolvedMetadata),
    Skip,
    Stop,
}

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error(transparent)]
    Interaction(#[from] InteractionError),
}

enum TextSearchOutcome {
    Suggested(CandidateRecord),
    NoSuggestion,
    Manual,
    Skip,
    Stop,
}

pub struct ResolutionCascade {
    extractor: Arc<dyn FingerprintExtractor>,
    lookup: Arc<dyn FingerprintLookup>,
    catalog: Arc<dyn RecordingCatalog>,
    artwork: Arc<dyn ArtworkSource>,
    stop: StopSignal,
}

impl ResolutionCascade {
    pub fn new(
        extractor: Arc<dyn FingerprintExtractor>,
        lookup: Arc<dyn FingerprintLookup>,
        catalog: Arc<dyn RecordingCatalog>,
        artwork: Arc<dyn ArtworkSource>,
        stop: StopSignal,
    ) -> Self {
        Self {
            extractor,
            lookup,
            catalog,
            artwork,
            stop,
        }
    }

    /// Run the cascade and the review step for one file.
    ///
    /// Lookup failures never escape: each strategy falls through to the
    /// next. Only a broken terminal is reported as an error.
    pub async fn resolve(
        &self,
        track: &AudioTrack,
        ui: &mut dyn Interaction,
    ) -> Result<Resolution, CascadeError> {
        ui.notice("Searching by acoustic fingerprint...");
        let candidate = match self.fingerprint_candidate(track).await {
            Some(candidate) => Some(candidate),
            None => {
                if self.stop.is_requested() {
                    return Ok(Resolution::Stop);
                }
                ui.notice("No usable fingerprint match. Trying the filename...");
                match self.text_search_candidate(track, ui).await? {
                    TextSearchOutcome::Suggested(candidate) => Some(candidate),
                    TextSearchOutcome::NoSuggestion => None,
                    TextSearchOutcome::Manual => return self.manual_entry(ui),
                    TextSearchOutcome::Skip => return Ok(Resolution::Skip),
                    TextSearchOutcome::Stop => return Ok(Resolution::Stop),
                }
            }
        };

        if self.stop.is_requested() {
            return Ok(Resolution::Stop);
        }

        let suggestion = match candidate {
            Some(candidate) => Some(self.attach_artwork(candidate).await),
            None => None,
        };
        self.review(suggestion, ui)
    }

    async fn fingerprint_candidate(&self, track: &AudioTrack) -> Option<CandidateRecord> {
        let file = track.path.display().to_string();

        let fingerprint = match self.extractor.extract(&track.path).await {
            Ok(fingerprint) => fingerprint,
            Err(error) => {
                warn!(target: "resolution", file = %file, error = %error, "fingerprint unavailable");
                return None;
            }
        };

        let recording_id = match self.lookup.best_recording(&fingerprint).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                info!(target: "resolution", file = %file, "no fingerprint match");
                return None;
            }
            Err(error) => {
                warn!(target: "resolution", file = %file, error = %error, "fingerprint lookup failed");
                return None;
            }
        };

        match self.catalog.recording_details(&recording_id).await {
            Ok(details) => Some(details.into_candidate(Provenance::Fingerprint))
                .filter(CandidateRecord::is_complete),
            Err(error) => {
                warn!(target: "resolution", file = %file, recording = %recording_id, error = %error, "recording details unavailable");
                None
            }
        }
    }

    async fn text_search_candidate(
        &self,
        track: &AudioTrack,
        ui: &mut dyn Interaction,
    ) -> Result<TextSearchOutcome, CascadeError> {
        let Some(guess) = parse_stem(&track.stem()).filter(FilenameGuess::is_usable) else {
            ui.notice("Nothing usable in the filename.");
            return Ok(TextSearchOutcome::NoSuggestion);
        };

        let hits = if guess.title.is_empty() {
            Vec::new()
        } else {
            match self
                .catalog
                .search_recordings(&guess.artist, &guess.title)
                .await
            {
                Ok(hits) => hits,
                Err(error) => {
                    warn!(target: "resolution", error = %error, "text search failed");
                    Vec::new()
                }
            }
        };

        let chosen = match Selection::from_ranked(rank_hits(hits)) {
            Selection::Empty => {
                ui.notice("No close text match. Using the filename as is.");
                None
            }
            Selection::Single(candidate) => {
                ui.notice("One close text match, selected automatically.");
                Some(candidate)
            }
            Selection::Ambiguous(mut candidates) => match ui.choose_candidate(&candidates)? {
                Decision::Cancelled | Decision::Chosen(CandidateChoice::Stop) => {
                    return Ok(TextSearchOutcome::Stop)
                }
                Decision::Chosen(CandidateChoice::Skip) => return Ok(TextSearchOutcome::Skip),
                Decision::Chosen(CandidateChoice::Manual) => {
                    return Ok(TextSearchOutcome::Manual)
                }
                Decision::Chosen(CandidateChoice::UseFilename) => None,
                Decision::Chosen(CandidateChoice::Candidate(index)) => {
                    if index < candidates.len() {
                        Some(candidates.swap_remove(index))
                    } else {
                        warn!(target: "resolution", index, "candidate index out of range");
                        None
                    }
                }
            },
        };

        if let Some(chosen) = chosen {
            if let Some(recording_id) = chosen.recording_id.as_deref() {
                match self.catalog.recording_details(recording_id).await {
                    Ok(details) => {
                        let mut candidate = details.into_candidate(Provenance::TextSearch);
                        candidate.score = chosen.score;
                        if candidate.is_complete() {
                            return Ok(TextSearchOutcome::Suggested(candidate));
                        }
                    }
                    Err(error) => {
                        warn!(target: "resolution", recording = %recording_id, error = %error, "recording details unavailable");
                    }
                }
            }
        }

        debug!(target: "resolution", artist = %guess.artist, title = %guess.title, "falling back to filename");
        Ok(TextSearchOutcome::Suggested(CandidateRecord::from_filename(
            guess.artist,
            guess.title,
        )))
    }

    /// Cover art is only looked up for MusicBrainz-backed candidates with a
    /// release; a failed fetch leaves the suggestion without one.
    async fn attach_artwork(&self, candidate: CandidateRecord) -> Suggestion {
        let release_id = candidate
            .release_id
            .as_deref()
            .filter(|_| candidate.provenance.is_musicbrainz());

        let artwork = match release_id {
            Some(release_id) => match self.artwork.fetch_front_cover(release_id).await {
                Ok(artwork) => artwork,
                Err(error) => {
                    warn!(target: "resolution", release = %release_id, error = %error, "cover art unavailable");
                    None
                }
            },
            None => None,
        };

        Suggestion { candidate, artwork }
    }

    fn review(
        &self,
        suggestion: Option<Suggestion>,
        ui: &mut dyn Interaction,
    ) -> Result<Resolution, CascadeError> {
        let action = ui.review(suggestion.as_ref())?;

        match (action, suggestion) {
            (Decision::Cancelled | Decision::Chosen(ReviewAction::Stop), suggestion) => {
                discard(suggestion);
                Ok(Resolution::Stop)
            }
            (Decision::Chosen(ReviewAction::Skip), suggestion) => {
                discard(suggestion);
                Ok(Resolution::Skip)
            }
            (Decision::Chosen(ReviewAction::Manual), suggestion) => {
                discard(suggestion);
                self.manual_entry(ui)
            }
            (Decision::Chosen(ReviewAction::Accept), Some(Suggestion { candidate, artwork })) => {
                self.finish(
                    ResolvedMetadata::new(candidate.fields(), candidate.provenance)
                        .with_artwork(artwork),
                    ui,
                )
            }
            (Decision::Chosen(ReviewAction::Modify), Some(Suggestion { candidate, artwork })) => {
                let fields = match ui.edit_fields("Modify suggestion", &candidate.fields())? {
                    Decision::Chosen(fields) => fields,
                    Decision::Cancelled => {
                        release_artwork(artwork);
                        return Ok(Resolution::Stop);
                    }
                };

                let artwork = match artwork {
                    Some(artwork) => match ui.keep_artwork()? {
                        Decision::Chosen(true) => Some(artwork),
                        Decision::Chosen(false) => {
                            artwork.release();
                            None
                        }
                        Decision::Cancelled => {
                            artwork.release();
                            return Ok(Resolution::Stop);
                        }
                    },
                    None => None,
                };

                self.finish(
                    ResolvedMetadata::new(fields, candidate.provenance).with_artwork(artwork),
                    ui,
                )
            }
            (Decision::Chosen(action @ (ReviewAction::Accept | ReviewAction::Modify)), None) => {
                warn!(target: "resolution", action = %action, "nothing to act on; skipping");
                Ok(Resolution::Skip)
            }
        }
    }

    /// Manual entry never carries artwork.
    fn manual_entry(&self, ui: &mut dyn Interaction) -> Result<Resolution, CascadeError> {
        match ui.edit_fields("Manual entry", &TrackFields::default())? {
            Decision::Chosen(fields) => {
                self.finish(ResolvedMetadata::new(fields, Provenance::Manual), ui)
            }
            Decision::Cancelled => Ok(Resolution::Stop),
        }
    }

    fn finish(
        &self,
        resolved: ResolvedMetadata,
        ui: &mut dyn Interaction,
    ) -> Result<Resolution, CascadeError> {
        if resolved.is_writable() {
            return Ok(Resolution::Write(resolved));
        }

        ui.notice("No metadata to write. Skipping.");
        release_artwork(resolved.artwork);
        Ok(Resolution::Skip)
    }
}
