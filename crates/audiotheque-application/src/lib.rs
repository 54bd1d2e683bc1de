// SPDX-License-Identifier: GPL-3.0-or-later
pub mod adapters;
pub mod candidate_selection;
pub mod embedded_tags;
pub mod filename_heuristics;
pub mod interaction;
pub mod library;
pub mod ports;
pub mod resolution;
pub mod run;
pub mod tag_writer;

pub use adapters::MusicBrainzCatalog;
pub use candidate_selection::{candidate_label, rank_hits, CandidateChoice, SearchHit, Selection, MIN_SEARCH_SCORE};
pub use embedded_tags::{has_essential_tags, EmbeddedTagError};
pub use filename_heuristics::{clean_stem, parse_stem, FilenameGuess};
pub use interaction::{Decision, Interaction, InteractionError, InteractionResult, ReviewAction};
pub use library::{scan_library, LibraryError, LibraryScan};
pub use ports::{ArtworkSource, FingerprintExtractor, FingerprintLookup, RecordingCatalog, RecordingDetails};
pub use resolution::{CascadeError, Resolution, ResolutionCascade, Suggestion};
pub use run::{LibraryTagger, StopSignal};
pub use tag_writer::{ArtworkOutcome, ContainerTagger, TagWriteError, TagWriter, WriteReport};

use audiotheque_config::AppConfig;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn on_start(&self) {
        info!(
            target: "application",
            root = %self.config.library.root_path().display(),
            "application state initialized"
        );
    }
}
