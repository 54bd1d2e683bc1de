// SPDX-License-Identifier: GPL-3.0-or-later

//! The per-file loop over a scanned library.

use crate::embedded_tags::has_essential_tags;
use crate::interaction::{Decision, Interaction};
use crate::library::LibraryScan;
use crate::resolution::{CascadeError, Resolution, ResolutionCascade};
use crate::tag_writer::TagWriter;
use audiotheque_domain::{AudioTrack, FileOutcome, RunSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Cooperative stop request, shared with the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct LibraryTagger {
    cascade: ResolutionCascade,
    writer: TagWriter,
    stop: StopSignal,
}

impl LibraryTagger {
    pub fn new(cascade: ResolutionCascade, writer: TagWriter, stop: StopSignal) -> Self {
        Self {
            cascade,
            writer,
            stop,
        }
    }

    /// Process every file in order until done or stopped.
    ///
    /// Files are independent: a failure on one is counted and, if the user
    /// agrees, the run moves on to the next.
    pub async fn run(&self, scan: &LibraryScan, ui: &mut dyn Interaction) -> RunSummary {
        let total = scan.len();
        let mut summary = RunSummary::new(total);

        for (index, track) in scan.tracks.iter().enumerate() {
            if self.stop.is_requested() {
                info!(target: "run", "stop requested");
                break;
            }

            ui.file_header(index + 1, total, scan.relative(&track.path));
            let track = track
                .clone()
                .with_existing_tags(has_essential_tags(&track.path));

            match self.process(&track, ui).await {
                Ok(FileOutcome::Stopped) => {
                    info!(target: "run", file = %track.path.display(), "run stopped by user");
                    break;
                }
                Ok(outcome) => summary.record(outcome),
                Err(cascade_error) => {
                    error!(target: "run", file = %track.path.display(), error = %cascade_error, "unexpected failure");
                    summary.record(FileOutcome::Failed);

                    let message = format!("Unexpected error: {}", cascade_error);
                    match ui.confirm_continue_after_error(&message) {
                        Ok(Decision::Chosen(true)) => continue,
                        Ok(_) => break,
                        Err(prompt_error) => {
                            warn!(target: "run", error = %prompt_error, "cannot prompt; stopping");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "run",
            total = summary.total_found,
            already_tagged = summary.already_tagged,
            updated = summary.updated,
            skipped = summary.skipped,
            errors = summary.errors,
            "run finished"
        );
        summary
    }

    async fn process(
        &self,
        track: &AudioTrack,
        ui: &mut dyn Interaction,
    ) -> Result<FileOutcome, CascadeError> {
        if track.already_tagged {
            ui.notice("Essential tags already present. Skipping.");
            return Ok(FileOutcome::AlreadyTagged);
        }

        match self.cascade.resolve(track, ui).await? {
            Resolution::Write(resolved) => {
                ui.notice("Writing tags...");
                match self.writer.write(&track.path, resolved) {
                    Ok(report) => {
                        if report.is_partial() {
                            ui.notice("Tags written; cover art is not supported for this format.");
                        } else {
                            ui.notice("Tags written.");
                        }
                        Ok(FileOutcome::Updated)
                    }
                    Err(write_error) => {
                        error!(target: "run", file = %track.path.display(), error = %write_error, "tag write failed");
                        ui.notice(&format!("Failed to write tags: {}", write_error));
                        Ok(FileOutcome::Failed)
                    }
                }
            }
            Resolution::Skip => {
                ui.notice("Skipped.");
                Ok(FileOutcome::Skipped)
            }
            Resolution::Stop => Ok(FileOutcome::Stopped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{InteractionError, InteractionResult, ReviewAction};
    use crate::library::scan_library;
    use crate::resolution::tests::{
        details, FakeArtwork, FakeCatalog, FakeExtractor, FakeLookup, ScriptedInteraction,
        FP_RECORDING,
    };
    use crate::resolution::Suggestion;
    use crate::tag_writer::tests::{write_flac_fixture, write_stream_info_only_flac};
    use audiotheque_domain::{CandidateRecord, Provenance, ResolvedMetadata, TrackFields};
    use std::path::Path;

    fn tagger(dir: &Path, fingerprint_match: bool, stop: StopSignal) -> LibraryTagger {
        let catalog = FakeCatalog {
            details: [(
                FP_RECORDING.to_string(),
                details(FP_RECORDING, "One More Time", "Daft Punk"),
            )]
            .into(),
            ..FakeCatalog::default()
        };
        let cascade = ResolutionCascade::new(
            Arc::new(FakeExtractor { fail: false }),
            Arc::new(FakeLookup {
                recording: fingerprint_match.then(|| FP_RECORDING.to_string()),
            }),
            Arc::new(catalog),
            Arc::new(FakeArtwork::new(dir)),
            stop.clone(),
        );
        LibraryTagger::new(cascade, TagWriter::new(), stop)
    }

    fn library(files: &[&str]) -> (tempfile::TempDir, LibraryScan) {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            write_flac_fixture(dir.path(), name);
        }
        let scan = scan_library(dir.path(), &["flac".to_string()]).unwrap();
        (dir, scan)
    }

    #[tokio::test]
    async fn updates_then_skips_already_tagged() {
        let (dir, scan) = library(&["a.flac"]);
        let tagger = tagger(dir.path(), true, StopSignal::default());

        let mut ui = ScriptedInteraction {
            reviews: [Decision::Chosen(ReviewAction::Accept)].into(),
            ..Default::default()
        };
        let summary = tagger.run(&scan, &mut ui).await;
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.total_found, 1);
        assert_eq!(ui.headers[0].0, 1);
        assert_eq!(ui.headers[0].2, Path::new("a.flac"));

        let mut second = ScriptedInteraction::default();
        let summary = tagger.run(&scan, &mut second).await;
        assert_eq!(summary.already_tagged, 1);
        assert_eq!(summary.updated, 0);
        assert!(second.reviewed.is_empty());
    }

    #[tokio::test]
    async fn stop_keeps_earlier_counts() {
        let (dir, scan) = library(&["a.flac", "b.flac", "c.flac"]);
        let tagger = tagger(dir.path(), true, StopSignal::default());

        let mut ui = ScriptedInteraction {
            reviews: [
                Decision::Chosen(ReviewAction::Skip),
                Decision::Chosen(ReviewAction::Stop),
            ]
            .into(),
            ..Default::default()
        };
        let summary = tagger.run(&scan, &mut ui).await;

        assert_eq!(summary.total_found, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(ui.headers.len(), 2);
    }

    #[tokio::test]
    async fn pre_requested_stop_processes_nothing() {
        let (dir, scan) = library(&["a.flac"]);
        let stop = StopSignal::default();
        stop.request();
        let tagger = tagger(dir.path(), true, stop);

        let mut ui = ScriptedInteraction::default();
        let summary = tagger.run(&scan, &mut ui).await;
        assert!(ui.headers.is_empty());
        assert_eq!(summary.skipped_or_errored(), 0);
    }

    #[tokio::test]
    async fn write_failure_counts_as_error_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.flac"), b"not really flac").unwrap();
        write_flac_fixture(dir.path(), "b.flac");
        let scan = scan_library(dir.path(), &["flac".to_string()]).unwrap();
        let tagger = tagger(dir.path(), true, StopSignal::default());

        let mut ui = ScriptedInteraction {
            reviews: [
                Decision::Chosen(ReviewAction::Accept),
                Decision::Chosen(ReviewAction::Accept),
            ]
            .into(),
            ..Default::default()
        };
        let summary = tagger.run(&scan, &mut ui).await;

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped_or_errored(), 1);
    }

    #[tokio::test]
    async fn unwritable_flac_layout_fails_only_that_file() {
        let dir = tempfile::tempdir().unwrap();
        write_stream_info_only_flac(dir.path(), "a.flac");
        write_flac_fixture(dir.path(), "b.flac");
        let scan = scan_library(dir.path(), &["flac".to_string()]).unwrap();
        let tagger = tagger(dir.path(), true, StopSignal::default());

        let mut ui = ScriptedInteraction {
            reviews: [
                Decision::Chosen(ReviewAction::Accept),
                Decision::Chosen(ReviewAction::Accept),
            ]
            .into(),
            ..Default::default()
        };
        let summary = tagger.run(&scan, &mut ui).await;

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.updated, 1);
        assert!(ui.notices.iter().any(|notice| notice.contains("STREAMINFO")));
    }

    /// Fails on review to exercise the unexpected-error path.
    struct BrokenTerminal {
        inner: ScriptedInteraction,
    }

    impl Interaction for BrokenTerminal {
        fn file_header(&mut self, position: usize, total: usize, relative_path: &Path) {
            self.inner.file_header(position, total, relative_path)
        }
        fn notice(&mut self, message: &str) {
            self.inner.notice(message)
        }
        fn choose_candidate(
            &mut self,
            candidates: &[CandidateRecord],
        ) -> InteractionResult<crate::candidate_selection::CandidateChoice> {
            self.inner.choose_candidate(candidates)
        }
        fn review(&mut self, _suggestion: Option<&Suggestion>) -> InteractionResult<ReviewAction> {
            Err(InteractionError::Io(std::io::Error::other("tty gone")))
        }
        fn edit_fields(&mut self, heading: &str, defaults: &TrackFields) -> InteractionResult<TrackFields> {
            self.inner.edit_fields(heading, defaults)
        }
        fn keep_artwork(&mut self) -> InteractionResult<bool> {
            self.inner.keep_artwork()
        }
        fn confirm_continue_after_error(&mut self, message: &str) -> InteractionResult<bool> {
            self.inner.confirm_continue_after_error(message)
        }
    }

    #[tokio::test]
    async fn unexpected_error_asks_before_continuing() {
        let (dir, scan) = library(&["a.flac", "b.flac"]);
        let tagger = tagger(dir.path(), false, StopSignal::default());

        let mut ui = BrokenTerminal {
            inner: ScriptedInteraction {
                continue_after_error: [Decision::Chosen(true), Decision::Chosen(false)].into(),
                ..Default::default()
            },
        };
        let summary = tagger.run(&scan, &mut ui).await;
        assert_eq!(summary.errors, 2);
        assert_eq!(ui.inner.headers.len(), 2);

        let mut declines = BrokenTerminal {
            inner: ScriptedInteraction {
                continue_after_error: [Decision::Cancelled].into(),
                ..Default::default()
            },
        };
        let summary = tagger.run(&scan, &mut declines).await;
        assert_eq!(summary.errors, 1);
        assert_eq!(declines.inner.headers.len(), 1);
    }

    #[test]
    fn written_metadata_is_what_was_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_flac_fixture(dir.path(), "x.flac");
        let fields = details(FP_RECORDING, "T", "A")
            .into_candidate(Provenance::Fingerprint)
            .fields();
        TagWriter::new()
            .write(&path, ResolvedMetadata::new(fields, Provenance::Fingerprint))
            .unwrap();
        assert!(has_essential_tags(&path));
    }
}
