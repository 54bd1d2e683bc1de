// SPDX-License-Identifier: GPL-3.0-or-later
mod prompt;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use audiotheque_application::{
    scan_library, AppState, Decision, LibraryTagger, MusicBrainzCatalog, ResolutionCascade,
    StopSignal, TagWriter,
};
use audiotheque_config::{load as load_config, AppConfig};
use audiotheque_domain::RunSummary;
use audiotheque_fingerprint::{AcoustidClient, FpcalcExtractor};
use audiotheque_metadata::CoverArtClient;
use audiotheque_musicbrainz::MusicBrainzClient;
use prompt::TerminalInteraction;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CONFIG_ENV: &str = "AUDIOTHEQUE_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    let state = AppState::new(config.clone());
    state.on_start();

    let api_key = acoustid_key(&config)?;
    if config.musicbrainz.contact.is_none() {
        warn!(target: "cli", "no contact address configured; MusicBrainz asks for one in the User-Agent");
    }

    let root = config.library.root_path();
    let mut ui = TerminalInteraction::new();
    ui.banner(&root);
    match ui.confirm_start()? {
        Decision::Chosen(true) => {}
        _ => {
            println!("Aborted. Nothing was changed.");
            return Ok(());
        }
    }

    let scan = match scan_library(&root, &config.library.extensions) {
        Ok(scan) => scan,
        Err(scan_error) => {
            error!(target: "cli", error = %scan_error, "cannot scan the library");
            eprintln!("{}", scan_error);
            ui.final_report(&RunSummary::new(0));
            return Ok(());
        }
    };
    if scan.is_empty() {
        println!("No audio files found in {}.", root.display());
        return Ok(());
    }
    println!("Found {} audio file(s).", scan.len());

    let stop = StopSignal::default();
    spawn_stop_handler(stop.clone());

    let tagger = build_tagger(&config, api_key, stop)?;
    let summary = tagger.run(&scan, &mut ui).await;
    ui.final_report(&summary);

    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn acoustid_key(config: &AppConfig) -> Result<String> {
    match config
        .acoustid
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
    {
        Some(key) => Ok(key.to_string()),
        None => bail!(
            "no AcoustID API key configured; set ACOUSTID_API_KEY or acoustid.api_key in {}",
            CONFIG_ENV
        ),
    }
}

/// Ctrl-C outside a prompt stops the run before the next phase or file.
fn spawn_stop_handler(stop: StopSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "cli", "interrupt received; stopping after the current step");
            stop.request();
        }
    });
}

fn build_tagger(config: &AppConfig, api_key: String, stop: StopSignal) -> Result<LibraryTagger> {
    let extractor = match FpcalcExtractor::locate(config.fpcalc.path.as_deref()) {
        Ok(extractor) => extractor,
        Err(error) => {
            warn!(target: "cli", error = %error, "fpcalc not found; fingerprint lookups will fall back to filenames");
            FpcalcExtractor::with_executable("fpcalc")
        }
    };

    let acoustid = AcoustidClient::builder(api_key)
        .base_url(config.acoustid.base_url.clone())
        .rate_limit_interval(Duration::from_millis(config.acoustid.delay_ms))
        .build()
        .context("failed to build the AcoustID client")?;

    let musicbrainz = MusicBrainzClient::builder()
        .base_url(config.musicbrainz.base_url.clone())
        .contact(config.musicbrainz.contact.clone())
        .rate_limit_interval(Duration::from_millis(config.musicbrainz.delay_ms))
        .build()
        .context("failed to build the MusicBrainz client")?;

    let cover_art = CoverArtClient::new(
        Some(config.cover_art.base_url.clone()),
        Duration::from_secs(config.cover_art.timeout_secs),
        musicbrainz.user_agent(),
    )
    .context("failed to build the cover art client")?;

    let cascade = ResolutionCascade::new(
        Arc::new(extractor),
        Arc::new(acoustid),
        Arc::new(MusicBrainzCatalog::new(
            musicbrainz,
            config.musicbrainz.search_limit,
        )),
        Arc::new(cover_art),
        stop.clone(),
    );

    Ok(LibraryTagger::new(cascade, TagWriter::new(), stop))
}
