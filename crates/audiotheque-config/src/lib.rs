// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "AUDIOTHEQUE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root directory scanned for audio files.
    pub root: PathBuf,
    /// Recognised file extensions, without the leading dot.
    pub extensions: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .map(|home| home.join("Musique"))
                .unwrap_or_else(|| PathBuf::from("Musique")),
            extensions: ["mp3", "flac", "m4a", "aac", "ogg", "opus"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl LibraryConfig {
    /// Root with a leading `~/` expanded to the home directory.
    pub fn root_path(&self) -> PathBuf {
        expand_home(&self.root)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcoustidConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Pause after every lookup, successful or not.
    pub delay_ms: u64,
}

impl Default for AcoustidConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.acoustid.org/v2".to_string(),
            delay_ms: 333,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzConfig {
    pub base_url: String,
    /// Contact address sent in the User-Agent, as MusicBrainz asks.
    pub contact: Option<String>,
    pub delay_ms: u64,
    pub search_limit: u32,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            contact: None,
            delay_ms: 1100,
            search_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverArtConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CoverArtConfig {
    fn default() -> Self {
        Self {
            base_url: "https://coverartarchive.org".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FpcalcConfig {
    /// Directory containing `fpcalc`, or the executable itself. `None` searches `PATH`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub library: LibraryConfig,
    pub acoustid: AcoustidConfig,
    pub musicbrainz: MusicBrainzConfig,
    pub cover_art: CoverArtConfig,
    pub fpcalc: FpcalcConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides.
///
/// `ACOUSTID_API_KEY` and `EMAIL_ADDRESS` are accepted as-is; `AUDIOTHEQUE_`-prefixed
/// variables (nested with `__`) take precedence over them.
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment
        .merge(
            Env::raw()
                .only(&["ACOUSTID_API_KEY"])
                .map(|_| "acoustid.api_key".into()),
        )
        .merge(
            Env::raw()
                .only(&["EMAIL_ADDRESS"])
                .map(|_| "musicbrainz.contact".into()),
        )
        .merge(
            Env::prefixed("AUDIOTHEQUE_")
                .ignore(&["CONFIG"])
                .split("__"),
        );

    let config: AppConfig = figment.extract()?;
    info!(target: "config", root = %config.library.root.display(), "configuration loaded");
    Ok(config)
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_service_etiquette() {
        let config = AppConfig::default();
        assert_eq!(config.acoustid.delay_ms, 333);
        assert_eq!(config.musicbrainz.delay_ms, 1100);
        assert_eq!(config.cover_art.timeout_secs, 15);
        assert_eq!(config.musicbrainz.search_limit, 10);
        assert!(config.library.root.ends_with("Musique"));
        assert_eq!(config.library.extensions.len(), 6);
    }

    #[test]
    fn legacy_credential_variables_are_honoured() {
        Jail::expect_with(|jail| {
            jail.set_env("ACOUSTID_API_KEY", "legacy-key");
            jail.set_env("EMAIL_ADDRESS", "me@example.org");
            let config = load(None).expect("config loads");
            assert_eq!(config.acoustid.api_key.as_deref(), Some("legacy-key"));
            assert_eq!(config.musicbrainz.contact.as_deref(), Some("me@example.org"));
            Ok(())
        });
    }

    #[test]
    fn prefixed_variables_override_legacy_and_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "audiotheque.toml",
                r#"
                [library]
                root = "/srv/music"
                extensions = ["flac"]

                [acoustid]
                api_key = "from-file"
                "#,
            )?;
            jail.set_env("ACOUSTID_API_KEY", "legacy-key");
            jail.set_env("AUDIOTHEQUE_ACOUSTID__API_KEY", "prefixed-key");

            let config = load(Some(Path::new("audiotheque.toml"))).expect("config loads");
            assert_eq!(config.acoustid.api_key.as_deref(), Some("prefixed-key"));
            assert_eq!(config.library.root, PathBuf::from("/srv/music"));
            assert_eq!(config.library.extensions, vec!["flac".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn tilde_root_expands_to_home() {
        let library = LibraryConfig {
            root: PathBuf::from("~/Music"),
            extensions: Vec::new(),
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(library.root_path(), home.join("Music"));
        }
    }
}
