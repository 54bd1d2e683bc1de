// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{FingerprintError, Result};
use crate::fingerprint::Fingerprint;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, trace};

const FPCALC: &str = "fpcalc";

/// Fingerprints files by running Chromaprint's `fpcalc -json`.
///
/// No timeout is applied to the subprocess.
#[derive(Debug, Clone)]
pub struct FpcalcExtractor {
    executable: PathBuf,
}

#[derive(Debug, Deserialize)]
struct FpcalcOutput {
    duration: Option<f64>,
    fingerprint: Option<String>,
}

impl FpcalcExtractor {
    /// Use this exact executable.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Resolve `fpcalc`. `configured` may be the directory holding it or the
    /// executable itself; without it, `PATH` is searched.
    pub fn locate(configured: Option<&Path>) -> Result<Self> {
        let executable = match configured {
            Some(path) if path.is_dir() => {
                path.join(format!("{}{}", FPCALC, std::env::consts::EXE_SUFFIX))
            }
            Some(path) => path.to_path_buf(),
            None => which::which(FPCALC).map_err(|_| {
                FingerprintError::ToolNotFound(
                    "fpcalc not found in PATH; install Chromaprint or set fpcalc.path".to_string(),
                )
            })?,
        };

        if !executable.is_file() {
            return Err(FingerprintError::ToolNotFound(
                executable.display().to_string(),
            ));
        }

        debug!(target: "fingerprint", executable = %executable.display(), "using fpcalc");
        Ok(Self { executable })
    }

    /// Compute the fingerprint and duration of one audio file.
    pub async fn fingerprint(&self, path: &Path) -> Result<Fingerprint> {
        trace!(target: "fingerprint", file = %path.display(), "running fpcalc");

        let output = Command::new(&self.executable)
            .arg("-json")
            .arg(path)
            .output()
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => {
                    FingerprintError::ToolNotFound(self.executable.display().to_string())
                }
                _ => FingerprintError::Io(error),
            })?;

        if !output.status.success() {
            return Err(FingerprintError::ToolFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_fpcalc_json(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the JSON document printed by `fpcalc -json`.
///
/// The fractional duration is truncated to whole seconds.
pub fn parse_fpcalc_json(stdout: &str) -> Result<Fingerprint> {
    let parsed: FpcalcOutput = serde_json::from_str(stdout)
        .map_err(|e| FingerprintError::MalformedOutput(e.to_string()))?;

    let (Some(duration), Some(hash)) = (parsed.duration, parsed.fingerprint) else {
        let excerpt: String = stdout.chars().take(200).collect();
        return Err(FingerprintError::MalformedOutput(format!(
            "missing duration or fingerprint in: {}",
            excerpt
        )));
    };

    if !duration.is_finite() || duration < 0.0 {
        return Err(FingerprintError::MalformedOutput(format!(
            "invalid duration {}",
            duration
        )));
    }

    let fingerprint = Fingerprint::new(hash, duration.trunc() as u32);
    fingerprint.validate()?;
    Ok(fingerprint)
}
