// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

/// Audio fingerprint (Chromaprint) as produced by `fpcalc`.
///
/// The hash is Chromaprint's compressed fingerprint, base64 encoded with the
/// URL-safe alphabet. The duration is the whole-second length of the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fingerprint {
    pub hash: String,
    /// Duration of the audio file in seconds.
    pub duration: u32,
}

impl Fingerprint {
    pub fn new(hash: impl Into<String>, duration: u32) -> Self {
        Self {
            hash: hash.into(),
            duration,
        }
    }

    /// Check the fingerprint is something AcoustID can accept.
    pub fn validate(&self) -> crate::Result<()> {
        if self.hash.is_empty() {
            return Err(crate::FingerprintError::InvalidFingerprint(
                "fingerprint hash is empty".to_string(),
            ));
        }

        if self.duration == 0 {
            return Err(crate::FingerprintError::InvalidFingerprint(
                "duration must be > 0".to_string(),
            ));
        }

        let trimmed = self.hash.trim_end_matches('=');
        if self.hash.len() - trimmed.len() > 2 || trimmed.contains('=') {
            return Err(crate::FingerprintError::InvalidFingerprint(
                "invalid base64 padding".to_string(),
            ));
        }

        // Both alphabets are accepted: fpcalc emits URL-safe, older tools emit standard.
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '/'))
        {
            return Err(crate::FingerprintError::InvalidFingerprint(
                "fingerprint contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_validation_valid() {
        assert!(Fingerprint::new("AQADtEmUSEkSJUmY", 215).validate().is_ok());
        assert!(Fingerprint::new("AQAD-vEW_Z==", 120).validate().is_ok());
        assert!(Fingerprint::new("AQAD+vEW/Z=", 120).validate().is_ok());
    }

    #[test]
    fn test_fingerprint_validation_empty_hash() {
        assert!(Fingerprint::new("", 120).validate().is_err());
    }

    #[test]
    fn test_fingerprint_validation_zero_duration() {
        assert!(Fingerprint::new("AQADvEWZ", 0).validate().is_err());
    }

    #[test]
    fn test_fingerprint_validation_invalid_chars() {
        assert!(Fingerprint::new("AQADv!WZ==", 120).validate().is_err());
    }

    #[test]
    fn test_fingerprint_validation_bad_padding() {
        assert!(Fingerprint::new("AQAD=vEWZ", 120).validate().is_err());
        assert!(Fingerprint::new("AQADvEWZ===", 120).validate().is_err());
    }
}
