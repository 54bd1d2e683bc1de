// SPDX-License-Identifier: GPL-3.0-or-later

//! Audio fingerprinting and AcoustID integration for music identification.
//!
//! This crate provides functionality for:
//! - Running the Chromaprint `fpcalc` tool to fingerprint a file
//! - Submitting fingerprints to AcoustID for identification
//! - Picking the MusicBrainz recording AcoustID ranks first

pub mod acoustid;
pub mod error;
pub mod fingerprint;
pub mod fpcalc;

pub use acoustid::{AcoustidClient, AcoustidClientBuilder, LookupResult, RecordingMatch};
pub use error::{FingerprintError, Result};
pub use fingerprint::Fingerprint;
pub use fpcalc::FpcalcExtractor;
