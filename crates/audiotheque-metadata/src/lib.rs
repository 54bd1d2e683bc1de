// SPDX-License-Identifier: GPL-3.0-or-later

//! Cover art retrieval from the Cover Art Archive.

pub mod cover_art;

pub use cover_art::{CoverArtClient, CoverArtError};
