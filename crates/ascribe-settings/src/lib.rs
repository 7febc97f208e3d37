//! # ascribe-settings
//!
//! Configuration for ascription runs.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`AscribeSettings::default()`]
//! 2. **Settings file**: `~/.ascribe/ascribe.json` or an explicit path, deep-merged over defaults
//! 3. **Environment variables**: `ASCRIBE_*` overrides
//!
//! Loaded settings are validated and then shared read-only (`Arc`) for the
//! rest of the run; [`AscribeSettings::fingerprint`] identifies them to caches.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
