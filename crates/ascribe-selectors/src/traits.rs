//! Selector factory trait and the environment factories build against.
//!
//! Defines [`SelectorFactory`], the trait every named selector implements,
//! plus [`SelectorEnv`], the run-scoped services a factory may capture.

use std::fmt;
use std::sync::Arc;

use ascribe_history::{Differencer, MessageSelector};
use ascribe_settings::AscribeSettings;

use crate::cache::SelectorCache;
use crate::errors::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Environment
// ─────────────────────────────────────────────────────────────────────────────

/// Services shared by all selectors compiled for one run.
#[derive(Clone)]
pub struct SelectorEnv {
    /// Loaded settings.
    pub settings: Arc<AscribeSettings>,
    /// Differencer for diff-reducing selectors.
    pub differ: Arc<dyn Differencer>,
    /// Parsed argument cache.
    pub cache: Arc<SelectorCache>,
}

impl SelectorEnv {
    /// Environment with a fresh cache.
    pub fn new(settings: Arc<AscribeSettings>, differ: Arc<dyn Differencer>) -> Self {
        Self {
            settings,
            differ,
            cache: Arc::new(SelectorCache::new()),
        }
    }
}

impl fmt::Debug for SelectorEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorEnv")
            .field("settings", &self.settings.fingerprint())
            .field("cache", &self.cache.len())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory trait
// ─────────────────────────────────────────────────────────────────────────────

/// A named selector constructor.
///
/// Arguments arrive split on the separator chosen by the user. A missing
/// argument and an empty one are the same thing to every built-in.
pub trait SelectorFactory: Send + Sync {
    /// Name used in selector specifications.
    fn name(&self) -> &str;

    /// Whether the built selector answers with history positions.
    fn history_capable(&self) -> bool {
        false
    }

    /// Validate `args` and build the selector.
    fn build(&self, args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>>;
}

/// Argument `i`, treating empty as absent.
pub fn arg<'a>(args: &[&'a str], i: usize) -> Option<&'a str> {
    args.get(i).copied().filter(|s| !s.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
