//! Result of testing a message against a selector, and the seam through
//! which catalog operations consult selectors.

use std::fmt;

use ascribe_core::{Catalog, Message};

use crate::reconstruct::Ascription;
use crate::record::AscriptionCatalog;

/// What a selector answered.
///
/// Plain selectors answer yes or no; history selectors point at a history
/// entry by 1-based position, with 0 meaning no match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Answer of a plain selector.
    Plain(bool),
    /// Answer of a history selector.
    History(usize),
}

impl Selection {
    /// No match, as a plain answer.
    pub const NONE: Self = Self::Plain(false);

    /// Whether the message is selected.
    pub fn is_match(self) -> bool {
        match self {
            Self::Plain(b) => b,
            Self::History(i) => i > 0,
        }
    }

    /// 1-based history position, if this is a history match.
    pub fn history_position(self) -> Option<usize> {
        match self {
            Self::History(i) if i > 0 => Some(i),
            _ => None,
        }
    }

    /// 0-based history index, if this is a history match.
    pub fn history_index(self) -> Option<usize> {
        self.history_position().map(|p| p - 1)
    }
}

impl From<bool> for Selection {
    fn from(b: bool) -> Self {
        Self::Plain(b)
    }
}

/// Everything a selector may look at for one message.
#[derive(Clone, Copy)]
pub struct SelectionInput<'a> {
    /// The live message.
    pub msg: &'a Message,
    /// Its catalog.
    pub catalog: &'a Catalog,
    /// The catalog's ascription records.
    pub acat: &'a AscriptionCatalog,
    /// The message's history, newest first.
    pub history: &'a [Ascription],
}

/// Something that selects messages or history entries.
pub trait MessageSelector: Send + Sync {
    /// Test one message.
    fn select(&self, input: &SelectionInput<'_>) -> Selection;
}

impl fmt::Debug for dyn MessageSelector + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MessageSelector")
    }
}

impl<F> MessageSelector for F
where
    F: Fn(&SelectionInput<'_>) -> Selection + Send + Sync,
{
    fn select(&self, input: &SelectionInput<'_>) -> Selection {
        self(input)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
