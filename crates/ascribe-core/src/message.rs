//! Catalog message model.
//!
//! A [`Message`] carries its identity (`msgctxt`, `msgid`), the tracked
//! mutable parts, flags, comments, and the `refline`/`refentry` positions
//! assigned by the catalog parser. The same shape is used for live messages
//! and for historical snapshots rebuilt from ascription records.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Flag marking a message as fuzzy.
pub const FUZZY_FLAG: &str = "fuzzy";

/// Prefix of automatic comments listing summit branches (`#. +> trunk stable`).
pub const BRANCH_COMMENT_PREFIX: &str = "+>";

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a message within a catalog: context plus original text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageKey {
    /// Disambiguating context, if any.
    pub msgctxt: Option<String>,
    /// Original text.
    pub msgid: String,
}

impl MessageKey {
    /// Create a key from context and original text.
    pub fn new(msgctxt: Option<&str>, msgid: impl Into<String>) -> Self {
        Self {
            msgctxt: msgctxt.map(str::to_owned),
            msgid: msgid.into(),
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.msgctxt {
            Some(ctxt) => write!(f, "{ctxt}|{}", self.msgid),
            None => write!(f, "{}", self.msgid),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

/// Exclusive translation state of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageState {
    /// Translated and current.
    Translated,
    /// Fuzzy and current.
    Fuzzy,
    /// Untranslated and current.
    Untranslated,
    /// Translated and obsolete.
    ObsoleteTranslated,
    /// Fuzzy and obsolete.
    ObsoleteFuzzy,
    /// Untranslated and obsolete.
    ObsoleteUntranslated,
}

impl MessageState {
    /// All states, in report column order.
    pub const ALL: [Self; 6] = [
        Self::Translated,
        Self::Fuzzy,
        Self::Untranslated,
        Self::ObsoleteTranslated,
        Self::ObsoleteFuzzy,
        Self::ObsoleteUntranslated,
    ];

    /// Short report code (`T`, `F`, `U`, `OT`, `OF`, `OU`).
    pub fn code(self) -> &'static str {
        match self {
            Self::Translated => "T",
            Self::Fuzzy => "F",
            Self::Untranslated => "U",
            Self::ObsoleteTranslated => "OT",
            Self::ObsoleteFuzzy => "OF",
            Self::ObsoleteUntranslated => "OU",
        }
    }

    /// The obsolete counterpart of a current state (obsolete states map to themselves).
    pub fn to_obsolete(self) -> Self {
        match self {
            Self::Translated | Self::ObsoleteTranslated => Self::ObsoleteTranslated,
            Self::Fuzzy | Self::ObsoleteFuzzy => Self::ObsoleteFuzzy,
            Self::Untranslated | Self::ObsoleteUntranslated => Self::ObsoleteUntranslated,
        }
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────────────

/// A catalog message, live or reconstructed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    /// Disambiguating context.
    pub msgctxt: Option<String>,
    /// Original text.
    pub msgid: String,
    /// Plural original text.
    pub msgid_plural: Option<String>,
    /// Translation variants (one per plural form).
    pub msgstr: Vec<String>,
    /// Translator comment lines.
    pub manual_comment: Vec<String>,
    /// Extracted comment lines.
    pub auto_comment: Vec<String>,
    /// Flags (`fuzzy`, format flags, review flags).
    pub flags: BTreeSet<String>,
    /// Whether the message is obsolete.
    pub obsolete: bool,
    /// Previous context, kept while fuzzy.
    pub msgctxt_previous: Option<String>,
    /// Previous original text, kept while fuzzy.
    pub msgid_previous: Option<String>,
    /// Previous plural original text, kept while fuzzy.
    pub msgid_plural_previous: Option<String>,
    /// Line number of the message in its catalog file (0 if unknown).
    pub refline: usize,
    /// Entry number of the message in its catalog (0 if unknown).
    pub refentry: usize,
}

impl Message {
    /// Create an untranslated message with the given original text.
    pub fn new(msgid: impl Into<String>) -> Self {
        Self {
            msgid: msgid.into(),
            msgstr: vec![String::new()],
            ..Self::default()
        }
    }

    /// Create an empty message carrying only the identity of `key`.
    pub fn from_key(key: &MessageKey) -> Self {
        Self {
            msgctxt: key.msgctxt.clone(),
            msgid: key.msgid.clone(),
            ..Self::default()
        }
    }

    /// Set the context.
    #[must_use]
    pub fn with_context(mut self, msgctxt: impl Into<String>) -> Self {
        self.msgctxt = Some(msgctxt.into());
        self
    }

    /// Set a single translation.
    #[must_use]
    pub fn with_translation(mut self, msgstr: impl Into<String>) -> Self {
        self.msgstr = vec![msgstr.into()];
        self
    }

    /// The identity key.
    pub fn key(&self) -> MessageKey {
        MessageKey {
            msgctxt: self.msgctxt.clone(),
            msgid: self.msgid.clone(),
        }
    }

    /// Whether the message carries the fuzzy flag.
    pub fn is_fuzzy(&self) -> bool {
        self.flags.contains(FUZZY_FLAG)
    }

    /// Add or remove the fuzzy flag.
    pub fn set_fuzzy(&mut self, fuzzy: bool) {
        if fuzzy {
            let _ = self.flags.insert(FUZZY_FLAG.to_owned());
        } else {
            let _ = self.flags.remove(FUZZY_FLAG);
        }
    }

    /// Whether the message is translated: not fuzzy and every variant non-empty.
    pub fn is_translated(&self) -> bool {
        !self.is_fuzzy() && !self.msgstr.is_empty() && self.msgstr.iter().all(|s| !s.is_empty())
    }

    /// Exclusive state of the message.
    pub fn state(&self) -> MessageState {
        let current = if self.is_fuzzy() {
            MessageState::Fuzzy
        } else if self.is_translated() {
            MessageState::Translated
        } else {
            MessageState::Untranslated
        };
        if self.obsolete {
            current.to_obsolete()
        } else {
            current
        }
    }

    /// Summit branches listed in `+>` automatic comments.
    pub fn summit_branches(&self) -> BTreeSet<String> {
        self.auto_comment
            .iter()
            .filter_map(|c| c.trim().strip_prefix(BRANCH_COMMENT_PREFIX))
            .flat_map(str::split_whitespace)
            .map(str::to_owned)
            .collect()
    }

    /// Equality of everything but the catalog positions.
    pub fn same_content(&self, other: &Self) -> bool {
        self.msgctxt == other.msgctxt
            && self.msgid == other.msgid
            && self.msgid_plural == other.msgid_plural
            && self.msgstr == other.msgstr
            && self.manual_comment == other.manual_comment
            && self.auto_comment == other.auto_comment
            && self.flags == other.flags
            && self.obsolete == other.obsolete
            && self.msgctxt_previous == other.msgctxt_previous
            && self.msgid_previous == other.msgid_previous
            && self.msgid_plural_previous == other.msgid_plural_previous
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
