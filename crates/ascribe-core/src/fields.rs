//! Tracked fields and their sequence view.
//!
//! Every tracked field is handled by the codec as a sequence of items:
//!
//! | Field | Items |
//! |-------|-------|
//! | `msgid_plural`, `*_previous` | zero or one |
//! | `msgstr` | one per translation variant |
//! | `manual_comment` | zero or one (lines joined with `\n`) |
//!
//! [`Message::sequence`] and [`Message::set_sequence`] convert between the
//! message representation and this view.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// A message part whose history is preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    /// Plural original text.
    MsgidPlural,
    /// Translation variants.
    Msgstr,
    /// Previous context.
    MsgctxtPrevious,
    /// Previous original text.
    MsgidPrevious,
    /// Previous plural original text.
    MsgidPluralPrevious,
    /// Translator comments.
    ManualComment,
}

impl TrackedField {
    /// All tracked fields, in encoding order.
    pub const ALL: [Self; 6] = [
        Self::MsgidPlural,
        Self::Msgstr,
        Self::MsgctxtPrevious,
        Self::MsgidPrevious,
        Self::MsgidPluralPrevious,
        Self::ManualComment,
    ];

    /// Catalog field name.
    pub fn name(self) -> &'static str {
        match self {
            Self::MsgidPlural => "msgid_plural",
            Self::Msgstr => "msgstr",
            Self::MsgctxtPrevious => "msgctxt_previous",
            Self::MsgidPrevious => "msgid_previous",
            Self::MsgidPluralPrevious => "msgid_plural_previous",
            Self::ManualComment => "manual_comment",
        }
    }

    /// Whether this is one of the previous-identity fields.
    pub fn is_previous(self) -> bool {
        matches!(
            self,
            Self::MsgctxtPrevious | Self::MsgidPrevious | Self::MsgidPluralPrevious
        )
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn single(value: Option<&String>) -> Vec<String> {
    value.map(|v| vec![v.clone()]).unwrap_or_default()
}

impl Message {
    /// Items of a tracked field as stored in snapshots.
    pub fn sequence(&self, field: TrackedField) -> Vec<String> {
        match field {
            TrackedField::MsgidPlural => single(self.msgid_plural.as_ref()),
            TrackedField::Msgstr => self.msgstr.clone(),
            TrackedField::MsgctxtPrevious => single(self.msgctxt_previous.as_ref()),
            TrackedField::MsgidPrevious => single(self.msgid_previous.as_ref()),
            TrackedField::MsgidPluralPrevious => single(self.msgid_plural_previous.as_ref()),
            TrackedField::ManualComment => {
                if self.manual_comment.is_empty() {
                    Vec::new()
                } else {
                    vec![self.manual_comment.join("\n")]
                }
            }
        }
    }

    /// Items of a tracked field as seen on a live message.
    ///
    /// Previous fields on a message without the fuzzy flag are leftovers and
    /// count as absent.
    pub fn live_sequence(&self, field: TrackedField) -> Vec<String> {
        if field.is_previous() && !self.is_fuzzy() {
            return Vec::new();
        }
        self.sequence(field)
    }

    /// Replace a tracked field from its sequence view.
    pub fn set_sequence(&mut self, field: TrackedField, items: Vec<String>) {
        match field {
            TrackedField::MsgidPlural => self.msgid_plural = items.into_iter().next(),
            TrackedField::MsgctxtPrevious => self.msgctxt_previous = items.into_iter().next(),
            TrackedField::MsgidPrevious => self.msgid_previous = items.into_iter().next(),
            TrackedField::MsgidPluralPrevious => {
                self.msgid_plural_previous = items.into_iter().next();
            }
            TrackedField::Msgstr => self.msgstr = items,
            TrackedField::ManualComment => {
                self.manual_comment = items
                    .first()
                    .map(|joined| joined.split('\n').map(str::to_owned).collect())
                    .unwrap_or_default();
            }
        }
    }

    /// Whether any tracked part carries content.
    ///
    /// Messages without tracked content and without history are pristine and
    /// never need ascribing.
    pub fn has_tracked_parts(&self) -> bool {
        self.msgid_plural.is_some()
            || self.msgctxt_previous.is_some()
            || self.msgid_previous.is_some()
            || self.msgid_plural_previous.is_some()
            || self.msgstr.iter().any(|s| !s.is_empty())
            || !self.manual_comment.is_empty()
    }

    /// Whether `live` differs from this snapshot in any tracked field.
    pub fn tracked_differs(&self, live: &Self) -> bool {
        TrackedField::ALL
            .iter()
            .any(|&f| live.live_sequence(f) != self.sequence(f))
    }

    /// Equality from the ascription viewpoint.
    ///
    /// States must match; then plural original, translations and translator
    /// comments, and the previous fields as well when fuzzy.
    pub fn ascription_eq(&self, other: &Self) -> bool {
        if self.state() != other.state() {
            return false;
        }
        TrackedField::ALL
            .iter()
            .filter(|f| self.is_fuzzy() || !f.is_previous())
            .all(|&f| self.sequence(f) == other.sequence(f))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
