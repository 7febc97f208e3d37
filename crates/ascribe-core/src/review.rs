//! Review marks left on messages between review passes.
//!
//! When messages are selected for review they get a diff flag and an
//! ascription-chain comment; translators may add a reviewed or unreviewed
//! flag by hand. Before anything is ascribed or compared, these marks have
//! to be stripped so they never reach the ascription history.

use crate::catalog::Catalog;
use crate::message::Message;

/// Flag on a message with an embedded diff.
pub const DIFF_FLAG: &str = "ediff";
/// Flag on a message whose whole text is new to the reviewer.
pub const DIFF_FLAG_TOTAL: &str = "ediff-total";
/// Flag on a message whose diff was too large to be useful.
pub const DIFF_FLAG_IGNORED: &str = "ediff-ignored";

/// All diff flags.
pub const DIFF_FLAGS: [&str; 3] = [DIFF_FLAG, DIFF_FLAG_TOTAL, DIFF_FLAG_IGNORED];

/// Synonyms marking a message as reviewed. The first is canonical.
pub const REVIEWED_FLAGS: [&str; 3] = ["reviewed", "revd", "rev"];

/// Synonyms marking a message as explicitly not reviewed. The first is canonical.
pub const UNREVIEWED_FLAGS: [&str; 7] =
    ["unreviewed", "unrevd", "unrev", "urevd", "urev", "nrevd", "nrev"];

/// Prefix of the automatic comment showing the ascription chain.
pub const CHAIN_COMMENT_PREFIX: &str = "~ascto:";

/// What was found (and removed) on one message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReviewMarks {
    /// An ascription-chain comment was present.
    pub commented: bool,
    /// A diff flag was present.
    pub diffed: bool,
    /// A reviewed flag was present.
    pub reviewed: bool,
    /// An unreviewed flag was present.
    pub unreviewed: bool,
}

impl ReviewMarks {
    /// Whether anything at all was found.
    pub fn any(&self) -> bool {
        self.commented || self.diffed || self.reviewed || self.unreviewed
    }

    /// Whether the message counts as reviewed once the marks are gone.
    ///
    /// A diffed message was put up for review, so leaving it without an
    /// unreviewed flag means the reviewer accepted it.
    pub fn accepted(&self) -> bool {
        !self.unreviewed && (self.diffed || self.reviewed)
    }
}

/// Whether `flag` is one of the review flags.
pub fn is_review_flag(flag: &str) -> bool {
    DIFF_FLAGS.contains(&flag) || REVIEWED_FLAGS.contains(&flag) || UNREVIEWED_FLAGS.contains(&flag)
}

impl Message {
    /// Strip review flags and chain comments, reporting what was there.
    ///
    /// With `keep_flags`, a canonical reviewed or unreviewed flag is put back
    /// so the marks survive the pass.
    pub fn clear_review_marks(&mut self, keep_flags: bool) -> ReviewMarks {
        let mut marks = ReviewMarks::default();
        self.flags.retain(|flag| {
            let flag = flag.as_str();
            if DIFF_FLAGS.contains(&flag) {
                marks.diffed = true;
            } else if REVIEWED_FLAGS.contains(&flag) {
                marks.reviewed = true;
            } else if UNREVIEWED_FLAGS.contains(&flag) {
                marks.unreviewed = true;
            } else {
                return true;
            }
            false
        });

        let before = self.auto_comment.len();
        self.auto_comment
            .retain(|c| !c.trim().starts_with(CHAIN_COMMENT_PREFIX));
        marks.commented = self.auto_comment.len() != before;

        if keep_flags {
            self.restore_review_flags(&marks);
        }
        marks
    }

    /// Put back the canonical flag for previously found marks.
    pub fn restore_review_flags(&mut self, marks: &ReviewMarks) {
        if marks.unreviewed {
            let _ = self.flags.insert(UNREVIEWED_FLAGS[0].to_owned());
        } else if marks.diffed || marks.reviewed {
            let _ = self.flags.insert(REVIEWED_FLAGS[0].to_owned());
        }
    }

    /// Whether the message carries any unreviewed flag synonym.
    pub fn is_marked_unreviewed(&self) -> bool {
        UNREVIEWED_FLAGS.iter().any(|f| self.flags.contains(*f))
    }
}

impl Catalog {
    /// Clear review marks on every message.
    ///
    /// Returns the marks found, by entry index, for messages that had any.
    pub fn clear_review_marks(&mut self, keep_flags: bool) -> Vec<(usize, ReviewMarks)> {
        let mut found = Vec::new();
        let mut index = 0;
        self.for_each_mut(|msg| {
            let marks = msg.clear_review_marks(keep_flags);
            if marks.any() {
                found.push((index, marks));
            }
            index += 1;
        });
        found
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
