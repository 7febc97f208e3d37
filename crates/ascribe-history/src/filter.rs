//! History post-processing: merge noise removal, filter collapsing, and
//! reduction of modifications to diff segments.
//!
//! All functions take a history ordered newest first and keep that order.

use ascribe_core::{Message, TrackedField};
use serde::{Deserialize, Serialize};

use crate::differ::{DiffTag, Differencer};
use crate::reconstruct::History;

/// Which diff segments a reduced modification keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// Text added relative to the older modification.
    Added,
    /// Text removed relative to the older modification.
    Removed,
    /// Text shared with the older modification.
    Equal,
}

impl DiffMode {
    fn tag(self) -> DiffTag {
        match self {
            Self::Added => DiffTag::Added,
            Self::Removed => DiffTag::Removed,
            Self::Equal => DiffTag::Equal,
        }
    }

    /// Parse `add`, `rem` or `eq` (and their long forms).
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "a" | "add" | "added" => Some(Self::Added),
            "r" | "rem" | "removed" => Some(Self::Removed),
            "e" | "eq" | "equal" => Some(Self::Equal),
            _ => None,
        }
    }
}

/// Remove entries where the merge user did nothing but merge.
///
/// An entry by `merge_user` goes when the differencer sees its snapshot as
/// a pure merge of the next older one. The oldest entry goes whenever it is
/// by `merge_user`, since nothing older explains it.
pub fn drop_clean_merges(history: &mut History, merge_user: &str, differ: &dyn Differencer) {
    let n = history.len();
    let keep: Vec<bool> = (0..n)
        .map(|i| {
            let entry = &history[i];
            if !entry.is_by(merge_user) {
                return true;
            }
            match history.get(i + 1) {
                Some(older) => !differ.is_pure_merge(&older.msg, &entry.msg),
                None => false,
            }
        })
        .collect();
    let mut flags = keep.into_iter();
    history.retain(|_| flags.next().unwrap_or(true));
}

/// Collapse modifications whose translations are equal under `filter`.
///
/// Walking from oldest to newest, a modification is kept only if its
/// filtered translation differs from that of the last kept modification.
/// Reviews are always kept.
pub fn collapse_under_filter(history: &mut History, filter: &(dyn Fn(&str) -> String + Send + Sync)) {
    let filtered = |msg: &Message| -> Vec<String> { msg.msgstr.iter().map(|s| filter(s)).collect() };

    let mut keep = vec![true; history.len()];
    let mut last: Option<Vec<String>> = None;
    for (i, entry) in history.iter().enumerate().rev() {
        if !entry.is_modification() {
            continue;
        }
        let current = filtered(&entry.msg);
        if last.as_ref() == Some(&current) {
            keep[i] = false;
        } else {
            last = Some(current);
        }
    }
    let mut flags = keep.into_iter();
    history.retain(|_| flags.next().unwrap_or(true));
}

/// Segments of one kind in the diff of `older` to `newer`, joined by spaces.
fn reduce_text(older: &str, newer: &str, mode: DiffMode, differ: &dyn Differencer) -> String {
    let tag = mode.tag();
    differ
        .diff_spans(older, newer)
        .into_iter()
        .filter(|span| span.tag == tag)
        .map(|span| {
            let src = if tag == DiffTag::Removed { older } else { newer };
            src[span.range].trim()
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce every tracked field of `newer` against `older`, item by item.
///
/// A missing item on either side counts as empty text.
pub fn reduce_message(older: &Message, newer: &mut Message, mode: DiffMode, differ: &dyn Differencer) {
    for field in TrackedField::ALL {
        let old_items = older.sequence(field);
        let new_items = newer.sequence(field);
        let n = old_items.len().max(new_items.len());
        if n == 0 {
            continue;
        }
        let reduced = (0..n)
            .map(|i| {
                let a = old_items.get(i).map_or("", String::as_str);
                let b = new_items.get(i).map_or("", String::as_str);
                reduce_text(a, b, mode, differ)
            })
            .collect();
        newer.set_sequence(field, reduced);
    }
}

/// Replace each modification by its diff segments against the next older one.
///
/// Reviews and the oldest modification stay as they are.
pub fn reduce_to_diff(history: &mut History, mode: DiffMode, differ: &dyn Differencer) {
    for i in 0..history.len() {
        if !history[i].is_modification() {
            continue;
        }
        let Some(j) = (i + 1..history.len()).find(|&j| history[j].is_modification()) else {
            break;
        };
        let older = history[j].msg.clone();
        reduce_message(&older, &mut history[i].msg, mode, differ);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
