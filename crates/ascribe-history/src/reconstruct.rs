//! History reconstruction.
//!
//! A message's history is rebuilt from its ascription record in four steps:
//! parse the lines ([`parse_entries`]), decode a full snapshot for each entry
//! in write order ([`decode_snapshots`]), sort newest first ([`order`]), and
//! then follow fuzzy messages back to the identity they were merged from
//! ([`collect_history`]). A live message that differs from the newest
//! snapshot gets a synthetic unascribed entry on top.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use ascribe_core::time::Timestamp;
use ascribe_core::{Message, MessageKey, TrackedField};
use ascribe_settings::AscribeSettings;
use tracing::{debug, warn};

use crate::codec::{FieldDecoder, to_sequence};
use crate::differ::Differencer;
use crate::filter::{DiffMode, collapse_under_filter, drop_clean_merges, reduce_to_diff};
use crate::grammar::{AscriptionKind, AscriptionWarning, parse_line};
use crate::record::{AscriptionCatalog, AscriptionRecord};

/// One history entry: an ascription and the message as it was then.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ascription {
    /// Who made it; `None` for the synthetic unascribed entry.
    pub user: Option<String>,
    /// Action kind.
    pub kind: AscriptionKind,
    /// Review tag, empty when untagged.
    pub tag: String,
    /// When; `None` for the synthetic unascribed entry.
    pub date: Option<Timestamp>,
    /// Marker length of a field-changing write, 0 otherwise.
    pub separator_length: usize,
    /// Message was fuzzy.
    pub fuzzy: bool,
    /// Message was obsolete.
    pub obsolete: bool,
    /// Reconstructed snapshot.
    pub msg: Message,
    /// Position of the line in its record.
    pub seq: usize,
    /// 1-based position in the history, newest first.
    pub pos: usize,
}

impl Ascription {
    /// The synthetic entry for a live message with no matching ascription.
    pub fn unascribed(msg: Message) -> Self {
        Self {
            user: None,
            kind: AscriptionKind::Modification,
            tag: String::new(),
            date: None,
            separator_length: 0,
            fuzzy: msg.is_fuzzy(),
            obsolete: msg.obsolete,
            msg,
            seq: 0,
            pos: 0,
        }
    }

    /// Whether this is a modification.
    pub fn is_modification(&self) -> bool {
        self.kind == AscriptionKind::Modification
    }

    /// Whether this is a review.
    pub fn is_review(&self) -> bool {
        self.kind == AscriptionKind::Review
    }

    /// Whether the entry was made by `user`.
    pub fn is_by(&self, user: &str) -> bool {
        self.user.as_deref() == Some(user)
    }
}

/// A message history, newest entry first.
pub type History = Vec<Ascription>;

/// Text transformation applied before comparing translations.
pub type TextFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Post-processing of a collected history.
#[derive(Clone, Default)]
pub struct HistoryOptions {
    /// Read only the message's own record, without pivoting.
    pub shallow: bool,
    /// Remove entries where the merge user only merged.
    pub drop_merges: bool,
    /// Collapse modifications whose translations are equal under this filter.
    pub filter: Option<TextFilter>,
    /// Reduce modifications to one kind of diff segment.
    pub reduce: Option<DiffMode>,
}

impl HistoryOptions {
    /// Options for a shallow read.
    pub fn shallow() -> Self {
        Self {
            shallow: true,
            ..Self::default()
        }
    }
}

/// Decoded history of one record, with the codec state needed to extend it.
#[derive(Clone, Debug, Default)]
pub struct RecordHistory {
    /// Entries, newest first.
    pub history: History,
    /// Decoder state after all field-changing writes.
    pub decoders: BTreeMap<TrackedField, FieldDecoder>,
    /// Marker lengths of field-changing writes, in write order.
    pub prior_lens: Vec<usize>,
    /// Lines and tokens that could not be used.
    pub warnings: Vec<AscriptionWarning>,
}

/// Parse the record's lines into entries in write order, with empty snapshots.
///
/// Modification lines reset the fuzzy and obsolete state; review lines
/// keep the state of the line before unless their trailer sets it.
pub fn parse_entries(
    record: &AscriptionRecord,
    settings: &AscribeSettings,
) -> (Vec<Ascription>, Vec<AscriptionWarning>) {
    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    let (mut fuzzy, mut obsolete) = (false, false);

    for (seq, raw) in record.lines.iter().enumerate() {
        let line = match parse_line(raw, settings) {
            Ok(line) => line,
            Err(e) => {
                warnings.push(AscriptionWarning {
                    key: record.key().clone(),
                    line: raw.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if line.kind == AscriptionKind::Modification {
            fuzzy = false;
            obsolete = false;
        }
        let mut separator_length = 0;
        if let Some(trailer) = line.trailer {
            fuzzy |= trailer.fuzzy;
            obsolete |= trailer.obsolete;
            separator_length = trailer.separator_length;
        }
        entries.push(Ascription {
            user: Some(line.user),
            kind: line.kind,
            tag: line.tag,
            date: Some(line.date),
            separator_length,
            fuzzy,
            obsolete,
            msg: Message::from_key(record.key()),
            seq,
            pos: 0,
        });
    }
    (entries, warnings)
}

/// Fill in the snapshot of every entry, in write order.
///
/// Field-changing entries decode every item of every tracked field; other
/// entries copy the snapshot before them. Each entry then gets its own
/// fuzzy and obsolete state.
pub fn decode_snapshots(record: &AscriptionRecord, entries: &mut [Ascription]) -> RecordHistory {
    let mut state = RecordHistory::default();

    for i in 0..entries.len() {
        let len = entries[i].separator_length;
        let mut snapshot = if len > 0 {
            let mut msg = Message::from_key(record.key());
            for field in TrackedField::ALL {
                let decoder = state.decoders.entry(field).or_default();
                let mut values = Vec::new();
                for (item, blob) in record.blobs(field).iter().enumerate() {
                    match decoder.step(blob, item, len) {
                        Ok(v) => values.push(v),
                        Err(e) => {
                            state.warnings.push(AscriptionWarning {
                                key: record.key().clone(),
                                line: record.lines[entries[i].seq].clone(),
                                reason: format!("{field} item {item}: {e}"),
                            });
                            values.push(None);
                        }
                    }
                }
                msg.set_sequence(field, to_sequence(values));
            }
            state.prior_lens.push(len);
            msg
        } else if let Some(prev) = i.checked_sub(1).map(|p| &entries[p].msg) {
            prev.clone()
        } else {
            state.warnings.push(AscriptionWarning {
                key: record.key().clone(),
                line: record.lines[entries[i].seq].clone(),
                reason: "first ascription carries no field values".to_owned(),
            });
            Message::from_key(record.key())
        };
        snapshot.set_fuzzy(entries[i].fuzzy);
        snapshot.obsolete = entries[i].obsolete;
        entries[i].msg = snapshot;
    }
    state
}

/// Sort newest first; equal timestamps keep the later line first.
pub fn order(entries: &mut [Ascription]) {
    entries.sort_by(|a, b| (b.date, b.seq).cmp(&(a.date, a.seq)));
}

/// Full decoded history of one record, without pivoting.
pub fn collect_single(record: &AscriptionRecord, settings: &AscribeSettings) -> RecordHistory {
    let (mut entries, mut warnings) = parse_entries(record, settings);
    let mut state = decode_snapshots(record, &mut entries);
    order(&mut entries);
    warnings.append(&mut state.warnings);
    for w in &warnings {
        warn!(key = %w.key, line = %w.line, reason = %w.reason, "malformed ascription comment");
    }
    state.history = entries;
    state.warnings = warnings;
    state
}

/// History of `msg` followed across fuzzy pivots.
///
/// Each pivot reads the record of the previous identity of the oldest
/// snapshot so far, keeping only entries not newer than that snapshot.
/// Identities already visited are never read again.
pub fn collect_pivoted(
    msg: &Message,
    acat: &AscriptionCatalog,
    settings: &AscribeSettings,
    shallow: bool,
) -> History {
    let mut history = History::new();
    let mut visited: HashSet<MessageKey> = HashSet::new();
    let mut key = msg.key();
    let mut bound: Option<Timestamp> = None;
    let mut first = true;

    loop {
        if !visited.insert(key.clone()) {
            debug!(%key, "pivot cycle, stopping");
            break;
        }
        let start = history.len();
        if let Some(record) = acat.get(&key) {
            let entries = collect_single(record, settings).history;
            history.extend(
                entries
                    .into_iter()
                    .filter(|a| bound.is_none() || a.date <= bound),
            );
        }
        if shallow {
            break;
        }

        let oldest = if history.len() > start {
            history.last().map(|a| &a.msg)
        } else if first {
            Some(msg)
        } else {
            None
        };
        let Some(oldest) = oldest else { break };
        let Some(previous_id) = oldest.msgid_previous.as_ref().filter(|_| oldest.is_fuzzy()) else {
            break;
        };
        if previous_id.is_empty() {
            break;
        }

        let next = MessageKey {
            msgctxt: oldest.msgctxt_previous.clone(),
            msgid: previous_id.clone(),
        };
        if history.len() > start {
            bound = history.last().and_then(|a| a.date);
        }
        key = next;
        first = false;
    }
    history
}

/// Put a synthetic unascribed entry on top when `live` is not the newest snapshot.
pub fn synthesize_unascribed_head(live: &Message, history: &mut History) {
    let matches = history
        .first()
        .is_some_and(|a| live.ascription_eq(&a.msg));
    if !matches {
        history.insert(0, Ascription::unascribed(live.clone()));
    }
}

/// Number entries 1, 2, ... from newest.
pub fn assign_positions(history: &mut History) {
    for (i, a) in history.iter_mut().enumerate() {
        a.pos = i + 1;
    }
}

/// Complete history of a live message.
///
/// The first entry is always present: either the newest ascription or the
/// synthetic unascribed one.
pub fn collect_history(
    msg: &Message,
    acat: &AscriptionCatalog,
    settings: &AscribeSettings,
    differ: &dyn Differencer,
    options: &HistoryOptions,
) -> History {
    let mut history = collect_pivoted(msg, acat, settings, options.shallow);
    synthesize_unascribed_head(msg, &mut history);
    assign_positions(&mut history);

    if options.drop_merges {
        drop_clean_merges(&mut history, &settings.merge_user, differ);
    }
    if let Some(filter) = &options.filter {
        collapse_under_filter(&mut history, filter.as_ref());
    }
    if let Some(mode) = options.reduce {
        reduce_to_diff(&mut history, mode, differ);
    }
    history
}

/// Index of the first non-fuzzy entry at or after `start`.
pub fn first_non_fuzzy(history: &[Ascription], start: usize) -> Option<usize> {
    history
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, a)| !a.msg.is_fuzzy())
        .map(|(i, _)| i)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use ascribe_core::time::parse_timestamp;
    use ascribe_settings::UserData;

    use super::*;
    use crate::differ::TokenDiffer;

    fn settings() -> AscribeSettings {
        let mut s = AscribeSettings::default();
        for id in ["alice", "bob"] {
            let _ = s.users.insert(
                id.into(),
                UserData {
                    name: id.into(),
                    ..UserData::default()
                },
            );
        }
        s
    }

    fn record(key: MessageKey, lines: &[&str], msgstr: &[&str]) -> AscriptionRecord {
        let mut r = AscriptionRecord::new(key);
        r.lines = lines.iter().map(|s| (*s).to_owned()).collect();
        *r.blobs_mut(TrackedField::Msgstr) = msgstr.iter().map(|s| (*s).to_owned()).collect();
        r
    }

    fn acat_with(records: Vec<AscriptionRecord>) -> AscriptionCatalog {
        let now = parse_timestamp("2024-01-01").unwrap();
        let mut acat = AscriptionCatalog::new("app", "a.po", &settings(), &now);
        for r in records {
            let target = acat.ensure(&r.key().clone());
            *target = r;
        }
        acat
    }

    #[test]
    fn parse_resets_state_on_modification_only() {
        let r = record(
            MessageKey::new(None, "Open"),
            &[
                "modified: alice | 2024-01-01 10:00:00+0000 | 1f",
                "reviewed: bob | 2024-01-02 10:00:00+0000",
                "modified: alice | 2024-01-03 10:00:00+0000 | 1",
            ],
            &["Otvori|~\n|~e0"],
        );
        let (entries, warnings) = parse_entries(&r, &settings());
        assert!(warnings.is_empty());
        assert!(entries[0].fuzzy);
        assert!(entries[1].fuzzy, "review inherits state");
        assert!(!entries[2].fuzzy);
    }

    #[test]
    fn malformed_lines_are_skipped_with_warning() {
        let r = record(
            MessageKey::new(None, "Open"),
            &[
                "garbage",
                "modified: carol | 2024-01-01 | 1",
                "modified: alice | 2024-01-01 10:00:00+0000 | 1",
                "modified: alice | 2024-01-02 10:00:00+0000 | 18446744073709551615",
                "modified: alice | 2024-01-03 10:00:00+999999999 | 1",
            ],
            &["Otvori|~"],
        );
        let single = collect_single(&r, &settings());
        assert_eq!(single.history.len(), 1);
        assert_eq!(single.warnings.len(), 4);
        assert_eq!(single.history[0].msg.msgstr, ["Otvori"]);
    }

    #[test]
    fn review_copies_previous_snapshot() {
        let r = record(
            MessageKey::new(None, "Open"),
            &[
                "modified: alice | 2024-01-01 10:00:00+0000 | 1",
                "reviewed: bob | 2024-01-02 10:00:00+0000",
            ],
            &["Otvori|~"],
        );
        let single = collect_single(&r, &settings());
        assert_eq!(single.history[0].kind, AscriptionKind::Review);
        assert_eq!(single.history[0].msg.msgstr, ["Otvori"]);
        assert_eq!(single.prior_lens, [1]);
    }

    #[test]
    fn review_first_gets_empty_snapshot_and_warning() {
        let r = record(
            MessageKey::new(None, "Open"),
            &["reviewed: bob | 2024-01-02 10:00:00+0000"],
            &[],
        );
        let single = collect_single(&r, &settings());
        assert_eq!(single.history.len(), 1);
        assert!(single.history[0].msg.msgstr.is_empty());
        assert_eq!(single.warnings.len(), 1);
    }

    #[test]
    fn order_is_newest_first_and_stable() {
        let r = record(
            MessageKey::new(None, "Open"),
            &[
                "modified: alice | 2024-01-02 10:00:00+0000 | 1",
                "modified: bob | 2024-01-01 10:00:00+0000 | 1",
                "reviewed: alice | 2024-01-02 10:00:00+0000",
            ],
            &["A|~\nB|~"],
        );
        let single = collect_single(&r, &settings());
        let seqs: Vec<usize> = single.history.iter().map(|a| a.seq).collect();
        assert_eq!(seqs, [2, 0, 1]);
    }

    #[test]
    fn never_ascribed_gets_synthetic_head() {
        let msg = Message::new("Open").with_translation("Otvori");
        let acat = acat_with(Vec::new());
        let history = collect_history(&msg, &acat, &settings(), &TokenDiffer, &HistoryOptions::default());
        assert_eq!(history.len(), 1);
        assert!(history[0].user.is_none());
        assert_eq!(history[0].kind, AscriptionKind::Modification);
        assert_eq!(history[0].msg, msg);
        assert_eq!(history[0].pos, 1);
    }

    #[test]
    fn ascribed_message_has_no_synthetic_head() {
        let msg = Message::new("Open").with_translation("Otvori");
        let acat = acat_with(vec![record(
            msg.key(),
            &["modified: alice | 2024-01-01 10:00:00+0000 | 1"],
            &["Otvori|~"],
        )]);
        let history = collect_history(&msg, &acat, &settings(), &TokenDiffer, &HistoryOptions::default());
        assert_eq!(history.len(), 1);
        assert!(history[0].is_by("alice"));
    }

    #[test]
    fn pivots_into_previous_identity() {
        let mut live = Message::new("Open file").with_translation("Otvori");
        live.set_fuzzy(true);
        live.msgid_previous = Some("Open".into());

        let old = record(
            MessageKey::new(None, "Open"),
            &[
                "modified: alice | 2024-01-01 10:00:00+0000 | 1",
                "modified: bob | 2024-06-01 10:00:00+0000 | 1",
            ],
            &["Otvori|~\nOtvaraj|~"],
        );
        let acat = acat_with(vec![old]);
        let history = collect_history(&live, &acat, &settings(), &TokenDiffer, &HistoryOptions::default());
        // live head + both entries of the old identity (no bound on the first pivot)
        assert_eq!(history.len(), 3);
        assert!(history[0].user.is_none());
        assert_eq!(history[1].msg.msgid, "Open");
        assert!(history[2].is_by("alice"));
    }

    #[test]
    fn pivot_is_bounded_by_oldest_entry() {
        let mut fuzzy_new = Message::new("Open file").with_translation("Otvori");
        fuzzy_new.set_fuzzy(true);
        fuzzy_new.msgid_previous = Some("Open".into());

        let new_rec = {
            let mut r = record(
                fuzzy_new.key(),
                &["modified: fuzzy | 2024-03-01 10:00:00+0000 | 1f"],
                &["Otvori|~"],
            );
            *r.blobs_mut(TrackedField::MsgidPrevious) = vec!["Open|~".to_owned()];
            r.fuzzy = true;
            r
        };
        let old_rec = record(
            MessageKey::new(None, "Open"),
            &[
                "modified: alice | 2024-01-01 10:00:00+0000 | 1",
                "modified: bob | 2024-06-01 10:00:00+0000 | 1",
            ],
            &["Otvori|~\nOtvaraj|~"],
        );
        let acat = acat_with(vec![new_rec, old_rec]);
        let history = collect_pivoted(&fuzzy_new, &acat, &settings(), false);
        let users: Vec<_> = history.iter().map(|a| a.user.clone().unwrap()).collect();
        assert_eq!(users, ["fuzzy", "alice"], "bob's entry is newer than the pivot");
    }

    #[test]
    fn pivot_cycle_terminates() {
        let mut a = Message::new("A").with_translation("x");
        a.set_fuzzy(true);
        a.msgid_previous = Some("B".into());

        let mk = |id: &str, prev: &str| {
            let mut r = record(
                MessageKey::new(None, id),
                &["modified: alice | 2024-01-01 10:00:00+0000 | 1f"],
                &["x|~"],
            );
            *r.blobs_mut(TrackedField::MsgidPrevious) = vec![format!("{prev}|~")];
            r
        };
        let acat = acat_with(vec![mk("A", "B"), mk("B", "A")]);
        let history = collect_pivoted(&a, &acat, &settings(), false);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn shallow_does_not_pivot() {
        let mut live = Message::new("Open file").with_translation("Otvori");
        live.set_fuzzy(true);
        live.msgid_previous = Some("Open".into());
        let acat = acat_with(vec![record(
            MessageKey::new(None, "Open"),
            &["modified: alice | 2024-01-01 10:00:00+0000 | 1"],
            &["Otvori|~"],
        )]);
        assert!(collect_pivoted(&live, &acat, &settings(), true).is_empty());
    }

    #[test]
    fn first_non_fuzzy_skips_fuzzy() {
        let mut fuzzy = Ascription::unascribed(Message::new("a"));
        fuzzy.msg.set_fuzzy(true);
        let plain = Ascription::unascribed(Message::new("a"));
        let history = vec![fuzzy.clone(), fuzzy, plain];
        assert_eq!(first_non_fuzzy(&history, 0), Some(2));
        assert_eq!(first_non_fuzzy(&history, 3), None);
    }
}
