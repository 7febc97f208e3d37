//! Catalog-level operations.
//!
//! Each operation works on one catalog and its shadow ascription catalog:
//! ascribing modifications, ascribing reviews, counting states, and
//! preparing messages for review. Operations on different catalogs are
//! independent and may run on separate threads sharing one
//! [`ModifiedReport`].

use std::collections::{BTreeMap, HashSet};

use ascribe_core::review::{CHAIN_COMMENT_PREFIX, DIFF_FLAG, DIFF_FLAG_IGNORED, DIFF_FLAG_TOTAL};
use ascribe_core::time::Timestamp;
use ascribe_core::{Catalog, Message, MessageKey, MessageState};
use ascribe_settings::AscribeSettings;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::differ::Differencer;
use crate::errors::Result;
use crate::reconstruct::{Ascription, HistoryOptions, collect_history, collect_single, first_non_fuzzy};
use crate::record::AscriptionCatalog;
use crate::report::ModifiedReport;
use crate::selection::{MessageSelector, Selection, SelectionInput};
use crate::writer::{ascribe_modification, ascribe_review};

/// Shared inputs of one run.
#[derive(Clone)]
pub struct RunContext<'a> {
    /// Loaded settings.
    pub settings: &'a AscribeSettings,
    /// Differencing service.
    pub differ: &'a dyn Differencer,
    /// Where modified files are recorded.
    pub report: &'a ModifiedReport,
    /// History post-processing for selector input.
    pub options: HistoryOptions,
    /// Timestamp written into every ascription of the run.
    pub date: Timestamp,
}

impl RunContext<'_> {
    fn history(&self, msg: &Message, acat: &AscriptionCatalog) -> Vec<Ascription> {
        collect_history(msg, acat, self.settings, self.differ, &self.options)
    }
}

/// Message counts per state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateCounts {
    counts: BTreeMap<MessageState, usize>,
}

impl StateCounts {
    /// Count one message.
    pub fn add(&mut self, state: MessageState) {
        *self.counts.entry(state).or_default() += 1;
    }

    /// Count for one state.
    pub fn get(&self, state: MessageState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    /// Sum over all states.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Add another set of counts to this one.
    pub fn merge(&mut self, other: &Self) {
        for (&state, &n) in &other.counts {
            *self.counts.entry(state).or_default() += n;
        }
    }
}

fn is_unascribed(history: &[Ascription]) -> bool {
    history.first().is_none_or(|a| a.user.is_none())
}

/// Unascribed and without any tracked content: nothing worth ascribing.
fn is_pristine(msg: &Message, history: &[Ascription]) -> bool {
    is_unascribed(history) && !msg.has_tracked_parts()
}

/// Newest snapshots of records whose message left the catalog without
/// being ascribed obsolete, marked obsolete.
fn vanished_snapshots(cat: &Catalog, acat: &AscriptionCatalog, settings: &AscribeSettings) -> Vec<Message> {
    acat.iter()
        .filter(|r| !r.obsolete && !cat.contains(r.key()))
        .filter_map(|r| collect_single(r, settings).history.into_iter().next())
        .map(|a| {
            let mut msg = a.msg;
            msg.obsolete = true;
            msg
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Ascribe modified
// ─────────────────────────────────────────────────────────────────────────────

/// Ascribe every unascribed, non-pristine message as modified by `user`.
///
/// Records whose message vanished from the catalog are ascribed as
/// obsolete. Returns the number of ascribed messages per state.
pub fn ascribe_modified_catalog(
    cat: &Catalog,
    acat: &mut AscriptionCatalog,
    user: &str,
    ctx: &RunContext<'_>,
) -> Result<StateCounts> {
    let shallow = HistoryOptions::shallow();
    let mut counts = StateCounts::default();
    let mut pending: Vec<Message> = Vec::new();

    for msg in cat {
        let history = collect_history(msg, acat, ctx.settings, ctx.differ, &shallow);
        if is_unascribed(&history) && msg.has_tracked_parts() {
            counts.add(msg.state());
            pending.push(msg.clone());
        }
    }
    for msg in vanished_snapshots(cat, acat, ctx.settings) {
        counts.add(msg.state());
        pending.push(msg);
    }

    for msg in &pending {
        let _ = ascribe_modification(msg, acat, user, &ctx.date, ctx.settings)?;
    }
    if acat.is_dirty() {
        ctx.report.add(acat.path());
        info!(catalog = %cat.path().display(), count = pending.len(), "ascribed modifications");
    }
    Ok(counts)
}

// ─────────────────────────────────────────────────────────────────────────────
// Ascribe reviewed
// ─────────────────────────────────────────────────────────────────────────────

/// Result of ascribing reviews in one catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Messages ascribed as reviewed.
    pub reviewed: usize,
    /// Selected messages that were never ascribed as modified, by
    /// `(line, entry)` reference.
    pub not_modified: Vec<(usize, usize)>,
}

/// Ascribe selected messages as reviewed by `user` under `tags`.
///
/// Review marks are cleared from the catalog first; messages marked
/// unreviewed are left out. Messages without a modification ascription
/// cannot be reviewed and are reported back instead.
pub fn ascribe_reviewed_catalog(
    cat: &mut Catalog,
    acat: &mut AscriptionCatalog,
    user: &str,
    tags: &[String],
    selector: &dyn MessageSelector,
    ctx: &RunContext<'_>,
) -> Result<ReviewOutcome> {
    let cleared = cat.clear_review_marks(false);
    if !cleared.is_empty() {
        ctx.report.add(cat.path());
    }
    let unreviewed: HashSet<usize> = cleared
        .iter()
        .filter(|(_, marks)| marks.unreviewed)
        .map(|&(i, _)| i)
        .collect();

    let mut outcome = ReviewOutcome::default();
    let mut selected: Vec<Message> = Vec::new();
    for (i, msg) in cat.iter().enumerate() {
        if unreviewed.contains(&i) {
            continue;
        }
        let history = ctx.history(msg, acat);
        if is_pristine(msg, &history) {
            continue;
        }
        let input = SelectionInput {
            msg,
            catalog: cat,
            acat,
            history: &history,
        };
        if !selector.select(&input).is_match() {
            continue;
        }
        if is_unascribed(&history) {
            outcome.not_modified.push((msg.refline, msg.refentry));
            continue;
        }
        selected.push(msg.clone());
    }

    if !outcome.not_modified.is_empty() {
        let refs: Vec<String> = outcome
            .not_modified
            .iter()
            .map(|(line, entry)| format!("{line}(#{entry})"))
            .collect();
        warn!(
            catalog = %cat.path().display(),
            messages = %refs.join(", "),
            "some messages cannot be ascribed as reviewed because they were not ascribed as modified"
        );
    }

    for msg in &selected {
        let _ = ascribe_review(msg, acat, tags, user, &ctx.date, ctx.settings)?;
    }
    outcome.reviewed = selected.len();
    if acat.is_dirty() {
        ctx.report.add(acat.path());
        info!(catalog = %cat.path().display(), count = outcome.reviewed, "ascribed reviews");
    }
    Ok(outcome)
}

// ─────────────────────────────────────────────────────────────────────────────
// Examine state
// ─────────────────────────────────────────────────────────────────────────────

/// Ascribed and unascribed message counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateReport {
    /// Messages whose newest history entry is ascribed.
    pub ascribed: StateCounts,
    /// Messages waiting for a modification ascription.
    pub unascribed: StateCounts,
}

impl StateReport {
    /// Add another catalog's counts to this one.
    pub fn merge(&mut self, other: &Self) {
        self.ascribed.merge(&other.ascribed);
        self.unascribed.merge(&other.unascribed);
    }
}

/// Count selected messages by state and ascription status.
///
/// The catalog is examined as it would be without review marks. Records
/// whose message vanished count as unascribed in their obsolete state.
pub fn examine_state(
    cat: &Catalog,
    acat: &AscriptionCatalog,
    selector: &dyn MessageSelector,
    ctx: &RunContext<'_>,
) -> StateReport {
    let mut clean = cat.clone();
    let _ = clean.clear_review_marks(false);

    let mut report = StateReport::default();
    for msg in &clean {
        let history = ctx.history(msg, acat);
        if is_pristine(msg, &history) {
            continue;
        }
        let input = SelectionInput {
            msg,
            catalog: &clean,
            acat,
            history: &history,
        };
        if !selector.select(&input).is_match() {
            continue;
        }
        if is_unascribed(&history) {
            report.unascribed.add(msg.state());
        } else {
            report.ascribed.add(msg.state());
        }
    }
    for msg in vanished_snapshots(cat, acat, ctx.settings) {
        report.unascribed.add(msg.state());
    }
    report
}

// ─────────────────────────────────────────────────────────────────────────────
// Select for review
// ─────────────────────────────────────────────────────────────────────────────

/// How a selected message is to be shown to the reviewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffDecision {
    /// Show the difference against the pivot snapshot.
    Embed,
    /// A pivot exists but its original text is too different to diff against.
    Ignored,
    /// No pivot: the whole message is to be reviewed.
    Total,
}

impl DiffDecision {
    /// Flag added to the message.
    pub fn flag(self) -> &'static str {
        match self {
            Self::Embed => DIFF_FLAG,
            Self::Ignored => DIFF_FLAG_IGNORED,
            Self::Total => DIFF_FLAG_TOTAL,
        }
    }
}

/// One message put up for review.
#[derive(Clone, Debug)]
pub struct ReviewCandidate {
    /// Position of the message in its catalog.
    pub index: usize,
    /// Identity of the message.
    pub key: MessageKey,
    /// Snapshot the message should be compared with, if any.
    pub pivot: Option<Message>,
    /// How to present the message.
    pub decision: DiffDecision,
    /// The `~ascto:` comment listing the ascriptions since the pivot.
    pub chain: String,
}

/// The ascriptions newer than `upto` (exclusive), oldest first.
fn chain_comment(history: &[Ascription], upto: usize) -> String {
    let items: Vec<String> = history[..upto.min(history.len())]
        .iter()
        .rev()
        .map(|a| {
            let user = a.user.as_deref().unwrap_or("?");
            let kind = a.kind.short();
            if a.tag.is_empty() {
                format!("{user}:{kind}")
            } else {
                format!("{user}:{kind}({})", a.tag)
            }
        })
        .collect();
    format!("{CHAIN_COMMENT_PREFIX} {}", items.join(" "))
}

/// Flag selected messages for review and annotate their ascription chains.
///
/// The entry to compare against comes from `pivot` when given; otherwise a
/// history match of `selector` picks the first non-fuzzy entry older than
/// the matched one. Messages get one of the `ediff` flags and a chain
/// comment. Existing review marks are cleared first.
pub fn select_for_review(
    cat: &mut Catalog,
    acat: &AscriptionCatalog,
    selector: &dyn MessageSelector,
    pivot: Option<&dyn MessageSelector>,
    ctx: &RunContext<'_>,
) -> Vec<ReviewCandidate> {
    let cleared = !cat.clear_review_marks(false).is_empty();

    let mut candidates = Vec::new();
    for (index, msg) in cat.iter().enumerate() {
        let history = ctx.history(msg, acat);
        if is_pristine(msg, &history) {
            continue;
        }
        let input = SelectionInput {
            msg,
            catalog: cat,
            acat,
            history: &history,
        };
        let selection = selector.select(&input);
        if !selection.is_match() {
            continue;
        }

        let i_asc = match (pivot, selection) {
            (Some(p), _) => p.select(&input).history_index(),
            (None, Selection::History(pos)) if pos > 0 => first_non_fuzzy(&history, pos),
            _ => None,
        };
        let pivot_msg = i_asc.and_then(|i| history.get(i)).map(|a| a.msg.clone());
        let decision = match &pivot_msg {
            Some(old) => {
                let sim = ctx.differ.similarity(&old.msgid, &msg.msgid);
                if sim > ctx.settings.min_adjusted_similarity {
                    DiffDecision::Embed
                } else {
                    DiffDecision::Ignored
                }
            }
            None => DiffDecision::Total,
        };
        let chain = chain_comment(&history, i_asc.unwrap_or(history.len()));
        debug!(key = %msg.key(), ?decision, "selected for review");
        candidates.push(ReviewCandidate {
            index,
            key: msg.key(),
            pivot: pivot_msg,
            decision,
            chain,
        });
    }

    let mut next = candidates.iter().peekable();
    let mut index = 0;
    cat.for_each_mut(|msg| {
        if let Some(c) = next.next_if(|c| c.index == index) {
            let _ = msg.flags.insert(c.decision.flag().to_owned());
            msg.auto_comment.push(c.chain.clone());
        }
        index += 1;
    });

    if cleared || !candidates.is_empty() {
        ctx.report.add(cat.path());
    }
    candidates
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
