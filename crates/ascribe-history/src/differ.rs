//! Text differencing used by the history filters and review selection.
//!
//! The engine only needs three answers from a differencer, captured by the
//! [`Differencer`] trait. [`TokenDiffer`] is the stock implementation: it
//! splits text into word, whitespace and punctuation tokens and aligns them
//! with a longest-common-subsequence table.

use std::ops::Range;

use ascribe_core::Message;

/// Role of a diff span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffTag {
    /// Text present in both.
    Equal,
    /// Text only in the newer string.
    Added,
    /// Text only in the older string.
    Removed,
}

/// A contiguous run of one role.
///
/// `range` indexes the older string for [`DiffTag::Removed`] and the newer
/// string otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffSpan {
    /// Role.
    pub tag: DiffTag,
    /// Byte range.
    pub range: Range<usize>,
}

/// The differencing service.
pub trait Differencer: Send + Sync {
    /// Whether `newer` differs from `older` only as a catalog merge would make it.
    fn is_pure_merge(&self, older: &Message, newer: &Message) -> bool {
        merge_modified(older, newer)
    }

    /// Spans turning `a` into `b`, in order.
    fn diff_spans(&self, a: &str, b: &str) -> Vec<DiffSpan>;

    /// Similarity of `a` and `b`, from 0.0 (nothing shared) to 1.0 (equal).
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Whether `newer` may be derived from `older` by merging with a template.
///
/// Translator comments never change on merge. The original-text fields
/// must match directly when both messages are equally fuzzy, and crosswise
/// between previous and current when the fuzzy state flipped. Translations
/// must be unchanged, except that a fuzzy side may have gained or lost
/// plural forms by copying the first form.
pub fn merge_modified(older: &Message, newer: &Message) -> bool {
    if older.manual_comment != newer.manual_comment {
        return false;
    }

    let current = |m: &Message| (m.msgctxt.clone(), Some(m.msgid.clone()), m.msgid_plural.clone());
    let previous = |m: &Message| {
        (
            m.msgctxt_previous.clone(),
            m.msgid_previous.clone(),
            m.msgid_plural_previous.clone(),
        )
    };
    let originals_match = match (older.is_fuzzy(), newer.is_fuzzy()) {
        (true, true) => previous(older) == previous(newer),
        (false, false) => current(older) == current(newer),
        (true, false) => previous(older) == current(newer),
        (false, true) => current(older) == previous(newer),
    };
    if !originals_match {
        return false;
    }

    if older.msgid_plural.is_some() == newer.msgid_plural.is_some() {
        return older.msgstr == newer.msgstr;
    }
    if !older.is_fuzzy() && !newer.is_fuzzy() {
        return false;
    }
    if older.msgid_plural.is_some() {
        older.msgstr.first() == newer.msgstr.first()
    } else {
        let first = older.msgstr.first();
        newer.msgstr.iter().all(|s| Some(s) == first)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token differ
// ─────────────────────────────────────────────────────────────────────────────

/// LCS differ over word, whitespace and punctuation tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenDiffer;

#[derive(Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Word,
    Space,
    Other,
}

fn class_of(c: char) -> TokenClass {
    if c.is_alphanumeric() || c == '_' {
        TokenClass::Word
    } else if c.is_whitespace() {
        TokenClass::Space
    } else {
        TokenClass::Other
    }
}

/// Byte ranges of the tokens of `s`.
fn tokenize(s: &str) -> Vec<Range<usize>> {
    let mut tokens: Vec<Range<usize>> = Vec::new();
    let mut prev: Option<TokenClass> = None;
    for (i, c) in s.char_indices() {
        let class = class_of(c);
        let extend = class != TokenClass::Other && prev == Some(class);
        match tokens.last_mut() {
            Some(last) if extend => last.end = i + c.len_utf8(),
            _ => tokens.push(i..i + c.len_utf8()),
        }
        prev = Some(class);
    }
    tokens
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EditOp {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Edit script from `old` to `new`.
///
/// The common prefix and suffix are matched first so that appended or
/// prepended text is never aligned across a repeated token.
fn compute_edit_ops(old: &[&str], new: &[&str]) -> Vec<EditOp> {
    let prefix = old.iter().zip(new).take_while(|(o, w)| o == w).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(o, w)| o == w)
        .count();
    let (n, m) = (old.len() - prefix - suffix, new.len() - prefix - suffix);
    let mid_old = &old[prefix..prefix + n];
    let mid_new = &new[prefix..prefix + m];

    let mut dp = vec![vec![0u32; m + 1]; n + 1];
    for (i, o) in mid_old.iter().enumerate() {
        for (j, w) in mid_new.iter().enumerate() {
            dp[i + 1][j + 1] = if o == w {
                dp[i][j] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }

    let mut middle = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && mid_old[i - 1] == mid_new[j - 1] {
            middle.push(EditOp::Equal(prefix + i - 1, prefix + j - 1));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i][j - 1] >= dp[i - 1][j]) {
            middle.push(EditOp::Insert(prefix + j - 1));
            j -= 1;
        } else {
            middle.push(EditOp::Delete(prefix + i - 1));
            i -= 1;
        }
    }
    middle.reverse();

    let mut ops: Vec<EditOp> = (0..prefix).map(|k| EditOp::Equal(k, k)).collect();
    ops.extend(middle);
    ops.extend((0..suffix).map(|k| EditOp::Equal(prefix + n + k, prefix + m + k)));
    ops
}

impl Differencer for TokenDiffer {
    fn diff_spans(&self, a: &str, b: &str) -> Vec<DiffSpan> {
        let ta = tokenize(a);
        let tb = tokenize(b);
        let wa: Vec<&str> = ta.iter().map(|r| &a[r.clone()]).collect();
        let wb: Vec<&str> = tb.iter().map(|r| &b[r.clone()]).collect();

        let mut spans: Vec<DiffSpan> = Vec::new();
        for op in compute_edit_ops(&wa, &wb) {
            let (tag, range) = match op {
                EditOp::Equal(_, j) => (DiffTag::Equal, tb[j].clone()),
                EditOp::Insert(j) => (DiffTag::Added, tb[j].clone()),
                EditOp::Delete(i) => (DiffTag::Removed, ta[i].clone()),
            };
            match spans.last_mut() {
                Some(last) if last.tag == tag && last.range.end == range.start => {
                    last.range.end = range.end;
                }
                _ => spans.push(DiffSpan { tag, range }),
            }
        }
        spans
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        let total = a.chars().count() + b.chars().count();
        if total == 0 {
            return 1.0;
        }
        let shared: usize = self
            .diff_spans(a, b)
            .iter()
            .filter(|s| s.tag == DiffTag::Equal)
            .map(|s| b[s.range.clone()].chars().count())
            .sum();
        (2 * shared) as f64 / total as f64
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
