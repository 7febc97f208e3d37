//! Field separator codec.
//!
//! All historical values of one tracked field item are multiplexed into a
//! single blob. Each field-changing write appends exactly one token, tokens
//! are joined with `\n`, and every token ends in (or is) the write's marker
//! `|` followed by `L` tildes:
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `<value><marker>` | the item had this literal value |
//! | `<marker>e<N>` | same value as the N-th field-changing write |
//! | `<marker>x` | the item did not exist |
//!
//! `L` is chosen per write so that the marker occurs in none of the values
//! written, which makes the first marker after the cursor the end of the
//! literal. Tokens are appended in write order and decoded oldest first; the
//! blob cannot be indexed randomly, so decoding threads a [`FieldDecoder`]
//! through all writes.

use ascribe_core::Message;
use ascribe_core::TrackedField;

use crate::errors::{HistoryError, Result};

/// First character of every marker.
pub const MARKER_HEAD: char = '|';
/// Repeated marker character.
pub const MARKER_EXT: char = '~';
/// Modifier for an absent item.
pub const ABSENT_MOD: char = 'x';
/// Modifier for a back-reference.
pub const BACKREF_MOD: char = 'e';

const TOKEN_SEP: char = '\n';

/// The marker of length `len`.
pub fn marker(len: usize) -> String {
    let mut s = String::with_capacity(len.saturating_add(1));
    s.push(MARKER_HEAD);
    s.extend(std::iter::repeat_n(MARKER_EXT, len));
    s
}

/// Smallest `L >= 1` whose marker occurs in none of `values`.
///
/// A marker of length `L` occurs exactly where a `|` is followed by at least
/// `L` tildes, so the answer is one more than the longest such run.
pub fn minimal_separator_length<S: AsRef<str>>(values: &[S], cap: usize) -> Result<usize> {
    let mut longest = 0;
    for value in values {
        let value = value.as_ref();
        let mut rest = value;
        while let Some(p) = rest.find(MARKER_HEAD) {
            let after = &rest[p + 1..];
            let run = after.chars().take_while(|&c| c == MARKER_EXT).count();
            longest = longest.max(run);
            rest = after;
        }
    }
    let len = longest + 1;
    if len > cap {
        return Err(HistoryError::SeparatorCap { cap });
    }
    Ok(len)
}

/// All tracked values of a live message, for separator selection.
pub fn separator_values(msg: &Message) -> Vec<String> {
    TrackedField::ALL
        .iter()
        .flat_map(|&f| msg.live_sequence(f))
        .collect()
}

/// One encoded token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// A literal value.
    Literal(&'a str),
    /// Same value as the N-th field-changing write.
    BackRef(usize),
    /// The item does not exist in this write.
    Absent,
}

impl Token<'_> {
    /// Render with the marker of length `len`.
    pub fn render(&self, len: usize) -> String {
        let m = marker(len);
        match self {
            Token::Literal(value) => format!("{value}{m}"),
            Token::BackRef(n) => format!("{m}{BACKREF_MOD}{n}"),
            Token::Absent => format!("{m}{ABSENT_MOD}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
struct ItemState {
    offset: usize,
    values: Vec<Option<String>>,
}

/// Decoding state for all items of one field of one record.
///
/// Every call to [`FieldDecoder::step`] consumes one token of one item and
/// records the decoded value, so back-references can be resolved later.
#[derive(Clone, Debug, Default)]
pub struct FieldDecoder {
    items: Vec<ItemState>,
}

impl FieldDecoder {
    /// Fresh state, cursors at the start of every blob.
    pub fn new() -> Self {
        Self::default()
    }

    fn item_mut(&mut self, item: usize) -> &mut ItemState {
        if item >= self.items.len() {
            self.items.resize_with(item + 1, ItemState::default);
        }
        &mut self.items[item]
    }

    /// Values decoded so far for `item`, one per field-changing write.
    pub fn values(&self, item: usize) -> &[Option<String>] {
        self.items.get(item).map_or(&[], |s| s.values.as_slice())
    }

    /// Consume the next token of `item` from `blob`, written with marker length `len`.
    ///
    /// A token that cannot be resolved still advances the cursor and counts
    /// as an absent value, so later back-references stay aligned; the error
    /// is returned for reporting.
    pub fn step(&mut self, blob: &str, item: usize, len: usize) -> Result<Option<String>> {
        let m = marker(len);
        let state = self.item_mut(item);
        let p0 = state.offset.min(blob.len());

        let Some(rel) = blob[p0..].find(&m) else {
            state.offset = blob.len();
            state.values.push(None);
            return Err(HistoryError::MissingMarker { len, offset: p0 });
        };
        let p1 = p0 + rel;
        let tail = p1 + m.len();
        let p2 = blob[tail..].find(TOKEN_SEP).map_or(blob.len(), |r| tail + r);
        state.offset = p2 + TOKEN_SEP.len_utf8();

        let mods = &blob[tail..p2];
        let decoded = if let Some(q) = mods.find(BACKREF_MOD) {
            let digits: String = mods[q + 1..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            match digits.parse::<usize>() {
                Ok(n) if n < state.values.len() => Ok(state.values[n].clone()),
                Ok(n) => Err(HistoryError::BackReference {
                    index: n,
                    available: state.values.len(),
                }),
                Err(_) => Err(HistoryError::MalformedToken(mods.to_owned())),
            }
        } else if mods.contains(ABSENT_MOD) {
            Ok(None)
        } else {
            Ok(Some(blob[p0..p1].to_owned()))
        };

        state.values.push(decoded.as_ref().ok().cloned().flatten());
        decoded
    }
}

/// Turn decoded item values into a field sequence.
///
/// Absent items after the last present one vanish; absent items before it
/// become empty strings.
pub fn to_sequence(values: Vec<Option<String>>) -> Vec<String> {
    let keep = values.iter().rposition(Option::is_some).map_or(0, |p| p + 1);
    values
        .into_iter()
        .take(keep)
        .map(Option::unwrap_or_default)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Append one write's tokens for one field.
///
/// `decoder` holds the values of every earlier field-changing write (it must
/// have been stepped through all of them); `prior_lens` are those writes'
/// marker lengths in write order. Items new in `live` are first padded with
/// an absence token per earlier write.
pub fn encode_field(
    blobs: &mut Vec<String>,
    decoder: &FieldDecoder,
    prior_lens: &[usize],
    live: &[String],
    len: usize,
) {
    if blobs.len() < live.len() {
        let padding = prior_lens
            .iter()
            .map(|&l| Token::Absent.render(l))
            .collect::<Vec<_>>()
            .join("\n");
        blobs.resize(live.len(), padding);
    }

    for (i, blob) in blobs.iter_mut().enumerate() {
        let token = match live.get(i) {
            Some(value) => decoder
                .values(i)
                .iter()
                .position(|v| v.as_deref() == Some(value.as_str()))
                .map_or(Token::Literal(value), Token::BackRef),
            None => Token::Absent,
        };
        if !blob.is_empty() {
            blob.push(TOKEN_SEP);
        }
        blob.push_str(&token.render(len));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
