//! Appending ascriptions to records.

use ascribe_core::time::Timestamp;
use ascribe_core::{Message, TrackedField};
use ascribe_settings::AscribeSettings;
use tracing::{debug, warn};

use crate::codec::{FieldDecoder, encode_field, minimal_separator_length, separator_values};
use crate::errors::{HistoryError, Result};
use crate::grammar::{AscriptionKind, AscriptionLine, Trailer};
use crate::reconstruct::collect_single;
use crate::record::AscriptionCatalog;

/// What one append wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Lines appended, one per tag.
    pub lines: usize,
    /// Marker length of the field write, 0 if no field changed.
    pub separator_length: usize,
    /// Fuzzy or obsolete state changed.
    pub state_changed: bool,
}

impl WriteOutcome {
    /// Whether field values were encoded.
    pub fn fields_changed(&self) -> bool {
        self.separator_length > 0
    }
}

fn check_user(user: &str, kind: AscriptionKind, settings: &AscribeSettings) -> Result<()> {
    if !settings.is_known_user(user) {
        return Err(HistoryError::UnknownUser(user.to_owned()));
    }
    if kind == AscriptionKind::Review && settings.is_merge_user(user) {
        return Err(HistoryError::UserNotAllowed {
            user: user.to_owned(),
            operation: "review",
        });
    }
    Ok(())
}

/// Append one ascription of `live` to its record in `acat`.
///
/// The record is created if missing. Field values are encoded only when
/// they differ from the newest snapshot (or on the very first write). With
/// several tags, one line is written per tag and only the first carries the
/// trailing block. An empty `tags` means the untagged action.
pub fn append(
    live: &Message,
    acat: &mut AscriptionCatalog,
    kind: AscriptionKind,
    tags: &[String],
    user: &str,
    date: &Timestamp,
    settings: &AscribeSettings,
) -> Result<WriteOutcome> {
    check_user(user, kind, settings)?;
    if let Some(tag) = tags.iter().find(|t| !settings.is_known_tag(t)) {
        return Err(HistoryError::UnknownTag(tag.clone()));
    }

    let key = live.key();
    let prior = acat.get(&key).map(|r| collect_single(r, settings)).unwrap_or_default();
    let (fields_changed, state_changed) = match prior.history.first() {
        Some(newest) => (
            newest.msg.tracked_differs(live),
            newest.fuzzy != live.is_fuzzy() || newest.obsolete != live.obsolete,
        ),
        None => (true, true),
    };

    let separator_length = if fields_changed {
        match minimal_separator_length(&separator_values(live), settings.max_separator_length) {
            Ok(len) => len,
            Err(e) => {
                warn!(%key, error = %e, "cannot encode message fields");
                return Err(e);
            }
        }
    } else {
        0
    };

    // Modification lines reset the state markers, so they always restate them.
    let trailer = (fields_changed || state_changed || kind == AscriptionKind::Modification).then_some(Trailer {
        separator_length,
        obsolete: live.obsolete,
        fuzzy: live.is_fuzzy(),
    });

    let untagged = [String::new()];
    let tags = if tags.is_empty() { &untagged[..] } else { tags };

    let record = acat.ensure(&key);
    for (i, tag) in tags.iter().enumerate() {
        let line = AscriptionLine {
            kind,
            tag: tag.clone(),
            user: user.to_owned(),
            date: *date,
            trailer: if i == 0 { trailer } else { None },
        };
        record.lines.push(line.to_string());
    }

    if fields_changed {
        for field in TrackedField::ALL {
            let values = live.live_sequence(field);
            let blobs = record.blobs_mut(field);
            if values.is_empty() && blobs.is_empty() {
                continue;
            }
            let fresh = FieldDecoder::new();
            let decoder = prior.decoders.get(&field).unwrap_or(&fresh);
            encode_field(blobs, decoder, &prior.prior_lens, &values, separator_length);
        }
    }
    record.fuzzy = live.is_fuzzy();
    record.obsolete = live.obsolete;
    acat.mark_dirty(date);

    debug!(%key, %kind, user, separator_length, "ascription appended");
    Ok(WriteOutcome {
        lines: tags.len(),
        separator_length,
        state_changed,
    })
}

/// Ascribe `live` as modified by `user`.
pub fn ascribe_modification(
    live: &Message,
    acat: &mut AscriptionCatalog,
    user: &str,
    date: &Timestamp,
    settings: &AscribeSettings,
) -> Result<WriteOutcome> {
    append(live, acat, AscriptionKind::Modification, &[], user, date, settings)
}

/// Ascribe `live` as reviewed by `user` under `tags`.
pub fn ascribe_review(
    live: &Message,
    acat: &mut AscriptionCatalog,
    tags: &[String],
    user: &str,
    date: &Timestamp,
    settings: &AscribeSettings,
) -> Result<WriteOutcome> {
    append(live, acat, AscriptionKind::Review, tags, user, date, settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
