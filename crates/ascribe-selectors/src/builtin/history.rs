//! Selectors that point at an entry of the message history.
//!
//! All of them answer [`Selection::History`] with a 1-based position, and
//! 0 for messages that were never ascribed.

use std::borrow::Cow;
use std::sync::Arc;

use ascribe_core::time::{Timestamp, parse_timestamp};
use ascribe_core::{Message, TrackedField};
use ascribe_history::filter::reduce_message;
use ascribe_history::reconstruct::first_non_fuzzy;
use ascribe_history::{Ascription, DiffMode, Differencer, MessageSelector, Selection, SelectionInput};

use super::is_unascribed;
use crate::errors::{Result, SelectorError};
use crate::matcher::Matcher;
use crate::sets::{TagSet, UserSet};
use crate::traits::{SelectorEnv, arg};

fn users_arg(env: &SelectorEnv, args: &[&str], i: usize, selector: &str) -> Result<Arc<UserSet>> {
    env.cache.users(arg(args, i).unwrap_or_default(), &env.settings, selector)
}

fn tags_arg(env: &SelectorEnv, args: &[&str], i: usize, selector: &str) -> Result<Arc<TagSet>> {
    env.cache.tags(arg(args, i).unwrap_or_default(), &env.settings, selector)
}

/// Wrap a position finder that only runs on ascribed histories.
fn ascribed_only<F>(find: F) -> Box<dyn MessageSelector>
where
    F: Fn(&SelectionInput<'_>) -> Option<usize> + Send + Sync + 'static,
{
    Box::new(move |input: &SelectionInput<'_>| {
        if is_unascribed(input.history) {
            return Selection::History(0);
        }
        Selection::History(find(input).map_or(0, |i| i + 1))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// hexpr
// ─────────────────────────────────────────────────────────────────────────────

/// Copy of `msg` with every tracked field emptied.
fn emptied(msg: &Message) -> Message {
    let mut out = msg.clone();
    for field in TrackedField::ALL {
        out.set_sequence(field, Vec::new());
    }
    out
}

fn find_expression(
    history: &[Ascription],
    matcher: &Matcher,
    users: &UserSet,
    mode: Option<DiffMode>,
    differ: &dyn Differencer,
) -> Option<usize> {
    let mut i = match mode {
        Some(_) => first_non_fuzzy(history, 0)?,
        None => 0,
    };
    while i < history.len() {
        let a = &history[i];
        if !users.allows(a.user.as_deref()) {
            i += 1;
            continue;
        }
        let (candidate, next) = match mode {
            None => (Cow::Borrowed(&a.msg), i + 1),
            Some(mode) => {
                let next = first_non_fuzzy(history, i + 1);
                let older = next.map_or_else(|| emptied(&a.msg), |j| history[j].msg.clone());
                let mut reduced = a.msg.clone();
                reduce_message(&older, &mut reduced, mode, differ);
                (Cow::Owned(reduced), next.unwrap_or(history.len()))
            }
        };
        if matcher.is_match(&candidate) {
            return Some(i);
        }
        i = next;
    }
    None
}

/// Newest entry matching an expression, optionally by given users.
///
/// With a diff mode as third argument, each non-fuzzy entry is first reduced
/// to what it added, removed or kept against the next older non-fuzzy one.
pub fn hexpr(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let expr = arg(args, 0)
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| SelectorError::bad_argument("hexpr", "matching expression cannot be empty"))?;
    let matcher = env.cache.matcher(expr, "hexpr")?;
    let users = users_arg(env, args, 1, "hexpr")?;
    let mode = arg(args, 2)
        .map(|m| {
            DiffMode::from_name(m)
                .ok_or_else(|| SelectorError::bad_argument("hexpr", format!("unknown diff mode '{m}'")))
        })
        .transpose()?;
    let differ = Arc::clone(&env.differ);
    Ok(ascribed_only(move |input| {
        find_expression(input.history, &matcher, &users, mode, differ.as_ref())
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// asc, mod, rev
// ─────────────────────────────────────────────────────────────────────────────

/// Newest ascription of any kind.
pub fn asc(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let users = users_arg(env, args, 0, "asc")?;
    Ok(ascribed_only(move |input| {
        input.history.iter().position(|a| users.allows(a.user.as_deref()))
    }))
}

/// Newest modification.
pub fn modified(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let users = users_arg(env, args, 0, "mod")?;
    Ok(ascribed_only(move |input| {
        input
            .history
            .iter()
            .position(|a| a.user.is_some() && a.is_modification() && users.allows(a.user.as_deref()))
    }))
}

/// Newest review with one of the given tags.
pub fn rev(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let users = users_arg(env, args, 0, "rev")?;
    let tags = tags_arg(env, args, 1, "rev")?;
    Ok(ascribed_only(move |input| {
        input
            .history
            .iter()
            .position(|a| a.is_review() && tags.contains(&a.tag) && users.allows(a.user.as_deref()))
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Modifications after a cancelling entry
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters shared by `modar`, `modam`, `modarm` and `tmodar`.
struct ModSince {
    stop_at_modification: bool,
    stop_at_review: bool,
    translation_only: bool,
    musers: Arc<UserSet>,
    rmusers: Arc<UserSet>,
    tags: Arc<TagSet>,
    merge_user: String,
    differ: Arc<dyn Differencer>,
}

impl ModSince {
    fn cancels(&self, a: &Ascription) -> bool {
        let user = a.user.as_deref();
        let kind_cancels = (self.stop_at_modification && a.is_modification())
            || (self.stop_at_review && a.is_review() && self.tags.contains(&a.tag));
        kind_cancels && self.rmusers.allows(user) && self.musers.spares(user)
    }

    fn admits(&self, a: &Ascription, older: Option<&Ascription>) -> bool {
        let user = a.user.as_deref();
        if !(a.is_modification() && self.musers.allows(user) && self.rmusers.spares(user)) {
            return false;
        }
        let Some(older) = older else {
            return true;
        };
        if user == Some(self.merge_user.as_str()) && self.differ.is_pure_merge(&older.msg, &a.msg) {
            return false;
        }
        !(self.translation_only && older.msg.msgstr == a.msg.msgstr)
    }

    /// Oldest admissible modification newer than the first cancelling entry.
    fn find(&self, history: &[Ascription]) -> Option<usize> {
        let mut selected = None;
        for (i, a) in history.iter().enumerate() {
            if self.cancels(a) {
                break;
            }
            if self.admits(a, history.get(i + 1)) {
                selected = Some(i);
            }
        }
        selected
    }
}

#[allow(clippy::fn_params_excessive_bools)]
fn mod_since(
    selector: &str,
    args: &[&str],
    env: &SelectorEnv,
    stop_at_modification: bool,
    stop_at_review: bool,
    translation_only: bool,
) -> Result<Box<dyn MessageSelector>> {
    let params = ModSince {
        stop_at_modification,
        stop_at_review,
        translation_only,
        musers: users_arg(env, args, 0, selector)?,
        rmusers: users_arg(env, args, 1, selector)?,
        tags: tags_arg(env, args, 2, selector)?,
        merge_user: env.settings.merge_user.clone(),
        differ: Arc::clone(&env.differ),
    };
    Ok(ascribed_only(move |input| params.find(input.history)))
}

/// First modification since the last review.
pub fn modar(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    mod_since("modar", args, env, false, true, false)
}

/// First modification since the last modification by someone else.
pub fn modam(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    mod_since("modam", args, env, true, false, false)
}

/// First modification since the last review or modification by someone else.
pub fn modarm(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    mod_since("modarm", args, env, true, true, false)
}

/// First translation change since the last review.
pub fn tmodar(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    mod_since("tmodar", args, env, false, true, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// revbm, modafter
// ─────────────────────────────────────────────────────────────────────────────

/// Newest review, provided a modification came after it.
pub fn revbm(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let rusers = users_arg(env, args, 0, "revbm")?;
    let musers = users_arg(env, args, 1, "revbm")?;
    let tags = tags_arg(env, args, 2, "revbm")?;
    Ok(ascribed_only(move |input| {
        let mut modified = false;
        for (i, a) in input.history.iter().enumerate() {
            let user = a.user.as_deref();
            if a.is_modification() && musers.allows(user) && rusers.spares(user) {
                modified = true;
            }
            if a.is_review() && tags.contains(&a.tag) && rusers.allows(user) && musers.spares(user) {
                return modified.then_some(i);
            }
        }
        None
    }))
}

fn oldest_modification_since(history: &[Ascription], users: &UserSet, since: &Timestamp) -> Option<usize> {
    history.iter().enumerate().rev().find_map(|(i, a)| {
        let recent = a.date.as_ref().is_some_and(|d| d >= since);
        (a.is_modification() && users.allows(a.user.as_deref()) && recent).then_some(i)
    })
}

/// Oldest modification at or after a time.
pub fn modafter(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let spec = arg(args, 0)
        .ok_or_else(|| SelectorError::bad_argument("modafter", "time specification cannot be empty"))?;
    let since = parse_timestamp(spec).map_err(|e| SelectorError::bad_argument("modafter", e.to_string()))?;
    let users = users_arg(env, args, 1, "modafter")?;
    Ok(ascribed_only(move |input| {
        oldest_modification_since(input.history, &users, &since)
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::fixtures::{Fixture, entry};

    fn live() -> Message {
        Message::new("Open").with_translation("Otvori")
    }

    fn pick(fx: &Fixture, sel: &dyn MessageSelector, history: &[Ascription]) -> usize {
        match fx.select(sel, &live(), history) {
            Selection::History(i) => i,
            Selection::Plain(_) => panic!("history selector answered plainly"),
        }
    }

    #[test]
    fn unascribed_history_selects_nothing() {
        let fx = Fixture::new();
        let head = [Ascription::unascribed(live())];
        for build in [asc, modified, rev, modar, revbm] {
            let sel = build(&[], &fx.env).unwrap();
            assert_eq!(pick(&fx, sel.as_ref(), &head), 0);
        }
    }

    #[test]
    fn asc_and_mod() {
        let fx = Fixture::new();
        let history = [
            entry("bob", "r", "Otvori", 4),
            entry("alice", "m", "Otvori", 3),
            entry("bob", "m", "Otvor", 2),
        ];
        let sel = asc(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 1);
        let sel = modified(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 2);
        let sel = modified(&["bob"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 3);
        let sel = asc(&["carol"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 0);
    }

    #[test]
    fn rev_honours_tags() {
        let fx = Fixture::new();
        let history = [
            entry("bob", "r/terms", "Otvori", 4),
            entry("carol", "r", "Otvori", 3),
            entry("alice", "m", "Otvori", 2),
        ];
        let untagged = rev(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, untagged.as_ref(), &history), 2);
        let terms = rev(&["", "terms"], &fx.env).unwrap();
        assert_eq!(pick(&fx, terms.as_ref(), &history), 1);
        let by_alice = rev(&["alice"], &fx.env).unwrap();
        assert_eq!(pick(&fx, by_alice.as_ref(), &history), 0);
    }

    #[test]
    fn modar_selects_oldest_modification_since_review() {
        let fx = Fixture::new();
        let history = [
            entry("alice", "m", "Otvori", 6),
            entry("carol", "m", "Otvor", 5),
            entry("bob", "r", "Otv", 4),
            entry("alice", "m", "Otv", 3),
        ];
        let sel = modar(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 2);

        let sel = modar(&["alice"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 1);
    }

    #[test]
    fn own_review_does_not_cancel() {
        let fx = Fixture::new();
        let history = [
            entry("carol", "m", "Otvori", 6),
            entry("carol", "r", "Otvor", 5),
            entry("carol", "m", "Otvor", 4),
        ];
        let sel = modar(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 1);
        let sel = modar(&["carol", "", ""], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 3);
    }

    #[test]
    fn modam_stops_at_other_modifications() {
        let fx = Fixture::new();
        let history = [
            entry("alice", "m", "Otvori!", 5),
            entry("alice", "m", "Otvori", 4),
            entry("bob", "m", "Otvor", 3),
        ];
        let sel = modam(&["alice", "bob"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 2);
    }

    #[test]
    fn tmodar_ignores_untranslated_changes() {
        let fx = Fixture::new();
        let mut commented = entry("alice", "m", "Otvori", 5);
        commented.msg.manual_comment = vec!["note".into()];
        let history = [commented, entry("bob", "r", "Otvori", 4), entry("carol", "m", "Otvori", 3)];
        let sel = tmodar(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 0);
        let sel = modar(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 1);
    }

    #[test]
    fn modar_skips_clean_merges() {
        let fx = Fixture::new();
        let mut merged = entry("fuzzy", "m", "Otvori", 5);
        merged.msg.set_fuzzy(true);
        merged.msg.msgid = "Open file".into();
        merged.msg.msgid_previous = Some("Open".into());
        let history = [merged, entry("alice", "m", "Otvori", 4), entry("bob", "r", "Otvor", 3)];
        let sel = modar(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 2);
    }

    #[test]
    fn revbm_needs_a_later_modification() {
        let fx = Fixture::new();
        let reviewed_last = [entry("bob", "r", "Otvori", 4), entry("alice", "m", "Otvori", 3)];
        let modified_last = [
            entry("alice", "m", "Otvori!", 5),
            entry("bob", "r", "Otvori", 4),
            entry("alice", "m", "Otvori", 3),
        ];
        let sel = revbm(&[], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &reviewed_last), 0);
        assert_eq!(pick(&fx, sel.as_ref(), &modified_last), 2);
    }

    #[test]
    fn modafter_finds_oldest_since() {
        let fx = Fixture::new();
        let history = [
            entry("alice", "m", "Otvori!", 9),
            entry("bob", "m", "Otvori", 6),
            entry("alice", "m", "Otvor", 2),
        ];
        let sel = modafter(&["2024-03-05"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 2);
        let sel = modafter(&["2024-03-05", "alice"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 1);
        let sel = modafter(&["2025"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 0);

        assert_matches!(modafter(&[], &fx.env), Err(SelectorError::BadArgument { .. }));
        assert_matches!(modafter(&["soon"], &fx.env), Err(SelectorError::BadArgument { .. }));
    }

    #[test]
    fn hexpr_plain_and_reduced() {
        let fx = Fixture::new();
        let history = [
            entry("bob", "m", "Otvori datoteku", 4),
            entry("alice", "m", "Otvori", 3),
        ];
        let sel = hexpr(&["msgstr/Otvori/"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 1);
        let sel = hexpr(&["msgstr/Otvori/", "alice"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 2);

        // Reduced to what each entry added, only the oldest mentions "Otvori".
        let sel = hexpr(&["msgstr/Otvori/", "", "a"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 2);
        let sel = hexpr(&["msgstr/datoteku/", "", "added"], &fx.env).unwrap();
        assert_eq!(pick(&fx, sel.as_ref(), &history), 1);

        assert_matches!(hexpr(&["/x/", "", "sideways"], &fx.env), Err(SelectorError::BadArgument { .. }));
        assert_matches!(hexpr(&["/x/", "dave"], &fx.env), Err(SelectorError::UnknownUser { .. }));
    }
}
