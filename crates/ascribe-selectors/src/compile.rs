//! Compilation of selector specifications.
//!
//! A specification is `name[<sep>arg<sep>arg...]`, where `<sep>` is the
//! first character that is not alphanumeric, `_` or `-`. Several compiled
//! selectors combine into a [`CompoundSelector`] that requires all of them.

use std::fmt;

use ascribe_history::{MessageSelector, Selection, SelectionInput};
use tracing::debug;

use crate::errors::{Result, SelectorError};
use crate::registry::SelectorRegistry;
use crate::traits::SelectorEnv;

const DEFAULT_SEPARATOR: char = ':';

/// A specification split into name and arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorSpec {
    /// Name as written, possibly with the negating prefix.
    pub name: String,
    /// Arguments in order.
    pub args: Vec<String>,
}

/// Split a specification on its separator.
pub fn parse_spec(spec: &str) -> SelectorSpec {
    let sep = spec
        .chars()
        .find(|&c| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(DEFAULT_SEPARATOR);
    let mut parts = spec.split(sep).map(str::to_owned);
    SelectorSpec {
        name: parts.next().unwrap_or_default(),
        args: parts.collect(),
    }
}

/// Inverts a plain answer.
struct Negated(Box<dyn MessageSelector>);

impl MessageSelector for Negated {
    fn select(&self, input: &SelectionInput<'_>) -> Selection {
        Selection::Plain(!self.0.select(input).is_match())
    }
}

/// Compile one specification.
///
/// With `history` set the selector must be history-capable and not negated.
pub fn compile(
    spec: &str,
    registry: &SelectorRegistry,
    env: &SelectorEnv,
    history: bool,
) -> Result<Box<dyn MessageSelector>> {
    let parsed = parse_spec(spec);
    let resolved = registry
        .resolve(&parsed.name)
        .ok_or_else(|| SelectorError::UnknownSelector(parsed.name.clone()))?;
    if history {
        if !resolved.factory.history_capable() {
            return Err(SelectorError::NotHistorySelector(resolved.name));
        }
        if resolved.negated {
            return Err(SelectorError::NegatedHistory(resolved.name));
        }
    }
    let args: Vec<&str> = parsed.args.iter().map(String::as_str).collect();
    let selector = resolved.factory.build(&args, env)?;
    Ok(if resolved.negated {
        Box::new(Negated(selector))
    } else {
        selector
    })
}

/// Conjunction of compiled selectors.
///
/// Answers with the first non-matching result, or the last result when all
/// match. With no parts it answers "no match".
pub struct CompoundSelector {
    parts: Vec<Box<dyn MessageSelector>>,
    initial: Selection,
}

impl CompoundSelector {
    /// Number of combined selectors.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether nothing is combined.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl fmt::Debug for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundSelector")
            .field("parts", &self.parts.len())
            .field("initial", &self.initial)
            .finish()
    }
}

impl MessageSelector for CompoundSelector {
    fn select(&self, input: &SelectionInput<'_>) -> Selection {
        let mut result = self.initial;
        for part in &self.parts {
            result = part.select(input);
            if !result.is_match() {
                return result;
            }
        }
        result
    }
}

/// Compile all `specs` and combine them.
///
/// Every specification is compiled before any is used, so a bad one fails
/// the whole set up front.
pub fn build_selector<S: AsRef<str>>(
    specs: &[S],
    registry: &SelectorRegistry,
    env: &SelectorEnv,
    history: bool,
) -> Result<CompoundSelector> {
    let parts = specs
        .iter()
        .map(|s| compile(s.as_ref(), registry, env, history))
        .collect::<Result<Vec<_>>>()?;
    debug!(count = parts.len(), history, "selectors compiled");
    Ok(CompoundSelector {
        parts,
        initial: if history {
            Selection::History(0)
        } else {
            Selection::Plain(false)
        },
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use ascribe_core::Message;
    use assert_matches::assert_matches;

    use super::*;
    use crate::fixtures::{Fixture, entry};
    use crate::traits::SelectorFactory;

    #[test]
    fn separator_is_first_non_word_char() {
        assert_eq!(
            parse_spec("mod:alice"),
            SelectorSpec {
                name: "mod".into(),
                args: vec!["alice".into()],
            }
        );
        let spec = parse_spec("fexpr/msgstr:x/");
        assert_eq!(spec.name, "fexpr");
        assert_eq!(spec.args, ["msgstr:x", ""]);
        let spec = parse_spec("modar,a-b,,terms");
        assert_eq!(spec.args, ["a-b", "", "terms"]);
        assert!(parse_spec("any").args.is_empty());
    }

    #[test]
    fn compile_errors() {
        let fx = Fixture::new();
        let reg = SelectorRegistry::with_builtins();
        assert_matches!(
            compile("bogus", &reg, &fx.env, false),
            Err(SelectorError::UnknownSelector(name)) if name == "bogus"
        );
        assert_matches!(
            compile("active", &reg, &fx.env, true),
            Err(SelectorError::NotHistorySelector(name)) if name == "active"
        );
        assert_matches!(
            compile("nmod", &reg, &fx.env, true),
            Err(SelectorError::NegatedHistory(name)) if name == "mod"
        );
        assert_matches!(compile("e:x", &reg, &fx.env, false), Err(SelectorError::BadArgument { .. }));
        assert_matches!(compile("mod:dave", &reg, &fx.env, false), Err(SelectorError::UnknownUser { .. }));
    }

    #[test]
    fn negation_and_history_in_plain_mode() {
        let fx = Fixture::new();
        let reg = SelectorRegistry::with_builtins();
        let msg = Message::new("Open").with_translation("Otvori");
        let history = [entry("alice", "m", "Otvori", 2)];

        let nmod = compile("nmod", &reg, &fx.env, false).unwrap();
        assert_eq!(fx.select(nmod.as_ref(), &msg, &history), Selection::Plain(false));
        let nmod_bob = compile("nmod:bob", &reg, &fx.env, false).unwrap();
        assert_eq!(fx.select(nmod_bob.as_ref(), &msg, &history), Selection::Plain(true));
    }

    #[test]
    fn empty_compound() {
        let fx = Fixture::new();
        let reg = SelectorRegistry::with_builtins();
        let msg = Message::new("Open");
        let none: [&str; 0] = [];
        let plain = build_selector(&none, &reg, &fx.env, false).unwrap();
        assert!(plain.is_empty());
        assert_eq!(fx.select(&plain, &msg, &[]), Selection::Plain(false));
        let hist = build_selector(&none, &reg, &fx.env, true).unwrap();
        assert_eq!(fx.select(&hist, &msg, &[]), Selection::History(0));
    }

    /// Counts how often it was asked, and answers a fixed value.
    struct Probe {
        name: &'static str,
        answer: Selection,
        calls: Arc<AtomicUsize>,
    }

    impl SelectorFactory for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn history_capable(&self) -> bool {
            true
        }

        fn build(&self, _args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
            let answer = self.answer;
            let calls = Arc::clone(&self.calls);
            Ok(Box::new(move |_: &SelectionInput<'_>| {
                let _ = calls.fetch_add(1, Ordering::SeqCst);
                answer
            }))
        }
    }

    #[test]
    fn and_short_circuits_and_returns_last() {
        let fx = Fixture::new();
        let mut reg = SelectorRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for (name, answer) in [
            ("two", Selection::History(2)),
            ("three", Selection::History(3)),
            ("zero", Selection::History(0)),
        ] {
            reg.register(Arc::new(Probe {
                name,
                answer,
                calls: Arc::clone(&calls),
            }));
        }
        let msg = Message::new("Open");

        let all = build_selector(&["two", "three"], &reg, &fx.env, true).unwrap();
        assert_eq!(fx.select(&all, &msg, &[]), Selection::History(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let cut = build_selector(&["zero", "two", "three"], &reg, &fx.env, true).unwrap();
        assert_eq!(fx.select(&cut, &msg, &[]), Selection::History(0));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn bad_spec_fails_the_whole_set() {
        let fx = Fixture::new();
        let reg = SelectorRegistry::with_builtins();
        assert_matches!(
            build_selector(&["any", "espan"], &reg, &fx.env, false),
            Err(SelectorError::BadArgument { .. })
        );
    }
}
