//! Built-in selector factories.
//!
//! Plain selectors live in [`plain`], history selectors in [`history`].
//! Each is a build function wrapped in a [`BuiltinFactory`].

pub mod history;
pub mod plain;

use std::sync::Arc;

use ascribe_history::MessageSelector;

use crate::errors::{Result, SelectorError};
use crate::traits::{SelectorEnv, SelectorFactory};

/// Signature of a built-in build function.
pub type BuildFn = fn(&[&str], &SelectorEnv) -> Result<Box<dyn MessageSelector>>;

/// A factory backed by a plain function.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinFactory {
    name: &'static str,
    history_capable: bool,
    max_args: usize,
    build: BuildFn,
}

impl BuiltinFactory {
    /// Factory for a plain selector.
    pub const fn plain(name: &'static str, max_args: usize, build: BuildFn) -> Self {
        Self {
            name,
            history_capable: false,
            max_args,
            build,
        }
    }

    /// Factory for a history selector.
    pub const fn history(name: &'static str, max_args: usize, build: BuildFn) -> Self {
        Self {
            name,
            history_capable: true,
            max_args,
            build,
        }
    }
}

impl SelectorFactory for BuiltinFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn history_capable(&self) -> bool {
        self.history_capable
    }

    /// Trailing empty arguments are absent and do not count.
    fn build(&self, args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
        let given = args.iter().rposition(|a| !a.is_empty()).map_or(0, |i| i + 1);
        if given > self.max_args {
            return Err(SelectorError::bad_argument(
                self.name,
                format!("too many arguments ({given} given, at most {})", self.max_args),
            ));
        }
        (self.build)(&args[..given], env)
    }
}

const BUILTINS: [BuiltinFactory; 20] = [
    BuiltinFactory::plain("any", 0, plain::any),
    BuiltinFactory::plain("active", 0, plain::active),
    BuiltinFactory::plain("current", 0, plain::current),
    BuiltinFactory::plain("branch", 1, plain::branch),
    BuiltinFactory::plain("unasc", 0, plain::unasc),
    BuiltinFactory::plain("fexpr", 1, plain::fexpr),
    BuiltinFactory::plain("e", 1, plain::entry),
    BuiltinFactory::plain("l", 1, plain::line),
    BuiltinFactory::plain("espan", 2, plain::entry_span),
    BuiltinFactory::plain("lspan", 2, plain::line_span),
    BuiltinFactory::history("hexpr", 3, history::hexpr),
    BuiltinFactory::history("asc", 1, history::asc),
    BuiltinFactory::history("mod", 1, history::modified),
    BuiltinFactory::history("modar", 3, history::modar),
    BuiltinFactory::history("modam", 2, history::modam),
    BuiltinFactory::history("modarm", 3, history::modarm),
    BuiltinFactory::history("tmodar", 3, history::tmodar),
    BuiltinFactory::history("rev", 2, history::rev),
    BuiltinFactory::history("revbm", 3, history::revbm),
    BuiltinFactory::history("modafter", 2, history::modafter),
];

/// All built-in factories.
pub fn builtins() -> Vec<Arc<dyn SelectorFactory>> {
    BUILTINS
        .iter()
        .map(|f| Arc::new(*f) as Arc<dyn SelectorFactory>)
        .collect()
}

/// Parse a non-negative decimal reference number.
fn parse_number(selector: &str, value: &str, what: &str) -> Result<usize> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SelectorError::bad_argument(
            selector,
            format!("{what} must be a positive integer"),
        ));
    }
    value
        .parse()
        .map_err(|_| SelectorError::bad_argument(selector, format!("{what} is out of range")))
}

/// Whether a history starts with the synthetic unascribed entry.
fn is_unascribed(history: &[ascribe_history::Ascription]) -> bool {
    history.first().is_none_or(|a| a.user.is_none())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
