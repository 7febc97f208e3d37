//! Selectors that answer yes or no about the live message.

use std::collections::BTreeSet;

use ascribe_history::{MessageSelector, Selection, SelectionInput};

use super::{is_unascribed, parse_number};
use crate::errors::{Result, SelectorError};
use crate::traits::{SelectorEnv, arg};

/// Every message.
pub fn any(_args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    Ok(Box::new(|_: &SelectionInput<'_>| Selection::Plain(true)))
}

/// Translated, non-obsolete messages.
pub fn active(_args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    Ok(Box::new(|input: &SelectionInput<'_>| {
        Selection::from(input.msg.is_translated() && !input.msg.obsolete)
    }))
}

/// Non-obsolete messages.
pub fn current(_args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    Ok(Box::new(|input: &SelectionInput<'_>| Selection::from(!input.msg.obsolete)))
}

/// Messages in any of the comma-separated summit branches.
pub fn branch(args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let spec = arg(args, 0).ok_or_else(|| SelectorError::bad_argument("branch", "branch ID not given"))?;
    let wanted: BTreeSet<String> = spec.split(',').map(str::to_owned).collect();
    Ok(Box::new(move |input: &SelectionInput<'_>| {
        Selection::from(input.msg.summit_branches().iter().any(|b| wanted.contains(b)))
    }))
}

/// Messages with content that were never ascribed.
///
/// Pristine messages, with nothing in their tracked parts, do not count.
pub fn unasc(_args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    Ok(Box::new(|input: &SelectionInput<'_>| {
        Selection::from(is_unascribed(input.history) && input.msg.has_tracked_parts())
    }))
}

/// Messages matching an expression.
pub fn fexpr(args: &[&str], env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let expr = arg(args, 0)
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| SelectorError::bad_argument("fexpr", "matching expression cannot be empty"))?;
    let matcher = env.cache.matcher(expr, "fexpr")?;
    Ok(Box::new(move |input: &SelectionInput<'_>| Selection::from(matcher.is_match(input.msg))))
}

/// The message at one entry number.
pub fn entry(args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let wanted = parse_number("e", arg(args, 0).unwrap_or_default(), "message reference by entry")?;
    Ok(Box::new(move |input: &SelectionInput<'_>| Selection::from(input.msg.refentry == wanted)))
}

/// The message at a line, give or take one.
pub fn line(args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let wanted = parse_number("l", arg(args, 0).unwrap_or_default(), "message reference by line")?;
    Ok(Box::new(move |input: &SelectionInput<'_>| {
        Selection::from(input.msg.refline.abs_diff(wanted) <= 1)
    }))
}

/// Inclusive bounds with at least one end given.
fn parse_span(selector: &str, args: &[&str], unit: &str) -> Result<(Option<usize>, Option<usize>)> {
    let (first, last) = (arg(args, 0), arg(args, 1));
    if first.is_none() && last.is_none() {
        return Err(SelectorError::bad_argument(
            selector,
            format!("at least one of the first and last reference by {unit} must be given"),
        ));
    }
    let first = first
        .map(|v| parse_number(selector, v, &format!("first message reference by {unit}")))
        .transpose()?;
    let last = last
        .map(|v| parse_number(selector, v, &format!("last message reference by {unit}")))
        .transpose()?;
    Ok((first, last))
}

fn within(value: usize, (first, last): (Option<usize>, Option<usize>)) -> bool {
    first.is_none_or(|f| value >= f) && last.is_none_or(|l| value <= l)
}

/// Messages between two entry numbers, inclusive.
pub fn entry_span(args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let span = parse_span("espan", args, "entry")?;
    Ok(Box::new(move |input: &SelectionInput<'_>| Selection::from(within(input.msg.refentry, span))))
}

/// Messages between two line numbers, inclusive.
pub fn line_span(args: &[&str], _env: &SelectorEnv) -> Result<Box<dyn MessageSelector>> {
    let span = parse_span("lspan", args, "line")?;
    Ok(Box::new(move |input: &SelectionInput<'_>| Selection::from(within(input.msg.refline, span))))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
