//! # ascribe-selectors
//!
//! Named message and history selectors.
//!
//! - **Factories**: [`traits::SelectorFactory`] and the run-scoped
//!   [`traits::SelectorEnv`]
//! - **Registry**: [`registry::SelectorRegistry`], open for new names
//! - **Compiler**: [`compile::build_selector`] splits specifications, checks
//!   history capability and negation, and combines the results with AND
//! - **Built-ins**: plain selectors in [`builtin::plain`], history selectors
//!   in [`builtin::history`]
//! - **Arguments**: user and tag [`sets`], [`matcher`] expressions, and the
//!   [`cache::SelectorCache`] that memoizes them
//!
//! ## Crate Position
//!
//! Depends on ascribe-core, ascribe-settings and ascribe-history.

#![deny(unsafe_code)]

pub mod builtin;
pub mod cache;
pub mod compile;
pub mod errors;
pub mod matcher;
pub mod registry;
pub mod sets;
pub mod traits;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::SelectorCache;
pub use compile::{CompoundSelector, build_selector, compile};
pub use errors::{Result, SelectorError};
pub use matcher::Matcher;
pub use registry::SelectorRegistry;
pub use sets::{TagSet, UserSet};
pub use traits::{SelectorEnv, SelectorFactory};
