//! # ascribe-history
//!
//! Ascription storage and history reconstruction.
//!
//! - **Codec**: [`codec`] multiplexes every historical value of a field item
//!   into one blob with collision-free markers
//! - **Grammar**: [`grammar::AscriptionLine`] and the tolerant line parser
//! - **Records**: [`record::AscriptionRecord`] and the shadow
//!   [`record::AscriptionCatalog`]
//! - **Reconstruction**: [`reconstruct::collect_history`], including pivots
//!   across fuzzy merges
//! - **Filters**: [`filter`] removes merge noise and reduces entries to diffs
//! - **Differencing**: the [`differ::Differencer`] seam and [`differ::TokenDiffer`]
//! - **Writer**: [`writer::append`]
//! - **Operations**: catalog-level ascription, state examination, and review
//!   selection in [`ops`]
//!
//! ## Crate Position
//!
//! Depends on ascribe-core and ascribe-settings. Depended on by
//! ascribe-selectors.

#![deny(unsafe_code)]

pub mod codec;
pub mod differ;
pub mod errors;
pub mod filter;
pub mod grammar;
pub mod ops;
pub mod reconstruct;
pub mod record;
pub mod report;
pub mod selection;
pub mod writer;

pub use differ::{Differencer, TokenDiffer};
pub use errors::{HistoryError, Result};
pub use filter::DiffMode;
pub use grammar::{AscriptionKind, AscriptionWarning};
pub use reconstruct::{Ascription, History, HistoryOptions, TextFilter, collect_history};
pub use record::{AscriptionCatalog, AscriptionRecord};
pub use report::ModifiedReport;
pub use selection::{MessageSelector, Selection, SelectionInput};
pub use writer::{WriteOutcome, append};
