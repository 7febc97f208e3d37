//! # ascribe-core
//!
//! Foundation types for the ascription engine.
//!
//! This crate provides the shared vocabulary that the other ascribe crates depend on:
//!
//! - **Messages**: [`message::Message`] with identity, tracked fields, flags, and
//!   reference numbers; [`message::MessageKey`] and [`message::MessageState`]
//! - **Tracked fields**: [`fields::TrackedField`] and the sequence view used by the codec
//! - **Catalogs**: [`catalog::Catalog`], an ordered, key-indexed message collection
//! - **Timestamps**: [`time::format_timestamp`] and the tolerant [`time::parse_timestamp`]
//! - **Review marks**: [`review::ReviewMarks`] for review flags and chain comments
//! - **Errors**: [`errors::CoreError`] via `thiserror`
//! - **Logging**: [`logging::init_subscriber`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other ascribe crates.

#![deny(unsafe_code)]

pub mod catalog;
pub mod errors;
pub mod fields;
pub mod logging;
pub mod message;
pub mod review;
pub mod text;
pub mod time;

pub use catalog::Catalog;
pub use errors::{CoreError, Result};
pub use fields::TrackedField;
pub use message::{Message, MessageKey, MessageState};
pub use time::Timestamp;
