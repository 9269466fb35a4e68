//! Core types for the roster contact directory client.
//!
//! This crate is deliberately free of HTTP and async dependencies. The
//! client and terminal UI crates depend on it; it depends on nothing of
//! theirs.

pub mod contact;
pub mod error;
pub mod history;
pub mod validate;

pub use contact::{Contact, ContactFields, ContactId, Field};
pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryRow};
pub use validate::{FieldErrors, validate};
