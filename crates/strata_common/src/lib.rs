//! Shared foundational types used across the Strata lowering engine.
//!
//! This crate provides the dense arena used by both the design database and
//! the lowered tree, interned identifiers for every name that appears in the
//! lowered tree, content hashing for specialized-module naming, and the result
//! type reserved for fatal internal-consistency violations.

#![warn(missing_docs)]

pub mod arena;
pub mod hash;
pub mod ident;
pub mod result;

pub use arena::{Arena, ArenaId};
pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, StrataResult};
