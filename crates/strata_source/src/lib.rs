//! Source file bookkeeping for design-database handles and lowered nodes.
//!
//! Objects in the design database carry a file and a line number rather than
//! byte spans, so this crate models locations as [`Loc`] (a [`FileId`] plus a
//! 1-based line) and keeps the file path table in a [`SourceDb`].

#![warn(missing_docs)]

pub mod file_id;
pub mod loc;
pub mod source_db;

pub use file_id::FileId;
pub use loc::{Loc, ResolvedLoc};
pub use source_db::SourceDb;
