//! The design database: a read-only object graph of an elaborated design.
//!
//! Lowering consumes the graph exclusively through the [`DesignDb`] trait:
//! one-to-many relations are walked with [`iterate`](DesignDb::iterate),
//! one-to-one relations with [`resolve`](DesignDb::resolve), and scalar data is
//! read through typed property accessors. [`MemDb`] is the in-memory
//! implementation, built programmatically or loaded from JSON.

#![warn(missing_docs)]

pub mod builder;
pub mod db;
pub mod error;
pub mod ids;
pub mod kind;
pub mod mem;
pub mod props;
pub mod relation;
pub mod value;

pub use builder::ObjBuilder;
pub use db::DesignDb;
pub use error::DbError;
pub use ids::ObjHandle;
pub use kind::ObjectKind;
pub use mem::{MemDb, Object};
pub use props::{AlwaysKind, Direction, IntProp, NetType, OpType, PartSelectKind, StrProp};
pub use relation::Relation;
pub use value::Value;
