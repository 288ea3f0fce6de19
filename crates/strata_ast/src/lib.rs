//! The flat target tree produced by lowering.
//!
//! Every node lives in the arena of an [`Ast`] and is addressed by a
//! [`NodeId`]. Declarations carry single-dimension bit ranges, identifiers are
//! flat names, and each specialized module appears once. The crate also ships
//! [`ConstFolder`], the constant simplifier lowering calls on range bounds and
//! parameter values.

#![warn(missing_docs)]

pub mod ast;
pub mod const_value;
pub mod dump;
pub mod ids;
pub mod node;
pub mod simplify;

pub use ast::Ast;
pub use const_value::ConstValue;
pub use ids::NodeId;
pub use node::{
    AlwaysKind, Attrs, BinaryOp, DeclInfo, Dim, Node, NodeFlags, NodeKind, Partial, UnaryOp,
};
pub use simplify::{ConstFolder, ConstResolver, NoConsts, Simplifier};
