//! Node identifiers.

strata_common::define_id!(
    /// Opaque, copyable identifier for a node in an [`Ast`](crate::Ast).
    NodeId
);
