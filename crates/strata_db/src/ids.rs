//! Handles into the design database.

strata_common::define_id!(
    /// Opaque, copyable handle for an object in a design database.
    ObjHandle
);
