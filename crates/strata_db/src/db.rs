//! The read-only access trait lowering uses to walk a design.

use crate::ids::ObjHandle;
use crate::kind::ObjectKind;
use crate::props::{IntProp, StrProp};
use crate::relation::Relation;
use crate::value::Value;
use strata_source::{Loc, SourceDb};

/// Read-only access to an elaborated design graph.
///
/// Handles passed to these methods must have been obtained from the same
/// database; implementations may panic on foreign handles.
pub trait DesignDb {
    /// Returns the design root, if the database has one.
    fn root(&self) -> Option<ObjHandle>;

    /// Returns the kind of an object.
    fn kind(&self, h: ObjHandle) -> ObjectKind;

    /// Returns all targets of a one-to-many relation, in database order.
    fn iterate(&self, rel: Relation, h: ObjHandle) -> Vec<ObjHandle>;

    /// Returns the target of a one-to-one relation.
    fn resolve(&self, rel: Relation, h: ObjHandle) -> Option<ObjHandle>;

    /// Reads a string property.
    fn get_str(&self, prop: StrProp, h: ObjHandle) -> Option<&str>;

    /// Reads an integer property.
    fn get_int(&self, prop: IntProp, h: ObjHandle) -> Option<i64>;

    /// Reads the literal value of a constant or parameter.
    fn get_value(&self, h: ObjHandle) -> Option<&Value>;

    /// Returns the source location of an object.
    fn location(&self, h: ObjHandle) -> Loc;

    /// Returns the file table locations refer to.
    fn sources(&self) -> &SourceDb;

    /// Shorthand for the [`StrProp::Name`] property.
    fn name(&self, h: ObjHandle) -> Option<&str> {
        self.get_str(StrProp::Name, h)
    }

    /// Returns `true` if an integer property is present and non-zero.
    fn flag(&self, prop: IntProp, h: ObjHandle) -> bool {
        self.get_int(prop, h).is_some_and(|v| v != 0)
    }
}
