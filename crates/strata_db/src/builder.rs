//! Fluent construction of [`MemDb`](crate::MemDb) objects.

use crate::ids::ObjHandle;
use crate::mem::MemDb;
use crate::props::{IntProp, StrProp};
use crate::relation::Relation;
use crate::value::Value;
use strata_source::Loc;

/// Sets properties and relations on a freshly allocated object.
///
/// Obtained from [`MemDb::obj`]; call [`finish`](ObjBuilder::finish) to get
/// the handle back.
pub struct ObjBuilder<'a> {
    db: &'a mut MemDb,
    handle: ObjHandle,
}

impl<'a> ObjBuilder<'a> {
    pub(crate) fn new(db: &'a mut MemDb, handle: ObjHandle) -> Self {
        Self { db, handle }
    }

    /// Sets the name.
    pub fn name(self, name: &str) -> Self {
        self.str(StrProp::Name, name)
    }

    /// Sets a string property.
    pub fn str(self, prop: StrProp, value: &str) -> Self {
        self.db.set_str(self.handle, prop, value);
        self
    }

    /// Sets an integer property.
    pub fn int(self, prop: IntProp, value: i64) -> Self {
        self.db.set_int(self.handle, prop, value);
        self
    }

    /// Sets an integer property to 1.
    pub fn flag(self, prop: IntProp) -> Self {
        self.int(prop, 1)
    }

    /// Sets the literal value.
    pub fn value(self, value: Value) -> Self {
        self.db.set_value(self.handle, value);
        self
    }

    /// Sets the source location.
    pub fn loc(self, loc: Loc) -> Self {
        self.db.set_loc(self.handle, loc);
        self
    }

    /// Appends one relation target.
    pub fn rel(self, rel: Relation, target: ObjHandle) -> Self {
        self.db.link(self.handle, rel, target);
        self
    }

    /// Appends several relation targets in order.
    pub fn rels(self, rel: Relation, targets: impl IntoIterator<Item = ObjHandle>) -> Self {
        for t in targets {
            self.db.link(self.handle, rel, t);
        }
        self
    }

    /// Finishes the object and returns its handle.
    pub fn finish(self) -> ObjHandle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use crate::{DesignDb, MemDb, ObjectKind, Relation, Value};

    #[test]
    fn builds_nested_objects() {
        let mut db = MemDb::new();
        let l = db.obj(ObjectKind::Constant).value(Value::Int(7)).finish();
        let r = db.obj(ObjectKind::Constant).value(Value::Int(0)).finish();
        let range = db
            .obj(ObjectKind::Range)
            .rel(Relation::LeftRange, l)
            .rel(Relation::RightRange, r)
            .finish();
        let net = db.obj(ObjectKind::Net).name("x").rels(Relation::Ranges, [range]).finish();
        assert_eq!(db.iterate(Relation::Ranges, net), vec![range]);
        assert_eq!(db.resolve(Relation::LeftRange, range), Some(l));
        assert_eq!(db.name(net), Some("x"));
    }
}
