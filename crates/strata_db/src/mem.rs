//! In-memory design database, loadable from JSON.

use crate::builder::ObjBuilder;
use crate::db::DesignDb;
use crate::error::DbError;
use crate::ids::ObjHandle;
use crate::kind::ObjectKind;
use crate::props::{IntProp, StrProp};
use crate::relation::Relation;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use strata_common::Arena;
use strata_source::{FileId, Loc, SourceDb};

/// One object of a [`MemDb`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    /// The object kind.
    pub kind: ObjectKind,
    /// Source location.
    #[serde(default)]
    pub loc: Loc,
    /// String properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub strs: BTreeMap<StrProp, String>,
    /// Integer properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ints: BTreeMap<IntProp, i64>,
    /// Literal value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Outgoing relations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rels: BTreeMap<Relation, Vec<ObjHandle>>,
}

impl Object {
    fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            loc: Loc::DUMMY,
            strs: BTreeMap::new(),
            ints: BTreeMap::new(),
            value: None,
            rels: BTreeMap::new(),
        }
    }
}

/// An arena-backed [`DesignDb`].
///
/// The JSON form is `{"files": [...], "root": n, "objects": [...]}` where each
/// handle is an index into `objects`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemDb {
    #[serde(default)]
    files: SourceDb,
    #[serde(default)]
    root: Option<ObjHandle>,
    objects: Arena<ObjHandle, Object>,
}

impl MemDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a database from JSON text.
    pub fn from_json(json: &str) -> Result<Self, DbError> {
        let db: MemDb = serde_json::from_str(json)?;
        db.validate()?;
        Ok(db)
    }

    /// Reads and validates a database from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DbError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serializes the database to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, DbError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that every relation target exists and the root is a design.
    pub fn validate(&self) -> Result<(), DbError> {
        let len = self.objects.len() as u32;
        for (h, obj) in self.objects.iter() {
            for targets in obj.rels.values() {
                if let Some(&bad) = targets.iter().find(|t| t.as_raw() >= len) {
                    return Err(DbError::dangling(h, bad));
                }
            }
        }
        match self.root {
            Some(r) if r.as_raw() < len && self.objects[r].kind == ObjectKind::Design => Ok(()),
            _ => Err(DbError::NoRoot),
        }
    }

    /// Registers a source file.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> FileId {
        self.files.add_file(path)
    }

    /// Allocates a new object with no properties.
    pub fn add(&mut self, kind: ObjectKind) -> ObjHandle {
        self.objects.alloc(Object::new(kind))
    }

    /// Allocates a new object and returns a builder for it.
    pub fn obj(&mut self, kind: ObjectKind) -> ObjBuilder<'_> {
        let h = self.add(kind);
        ObjBuilder::new(self, h)
    }

    /// Sets the design root.
    pub fn set_root(&mut self, h: ObjHandle) {
        self.root = Some(h);
    }

    /// Sets a string property.
    pub fn set_str(&mut self, h: ObjHandle, prop: StrProp, value: impl Into<String>) {
        self.objects[h].strs.insert(prop, value.into());
    }

    /// Sets an integer property.
    pub fn set_int(&mut self, h: ObjHandle, prop: IntProp, value: i64) {
        self.objects[h].ints.insert(prop, value);
    }

    /// Sets the literal value.
    pub fn set_value(&mut self, h: ObjHandle, value: Value) {
        self.objects[h].value = Some(value);
    }

    /// Sets the source location.
    pub fn set_loc(&mut self, h: ObjHandle, loc: Loc) {
        self.objects[h].loc = loc;
    }

    /// Appends `child` to the `rel` relation of `parent`.
    pub fn link(&mut self, parent: ObjHandle, rel: Relation, child: ObjHandle) {
        self.objects[parent].rels.entry(rel).or_default().push(child);
    }

    /// Returns the raw object behind a handle.
    pub fn object(&self, h: ObjHandle) -> &Object {
        &self.objects[h]
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the database holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterates over all objects with their handles.
    pub fn objects(&self) -> impl Iterator<Item = (ObjHandle, &Object)> {
        self.objects.iter()
    }
}

impl DesignDb for MemDb {
    fn root(&self) -> Option<ObjHandle> {
        self.root
    }

    fn kind(&self, h: ObjHandle) -> ObjectKind {
        self.objects[h].kind
    }

    fn iterate(&self, rel: Relation, h: ObjHandle) -> Vec<ObjHandle> {
        self.objects[h].rels.get(&rel).cloned().unwrap_or_default()
    }

    fn resolve(&self, rel: Relation, h: ObjHandle) -> Option<ObjHandle> {
        self.objects[h].rels.get(&rel).and_then(|v| v.first().copied())
    }

    fn get_str(&self, prop: StrProp, h: ObjHandle) -> Option<&str> {
        self.objects[h].strs.get(&prop).map(String::as_str)
    }

    fn get_int(&self, prop: IntProp, h: ObjHandle) -> Option<i64> {
        self.objects[h].ints.get(&prop).copied()
    }

    fn get_value(&self, h: ObjHandle) -> Option<&Value> {
        self.objects[h].value.as_ref()
    }

    fn location(&self, h: ObjHandle) -> Loc {
        self.objects[h].loc
    }

    fn sources(&self) -> &SourceDb {
        &self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> MemDb {
        let mut db = MemDb::new();
        let file = db.add_file("top.sv");
        let design = db.add(ObjectKind::Design);
        db.set_root(design);
        let m = db.obj(ObjectKind::Module).name("top").str(StrProp::DefName, "top").finish();
        db.set_loc(m, Loc::new(file, 1));
        db.link(design, Relation::TopModules, m);
        let c = db.obj(ObjectKind::Constant).int(IntProp::Size, 8).value(Value::Int(3)).finish();
        db.link(m, Relation::Parameters, c);
        db
    }

    #[test]
    fn accessors() {
        let db = tiny();
        let root = db.root().unwrap();
        assert_eq!(db.kind(root), ObjectKind::Design);
        let tops = db.iterate(Relation::TopModules, root);
        assert_eq!(tops.len(), 1);
        assert_eq!(db.name(tops[0]), Some("top"));
        assert_eq!(db.location(tops[0]).line, 1);
        let c = db.resolve(Relation::Parameters, tops[0]).unwrap();
        assert_eq!(db.get_int(IntProp::Size, c), Some(8));
        assert_eq!(db.get_value(c), Some(&Value::Int(3)));
        assert!(db.iterate(Relation::Nets, root).is_empty());
        assert!(!db.flag(IntProp::Signed, c));
    }

    #[test]
    fn json_round_trip_preserves_graph() {
        let db = tiny();
        let json = db.to_json().unwrap();
        let back = MemDb::from_json(&json).unwrap();
        assert_eq!(back.len(), db.len());
        let top = back.iterate(Relation::TopModules, back.root().unwrap())[0];
        assert_eq!(back.get_str(StrProp::DefName, top), Some("top"));
        assert_eq!(back.sources().resolve(back.location(top)).to_string(), "top.sv:1");
    }

    #[test]
    fn hand_written_json() {
        let json = r#"{
            "files": ["a.sv"],
            "root": 0,
            "objects": [
                {"kind": "design", "rels": {"all_modules": [1]}},
                {"kind": "module", "loc": {"file": 0, "line": 7}, "strs": {"name": "m"}}
            ]
        }"#;
        let db = MemDb::from_json(json).unwrap();
        let m = db.iterate(Relation::AllModules, db.root().unwrap())[0];
        assert_eq!(db.kind(m), ObjectKind::Module);
        assert_eq!(db.name(m), Some("m"));
    }

    #[test]
    fn dangling_relation_rejected() {
        let json = r#"{"root": 0, "objects": [{"kind": "design", "rels": {"all_modules": [5]}}]}"#;
        let err = MemDb::from_json(json).unwrap_err();
        assert!(matches!(err, DbError::DanglingHandle { from: 0, to: 5 }));
    }

    #[test]
    fn missing_root_rejected() {
        let json = r#"{"objects": [{"kind": "module"}]}"#;
        assert!(matches!(MemDb::from_json(json), Err(DbError::NoRoot)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.json");
        std::fs::write(&path, tiny().to_json().unwrap()).unwrap();
        let db = MemDb::load(&path).unwrap();
        assert_eq!(db.len(), 3);
        assert!(MemDb::load(&dir.path().join("missing.json")).is_err());
    }
}
