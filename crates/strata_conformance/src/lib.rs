//! Conformance test helpers for the Strata lowering engine.
//!
//! [`DesignBuilder`] assembles small design databases the way an elaborator
//! would hand them over: a definition per module plus an elaborated instance
//! tree. [`lower`] and [`lower_with`] run them through the full lowering
//! pipeline and return a [`PipelineResult`] for assertions in the
//! integration tests.

#![warn(missing_docs)]

use strata_ast::{Ast, NodeId, NodeKind};
use strata_config::{LowerConfig, StrataConfig};
use strata_db::{IntProp, MemDb, ObjHandle, ObjectKind, OpType, Relation, StrProp, Value};
use strata_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};

/// Result of lowering a design.
pub struct PipelineResult {
    /// The lowered tree.
    pub ast: Ast,
    /// The DESIGN node.
    pub root: NodeId,
    /// All diagnostics emitted during lowering.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any errors were emitted.
    pub has_errors: bool,
    /// Number of error-severity diagnostics.
    pub error_count: usize,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

impl PipelineResult {
    /// Names of the output units, in order.
    pub fn unit_names(&self) -> Vec<String> {
        self.ast
            .children(self.root)
            .iter()
            .map(|&u| self.ast.name_of(u).to_string())
            .collect()
    }

    /// The output unit called `name`.
    pub fn unit(&self, name: &str) -> NodeId {
        self.ast
            .children(self.root)
            .iter()
            .copied()
            .find(|&u| self.ast.name_of(u) == name)
            .unwrap_or_else(|| panic!("no unit `{name}` in {:?}", self.unit_names()))
    }

    /// The direct child of `parent` called `name`.
    pub fn child(&self, parent: NodeId, name: &str) -> NodeId {
        self.ast
            .children(parent)
            .iter()
            .copied()
            .find(|&c| self.ast.name_of(c) == name)
            .unwrap_or_else(|| panic!("no child `{name}` under `{}`", self.ast.name_of(parent)))
    }

    /// Direct children of `parent` with the given kind.
    pub fn children_of_kind(&self, parent: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.ast
            .children(parent)
            .iter()
            .copied()
            .filter(|&c| self.ast.kind(c) == kind)
            .collect()
    }

    /// Constant bounds of the first RANGE child of `node`. A single-index
    /// range reports the index twice.
    pub fn range_of(&self, node: NodeId) -> (Option<i64>, Option<i64>) {
        let Some(range) = self.ast.find_child_kind(node, NodeKind::Range) else {
            return (None, None);
        };
        match self.ast.children(range) {
            [l] => (self.ast.const_int(*l), self.ast.const_int(*l)),
            [l, r, ..] => (self.ast.const_int(*l), self.ast.const_int(*r)),
            [] => (None, None),
        }
    }

    /// Diagnostics carrying `code`.
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code == code).collect()
    }
}

/// Builds `strata.toml` text with a `[lower]` section and parses it.
pub fn make_config(lower: &str) -> StrataConfig {
    let toml_str = format!("[lower]\n{lower}\n");
    strata_config::load_config_from_str(&toml_str).unwrap()
}

/// Lowers `db` with the default configuration.
pub fn lower(db: &MemDb) -> PipelineResult {
    lower_with(db, &LowerConfig::default())
}

/// Lowers `db` with an explicit configuration.
pub fn lower_with(db: &MemDb, config: &LowerConfig) -> PipelineResult {
    let sink = DiagnosticSink::new();
    let lowered = strata_lower::lower_design(db, config, &sink).unwrap();
    let error_count = sink.count(Severity::Error);
    let warning_count = sink.count(Severity::Warning);
    let diagnostics = sink.take_all();
    PipelineResult {
        ast: lowered.ast,
        root: lowered.root,
        has_errors: error_count > 0,
        diagnostics,
        error_count,
        warning_count,
    }
}

/// Incrementally assembles a design database.
///
/// Unit names are given without the `work@` library prefix; the builder adds
/// it the way an elaborator reports them.
#[derive(Default)]
pub struct DesignBuilder {
    /// The database under construction.
    pub db: MemDb,
    defs: Vec<ObjHandle>,
    interfaces: Vec<ObjHandle>,
    packages: Vec<ObjHandle>,
    tops: Vec<ObjHandle>,
}

impl DesignBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// An integer constant.
    pub fn int(&mut self, v: i64) -> ObjHandle {
        self.db.obj(ObjectKind::Constant).value(Value::Int(v)).finish()
    }

    /// A `[l:r]` range object.
    pub fn range(&mut self, l: i64, r: i64) -> ObjHandle {
        let left = self.int(l);
        let right = self.int(r);
        self.db
            .obj(ObjectKind::Range)
            .rel(Relation::LeftRange, left)
            .rel(Relation::RightRange, right)
            .finish()
    }

    /// `logic` with the given packed ranges, outermost first.
    pub fn logic(&mut self, ranges: &[(i64, i64)]) -> ObjHandle {
        let rs: Vec<_> = ranges.iter().map(|&(l, r)| self.range(l, r)).collect();
        self.db.obj(ObjectKind::LogicTypespec).rels(Relation::Ranges, rs).finish()
    }

    /// A named packed struct. Members are listed first to last.
    pub fn struct_type(&mut self, name: &str, members: &[(&str, ObjHandle)]) -> ObjHandle {
        let ms: Vec<_> = members
            .iter()
            .map(|&(n, ts)| self.db.obj(ObjectKind::TypespecMember).name(n).rel(Relation::Typespec, ts).finish())
            .collect();
        self.db
            .obj(ObjectKind::StructTypespec)
            .name(name)
            .rels(Relation::Members, ms)
            .finish()
    }

    /// A `logic` variable of typespec `ts`.
    pub fn var(&mut self, name: &str, ts: ObjHandle) -> ObjHandle {
        self.db.obj(ObjectKind::LogicVar).name(name).rel(Relation::Typespec, ts).finish()
    }

    /// A plain net with the given packed ranges.
    pub fn net(&mut self, name: &str, ranges: &[(i64, i64)]) -> ObjHandle {
        let rs: Vec<_> = ranges.iter().map(|&(l, r)| self.range(l, r)).collect();
        self.db.obj(ObjectKind::Net).name(name).rels(Relation::Ranges, rs).finish()
    }

    /// A reference by name.
    pub fn reference(&mut self, name: &str) -> ObjHandle {
        self.db.obj(ObjectKind::RefObj).name(name).finish()
    }

    /// `name[i][j]...` with constant indices.
    pub fn select(&mut self, name: &str, indices: &[i64]) -> ObjHandle {
        let idx: Vec<_> = indices.iter().map(|&i| self.int(i)).collect();
        self.db.obj(ObjectKind::VarSelect).name(name).rels(Relation::Indexes, idx).finish()
    }

    /// `a.b.c`.
    pub fn path(&mut self, parts: &[&str]) -> ObjHandle {
        let elems: Vec<_> = parts.iter().map(|p| self.reference(p)).collect();
        self.db.obj(ObjectKind::HierPath).rels(Relation::ActualGroup, elems).finish()
    }

    /// An operation with the given operands.
    pub fn op(&mut self, op: OpType, operands: Vec<ObjHandle>) -> ObjHandle {
        self.db
            .obj(ObjectKind::Operation)
            .int(IntProp::OpType, op.code())
            .rels(Relation::Operands, operands)
            .finish()
    }

    /// `assign lhs = rhs;`
    pub fn cont_assign(&mut self, lhs: ObjHandle, rhs: ObjHandle) -> ObjHandle {
        self.db
            .obj(ObjectKind::ContAssign)
            .rel(Relation::Lhs, lhs)
            .rel(Relation::Rhs, rhs)
            .finish()
    }

    /// `parameter name = v;`
    pub fn param(&mut self, name: &str, v: i64) -> ObjHandle {
        let value = self.int(v);
        self.db.obj(ObjectKind::Parameter).name(name).rel(Relation::Expr, value).finish()
    }

    /// An instance-side parameter override `.name(v)`.
    pub fn param_assign(&mut self, name: &str, v: i64) -> ObjHandle {
        let lhs = self.db.obj(ObjectKind::Parameter).name(name).finish();
        let rhs = self.int(v);
        self.db
            .obj(ObjectKind::ParamAssign)
            .rel(Relation::Lhs, lhs)
            .rel(Relation::Rhs, rhs)
            .finish()
    }

    /// Declares module `name`; `contents` lists `(relation, item)` pairs of
    /// its definition.
    pub fn define(&mut self, name: &str, contents: &[(Relation, ObjHandle)]) -> ObjHandle {
        let def = self.unit(ObjectKind::Module, &format!("work@{name}"), None, contents);
        self.defs.push(def);
        def
    }

    /// Declares interface `name`.
    pub fn define_interface(&mut self, name: &str, contents: &[(Relation, ObjHandle)]) -> ObjHandle {
        let def = self.unit(ObjectKind::Interface, &format!("work@{name}"), None, contents);
        self.interfaces.push(def);
        def
    }

    /// Adds package `name`.
    pub fn package(&mut self, name: &str, contents: &[(Relation, ObjHandle)]) -> ObjHandle {
        let pkg = self.unit(ObjectKind::Package, &format!("work@{name}"), None, contents);
        self.packages.push(pkg);
        pkg
    }

    /// Adds a top-level instance of `name` with its elaborated body.
    pub fn top(&mut self, name: &str, contents: &[(Relation, ObjHandle)]) -> ObjHandle {
        let top = self.unit(ObjectKind::Module, &format!("work@{name}"), None, contents);
        self.tops.push(top);
        top
    }

    /// A nested instance `inst` of module `def`, to be listed under
    /// [`Relation::Modules`] of its parent.
    pub fn instance(&mut self, inst: &str, def: &str, contents: &[(Relation, ObjHandle)]) -> ObjHandle {
        self.unit(ObjectKind::Module, inst, Some(&format!("work@{def}")), contents)
    }

    fn unit(
        &mut self,
        kind: ObjectKind,
        name: &str,
        def: Option<&str>,
        contents: &[(Relation, ObjHandle)],
    ) -> ObjHandle {
        let mut b = self.db.obj(kind).name(name);
        if let Some(def) = def {
            b = b.str(StrProp::DefName, def);
        }
        let unit = b.finish();
        for &(rel, item) in contents {
            self.db.link(unit, rel, item);
        }
        unit
    }

    /// Creates the design root and returns the finished database.
    pub fn finish(mut self) -> MemDb {
        let design = self
            .db
            .obj(ObjectKind::Design)
            .rels(Relation::AllInterfaces, self.interfaces)
            .rels(Relation::AllPackages, self.packages)
            .rels(Relation::AllModules, self.defs)
            .rels(Relation::TopModules, self.tops)
            .finish();
        self.db.set_root(design);
        self.db
    }
}
