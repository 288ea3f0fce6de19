//! The symbol scope table.
//!
//! Maps declared names to their declaration nodes for one elaboration unit at
//! a time. A unit's table starts from the imports of every package, then grows
//! as the normalization walk meets typedefs, enums, wires, and parameters.
//! Entering a unit always starts from an empty table, so nothing declared in
//! one unit is visible from the next.

use std::collections::HashMap;

use strata_ast::{Ast, ConstResolver, NodeId, NodeKind};
use strata_common::Ident;

/// Name-to-declaration table scoped to one elaboration unit.
#[derive(Debug, Default)]
pub struct ScopeTable {
    entries: HashMap<Ident, NodeId>,
    unit: Option<NodeId>,
}

impl ScopeTable {
    /// Creates an empty table with no current unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `node`; the last declaration wins.
    pub fn declare(&mut self, name: Ident, node: NodeId) {
        self.entries.insert(name, node);
    }

    /// Looks up a declaration. Absence is not an error.
    pub fn lookup(&self, name: Ident) -> Option<NodeId> {
        self.entries.get(&name).copied()
    }

    /// Returns `true` if `name` is declared.
    pub fn contains(&self, name: Ident) -> bool {
        self.entries.contains_key(&name)
    }

    /// Registers the importable contents of a package.
    ///
    /// Parameters, localparams, and typedefs are visible both under their bare
    /// name and as `pkg::name`; an enum registers itself and each of its items.
    pub fn import_package(&mut self, ast: &Ast, pkg: NodeId) {
        let pkg_name = ast.name_of(pkg).to_string();
        for &child in ast.children(pkg) {
            let node = ast.node(child);
            match node.kind {
                NodeKind::Typedef | NodeKind::Parameter | NodeKind::Localparam => {
                    let qualified = ast.intern(&format!("{pkg_name}::{}", ast.resolve(node.name)));
                    self.declare(qualified, child);
                    self.declare(node.name, child);
                }
                NodeKind::Enum => {
                    self.declare(node.name, child);
                    for &item in &node.children {
                        self.declare(ast.node(item).name, item);
                    }
                }
                _ => {}
            }
        }
    }

    /// Drops every entry and the current unit.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.unit = None;
    }

    /// Starts a unit with an empty table.
    pub fn enter_unit(&mut self, unit: NodeId) {
        self.clear();
        self.unit = Some(unit);
    }

    /// Ends the current unit and empties the table.
    pub fn leave_unit(&mut self) {
        self.clear();
    }

    /// The unit currently being normalized.
    pub fn current_unit(&self) -> Option<NodeId> {
        self.unit
    }

    /// Runs `f` inside `unit`, leaving the unit afterwards whatever `f` returns.
    pub fn in_unit<R>(&mut self, unit: NodeId, f: impl FnOnce(&mut Self) -> R) -> R {
        self.enter_unit(unit);
        let result = f(self);
        self.leave_unit();
        result
    }

    /// Number of names in scope.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is in scope.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConstResolver for ScopeTable {
    fn lookup(&self, name: Ident) -> Option<NodeId> {
        ScopeTable::lookup(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_source::Loc;

    fn package(ast: &mut Ast) -> NodeId {
        let pkg = ast.mk_named(NodeKind::Package, "pkg", Loc::DUMMY);
        let p = ast.mk_named(NodeKind::Parameter, "WIDTH", Loc::DUMMY);
        let v = ast.mk_const_int(8, Loc::DUMMY);
        ast.push_child(p, v);
        let td = ast.mk_named(NodeKind::Typedef, "word_t", Loc::DUMMY);
        let en = ast.mk_named(NodeKind::Enum, "$enum0", Loc::DUMMY);
        let idle = ast.mk_named(NodeKind::EnumItem, "IDLE", Loc::DUMMY);
        ast.push_child(en, idle);
        let task = ast.mk_named(NodeKind::Task, "t", Loc::DUMMY);
        for c in [p, td, en, task] {
            ast.push_child(pkg, c);
        }
        pkg
    }

    #[test]
    fn import_registers_bare_and_qualified_names() {
        let mut ast = Ast::new();
        let pkg = package(&mut ast);
        let mut scope = ScopeTable::new();
        scope.import_package(&ast, pkg);
        let width = ast.intern("WIDTH");
        assert!(scope.contains(width));
        assert_eq!(scope.lookup(ast.intern("pkg::WIDTH")), scope.lookup(width));
        assert!(scope.contains(ast.intern("pkg::word_t")));
        assert!(scope.contains(ast.intern("$enum0")));
        assert!(scope.contains(ast.intern("IDLE")));
        assert!(!scope.contains(ast.intern("t")));
    }

    #[test]
    fn last_declaration_wins() {
        let mut ast = Ast::new();
        let a = ast.mk_named(NodeKind::Wire, "a", Loc::DUMMY);
        let b = ast.mk_named(NodeKind::Wire, "a", Loc::DUMMY);
        let mut scope = ScopeTable::new();
        let name = ast.intern("a");
        scope.declare(name, a);
        scope.declare(name, b);
        assert_eq!(scope.lookup(name), Some(b));
    }

    #[test]
    fn units_are_isolated() {
        let mut ast = Ast::new();
        let m1 = ast.mk_named(NodeKind::Module, "m1", Loc::DUMMY);
        let m2 = ast.mk_named(NodeKind::Module, "m2", Loc::DUMMY);
        let x = ast.mk_named(NodeKind::Wire, "x", Loc::DUMMY);
        let name = ast.intern("x");
        let mut scope = ScopeTable::new();
        scope.in_unit(m1, |scope| {
            assert_eq!(scope.current_unit(), Some(m1));
            scope.declare(name, x);
        });
        assert!(scope.is_empty());
        assert_eq!(scope.current_unit(), None);
        scope.enter_unit(m2);
        assert_eq!(scope.lookup(name), None);
        scope.leave_unit();
    }

    #[test]
    fn resolves_constants_for_the_folder() {
        use strata_ast::{ConstFolder, Simplifier};
        let mut ast = Ast::new();
        let pkg = package(&mut ast);
        let mut scope = ScopeTable::new();
        scope.import_package(&ast, pkg);
        let w = ast.mk_ident("pkg::WIDTH", Loc::DUMMY);
        assert_eq!(ConstFolder.eval_int(&mut ast, w, &scope), Some(8));
    }
}
