//! Per-unit normalization: the pass that runs the scope table, the range
//! flattener, and the struct path expander over a finished unit.
//!
//! The walk visits the unit in source order. Declarations enter the scope as
//! they are met and are flattened right away; identifiers are rewritten after
//! their own selectors have been normalized.

use std::collections::HashSet;

use strata_ast::{Ast, NodeId, NodeKind};
use strata_common::StrataResult;
use strata_diagnostics::DiagnosticSink;

use crate::errors;
use crate::flatten::{flatten, rewrite_access};
use crate::scope::ScopeTable;
use crate::struct_path::{convert_dot, layout, struct_of};

/// Normalizes `unit` with `scope` as its symbol table.
///
/// Typedefs and enums declared directly in the unit are visible from the
/// start of the walk; everything else becomes visible at its declaration.
pub fn normalize_unit(ast: &mut Ast, scope: &mut ScopeTable, sink: &DiagnosticSink, unit: NodeId) -> StrataResult<()> {
    let mut pass = Normalizer {
        ast,
        scope,
        sink,
        prepared: HashSet::new(),
    };
    for c in pass.ast.children(unit).to_vec() {
        match pass.ast.kind(c) {
            NodeKind::Typedef => pass.declare_typedef(c)?,
            NodeKind::Enum => pass.declare_enum(c),
            _ => {}
        }
    }
    for c in pass.ast.children(unit).to_vec() {
        pass.visit(c, unit)?;
    }
    Ok(())
}

struct Normalizer<'n> {
    ast: &'n mut Ast,
    scope: &'n mut ScopeTable,
    sink: &'n DiagnosticSink,
    /// Identifiers whose selectors were already folded into a struct range.
    prepared: HashSet<NodeId>,
}

impl Normalizer<'_> {
    fn declare_typedef(&mut self, td: NodeId) -> StrataResult<()> {
        let name = self.ast.node(td).name;
        self.scope.declare(name, td);
        if let Some(&inner) = self.ast.children(td).first() {
            match self.ast.kind(inner) {
                NodeKind::Struct | NodeKind::Union => {
                    layout(self.ast, &*self.scope, inner)?;
                }
                NodeKind::Enum => self.declare_enum(inner),
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_enum(&mut self, en: NodeId) {
        let name = self.ast.node(en).name;
        self.scope.declare(name, en);
        for &item in self.ast.children(en) {
            self.scope.declare(self.ast.node(item).name, item);
        }
    }

    fn visit(&mut self, node: NodeId, parent: NodeId) -> StrataResult<()> {
        let kind = self.ast.kind(node);
        match kind {
            NodeKind::Typedef => return self.declare_typedef(node),
            NodeKind::Enum => self.declare_enum(node),
            NodeKind::Struct | NodeKind::Union => {
                let named = !self.ast.name_of(node).is_empty();
                let nested = matches!(
                    self.ast.kind(parent),
                    NodeKind::Typedef | NodeKind::Struct | NodeKind::Union
                );
                if named && !nested {
                    layout(self.ast, &*self.scope, node)?;
                    let name = self.ast.node(node).name;
                    self.scope.declare(name, node);
                }
                return Ok(());
            }
            NodeKind::Identifier => self.prepare_dot(node)?,
            _ => {}
        }

        for c in self.ast.children(node).to_vec() {
            self.visit(c, node)?;
        }

        match kind {
            NodeKind::Wire | NodeKind::Memory | NodeKind::Parameter | NodeKind::Localparam => {
                let name = self.ast.node(node).name;
                self.scope.declare(name, node);
                flatten(self.ast, &*self.scope, node)?;
            }
            NodeKind::Identifier => self.rewrite_selectors(node)?,
            _ => {}
        }
        Ok(())
    }

    /// Replaces a `base[k].field` access by its struct range, or keeps it as
    /// a dotted name when `base` is not a struct in scope.
    fn prepare_dot(&mut self, ident: NodeId) -> StrataResult<()> {
        let Some(dot) = self.ast.find_child_kind(ident, NodeKind::Dot) else {
            return Ok(());
        };
        let name = self.ast.node(ident).name;
        let decl = self.scope.lookup(name);
        let is_struct = decl.is_some_and(|d| struct_of(self.ast, self.scope, d).is_ok());
        if is_struct {
            let range = convert_dot(self.ast, self.scope, ident, dot)?;
            self.ast.node_mut(ident).children = vec![range];
            self.prepared.insert(ident);
            return Ok(());
        }

        let mut path = Vec::new();
        let mut selectors = Vec::new();
        let mut cursor = Some(dot);
        while let Some(d) = cursor {
            path.push(self.ast.name_of(d).to_string());
            selectors = self
                .ast
                .children(d)
                .iter()
                .copied()
                .filter(|&c| self.ast.kind(c) == NodeKind::Range)
                .collect();
            cursor = self.ast.find_child_kind(d, NodeKind::Dot);
        }
        let base = self.ast.name_of(ident).to_string();
        let field = path.join(".");
        let loc = self.ast.node(ident).loc;
        let declared = decl.map(|d| self.ast.node(d).loc);
        self.sink.emit(errors::dotted_fallback(&base, &field, loc, declared));
        let dotted = self.ast.intern(&format!("{base}.{field}"));
        let node = self.ast.node_mut(ident);
        node.name = dotted;
        node.children = selectors;
        self.prepared.insert(ident);
        Ok(())
    }

    fn rewrite_selectors(&mut self, ident: NodeId) -> StrataResult<()> {
        if self.prepared.contains(&ident) || self.ast.children(ident).is_empty() {
            return Ok(());
        }
        let Some(decl) = self.scope.lookup(self.ast.node(ident).name) else {
            return Ok(());
        };
        let info = &self.ast.node(decl).decl;
        let needs_rewrite = self.ast.kind(decl).is_decl()
            && info.flattened
            && match info.dims.as_slice() {
                [] => false,
                [only] => only.swapped || only.min != 0,
                _ => true,
            };
        if needs_rewrite {
            let range = rewrite_access(self.ast, self.scope, decl, ident)?;
            self.ast.node_mut(ident).children = vec![range];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_diagnostics::{LabelStyle, Severity};
    use strata_source::{FileId, Loc};

    fn module_with(ast: &mut Ast, children: Vec<NodeId>) -> NodeId {
        ast.mk_with(NodeKind::Module, Loc::DUMMY, children)
    }

    fn bounds(ast: &Ast, ident: NodeId) -> (Option<i64>, Option<i64>) {
        let r = ast.children(ident)[0];
        let c = ast.children(r);
        (ast.const_int(c[0]), ast.const_int(c[1]))
    }

    fn indexed(ast: &mut Ast, name: &str, indices: &[i64]) -> NodeId {
        let id = ast.mk_ident(name, Loc::DUMMY);
        for &i in indices {
            let c = ast.mk_const_int(i, Loc::DUMMY);
            let r = ast.mk_range_of(c, None, Loc::DUMMY);
            ast.push_child(id, r);
        }
        id
    }

    #[test]
    fn declarations_flatten_and_accesses_rewrite() {
        let mut ast = Ast::new();
        let x = ast.mk_named(NodeKind::Wire, "x", Loc::DUMMY);
        for (l, r) in [(3, 0), (1, 0)] {
            let range = ast.mk_range(l, r, Loc::DUMMY);
            ast.node_mut(x).decl.packed.push(range);
        }
        let acc = indexed(&mut ast, "x", &[2, 1]);
        let lhs = ast.mk_ident("y", Loc::DUMMY);
        let assign = ast.mk_with(NodeKind::Assign, Loc::DUMMY, vec![lhs, acc]);
        let m = module_with(&mut ast, vec![x, assign]);

        let mut scope = ScopeTable::new();
        let sink = DiagnosticSink::new();
        scope.in_unit(m, |scope| normalize_unit(&mut ast, scope, &sink, m)).unwrap();
        assert!(ast.node(x).decl.flattened);
        assert_eq!(bounds(&ast, acc), (Some(5), Some(5)));
        assert!(!sink.has_errors());
    }

    #[test]
    fn forward_typedef_is_visible() {
        let mut ast = Ast::new();
        let a = ast.mk_named(NodeKind::StructItem, "a", Loc::DUMMY);
        let ra = ast.mk_range(7, 0, Loc::DUMMY);
        ast.push_child(a, ra);
        let b = ast.mk_named(NodeKind::StructItem, "b", Loc::DUMMY);
        let rb = ast.mk_range(3, 0, Loc::DUMMY);
        ast.push_child(b, rb);
        let st = ast.mk_with(NodeKind::Struct, Loc::DUMMY, vec![a, b]);
        let td = ast.mk_named(NodeKind::Typedef, "pair_t", Loc::DUMMY);
        ast.push_child(td, st);

        let s = ast.mk_named(NodeKind::Wire, "s", Loc::DUMMY);
        ast.node_mut(s).decl.wiretype = Some(ast.intern("pair_t"));
        let acc = ast.mk_ident("s", Loc::DUMMY);
        let dot = ast.mk_named(NodeKind::Dot, "a", Loc::DUMMY);
        ast.push_child(acc, dot);
        let m = module_with(&mut ast, vec![s, acc, td]);

        let mut scope = ScopeTable::new();
        let sink = DiagnosticSink::new();
        scope.in_unit(m, |scope| normalize_unit(&mut ast, scope, &sink, m)).unwrap();
        assert_eq!(bounds(&ast, acc), (Some(11), Some(4)));
        let r = ast.children(s)[0];
        assert_eq!(ast.const_int(ast.children(r)[0]), Some(11));
    }

    #[test]
    fn unknown_base_falls_back_to_dotted_name() {
        let mut ast = Ast::new();
        let acc = ast.mk_ident("bus", Loc::DUMMY);
        let dot = ast.mk_named(NodeKind::Dot, "data", Loc::DUMMY);
        let i = ast.mk_const_int(3, Loc::DUMMY);
        let sel = ast.mk_range_of(i, None, Loc::DUMMY);
        ast.push_child(dot, sel);
        ast.push_child(acc, dot);
        let m = module_with(&mut ast, vec![acc]);

        let mut scope = ScopeTable::new();
        let sink = DiagnosticSink::new();
        scope.in_unit(m, |scope| normalize_unit(&mut ast, scope, &sink, m)).unwrap();
        assert_eq!(ast.name_of(acc), "bus.data");
        assert_eq!(ast.children(acc), &[sel]);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].code, errors::W304);
    }

    #[test]
    fn plain_base_points_at_its_declaration() {
        let mut ast = Ast::new();
        let w = ast.mk_named(NodeKind::Wire, "w", Loc::new(FileId::from_raw(0), 4));
        let r = ast.mk_range(7, 0, Loc::DUMMY);
        ast.node_mut(w).decl.packed.push(r);
        let acc = ast.mk_ident("w", Loc::DUMMY);
        let dot = ast.mk_named(NodeKind::Dot, "lo", Loc::DUMMY);
        ast.push_child(acc, dot);
        let m = module_with(&mut ast, vec![w, acc]);

        let mut scope = ScopeTable::new();
        let sink = DiagnosticSink::new();
        scope.in_unit(m, |scope| normalize_unit(&mut ast, scope, &sink, m)).unwrap();
        assert_eq!(ast.name_of(acc), "w.lo");
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, errors::W304);
        assert_eq!(diags[0].labels.len(), 1);
        assert_eq!(diags[0].labels[0].style, LabelStyle::Secondary);
        assert_eq!(diags[0].labels[0].loc.line, 4);
    }

    #[test]
    fn ascending_port_access_is_remapped() {
        let mut ast = Ast::new();
        let p = ast.mk_named(NodeKind::Wire, "p", Loc::DUMMY);
        ast.node_mut(p).flags.is_input = true;
        let r = ast.mk_range(0, 7, Loc::DUMMY);
        ast.node_mut(p).decl.packed.push(r);
        let acc = indexed(&mut ast, "p", &[0]);
        let plain = ast.mk_named(NodeKind::Wire, "q", Loc::DUMMY);
        ast.node_mut(plain).flags.is_output = true;
        let r = ast.mk_range(7, 0, Loc::DUMMY);
        ast.node_mut(plain).decl.packed.push(r);
        let acc_q = indexed(&mut ast, "q", &[2]);
        let m = module_with(&mut ast, vec![p, plain, acc, acc_q]);

        let mut scope = ScopeTable::new();
        let sink = DiagnosticSink::new();
        scope.in_unit(m, |scope| normalize_unit(&mut ast, scope, &sink, m)).unwrap();
        assert_eq!(bounds(&ast, acc), (Some(7), Some(7)));
        // a plain descending range keeps its selector untouched
        let sel = ast.children(acc_q)[0];
        assert_eq!(ast.children(sel).len(), 1);
    }

    #[test]
    fn units_do_not_share_declarations() {
        let mut ast = Ast::new();
        let x = ast.mk_named(NodeKind::Wire, "x", Loc::DUMMY);
        for (l, r) in [(3, 0), (1, 0)] {
            let range = ast.mk_range(l, r, Loc::DUMMY);
            ast.node_mut(x).decl.packed.push(range);
        }
        let a = module_with(&mut ast, vec![x]);
        let acc = indexed(&mut ast, "x", &[2, 1]);
        let b = module_with(&mut ast, vec![acc]);

        let mut scope = ScopeTable::new();
        let sink = DiagnosticSink::new();
        scope.in_unit(a, |scope| normalize_unit(&mut ast, scope, &sink, a)).unwrap();
        scope.in_unit(b, |scope| normalize_unit(&mut ast, scope, &sink, b)).unwrap();
        // `x` is unknown in `b`, so its two selectors are left alone
        assert_eq!(ast.children(acc).len(), 2);
    }
}
