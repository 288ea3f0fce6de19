//! Module specialization and deduplication.
//!
//! An instance whose parameter values differ from its module's defaults gets
//! its own copy of the module, registered under a name derived from the
//! differing assignments. The registry lookup on that name happens before any
//! clone, so identical parameterizations share one entity.

use std::collections::HashMap;

use strata_ast::{Ast, ConstValue, NodeId, NodeKind, Partial};
use strata_common::{ContentHash, Ident};

use crate::registry::UnitRegistry;

/// Prefix of every specialized module name.
pub const PARAMOD_PREFIX: &str = "$paramod";

/// Renders a parameter value for use in a specialized module name.
///
/// Integers render as `{width}'d{value}`, strings verbatim, and non-constant
/// expressions by the name they reference.
pub fn render_value(ast: &Ast, value: NodeId) -> String {
    let node = ast.node(value);
    match &node.value {
        Some(ConstValue::Int { value, width, .. }) => format!("{width}'d{value}"),
        Some(ConstValue::Bits(bits)) => format!("{}'b{bits}", bits.len()),
        Some(ConstValue::Str(s)) => s.clone(),
        Some(ConstValue::Real(r)) => r.to_string(),
        None => {
            let name = ast.resolve(node.name);
            if name.is_empty() {
                node.kind.label()
            } else {
                name.to_string()
            }
        }
    }
}

/// Returns `true` if two parameter values are equal.
///
/// Integers compare by value regardless of width, so `8` and `32'd8` match.
pub fn same_value(ast: &Ast, a: NodeId, b: NodeId) -> bool {
    match (ast.const_int(a), ast.const_int(b)) {
        (Some(x), Some(y)) => x == y,
        _ => render_value(ast, a) == render_value(ast, b),
    }
}

/// Joins `name=value` pairs into a parameter string.
pub fn param_string(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("\\")
}

/// Derives the name of a specialized module.
///
/// An empty parameter string keeps the generic name. Strings longer than
/// `limit` are replaced by their digest.
pub fn specialized_name(type_name: &str, params: &str, limit: usize) -> String {
    if params.is_empty() {
        type_name.to_string()
    } else if params.len() > limit {
        format!("{PARAMOD_PREFIX}${}\\{type_name}", ContentHash::of_str(params))
    } else {
        format!("{PARAMOD_PREFIX}\\{type_name}\\{params}")
    }
}

/// Maps the parameter and localparam names of `module` to their declarations.
pub fn param_scope(ast: &Ast, module: NodeId) -> HashMap<Ident, NodeId> {
    ast.children(module)
        .iter()
        .copied()
        .filter(|&c| ast.kind(c).is_param())
        .map(|c| (ast.node(c).name, c))
        .collect()
}

/// Finds or creates the module entity an instance of `type_name` with the
/// given parameter string refers to.
///
/// An unknown generic is registered as an undefined placeholder. The generic
/// entity is only cloned, never modified, when `params` is non-empty.
pub fn obtain_module(
    ast: &mut Ast,
    registry: &mut UnitRegistry,
    type_name: &str,
    params: &str,
    limit: usize,
) -> NodeId {
    let name = ast.intern(&specialized_name(type_name, params, limit));
    if let Some(existing) = registry.get(name) {
        return existing;
    }
    let base = match registry.get(ast.intern(type_name)) {
        Some(generic) => generic,
        None => placeholder(ast, type_name),
    };
    let module = if params.is_empty() {
        base
    } else {
        ast.clone_subtree(base)
    };
    ast.node_mut(module).name = name;
    registry.insert(name, module);
    module
}

fn placeholder(ast: &mut Ast, type_name: &str) -> NodeId {
    let module = ast.mk_named(NodeKind::Module, type_name, strata_source::Loc::DUMMY);
    ast.node_mut(module).attrs.partial = Some(Partial::Undefined);
    module
}

/// Returns `true` for an entity standing in for an unknown module.
pub fn is_undefined(ast: &Ast, module: NodeId) -> bool {
    ast.node(module).attrs.partial == Some(Partial::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_source::Loc;

    fn generic(ast: &mut Ast, registry: &mut UnitRegistry) -> NodeId {
        let m = ast.mk_named(NodeKind::Module, "M", Loc::DUMMY);
        let p = ast.mk_named(NodeKind::Parameter, "W", Loc::DUMMY);
        let v = ast.mk_const_int(4, Loc::DUMMY);
        ast.push_child(p, v);
        ast.push_child(m, p);
        registry.insert(ast.intern("M"), m);
        m
    }

    #[test]
    fn names() {
        assert_eq!(specialized_name("M", "", 60), "M");
        assert_eq!(specialized_name("M", "W=32'd8", 60), "$paramod\\M\\W=32'd8");
        let long = "X".repeat(61);
        let hashed = specialized_name("M", &long, 60);
        assert!(hashed.starts_with("$paramod$"));
        assert!(hashed.ends_with("\\M"));
        assert_eq!(hashed.len(), "$paramod$".len() + 32 + 2);
        assert_eq!(hashed, specialized_name("M", &long, 60));
    }

    #[test]
    fn values_render_and_compare() {
        let mut ast = Ast::new();
        let a = ast.mk_const_int(8, Loc::DUMMY);
        let b = ast.mk_const_sized(8, 4, Loc::DUMMY);
        let s = ast.mk_const_str("fast", Loc::DUMMY);
        let id = ast.mk_ident("OTHER", Loc::DUMMY);
        assert_eq!(render_value(&ast, a), "32'd8");
        assert_eq!(render_value(&ast, s), "fast");
        assert_eq!(render_value(&ast, id), "OTHER");
        assert!(same_value(&ast, a, b));
        assert!(!same_value(&ast, a, s));
        let pairs = vec![("A".to_string(), "1".to_string()), ("B".to_string(), "x".to_string())];
        assert_eq!(param_string(&pairs), "A=1\\B=x");
    }

    #[test]
    fn identical_parameterizations_share_an_entity() {
        let mut ast = Ast::new();
        let mut reg = UnitRegistry::new();
        let m = generic(&mut ast, &mut reg);
        let a = obtain_module(&mut ast, &mut reg, "M", "W=32'd8", 60);
        let b = obtain_module(&mut ast, &mut reg, "M", "W=32'd8", 60);
        let c = obtain_module(&mut ast, &mut reg, "M", "W=32'd16", 60);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, m);
        assert_eq!(ast.name_of(m), "M");
        assert_eq!(reg.len(), 3);
        assert_eq!(obtain_module(&mut ast, &mut reg, "M", "", 60), m);
    }

    #[test]
    fn unknown_generic_becomes_placeholder() {
        let mut ast = Ast::new();
        let mut reg = UnitRegistry::new();
        let cell = obtain_module(&mut ast, &mut reg, "BLACKBOX", "", 60);
        assert!(is_undefined(&ast, cell));
        assert_eq!(reg.get(ast.intern("BLACKBOX")), Some(cell));
    }

    #[test]
    fn param_scope_lists_parameters() {
        let mut ast = Ast::new();
        let mut reg = UnitRegistry::new();
        let m = generic(&mut ast, &mut reg);
        let scope = param_scope(&ast, m);
        assert_eq!(scope.len(), 1);
        assert!(scope.contains_key(&ast.intern("W")));
    }
}
