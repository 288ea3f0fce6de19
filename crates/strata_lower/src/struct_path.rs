//! The struct path expander.
//!
//! [`layout`] assigns every member of a packed struct or union its absolute
//! bit position: the first declared member occupies the most significant
//! bits, union members all start at the base. [`expand`] then turns a dotted
//! field path into a `[left:right]` range over the struct's storage, and
//! [`convert_dot`] does the same for an access through a declaration, adding
//! the element offset when the struct sits inside a flattened array.

use strata_ast::{Ast, ConstFolder, ConstResolver, NodeId, NodeKind, Simplifier};
use strata_common::{InternalError, StrataResult};

use crate::arith::Arith;
use crate::scope::ScopeTable;

fn is_member(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::StructItem | NodeKind::Struct | NodeKind::Union)
}

fn members(ast: &Ast, aggregate: NodeId) -> Vec<NodeId> {
    ast.children(aggregate)
        .iter()
        .copied()
        .filter(|&c| is_member(ast.kind(c)))
        .collect()
}

fn width_of(ast: &mut Ast, res: &dyn ConstResolver, node: NodeId) -> StrataResult<i64> {
    match ast.kind(node) {
        NodeKind::StructItem => {
            let ranges: Vec<NodeId> = ast
                .children(node)
                .iter()
                .copied()
                .filter(|&c| ast.kind(c) == NodeKind::Range)
                .collect();
            let mut width = 1;
            for r in ranges {
                let bounds = ast.children(r).to_vec();
                let mut values = Vec::with_capacity(2);
                for b in bounds {
                    let v = ConstFolder.eval_int(ast, b, res).ok_or_else(|| {
                        InternalError::new(format!(
                            "struct member `{}` has a non-constant range",
                            ast.name_of(node)
                        ))
                    })?;
                    values.push(v);
                }
                width *= match values.as_slice() {
                    [_] => 1,
                    [l, r] => (l - r).abs() + 1,
                    _ => {
                        return Err(InternalError::new(format!(
                            "malformed range on struct member `{}`",
                            ast.name_of(node)
                        )))
                    }
                };
            }
            Ok(width)
        }
        NodeKind::Struct => {
            let mut total = 0;
            for m in members(ast, node) {
                total += width_of(ast, res, m)?;
            }
            Ok(total)
        }
        NodeKind::Union => {
            let mut widest = 0;
            for m in members(ast, node) {
                widest = widest.max(width_of(ast, res, m)?);
            }
            Ok(widest)
        }
        other => Err(InternalError::new(format!(
            "`{}` of kind {} is not a struct member",
            ast.name_of(node),
            other.label()
        ))),
    }
}

fn place(ast: &mut Ast, res: &dyn ConstResolver, node: NodeId, base: i64) -> StrataResult<i64> {
    let width = width_of(ast, res, node)?;
    match ast.kind(node) {
        NodeKind::Struct => {
            let mut top = base + width;
            for m in members(ast, node) {
                let w = width_of(ast, res, m)?;
                top -= w;
                place(ast, res, m, top)?;
            }
        }
        NodeKind::Union => {
            for m in members(ast, node) {
                place(ast, res, m, base)?;
            }
        }
        _ => {}
    }
    if width > 0 {
        ast.node_mut(node).bit_range = Some((base + width - 1, base));
    }
    Ok(width)
}

/// Computes the layout of a struct or union and returns its width in bits.
pub fn layout(ast: &mut Ast, res: &dyn ConstResolver, aggregate: NodeId) -> StrataResult<i64> {
    place(ast, res, aggregate, 0)
}

fn strip_qualifier(name: &str) -> &str {
    let name = name.rsplit("::").next().unwrap_or(name);
    name.rsplit('.').next().unwrap_or(name)
}

fn find_member(ast: &Ast, aggregate: NodeId, field: &str) -> Option<NodeId> {
    members(ast, aggregate)
        .into_iter()
        .find(|&m| ast.name_of(m) == field)
}

/// Expands the field path `dot` over `aggregate` into `(left, right)` bound
/// expressions relative to the aggregate's storage.
///
/// An unknown field is an internal error.
pub fn expand(ast: &mut Ast, aggregate: NodeId, dot: NodeId) -> StrataResult<(NodeId, NodeId)> {
    let field = strip_qualifier(ast.name_of(dot)).to_string();
    let Some(member) = find_member(ast, aggregate, &field) else {
        return Err(InternalError::new(format!(
            "`{}` has no field `{field}`",
            ast.name_of(aggregate)
        )));
    };
    let Some((mem_left, mem_right)) = ast.layout_span(member) else {
        return Err(InternalError::new(format!("field `{field}` has no layout")));
    };
    let elem = mem_left - mem_right + 1;
    let member_kind = ast.kind(member);
    let sub_dot = ast.find_child_kind(dot, NodeKind::Dot);
    let selector = ast.find_child_kind(dot, NodeKind::Range);
    let loc = ast.node(dot).loc;

    let (mut left, mut right) = match sub_dot {
        Some(sub) => {
            if member_kind == NodeKind::StructItem {
                return Err(InternalError::new(format!(
                    "field `{field}` is not a struct"
                )));
            }
            expand(ast, member, sub)?
        }
        None => {
            let mut ar = Arith::new(ast, loc);
            (ar.int(mem_left), ar.int(mem_right))
        }
    };

    if let Some(sel) = selector {
        let bounds = ast.children(sel).to_vec();
        let mut ar = Arith::new(ast, loc);
        let two_bounds = match bounds.as_slice() {
            [a, b] => match (ar.ast.const_int(*a), ar.ast.const_int(*b)) {
                (Some(x), Some(y)) => x != y,
                _ => true,
            },
            _ => false,
        };
        match (member_kind, bounds.as_slice()) {
            (NodeKind::StructItem, [a, b]) => {
                let (a, b) = (ar.copy(*a), ar.copy(*b));
                let base = ar.copy(right);
                left = ar.add(base, a);
                right = ar.add(right, b);
            }
            (NodeKind::StructItem, [i]) => {
                let i = ar.copy(*i);
                right = ar.add(right, i);
                left = ar.copy(right);
            }
            (_, [a, b]) if two_bounds => {
                let (a, b) = (ar.copy(*a), ar.copy(*b));
                let b2 = ar.copy(b);
                let count = ar.sub(a, b);
                let count = ar.add_int(count, 1);
                let grow = ar.add_int(count, -elem);
                left = ar.add(left, grow);
                right = ar.add(right, b2);
            }
            (_, [i, ..]) => {
                let i = ar.copy(*i);
                let offset = ar.mul_int(i, elem);
                let offset2 = ar.copy(offset);
                left = ar.add(left, offset);
                right = ar.add(right, offset2);
            }
            _ => {
                return Err(InternalError::new(format!(
                    "empty selector on field `{field}`"
                )))
            }
        }
    }
    Ok((left, right))
}

/// The struct or union a declaration is typed by.
pub fn struct_of(ast: &Ast, scope: &ScopeTable, decl: NodeId) -> StrataResult<NodeId> {
    if matches!(ast.kind(decl), NodeKind::Struct | NodeKind::Union) {
        return Ok(decl);
    }
    let not_struct = || {
        InternalError::new(format!(
            "`{}` is accessed by field but is not struct-typed",
            ast.name_of(decl)
        ))
    };
    let ty = ast.node(decl).decl.wiretype.ok_or_else(not_struct)?;
    let entry = scope.lookup(ty).ok_or_else(not_struct)?;
    let inner = match ast.kind(entry) {
        NodeKind::Typedef => ast.children(entry).first().copied().ok_or_else(not_struct)?,
        _ => entry,
    };
    match ast.kind(inner) {
        NodeKind::Struct | NodeKind::Union => Ok(inner),
        _ => Err(not_struct()),
    }
}

/// Rewrites a field access `ident.path` into a range over the flattened
/// declaration `ident` names.
///
/// When `ident` carries an index into the outermost flattened dimension
/// (`arr[k].field`), the range is moved to that element, using the same index
/// normalization as [`rewrite_access`](crate::flatten::rewrite_access).
pub fn convert_dot(ast: &mut Ast, scope: &ScopeTable, ident: NodeId, dot: NodeId) -> StrataResult<NodeId> {
    let name = ast.node(ident).name;
    let decl = scope.lookup(name).ok_or_else(|| {
        InternalError::new(format!("`{}` has no scope entry", ast.resolve(name)))
    })?;
    let aggregate = struct_of(ast, scope, decl)?;
    let (mut left, mut right) = expand(ast, aggregate, dot)?;

    let index = ast
        .children(ident)
        .first()
        .copied()
        .filter(|&c| ast.kind(c) == NodeKind::Range)
        .and_then(|r| ast.children(r).first().copied());
    let dims = &ast.node(decl).decl.dims;
    let outer = if dims.len() >= 2 { dims.last().copied() } else { None };
    let loc = ast.node(ident).loc;

    if let (Some(k), Some(outer)) = (index, outer) {
        let (top, bottom) = ast.layout_span(aggregate).ok_or_else(|| {
            InternalError::new(format!("`{}` has no struct layout", ast.resolve(name)))
        })?;
        let size = top - bottom + 1;
        let mut ar = Arith::new(ast, loc);
        let k = ar.copy(k);
        let pos = ar.normalize_index(k, outer);
        let offset = ar.mul_int(pos, size);
        let offset2 = ar.copy(offset);
        left = ar.add(left, offset);
        right = ar.add(right, offset2);
    }
    Ok(Arith::new(ast, loc).range(left, right, scope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ast::{Dim, NoConsts};
    use strata_source::Loc;

    fn item(ast: &mut Ast, name: &str, hi: i64) -> NodeId {
        let it = ast.mk_named(NodeKind::StructItem, name, Loc::DUMMY);
        let r = ast.mk_range(hi, 0, Loc::DUMMY);
        ast.push_child(it, r);
        it
    }

    fn aggregate(ast: &mut Ast, kind: NodeKind, name: &str, members: Vec<NodeId>) -> NodeId {
        let s = ast.mk_named(kind, name, Loc::DUMMY);
        for m in members {
            ast.push_child(s, m);
        }
        s
    }

    fn dot(ast: &mut Ast, path: &[&str]) -> NodeId {
        let mut inner: Option<NodeId> = None;
        for field in path.iter().rev() {
            let d = ast.mk_named(NodeKind::Dot, field, Loc::DUMMY);
            if let Some(i) = inner {
                ast.push_child(d, i);
            }
            inner = Some(d);
        }
        inner.unwrap()
    }

    fn consts(ast: &mut Ast, (l, r): (NodeId, NodeId)) -> (i64, i64) {
        let l = ConstFolder.eval_int(ast, l, &NoConsts).unwrap();
        let r = ConstFolder.eval_int(ast, r, &NoConsts).unwrap();
        (l, r)
    }

    fn pair(ast: &mut Ast) -> NodeId {
        let a = item(ast, "a", 7);
        let b = item(ast, "b", 3);
        let s = aggregate(ast, NodeKind::Struct, "pair", vec![a, b]);
        assert_eq!(layout(ast, &NoConsts, s).unwrap(), 12);
        s
    }

    #[test]
    fn first_field_is_most_significant() {
        let mut ast = Ast::new();
        let s = pair(&mut ast);
        let b = dot(&mut ast, &["b"]);
        let r = expand(&mut ast, s, b).unwrap();
        assert_eq!(consts(&mut ast, r), (3, 0));
        let a = dot(&mut ast, &["a"]);
        let r = expand(&mut ast, s, a).unwrap();
        assert_eq!(consts(&mut ast, r), (11, 4));
    }

    #[test]
    fn offsets_sum_widths_of_later_fields() {
        let mut ast = Ast::new();
        let widths = [5i64, 1, 9, 3];
        let items: Vec<NodeId> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| item(&mut ast, &format!("f{i}"), w - 1))
            .collect();
        let s = aggregate(&mut ast, NodeKind::Struct, "s", items);
        layout(&mut ast, &NoConsts, s).unwrap();
        for (m, w) in widths.iter().enumerate() {
            let d = dot(&mut ast, &[&format!("f{m}")]);
            let (l, r) = expand(&mut ast, s, d).unwrap();
            let (l, r) = consts(&mut ast, (l, r));
            let below: i64 = widths[m + 1..].iter().sum();
            assert_eq!(r, below);
            assert_eq!(l - r + 1, *w);
        }
    }

    #[test]
    fn nested_struct_and_union() {
        let mut ast = Ast::new();
        let x = item(&mut ast, "x", 1);
        let y = item(&mut ast, "y", 5);
        let inner = aggregate(&mut ast, NodeKind::Union, "u", vec![x, y]);
        let tail = item(&mut ast, "tail", 0);
        let outer = aggregate(&mut ast, NodeKind::Struct, "o", vec![inner, tail]);
        assert_eq!(layout(&mut ast, &NoConsts, outer).unwrap(), 7);

        let d = dot(&mut ast, &["u", "x"]);
        let r = expand(&mut ast, outer, d).unwrap();
        assert_eq!(consts(&mut ast, r), (2, 1));
        let d = dot(&mut ast, &["u"]);
        let r = expand(&mut ast, outer, d).unwrap();
        assert_eq!(consts(&mut ast, r), (6, 1));
    }

    #[test]
    fn selectors_on_items() {
        let mut ast = Ast::new();
        let s = pair(&mut ast);
        let d = dot(&mut ast, &["a"]);
        let i = ast.mk_const_int(2, Loc::DUMMY);
        let sel = ast.mk_range_of(i, None, Loc::DUMMY);
        ast.push_child(d, sel);
        let r = expand(&mut ast, s, d).unwrap();
        assert_eq!(consts(&mut ast, r), (6, 6));

        let d = dot(&mut ast, &["a"]);
        let sel = ast.mk_range(5, 2, Loc::DUMMY);
        ast.push_child(d, sel);
        let r = expand(&mut ast, s, d).unwrap();
        assert_eq!(consts(&mut ast, r), (9, 6));
    }

    // struct { struct { p[3:0]; q[3:0] } inner; t[1:0] }: inner at [9:2]
    fn with_inner(ast: &mut Ast) -> NodeId {
        let p = item(ast, "p", 3);
        let q = item(ast, "q", 3);
        let inner = aggregate(ast, NodeKind::Struct, "inner", vec![p, q]);
        let t = item(ast, "t", 1);
        let outer = aggregate(ast, NodeKind::Struct, "outer", vec![inner, t]);
        assert_eq!(layout(ast, &NoConsts, outer).unwrap(), 10);
        outer
    }

    #[test]
    fn index_on_struct_field_scales_by_element() {
        let mut ast = Ast::new();
        let s = with_inner(&mut ast);
        let d = dot(&mut ast, &["inner"]);
        let i = ast.mk_const_int(1, Loc::DUMMY);
        let sel = ast.mk_range_of(i, None, Loc::DUMMY);
        ast.push_child(d, sel);
        let r = expand(&mut ast, s, d).unwrap();
        // both bounds move up by one 8-bit element
        assert_eq!(consts(&mut ast, r), (17, 10));
    }

    #[test]
    fn range_on_struct_field_widens() {
        let mut ast = Ast::new();
        let s = with_inner(&mut ast);
        let d = dot(&mut ast, &["inner"]);
        let sel = ast.mk_range(3, 0, Loc::DUMMY);
        ast.push_child(d, sel);
        let r = expand(&mut ast, s, d).unwrap();
        // left: 9 + (3 - 0 + 1) - 8, right: 2 + 0
        assert_eq!(consts(&mut ast, r), (5, 2));

        let d = dot(&mut ast, &["inner"]);
        let sel = ast.mk_range(2, 1, Loc::DUMMY);
        ast.push_child(d, sel);
        let r = expand(&mut ast, s, d).unwrap();
        assert_eq!(consts(&mut ast, r), (3, 3));
    }

    #[test]
    fn unknown_field_is_internal_error() {
        let mut ast = Ast::new();
        let s = pair(&mut ast);
        let d = dot(&mut ast, &["nope"]);
        assert!(expand(&mut ast, s, d).is_err());
    }

    #[test]
    fn qualified_field_name_is_stripped() {
        let mut ast = Ast::new();
        let s = pair(&mut ast);
        let d = dot(&mut ast, &["pkg::b"]);
        let r = expand(&mut ast, s, d).unwrap();
        assert_eq!(consts(&mut ast, r), (3, 0));
    }

    fn pair_array(ast: &mut Ast, scope: &mut ScopeTable, outer: Dim) -> NodeId {
        let s = pair(ast);
        let td = ast.mk_named(NodeKind::Typedef, "pair_t", Loc::DUMMY);
        ast.push_child(td, s);
        scope.declare(ast.intern("pair_t"), td);

        let arr = ast.mk_named(NodeKind::Wire, "arr", Loc::DUMMY);
        ast.node_mut(arr).decl.wiretype = Some(ast.intern("pair_t"));
        ast.node_mut(arr).decl.dims = vec![Dim::new(0, 12, false), outer];
        scope.declare(ast.intern("arr"), arr);
        arr
    }

    fn element_field(ast: &mut Ast, scope: &ScopeTable, k: i64, field: &str) -> (Option<i64>, Option<i64>) {
        let ident = ast.mk_ident("arr", Loc::DUMMY);
        let k = ast.mk_const_int(k, Loc::DUMMY);
        let sel = ast.mk_range_of(k, None, Loc::DUMMY);
        ast.push_child(ident, sel);
        let d = dot(ast, &[field]);
        let range = convert_dot(ast, scope, ident, d).unwrap();
        let c = ast.children(range).to_vec();
        (ast.const_int(c[0]), ast.const_int(c[1]))
    }

    #[test]
    fn array_element_relocation() {
        let mut ast = Ast::new();
        let mut scope = ScopeTable::new();
        pair_array(&mut ast, &mut scope, Dim::new(0, 4, true));
        // element 1 of an ascending [0:3] array is the third from the bottom
        assert_eq!(element_field(&mut ast, &scope, 1, "b"), (Some(27), Some(24)));
    }

    #[test]
    fn descending_array_element_relocation() {
        let mut ast = Ast::new();
        let mut scope = ScopeTable::new();
        let arr = pair_array(&mut ast, &mut scope, Dim::new(0, 4, false));
        // element 1 of [3:0] is the second from the bottom
        assert_eq!(element_field(&mut ast, &scope, 1, "b"), (Some(15), Some(12)));
        assert_eq!(element_field(&mut ast, &scope, 3, "a"), (Some(47), Some(40)));

        // agrees with a plain element select on the same declaration
        let ident = ast.mk_ident("arr", Loc::DUMMY);
        let k = ast.mk_const_int(1, Loc::DUMMY);
        let sel = ast.mk_range_of(k, None, Loc::DUMMY);
        ast.push_child(ident, sel);
        let whole = crate::flatten::rewrite_access(&mut ast, &scope, arr, ident).unwrap();
        let c = ast.children(whole).to_vec();
        assert_eq!((ast.const_int(c[0]), ast.const_int(c[1])), (Some(23), Some(12)));
    }

    #[test]
    fn struct_variable_is_its_own_type() {
        let mut ast = Ast::new();
        let mut scope = ScopeTable::new();
        let s = pair(&mut ast);
        scope.declare(ast.intern("pair"), s);
        let ident = ast.mk_ident("pair", Loc::DUMMY);
        let d = dot(&mut ast, &["a"]);
        let range = convert_dot(&mut ast, &scope, ident, d).unwrap();
        let c = ast.children(range).to_vec();
        assert_eq!((ast.const_int(c[0]), ast.const_int(c[1])), (Some(11), Some(4)));
    }
}
