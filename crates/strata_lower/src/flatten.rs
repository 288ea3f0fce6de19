//! The range flattening engine.
//!
//! A declaration with several packed or unpacked dimensions is collapsed into
//! one synthetic `[N-1:0]` range plus a dimension table ([`Dim`], innermost
//! first). Every access against such a declaration is later rewritten by
//! [`rewrite_access`] into a single bit range over the flat vector.
//!
//! Simple declarations (at most one packed and one unpacked range, not typed by
//! a named type, not a port or parameter) keep their ranges as children; the
//! two-range case becomes a [`NodeKind::Memory`].

use strata_ast::{Ast, ConstFolder, Dim, NodeId, NodeKind, Simplifier};
use strata_common::{Ident, InternalError, StrataResult};

use crate::arith::Arith;
use crate::scope::ScopeTable;

/// Flattens the ranges of `decl` in place.
///
/// Idempotent: the range lists are consumed on the first call, so a second
/// call finds nothing to do.
pub fn flatten(ast: &mut Ast, scope: &ScopeTable, decl: NodeId) -> StrataResult<()> {
    if ast.node(decl).decl.flattened {
        return Ok(());
    }
    if let Some(ty) = ast.node(decl).decl.wiretype {
        append_type_ranges(ast, scope, decl, ty)?;
    }

    let node = ast.node(decl);
    let packed = node.decl.packed.clone();
    let unpacked = node.decl.unpacked.clone();
    if packed.is_empty() && unpacked.is_empty() {
        return Ok(());
    }

    let is_port = node.flags.is_input || node.flags.is_output;
    let convert = packed.len() > 1
        || unpacked.len() > 1
        || node.decl.wiretype.is_some()
        || node.kind.is_param()
        || is_port
        || node.decl.force_convert == Some(true);

    if convert {
        let mut dims = Vec::with_capacity(packed.len() + unpacked.len());
        for &r in packed.iter().rev().chain(unpacked.iter().rev()) {
            dims.push(eval_dim(ast, scope, decl, r)?);
        }
        let total = width_product(ast, decl, &dims)?;
        let loc = ast.node(decl).loc;
        let range = ast.mk_range(total - 1, 0, loc);
        ast.push_child(decl, range);
        let info = &mut ast.node_mut(decl).decl;
        info.dims = dims;
        info.flattened = true;
    } else {
        for &r in packed.iter().chain(unpacked.iter()) {
            ast.push_child(decl, r);
        }
        if ast.kind(decl) == NodeKind::Wire && packed.len() == 1 && unpacked.len() == 1 && !is_port {
            ast.node_mut(decl).kind = NodeKind::Memory;
        }
    }

    let info = &mut ast.node_mut(decl).decl;
    info.packed.clear();
    info.unpacked.clear();
    Ok(())
}

/// Adds the ranges implied by a named type as the innermost packed dimension.
fn append_type_ranges(ast: &mut Ast, scope: &ScopeTable, decl: NodeId, ty: Ident) -> StrataResult<()> {
    let Some(entry) = scope.lookup(ty) else {
        return Err(InternalError::new(format!(
            "type `{}` of `{}` has no scope entry",
            ast.resolve(ty),
            ast.name_of(decl)
        )));
    };
    let target = match ast.kind(entry) {
        NodeKind::Typedef => match ast.children(entry).first() {
            Some(&inner) => inner,
            None => return Ok(()),
        },
        _ => entry,
    };
    let loc = ast.node(decl).loc;
    match ast.kind(target) {
        NodeKind::Struct | NodeKind::Union => {
            let Some((left, right)) = ast.layout_span(target) else {
                return Err(InternalError::new(format!(
                    "type `{}` was used before its layout was computed",
                    ast.resolve(ty)
                )));
            };
            let range = ast.mk_range(left - right, 0, loc);
            ast.node_mut(decl).decl.packed.push(range);
        }
        NodeKind::Wire => {
            let source: Vec<NodeId> = if ast.node(target).decl.packed.is_empty() {
                ast.children(target)
                    .iter()
                    .copied()
                    .filter(|&c| ast.kind(c) == NodeKind::Range)
                    .collect()
            } else {
                ast.node(target).decl.packed.clone()
            };
            for r in source {
                let copy = ast.clone_subtree(r);
                ast.node_mut(decl).decl.packed.push(copy);
            }
        }
        _ => {}
    }
    Ok(())
}

fn eval_dim(ast: &mut Ast, scope: &ScopeTable, decl: NodeId, range: NodeId) -> StrataResult<Dim> {
    let bounds = ast.children(range).to_vec();
    let (Some(&l), r) = (bounds.first(), bounds.get(1).copied()) else {
        return Err(InternalError::new(format!(
            "empty range on `{}`",
            ast.name_of(decl)
        )));
    };
    let left = eval_bound(ast, scope, decl, l)?;
    let right = match r {
        Some(r) => eval_bound(ast, scope, decl, r)?,
        None => left,
    };
    let (min, max) = (left.min(right), left.max(right));
    Ok(Dim::new(min, max - min + 1, left < right))
}

fn eval_bound(ast: &mut Ast, scope: &ScopeTable, decl: NodeId, bound: NodeId) -> StrataResult<i64> {
    ConstFolder.eval_int(ast, bound, scope).ok_or_else(|| {
        InternalError::new(format!(
            "range bound of `{}` is not constant",
            ast.name_of(decl)
        ))
    })
}

/// Product of the dimension widths; an overflow is an internal error.
fn width_product(ast: &Ast, decl: NodeId, dims: &[Dim]) -> StrataResult<i64> {
    dims.iter()
        .try_fold(1i64, |acc, d| acc.checked_mul(d.width))
        .ok_or_else(|| {
            InternalError::new(format!(
                "flattened width of `{}` overflows",
                ast.name_of(decl)
            ))
        })
}

/// Rewrites the selectors of `ident` against the flattened `decl` into one
/// range node over the flat vector.
///
/// Selectors are composed from the last one backwards. Fewer selectors than
/// dimensions select the whole remaining inner slice; none selects the entire
/// vector.
pub fn rewrite_access(ast: &mut Ast, scope: &ScopeTable, decl: NodeId, ident: NodeId) -> StrataResult<NodeId> {
    let dims = ast.node(decl).decl.dims.clone();
    let selectors: Vec<NodeId> = ast
        .children(ident)
        .iter()
        .copied()
        .filter(|&c| ast.kind(c) == NodeKind::Range)
        .collect();
    let n = dims.len();
    if selectors.len() > n {
        return Err(InternalError::new(format!(
            "`{}` has {} selectors but only {} dimensions",
            ast.name_of(ident),
            selectors.len(),
            n
        )));
    }
    // strides[i] is the flat width of dims[..i]
    let strides = (0..=n)
        .map(|i| width_product(ast, decl, &dims[..i]))
        .collect::<StrataResult<Vec<i64>>>()?;
    let loc = ast.node(ident).loc;
    let mut ar = Arith::new(ast, loc);
    if selectors.is_empty() {
        let l = ar.int(strides[n] - 1);
        let r = ar.int(0);
        return Ok(ar.range(l, r, scope));
    }

    let mut inner: Option<(NodeId, NodeId)> = None;
    for (i, &sel) in selectors.iter().enumerate().rev() {
        let dim_index = n - 1 - i;
        let dim = dims[dim_index];
        let stride = strides[dim_index];
        let bounds = ar.ast.children(sel).to_vec();
        let Some(&first) = bounds.first() else {
            return Err(InternalError::new(format!(
                "empty selector on `{}`",
                ar.ast.name_of(ident)
            )));
        };
        let idx_l = ar.copy(first);
        let idx_r = ar.copy(bounds.get(1).copied().unwrap_or(first));
        let nl = ar.normalize_index(idx_l, dim);
        let nr = ar.normalize_index(idx_r, dim);

        let next = ar.add_int(nl, 1);
        let scaled = ar.mul_int(next, stride);
        let mut left = ar.add_int(scaled, -1);
        let mut right = ar.mul_int(nr, stride);
        if let Some((il, ir)) = inner {
            let offset = ar.copy(ir);
            right = ar.add(right, offset);
            let span = ar.sub(il, ir);
            let base = ar.copy(right);
            left = ar.add(base, span);
        }
        inner = Some((left, right));
    }
    let (left, right) = inner.ok_or_else(|| InternalError::new("no selectors composed"))?;
    Ok(ar.range(left, right, scope))
}
