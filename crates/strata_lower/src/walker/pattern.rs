//! Assignment patterns (`'{...}`) and their tagged elements.
//!
//! A tagged element `field: value` lowers to an assignment of `value` to the
//! matching part of the enclosing target. The pattern itself then keeps only
//! the positional elements, or for a struct-typed parameter, all element
//! values in the declared field order.

use strata_ast::{NodeId, NodeKind};
use strata_common::StrataResult;
use strata_db::{ObjHandle, ObjectKind, OpType, Relation};

use super::{lower_each, lower_required, obj_name};
use super::typespec::struct_type_of;
use crate::context::LowerCtx;

const ASSIGN_KINDS: &[NodeKind] = &[NodeKind::Assign, NodeKind::AssignEq, NodeKind::AssignLe];

/// Nodes that can take the element assignments split out of a pattern.
const STATEMENT_SCOPES: &[NodeKind] = &[
    NodeKind::Block,
    NodeKind::Always,
    NodeKind::Initial,
    NodeKind::GenBlock,
    NodeKind::Module,
    NodeKind::Interface,
    NodeKind::Package,
];

fn is_assign(ctx: &LowerCtx<'_>, node: NodeId) -> bool {
    ASSIGN_KINDS.contains(&ctx.ast.kind(node))
}

/// Field names of the struct type of the parameter being assigned, in
/// declaration order.
fn param_fields(ctx: &LowerCtx<'_>) -> Vec<String> {
    let Some(decl) = ctx.frames.find_handle(&[ObjectKind::ParamAssign, ObjectKind::Parameter]) else {
        return Vec::new();
    };
    let param = match ctx.db.kind(decl) {
        ObjectKind::ParamAssign => match ctx.db.resolve(Relation::Lhs, decl) {
            Some(p) => p,
            None => return Vec::new(),
        },
        _ => decl,
    };
    match struct_type_of(ctx, param) {
        Some(ts) => ctx
            .db
            .iterate(Relation::Members, ts)
            .into_iter()
            .map(|m| obj_name(ctx, m))
            .collect(),
        None => Vec::new(),
    }
}

/// The field an element assignment targets: the name of the DOT on its
/// target, if any.
fn element_field(ctx: &LowerCtx<'_>, assign: NodeId) -> Option<String> {
    let target = *ctx.ast.children(assign).first()?;
    let dot = ctx.ast.find_child_kind(target, NodeKind::Dot)?;
    Some(ctx.ast.name_of(dot).to_string())
}

/// Lowers `'{...}` and `'{n{...}}`.
pub fn lower_assignment_pattern(ctx: &mut LowerCtx<'_>, h: ObjHandle, op: OpType) -> StrataResult<Option<NodeId>> {
    let loc = ctx.loc(h);
    let ops = lower_each(ctx, Relation::Operands, h)?;

    if op == OpType::MultiAssignmentPattern {
        let Some((&count, rest)) = ops.split_first() else {
            ctx.report_unhandled(h);
            return Ok(None);
        };
        let items = rest.iter().rev().copied().collect();
        let concat = ctx.ast.mk_with(NodeKind::Concat, loc, items);
        return Ok(Some(ctx.ast.mk_with(NodeKind::Replicate, loc, vec![count, concat])));
    }

    let in_param = ctx
        .frames
        .find_ancestor(&ctx.ast, &[NodeKind::Parameter, NodeKind::Localparam])
        .is_some();
    if in_param {
        let fields = param_fields(ctx);
        let mut positional = Vec::new();
        let mut ordered = Vec::new();
        for node in ops {
            if !is_assign(ctx, node) {
                positional.push(node);
                continue;
            }
            let pos = element_field(ctx, node)
                .and_then(|f| fields.iter().position(|name| *name == f))
                .unwrap_or(fields.len());
            if let Some(&value) = ctx.ast.children(node).get(1) {
                ordered.push((pos, value));
            }
        }
        ordered.sort_by_key(|&(pos, _)| pos);
        positional.extend(ordered.into_iter().map(|(_, v)| v));
        return Ok(Some(ctx.ast.mk_with(NodeKind::Concat, loc, positional)));
    }

    let (assignments, mut values): (Vec<NodeId>, Vec<NodeId>) = ops.into_iter().partition(|&n| is_assign(ctx, n));
    values.reverse();
    let concat = ctx.ast.mk_with(NodeKind::Concat, loc, values.clone());
    if assignments.is_empty() {
        return Ok(Some(concat));
    }

    let scope = ctx.frames.find_ancestor(&ctx.ast, STATEMENT_SCOPES);
    let enclosing = ctx.frames.find_ancestor(&ctx.ast, ASSIGN_KINDS);
    let mut rest = assignments.as_slice();
    let mut result = concat;
    if values.is_empty() {
        // the first element assignment takes over the enclosing one
        if let (Some(assign), Some((&first, tail))) = (enclosing, assignments.split_first()) {
            if let &[target, value] = ctx.ast.children(first) {
                if let Some(&old) = ctx.ast.children(assign).first() {
                    ctx.ast.replace_child(assign, old, target);
                }
                result = value;
                rest = tail;
            }
        }
    }
    match scope {
        Some(scope) => {
            for &a in rest {
                ctx.ast.push_child(scope, a);
            }
        }
        None if !rest.is_empty() => ctx.report_unhandled(h),
        None => {}
    }
    Ok(Some(result))
}

/// Lowers `field: value` (or `index: value`) into an assignment to that part
/// of the enclosing target.
pub fn process_tagged_pattern(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let loc = ctx.loc(h);
    let enclosing = ctx.frames.find_ancestor(&ctx.ast, ASSIGN_KINDS);
    let (kind, target) = match enclosing.and_then(|a| ctx.ast.children(a).first().copied().map(|t| (a, t))) {
        Some((assign, t)) => (ctx.ast.kind(assign), ctx.ast.clone_subtree(t)),
        None => {
            let decl = ctx.frames.find_ancestor(
                &ctx.ast,
                &[NodeKind::Wire, NodeKind::Memory, NodeKind::Parameter, NodeKind::Localparam],
            );
            let Some(decl) = decl else {
                ctx.report_unhandled(h);
                return Ok(None);
            };
            let name = ctx.ast.node(decl).name;
            (NodeKind::Assign, ctx.ast.mk_ident_id(name, loc))
        }
    };

    if let Some(ts) = ctx.db.resolve(Relation::Typespec, h) {
        match ctx.db.kind(ts) {
            ObjectKind::StringTypespec => {
                let field = obj_name(ctx, ts);
                if field != "default" {
                    let dot = ctx.ast.mk_named(NodeKind::Dot, &field, loc);
                    ctx.ast.push_child(target, dot);
                }
            }
            ObjectKind::IntegerTypespec => {
                if let Some(index) = ctx.db.get_value(ts).and_then(|v| v.as_int()) {
                    let i = ctx.ast.mk_const_int(index, loc);
                    let range = ctx.ast.mk_range_of(i, None, loc);
                    ctx.ast.push_child(target, range);
                }
            }
            _ => {}
        }
    }

    let Some(value) = lower_required(ctx, Relation::Pattern, h)? else {
        return Ok(None);
    };
    Ok(Some(ctx.ast.mk_with(kind, loc, vec![target, value])))
}
