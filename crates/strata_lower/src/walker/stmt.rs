//! Statement, process, and subroutine lowering.
//!
//! Containers (ALWAYS, BLOCK, CASE, COND) are created before their contents
//! are lowered, so nested calls can attach sensitivity items, case labels, and
//! desugared loops to them through the frame stack.

use strata_ast::{AlwaysKind, NodeId, NodeKind, UnaryOp};
use strata_common::StrataResult;
use strata_db::{self as db, IntProp, ObjHandle, ObjectKind, OpType, Relation};

use super::decl::local_default;
use super::expr::binary_op;
use super::typespec::apply_typespec;
use super::{begin_node, lower_each, lower_object, lower_rel, lower_required, make_node, obj_name, strip_package};
use crate::context::LowerCtx;
use crate::errors;

/// Lowers the target of an assignment.
///
/// A declaration object standing directly on the left-hand side (a net with a
/// declaration assignment, a loop variable) becomes a plain identifier.
pub fn lower_target(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let kind = ctx.db.kind(h);
    if kind.is_net() || kind.is_variable() {
        let name = obj_name(ctx, h);
        return Ok(Some(ctx.ast.mk_ident(&name, ctx.loc(h))));
    }
    lower_object(ctx, h)
}

/// Wraps `stmt` in a BLOCK unless it already is one.
pub fn as_block(ctx: &mut LowerCtx<'_>, stmt: Option<NodeId>, h: ObjHandle) -> NodeId {
    match stmt {
        Some(s) if ctx.ast.kind(s) == NodeKind::Block => s,
        Some(s) => ctx.ast.mk_with(NodeKind::Block, ctx.loc(h), vec![s]),
        None => ctx.ast.mk(NodeKind::Block, ctx.loc(h)),
    }
}

fn lhs_is_variable(ctx: &LowerCtx<'_>, lhs: ObjHandle) -> bool {
    let kind = ctx.db.kind(lhs);
    if kind.is_variable() {
        return true;
    }
    matches!(kind, ObjectKind::RefObj | ObjectKind::RefVar)
        && ctx
            .db
            .resolve(Relation::Actual, lhs)
            .is_some_and(|a| ctx.db.kind(a).is_variable())
}

/// Lowers a continuous assignment.
///
/// A declaration assignment to a variable becomes a non-blocking assignment in
/// an anonymous INITIAL block.
pub fn process_cont_assign(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let Some(lhs_h) = ctx.db.resolve(Relation::Lhs, h) else {
        ctx.report_unhandled(h);
        return Ok(None);
    };
    let to_variable = ctx.db.flag(IntProp::NetDeclAssign, h) && lhs_is_variable(ctx, lhs_h);
    let kind = if to_variable {
        NodeKind::AssignLe
    } else {
        NodeKind::Assign
    };
    let Some(assign) = lower_assign(ctx, h, kind, lhs_h)? else {
        return Ok(None);
    };
    if !to_variable {
        return Ok(Some(assign));
    }
    let loc = ctx.loc(h);
    let block = ctx.ast.mk_with(NodeKind::Block, loc, vec![assign]);
    Ok(Some(ctx.ast.mk_with(NodeKind::Initial, loc, vec![block])))
}

/// Builds `kind(lhs, rhs)`.
///
/// The target is attached before the value is lowered so patterns inside the
/// value can see what they assign to.
fn lower_assign(
    ctx: &mut LowerCtx<'_>,
    h: ObjHandle,
    kind: NodeKind,
    lhs_h: ObjHandle,
) -> StrataResult<Option<NodeId>> {
    let node = begin_node(ctx, kind, h);
    let Some(lhs) = lower_target(ctx, lhs_h)? else {
        return Ok(None);
    };
    ctx.ast.push_child(node, lhs);
    let Some(mut rhs) = lower_required(ctx, Relation::Rhs, h)? else {
        return Ok(None);
    };
    let compound = ctx
        .db
        .get_int(IntProp::OpType, h)
        .and_then(OpType::from_code)
        .and_then(binary_op);
    if let Some(op) = compound {
        // a pattern may have replaced the target
        let target = ctx.ast.children(node)[0];
        let current = ctx.ast.clone_subtree(target);
        rhs = ctx.ast.mk_binary(op, current, rhs, ctx.loc(h));
    }
    ctx.ast.push_child(node, rhs);
    Ok(Some(node))
}

/// Lowers a procedural assignment; compound operators expand to
/// `lhs = lhs op rhs`.
pub fn process_assignment(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let kind = if ctx.db.flag(IntProp::Blocking, h) {
        NodeKind::AssignEq
    } else {
        NodeKind::AssignLe
    };
    let Some(lhs_h) = ctx.db.resolve(Relation::Lhs, h) else {
        ctx.report_unhandled(h);
        return Ok(None);
    };
    lower_assign(ctx, h, kind, lhs_h)
}

fn always_kind(code: Option<i64>) -> AlwaysKind {
    match code.and_then(db::AlwaysKind::from_code) {
        Some(db::AlwaysKind::AlwaysComb) => AlwaysKind::Comb,
        Some(db::AlwaysKind::AlwaysFf) => AlwaysKind::Ff,
        Some(db::AlwaysKind::AlwaysLatch) => AlwaysKind::Latch,
        Some(db::AlwaysKind::Always) | None => AlwaysKind::Always,
    }
}

/// Lowers an always block, keeping its flavor.
pub fn process_always(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let node = begin_node(ctx, NodeKind::Always, h);
    ctx.ast.node_mut(node).attrs.always_kind = Some(always_kind(ctx.db.get_int(IntProp::AlwaysType, h)));
    let body = lower_rel(ctx, Relation::Stmt, h)?;
    let block = as_block(ctx, body, h);
    ctx.ast.push_child(node, block);
    Ok(Some(node))
}

/// Lowers an initial block.
pub fn process_initial(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let node = begin_node(ctx, NodeKind::Initial, h);
    let body = lower_rel(ctx, Relation::Stmt, h)?;
    let block = as_block(ctx, body, h);
    ctx.ast.push_child(node, block);
    Ok(Some(node))
}

/// Attaches the event expression to the enclosing ALWAYS and lowers the
/// controlled statement.
pub fn process_event_control(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    if let Some(event) = lower_rel(ctx, Relation::Condition, h)? {
        match ctx.frames.find_ancestor(&ctx.ast, &[NodeKind::Always]) {
            Some(always) => ctx.ast.push_child(always, event),
            None => ctx.report_unhandled(h),
        }
    }
    lower_rel(ctx, Relation::Stmt, h)
}

/// Lowers `begin ... end`, named or not.
pub fn process_begin(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let block = if ctx.db.kind(h) == ObjectKind::NamedBegin {
        make_node(ctx, NodeKind::Block, h)
    } else {
        begin_node(ctx, NodeKind::Block, h)
    };
    let mut defaults = Vec::new();
    for var in ctx.db.iterate(Relation::Variables, h) {
        if let Some(decl) = lower_object(ctx, var)? {
            ctx.ast.push_child(block, decl);
        }
        defaults.extend(local_default(ctx, var)?);
    }
    for init in defaults {
        ctx.ast.push_child(block, init);
    }
    for stmt in ctx.db.iterate(Relation::Stmts, h) {
        if let Some(node) = lower_object(ctx, stmt)? {
            ctx.ast.push_child(block, node);
        }
    }
    Ok(Some(block))
}

/// Lowers `if`/`if-else` into a CASE over the reduced condition.
pub fn process_if(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let loc = ctx.loc(h);
    let case = begin_node(ctx, NodeKind::Case, h);
    let Some(cond) = lower_required(ctx, Relation::Condition, h)? else {
        return Ok(None);
    };
    let reduced = ctx.ast.mk_unary(UnaryOp::ReduceBool, cond, loc);
    ctx.ast.push_child(case, reduced);

    let then = lower_rel(ctx, Relation::Stmt, h)?;
    let then_block = as_block(ctx, then, h);
    let one = ctx.ast.mk_const_sized(1, 1, loc);
    let taken = ctx.ast.mk_with(NodeKind::Cond, loc, vec![one, then_block]);
    ctx.ast.push_child(case, taken);

    if ctx.db.kind(h) == ObjectKind::IfElse {
        let other = lower_rel(ctx, Relation::ElseStmt, h)?;
        let else_block = as_block(ctx, other, h);
        let default = ctx.ast.mk(NodeKind::Default, loc);
        let fallback = ctx.ast.mk_with(NodeKind::Cond, loc, vec![default, else_block]);
        ctx.ast.push_child(case, fallback);
    }
    Ok(Some(case))
}

/// Lowers a case statement.
pub fn process_case(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let case = begin_node(ctx, NodeKind::Case, h);
    let Some(cond) = lower_required(ctx, Relation::Condition, h)? else {
        return Ok(None);
    };
    ctx.ast.push_child(case, cond);
    for item in lower_each(ctx, Relation::CaseItems, h)? {
        ctx.ast.push_child(case, item);
    }
    Ok(Some(case))
}

/// Lowers a case item into a COND; an item without labels is the default.
pub fn process_case_item(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let cond = begin_node(ctx, NodeKind::Cond, h);
    let exprs = ctx.db.iterate(Relation::Exprs, h);
    if exprs.is_empty() {
        let default = ctx.ast.mk(NodeKind::Default, ctx.loc(h));
        ctx.ast.push_child(cond, default);
    }
    for e in exprs {
        if let Some(label) = lower_object(ctx, e)? {
            ctx.ast.push_child(cond, label);
        }
    }
    let body = lower_rel(ctx, Relation::Stmt, h)?;
    let block = as_block(ctx, body, h);
    ctx.ast.push_child(cond, block);
    Ok(Some(cond))
}

fn make_blocking(ctx: &mut LowerCtx<'_>, stmt: NodeId) {
    if ctx.ast.kind(stmt) == NodeKind::AssignLe {
        ctx.ast.node_mut(stmt).kind = NodeKind::AssignEq;
    }
}

/// Lowers a `for` loop into FOR `$loopN`.
///
/// Loop variables declared in the initializer move into an enclosing
/// `$fordecl_blockN` block.
pub fn process_for(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let id = ctx.fresh_loop_id();
    let loc = ctx.loc(h);
    let node = ctx.ast.mk_named(NodeKind::For, &format!("$loop{id}"), loc);
    ctx.frames.set_current(node);

    let mut decls = Vec::new();
    for init in ctx.db.iterate(Relation::ForInitStmts, h) {
        let declared = ctx
            .db
            .resolve(Relation::Lhs, init)
            .filter(|&l| ctx.db.kind(l).is_variable());
        if let Some(var) = declared {
            if let Some(wire) = lower_object(ctx, var)? {
                decls.push(wire);
            }
        }
        if let Some(stmt) = lower_object(ctx, init)? {
            make_blocking(ctx, stmt);
            ctx.ast.push_child(node, stmt);
        }
    }
    let Some(cond) = lower_required(ctx, Relation::Condition, h)? else {
        return Ok(None);
    };
    ctx.ast.push_child(node, cond);
    for inc in ctx.db.iterate(Relation::ForIncStmts, h) {
        if let Some(stmt) = lower_object(ctx, inc)? {
            make_blocking(ctx, stmt);
            ctx.ast.push_child(node, stmt);
        }
    }
    let body = lower_rel(ctx, Relation::Stmt, h)?;
    let block = as_block(ctx, body, h);
    ctx.ast.push_child(node, block);

    if decls.is_empty() {
        return Ok(Some(node));
    }
    let wrapper = ctx.ast.mk_named(NodeKind::Block, &format!("$fordecl_block{id}"), loc);
    for d in decls {
        ctx.ast.push_child(wrapper, d);
    }
    ctx.ast.push_child(wrapper, node);
    Ok(Some(wrapper))
}

/// Lowers `repeat (n) stmt`.
pub fn process_repeat(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let node = begin_node(ctx, NodeKind::Repeat, h);
    let Some(count) = lower_required(ctx, Relation::Condition, h)? else {
        return Ok(None);
    };
    let body = lower_rel(ctx, Relation::Stmt, h)?;
    let block = as_block(ctx, body, h);
    ctx.ast.push_child(node, count);
    ctx.ast.push_child(node, block);
    Ok(Some(node))
}

/// Lowers `return expr` into an assignment to the enclosing function's name.
pub fn process_return(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let Some(func) = ctx.frames.find_ancestor(&ctx.ast, &[NodeKind::Function]) else {
        return Ok(None);
    };
    let Some(value) = lower_rel(ctx, Relation::Condition, h)? else {
        return Ok(None);
    };
    let loc = ctx.loc(h);
    let target = ctx.ast.mk_ident_id(ctx.ast.node(func).name, loc);
    Ok(Some(ctx.ast.mk_with(NodeKind::AssignEq, loc, vec![target, value])))
}

/// Drops a delay and keeps the statement it controls.
pub fn process_delay(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    ctx.emit(errors::non_synthesizable(ctx.db.kind(h), ctx.loc(h)));
    lower_rel(ctx, Relation::Stmt, h)
}

/// Lowers an immediate assertion, or drops it under `no_assert`.
pub fn process_assert(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    if ctx.config.no_assert {
        return Ok(None);
    }
    let node = begin_node(ctx, NodeKind::Assert, h);
    let Some(expr) = lower_required(ctx, Relation::Expr, h)? else {
        return Ok(None);
    };
    ctx.ast.push_child(node, expr);
    Ok(Some(node))
}

/// Lowers a function or task definition.
///
/// A function gets a variable named after itself that holds the return value.
pub fn process_task_func(ctx: &mut LowerCtx<'_>, h: ObjHandle, kind: NodeKind) -> StrataResult<Option<NodeId>> {
    let name = obj_name(ctx, h);
    let loc = ctx.loc(h);
    let node = ctx.ast.mk_named(kind, strip_package(&name), loc);
    ctx.frames.set_current(node);
    if ctx.db.flag(IntProp::Signed, h) {
        ctx.ast.node_mut(node).flags.is_signed = true;
    }

    if kind == NodeKind::Function {
        let ret = ctx.ast.mk_named(NodeKind::Wire, strip_package(&name), loc);
        ctx.ast.node_mut(ret).flags.is_reg = true;
        let ts = ctx
            .db
            .resolve(Relation::Return, h)
            .and_then(|r| ctx.db.resolve(Relation::Typespec, r));
        if let Some(ts) = ts {
            apply_typespec(ctx, ret, ts, "function return")?;
        }
        let ranges = std::mem::take(&mut ctx.ast.node_mut(ret).decl.packed);
        ctx.ast.node_mut(ret).children.extend(ranges);
        ctx.ast.push_child(node, ret);
    }

    for io in lower_each(ctx, Relation::IoDecls, h)? {
        ctx.ast.push_child(node, io);
    }
    let mut defaults = Vec::new();
    for var in ctx.db.iterate(Relation::Variables, h) {
        if let Some(decl) = lower_object(ctx, var)? {
            ctx.ast.push_child(node, decl);
        }
        defaults.extend(local_default(ctx, var)?);
    }
    let body = lower_rel(ctx, Relation::Stmt, h)?;
    let block = as_block(ctx, body, h);
    for (i, init) in defaults.into_iter().enumerate() {
        ctx.ast.insert_child(block, i, init);
    }
    ctx.ast.push_child(node, block);
    Ok(Some(node))
}
