//! Right-to-left streaming (`{<< n {src}}`) as a counted loop.
//!
//! The reordered value is built in `loopN::temp` by a FOR that copies `src`
//! slice by slice, last slice first. The loop runs before the statement that
//! uses the stream; the stream expression itself becomes a reference to the
//! temporary.

use strata_ast::{AlwaysKind, BinaryOp, NodeId, NodeKind};
use strata_common::StrataResult;
use strata_db::{ObjHandle, ObjectKind, Relation};

use super::lower_object;
use crate::arith::Arith;
use crate::context::LowerCtx;
use crate::errors;

/// Where the synthesized declarations live.
const DECL_SCOPES: &[NodeKind] = &[
    NodeKind::Function,
    NodeKind::Task,
    NodeKind::GenBlock,
    NodeKind::Module,
    NodeKind::Interface,
    NodeKind::Package,
];

/// Where the loop can run: a statement block, or failing that a fresh
/// combinational process on the unit.
const LOOP_SCOPES: &[NodeKind] = &[
    NodeKind::Block,
    NodeKind::Function,
    NodeKind::Task,
    NodeKind::GenBlock,
    NodeKind::Module,
    NodeKind::Interface,
    NodeKind::Package,
];

/// Lowers a right-to-left streaming operation.
pub fn lower_stream_rl(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let loc = ctx.loc(h);
    let operands = ctx.db.iterate(Relation::Operands, h);
    let (slice_h, src_h) = match operands.as_slice() {
        [src] => (None, *src),
        [slice, src] if ctx.db.kind(*slice) == ObjectKind::Constant => (Some(*slice), *src),
        _ => return unhandled(ctx, h),
    };
    let slice = match slice_h {
        Some(s) => lower_object(ctx, s)?.and_then(|n| ctx.ast.const_int(n)),
        None => Some(1),
    };
    let src = lower_object(ctx, src_h)?;
    let (Some(slice), Some(src)) = (slice.filter(|&s| s > 0), src) else {
        return unhandled(ctx, h);
    };
    if ctx.ast.kind(src) != NodeKind::Identifier || !ctx.ast.children(src).is_empty() {
        return unhandled(ctx, h);
    }
    let (Some(decl_scope), Some(loop_scope)) = (
        ctx.frames.find_ancestor(&ctx.ast, DECL_SCOPES),
        ctx.frames.find_ancestor(&ctx.ast, LOOP_SCOPES),
    ) else {
        return unhandled(ctx, h);
    };

    let id = ctx.fresh_loop_id();
    let temp_name = format!("loop{id}::temp");
    let i_name = format!("loop{id}::i");
    let src_name = ctx.ast.node(src).name;

    // temp is as wide as the source
    let bits = bits_of(ctx, src_name, loc);
    let top = {
        let mut ar = Arith::new(&mut ctx.ast, loc);
        ar.add_int(bits, -1)
    };
    let zero = ctx.ast.mk_const_int(0, loc);
    let temp_range = ctx.ast.mk_range_of(top, Some(zero), loc);
    let temp = ctx.ast.mk_named(NodeKind::Wire, &temp_name, loc);
    ctx.ast.node_mut(temp).flags.is_reg = true;
    ctx.ast.push_child(temp, temp_range);

    let counter = ctx.ast.mk_named(NodeKind::Wire, &i_name, loc);
    let counter_range = ctx.ast.mk_range(31, 0, loc);
    ctx.ast.push_child(counter, counter_range);
    let flags = &mut ctx.ast.node_mut(counter).flags;
    flags.is_reg = true;
    flags.is_signed = true;

    ctx.ast.push_child(decl_scope, temp);
    ctx.ast.push_child(decl_scope, counter);

    let for_node = build_loop(ctx, id, &temp_name, &i_name, src_name, slice, loc);
    if ctx.ast.kind(loop_scope) == NodeKind::Block {
        ctx.ast.push_child(loop_scope, for_node);
    } else {
        let block = ctx.ast.mk_with(NodeKind::Block, loc, vec![for_node]);
        let always = ctx.ast.mk_with(NodeKind::Always, loc, vec![block]);
        ctx.ast.node_mut(always).attrs.always_kind = Some(AlwaysKind::Comb);
        ctx.ast.push_child(loop_scope, always);
    }

    Ok(Some(ctx.ast.mk_ident(&temp_name, loc)))
}

fn unhandled(ctx: &LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let code = ctx.db.get_int(strata_db::IntProp::OpType, h).unwrap_or(0);
    ctx.emit(errors::unhandled_operation(code, ctx.loc(h), ctx.config.stop_on_error));
    Ok(None)
}

/// `$bits(name)`.
fn bits_of(ctx: &mut LowerCtx<'_>, name: strata_common::Ident, loc: strata_source::Loc) -> NodeId {
    let arg = ctx.ast.mk_ident_id(name, loc);
    let call = ctx.ast.mk_named(NodeKind::FCall, "$bits", loc);
    ctx.ast.push_child(call, arg);
    call
}

/// `for (i = 0; i < $bits(src) / s; i = i + 1)
///     temp[i*s + s-1 : i*s] = src[W-1 - i*s : W-s - i*s];`
fn build_loop(
    ctx: &mut LowerCtx<'_>,
    id: u32,
    temp_name: &str,
    i_name: &str,
    src: strata_common::Ident,
    slice: i64,
    loc: strata_source::Loc,
) -> NodeId {
    let i_init = ctx.ast.mk_ident(i_name, loc);
    let zero = ctx.ast.mk_const_int(0, loc);
    let init = ctx.ast.mk_with(NodeKind::AssignEq, loc, vec![i_init, zero]);

    let i_cond = ctx.ast.mk_ident(i_name, loc);
    let width = bits_of(ctx, src, loc);
    let s = ctx.ast.mk_const_int(slice, loc);
    let count = ctx.ast.mk_binary(BinaryOp::Div, width, s, loc);
    let cond = ctx.ast.mk_binary(BinaryOp::Lt, i_cond, count, loc);

    let i_inc = ctx.ast.mk_ident(i_name, loc);
    let i_next = ctx.ast.mk_ident(i_name, loc);
    let next = {
        let mut ar = Arith::new(&mut ctx.ast, loc);
        ar.add_int(i_next, 1)
    };
    let inc = ctx.ast.mk_with(NodeKind::AssignEq, loc, vec![i_inc, next]);

    let i_lhs = ctx.ast.mk_ident(i_name, loc);
    let i_rhs = ctx.ast.mk_ident(i_name, loc);
    let w = bits_of(ctx, src, loc);
    let (lhs_range, rhs_range) = {
        let mut ar = Arith::new(&mut ctx.ast, loc);
        let offset = ar.mul_int(i_lhs, slice);
        let low = ar.copy(offset);
        let high = ar.add_int(offset, slice - 1);
        let lhs_range = ar.ast.mk_range_of(high, Some(low), loc);

        let offset = ar.mul_int(i_rhs, slice);
        let offset_copy = ar.copy(offset);
        let w_copy = ar.copy(w);
        let top = ar.add_int(w, -1);
        let high = ar.sub(top, offset);
        let bottom = ar.add_int(w_copy, -slice);
        let low = ar.sub(bottom, offset_copy);
        (lhs_range, ar.ast.mk_range_of(high, Some(low), loc))
    };
    let target = ctx.ast.mk_ident(temp_name, loc);
    ctx.ast.push_child(target, lhs_range);
    let source = ctx.ast.mk_ident_id(src, loc);
    ctx.ast.push_child(source, rhs_range);
    let copy = ctx.ast.mk_with(NodeKind::AssignEq, loc, vec![target, source]);
    let body = ctx.ast.mk_with(NodeKind::Block, loc, vec![copy]);

    let for_node = ctx.ast.mk_named(NodeKind::For, &format!("$loop{id}"), loc);
    for c in [init, cond, inc, body] {
        ctx.ast.push_child(for_node, c);
    }
    for_node
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::LowerConfig;
    use strata_db::{IntProp, MemDb, OpType, Value};
    use strata_diagnostics::DiagnosticSink;

    fn stream(db: &mut MemDb, slice: Option<i64>, src: ObjHandle) -> ObjHandle {
        let mut operands = Vec::new();
        if let Some(s) = slice {
            operands.push(db.obj(ObjectKind::Constant).value(Value::Int(s)).finish());
        }
        operands.push(src);
        db.obj(ObjectKind::Operation)
            .int(IntProp::OpType, OpType::StreamRl.code())
            .rels(Relation::Operands, operands)
            .finish()
    }

    fn with_module<R>(db: &MemDb, f: impl FnOnce(&mut LowerCtx<'_>, NodeId) -> R) -> (R, DiagnosticSink) {
        let config = LowerConfig::default();
        let sink = DiagnosticSink::new();
        let r = {
            let mut ctx = LowerCtx::new(db, &config, &sink);
            ctx.frames.push(ObjHandle::from_raw(999), ObjectKind::Module);
            let m = ctx.ast.mk_named(NodeKind::Module, "m", strata_source::Loc::DUMMY);
            ctx.frames.set_current(m);
            f(&mut ctx, m)
        };
        (r, sink)
    }

    #[test]
    fn continuous_stream_gets_its_own_process() {
        let mut db = MemDb::new();
        let src = db.obj(ObjectKind::RefObj).name("data").finish();
        let op = stream(&mut db, Some(8), src);
        let (kinds, _) = with_module(&db, |ctx, m| {
            let node = lower_object(ctx, op).unwrap().unwrap();
            assert_eq!(ctx.ast.name_of(node), "loop0::temp");
            let kids = ctx.ast.children(m).to_vec();
            let always = kids[2];
            assert_eq!(ctx.ast.node(always).attrs.always_kind, Some(AlwaysKind::Comb));
            let block = ctx.ast.children(always)[0];
            let for_node = ctx.ast.children(block)[0];
            assert_eq!(ctx.ast.name_of(for_node), "$loop0");
            kids.iter().map(|&k| ctx.ast.name_of(k).to_string()).collect::<Vec<_>>()
        });
        assert_eq!(kinds[..2], ["loop0::temp".to_string(), "loop0::i".to_string()]);
    }

    #[test]
    fn stream_inside_block_runs_before_statement() {
        let mut db = MemDb::new();
        let src = db.obj(ObjectKind::RefObj).name("data").finish();
        let op = stream(&mut db, None, src);
        with_module(&db, |ctx, m| {
            let block = ctx.ast.mk(NodeKind::Block, strata_source::Loc::DUMMY);
            ctx.frames.push(ObjHandle::from_raw(998), ObjectKind::Begin);
            ctx.frames.set_current(block);
            lower_object(ctx, op).unwrap().unwrap();
            let for_node = ctx.ast.children(block)[0];
            assert_eq!(ctx.ast.kind(for_node), NodeKind::For);
            // init, cond, inc, body
            assert_eq!(ctx.ast.children(for_node).len(), 4);
            assert_eq!(ctx.ast.children(m).len(), 2);
        });
    }

    #[test]
    fn selected_source_is_unhandled() {
        let mut db = MemDb::new();
        let idx = db.obj(ObjectKind::Constant).value(Value::Int(0)).finish();
        let src = db.obj(ObjectKind::BitSelect).name("data").rel(Relation::Index, idx).finish();
        let op = stream(&mut db, None, src);
        let (node, sink) = with_module(&db, |ctx, _| lower_object(ctx, op).unwrap());
        assert_eq!(node, None);
        assert_eq!(sink.take_all()[0].code, errors::W301);
    }
}
