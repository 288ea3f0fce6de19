//! Expression lowering: constants, references, selects, operations, and calls.

use strata_ast::{BinaryOp, ConstValue, NodeId, NodeKind, UnaryOp};
use strata_common::StrataResult;
use strata_db::{IntProp, ObjHandle, ObjectKind, OpType, PartSelectKind, Relation, Value};

use super::{begin_node, lower_each, lower_object, lower_rel, lower_required, make_node, obj_name, pattern, stream, strip_package};
use crate::arith::Arith;
use crate::context::LowerCtx;
use crate::errors;

/// System tasks that are calls in statement position.
const SYSTEM_TASKS: &[&str] = &[
    "$display",
    "$write",
    "$strobe",
    "$monitor",
    "$readmemh",
    "$readmemb",
    "$finish",
    "$stop",
    "$info",
    "$warning",
    "$error",
    "$fatal",
];

/// System functions that lower to nothing.
const DROPPED_SYSTEM_CALLS: &[&str] = &["$value$plusargs"];

/// Builds a constant node from a literal value of object `h`.
///
/// The width comes from the object's `size`; unsized based literals are 32-bit
/// signed. Returns `None` for digits that do not parse.
pub fn const_from_value(ctx: &mut LowerCtx<'_>, value: &Value, h: ObjHandle) -> Option<NodeId> {
    let loc = ctx.loc(h);
    let size = ctx
        .db
        .get_int(IntProp::Size, h)
        .filter(|&s| s > 0)
        .and_then(|s| u32::try_from(s).ok());
    let signed = ctx.db.flag(IntProp::Signed, h);
    let cv = match value {
        Value::Scalar(s @ (0 | 1)) => ConstValue::int(i64::from(*s), 1),
        Value::Scalar(2) => ConstValue::from_digits('b', "x", Some(1), false)?,
        Value::Scalar(_) => ConstValue::from_digits('b', "z", Some(1), false)?,
        Value::Int(i) => match size {
            Some(w) if !signed => ConstValue::int(*i, w),
            Some(w) => ConstValue::signed(*i, w),
            None => ConstValue::signed(*i, 32),
        },
        Value::UInt(u) => ConstValue::int(i64::try_from(*u).ok()?, size.unwrap_or(32)),
        Value::Real(r) => {
            let node = ctx.ast.mk_const(ConstValue::Real(*r), loc);
            ctx.ast.node_mut(node).kind = NodeKind::RealValue;
            return Some(node);
        }
        Value::Str(s) => return Some(ctx.ast.mk_const_str(s, loc)),
        Value::BinStr(d) | Value::OctStr(d) | Value::DecStr(d) | Value::HexStr(d) => {
            let base = value.base_char()?;
            match size {
                Some(w) => ConstValue::from_digits(base, d, Some(w), signed)?,
                None => ConstValue::from_digits(base, d, Some(32), true)?,
            }
        }
    };
    Some(ctx.ast.mk_const(cv, loc))
}

/// Lowers a literal.
pub fn process_constant(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let value = ctx.db.get_value(h).cloned();
    let node = value.and_then(|v| const_from_value(ctx, &v, h));
    if node.is_none() {
        ctx.report_unhandled(h);
    }
    Ok(node)
}

/// Lowers a range object into a RANGE node with one or two bounds.
pub fn process_range(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let Some(left) = lower_required(ctx, Relation::LeftRange, h)? else {
        return Ok(None);
    };
    let right = lower_rel(ctx, Relation::RightRange, h)?;
    Ok(Some(ctx.ast.mk_range_of(left, right, ctx.loc(h))))
}

/// Lowers a reference to a named object into an IDENTIFIER.
///
/// Enum items referenced through their package are named without the
/// qualifier, the way package imports register them.
pub fn process_ref(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let mut name = obj_name(ctx, h);
    let actual = ctx.db.resolve(Relation::Actual, h);
    if actual.is_some_and(|a| ctx.db.kind(a) == ObjectKind::EnumConst) {
        name = strip_package(&name).to_string();
    }
    let node = ctx.ast.mk_ident(&name, ctx.loc(h));
    ctx.frames.set_current(node);
    Ok(Some(node))
}

/// The name of the object a select applies to.
fn select_name(ctx: &LowerCtx<'_>, h: ObjHandle) -> String {
    let name = obj_name(ctx, h);
    if !name.is_empty() {
        return name;
    }
    ctx.db
        .resolve(Relation::Parent, h)
        .map(|p| obj_name(ctx, p))
        .unwrap_or_default()
}

fn select_ident(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> NodeId {
    let name = select_name(ctx, h);
    let node = ctx.ast.mk_ident(&name, ctx.loc(h));
    ctx.frames.set_current(node);
    node
}

/// Lowers `x[i]`.
pub fn process_bit_select(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let ident = select_ident(ctx, h);
    if let Some(index) = lower_rel(ctx, Relation::Index, h)? {
        let range = ctx.ast.mk_range_of(index, None, ctx.loc(h));
        ctx.ast.push_child(ident, range);
    }
    Ok(Some(ident))
}

/// Lowers `x[i][j]...`.
pub fn process_var_select(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let ident = select_ident(ctx, h);
    for index in lower_each(ctx, Relation::Indexes, h)? {
        let range = ctx.ast.mk_range_of(index, None, ctx.loc(h));
        ctx.ast.push_child(ident, range);
    }
    Ok(Some(ident))
}

/// Lowers `x[l:r]`.
pub fn process_part_select(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let ident = select_ident(ctx, h);
    let left = lower_rel(ctx, Relation::LeftRange, h)?;
    let right = lower_rel(ctx, Relation::RightRange, h)?;
    if let Some(left) = left {
        let range = ctx.ast.mk_range_of(left, right, ctx.loc(h));
        ctx.ast.push_child(ident, range);
    }
    Ok(Some(ident))
}

/// Lowers `x[base +: width]` and `x[base -: width]` into explicit bounds.
pub fn process_indexed_part_select(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let ident = select_ident(ctx, h);
    let Some(base) = lower_required(ctx, Relation::BaseExpr, h)? else {
        return Ok(None);
    };
    let Some(width) = lower_required(ctx, Relation::WidthExpr, h)? else {
        return Ok(None);
    };
    let dir = ctx
        .db
        .get_int(IntProp::IndexedPartSelectType, h)
        .and_then(PartSelectKind::from_code)
        .unwrap_or(PartSelectKind::Pos);
    let loc = ctx.loc(h);
    let mut ar = Arith::new(&mut ctx.ast, loc);
    let (left, right) = match dir {
        PartSelectKind::Pos => {
            let b = ar.copy(base);
            let top = ar.add(b, width);
            (ar.add_int(top, -1), base)
        }
        PartSelectKind::Neg => {
            let b = ar.copy(base);
            let bottom = ar.sub(b, width);
            (base, ar.add_int(bottom, 1))
        }
    };
    let range = ctx.ast.mk_range_of(left, Some(right), loc);
    ctx.ast.push_child(ident, range);
    Ok(Some(ident))
}

/// Lowers a hierarchical path into an IDENTIFIER followed by a DOT chain.
///
/// Selectors written on a path element end up on that element's node.
pub fn process_hier_path(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let elements = ctx.db.iterate(Relation::ActualGroup, h);
    let mut head = None;
    let mut tail = None;
    for e in elements {
        let Some(part) = lower_object(ctx, e)? else {
            continue;
        };
        match tail {
            None => {
                head = Some(part);
                tail = Some(part);
            }
            Some(prev) => {
                let node = ctx.ast.node(part).clone();
                let dot = ctx.ast.mk_with(NodeKind::Dot, node.loc, node.children);
                ctx.ast.node_mut(dot).name = node.name;
                ctx.ast.push_child(prev, dot);
                tail = Some(dot);
            }
        }
    }
    if head.is_none() {
        ctx.report_unhandled(h);
    }
    Ok(head)
}

fn unary_op(op: OpType) -> Option<UnaryOp> {
    Some(match op {
        OpType::Minus => UnaryOp::Neg,
        OpType::Plus => UnaryOp::Pos,
        OpType::Not => UnaryOp::LogicNot,
        OpType::BitNeg => UnaryOp::BitNot,
        OpType::UnaryAnd => UnaryOp::ReduceAnd,
        OpType::UnaryOr => UnaryOp::ReduceOr,
        OpType::UnaryXor => UnaryOp::ReduceXor,
        OpType::UnaryXnor => UnaryOp::ReduceXnor,
        _ => return None,
    })
}

pub(crate) fn binary_op(op: OpType) -> Option<BinaryOp> {
    Some(match op {
        OpType::Sub => BinaryOp::Sub,
        OpType::Div => BinaryOp::Div,
        OpType::Mod => BinaryOp::Mod,
        OpType::Eq => BinaryOp::Eq,
        OpType::Neq => BinaryOp::Ne,
        OpType::CaseEq => BinaryOp::EqX,
        OpType::CaseNeq => BinaryOp::NeX,
        OpType::Gt => BinaryOp::Gt,
        OpType::Ge => BinaryOp::Ge,
        OpType::Lt => BinaryOp::Lt,
        OpType::Le => BinaryOp::Le,
        OpType::LShift => BinaryOp::Shl,
        OpType::RShift => BinaryOp::Shr,
        OpType::Add => BinaryOp::Add,
        OpType::Mult => BinaryOp::Mul,
        OpType::LogAnd => BinaryOp::LogicAnd,
        OpType::LogOr => BinaryOp::LogicOr,
        OpType::BitAnd => BinaryOp::BitAnd,
        OpType::BitOr => BinaryOp::BitOr,
        OpType::BitXor => BinaryOp::BitXor,
        OpType::BitXnor => BinaryOp::BitXnor,
        OpType::ArithLShift => BinaryOp::SShl,
        OpType::ArithRShift => BinaryOp::SShr,
        OpType::Power => BinaryOp::Pow,
        _ => return None,
    })
}

fn unhandled_op(ctx: &LowerCtx<'_>, code: i64, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    ctx.emit(errors::unhandled_operation(code, ctx.loc(h), ctx.config.stop_on_error));
    Ok(None)
}

/// Lowers an operation by its operator code.
pub fn process_operation(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let code = ctx.db.get_int(IntProp::OpType, h).unwrap_or(0);
    let Some(op) = OpType::from_code(code) else {
        return unhandled_op(ctx, code, h);
    };
    let loc = ctx.loc(h);

    match op {
        OpType::Null => return Ok(None),
        OpType::EventOr | OpType::List => return attach_operands(ctx, h, code),
        OpType::StreamRl => return stream::lower_stream_rl(ctx, h),
        OpType::AssignmentPattern | OpType::MultiAssignmentPattern => {
            return pattern::lower_assignment_pattern(ctx, h, op)
        }
        _ => {}
    }

    let ops = lower_each(ctx, Relation::Operands, h)?;
    let node = match (op, unary_op(op), binary_op(op), ops.as_slice()) {
        (OpType::UnaryNand, _, _, &[a]) => {
            let reduce = ctx.ast.mk_unary(UnaryOp::ReduceAnd, a, loc);
            ctx.ast.mk_unary(UnaryOp::LogicNot, reduce, loc)
        }
        (OpType::UnaryNor, _, _, &[a]) => {
            let reduce = ctx.ast.mk_unary(UnaryOp::ReduceOr, a, loc);
            ctx.ast.mk_unary(UnaryOp::LogicNot, reduce, loc)
        }
        (OpType::Condition, _, _, &[c, t, e]) => ctx.ast.mk_with(NodeKind::Ternary, loc, vec![c, t, e]),
        (OpType::Concat, _, _, _) if !ops.is_empty() => {
            let reversed = ops.iter().rev().copied().collect();
            ctx.ast.mk_with(NodeKind::Concat, loc, reversed)
        }
        (OpType::MultiConcat, _, _, &[count, ref rest @ ..]) if !rest.is_empty() => {
            let reversed = rest.iter().rev().copied().collect();
            let concat = ctx.ast.mk_with(NodeKind::Concat, loc, reversed);
            ctx.ast.mk_with(NodeKind::Replicate, loc, vec![count, concat])
        }
        (OpType::MinTypMax, _, _, &[_, typ, _]) => typ,
        (OpType::MinTypMax, _, _, &[only]) => only,
        (OpType::Posedge, _, _, &[a]) => ctx.ast.mk_with(NodeKind::Posedge, loc, vec![a]),
        (OpType::Negedge, _, _, &[a]) => ctx.ast.mk_with(NodeKind::Negedge, loc, vec![a]),
        (OpType::PostInc | OpType::PreInc | OpType::PostDec | OpType::PreDec, _, _, &[a]) => {
            let step = if matches!(op, OpType::PostInc | OpType::PreInc) {
                BinaryOp::Add
            } else {
                BinaryOp::Sub
            };
            let target = ctx.ast.clone_subtree(a);
            let one = ctx.ast.mk_const_int(1, loc);
            let value = ctx.ast.mk_binary(step, a, one, loc);
            ctx.ast.mk_with(NodeKind::AssignEq, loc, vec![target, value])
        }
        (OpType::Cast | OpType::StreamLr, _, _, &[.., last]) => last,
        (OpType::Inside, _, _, &[value, ref items @ ..]) if !items.is_empty() => {
            let mut chain: Option<NodeId> = None;
            for (i, &item) in items.iter().enumerate() {
                let lhs = if i == 0 { value } else { ctx.ast.clone_subtree(value) };
                let eq = ctx.ast.mk_binary(BinaryOp::Eq, lhs, item, loc);
                chain = Some(match chain {
                    None => eq,
                    Some(acc) => ctx.ast.mk_binary(BinaryOp::LogicOr, acc, eq, loc),
                });
            }
            return Ok(chain);
        }
        (_, Some(u), _, &[a]) => ctx.ast.mk_unary(u, a, loc),
        (_, _, Some(b_op), &[a, b]) => ctx.ast.mk_binary(b_op, a, b, loc),
        _ => return unhandled_op(ctx, code, h),
    };
    Ok(Some(node))
}

/// Lowers the operands of an event-or or list operation onto the enclosing
/// ALWAYS or COND node.
fn attach_operands(ctx: &mut LowerCtx<'_>, h: ObjHandle, code: i64) -> StrataResult<Option<NodeId>> {
    let Some(target) = ctx.frames.find_ancestor(&ctx.ast, &[NodeKind::Always, NodeKind::Cond]) else {
        return unhandled_op(ctx, code, h);
    };
    for operand in lower_each(ctx, Relation::Operands, h)? {
        ctx.ast.push_child(target, operand);
    }
    Ok(None)
}

/// Lowers a system function or task call.
pub fn process_sys_func_call(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let name = obj_name(ctx, h);
    if DROPPED_SYSTEM_CALLS.contains(&name.as_str()) {
        return Ok(None);
    }
    let kind = match name.as_str() {
        "$signed" => NodeKind::ToSigned,
        "$unsigned" => NodeKind::ToUnsigned,
        n if SYSTEM_TASKS.contains(&n) => NodeKind::TCall,
        _ => NodeKind::FCall,
    };
    let node = if matches!(kind, NodeKind::ToSigned | NodeKind::ToUnsigned) {
        begin_node(ctx, kind, h)
    } else {
        make_node(ctx, kind, h)
    };
    for arg in lower_each(ctx, Relation::Arguments, h)? {
        ctx.ast.push_child(node, arg);
    }
    Ok(Some(node))
}

/// Lowers a user function or task call.
pub fn process_call(ctx: &mut LowerCtx<'_>, h: ObjHandle, kind: NodeKind) -> StrataResult<Option<NodeId>> {
    let name = obj_name(ctx, h);
    let node = ctx.ast.mk_named(kind, strip_package(&name), ctx.loc(h));
    ctx.frames.set_current(node);
    for arg in lower_each(ctx, Relation::Arguments, h)? {
        ctx.ast.push_child(node, arg);
    }
    Ok(Some(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::LowerConfig;
    use strata_db::MemDb;
    use strata_diagnostics::DiagnosticSink;

    fn int(db: &mut MemDb, v: i64) -> ObjHandle {
        db.obj(ObjectKind::Constant).value(Value::Int(v)).finish()
    }

    fn op(db: &mut MemDb, op: OpType, operands: Vec<ObjHandle>) -> ObjHandle {
        db.obj(ObjectKind::Operation)
            .int(IntProp::OpType, op.code())
            .rels(Relation::Operands, operands)
            .finish()
    }

    fn reference(db: &mut MemDb, name: &str) -> ObjHandle {
        db.obj(ObjectKind::RefObj).name(name).finish()
    }

    fn lower(db: &MemDb, h: ObjHandle) -> (strata_ast::Ast, Option<NodeId>, DiagnosticSink) {
        let config = LowerConfig::default();
        let sink = DiagnosticSink::new();
        let mut ctx = LowerCtx::new(db, &config, &sink);
        let node = lower_object(&mut ctx, h).unwrap();
        (ctx.ast, node, sink)
    }

    #[test]
    fn constants_carry_width_and_sign() {
        let mut db = MemDb::new();
        let plain = int(&mut db, 5);
        let sized = db
            .obj(ObjectKind::Constant)
            .value(Value::HexStr("ff".into()))
            .int(IntProp::Size, 8)
            .finish();
        let unsized_hex = db.obj(ObjectKind::Constant).value(Value::HexStr("a".into())).finish();
        let (ast, node, _) = lower(&db, plain);
        let v = ast.node(node.unwrap()).value.clone().unwrap();
        assert_eq!((v.as_int(), v.width(), v.is_signed()), (Some(5), 32, true));
        let (ast, node, _) = lower(&db, sized);
        let v = ast.node(node.unwrap()).value.clone().unwrap();
        assert_eq!((v.as_int(), v.width()), (Some(255), 8));
        let (ast, node, _) = lower(&db, unsized_hex);
        let v = ast.node(node.unwrap()).value.clone().unwrap();
        assert_eq!((v.as_int(), v.width()), (Some(10), 32));
    }

    #[test]
    fn concat_operands_are_reversed() {
        let mut db = MemDb::new();
        let a = reference(&mut db, "a");
        let b = reference(&mut db, "b");
        let cat = op(&mut db, OpType::Concat, vec![a, b]);
        let (ast, node, _) = lower(&db, cat);
        let node = node.unwrap();
        assert_eq!(ast.kind(node), NodeKind::Concat);
        let names: Vec<&str> = ast.children(node).iter().map(|&c| ast.name_of(c)).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn nand_wraps_logic_not() {
        let mut db = MemDb::new();
        let a = reference(&mut db, "a");
        let nand = op(&mut db, OpType::UnaryNand, vec![a]);
        let (ast, node, _) = lower(&db, nand);
        let node = node.unwrap();
        assert_eq!(ast.kind(node), NodeKind::Unary(UnaryOp::LogicNot));
        let inner = ast.children(node)[0];
        assert_eq!(ast.kind(inner), NodeKind::Unary(UnaryOp::ReduceAnd));
    }

    #[test]
    fn increment_becomes_assignment() {
        let mut db = MemDb::new();
        let i = reference(&mut db, "i");
        let inc = op(&mut db, OpType::PostInc, vec![i]);
        let (ast, node, _) = lower(&db, inc);
        let node = node.unwrap();
        assert_eq!(ast.kind(node), NodeKind::AssignEq);
        let [lhs, rhs] = ast.children(node) else { panic!("two children") };
        assert_eq!(ast.name_of(*lhs), "i");
        assert_eq!(ast.kind(*rhs), NodeKind::Binary(BinaryOp::Add));
        assert_ne!(*lhs, ast.children(*rhs)[0]);
    }

    #[test]
    fn inside_becomes_eq_or_chain() {
        let mut db = MemDb::new();
        let v = reference(&mut db, "v");
        let one = int(&mut db, 1);
        let two = int(&mut db, 2);
        let inside = op(&mut db, OpType::Inside, vec![v, one, two]);
        let (ast, node, _) = lower(&db, inside);
        let node = node.unwrap();
        assert_eq!(ast.kind(node), NodeKind::Binary(BinaryOp::LogicOr));
        for &c in ast.children(node) {
            assert_eq!(ast.kind(c), NodeKind::Binary(BinaryOp::Eq));
        }
    }

    #[test]
    fn indexed_part_select_gets_explicit_bounds() {
        let mut db = MemDb::new();
        let base = int(&mut db, 8);
        let width = int(&mut db, 4);
        let sel = db
            .obj(ObjectKind::IndexedPartSelect)
            .name("data")
            .rel(Relation::BaseExpr, base)
            .rel(Relation::WidthExpr, width)
            .int(IntProp::IndexedPartSelectType, PartSelectKind::Neg.code())
            .finish();
        let (ast, node, _) = lower(&db, sel);
        let ident = node.unwrap();
        let range = ast.children(ident)[0];
        let bounds: Vec<Option<i64>> = ast.children(range).iter().map(|&b| ast.const_int(b)).collect();
        assert_eq!(bounds, vec![Some(8), Some(5)]);
    }

    #[test]
    fn hier_path_builds_dot_chain() {
        let mut db = MemDb::new();
        let idx = int(&mut db, 1);
        let s = db.obj(ObjectKind::BitSelect).name("s").rel(Relation::Index, idx).finish();
        let a = reference(&mut db, "a");
        let path = db.obj(ObjectKind::HierPath).rels(Relation::ActualGroup, [s, a]).finish();
        let (ast, node, _) = lower(&db, path);
        let ident = node.unwrap();
        assert_eq!(ast.name_of(ident), "s");
        let dot = ast.find_child_kind(ident, NodeKind::Dot).unwrap();
        assert_eq!(ast.name_of(dot), "a");
        assert!(ast.find_child_kind(ident, NodeKind::Range).is_some());
    }

    #[test]
    fn system_calls() {
        let mut db = MemDb::new();
        let a = reference(&mut db, "a");
        let signed = db.obj(ObjectKind::SysFuncCall).name("$signed").rel(Relation::Arguments, a).finish();
        let display = db.obj(ObjectKind::SysFuncCall).name("$display").finish();
        let plusargs = db.obj(ObjectKind::SysFuncCall).name("$value$plusargs").finish();
        let (ast, node, _) = lower(&db, signed);
        assert_eq!(ast.kind(node.unwrap()), NodeKind::ToSigned);
        let (ast, node, _) = lower(&db, display);
        assert_eq!(ast.kind(node.unwrap()), NodeKind::TCall);
        let (_, node, sink) = lower(&db, plusargs);
        assert_eq!(node, None);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn unknown_operator_is_reported() {
        let mut db = MemDb::new();
        let bad = db.obj(ObjectKind::Operation).int(IntProp::OpType, 999).finish();
        let (_, node, sink) = lower(&db, bad);
        assert_eq!(node, None);
        assert_eq!(sink.take_all()[0].code, errors::W301);
    }
}
