//! Declaration lowering: ports, nets, variables, and parameters.
//!
//! Ranges land in [`DeclInfo`](strata_ast::DeclInfo) rather than as children;
//! the flattener decides later whether they stay as written or collapse into a
//! single vector.

use strata_ast::{NodeId, NodeKind};
use strata_common::StrataResult;
use strata_db::{Direction, IntProp, NetType, ObjHandle, ObjectKind, Relation, Value};

use super::expr::const_from_value;
use super::typespec::{apply_typespec, lower_ranges};
use super::{def_name, lower_rel, make_node, obj_name};
use crate::context::LowerCtx;
use crate::merge::place_default_assign;

/// Frames that decide where a variable's default value goes.
const DEFAULT_SCOPES: &[NodeKind] = &[
    NodeKind::Module,
    NodeKind::Interface,
    NodeKind::GenBlock,
    NodeKind::Function,
    NodeKind::Task,
    NodeKind::Block,
    NodeKind::For,
    NodeKind::Always,
    NodeKind::Initial,
];

fn set_direction(ctx: &mut LowerCtx<'_>, node: NodeId, h: ObjHandle) {
    let dir = ctx.db.get_int(IntProp::Direction, h).and_then(Direction::from_code);
    let flags = &mut ctx.ast.node_mut(node).flags;
    match dir {
        Some(Direction::Input) => flags.is_input = true,
        Some(Direction::Output) => flags.is_output = true,
        Some(Direction::Inout) => {
            flags.is_input = true;
            flags.is_output = true;
        }
        _ => {}
    }
}

fn set_fixed_width(ctx: &mut LowerCtx<'_>, node: NodeId, width: i64, signed: bool, h: ObjHandle) {
    let range = ctx.ast.mk_range(width - 1, 0, ctx.loc(h));
    let n = ctx.ast.node_mut(node);
    n.decl.packed.push(range);
    n.flags.is_signed |= signed;
}

/// The object a reference stands for, or the object itself.
fn actual_of(ctx: &LowerCtx<'_>, h: ObjHandle) -> ObjHandle {
    match ctx.db.kind(h) {
        ObjectKind::RefObj | ObjectKind::RefVar => ctx.db.resolve(Relation::Actual, h).unwrap_or(h),
        _ => h,
    }
}

/// Applies the type of declaration object `h` to `node`: its typespec when
/// present, otherwise the ranges the object carries itself.
pub fn apply_object_type(ctx: &mut LowerCtx<'_>, node: NodeId, h: ObjHandle) -> StrataResult<()> {
    if ctx.db.flag(IntProp::Signed, h) {
        ctx.ast.node_mut(node).flags.is_signed = true;
    }
    if let Some(ts) = ctx.db.resolve(Relation::Typespec, h) {
        return apply_typespec(ctx, node, ts, "declaration");
    }
    match ctx.db.kind(h) {
        ObjectKind::ArrayNet | ObjectKind::ArrayVar => {
            let outer = lower_ranges(ctx, Relation::UnpackedRanges, h)?;
            ctx.ast.node_mut(node).decl.unpacked.extend(outer);
            let elem_rel = if ctx.db.kind(h) == ObjectKind::ArrayNet {
                Relation::Nets
            } else {
                Relation::Regs
            };
            if let Some(elem) = ctx.db.iterate(elem_rel, h).first().copied() {
                apply_object_type(ctx, node, elem)?;
            }
        }
        ObjectKind::PackedArrayNet | ObjectKind::PackedArrayVar => {
            let outer = lower_ranges(ctx, Relation::Ranges, h)?;
            ctx.ast.node_mut(node).decl.packed.extend(outer);
            if let Some(elem) = ctx.db.iterate(Relation::Elements, h).first().copied() {
                apply_object_type(ctx, node, elem)?;
            }
        }
        _ => {
            let ranges = lower_ranges(ctx, Relation::Ranges, h)?;
            ctx.ast.node_mut(node).decl.packed.extend(ranges);
        }
    }
    Ok(())
}

/// Lowers a module or interface port.
///
/// Ports bound to an interface or modport become INTERFACEPORT; everything
/// else becomes a WIRE with a direction and a port id.
pub fn process_port(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let actual = ctx.db.resolve(Relation::LowConn, h).map(|l| actual_of(ctx, l));
    if let Some(a) = actual {
        let iface = match ctx.db.kind(a) {
            ObjectKind::Interface => Some(def_name(ctx, a)),
            ObjectKind::Modport => {
                let owner = ctx
                    .db
                    .resolve(Relation::Parent, a)
                    .map(|p| def_name(ctx, p))
                    .unwrap_or_default();
                Some(format!("{owner}.{}", obj_name(ctx, a)))
            }
            _ => None,
        };
        if let Some(type_name) = iface {
            let port = make_node(ctx, NodeKind::InterfacePort, h);
            let ty = ctx.ast.mk_named(NodeKind::InterfacePortType, &type_name, ctx.loc(h));
            ctx.ast.push_child(port, ty);
            return Ok(Some(port));
        }
    }

    let wire = make_node(ctx, NodeKind::Wire, h);
    set_direction(ctx, wire, h);
    let id = ctx.alloc_port_id();
    ctx.ast.node_mut(wire).port_id = id;
    match (ctx.db.resolve(Relation::Typespec, h), actual) {
        (Some(ts), _) => apply_typespec(ctx, wire, ts, "port")?,
        (None, Some(a)) if ctx.db.kind(a).is_net() || ctx.db.kind(a).is_variable() => {
            apply_object_type(ctx, wire, a)?
        }
        _ => {}
    }
    if actual.is_some_and(|a| ctx.db.kind(a).is_variable()) {
        ctx.ast.node_mut(wire).flags.is_reg = true;
    }
    Ok(Some(wire))
}

/// Lowers a modport member or a task/function argument.
pub fn process_io_decl(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let in_modport = ctx.frames.find_ancestor(&ctx.ast, &[NodeKind::Modport]).is_some();
    let kind = if in_modport {
        NodeKind::ModportMember
    } else {
        NodeKind::Wire
    };
    let node = make_node(ctx, kind, h);
    set_direction(ctx, node, h);
    if !in_modport {
        apply_object_type(ctx, node, h)?;
    }
    Ok(Some(node))
}

/// Lowers a net declaration.
pub fn process_net(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let wire = make_node(ctx, NodeKind::Wire, h);
    if ctx.db.get_int(IntProp::NetType, h).and_then(NetType::from_code) == Some(NetType::Reg) {
        ctx.ast.node_mut(wire).flags.is_reg = true;
    }
    apply_object_type(ctx, wire, h)?;
    Ok(Some(wire))
}

/// Lowers a variable declaration.
///
/// Built-in integer types get their fixed widths. A default value is
/// assigned in the unit's INITIAL block when the variable is declared at unit
/// level; locals are handled by [`local_default`].
pub fn process_variable(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let wire = make_node(ctx, NodeKind::Wire, h);
    ctx.ast.node_mut(wire).flags.is_reg = true;
    match ctx.db.kind(h) {
        ObjectKind::IntVar | ObjectKind::IntegerVar => set_fixed_width(ctx, wire, 32, true, h),
        ObjectKind::ShortIntVar => set_fixed_width(ctx, wire, 16, true, h),
        ObjectKind::LongIntVar => set_fixed_width(ctx, wire, 64, true, h),
        ObjectKind::ByteVar => set_fixed_width(ctx, wire, 8, true, h),
        ObjectKind::RealVar => set_fixed_width(ctx, wire, 64, true, h),
        ObjectKind::StringVar => {
            ctx.ast.node_mut(wire).flags.is_string = true;
            let init_len = ctx
                .db
                .resolve(Relation::Expr, h)
                .and_then(|e| match ctx.db.get_value(e) {
                    Some(Value::Str(s)) if !s.is_empty() => Some(s.len() as i64),
                    _ => None,
                });
            match init_len {
                Some(len) => set_fixed_width(ctx, wire, 8 * len, false, h),
                None => set_fixed_width(ctx, wire, 65, false, h),
            }
        }
        kind => {
            if kind == ObjectKind::LogicVar {
                ctx.ast.node_mut(wire).flags.is_logic = true;
            }
            apply_object_type(ctx, wire, h)?;
        }
    }
    if ctx.db.flag(IntProp::Signed, h) {
        ctx.ast.node_mut(wire).flags.is_signed = true;
    }

    let unit = ctx
        .frames
        .find_ancestor(&ctx.ast, DEFAULT_SCOPES)
        .filter(|&n| matches!(ctx.ast.kind(n), NodeKind::Module | NodeKind::Interface | NodeKind::GenBlock));
    if let Some(unit) = unit {
        if let Some(expr) = lower_rel(ctx, Relation::Expr, h)? {
            let name = ctx.ast.node(wire).name;
            let loc = ctx.loc(h);
            place_default_assign(&mut ctx.ast, unit, name, expr, loc)?;
        }
    }
    Ok(Some(wire))
}

/// The initializing assignment of a variable declared inside a block,
/// function, or task.
pub fn local_default(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    if !ctx.db.kind(h).is_variable() {
        return Ok(None);
    }
    let Some(expr) = lower_rel(ctx, Relation::Expr, h)? else {
        return Ok(None);
    };
    let loc = ctx.loc(h);
    let target = ctx.ast.mk_ident(&obj_name(ctx, h), loc);
    Ok(Some(ctx.ast.mk_with(NodeKind::AssignEq, loc, vec![target, expr])))
}

fn param_kind(ctx: &LowerCtx<'_>, h: ObjHandle) -> NodeKind {
    if ctx.db.flag(IntProp::LocalParam, h) {
        NodeKind::Localparam
    } else {
        NodeKind::Parameter
    }
}

fn param_value(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    if let Some(value) = ctx.db.get_value(h).cloned() {
        if let Some(c) = const_from_value(ctx, &value, h) {
            return Ok(Some(c));
        }
    }
    lower_rel(ctx, Relation::Expr, h)
}

/// Lowers a parameter declaration with its default value.
pub fn process_parameter(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let kind = param_kind(ctx, h);
    let node = make_node(ctx, kind, h);
    if let Some(ts) = ctx.db.resolve(Relation::Typespec, h) {
        apply_typespec(ctx, node, ts, "parameter")?;
    }
    if let Some(value) = param_value(ctx, h)? {
        ctx.ast.push_child(node, value);
    }
    Ok(Some(node))
}

/// Lowers a parameter assignment into the parameter it assigns.
pub fn process_param_assign(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let Some(lhs) = ctx.db.resolve(Relation::Lhs, h) else {
        ctx.report_unhandled(h);
        return Ok(None);
    };
    let kind = param_kind(ctx, lhs);
    let name = obj_name(ctx, lhs);
    let node = ctx.ast.mk_named(kind, &name, ctx.loc(h));
    ctx.frames.set_current(node);
    if let Some(ts) = ctx.db.resolve(Relation::Typespec, lhs) {
        apply_typespec(ctx, node, ts, "parameter")?;
    }
    match lower_rel(ctx, Relation::Rhs, h)? {
        Some(value) => ctx.ast.push_child(node, value),
        None => {
            if let Some(value) = param_value(ctx, lhs)? {
                ctx.ast.push_child(node, value);
            }
        }
    }
    Ok(Some(node))
}
