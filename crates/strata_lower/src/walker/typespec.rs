//! Typespec lowering: typedefs, struct bodies, enums, and the ranges a type
//! contributes to a declaration.

use strata_ast::{NodeId, NodeKind};
use strata_common::StrataResult;
use strata_db::{IntProp, ObjHandle, ObjectKind, Relation};

use super::{enclosing_unit, lower_each, make_node, sanitize, strip_package};
use crate::context::LowerCtx;
use crate::walker::expr::const_from_value;

/// Lowers the ranges `rel` lists from `h`.
pub fn lower_ranges(ctx: &mut LowerCtx<'_>, rel: Relation, h: ObjHandle) -> StrataResult<Vec<NodeId>> {
    lower_each(ctx, rel, h)
}

/// The name a named typespec is referenced by, without library or package
/// qualifiers.
pub fn type_name(ctx: &LowerCtx<'_>, ts: ObjHandle) -> Option<String> {
    ctx.db
        .name(ts)
        .filter(|n| !n.is_empty())
        .map(|n| strip_package(sanitize(n)).to_string())
}

fn int_range(ctx: &mut LowerCtx<'_>, width: i64, h: ObjHandle) -> NodeId {
    ctx.ast.mk_range(width - 1, 0, ctx.loc(h))
}

/// Applies typespec `ts` to the declaration `decl`: ranges, signedness, and
/// user-defined type references.
///
/// Anonymous structs turn `decl` itself into the aggregate; anonymous enums
/// emit an `$enumN` node on the enclosing unit.
pub fn apply_typespec(ctx: &mut LowerCtx<'_>, decl: NodeId, ts: ObjHandle, context: &str) -> StrataResult<()> {
    let kind = ctx.db.kind(ts);
    if ctx.db.flag(IntProp::Signed, ts) {
        ctx.ast.node_mut(decl).flags.is_signed = true;
    }
    match kind {
        ObjectKind::LogicTypespec | ObjectKind::BitTypespec => {
            if kind == ObjectKind::LogicTypespec {
                ctx.ast.node_mut(decl).flags.is_logic = true;
            }
            let ranges = lower_ranges(ctx, Relation::Ranges, ts)?;
            ctx.ast.node_mut(decl).decl.packed.extend(ranges);
        }
        ObjectKind::IntTypespec | ObjectKind::IntegerTypespec => {
            let range = int_range(ctx, 32, ts);
            let node = ctx.ast.node_mut(decl);
            node.decl.packed.push(range);
            node.flags.is_signed = true;
        }
        ObjectKind::StringTypespec => ctx.ast.node_mut(decl).flags.is_string = true,
        ObjectKind::StructTypespec | ObjectKind::UnionTypespec => match type_name(ctx, ts) {
            Some(name) => set_custom_type(ctx, decl, &name),
            None => {
                let aggregate = if kind == ObjectKind::StructTypespec {
                    NodeKind::Struct
                } else {
                    NodeKind::Union
                };
                let members = lower_each(ctx, Relation::Members, ts)?;
                let node = ctx.ast.node_mut(decl);
                node.kind = aggregate;
                node.children.extend(members);
            }
        },
        ObjectKind::EnumTypespec => match type_name(ctx, ts) {
            Some(name) => set_custom_type(ctx, decl, &name),
            None => {
                let (enum_name, ranges) = lower_enum(ctx, ts)?;
                let ident = ctx.ast.intern(&enum_name);
                let node = ctx.ast.node_mut(decl);
                node.decl.packed.extend(ranges);
                node.attrs.enum_type = Some(ident);
            }
        },
        ObjectKind::PackedArrayTypespec => {
            let outer = lower_ranges(ctx, Relation::Ranges, ts)?;
            ctx.ast.node_mut(decl).decl.packed.extend(outer);
            if let Some(elem) = ctx.db.resolve(Relation::ElemTypespec, ts) {
                apply_typespec(ctx, decl, elem, context)?;
            }
        }
        ObjectKind::ArrayTypespec => {
            let outer = lower_ranges(ctx, Relation::Ranges, ts)?;
            ctx.ast.node_mut(decl).decl.unpacked.extend(outer);
            if let Some(elem) = ctx.db.resolve(Relation::ElemTypespec, ts) {
                apply_typespec(ctx, decl, elem, context)?;
            }
        }
        _ => ctx.report_unhandled_typespec(context, ts),
    }
    Ok(())
}

/// Marks `decl` as typed by the user-defined type `name`.
pub fn set_custom_type(ctx: &mut LowerCtx<'_>, decl: NodeId, name: &str) {
    let ident = ctx.ast.intern(name);
    let loc = ctx.ast.node(decl).loc;
    let wt = ctx.ast.mk_named(NodeKind::WireType, name, loc);
    let node = ctx.ast.node_mut(decl);
    node.flags.is_custom_type = true;
    node.decl.wiretype = Some(ident);
    node.children.push(wt);
}

/// Lowers an enum typespec into an `$enumN` node on the enclosing unit.
///
/// Returns the enum name and the ranges of its base type for the declaration
/// that uses it.
pub fn lower_enum(ctx: &mut LowerCtx<'_>, ts: ObjHandle) -> StrataResult<(String, Vec<NodeId>)> {
    let loc = ctx.loc(ts);
    let enum_name = format!("$enum{}", ctx.fresh_enum_id());
    let base = ctx.db.resolve(Relation::ElemTypespec, ts);
    let (base_name, base_ranges) = match base {
        Some(b) if matches!(ctx.db.kind(b), ObjectKind::LogicTypespec | ObjectKind::BitTypespec) => {
            let label = if ctx.db.kind(b) == ObjectKind::LogicTypespec { "logic" } else { "bit" };
            let name = type_name(ctx, b).unwrap_or_else(|| label.to_string());
            (name, lower_ranges(ctx, Relation::Ranges, b)?)
        }
        _ => ("int".to_string(), vec![int_range(ctx, 32, ts)]),
    };

    let base_ident = ctx.ast.intern(&base_name);
    let en = ctx.ast.mk_named(NodeKind::Enum, &enum_name, loc);
    for item in lower_each(ctx, Relation::EnumConsts, ts)? {
        for &r in &base_ranges {
            let copy = ctx.ast.clone_subtree(r);
            ctx.ast.push_child(item, copy);
        }
        ctx.ast.node_mut(item).attrs.enum_base_type = Some(base_ident);
        ctx.ast.push_child(en, item);
    }
    if let Some(unit) = enclosing_unit(ctx) {
        ctx.ast.push_child(unit, en);
    }
    Ok((enum_name, base_ranges))
}

/// Lowers a named typespec into a TYPEDEF node.
pub fn process_typedef(ctx: &mut LowerCtx<'_>, ts: ObjHandle) -> StrataResult<Option<NodeId>> {
    let Some(name) = type_name(ctx, ts) else {
        ctx.report_unhandled_typespec("typedef", ts);
        return Ok(None);
    };
    let loc = ctx.loc(ts);
    let td = ctx.ast.mk_named(NodeKind::Typedef, &name, loc);
    ctx.frames.set_current(td);

    let body = match ctx.db.kind(ts) {
        ObjectKind::StructTypespec | ObjectKind::UnionTypespec => {
            let kind = if ctx.db.kind(ts) == ObjectKind::StructTypespec {
                NodeKind::Struct
            } else {
                NodeKind::Union
            };
            let members = lower_each(ctx, Relation::Members, ts)?;
            ctx.ast.mk_with(kind, loc, members)
        }
        ObjectKind::EnumTypespec => {
            let (enum_name, ranges) = lower_enum(ctx, ts)?;
            let wire = ctx.ast.mk(NodeKind::Wire, loc);
            let ident = ctx.ast.intern(&enum_name);
            let node = ctx.ast.node_mut(wire);
            node.flags.is_reg = true;
            node.decl.packed = ranges;
            node.attrs.enum_type = Some(ident);
            wire
        }
        ObjectKind::LogicTypespec
        | ObjectKind::BitTypespec
        | ObjectKind::IntTypespec
        | ObjectKind::IntegerTypespec
        | ObjectKind::PackedArrayTypespec => {
            let wire = ctx.ast.mk(NodeKind::Wire, loc);
            ctx.ast.node_mut(wire).flags.is_reg = true;
            apply_typespec(ctx, wire, ts, "typedef")?;
            wire
        }
        _ => {
            ctx.report_unhandled_typespec("typedef", ts);
            return Ok(None);
        }
    };
    ctx.ast.push_child(td, body);
    Ok(Some(td))
}

/// Lowers a struct or union member.
pub fn process_member(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let Some(ts) = ctx.db.resolve(Relation::Typespec, h) else {
        let item = make_node(ctx, NodeKind::StructItem, h);
        return Ok(Some(item));
    };
    let kind = ctx.db.kind(ts);
    match kind {
        ObjectKind::StructTypespec | ObjectKind::UnionTypespec => {
            let aggregate = if kind == ObjectKind::StructTypespec {
                NodeKind::Struct
            } else {
                NodeKind::Union
            };
            let node = make_node(ctx, aggregate, h);
            for m in lower_each(ctx, Relation::Members, ts)? {
                ctx.ast.push_child(node, m);
            }
            Ok(Some(node))
        }
        ObjectKind::LogicTypespec
        | ObjectKind::BitTypespec
        | ObjectKind::IntTypespec
        | ObjectKind::IntegerTypespec
        | ObjectKind::PackedArrayTypespec => {
            let item = make_node(ctx, NodeKind::StructItem, h);
            apply_typespec(ctx, item, ts, "struct member")?;
            let ranges = std::mem::take(&mut ctx.ast.node_mut(item).decl.packed);
            ctx.ast.node_mut(item).children.extend(ranges);
            Ok(Some(item))
        }
        ObjectKind::EnumTypespec => {
            let item = make_node(ctx, NodeKind::StructItem, h);
            let (_, ranges) = lower_enum(ctx, ts)?;
            ctx.ast.node_mut(item).children.extend(ranges);
            Ok(Some(item))
        }
        _ => {
            ctx.report_unhandled_typespec("struct member", ts);
            Ok(None)
        }
    }
}

/// Lowers an enum constant into an ENUM_ITEM carrying its value.
pub fn process_enum_const(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let item = make_node(ctx, NodeKind::EnumItem, h);
    let value = ctx.db.get_value(h).cloned();
    if let Some(value) = value {
        if let Some(c) = const_from_value(ctx, &value, h) {
            ctx.ast.push_child(item, c);
        }
    }
    Ok(Some(item))
}

/// The struct typespec of a declaration, if it has one.
pub fn struct_type_of(ctx: &LowerCtx<'_>, h: ObjHandle) -> Option<ObjHandle> {
    let ts = ctx.db.resolve(Relation::Typespec, h)?;
    matches!(ctx.db.kind(ts), ObjectKind::StructTypespec).then_some(ts)
}
