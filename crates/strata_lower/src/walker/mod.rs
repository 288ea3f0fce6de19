//! The recursive lowering walk.
//!
//! [`lower_object`] dispatches on the closed [`ObjectKind`] set. Every call
//! pushes a frame for the object it visits and records the node it creates in
//! that frame, so nested calls can find their enclosing always block,
//! function, or unit without threading parents through every signature.
//!
//! Lowering functions return `Ok(None)` when an object deliberately produces
//! nothing; unsupported objects are reported to the sink and also yield
//! `None`.

pub mod decl;
pub mod design;
pub mod expr;
pub mod pattern;
pub mod stmt;
pub mod stream;
pub mod typespec;

use strata_ast::{NodeId, NodeKind};
use strata_common::StrataResult;
use strata_db::{ObjHandle, ObjectKind, Relation, StrProp};

use crate::context::LowerCtx;
use crate::errors;

/// Node kinds that own declarations and statements at unit level.
pub(crate) const UNIT_KINDS: &[NodeKind] = &[
    NodeKind::Module,
    NodeKind::Interface,
    NodeKind::Package,
    NodeKind::GenBlock,
];

/// Lowers one design object and everything below it.
pub fn lower_object(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let kind = ctx.db.kind(h);
    if ctx.config.debug {
        let name = obj_name(ctx, h);
        ctx.emit(errors::trace_object(&name, kind, ctx.frames.depth(), ctx.loc(h)));
    }
    ctx.frames.push(h, kind);
    let result = dispatch(ctx, h, kind);
    ctx.frames.pop();
    result
}

fn dispatch(ctx: &mut LowerCtx<'_>, h: ObjHandle, kind: ObjectKind) -> StrataResult<Option<NodeId>> {
    match kind {
        ObjectKind::Design | ObjectKind::Program => {
            ctx.report_unhandled(h);
            Ok(None)
        }
        ObjectKind::Module => design::process_unit(ctx, h, NodeKind::Module),
        ObjectKind::Interface => design::process_unit(ctx, h, NodeKind::Interface),
        ObjectKind::Package => design::process_package(ctx, h),
        ObjectKind::Modport => design::process_modport(ctx, h),
        ObjectKind::GenScope => design::process_gen_scope(ctx, h),
        ObjectKind::GenScopeArray => design::process_gen_scope_array(ctx, h),
        // every package is imported into every unit during normalization
        ObjectKind::Import => Ok(None),

        ObjectKind::Port => decl::process_port(ctx, h),
        ObjectKind::IoDecl => decl::process_io_decl(ctx, h),
        ObjectKind::Net
        | ObjectKind::StructNet
        | ObjectKind::EnumNet
        | ObjectKind::ArrayNet
        | ObjectKind::PackedArrayNet => decl::process_net(ctx, h),
        ObjectKind::LogicVar
        | ObjectKind::BitVar
        | ObjectKind::IntVar
        | ObjectKind::IntegerVar
        | ObjectKind::ShortIntVar
        | ObjectKind::LongIntVar
        | ObjectKind::ByteVar
        | ObjectKind::RealVar
        | ObjectKind::StringVar
        | ObjectKind::EnumVar
        | ObjectKind::StructVar
        | ObjectKind::ArrayVar
        | ObjectKind::PackedArrayVar => decl::process_variable(ctx, h),
        ObjectKind::Parameter => decl::process_parameter(ctx, h),
        ObjectKind::ParamAssign => decl::process_param_assign(ctx, h),

        ObjectKind::LogicTypespec
        | ObjectKind::BitTypespec
        | ObjectKind::IntTypespec
        | ObjectKind::IntegerTypespec
        | ObjectKind::RealTypespec
        | ObjectKind::StringTypespec
        | ObjectKind::StructTypespec
        | ObjectKind::UnionTypespec
        | ObjectKind::EnumTypespec
        | ObjectKind::ArrayTypespec
        | ObjectKind::PackedArrayTypespec => typespec::process_typedef(ctx, h),
        ObjectKind::TypespecMember => typespec::process_member(ctx, h),
        ObjectKind::EnumConst => typespec::process_enum_const(ctx, h),
        ObjectKind::Range => expr::process_range(ctx, h),

        ObjectKind::ContAssign => stmt::process_cont_assign(ctx, h),
        ObjectKind::Assignment => stmt::process_assignment(ctx, h),
        ObjectKind::Always => stmt::process_always(ctx, h),
        ObjectKind::Initial => stmt::process_initial(ctx, h),
        ObjectKind::EventControl => stmt::process_event_control(ctx, h),
        ObjectKind::Begin | ObjectKind::NamedBegin => stmt::process_begin(ctx, h),
        ObjectKind::If | ObjectKind::IfElse => stmt::process_if(ctx, h),
        ObjectKind::For => stmt::process_for(ctx, h),
        ObjectKind::Case => stmt::process_case(ctx, h),
        ObjectKind::CaseItem => stmt::process_case_item(ctx, h),
        ObjectKind::Repeat => stmt::process_repeat(ctx, h),
        ObjectKind::Return => stmt::process_return(ctx, h),
        ObjectKind::DelayControl => stmt::process_delay(ctx, h),
        ObjectKind::ImmediateAssert => stmt::process_assert(ctx, h),
        ObjectKind::Function => stmt::process_task_func(ctx, h, NodeKind::Function),
        ObjectKind::Task => stmt::process_task_func(ctx, h, NodeKind::Task),

        ObjectKind::Operation => expr::process_operation(ctx, h),
        ObjectKind::Constant => expr::process_constant(ctx, h),
        ObjectKind::RefObj | ObjectKind::RefVar => expr::process_ref(ctx, h),
        ObjectKind::BitSelect => expr::process_bit_select(ctx, h),
        ObjectKind::PartSelect => expr::process_part_select(ctx, h),
        ObjectKind::IndexedPartSelect => expr::process_indexed_part_select(ctx, h),
        ObjectKind::VarSelect => expr::process_var_select(ctx, h),
        ObjectKind::HierPath => expr::process_hier_path(ctx, h),
        ObjectKind::SysFuncCall => expr::process_sys_func_call(ctx, h),
        ObjectKind::FuncCall => expr::process_call(ctx, h, NodeKind::FCall),
        ObjectKind::TaskCall => expr::process_call(ctx, h, NodeKind::TCall),
        ObjectKind::TaggedPattern => pattern::process_tagged_pattern(ctx, h),
    }
}

/// Lowers the single object `rel` points to from `h`, if any.
pub fn lower_rel(ctx: &mut LowerCtx<'_>, rel: Relation, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    match ctx.db.resolve(rel, h) {
        Some(target) => lower_object(ctx, target),
        None => Ok(None),
    }
}

/// Lowers the object `rel` points to from `h` where one is required.
///
/// Only a missing relation is reported against `h`. A target that yields
/// nothing has already reported itself or was dropped on purpose
/// (`$value$plusargs`, a null operation), so the caller just drops its own
/// node.
pub fn lower_required(ctx: &mut LowerCtx<'_>, rel: Relation, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    match ctx.db.resolve(rel, h) {
        Some(target) => lower_object(ctx, target),
        None => {
            ctx.report_unhandled(h);
            Ok(None)
        }
    }
}

/// Lowers every object `rel` lists from `h`, dropping the ones that produce
/// nothing.
pub fn lower_each(ctx: &mut LowerCtx<'_>, rel: Relation, h: ObjHandle) -> StrataResult<Vec<NodeId>> {
    let mut out = Vec::new();
    for target in ctx.db.iterate(rel, h) {
        if let Some(node) = lower_object(ctx, target)? {
            out.push(node);
        }
    }
    Ok(out)
}

/// Creates a node named after `h` and records it as the current frame's node.
pub fn make_node(ctx: &mut LowerCtx<'_>, kind: NodeKind, h: ObjHandle) -> NodeId {
    let name = obj_name(ctx, h);
    let node = ctx.ast.mk_named(kind, &name, ctx.loc(h));
    ctx.frames.set_current(node);
    node
}

/// Creates an unnamed node and records it as the current frame's node.
pub fn begin_node(ctx: &mut LowerCtx<'_>, kind: NodeKind, h: ObjHandle) -> NodeId {
    let node = ctx.ast.mk(kind, ctx.loc(h));
    ctx.frames.set_current(node);
    node
}

/// The nearest enclosing unit or generate block.
pub fn enclosing_unit(ctx: &LowerCtx<'_>) -> Option<NodeId> {
    ctx.frames.find_ancestor(&ctx.ast, UNIT_KINDS)
}

/// The usable name of a design object.
///
/// Falls back from the local name to the definition name and then to the
/// last component of the full hierarchical name. Library prefixes
/// (`work@`) are removed.
pub fn obj_name(ctx: &LowerCtx<'_>, h: ObjHandle) -> String {
    if let Some(name) = ctx.db.name(h).filter(|n| !n.is_empty()) {
        return sanitize(name).to_string();
    }
    if let Some(def) = ctx.db.get_str(StrProp::DefName, h).filter(|n| !n.is_empty()) {
        return sanitize(def).to_string();
    }
    match ctx.db.get_str(StrProp::FullName, h) {
        Some(full) => {
            let full = sanitize(full);
            full.rsplit('.').next().unwrap_or(full).to_string()
        }
        None => String::new(),
    }
}

/// The definition name of a module or interface object.
pub fn def_name(ctx: &LowerCtx<'_>, h: ObjHandle) -> String {
    match ctx.db.get_str(StrProp::DefName, h).filter(|n| !n.is_empty()) {
        Some(def) => sanitize(def).to_string(),
        None => obj_name(ctx, h),
    }
}

/// Drops a library prefix such as `work@`.
pub fn sanitize(name: &str) -> &str {
    name.rsplit('@').next().unwrap_or(name)
}

/// Drops a package qualifier such as `pkg::`.
pub fn strip_package(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::LowerConfig;
    use strata_db::MemDb;
    use strata_diagnostics::{DiagnosticSink, Severity};

    #[test]
    fn name_helpers() {
        assert_eq!(sanitize("work@top"), "top");
        assert_eq!(sanitize("plain"), "plain");
        assert_eq!(strip_package("pkg::word_t"), "word_t");
        assert_eq!(strip_package("word_t"), "word_t");
    }

    #[test]
    fn names_fall_back_through_properties() {
        let mut db = MemDb::new();
        let named = db.obj(ObjectKind::Module).name("work@top").finish();
        let def = db.obj(ObjectKind::Module).str(StrProp::DefName, "work@M").finish();
        let full = db.obj(ObjectKind::Net).str(StrProp::FullName, "work@top.u1.data").finish();
        let config = LowerConfig::default();
        let sink = DiagnosticSink::new();
        let ctx = LowerCtx::new(&db, &config, &sink);
        assert_eq!(obj_name(&ctx, named), "top");
        assert_eq!(obj_name(&ctx, def), "M");
        assert_eq!(obj_name(&ctx, full), "data");
        assert_eq!(def_name(&ctx, named), "top");
        assert_eq!(def_name(&ctx, def), "M");
    }

    #[test]
    fn frames_are_balanced_and_traced() {
        let mut db = MemDb::new();
        let prog = db.obj(ObjectKind::Program).name("p").finish();
        let config = LowerConfig {
            debug: true,
            ..LowerConfig::default()
        };
        let sink = DiagnosticSink::new();
        let mut ctx = LowerCtx::new(&db, &config, &sink);
        assert_eq!(lower_object(&mut ctx, prog).unwrap(), None);
        assert_eq!(ctx.frames.depth(), 0);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].severity, Severity::Note);
        assert_eq!(diags[0].code, errors::N300);
        assert_eq!(diags[1].code, errors::W300);
    }

    #[test]
    fn imports_produce_nothing_silently() {
        let mut db = MemDb::new();
        let imp = db.obj(ObjectKind::Import).name("pkg").finish();
        let config = LowerConfig::default();
        let sink = DiagnosticSink::new();
        let mut ctx = LowerCtx::new(&db, &config, &sink);
        assert_eq!(lower_object(&mut ctx, imp).unwrap(), None);
        assert!(sink.diagnostics().is_empty());
    }
}
