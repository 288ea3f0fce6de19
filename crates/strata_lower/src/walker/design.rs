//! Design-level lowering: units, instances, packages, and generate scopes.
//!
//! Module and interface definitions are read first and only contribute their
//! interface (parameters, typedefs, ports). The elaborated instance tree then
//! fills each entity once: top instances fill the generic entity, nested
//! instances fill the entity their parameterization resolves to. An entity
//! nobody filled stays *partial* and is dropped when the design is assembled.

use strata_ast::{ConstFolder, NodeId, NodeKind, Partial, Simplifier};
use strata_common::StrataResult;
use strata_db::{IntProp, ObjHandle, ObjectKind, Relation};

use super::{def_name, enclosing_unit, lower_object, make_node, obj_name};
use crate::context::LowerCtx;
use crate::errors;
use crate::memories::check_memories;
use crate::merge::add_or_replace_child;
use crate::normalize::normalize_unit;
use crate::specialize::{
    is_undefined, obtain_module, param_scope, param_string, render_value, same_value,
};
use strata_ast::simplify::param_value;

/// What a module or interface definition contributes before any instance is
/// seen.
const DEF_RELS: &[Relation] = &[
    Relation::Parameters,
    Relation::ParamAssigns,
    Relation::Typedefs,
    Relation::Ports,
];

/// The full body of an elaborated module or interface.
const FULL_RELS: &[Relation] = &[
    Relation::Parameters,
    Relation::ParamAssigns,
    Relation::Typedefs,
    Relation::Ports,
    Relation::Nets,
    Relation::ArrayNets,
    Relation::Variables,
    Relation::TaskFuncs,
    Relation::Modports,
    Relation::ContAssigns,
    Relation::Processes,
    Relation::GenScopeArrays,
    Relation::Modules,
    Relation::Interfaces,
];

const PACKAGE_RELS: &[Relation] = &[
    Relation::Parameters,
    Relation::ParamAssigns,
    Relation::Typedefs,
    Relation::Nets,
    Relation::Variables,
    Relation::TaskFuncs,
];

const GEN_RELS: &[Relation] = &[
    Relation::Parameters,
    Relation::ParamAssigns,
    Relation::Typedefs,
    Relation::Nets,
    Relation::ArrayNets,
    Relation::Variables,
    Relation::TaskFuncs,
    Relation::ContAssigns,
    Relation::Processes,
    Relation::GenScopeArrays,
    Relation::Modules,
    Relation::Interfaces,
];

/// Node kinds a fresh specialization keeps from its generic before the
/// instance body is filled in.
const INTERFACE_KINDS: &[NodeKind] = &[
    NodeKind::Parameter,
    NodeKind::Localparam,
    NodeKind::Typedef,
    NodeKind::Enum,
];

/// Lowers the items `rels` lists from `h` into `target`, merging by name.
fn lower_items(ctx: &mut LowerCtx<'_>, h: ObjHandle, target: NodeId, rels: &[Relation]) -> StrataResult<()> {
    for &rel in rels {
        for item in ctx.db.iterate(rel, h) {
            if let Some(node) = lower_object(ctx, item)? {
                add_or_replace_child(&mut ctx.ast, target, node)?;
            }
        }
    }
    Ok(())
}

/// Lowers a whole design and assembles the DESIGN node.
///
/// Packages come first in the output, then every filled unit in the order it
/// was registered.
pub fn process_design(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<NodeId> {
    ctx.frames.push(h, ObjectKind::Design);
    let design = ctx.ast.mk(NodeKind::Design, ctx.loc(h));
    ctx.frames.set_current(design);

    for iface in ctx.db.iterate(Relation::AllInterfaces, h) {
        process_definition(ctx, iface, NodeKind::Interface)?;
    }
    let mut packages = Vec::new();
    for pkg in ctx.db.iterate(Relation::AllPackages, h) {
        packages.extend(lower_object(ctx, pkg)?);
    }
    for module in ctx.db.iterate(Relation::AllModules, h) {
        process_definition(ctx, module, NodeKind::Module)?;
    }
    for top in ctx.db.iterate(Relation::TopModules, h) {
        lower_object(ctx, top)?;
    }
    ctx.frames.pop();

    assemble(ctx, design, &packages)?;
    Ok(design)
}

fn normalize(ctx: &mut LowerCtx<'_>, unit: NodeId, packages: &[NodeId]) -> StrataResult<()> {
    check_memories(&mut ctx.ast, unit);
    let ast = &mut ctx.ast;
    let sink = ctx.sink;
    ctx.scope.in_unit(unit, |scope| {
        for &pkg in packages {
            scope.import_package(ast, pkg);
        }
        normalize_unit(ast, scope, sink, unit)
    })
}

fn assemble(ctx: &mut LowerCtx<'_>, design: NodeId, packages: &[NodeId]) -> StrataResult<()> {
    for &pkg in packages {
        normalize(ctx, pkg, packages)?;
        ctx.ast.push_child(design, pkg);
    }
    let units: Vec<NodeId> = ctx.registry.iter().map(|(_, unit)| unit).collect();
    for unit in units {
        if ctx.ast.node(unit).attrs.partial.is_some() {
            let name = ctx.ast.name_of(unit).to_string();
            ctx.emit(errors::removing_unused_module(&name));
            continue;
        }
        normalize(ctx, unit, packages)?;
        ctx.ast.push_child(design, unit);
    }
    Ok(())
}

/// Registers a module or interface definition, or adds its interface to an
/// entity already registered under the same name.
fn process_definition(ctx: &mut LowerCtx<'_>, h: ObjHandle, kind: NodeKind) -> StrataResult<()> {
    ctx.frames.push(h, ctx.db.kind(h));
    let name = def_name(ctx, h);
    let ident = ctx.ast.intern(&name);
    let unit = match ctx.registry.get(ident) {
        Some(existing) => existing,
        None => {
            let unit = ctx.ast.mk_named(kind, &name, ctx.loc(h));
            ctx.ast.node_mut(unit).attrs.partial = Some(Partial::Unfilled);
            ctx.registry.insert(ident, unit);
            unit
        }
    };
    ctx.frames.set_current(unit);
    ctx.reset_port_ids();
    let result = lower_items(ctx, h, unit, DEF_RELS);
    ctx.frames.pop();
    result
}

/// Lowers a module or interface instance.
///
/// A top-level instance fills its generic entity and produces no node. A
/// nested instance produces a CELL and fills the entity it resolves to if
/// that entity is still waiting for a body.
pub fn process_unit(ctx: &mut LowerCtx<'_>, h: ObjHandle, kind: NodeKind) -> StrataResult<Option<NodeId>> {
    if enclosing_unit(ctx).is_none() {
        fill_top(ctx, h, kind)?;
        return Ok(None);
    }
    instantiate(ctx, h).map(Some)
}

fn fill_top(ctx: &mut LowerCtx<'_>, h: ObjHandle, kind: NodeKind) -> StrataResult<()> {
    let name = def_name(ctx, h);
    let ident = ctx.ast.intern(&name);
    let unit = match ctx.registry.get(ident) {
        Some(unit) => unit,
        None => {
            let unit = ctx.ast.mk_named(kind, &name, ctx.loc(h));
            ctx.registry.insert(ident, unit);
            unit
        }
    };
    fill_body(ctx, h, unit)
}

fn fill_body(ctx: &mut LowerCtx<'_>, h: ObjHandle, unit: NodeId) -> StrataResult<()> {
    ctx.frames.set_current(unit);
    ctx.reset_port_ids();
    lower_items(ctx, h, unit, FULL_RELS)?;
    ctx.ast.node_mut(unit).attrs.partial = None;
    Ok(())
}

/// One parameter assignment of an instance.
struct Override {
    name: String,
    value: NodeId,
    local: bool,
    /// Differs from the generic's default, or the generic has none.
    differs: bool,
}

/// Collects the instance's parameter assignments against the generic
/// `generic`, folding each value in the generic's parameter scope.
fn overrides(ctx: &mut LowerCtx<'_>, h: ObjHandle, generic: Option<NodeId>) -> StrataResult<Vec<Override>> {
    let scope = generic.map(|g| param_scope(&ctx.ast, g)).unwrap_or_default();
    let mut out = Vec::new();
    for pa in ctx.db.iterate(Relation::ParamAssigns, h) {
        let Some(lhs) = ctx.db.resolve(Relation::Lhs, pa) else {
            continue;
        };
        let name = obj_name(ctx, lhs);
        let Some(value) = ctx.db.resolve(Relation::Rhs, pa) else {
            continue;
        };
        let Some(value) = lower_object(ctx, value)? else {
            continue;
        };
        let value = ConstFolder.simplify(&mut ctx.ast, value, &scope);
        let default = scope
            .get(&ctx.ast.intern(&name))
            .and_then(|&decl| param_value(&ctx.ast, decl));
        let differs = match default {
            Some(d) => !same_value(&ctx.ast, d, value),
            None => true,
        };
        out.push(Override {
            name,
            value,
            local: ctx.db.flag(IntProp::LocalParam, lhs),
            differs,
        });
    }
    Ok(out)
}

/// Reduces a fresh specialization to its generic's interface and applies the
/// instance's values.
fn prepare_specialization(ctx: &mut LowerCtx<'_>, module: NodeId, params: &[Override]) {
    let kept: Vec<NodeId> = ctx
        .ast
        .children(module)
        .iter()
        .copied()
        .filter(|&c| INTERFACE_KINDS.contains(&ctx.ast.kind(c)))
        .collect();
    ctx.ast.node_mut(module).children = kept;
    ctx.ast.node_mut(module).attrs.partial = Some(Partial::Unfilled);

    for p in params.iter().filter(|p| p.differs) {
        let ident = ctx.ast.intern(&p.name);
        let Some(decl) = ctx.ast.find_child_named(module, ident) else {
            continue;
        };
        if !ctx.ast.kind(decl).is_param() {
            continue;
        }
        let value = ctx.ast.clone_subtree(p.value);
        match param_value(&ctx.ast, decl) {
            Some(old) => {
                ctx.ast.replace_child(decl, old, value);
            }
            None => ctx.ast.push_child(decl, value),
        }
    }
}

fn instantiate(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<NodeId> {
    let loc = ctx.loc(h);
    let cell = make_node(ctx, NodeKind::Cell, h);
    let type_name = def_name(ctx, h);
    let generic = ctx
        .registry
        .get(ctx.ast.intern(&type_name))
        .filter(|&g| !is_undefined(&ctx.ast, g));
    let cell_instance = ctx.db.flag(IntProp::CellInstance, h);
    let blackbox = generic.is_none() || cell_instance;

    let params = overrides(ctx, h, generic)?;
    let pairs: Vec<(String, String)> = params
        .iter()
        .filter(|p| p.differs && !p.local)
        .map(|p| (p.name.clone(), render_value(&ctx.ast, p.value)))
        .collect();
    let param_str = if blackbox { String::new() } else { param_string(&pairs) };

    let before = ctx.registry.len();
    let module = obtain_module(
        &mut ctx.ast,
        &mut ctx.registry,
        &type_name,
        &param_str,
        ctx.config.paramod_name_limit,
    );
    let fresh = ctx.registry.len() > before;
    if fresh && !param_str.is_empty() {
        prepare_specialization(ctx, module, &params);
    }

    let undefined = is_undefined(&ctx.ast, module);
    {
        let attrs = &mut ctx.ast.node_mut(module).attrs;
        attrs.keep = true;
        attrs.whitebox |= cell_instance || undefined;
    }
    if !undefined && ctx.ast.node(module).attrs.partial == Some(Partial::Unfilled) {
        fill_body(ctx, h, module)?;
    }
    ctx.frames.set_current(cell);

    let module_name = ctx.ast.node(module).name;
    let cell_type = ctx.ast.mk(NodeKind::CellType, loc);
    ctx.ast.node_mut(cell_type).name = module_name;
    ctx.ast.push_child(cell, cell_type);

    if blackbox {
        for p in params.iter().filter(|p| p.differs) {
            let set = ctx.ast.mk_named(NodeKind::Paraset, &p.name, loc);
            ctx.ast.push_child(set, p.value);
            ctx.ast.push_child(cell, set);
        }
    }
    for port in ctx.db.iterate(Relation::Ports, h) {
        let arg = connect_port(ctx, port)?;
        ctx.ast.push_child(cell, arg);
    }
    Ok(cell)
}

/// Builds the ARGUMENT for one port of an instance from its outside
/// connection.
fn connect_port(ctx: &mut LowerCtx<'_>, port: ObjHandle) -> StrataResult<NodeId> {
    let loc = ctx.loc(port);
    let arg = ctx.ast.mk_named(NodeKind::Argument, &obj_name(ctx, port), loc);
    let Some(high) = ctx.db.resolve(Relation::HighConn, port) else {
        return Ok(arg);
    };
    let kind = ctx.db.kind(high);
    let value = match kind {
        k if k.is_net() || k.is_variable() || matches!(k, ObjectKind::Interface | ObjectKind::Modport) => {
            Some(ctx.ast.mk_ident(&obj_name(ctx, high), ctx.loc(high)))
        }
        ObjectKind::RefObj
        | ObjectKind::RefVar
        | ObjectKind::Operation
        | ObjectKind::Constant
        | ObjectKind::BitSelect
        | ObjectKind::PartSelect
        | ObjectKind::IndexedPartSelect
        | ObjectKind::VarSelect
        | ObjectKind::HierPath
        | ObjectKind::SysFuncCall
        | ObjectKind::FuncCall => lower_object(ctx, high)?,
        _ => {
            ctx.emit(errors::unhandled_port_connection(kind, ctx.loc(high), ctx.config.stop_on_error));
            None
        }
    };
    if let Some(v) = value {
        ctx.ast.push_child(arg, v);
    }
    Ok(arg)
}

/// Lowers a package into a PACKAGE unit.
pub fn process_package(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let pkg = make_node(ctx, NodeKind::Package, h);
    lower_items(ctx, h, pkg, PACKAGE_RELS)?;
    Ok(Some(pkg))
}

/// Lowers a modport and its io declarations.
pub fn process_modport(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let modport = make_node(ctx, NodeKind::Modport, h);
    for io in ctx.db.iterate(Relation::IoDecls, h) {
        if let Some(member) = lower_object(ctx, io)? {
            ctx.ast.push_child(modport, member);
        }
    }
    Ok(Some(modport))
}

/// Lowers one generate scope into a GENBLOCK.
pub fn process_gen_scope(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let block = make_node(ctx, NodeKind::GenBlock, h);
    lower_items(ctx, h, block, GEN_RELS)?;
    rewrite_prefixes(ctx, block);
    Ok(Some(block))
}

/// Lowers the scopes of a generate array into the enclosing unit.
pub fn process_gen_scope_array(ctx: &mut LowerCtx<'_>, h: ObjHandle) -> StrataResult<Option<NodeId>> {
    let Some(unit) = enclosing_unit(ctx) else {
        ctx.report_unhandled(h);
        return Ok(None);
    };
    for scope in ctx.db.iterate(Relation::GenScopes, h) {
        if let Some(block) = lower_object(ctx, scope)? {
            add_or_replace_child(&mut ctx.ast, unit, block)?;
        }
    }
    Ok(None)
}

/// Turns every `name[p].rest` reference inside `block`, where `p` is a
/// parameter of the block, into PREFIX(`name`; `p`, `rest`).
fn rewrite_prefixes(ctx: &mut LowerCtx<'_>, block: NodeId) {
    let params: Vec<String> = ctx
        .ast
        .children(block)
        .iter()
        .filter(|&&c| ctx.ast.kind(c).is_param())
        .map(|&c| ctx.ast.name_of(c).to_string())
        .collect();
    for param in params {
        let needle = format!("[{param}]");
        for node in ctx.ast.descendants(block) {
            let name = ctx.ast.name_of(node).to_string();
            let Some(start) = name.find(&needle) else {
                continue;
            };
            let loc = ctx.ast.node(node).loc;
            let base = &name[..name.find('[').unwrap_or(start)];
            let p = ctx.ast.mk_ident(&param, loc);
            let old = std::mem::take(&mut ctx.ast.node_mut(node).children);
            let children = match name.rfind(']').and_then(|b| name.get(b + 2..)).filter(|r| !r.is_empty()) {
                Some(rest) => {
                    let field = ctx.ast.mk_with(NodeKind::Identifier, loc, old);
                    ctx.ast.node_mut(field).name = ctx.ast.intern(rest);
                    vec![p, field]
                }
                None => std::iter::once(p).chain(old).collect(),
            };
            let base = ctx.ast.intern(base);
            let n = ctx.ast.node_mut(node);
            n.kind = NodeKind::Prefix;
            n.name = base;
            n.children = children;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::LowerConfig;
    use strata_db::{Direction, MemDb, StrProp, Value};
    use strata_diagnostics::DiagnosticSink;

    fn int(db: &mut MemDb, v: i64) -> ObjHandle {
        db.obj(ObjectKind::Constant).value(Value::Int(v)).finish()
    }

    fn param(db: &mut MemDb, name: &str, v: i64) -> ObjHandle {
        let value = int(db, v);
        db.obj(ObjectKind::Parameter).name(name).rel(Relation::Expr, value).finish()
    }

    fn assign_param(db: &mut MemDb, name: &str, v: i64) -> ObjHandle {
        let lhs = db.obj(ObjectKind::Parameter).name(name).finish();
        let rhs = int(db, v);
        db.obj(ObjectKind::ParamAssign)
            .rel(Relation::Lhs, lhs)
            .rel(Relation::Rhs, rhs)
            .finish()
    }

    fn instance_with(db: &mut MemDb, name: &str, def: &str, w: Option<i64>) -> ObjHandle {
        let pa = w.map(|w| assign_param(db, "W", w));
        let b = db.obj(ObjectKind::Module).name(name).str(StrProp::DefName, def);
        match pa {
            Some(pa) => b.rel(Relation::ParamAssigns, pa).finish(),
            None => b.finish(),
        }
    }

    fn lower(db: &MemDb, design: ObjHandle) -> (strata_ast::Ast, NodeId, DiagnosticSink) {
        let config = LowerConfig::default();
        let sink = DiagnosticSink::new();
        let (ast, root) = {
            let mut ctx = LowerCtx::new(db, &config, &sink);
            let root = process_design(&mut ctx, design).unwrap();
            (ctx.ast, root)
        };
        (ast, root, sink)
    }

    fn unit_names(ast: &strata_ast::Ast, root: NodeId) -> Vec<String> {
        ast.children(root).iter().map(|&c| ast.name_of(c).to_string()).collect()
    }

    #[test]
    fn specializations_are_shared() {
        let mut db = MemDb::new();
        let w = param(&mut db, "W", 4);
        let generic = db.obj(ObjectKind::Module).name("work@M").rel(Relation::Parameters, w).finish();
        let u1 = instance_with(&mut db, "u1", "work@M", Some(8));
        let u2 = instance_with(&mut db, "u2", "work@M", Some(8));
        let u3 = instance_with(&mut db, "u3", "work@M", Some(16));
        let top = db
            .obj(ObjectKind::Module)
            .name("work@top")
            .rels(Relation::Modules, [u1, u2, u3])
            .finish();
        let top_def = db.obj(ObjectKind::Module).name("work@top").finish();
        let design = db
            .obj(ObjectKind::Design)
            .rels(Relation::AllModules, [generic, top_def])
            .rel(Relation::TopModules, top)
            .finish();
        let (ast, root, sink) = lower(&db, design);
        let names = unit_names(&ast, root);
        assert!(names.contains(&"top".to_string()));
        assert!(names.contains(&"$paramod\\M\\W=32'd8".to_string()));
        assert!(names.contains(&"$paramod\\M\\W=32'd16".to_string()));
        // the generic was never filled by an instance of its own
        assert!(!names.contains(&"M".to_string()));
        let removed: Vec<_> = sink.take_all().into_iter().filter(|d| d.code == errors::W302).collect();
        assert_eq!(removed.len(), 1);

        let top = ast.children(root).iter().copied().find(|&c| ast.name_of(c) == "top").unwrap();
        let cells: Vec<_> = ast
            .children(top)
            .iter()
            .copied()
            .filter(|&c| ast.kind(c) == NodeKind::Cell)
            .collect();
        assert_eq!(cells.len(), 3);
        let types: Vec<_> = cells.iter().map(|&c| ast.name_of(ast.children(c)[0]).to_string()).collect();
        assert_eq!(types[0], types[1]);
        assert_ne!(types[0], types[2]);
    }

    #[test]
    fn unknown_module_is_a_blackbox_with_overrides() {
        let mut db = MemDb::new();
        let u = instance_with(&mut db, "u", "work@ext", Some(3));
        let top = db.obj(ObjectKind::Module).name("work@top").rel(Relation::Modules, u).finish();
        let design = db.obj(ObjectKind::Design).rel(Relation::TopModules, top).finish();
        let (ast, root, sink) = lower(&db, design);
        // the placeholder only stands in for the cell type
        assert_eq!(unit_names(&ast, root), vec!["top".to_string()]);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, errors::W302);
        assert!(diags[0].message.contains("ext"));
        let top = ast.children(root)[0];
        let cell = ast.children(top)[0];
        assert_eq!(ast.name_of(ast.children(cell)[0]), "ext");
        let kinds: Vec<_> = ast.children(cell).iter().map(|&c| ast.kind(c)).collect();
        assert_eq!(kinds, vec![NodeKind::CellType, NodeKind::Paraset]);
    }

    #[test]
    fn ports_connect_by_name() {
        let mut db = MemDb::new();
        let d_def = db
            .obj(ObjectKind::Port)
            .name("d")
            .int(IntProp::Direction, Direction::Input.code())
            .finish();
        let child_def = db.obj(ObjectKind::Module).name("work@child").rel(Relation::Ports, d_def).finish();
        let sig = db.obj(ObjectKind::Net).name("sig").finish();
        let d_inst = db
            .obj(ObjectKind::Port)
            .name("d")
            .int(IntProp::Direction, Direction::Input.code())
            .rel(Relation::HighConn, sig)
            .finish();
        let u = db
            .obj(ObjectKind::Module)
            .name("u")
            .str(StrProp::DefName, "work@child")
            .rel(Relation::Ports, d_inst)
            .finish();
        let top = db
            .obj(ObjectKind::Module)
            .name("work@top")
            .rel(Relation::Nets, sig)
            .rel(Relation::Modules, u)
            .finish();
        let design = db
            .obj(ObjectKind::Design)
            .rel(Relation::AllModules, child_def)
            .rel(Relation::TopModules, top)
            .finish();
        let (ast, root, sink) = lower(&db, design);
        assert!(sink.diagnostics().is_empty());
        let names = unit_names(&ast, root);
        assert_eq!(names, vec!["child".to_string(), "top".to_string()]);
        let child = ast.children(root)[0];
        assert!(ast.node(child).attrs.keep);
        let top = ast.children(root)[1];
        let cell = ast.find_child_kind(top, NodeKind::Cell).unwrap();
        let arg = ast.children(cell)[1];
        assert_eq!(ast.kind(arg), NodeKind::Argument);
        assert_eq!(ast.name_of(arg), "d");
        assert_eq!(ast.name_of(ast.children(arg)[0]), "sig");
    }

    #[test]
    fn packages_come_first() {
        let mut db = MemDb::new();
        let p = param(&mut db, "WIDTH", 8);
        let pkg = db.obj(ObjectKind::Package).name("work@cfg").rel(Relation::Parameters, p).finish();
        let top = db.obj(ObjectKind::Module).name("work@top").finish();
        let design = db
            .obj(ObjectKind::Design)
            .rel(Relation::AllPackages, pkg)
            .rel(Relation::TopModules, top)
            .finish();
        let (ast, root, _) = lower(&db, design);
        assert_eq!(ast.kind(ast.children(root)[0]), NodeKind::Package);
        assert_eq!(unit_names(&ast, root), vec!["cfg".to_string(), "top".to_string()]);
    }

    #[test]
    fn gen_scope_references_become_prefixes() {
        let mut db = MemDb::new();
        let i = param(&mut db, "i", 0);
        let rhs = db.obj(ObjectKind::RefObj).name("blk[i].q").finish();
        let lhs = db.obj(ObjectKind::RefObj).name("y").finish();
        let assign = db
            .obj(ObjectKind::ContAssign)
            .rel(Relation::Lhs, lhs)
            .rel(Relation::Rhs, rhs)
            .finish();
        let scope = db
            .obj(ObjectKind::GenScope)
            .name("blk[0]")
            .rel(Relation::Parameters, i)
            .rel(Relation::ContAssigns, assign)
            .finish();
        let array = db.obj(ObjectKind::GenScopeArray).name("blk").rel(Relation::GenScopes, scope).finish();
        let top = db.obj(ObjectKind::Module).name("work@top").rel(Relation::GenScopeArrays, array).finish();
        let design = db.obj(ObjectKind::Design).rel(Relation::TopModules, top).finish();
        let (ast, root, _) = lower(&db, design);
        let top = ast.children(root)[0];
        let block = ast.find_child_kind(top, NodeKind::GenBlock).unwrap();
        let assign = ast.find_child_kind(block, NodeKind::Assign).unwrap();
        let prefix = ast.children(assign)[1];
        assert_eq!(ast.kind(prefix), NodeKind::Prefix);
        assert_eq!(ast.name_of(prefix), "blk");
        let parts: Vec<_> = ast.children(prefix).iter().map(|&c| ast.name_of(c).to_string()).collect();
        assert_eq!(parts, vec!["i".to_string(), "q".to_string()]);
    }
}
