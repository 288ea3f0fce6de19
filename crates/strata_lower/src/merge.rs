//! Merging lowered children into an existing unit.
//!
//! A unit can receive the same declaration twice: once from a port and once
//! from the net behind it, or once from the generic body and once from an
//! instance. [`add_or_replace_child`] keeps one node per name and carries over
//! what the earlier node knew. Anonymous initial blocks are collapsed into a
//! single INITIAL/BLOCK placed before the first ALWAYS.

use strata_ast::{Ast, NodeId, NodeKind};
use strata_common::{Ident, InternalError, StrataResult};
use strata_source::Loc;

fn is_anonymous_initial(ast: &Ast, id: NodeId) -> bool {
    let node = ast.node(id);
    node.kind == NodeKind::Initial && ast.resolve(node.name).is_empty()
}

fn first_always(ast: &Ast, parent: NodeId) -> Option<usize> {
    ast.children(parent)
        .iter()
        .position(|&c| ast.kind(c) == NodeKind::Always)
}

fn insert_before_always(ast: &mut Ast, parent: NodeId, child: NodeId) {
    match first_always(ast, parent) {
        Some(pos) => ast.insert_child(parent, pos, child),
        None => ast.push_child(parent, child),
    }
}

/// Adds `child` to `parent`, replacing a same-named child if one exists.
pub fn add_or_replace_child(ast: &mut Ast, parent: NodeId, child: NodeId) -> StrataResult<()> {
    let name = ast.node(child).name;
    if !ast.resolve(name).is_empty() {
        if let Some(old) = ast.find_child_named(parent, name) {
            if old != child {
                inherit(ast, old, child);
                ast.replace_child(parent, old, child);
            }
            return Ok(());
        }
    }

    if is_anonymous_initial(ast, child) {
        let existing = ast
            .children(parent)
            .iter()
            .copied()
            .find(|&c| is_anonymous_initial(ast, c));
        match existing {
            Some(initial) => merge_initial(ast, initial, child)?,
            None => insert_before_always(ast, parent, child),
        }
        return Ok(());
    }

    ast.push_child(parent, child);
    Ok(())
}

/// Copies the port role, children, and ranges of `old` onto `new` where `new`
/// lacks them.
fn inherit(ast: &mut Ast, old: NodeId, new: NodeId) {
    let old_node = ast.node(old).clone();
    if old_node.flags.is_input || old_node.flags.is_output {
        let n = ast.node_mut(new);
        n.flags.is_input = old_node.flags.is_input;
        n.flags.is_output = old_node.flags.is_output;
        n.port_id = old_node.port_id;
        if n.kind == NodeKind::Memory {
            n.kind = NodeKind::Wire;
        }
    }

    if !old_node.children.is_empty() && ast.children(new).is_empty() {
        for &c in &old_node.children {
            let copy = ast.clone_subtree(c);
            if ast.kind(copy) == NodeKind::WireType {
                let ty = ast.node(copy).name;
                let n = ast.node_mut(new);
                n.flags.is_custom_type = true;
                n.decl.wiretype.get_or_insert(ty);
            }
            ast.push_child(new, copy);
        }
    }

    if ast.node(new).decl.packed.is_empty() && !old_node.decl.packed.is_empty() {
        let copies: Vec<NodeId> = old_node.decl.packed.iter().map(|&r| ast.clone_subtree(r)).collect();
        ast.node_mut(new).decl.packed = copies;
    }
    if ast.node(new).decl.unpacked.is_empty() && !old_node.decl.unpacked.is_empty() {
        let copies: Vec<NodeId> = old_node.decl.unpacked.iter().map(|&r| ast.clone_subtree(r)).collect();
        ast.node_mut(new).decl.unpacked = copies;
    }
}

fn initial_block(ast: &Ast, initial: NodeId) -> StrataResult<NodeId> {
    match ast.children(initial).first() {
        Some(&b) if ast.kind(b) == NodeKind::Block => Ok(b),
        _ => Err(InternalError::new(
            "anonymous initial block does not start with a statement block",
        )),
    }
}

fn merge_initial(ast: &mut Ast, into: NodeId, from: NodeId) -> StrataResult<()> {
    let block = initial_block(ast, into)?;
    let incoming = ast.children(from).to_vec();
    let Some((&first, rest)) = incoming.split_first() else {
        return Ok(());
    };
    if ast.kind(first) == NodeKind::Block {
        for stmt in ast.children(first).to_vec() {
            ast.push_child(block, stmt);
        }
    } else {
        ast.push_child(block, first);
    }
    for &c in rest {
        ast.push_child(into, c);
    }
    Ok(())
}

/// Places `var = expr` into the single anonymous INITIAL/BLOCK of `module`,
/// creating it before the first ALWAYS if needed.
///
/// The assignment goes before the first blocking assignment already present.
pub fn place_default_assign(ast: &mut Ast, module: NodeId, var: Ident, expr: NodeId, loc: Loc) -> StrataResult<()> {
    let existing = ast
        .children(module)
        .iter()
        .copied()
        .find(|&c| is_anonymous_initial(ast, c));
    let initial = match existing {
        Some(i) => i,
        None => {
            let block = ast.mk(NodeKind::Block, loc);
            let initial = ast.mk_with(NodeKind::Initial, loc, vec![block]);
            insert_before_always(ast, module, initial);
            initial
        }
    };
    let block = initial_block(ast, initial)?;
    let target = ast.mk_ident_id(var, loc);
    let assign = ast.mk_with(NodeKind::AssignEq, loc, vec![target, expr]);
    let pos = ast
        .children(block)
        .iter()
        .position(|&c| ast.kind(c) == NodeKind::AssignEq);
    match pos {
        Some(p) => ast.insert_child(block, p, assign),
        None => ast.push_child(block, assign),
    }
    Ok(())
}
