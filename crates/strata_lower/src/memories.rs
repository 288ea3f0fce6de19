//! Memory usage analysis.
//!
//! A declaration with exactly one packed and one unpacked range is normally
//! kept as a two-level memory. When the whole memory is read as a plain
//! identifier it has to be flattened instead; a `$readmemh` target must stay a
//! memory whatever else happens.

use std::collections::HashMap;

use strata_ast::{Ast, NodeId, NodeKind};
use strata_common::Ident;

/// Sets `force_convert` on the memory-shaped declarations under `unit`.
pub fn check_memories(ast: &mut Ast, unit: NodeId) {
    let nodes = ast.descendants(unit);
    let mut memories: HashMap<Ident, NodeId> = HashMap::new();
    for &n in &nodes {
        let node = ast.node(n);
        if node.kind == NodeKind::Wire && node.decl.packed.len() == 1 && node.decl.unpacked.len() == 1 {
            memories.insert(node.name, n);
        }
    }
    if memories.is_empty() {
        return;
    }

    let readmemh = ast.intern("$readmemh");
    for &n in &nodes {
        let node = ast.node(n);
        match node.kind {
            NodeKind::TCall | NodeKind::FCall if node.name == readmemh => {
                let target = node.children.get(1).map(|&c| ast.node(c).name);
                if let Some(mem) = target.and_then(|t| memories.get(&t)) {
                    ast.node_mut(*mem).decl.force_convert = Some(false);
                }
            }
            NodeKind::Identifier if node.children.is_empty() => {
                if let Some(&mem) = memories.get(&node.name) {
                    let info = &mut ast.node_mut(mem).decl;
                    if info.force_convert.is_none() {
                        info.force_convert = Some(true);
                    }
                }
            }
            _ => {}
        }
    }
}
