//! Text and JSON renderings of a subtree.

use crate::ast::Ast;
use crate::ids::NodeId;
use crate::node::{AlwaysKind, Dim, NodeFlags, Partial};
use serde::Serialize;
use std::fmt::Write;

/// Renders a subtree as indented text, one node per line.
///
/// Each line reads `KIND 'name' <value> [flags]`; declarations also list their
/// flattened dimensions.
pub fn dump(ast: &Ast, root: NodeId) -> String {
    let mut out = String::new();
    dump_into(ast, root, 0, &mut out);
    out
}

fn dump_into(ast: &Ast, id: NodeId, depth: usize, out: &mut String) {
    let node = ast.node(id);
    let _ = write!(out, "{:indent$}{}", "", node.kind.label(), indent = depth * 2);
    let name = ast.resolve(node.name);
    if !name.is_empty() {
        let _ = write!(out, " '{name}'");
    }
    if let Some(v) = &node.value {
        let _ = write!(out, " <{v}>");
    }
    let flags = flag_names(&node.flags);
    if !flags.is_empty() || node.port_id != 0 {
        let mut parts = flags;
        if node.port_id != 0 {
            parts.push(format!("port={}", node.port_id));
        }
        let _ = write!(out, " [{}]", parts.join(","));
    }
    if !node.decl.dims.is_empty() {
        let dims: Vec<String> = node
            .decl
            .dims
            .iter()
            .map(|d| format!("({},{}{})", d.min, d.width, if d.swapped { ",s" } else { "" }))
            .collect();
        let _ = write!(out, " dims={}", dims.join(""));
    }
    if let Some((l, r)) = node.bit_range {
        let _ = write!(out, " bits=[{l}:{r}]");
    }
    out.push('\n');
    for &c in &node.children {
        dump_into(ast, c, depth + 1, out);
    }
}

fn flag_names(flags: &NodeFlags) -> Vec<String> {
    let mut v = Vec::new();
    for (set, name) in [
        (flags.is_reg, "reg"),
        (flags.is_logic, "logic"),
        (flags.is_signed, "signed"),
        (flags.is_input, "input"),
        (flags.is_output, "output"),
        (flags.is_string, "string"),
        (flags.is_custom_type, "custom"),
    ] {
        if set {
            v.push(name.to_string());
        }
    }
    v
}

/// Serializable mirror of a node with names resolved.
#[derive(Debug, Serialize)]
pub struct JsonNode {
    kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "is_default_flags")]
    flags: NodeFlags,
    #[serde(skip_serializing_if = "is_zero")]
    port_id: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dims: Vec<Dim>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wiretype: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    keep: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    whitebox: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    always_kind: Option<AlwaysKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partial: Option<Partial>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<JsonNode>,
}

fn is_default_flags(f: &NodeFlags) -> bool {
    *f == NodeFlags::default()
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Builds the serializable mirror of a subtree.
pub fn to_json_node(ast: &Ast, id: NodeId) -> JsonNode {
    let node = ast.node(id);
    JsonNode {
        kind: node.kind.label(),
        name: ast.resolve(node.name).to_string(),
        value: node.value.as_ref().map(ToString::to_string),
        line: (!node.loc.is_dummy() && node.loc.line != 0).then_some(node.loc.line),
        flags: node.flags,
        port_id: node.port_id,
        dims: node.decl.dims.clone(),
        wiretype: node.decl.wiretype.map(|w| ast.resolve(w).to_string()),
        keep: node.attrs.keep,
        whitebox: node.attrs.whitebox,
        always_kind: node.attrs.always_kind,
        partial: node.attrs.partial,
        children: node.children.iter().map(|&c| to_json_node(ast, c)).collect(),
    }
}

/// Renders a subtree as pretty-printed JSON.
pub fn to_json(ast: &Ast, root: NodeId) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&to_json_node(ast, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use strata_source::Loc;

    fn sample() -> (Ast, NodeId) {
        let mut ast = Ast::new();
        let m = ast.mk_named(NodeKind::Module, "top", Loc::DUMMY);
        let w = ast.mk_named(NodeKind::Wire, "x", Loc::DUMMY);
        ast.node_mut(w).flags.is_input = true;
        ast.node_mut(w).port_id = 1;
        ast.node_mut(w).decl.dims.push(Dim::new(0, 4, false));
        let r = ast.mk_range(3, 0, Loc::DUMMY);
        ast.push_child(w, r);
        ast.push_child(m, w);
        (ast, m)
    }

    #[test]
    fn text_dump() {
        let (ast, m) = sample();
        let text = dump(&ast, m);
        let expected = "\
MODULE 'top'
  WIRE 'x' [input,port=1] dims=(0,4)
    RANGE
      CONSTANT <32'sd3> [signed]
      CONSTANT <32'sd0> [signed]
";
        assert_eq!(text, expected);
    }

    #[test]
    fn sized_constant_is_unsigned() {
        let mut ast = Ast::new();
        let c = ast.mk_const_sized(1, 1, Loc::DUMMY);
        assert_eq!(dump(&ast, c), "CONSTANT <1'd1>\n");
    }

    #[test]
    fn json_dump() {
        let (ast, m) = sample();
        let json = to_json(&ast, m).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["kind"], "MODULE");
        assert_eq!(v["children"][0]["name"], "x");
        assert_eq!(v["children"][0]["port_id"], 1);
        let bound = &v["children"][0]["children"][0]["children"][1];
        assert_eq!(bound["value"], "32'sd0");
        assert_eq!(bound["flags"]["is_signed"], true);
        assert!(v.get("keep").is_none());
    }
}
