//! The node arena, name interner, and tree-editing helpers.

use crate::const_value::{ConstValue, UNSIZED_WIDTH};
use crate::ids::NodeId;
use crate::node::{BinaryOp, Node, NodeKind, UnaryOp};
use strata_common::{Arena, Ident, Interner};
use strata_source::Loc;

/// A forest of target-tree nodes sharing one arena and one interner.
///
/// Nodes are never freed. Rewrites allocate new nodes and relink parents, so a
/// `NodeId` stays valid for the life of the `Ast`.
#[derive(Default)]
pub struct Ast {
    nodes: Arena<NodeId, Node>,
    interner: Interner,
}

impl Ast {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// The name interner.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Interns a name.
    pub fn intern(&self, s: &str) -> Ident {
        self.interner.get_or_intern(s)
    }

    /// Resolves an interned name.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// The name of a node as a string.
    pub fn name_of(&self, id: NodeId) -> &str {
        self.interner.resolve(self.nodes[id].name)
    }

    /// Number of nodes allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no nodes were allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a node.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.alloc(node)
    }

    /// Borrows a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Mutably borrows a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Kind of a node.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    /// Children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Allocates an unnamed node.
    pub fn mk(&mut self, kind: NodeKind, loc: Loc) -> NodeId {
        let empty = self.interner.empty();
        self.alloc(Node::new(kind, empty, loc))
    }

    /// Allocates a named node.
    pub fn mk_named(&mut self, kind: NodeKind, name: &str, loc: Loc) -> NodeId {
        let name = self.intern(name);
        self.alloc(Node::new(kind, name, loc))
    }

    /// Allocates an unnamed node with the given children.
    pub fn mk_with(&mut self, kind: NodeKind, loc: Loc, children: Vec<NodeId>) -> NodeId {
        let id = self.mk(kind, loc);
        self.nodes[id].children = children;
        id
    }

    /// A constant node.
    pub fn mk_const(&mut self, value: ConstValue, loc: Loc) -> NodeId {
        let id = self.mk(NodeKind::Constant, loc);
        let node = &mut self.nodes[id];
        node.flags.is_signed = value.is_signed();
        node.value = Some(value);
        id
    }

    /// An unsized, signed integer constant.
    pub fn mk_const_int(&mut self, value: i64, loc: Loc) -> NodeId {
        self.mk_const(ConstValue::signed(value, UNSIZED_WIDTH), loc)
    }

    /// An unsigned constant of the given width.
    pub fn mk_const_sized(&mut self, value: i64, width: u32, loc: Loc) -> NodeId {
        self.mk_const(ConstValue::int(value, width), loc)
    }

    /// A string constant.
    pub fn mk_const_str(&mut self, s: &str, loc: Loc) -> NodeId {
        self.mk_const(ConstValue::Str(s.to_string()), loc)
    }

    /// A `[left:right]` range of integer constants.
    pub fn mk_range(&mut self, left: i64, right: i64, loc: Loc) -> NodeId {
        let l = self.mk_const_int(left, loc);
        let r = self.mk_const_int(right, loc);
        self.mk_with(NodeKind::Range, loc, vec![l, r])
    }

    /// A range over arbitrary bound expressions; `right` is omitted for an index.
    pub fn mk_range_of(&mut self, left: NodeId, right: Option<NodeId>, loc: Loc) -> NodeId {
        let mut children = vec![left];
        children.extend(right);
        self.mk_with(NodeKind::Range, loc, children)
    }

    /// An identifier reference.
    pub fn mk_ident(&mut self, name: &str, loc: Loc) -> NodeId {
        self.mk_named(NodeKind::Identifier, name, loc)
    }

    /// An identifier reference by interned name.
    pub fn mk_ident_id(&mut self, name: Ident, loc: Loc) -> NodeId {
        self.alloc(Node::new(NodeKind::Identifier, name, loc))
    }

    /// A unary operation.
    pub fn mk_unary(&mut self, op: UnaryOp, operand: NodeId, loc: Loc) -> NodeId {
        self.mk_with(NodeKind::Unary(op), loc, vec![operand])
    }

    /// A binary operation.
    pub fn mk_binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId, loc: Loc) -> NodeId {
        self.mk_with(NodeKind::Binary(op), loc, vec![lhs, rhs])
    }

    /// Appends a child.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.push(child);
    }

    /// Inserts a child at `index`, clamped to the child count.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let children = &mut self.nodes[parent].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Replaces `old` with `new` among the children of `parent`.
    ///
    /// Returns `false` if `old` is not a child of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> bool {
        match self.nodes[parent].children.iter().position(|&c| c == old) {
            Some(pos) => {
                self.nodes[parent].children[pos] = new;
                true
            }
            None => false,
        }
    }

    /// Removes `child` from the children of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.retain(|&c| c != child);
    }

    /// The first child satisfying `pred`.
    pub fn find_child(&self, parent: NodeId, pred: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| pred(&self.nodes[c]))
    }

    /// The first child of the given kind.
    pub fn find_child_kind(&self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.find_child(parent, |n| n.kind == kind)
    }

    /// The first child with the given name.
    pub fn find_child_named(&self, parent: NodeId, name: Ident) -> Option<NodeId> {
        self.find_child(parent, |n| n.name == name)
    }

    /// Integer value of a constant node.
    pub fn const_int(&self, id: NodeId) -> Option<i64> {
        let node = &self.nodes[id];
        if node.kind != NodeKind::Constant {
            return None;
        }
        node.value.as_ref().and_then(ConstValue::as_int)
    }

    /// Absolute `(left, right)` extent of a laid-out struct, union, or member.
    ///
    /// Members carry their position in [`Node::bit_range`]; an aggregate spans
    /// from its highest member bit down to its lowest.
    pub fn layout_span(&self, id: NodeId) -> Option<(i64, i64)> {
        let node = &self.nodes[id];
        if let Some(span) = node.bit_range {
            return Some(span);
        }
        if !matches!(node.kind, NodeKind::Struct | NodeKind::Union) {
            return None;
        }
        let mut span: Option<(i64, i64)> = None;
        for &c in &node.children {
            let (l, r) = self.layout_span(c)?;
            span = Some(match span {
                Some((sl, sr)) => (sl.max(l), sr.min(r)),
                None => (l, r),
            });
        }
        span
    }

    /// Deep-copies a subtree, including range lists held in declaration info.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut node = self.nodes[id].clone();
        node.children = node
            .children
            .iter()
            .map(|&c| self.clone_subtree(c))
            .collect();
        node.decl.packed = node.decl.packed.iter().map(|&r| self.clone_subtree(r)).collect();
        node.decl.unpacked = node
            .decl
            .unpacked
            .iter()
            .map(|&r| self.clone_subtree(r))
            .collect();
        self.alloc(node)
    }

    /// Calls `f` on every descendant of `id` in pre-order, excluding `id` itself.
    pub fn visit_descendants(&self, id: NodeId, f: &mut impl FnMut(NodeId)) {
        for &c in &self.nodes[id].children {
            f(c);
            self.visit_descendants(c, f);
        }
    }

    /// All descendants of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.visit_descendants(id, &mut |c| out.push(c));
        out
    }
}
