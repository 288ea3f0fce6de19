//! Bound arithmetic over expression nodes.
//!
//! Range and struct offsets may depend on non-constant indices, so they are
//! built as expression trees and handed to the simplifier afterwards. Constant
//! operands are combined immediately to keep the trees small.

use strata_ast::{Ast, BinaryOp, ConstResolver, ConstFolder, Dim, NodeId, Simplifier};
use strata_source::Loc;

/// Builds integer expressions at one location.
pub(crate) struct Arith<'t> {
    pub(crate) ast: &'t mut Ast,
    pub(crate) loc: Loc,
}

impl<'t> Arith<'t> {
    pub(crate) fn new(ast: &'t mut Ast, loc: Loc) -> Self {
        Self { ast, loc }
    }

    pub(crate) fn int(&mut self, v: i64) -> NodeId {
        self.ast.mk_const_int(v, self.loc)
    }

    fn binary(&mut self, op: BinaryOp, a: NodeId, b: NodeId) -> NodeId {
        if let (Some(x), Some(y)) = (self.ast.const_int(a), self.ast.const_int(b)) {
            let folded = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Sub => x.checked_sub(y),
                BinaryOp::Mul => x.checked_mul(y),
                _ => None,
            };
            if let Some(v) = folded {
                return self.int(v);
            }
        }
        self.ast.mk_binary(op, a, b, self.loc)
    }

    pub(crate) fn add(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.binary(BinaryOp::Add, a, b)
    }

    pub(crate) fn sub(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.binary(BinaryOp::Sub, a, b)
    }

    pub(crate) fn mul(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.binary(BinaryOp::Mul, a, b)
    }

    pub(crate) fn add_int(&mut self, a: NodeId, v: i64) -> NodeId {
        let b = self.int(v);
        self.add(a, b)
    }

    pub(crate) fn mul_int(&mut self, a: NodeId, v: i64) -> NodeId {
        let b = self.int(v);
        self.mul(a, b)
    }

    pub(crate) fn copy(&mut self, a: NodeId) -> NodeId {
        self.ast.clone_subtree(a)
    }

    /// Zero-based position of `index` inside `dim`, counted from the least
    /// significant element.
    ///
    /// Ascending dimensions store their first declared element at the top, so
    /// the index is complemented against the width.
    pub(crate) fn normalize_index(&mut self, index: NodeId, dim: Dim) -> NodeId {
        let min = self.int(dim.min);
        let offset = self.sub(index, min);
        if dim.swapped {
            let top = self.int(dim.width - 1);
            self.sub(top, offset)
        } else {
            offset
        }
    }

    /// A `[left:right]` range, with both bounds simplified.
    pub(crate) fn range(&mut self, left: NodeId, right: NodeId, scope: &dyn ConstResolver) -> NodeId {
        let left = ConstFolder.simplify(self.ast, left, scope);
        let right = ConstFolder.simplify(self.ast, right, scope);
        self.ast.mk_range_of(left, Some(right), self.loc)
    }
}
