//! Constant folding of expression subtrees.
//!
//! Lowering only reshapes syntax; whenever it needs a number (a range bound, a
//! parameter value, a struct size) it hands the subtree to a [`Simplifier`].
//! [`ConstFolder`] folds two-state integer arithmetic and resolves parameter
//! references through a [`ConstResolver`].

use crate::ast::Ast;
use crate::const_value::{ConstValue, UNSIZED_WIDTH};
use crate::ids::NodeId;
use crate::node::{BinaryOp, NodeKind, UnaryOp};
use std::collections::HashMap;
use strata_common::Ident;

/// Maps names to the declarations currently in scope.
pub trait ConstResolver {
    /// Returns the declaration node for `name`, if one is in scope.
    fn lookup(&self, name: Ident) -> Option<NodeId>;
}

/// A resolver with nothing in scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConsts;

impl ConstResolver for NoConsts {
    fn lookup(&self, _name: Ident) -> Option<NodeId> {
        None
    }
}

impl ConstResolver for HashMap<Ident, NodeId> {
    fn lookup(&self, name: Ident) -> Option<NodeId> {
        self.get(&name).copied()
    }
}

/// A constant simplifier.
pub trait Simplifier {
    /// Folds `node` as far as possible.
    ///
    /// Returns a new constant node when the whole subtree is constant;
    /// otherwise folds constant children in place and returns `node`.
    fn simplify(&self, ast: &mut Ast, node: NodeId, resolver: &dyn ConstResolver) -> NodeId;

    /// Folds `node` and returns its integer value if it became a constant.
    fn eval_int(&self, ast: &mut Ast, node: NodeId, resolver: &dyn ConstResolver) -> Option<i64> {
        let folded = self.simplify(ast, node, resolver);
        ast.const_int(folded)
    }
}

/// Parameter chains deeper than this are treated as non-constant.
const MAX_DEPTH: usize = 64;

/// The shipped [`Simplifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstFolder;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Folded {
    value: i64,
    width: u32,
    signed: bool,
}

impl Folded {
    fn new(value: i64, width: u32, signed: bool) -> Self {
        let width = width.clamp(1, 64);
        let value = if width == 64 {
            value
        } else if signed {
            let shift = 64 - width;
            (value << shift) >> shift
        } else {
            value & mask(width)
        };
        Self {
            value,
            width,
            signed,
        }
    }

    fn bool(b: bool) -> Self {
        Self::new(i64::from(b), 1, false)
    }
}

fn mask(width: u32) -> i64 {
    if width >= 64 {
        -1
    } else {
        (1i64 << width) - 1
    }
}

fn clog2(n: i64) -> i64 {
    if n <= 1 {
        0
    } else {
        i64::from(64 - ((n - 1) as u64).leading_zeros())
    }
}

impl Simplifier for ConstFolder {
    fn simplify(&self, ast: &mut Ast, node: NodeId, resolver: &dyn ConstResolver) -> NodeId {
        self.fold(ast, node, resolver, 0)
    }
}

impl ConstFolder {
    fn fold(&self, ast: &mut Ast, id: NodeId, res: &dyn ConstResolver, depth: usize) -> NodeId {
        if ast.kind(id) == NodeKind::Constant || depth > MAX_DEPTH {
            return id;
        }
        if let Some(f) = self.eval(ast, id, res, depth) {
            let loc = ast.node(id).loc;
            let value = if f.signed {
                ConstValue::signed(f.value, f.width)
            } else {
                ConstValue::int(f.value, f.width)
            };
            return ast.mk_const(value, loc);
        }
        let children = ast.children(id).to_vec();
        for c in children {
            let folded = self.fold(ast, c, res, depth + 1);
            if folded != c {
                ast.replace_child(id, c, folded);
            }
        }
        id
    }

    fn eval(&self, ast: &Ast, id: NodeId, res: &dyn ConstResolver, depth: usize) -> Option<Folded> {
        if depth > MAX_DEPTH {
            return None;
        }
        let node = ast.node(id);
        let child = |i: usize| -> Option<Folded> {
            let c = *node.children.get(i)?;
            self.eval(ast, c, res, depth + 1)
        };
        match node.kind {
            NodeKind::Constant => {
                let v = node.value.as_ref()?;
                let value = v.as_int()?;
                Some(Folded::new(value, v.width(), v.is_signed()))
            }
            NodeKind::Identifier if node.children.is_empty() => {
                let decl = res.lookup(node.name)?;
                let value = param_value(ast, decl)?;
                self.eval(ast, value, res, depth + 1)
            }
            NodeKind::SelfSz => child(0),
            NodeKind::ToSigned => child(0).map(|f| Folded::new(f.value, f.width, true)),
            NodeKind::ToUnsigned => child(0).map(|f| Folded::new(f.value, f.width, false)),
            NodeKind::Unary(op) => {
                let a = child(0)?;
                Some(unary(op, a))
            }
            NodeKind::Binary(op) => {
                let a = child(0)?;
                let b = child(1)?;
                binary(op, a, b)
            }
            NodeKind::Ternary => {
                let c = child(0)?;
                if c.value != 0 {
                    child(1)
                } else {
                    child(2)
                }
            }
            NodeKind::Concat => {
                let mut value = 0i64;
                let mut width = 0u32;
                for i in 0..node.children.len() {
                    let part = child(i)?;
                    if width + part.width > 63 {
                        return None;
                    }
                    value |= (part.value & mask(part.width)) << width;
                    width += part.width;
                }
                Some(Folded::new(value, width, false))
            }
            NodeKind::Replicate => {
                let count = child(0)?.value;
                let part = child(1)?;
                if count < 0 || i64::from(part.width) * count > 63 {
                    return None;
                }
                let mut value = 0i64;
                for i in 0..count {
                    value |= (part.value & mask(part.width)) << (i64::from(part.width) * i);
                }
                Some(Folded::new(value, part.width * count as u32, false))
            }
            NodeKind::FCall => match ast.resolve(node.name) {
                "$clog2" => child(0).map(|f| Folded::new(clog2(f.value), UNSIZED_WIDTH, true)),
                "$bits" => {
                    let arg = *node.children.first()?;
                    let width = self.bits_of(ast, arg, res, depth + 1)?;
                    Some(Folded::new(width, UNSIZED_WIDTH, true))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Width in bits of an expression or of the declaration an identifier names.
    fn bits_of(&self, ast: &Ast, id: NodeId, res: &dyn ConstResolver, depth: usize) -> Option<i64> {
        let node = ast.node(id);
        if node.kind == NodeKind::Identifier && node.children.is_empty() {
            if let Some(decl) = res.lookup(node.name) {
                return self.decl_width(ast, decl, res, depth + 1);
            }
        }
        self.eval(ast, id, res, depth).map(|f| i64::from(f.width))
    }

    fn decl_width(&self, ast: &Ast, decl: NodeId, res: &dyn ConstResolver, depth: usize) -> Option<i64> {
        if depth > MAX_DEPTH {
            return None;
        }
        let node = ast.node(decl);
        match node.kind {
            NodeKind::Struct | NodeKind::Union => {
                let (l, r) = ast.layout_span(decl)?;
                return Some(l - r + 1);
            }
            NodeKind::Typedef => {
                let inner = *node.children.first()?;
                return self.decl_width(ast, inner, res, depth + 1);
            }
            _ => {}
        }
        let mut width = 1i64;
        let mut any_range = false;
        let ranges = node
            .children
            .iter()
            .chain(node.decl.packed.iter())
            .chain(node.decl.unpacked.iter())
            .copied()
            .filter(|&c| ast.kind(c) == NodeKind::Range);
        for r in ranges {
            any_range = true;
            let bounds = ast.children(r);
            let l = self.eval(ast, *bounds.first()?, res, depth + 1)?.value;
            let rv = match bounds.get(1) {
                Some(&b) => self.eval(ast, b, res, depth + 1)?.value,
                None => l,
            };
            width *= (l - rv).abs() + 1;
        }
        if !any_range {
            if let Some(wt) = node.decl.wiretype {
                let ty = res.lookup(wt)?;
                return self.decl_width(ast, ty, res, depth + 1);
            }
            if node.kind.is_param() {
                let value = param_value(ast, decl)?;
                return self.eval(ast, value, res, depth + 1).map(|f| i64::from(f.width));
            }
        }
        Some(width)
    }
}

/// The value expression of a parameter declaration: its first child that is
/// not a range or type reference.
pub fn param_value(ast: &Ast, decl: NodeId) -> Option<NodeId> {
    if !ast.kind(decl).is_param() {
        return None;
    }
    ast.find_child(decl, |n| !matches!(n.kind, NodeKind::Range | NodeKind::WireType))
}

fn unary(op: UnaryOp, a: Folded) -> Folded {
    let m = mask(a.width);
    match op {
        UnaryOp::Neg => Folded::new(a.value.wrapping_neg(), a.width, a.signed),
        UnaryOp::Pos => a,
        UnaryOp::BitNot => Folded::new(!a.value, a.width, a.signed),
        UnaryOp::LogicNot => Folded::bool(a.value == 0),
        UnaryOp::ReduceAnd => Folded::bool(a.value & m == m),
        UnaryOp::ReduceOr | UnaryOp::ReduceBool => Folded::bool(a.value & m != 0),
        UnaryOp::ReduceXor => Folded::bool((a.value & m).count_ones() % 2 == 1),
        UnaryOp::ReduceXnor => Folded::bool((a.value & m).count_ones() % 2 == 0),
    }
}

fn binary(op: BinaryOp, a: Folded, b: Folded) -> Option<Folded> {
    let width = a.width.max(b.width);
    let signed = a.signed && b.signed;
    let arith = |v: i64| Some(Folded::new(v, width, signed));
    let shift_amount = u32::try_from(b.value).unwrap_or(u32::MAX);
    match op {
        BinaryOp::Add => arith(a.value.wrapping_add(b.value)),
        BinaryOp::Sub => arith(a.value.wrapping_sub(b.value)),
        BinaryOp::Mul => arith(a.value.wrapping_mul(b.value)),
        BinaryOp::Div => arith(a.value.checked_div(b.value)?),
        BinaryOp::Mod => arith(a.value.checked_rem(b.value)?),
        BinaryOp::Pow => {
            let exp = u32::try_from(b.value).ok()?;
            arith(a.value.checked_pow(exp)?)
        }
        BinaryOp::BitAnd => arith(a.value & b.value),
        BinaryOp::BitOr => arith(a.value | b.value),
        BinaryOp::BitXor => arith(a.value ^ b.value),
        BinaryOp::BitXnor => arith(!(a.value ^ b.value)),
        BinaryOp::LogicAnd => Some(Folded::bool(a.value != 0 && b.value != 0)),
        BinaryOp::LogicOr => Some(Folded::bool(a.value != 0 || b.value != 0)),
        BinaryOp::Eq | BinaryOp::EqX => Some(Folded::bool(a.value == b.value)),
        BinaryOp::Ne | BinaryOp::NeX => Some(Folded::bool(a.value != b.value)),
        BinaryOp::Lt => Some(Folded::bool(a.value < b.value)),
        BinaryOp::Le => Some(Folded::bool(a.value <= b.value)),
        BinaryOp::Gt => Some(Folded::bool(a.value > b.value)),
        BinaryOp::Ge => Some(Folded::bool(a.value >= b.value)),
        BinaryOp::Shl | BinaryOp::SShl => {
            let v = a.value.checked_shl(shift_amount).unwrap_or(0);
            Some(Folded::new(v, a.width, a.signed))
        }
        BinaryOp::Shr => {
            let v = ((a.value & mask(a.width)) as u64).checked_shr(shift_amount).unwrap_or(0);
            Some(Folded::new(v as i64, a.width, a.signed))
        }
        BinaryOp::SShr => {
            if a.signed {
                let v = a.value >> shift_amount.min(63);
                Some(Folded::new(v, a.width, true))
            } else {
                binary(BinaryOp::Shr, a, b)
            }
        }
    }
}
