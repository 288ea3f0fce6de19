//! Node kinds and per-node payload of the target tree.

use crate::const_value::ConstValue;
use crate::ids::NodeId;
use serde::{Deserialize, Serialize};
use strata_common::Ident;
use strata_source::Loc;

/// Unary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Unary plus.
    Pos,
    /// Bitwise `~`.
    BitNot,
    /// Logical `!`.
    LogicNot,
    /// Reduction AND.
    ReduceAnd,
    /// Reduction OR.
    ReduceOr,
    /// Reduction XOR.
    ReduceXor,
    /// Reduction XNOR.
    ReduceXnor,
    /// Reduction to a single truth bit.
    ReduceBool,
}

/// Binary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    /// `+`.
    Add,
    /// `-`.
    Sub,
    /// `*`.
    Mul,
    /// `/`.
    Div,
    /// `%`.
    Mod,
    /// `**`.
    Pow,
    /// `&`.
    BitAnd,
    /// `|`.
    BitOr,
    /// `^`.
    BitXor,
    /// `~^`.
    BitXnor,
    /// `&&`.
    LogicAnd,
    /// `||`.
    LogicOr,
    /// `==`.
    Eq,
    /// `!=`.
    Ne,
    /// `===`.
    EqX,
    /// `!==`.
    NeX,
    /// `<`.
    Lt,
    /// `<=`.
    Le,
    /// `>`.
    Gt,
    /// `>=`.
    Ge,
    /// `<<`.
    Shl,
    /// `>>`.
    Shr,
    /// `<<<`.
    SShl,
    /// `>>>`.
    SShr,
}

impl BinaryOp {
    /// Returns `true` for operators whose result is a single truth bit.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::LogicAnd
                | BinaryOp::LogicOr
                | BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::EqX
                | BinaryOp::NeX
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
        )
    }

    /// Returns `true` for shifts, whose right operand is an unsigned amount.
    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::SShl | BinaryOp::SShr)
    }
}

/// The kind of a node in the target tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// The lowered design; children are packages and modules.
    Design,
    /// A module (generic, specialized, or placeholder).
    Module,
    /// A package.
    Package,
    /// An interface definition.
    Interface,
    /// A port typed by an interface.
    InterfacePort,
    /// The `iface.modport` type of an interface port.
    InterfacePortType,
    /// A modport.
    Modport,
    /// A modport member.
    ModportMember,

    /// A wire, reg, or port declaration.
    Wire,
    /// A memory declaration (one packed and one unpacked range).
    Memory,
    /// A parameter.
    Parameter,
    /// A localparam.
    Localparam,
    /// A parameter override attached to a cell.
    Paraset,
    /// A port connection of a cell.
    Argument,
    /// A bit range: one child (index) or two (left, right).
    Range,
    /// A literal.
    Constant,
    /// A real literal.
    RealValue,
    /// A reference to a named object.
    Identifier,
    /// A `name[index].field` reference inside a generate array.
    Prefix,
    /// A hierarchical member access.
    Dot,
    /// A named type.
    Typedef,
    /// Reference to a named type on a declaration.
    WireType,
    /// A packed struct.
    Struct,
    /// A packed union.
    Union,
    /// A struct or union member.
    StructItem,
    /// An enum type.
    Enum,
    /// An enum item.
    EnumItem,

    /// A module instance.
    Cell,
    /// The module name a cell instantiates.
    CellType,

    /// A function.
    Function,
    /// A task.
    Task,
    /// A function call.
    FCall,
    /// A task call.
    TCall,
    /// `$signed(x)`.
    ToSigned,
    /// `$unsigned(x)`.
    ToUnsigned,
    /// Self-determined width of an expression.
    SelfSz,
    /// Concatenation, least-significant operand first.
    Concat,
    /// Replication `{n{x}}`.
    Replicate,
    /// A unary operator.
    Unary(UnaryOp),
    /// A binary operator.
    Binary(BinaryOp),
    /// `c ? a : b`.
    Ternary,
    /// `posedge` event.
    Posedge,
    /// `negedge` event.
    Negedge,

    /// Continuous assignment.
    Assign,
    /// Blocking assignment.
    AssignEq,
    /// Non-blocking assignment.
    AssignLe,
    /// An `always` process.
    Always,
    /// An `initial` process.
    Initial,
    /// A statement block.
    Block,
    /// A case statement; first child is the selector.
    Case,
    /// A case item; leading children are match values, last is the body.
    Cond,
    /// The default match of a case item.
    Default,
    /// A for loop: init, condition, increment, body.
    For,
    /// A repeat loop.
    Repeat,
    /// A generate block.
    GenBlock,
    /// An immediate assertion.
    Assert,
}

impl NodeKind {
    /// Upper-case label used by the text dump, e.g. `ASSIGN_EQ` or `REDUCE_OR`.
    pub fn label(self) -> String {
        let debug = match self {
            NodeKind::Unary(op) => format!("{op:?}"),
            NodeKind::Binary(op) => format!("{op:?}"),
            other => format!("{other:?}"),
        };
        let mut out = String::with_capacity(debug.len() + 4);
        for (i, c) in debug.chars().enumerate() {
            if c.is_ascii_uppercase() && i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_uppercase());
        }
        out
    }

    /// Returns `true` for the declaration kinds that flattening applies to.
    pub fn is_decl(self) -> bool {
        matches!(
            self,
            NodeKind::Wire | NodeKind::Memory | NodeKind::Parameter | NodeKind::Localparam
        )
    }

    /// Returns `true` for parameter-like declarations.
    pub fn is_param(self) -> bool {
        matches!(self, NodeKind::Parameter | NodeKind::Localparam)
    }
}

/// Flavour of an `always` process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlwaysKind {
    /// Plain `always`.
    Always,
    /// `always_comb`.
    Comb,
    /// `always_ff`.
    Ff,
    /// `always_latch`.
    Latch,
}

/// Why a module entity is not yet complete.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partial {
    /// An instance was seen before the definition; waiting to be filled.
    Unfilled,
    /// The definition is unknown; the entity stands in for a black box.
    Undefined,
}

/// Boolean properties of a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct NodeFlags {
    /// Declared as a variable.
    pub is_reg: bool,
    /// Declared with the `logic` type.
    pub is_logic: bool,
    /// Signed.
    pub is_signed: bool,
    /// Input port.
    pub is_input: bool,
    /// Output port.
    pub is_output: bool,
    /// Holds a string.
    pub is_string: bool,
    /// Typed by a user-defined type.
    pub is_custom_type: bool,
}

/// One flattened dimension.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Dim {
    /// Smaller of the two declared bounds.
    pub min: i64,
    /// Number of elements.
    pub width: i64,
    /// The declared bounds ascend (`[0:7]`).
    pub swapped: bool,
}

impl Dim {
    /// Creates a dimension entry.
    pub fn new(min: i64, width: i64, swapped: bool) -> Self {
        Self { min, width, swapped }
    }
}

/// Range bookkeeping of a declaration.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct DeclInfo {
    /// Packed ranges in declaration order, outermost first.
    pub packed: Vec<NodeId>,
    /// Unpacked ranges in declaration order, outermost first.
    pub unpacked: Vec<NodeId>,
    /// Flattened dimensions, innermost first.
    pub dims: Vec<Dim>,
    /// Set once the declaration carries a single synthetic range.
    pub flattened: bool,
    /// Explicit request to flatten (`Some(true)`) or keep as memory (`Some(false)`).
    pub force_convert: Option<bool>,
    /// Name of the user-defined type of the declaration.
    pub wiretype: Option<Ident>,
}

impl DeclInfo {
    /// Total number of declared ranges.
    pub fn range_count(&self) -> usize {
        self.packed.len() + self.unpacked.len()
    }
}

/// Attributes carried through to the consumer.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Attrs {
    /// Keep the module even when unreferenced.
    pub keep: bool,
    /// The module is a white box.
    pub whitebox: bool,
    /// The declaration came from a package import.
    pub imported: bool,
    /// Process flavour of an `always`.
    pub always_kind: Option<AlwaysKind>,
    /// Enum type name of an enum-typed wire.
    pub enum_type: Option<Ident>,
    /// Base type name of an enum item.
    pub enum_base_type: Option<Ident>,
    /// Incomplete-module marker.
    pub partial: Option<Partial>,
}

/// A node of the target tree.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    /// Node kind.
    pub kind: NodeKind,
    /// Name, or the empty identifier.
    pub name: Ident,
    /// Source location.
    pub loc: Loc,
    /// Ordered children.
    pub children: Vec<NodeId>,
    /// Boolean properties.
    pub flags: NodeFlags,
    /// Literal value of a constant.
    pub value: Option<ConstValue>,
    /// 1-based port position, 0 for non-ports.
    pub port_id: u32,
    /// Range bookkeeping of declarations.
    pub decl: DeclInfo,
    /// Consumer-visible attributes.
    pub attrs: Attrs,
    /// Absolute `(left, right)` bit position of a laid-out struct item.
    pub bit_range: Option<(i64, i64)>,
}

impl Node {
    /// Creates a node with no children or properties.
    pub fn new(kind: NodeKind, name: Ident, loc: Loc) -> Self {
        Self {
            kind,
            name,
            loc,
            children: Vec::new(),
            flags: NodeFlags::default(),
            value: None,
            port_id: 0,
            decl: DeclInfo::default(),
            attrs: Attrs::default(),
            bit_range: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(NodeKind::AssignEq.label(), "ASSIGN_EQ");
        assert_eq!(NodeKind::Unary(UnaryOp::ReduceOr).label(), "REDUCE_OR");
        assert_eq!(NodeKind::Binary(BinaryOp::SShr).label(), "S_SHR");
        assert_eq!(NodeKind::Wire.label(), "WIRE");
    }

    #[test]
    fn op_classes() {
        assert!(BinaryOp::Le.is_boolean());
        assert!(!BinaryOp::Add.is_boolean());
        assert!(BinaryOp::SShl.is_shift());
        assert!(NodeKind::Localparam.is_param());
        assert!(NodeKind::Memory.is_decl());
        assert!(!NodeKind::Range.is_decl());
    }

    #[test]
    fn decl_range_count() {
        let mut d = DeclInfo::default();
        d.packed.push(NodeId::from_raw(1));
        d.unpacked.push(NodeId::from_raw(2));
        assert_eq!(d.range_count(), 2);
    }
}
