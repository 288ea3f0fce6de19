//! Scalar properties and the decoders for their integer codes.
//!
//! Integer properties use the numeric codes of the SystemVerilog VPI headers
//! so that exports from existing front ends can be loaded unchanged.

use serde::{Deserialize, Serialize};

/// A string-valued property.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrProp {
    /// Local name of the object.
    Name,
    /// Fully qualified hierarchical name.
    FullName,
    /// Definition name of a module or interface.
    DefName,
    /// Package an object was imported from.
    Imported,
}

/// An integer-valued property.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntProp {
    /// Operator code of an operation; see [`OpType`].
    OpType,
    /// Port direction; see [`Direction`].
    Direction,
    /// Net or variable storage type; see [`NetType`].
    NetType,
    /// Non-zero when signed.
    Signed,
    /// Non-zero for a localparam.
    LocalParam,
    /// Non-zero for a blocking assignment.
    Blocking,
    /// Process flavour of an `always`; see [`AlwaysKind`].
    AlwaysType,
    /// Bit width of a constant.
    Size,
    /// Non-zero for a module instance with no visible body.
    CellInstance,
    /// Non-zero for an assignment written in a net declaration.
    NetDeclAssign,
    /// Direction of an indexed part select; see [`PartSelectKind`].
    IndexedPartSelectType,
}

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $( $(#[$vmeta:meta])* $variant:ident = $code:expr, )* }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
        }

        impl $name {
            /// Decodes a raw property value.
            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $( $code => Some($name::$variant), )*
                    _ => None,
                }
            }

            /// Returns the raw property value.
            pub fn code(self) -> i64 {
                match self {
                    $( $name::$variant => $code, )*
                }
            }
        }
    };
}

code_enum! {
    /// Operator of an [`ObjectKind::Operation`](crate::ObjectKind::Operation).
    pub enum OpType {
        /// Unary `-`.
        Minus = 1,
        /// Unary `+`.
        Plus = 2,
        /// Logical `!`.
        Not = 3,
        /// Bitwise `~`.
        BitNeg = 4,
        /// Reduction `&`.
        UnaryAnd = 5,
        /// Reduction `~&`.
        UnaryNand = 6,
        /// Reduction `|`.
        UnaryOr = 7,
        /// Reduction `~|`.
        UnaryNor = 8,
        /// Reduction `^`.
        UnaryXor = 9,
        /// Reduction `~^`.
        UnaryXnor = 10,
        /// Binary `-`.
        Sub = 11,
        /// `/`.
        Div = 12,
        /// `%`.
        Mod = 13,
        /// `==`.
        Eq = 14,
        /// `!=`.
        Neq = 15,
        /// `===`.
        CaseEq = 16,
        /// `!==`.
        CaseNeq = 17,
        /// `>`.
        Gt = 18,
        /// `>=`.
        Ge = 19,
        /// `<`.
        Lt = 20,
        /// `<=`.
        Le = 21,
        /// `<<`.
        LShift = 22,
        /// `>>`.
        RShift = 23,
        /// Binary `+`.
        Add = 24,
        /// `*`.
        Mult = 25,
        /// `&&`.
        LogAnd = 26,
        /// `||`.
        LogOr = 27,
        /// Bitwise `&`.
        BitAnd = 28,
        /// Bitwise `|`.
        BitOr = 29,
        /// Bitwise `^`.
        BitXor = 30,
        /// Bitwise `~^`.
        BitXnor = 31,
        /// `c ? a : b`.
        Condition = 32,
        /// `{a, b}`.
        Concat = 33,
        /// `{n{a}}`.
        MultiConcat = 34,
        /// Event `or`.
        EventOr = 35,
        /// Empty operation.
        Null = 36,
        /// Comma-separated event list.
        List = 37,
        /// `min:typ:max`.
        MinTypMax = 38,
        /// `posedge`.
        Posedge = 39,
        /// `negedge`.
        Negedge = 40,
        /// `<<<`.
        ArithLShift = 41,
        /// `>>>`.
        ArithRShift = 42,
        /// `**`.
        Power = 43,
        /// `x++`.
        PostInc = 62,
        /// `++x`.
        PreInc = 63,
        /// `x--`.
        PostDec = 64,
        /// `--x`.
        PreDec = 65,
        /// `type'(x)`.
        Cast = 67,
        /// `{>>{...}}`.
        StreamLr = 71,
        /// `{<<{...}}`.
        StreamRl = 72,
        /// `'{...}`.
        AssignmentPattern = 75,
        /// `'{n{...}}`.
        MultiAssignmentPattern = 76,
        /// `x inside {...}`.
        Inside = 82,
        /// `type(x)`.
        Type = 83,
        /// `x op= y`.
        Assignment = 84,
    }
}

code_enum! {
    /// Direction of a port or argument.
    pub enum Direction {
        /// `input`.
        Input = 1,
        /// `output`.
        Output = 2,
        /// `inout`.
        Inout = 3,
        /// Mixed direction.
        Mixed = 4,
        /// No direction.
        NoDirection = 5,
        /// `ref`.
        Ref = 6,
    }
}

code_enum! {
    /// Storage type of a net or variable.
    pub enum NetType {
        /// `wire`.
        Wire = 1,
        /// `wand`.
        Wand = 2,
        /// `wor`.
        Wor = 3,
        /// `tri`.
        Tri = 4,
        /// `tri0`.
        Tri0 = 5,
        /// `tri1`.
        Tri1 = 6,
        /// `trireg`.
        TriReg = 7,
        /// `triand`.
        TriAnd = 8,
        /// `trior`.
        TriOr = 9,
        /// `supply1`.
        Supply1 = 10,
        /// `supply0`.
        Supply0 = 11,
        /// No net type.
        None = 12,
        /// `uwire`.
        Uwire = 13,
        /// A variable (`reg`/`logic` storage).
        Reg = 48,
    }
}

code_enum! {
    /// Flavour of an `always` process.
    pub enum AlwaysKind {
        /// Plain `always`.
        Always = 1,
        /// `always_comb`.
        AlwaysComb = 2,
        /// `always_ff`.
        AlwaysFf = 3,
        /// `always_latch`.
        AlwaysLatch = 4,
    }
}

code_enum! {
    /// Direction of an indexed part select.
    pub enum PartSelectKind {
        /// `base +: width`.
        Pos = 1,
        /// `base -: width`.
        Neg = 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_codes_round_trip() {
        for op in [OpType::Minus, OpType::Concat, OpType::StreamRl, OpType::Inside, OpType::Assignment] {
            assert_eq!(OpType::from_code(op.code()), Some(op));
        }
        assert_eq!(OpType::Add.code(), 24);
        assert_eq!(OpType::from_code(44), None);
    }

    #[test]
    fn net_type_reg() {
        assert_eq!(NetType::from_code(48), Some(NetType::Reg));
        assert_eq!(NetType::from_code(0), None);
    }

    #[test]
    fn direction_and_select_kind() {
        assert_eq!(Direction::from_code(2), Some(Direction::Output));
        assert_eq!(PartSelectKind::from_code(2), Some(PartSelectKind::Neg));
        assert_eq!(AlwaysKind::AlwaysFf.code(), 3);
    }

    #[test]
    fn prop_keys_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&IntProp::NetDeclAssign).unwrap(), "\"net_decl_assign\"");
        assert_eq!(serde_json::to_string(&StrProp::DefName).unwrap(), "\"def_name\"");
    }
}
