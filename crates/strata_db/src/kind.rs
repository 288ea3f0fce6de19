//! The closed set of object kinds a design database can contain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a design-database object.
///
/// Lowering matches on this enum exhaustively; a kind it cannot lower in a
/// given context is reported as a diagnostic rather than silently skipped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    // Containers
    /// The elaborated design root.
    Design,
    /// A module definition or instance.
    Module,
    /// A package.
    Package,
    /// An interface definition or instance.
    Interface,
    /// A modport of an interface.
    Modport,
    /// A program block.
    Program,
    /// A generate scope.
    GenScope,
    /// An array of generate scopes.
    GenScopeArray,
    /// A package import item.
    Import,

    // Declarations
    /// A module or interface port.
    Port,
    /// A task or function argument.
    IoDecl,
    /// A scalar or vector net.
    Net,
    /// A net of struct type.
    StructNet,
    /// A net of enum type.
    EnumNet,
    /// An unpacked array of nets.
    ArrayNet,
    /// A packed array of nets.
    PackedArrayNet,
    /// A `logic` variable.
    LogicVar,
    /// A `bit` variable.
    BitVar,
    /// An `int` variable.
    IntVar,
    /// An `integer` variable.
    IntegerVar,
    /// A `shortint` variable.
    ShortIntVar,
    /// A `longint` variable.
    LongIntVar,
    /// A `byte` variable.
    ByteVar,
    /// A `real` variable.
    RealVar,
    /// A `string` variable.
    StringVar,
    /// A variable of enum type.
    EnumVar,
    /// A variable of struct type.
    StructVar,
    /// An unpacked array variable.
    ArrayVar,
    /// A packed array variable.
    PackedArrayVar,
    /// A parameter or localparam.
    Parameter,
    /// A parameter value assignment.
    ParamAssign,

    // Types
    /// A `logic` typespec.
    LogicTypespec,
    /// A `bit` typespec.
    BitTypespec,
    /// An `int` typespec.
    IntTypespec,
    /// An `integer` typespec.
    IntegerTypespec,
    /// A `real` typespec.
    RealTypespec,
    /// A `string` typespec.
    StringTypespec,
    /// A packed struct typespec.
    StructTypespec,
    /// A packed union typespec.
    UnionTypespec,
    /// An enum typespec.
    EnumTypespec,
    /// An unpacked array typespec.
    ArrayTypespec,
    /// A packed array typespec.
    PackedArrayTypespec,
    /// A struct or union member.
    TypespecMember,
    /// An enum item.
    EnumConst,
    /// A range `[left:right]`.
    Range,

    // Processes and statements
    /// A continuous assignment.
    ContAssign,
    /// A procedural assignment.
    Assignment,
    /// An `always` process.
    Always,
    /// An `initial` process.
    Initial,
    /// An event control `@(...) stmt`.
    EventControl,
    /// An unnamed `begin ... end` block.
    Begin,
    /// A named `begin : name ... end` block.
    NamedBegin,
    /// An `if` statement.
    If,
    /// An `if ... else` statement.
    IfElse,
    /// A `for` loop.
    For,
    /// A `case` statement.
    Case,
    /// A `case` item.
    CaseItem,
    /// A `repeat` loop.
    Repeat,
    /// A `return` statement.
    Return,
    /// A delay control `#n stmt`.
    DelayControl,
    /// An immediate assertion.
    ImmediateAssert,
    /// A function declaration.
    Function,
    /// A task declaration.
    Task,

    // Expressions
    /// An operator application.
    Operation,
    /// A literal.
    Constant,
    /// A reference to a named object.
    RefObj,
    /// A reference to a variable.
    RefVar,
    /// A single-index select `x[i]`.
    BitSelect,
    /// A part select `x[l:r]`.
    PartSelect,
    /// An indexed part select `x[b+:w]` or `x[b-:w]`.
    IndexedPartSelect,
    /// A multi-index select `x[i][j]`.
    VarSelect,
    /// A hierarchical path `a.b.c`.
    HierPath,
    /// A system function call such as `$signed`.
    SysFuncCall,
    /// A user function call.
    FuncCall,
    /// A user task call.
    TaskCall,
    /// A tagged pattern `'{field: value}`.
    TaggedPattern,
}

impl ObjectKind {
    /// Returns the human-readable name used in diagnostics, e.g. `cont_assign`.
    pub fn name(self) -> String {
        let debug = format!("{self:?}");
        let mut out = String::with_capacity(debug.len() + 4);
        for (i, c) in debug.chars().enumerate() {
            if c.is_ascii_uppercase() {
                if i > 0 {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Returns `true` for the variable kinds.
    pub fn is_variable(self) -> bool {
        matches!(
            self,
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
                | ObjectKind::PackedArrayVar
        )
    }

    /// Returns `true` for the net kinds.
    pub fn is_net(self) -> bool {
        matches!(
            self,
            ObjectKind::Net
                | ObjectKind::StructNet
                | ObjectKind::EnumNet
                | ObjectKind::ArrayNet
                | ObjectKind::PackedArrayNet
        )
    }

    /// Returns `true` for the typespec kinds.
    pub fn is_typespec(self) -> bool {
        matches!(
            self,
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
                | ObjectKind::PackedArrayTypespec
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_snake_case() {
        assert_eq!(ObjectKind::ContAssign.name(), "cont_assign");
        assert_eq!(ObjectKind::Design.name(), "design");
        assert_eq!(ObjectKind::GenScopeArray.to_string(), "gen_scope_array");
    }

    #[test]
    fn name_matches_serde_tag() {
        for kind in [
            ObjectKind::IndexedPartSelect,
            ObjectKind::PackedArrayTypespec,
            ObjectKind::IoDecl,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn classification() {
        assert!(ObjectKind::StructVar.is_variable());
        assert!(!ObjectKind::StructVar.is_net());
        assert!(ObjectKind::ArrayNet.is_net());
        assert!(ObjectKind::EnumTypespec.is_typespec());
        assert!(!ObjectKind::TypespecMember.is_typespec());
    }
}
