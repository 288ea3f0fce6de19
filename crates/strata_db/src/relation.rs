//! Named edges between design-database objects.

use serde::{Deserialize, Serialize};

/// A named edge from one object to others.
///
/// Some relations are one-to-many (walked with
/// [`DesignDb::iterate`](crate::DesignDb::iterate)), others one-to-one (read
/// with [`DesignDb::resolve`](crate::DesignDb::resolve)). A one-to-one
/// relation is stored as a list of length one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    // Design
    /// Every interface definition.
    AllInterfaces,
    /// Every package.
    AllPackages,
    /// Every module definition.
    AllModules,
    /// The elaborated top-level module instances.
    TopModules,

    // Scope contents
    /// Child module instances.
    Modules,
    /// Child interface instances.
    Interfaces,
    /// Modports of an interface.
    Modports,
    /// Parameters and localparams.
    Parameters,
    /// Parameter value assignments.
    ParamAssigns,
    /// Ports.
    Ports,
    /// Nets.
    Nets,
    /// Unpacked net arrays.
    ArrayNets,
    /// Variables.
    Variables,
    /// Declared typedefs.
    Typedefs,
    /// Tasks and functions.
    TaskFuncs,
    /// Generate scope arrays.
    GenScopeArrays,
    /// Generate scopes inside a generate scope array.
    GenScopes,
    /// Continuous assignments.
    ContAssigns,
    /// Processes (`always`, `initial`).
    Processes,
    /// Task/function arguments and modport members.
    IoDecls,

    // Types and ranges
    /// The typespec of a declaration or expression.
    Typespec,
    /// The element typespec of an array typespec.
    ElemTypespec,
    /// Struct/union members.
    Members,
    /// Enum items.
    EnumConsts,
    /// Packed ranges.
    Ranges,
    /// Unpacked ranges of an array object.
    UnpackedRanges,
    /// Elements of a packed array.
    Elements,
    /// Per-element variables of an array variable.
    Regs,
    /// Left bound of a range or part select.
    LeftRange,
    /// Right bound of a range or part select.
    RightRange,
    /// Base expression of an indexed part select.
    BaseExpr,
    /// Width expression of an indexed part select.
    WidthExpr,

    // Connections
    /// The connection outside an instance.
    HighConn,
    /// The connection inside the module.
    LowConn,
    /// The object a reference stands for.
    Actual,
    /// The enclosing object.
    Parent,
    /// The module or interface definition an instance refers to.
    Instance,

    // Statements and expressions
    /// Left-hand side of an assignment.
    Lhs,
    /// Right-hand side of an assignment.
    Rhs,
    /// Body statement.
    Stmt,
    /// Else branch of an if/else.
    ElseStmt,
    /// Statements of a block.
    Stmts,
    /// Condition expression.
    Condition,
    /// Case items.
    CaseItems,
    /// Match expressions of a case item.
    Exprs,
    /// Operands of an operation.
    Operands,
    /// Arguments of a call.
    Arguments,
    /// Loop initialization statements.
    ForInitStmts,
    /// Loop increment statements.
    ForIncStmts,
    /// Index expressions of a select.
    Indexes,
    /// The index of a bit select.
    Index,
    /// Elements of a hierarchical path.
    ActualGroup,
    /// Default value expression.
    Expr,
    /// Pattern of a tagged pattern.
    Pattern,
    /// Return variable of a function.
    Return,
    /// Delay expression of a delay control.
    Delay,
}
