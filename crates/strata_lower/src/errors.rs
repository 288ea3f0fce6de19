//! Diagnostic codes and helper functions for lowering problems.
//!
//! Codes `E300`/`W300` and `E301`/`W301` report input the walker cannot
//! lower; which of the pair is used depends on `stop_on_error`. `W302`-`W304`
//! are non-fatal notices about dropped or approximated constructs, and `N300`
//! is the per-object trace emitted in debug mode.

use strata_db::ObjectKind;
use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use strata_source::Loc;

/// Unhandled object kind (error policy).
pub const E300: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 300,
};

/// Unhandled object kind (warning policy).
pub const W300: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 300,
};

/// Unhandled operation or typespec in context (error policy).
pub const E301: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 301,
};

/// Unhandled operation or typespec in context (warning policy).
pub const W301: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 301,
};

/// A partial module was never filled and is removed from the design.
pub const W302: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 302,
};

/// Non-synthesizable construct.
pub const W303: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 303,
};

/// A struct field access on an unknown base fell back to a dotted name.
pub const W304: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 304,
};

/// Debug trace of a visited object.
pub const N300: DiagnosticCode = DiagnosticCode {
    category: Category::Note,
    number: 300,
};

fn by_policy(stop_on_error: bool, error: DiagnosticCode, warning: DiagnosticCode) -> (DiagnosticCode, bool) {
    if stop_on_error {
        (error, true)
    } else {
        (warning, false)
    }
}

fn policy_diagnostic(code: DiagnosticCode, is_error: bool, message: String, loc: Loc) -> Diagnostic {
    if is_error {
        Diagnostic::error(code, message, loc)
    } else {
        Diagnostic::warning(code, message, loc)
    }
}

/// Creates a diagnostic for an object kind the walker has no rule for.
pub fn unhandled_object(kind: ObjectKind, name: &str, loc: Loc, stop_on_error: bool) -> Diagnostic {
    let (code, is_error) = by_policy(stop_on_error, E300, W300);
    policy_diagnostic(
        code,
        is_error,
        format!("encountered unhandled object `{name}` of kind `{kind}`"),
        loc,
    )
}

/// Creates a diagnostic for an operator code the walker cannot lower.
pub fn unhandled_operation(op_code: i64, loc: Loc, stop_on_error: bool) -> Diagnostic {
    let (code, is_error) = by_policy(stop_on_error, E301, W301);
    policy_diagnostic(
        code,
        is_error,
        format!("encountered unhandled operation type {op_code}"),
        loc,
    )
}

/// Creates a diagnostic for a typespec that is not supported where it appears.
pub fn unhandled_typespec(
    context: &str,
    kind: ObjectKind,
    name: &str,
    loc: Loc,
    stop_on_error: bool,
) -> Diagnostic {
    let (code, is_error) = by_policy(stop_on_error, E301, W301);
    policy_diagnostic(
        code,
        is_error,
        format!("encountered unhandled typespec `{name}` of kind `{kind}` in {context}"),
        loc,
    )
}

/// Creates a diagnostic for a connection kind a port cannot be built from.
pub fn unhandled_port_connection(kind: ObjectKind, loc: Loc, stop_on_error: bool) -> Diagnostic {
    let (code, is_error) = by_policy(stop_on_error, E301, W301);
    policy_diagnostic(
        code,
        is_error,
        format!("encountered unhandled type in port connection: `{kind}`"),
        loc,
    )
}

/// Creates a warning for a partial module dropped from the output.
pub fn removing_unused_module(name: &str) -> Diagnostic {
    Diagnostic::warning(
        W302,
        format!("removing unused module `{name}` from the design"),
        Loc::DUMMY,
    )
    .with_note("the module is never instantiated, or only its instances were seen")
}

/// Creates a warning for a non-synthesizable construct.
pub fn non_synthesizable(kind: ObjectKind, loc: Loc) -> Diagnostic {
    Diagnostic::warning(
        W303,
        format!("non-synthesizable object of kind `{kind}`"),
        loc,
    )
    .with_note("only the enclosed statement is kept")
}

/// Creates a warning for a struct access kept as a dotted name.
///
/// `declared` is the location of a declaration of `base` that is in scope
/// but not struct-typed.
pub fn dotted_fallback(base: &str, field: &str, loc: Loc, declared: Option<Loc>) -> Diagnostic {
    match declared {
        None => Diagnostic::warning(
            W304,
            format!("`{base}` is not in scope; field access kept as `{base}.{field}`"),
            loc,
        ),
        Some(decl) => Diagnostic::warning(
            W304,
            format!("`{base}` is not struct-typed; field access kept as `{base}.{field}`"),
            loc,
        )
        .with_label(Label::secondary(decl, format!("`{base}` declared here"))),
    }
}

/// Creates the debug trace note for a visited object.
pub fn trace_object(name: &str, kind: ObjectKind, depth: usize, loc: Loc) -> Diagnostic {
    let indent = " ".repeat(depth);
    Diagnostic::note(N300, format!("{indent}object `{name}` of kind `{kind}`"), loc)
}
