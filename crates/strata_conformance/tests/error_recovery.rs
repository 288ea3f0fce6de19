//! Unsupported input is reported and skipped; the policy decides severity.

use strata_conformance::{lower, lower_with, make_config, DesignBuilder};
use strata_db::{MemDb, ObjectKind, Relation};
use strata_diagnostics::Severity;
use strata_lower::errors;

fn design_with_program() -> MemDb {
    let mut b = DesignBuilder::new();
    let program = b.db.obj(ObjectKind::Program).name("prog").finish();
    let n = b.net("n", &[(3, 0)]);
    b.define("top", &[]);
    b.top("top", &[(Relation::Processes, program), (Relation::Nets, n)]);
    b.finish()
}

#[test]
fn unhandled_object_is_a_warning_by_default() {
    let result = lower(&design_with_program());
    let w300 = result.with_code(errors::W300);
    assert_eq!(w300.len(), 1);
    assert_eq!(w300[0].severity, Severity::Warning);
    assert!(w300[0].message.contains("prog"));
    assert!(!result.has_errors);
    // lowering carried on past the unsupported object
    let top = result.unit("top");
    result.child(top, "n");
}

#[test]
fn stop_on_error_promotes_to_error() {
    let config = make_config("stop_on_error = true");
    let result = lower_with(&design_with_program(), &config.lower);
    assert_eq!(result.with_code(errors::E300).len(), 1);
    assert!(result.with_code(errors::W300).is_empty());
    assert!(result.has_errors);
    assert_eq!(result.error_count, 1);
}

#[test]
fn debug_traces_every_object() {
    let config = make_config("debug = true");
    let result = lower_with(&design_with_program(), &config.lower);
    let traces = result.with_code(errors::N300);
    assert!(traces.len() >= 3, "{}", traces.len());
    assert!(traces.iter().all(|d| d.severity == Severity::Note));
    assert!(lower(&design_with_program()).with_code(errors::N300).is_empty());
}

#[test]
fn delays_are_flagged_non_synthesizable() {
    let mut b = DesignBuilder::new();
    let lhs = b.reference("q");
    let rhs = b.int(1);
    let assign = b
        .db
        .obj(ObjectKind::Assignment)
        .flag(strata_db::IntProp::Blocking)
        .rel(Relation::Lhs, lhs)
        .rel(Relation::Rhs, rhs)
        .finish();
    let delay = b.db.obj(ObjectKind::DelayControl).rel(Relation::Stmt, assign).finish();
    let initial = b.db.obj(ObjectKind::Initial).rel(Relation::Stmt, delay).finish();
    b.define("top", &[]);
    b.top("top", &[(Relation::Processes, initial)]);
    let result = lower(&b.finish());
    assert_eq!(result.with_code(errors::W303).len(), 1);
    assert_eq!(result.warning_count, 1);
}
