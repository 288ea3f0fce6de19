//! Lowering from an elaborated design graph to the flat target tree.
//!
//! The walker in [`walker`] visits the design database top-down and builds a
//! [`strata_ast::Ast`] with one unit per module, interface, package, and
//! parameter specialization. Once a unit is complete, [`normalize`] flattens
//! its multi-dimensional declarations and rewrites struct member accesses
//! into bit ranges, so the output only contains single-range vectors and flat
//! names.
//!
//! # Usage
//!
//! ```ignore
//! let lowered = lower_design(&db, &config, &sink)?;
//! println!("{}", strata_ast::dump::dump(&lowered.ast, lowered.root));
//! ```

#![warn(missing_docs)]

mod arith;
pub mod context;
pub mod errors;
pub mod flatten;
pub mod frames;
pub mod memories;
pub mod merge;
pub mod normalize;
pub mod registry;
pub mod scope;
pub mod specialize;
pub mod struct_path;
pub mod walker;

use strata_ast::{Ast, NodeId};
use strata_common::{InternalError, StrataResult};
use strata_config::LowerConfig;
use strata_db::DesignDb;
use strata_diagnostics::DiagnosticSink;

use context::LowerCtx;

/// The result of lowering a design.
pub struct Lowered {
    /// The tree holding every lowered unit.
    pub ast: Ast,
    /// The DESIGN node; its children are the packages, then the units in
    /// registration order.
    pub root: NodeId,
}

impl Lowered {
    /// Names of the top-level units, in output order.
    pub fn unit_names(&self) -> Vec<&str> {
        self.ast
            .children(self.root)
            .iter()
            .map(|&unit| self.ast.name_of(unit))
            .collect()
    }

    /// Finds a top-level unit by name.
    pub fn unit(&self, name: &str) -> Option<NodeId> {
        self.ast
            .children(self.root)
            .iter()
            .copied()
            .find(|&unit| self.ast.name_of(unit) == name)
    }
}

/// Lowers the design rooted at `db.root()`.
///
/// User-facing errors are emitted to `sink`; only internal consistency
/// violations (a database without a root, a broken scope invariant) return
/// `Err`.
pub fn lower_design(db: &dyn DesignDb, config: &LowerConfig, sink: &DiagnosticSink) -> StrataResult<Lowered> {
    let root = db
        .root()
        .ok_or_else(|| InternalError::new("design database has no root object"))?;
    let mut ctx = LowerCtx::new(db, config, sink);
    let design = walker::design::process_design(&mut ctx, root)?;
    Ok(Lowered {
        ast: ctx.ast,
        root: design,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_db::{MemDb, ObjectKind, Relation};

    #[test]
    fn empty_database_is_internal_error() {
        let db = MemDb::new();
        let sink = DiagnosticSink::new();
        assert!(lower_design(&db, &LowerConfig::default(), &sink).is_err());
    }

    #[test]
    fn single_module_design() {
        let mut db = MemDb::new();
        let def = db.obj(ObjectKind::Module).name("work@top").finish();
        let top = db.obj(ObjectKind::Module).name("work@top").finish();
        let design = db
            .obj(ObjectKind::Design)
            .rel(Relation::AllModules, def)
            .rel(Relation::TopModules, top)
            .finish();
        db.set_root(design);
        let sink = DiagnosticSink::new();
        let lowered = lower_design(&db, &LowerConfig::default(), &sink).unwrap();
        assert_eq!(lowered.unit_names(), vec!["top"]);
        assert!(lowered.unit("top").is_some());
        assert!(!sink.has_errors());
    }
}
