//! Mutable lowering state carried through the recursive walk.
//!
//! [`LowerCtx`] owns the tree under construction, the unit registry, the scope
//! table used by normalization, and the walker's frame stack. It borrows the
//! design database, the configuration, and the diagnostic sink for the whole
//! run.

use strata_ast::Ast;
use strata_config::LowerConfig;
use strata_db::{DesignDb, ObjHandle};
use strata_diagnostics::{Diagnostic, DiagnosticSink};
use strata_source::Loc;

use crate::errors;
use crate::frames::FrameStack;
use crate::registry::UnitRegistry;
use crate::scope::ScopeTable;

/// Mutable state carried through lowering.
pub struct LowerCtx<'a> {
    /// The design being read.
    pub db: &'a dyn DesignDb,
    /// Engine settings.
    pub config: &'a LowerConfig,
    /// Where user-facing diagnostics go.
    pub sink: &'a DiagnosticSink,
    /// The tree under construction.
    pub ast: Ast,
    /// Every top-level unit by name.
    pub registry: UnitRegistry,
    /// Declarations visible to the unit being normalized.
    pub scope: ScopeTable,
    /// Active lowering calls.
    pub frames: FrameStack,
    next_loop_id: u32,
    next_enum_id: u32,
    next_port_id: u32,
}

impl<'a> LowerCtx<'a> {
    /// Creates a context with an empty tree.
    pub fn new(db: &'a dyn DesignDb, config: &'a LowerConfig, sink: &'a DiagnosticSink) -> Self {
        Self {
            db,
            config,
            sink,
            ast: Ast::new(),
            registry: UnitRegistry::new(),
            scope: ScopeTable::new(),
            frames: FrameStack::new(),
            next_loop_id: 0,
            next_enum_id: 0,
            next_port_id: 1,
        }
    }

    /// Allocates a loop id, shared by `$loopN`, `$fordecl_blockN`, and
    /// streaming loops.
    pub fn fresh_loop_id(&mut self) -> u32 {
        let id = self.next_loop_id;
        self.next_loop_id += 1;
        id
    }

    /// Allocates an id for an anonymous enum.
    pub fn fresh_enum_id(&mut self) -> u32 {
        let id = self.next_enum_id;
        self.next_enum_id += 1;
        id
    }

    /// Allocates the next 1-based port position of the current unit.
    pub fn alloc_port_id(&mut self) -> u32 {
        let id = self.next_port_id;
        self.next_port_id += 1;
        id
    }

    /// Restarts port numbering for a new unit.
    pub fn reset_port_ids(&mut self) {
        self.next_port_id = 1;
    }

    /// Source location of a design object.
    pub fn loc(&self, h: ObjHandle) -> Loc {
        self.db.location(h)
    }

    /// Emits a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        self.sink.emit(diag);
    }

    /// Reports an object kind the walker has no rule for.
    pub fn report_unhandled(&self, h: ObjHandle) {
        let name = self.db.name(h).unwrap_or("");
        self.emit(errors::unhandled_object(
            self.db.kind(h),
            name,
            self.loc(h),
            self.config.stop_on_error,
        ));
    }

    /// Reports a typespec that is not supported in `context`.
    pub fn report_unhandled_typespec(&self, context: &str, typespec: ObjHandle) {
        let name = self.db.name(typespec).unwrap_or("");
        self.emit(errors::unhandled_typespec(
            context,
            self.db.kind(typespec),
            name,
            self.loc(typespec),
            self.config.stop_on_error,
        ));
    }
}
