//! Diagnostic creation, severity management, and rendering.
//!
//! Lowering reports every non-fatal problem as a structured [`Diagnostic`]
//! carrying a code, a message, and the file/line of the design object that
//! triggered it. The thread-safe [`DiagnosticSink`] accumulates them for the
//! whole run, and [`DiagnosticRenderer`] implementations format them for a
//! terminal or as JSON lines.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
