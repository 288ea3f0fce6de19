//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use serde::Serialize;
use strata_source::SourceDb;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// warning[W300]: unhandled object kind: delay_control
///   --> rtl/top.sv:14
///    = note: ...
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, ansi: &str) -> String {
        if self.color {
            format!("\x1b[{ansi}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();

        let color = match diag.severity {
            crate::Severity::Error => "1;31",
            crate::Severity::Warning => "1;33",
            crate::Severity::Note => "1;36",
        };
        let head = self.paint(&format!("{}[{}]", diag.severity, diag.code), color);
        out.push_str(&format!("{head}: {}\n", diag.message));

        if !diag.loc.is_dummy() {
            out.push_str(&format!("  --> {}\n", source_db.resolve(diag.loc)));
        }

        for label in &diag.labels {
            if label.loc.is_dummy() {
                continue;
            }
            let marker = match label.style {
                LabelStyle::Primary => "^",
                LabelStyle::Secondary => "-",
            };
            out.push_str(&format!(
                "   {marker} {}: {}\n",
                source_db.resolve(label.loc),
                label.message
            ));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

/// Renders each diagnostic as a single-line JSON object.
#[derive(Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    severity: crate::Severity,
    code: String,
    message: &'a str,
    file: Option<String>,
    line: u32,
    notes: &'a [String],
    help: &'a [String],
}

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let file = source_db
            .path(diag.loc.file)
            .map(|p| p.display().to_string());
        let record = JsonDiagnostic {
            severity: diag.severity,
            code: diag.code.to_string(),
            message: &diag.message,
            file,
            line: diag.loc.line,
            notes: &diag.notes,
            help: &diag.help,
        };
        serde_json::to_string(&record).unwrap_or_else(|e| {
            format!("{{\"severity\":\"error\",\"message\":\"unserializable diagnostic: {e}\"}}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use crate::label::Label;
    use strata_source::Loc;

    #[test]
    fn render_warning_with_location() {
        let mut source_db = SourceDb::new();
        let file = source_db.add_file("top.sv");
        let diag = Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 300),
            "unhandled object kind: delay_control",
            Loc::new(file, 14),
        );
        let output = TerminalRenderer::new(false).render(&diag, &source_db);
        assert!(output.contains("warning[W300]: unhandled object kind: delay_control"));
        assert!(output.contains("--> top.sv:14"));
    }

    #[test]
    fn render_notes_help_and_labels() {
        let mut source_db = SourceDb::new();
        let file = source_db.add_file("pkg.sv");
        let diag = Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 302),
            "removing unused module",
            Loc::DUMMY,
        )
        .with_label(Label::secondary(Loc::new(file, 3), "instantiated here"))
        .with_note("no definition was found")
        .with_help("add the module source to the design");
        let output = TerminalRenderer::new(false).render(&diag, &source_db);
        assert!(!output.contains("-->"));
        assert!(output.contains("- pkg.sv:3: instantiated here"));
        assert!(output.contains("= note: no definition was found"));
        assert!(output.contains("= help: add the module source to the design"));
    }

    #[test]
    fn color_wraps_header() {
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Error, 300),
            "boom",
            Loc::DUMMY,
        );
        let output = TerminalRenderer::new(true).render(&diag, &SourceDb::new());
        assert!(output.starts_with("\x1b[1;31merror[E300]\x1b[0m: boom"));
    }

    #[test]
    fn json_line() {
        let mut source_db = SourceDb::new();
        let file = source_db.add_file("top.sv");
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Error, 301),
            "unhandled operation",
            Loc::new(file, 9),
        );
        let line = JsonRenderer.render(&diag, &source_db);
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["severity"], "error");
        assert_eq!(v["code"], "E301");
        assert_eq!(v["file"], "top.sv");
        assert_eq!(v["line"], 9);
        assert!(!line.contains('\n'));
    }
}
