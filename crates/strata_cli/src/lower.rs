//! `strata lower`: the lowering pipeline.
//!
//! 1. Load config (`--config` file, or `strata.toml` in the working directory)
//! 2. Apply command-line overrides
//! 3. Load and validate the design database
//! 4. Lower the design
//! 5. Print the tree to stdout and the diagnostics to stderr

use std::path::Path;

use strata_config::{LowerConfig, OutputFormat, StrataConfig};
use strata_db::{DesignDb, MemDb};
use strata_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, JsonRenderer, Severity, TerminalRenderer};
use strata_lower::Lowered;

use crate::{GlobalArgs, LowerArgs, ReportFormat};

/// Runs the `strata lower` command.
///
/// Returns exit code 0 if no error diagnostic was emitted, 1 otherwise.
pub fn run(args: &LowerArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let lower_config = merge_lower_config(&config.lower, args);
    let format = args.format.unwrap_or(match config.output.format {
        OutputFormat::Text => ReportFormat::Text,
        OutputFormat::Json => ReportFormat::Json,
    });

    let db = MemDb::load(Path::new(&args.design))?;
    let sink = DiagnosticSink::new();
    let lowered = strata_lower::lower_design(&db, &lower_config, &sink)?;

    let diagnostics = sink.diagnostics();
    report(&diagnostics, &db, format, global);

    let tree = render_tree(&lowered, args.top.as_deref(), format)?;
    println!("{tree}");

    if !global.quiet && format == ReportFormat::Text {
        eprintln!(
            "   Lowered {} unit(s): {} error(s), {} warning(s)",
            lowered.unit_names().len(),
            sink.count(Severity::Error),
            sink.count(Severity::Warning)
        );
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Loads the configuration named by `--config`, or `strata.toml` from the
/// working directory.
pub fn load_config(global: &GlobalArgs) -> Result<StrataConfig, Box<dyn std::error::Error>> {
    match &global.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(strata_config::load_config_from_str(&content)?)
        }
        None => Ok(strata_config::load_config(&std::env::current_dir()?)?),
    }
}

/// Command-line flags only ever switch settings on.
fn merge_lower_config(config: &LowerConfig, args: &LowerArgs) -> LowerConfig {
    LowerConfig {
        stop_on_error: config.stop_on_error || args.stop_on_error,
        no_assert: config.no_assert || args.no_assert,
        debug: config.debug || args.debug,
        paramod_name_limit: config.paramod_name_limit,
    }
}

fn report(diagnostics: &[Diagnostic], db: &MemDb, format: ReportFormat, global: &GlobalArgs) {
    let visible = diagnostics
        .iter()
        .filter(|d| !global.quiet || d.severity == Severity::Error);
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in visible {
                eprint!("{}", renderer.render(diag, db.sources()));
            }
        }
        ReportFormat::Json => {
            for diag in visible {
                eprintln!("{}", JsonRenderer.render(diag, db.sources()));
            }
        }
    }
}

/// Renders the lowered design, or only the unit named `top`.
pub fn render_tree(lowered: &Lowered, top: Option<&str>, format: ReportFormat) -> Result<String, Box<dyn std::error::Error>> {
    let root = match top {
        Some(name) => lowered
            .unit(name)
            .ok_or_else(|| format!("top unit `{name}` not found in the lowered design"))?,
        None => lowered.root,
    };
    Ok(match format {
        ReportFormat::Text => strata_ast::dump::dump(&lowered.ast, root),
        ReportFormat::Json => strata_ast::dump::to_json(&lowered.ast, root)?,
    })
}
