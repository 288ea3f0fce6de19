//! Strata CLI, the command-line front end of the lowering engine.
//!
//! Provides `strata lower` to lower a design database into the flat target
//! tree and `strata dump-db` to validate and pretty-print a database file.

#![warn(missing_docs)]

mod dump_db;
mod lower;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Strata: lowers elaborated HDL designs into a flat netlist-ready tree.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Strata HDL lowering engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `strata.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lower a design database and print the resulting tree.
    Lower(LowerArgs),
    /// Validate a design database and print it as normalized JSON.
    DumpDb {
        /// Path to the design database (`.json`).
        design: String,
    },
}

/// Arguments for the `strata lower` subcommand.
#[derive(Parser, Debug)]
pub struct LowerArgs {
    /// Path to the design database (`.json`).
    pub design: String,

    /// Print only this top-level unit.
    #[arg(long)]
    pub top: Option<String>,

    /// Output format for the tree and diagnostics (overrides `strata.toml`).
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Report unhandled input as errors.
    #[arg(long)]
    pub stop_on_error: bool,

    /// Drop immediate assertions.
    #[arg(long)]
    pub no_assert: bool,

    /// Emit a trace note for every visited design object.
    #[arg(long)]
    pub debug: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Tree and diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && std::env::var_os("TERM").is_some(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Lower(ref args) => lower::run(args, &global),
        Command::DumpDb { ref design } => dump_db::run(design, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lower_default() {
        let cli = Cli::parse_from(["strata", "lower", "design.json"]);
        match cli.command {
            Command::Lower(ref args) => {
                assert_eq!(args.design, "design.json");
                assert!(args.top.is_none());
                assert!(args.format.is_none());
                assert!(!args.stop_on_error);
                assert!(!args.no_assert);
                assert!(!args.debug);
            }
            _ => panic!("expected Lower command"),
        }
    }

    #[test]
    fn parse_lower_with_args() {
        let cli = Cli::parse_from([
            "strata",
            "lower",
            "design.json",
            "--top",
            "soc",
            "--format",
            "json",
            "--stop-on-error",
            "--no-assert",
            "--debug",
        ]);
        match cli.command {
            Command::Lower(ref args) => {
                assert_eq!(args.top.as_deref(), Some("soc"));
                assert_eq!(args.format, Some(ReportFormat::Json));
                assert!(args.stop_on_error && args.no_assert && args.debug);
            }
            _ => panic!("expected Lower command"),
        }
    }

    #[test]
    fn parse_dump_db() {
        let cli = Cli::parse_from(["strata", "dump-db", "d.json"]);
        assert!(matches!(cli.command, Command::DumpDb { ref design } if design == "d.json"));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "strata",
            "--quiet",
            "--color",
            "never",
            "--config",
            "custom.toml",
            "dump-db",
            "d.json",
        ]);
        assert!(cli.quiet);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["strata", "lower", "d.json", "-q"]);
        assert!(cli.quiet);
    }
}
