//! Configuration types deserialized from `strata.toml`.

use serde::Deserialize;

/// Default length above which a specialized module's parameter string is hashed.
pub const DEFAULT_PARAMOD_NAME_LIMIT: usize = 60;

/// The top-level configuration parsed from `strata.toml`.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StrataConfig {
    /// Lowering engine settings.
    #[serde(default)]
    pub lower: LowerConfig,
    /// Diagnostic output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings for the lowering engine.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LowerConfig {
    /// Report unhandled input as errors instead of warnings.
    pub stop_on_error: bool,
    /// Drop immediate assertions instead of lowering them.
    pub no_assert: bool,
    /// Emit a trace note for every visited design object.
    pub debug: bool,
    /// Maximum parameter-string length embedded literally in a specialized
    /// module name; longer strings are replaced by a digest.
    pub paramod_name_limit: usize,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            stop_on_error: false,
            no_assert: false,
            debug: false,
            paramod_name_limit: DEFAULT_PARAMOD_NAME_LIMIT,
        }
    }
}

/// Diagnostic output settings.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// How diagnostics are printed.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Diagnostic rendering format.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable terminal output (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}
