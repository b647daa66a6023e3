//! Error types for the cocload transformation engine.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CleanError`] - Value cleaning errors (unit normalization)
//! - [`DeriveError`] - Derivation step errors
//! - [`ConfigError`] - Rule-set loading errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. Schema drift
//! (an unmapped key sorting to the tail of the canonical order)
//! is deliberately *not* an error; it is reported as a transform
//! issue and logged, see [`crate::transform::TransformIssue`].

use thiserror::Error;

// =============================================================================
// Value Cleaning Errors
// =============================================================================

/// Errors while normalizing a single attribute value.
///
/// The offending raw value is always carried so the failure can be
/// attributed to a concrete scraped field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CleanError {
    /// A centimetre figure matched the unit pattern but does not fit
    /// a whole-millimetre representation.
    #[error("cannot convert '{number}' to millimetres in value '{raw}'")]
    BadCentimetreFigure { raw: String, number: String },
}

// =============================================================================
// Derivation Errors
// =============================================================================

/// Errors raised by derivation steps whose input key was present but
/// whose value did not have the expected structure.
///
/// A *missing* input key is never an error: steps are no-ops then.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeriveError {
    /// Expected a bare integer or a `delim`-separated integer pair.
    #[error("key '{key}': expected a number or '{delim}'-separated pair, got '{value}'")]
    BadPair {
        key: String,
        delim: char,
        value: String,
    },

    /// Expected two `/`-separated numeric fields (e.g. power/speed).
    #[error("key '{key}': expected numeric '/'-pair, got '{value}'")]
    BadFloatPair { key: String, value: String },

    /// A `/`-delimited segment the step extracts verbatim is absent.
    #[error("key '{key}': no '/'-segment {index} in '{value}'")]
    MissingSegment {
        key: String,
        index: usize,
        value: String,
    },

    /// The first integer substring of a code overflowed.
    #[error("key '{key}': unusable count in code '{value}'")]
    BadCount { key: String, value: String },
}

impl DeriveError {
    /// The input key the failing step was reading.
    pub fn key(&self) -> &str {
        match self {
            DeriveError::BadPair { key, .. }
            | DeriveError::BadFloatPair { key, .. }
            | DeriveError::MissingSegment { key, .. }
            | DeriveError::BadCount { key, .. } => key,
        }
    }
}

// =============================================================================
// Rule-Set Configuration Errors
// =============================================================================

/// Errors while loading a rule-set file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file.
    #[error("failed to read rule set: {0}")]
    Io(#[from] std::io::Error),

    /// Not valid JSON, or JSON that does not deserialize into a rule set.
    #[error("invalid rule set JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parsed but violated the embedded rule-set schema.
    #[error("rule set failed schema validation: {}", .0.join("; "))]
    Schema(Vec<String>),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors for callers driving a whole transform/merge run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Value cleaning error (strict mode).
    #[error("value cleaning error: {0}")]
    Clean(#[from] CleanError),

    /// Derivation error (strict mode).
    #[error("derivation error: {0}")]
    Derive(#[from] DeriveError),

    /// Rule-set configuration error.
    #[error("rule set error: {0}")]
    Config(#[from] ConfigError),

    /// Raw dump parsing error.
    #[error("raw dump error: {0}")]
    Dump(#[from] crate::parser::DumpError),

    /// Strict transform found attributable field issues.
    #[error("transformation left {0} unresolved field issue(s)")]
    UnresolvedIssues(usize),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for value cleaning.
pub type CleanResult<T> = Result<T, CleanError>;

/// Result type for derivation steps.
pub type DeriveResult<T> = Result<T, DeriveError>;

/// Result type for rule-set loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
