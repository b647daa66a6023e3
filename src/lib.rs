//! # cocload - vehicle homologation attribute transformation
//!
//! cocload converts vehicle attribute listings scraped from two
//! incompatible source sites (a national vehicle registry and a
//! certificate-of-conformity portal) into one canonical, ordered table
//! and merges the per-source tables into the authoritative table a
//! certification document is filled from.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐    ┌────────────┐    ┌─────────────┐    ┌────────────┐
//! │  Raw dump  │───▶│   Parser   │───▶│  Transform  │───▶│   Merge    │
//! │ (any enc.) │    │ (auto-enc) │    │ (rule sets) │    │ (A ⊎ B)    │
//! └────────────┘    └────────────┘    └─────────────┘    └────────────┘
//!                                                              │
//!                                                      ┌───────▼──────┐
//!                                                      │ B{n} context │
//!                                                      │ (docx tmpl)  │
//!                                                      └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use cocload::{merge, transform, rules_for, Source};
//!
//! let raw = vec![("40 Length".to_string(), Some("4436".to_string()))];
//! let outcome = transform(&raw, rules_for(Source::Portal));
//! let merged = merge(None, Some(&outcome.table)).unwrap();
//! assert_eq!(merged.get("Length").unwrap().value_final, "4436");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`schema`] - Canonical keys, schema variants and the sentinel
//! - [`table`] - Attribute tables
//! - [`clean`] - Unit-aware value cleaning
//! - [`transform`] - Rule sets, derivation steps and the pipeline
//! - [`merge`] - Cross-source merge with provenance
//! - [`export`] - Positional placeholder context for the document
//! - [`parser`] - Raw dump parsing with auto-detection
//! - [`validation`] - Rule-set schema validation

// Core modules
pub mod error;
pub mod schema;
pub mod table;

// Cleaning
pub mod clean;

// Transformation
pub mod transform;

// Merge
pub mod merge;

// Export contract
pub mod export;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CleanError, CleanResult, ConfigError, ConfigResult, DeriveError, DeriveResult, PipelineError,
    PipelineResult,
};

// =============================================================================
// Re-exports - Schema and tables
// =============================================================================

pub use schema::{keys, portal_schema, registry_schema, CanonicalSchema, SENTINEL};
pub use table::{AttributeTable, RawPair, Row};

// =============================================================================
// Re-exports - Cleaning
// =============================================================================

pub use clean::clean_value;

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::pipeline::{
    fill_defaults, finalize, transform, IssueKind, TransformIssue, TransformOutcome,
};
pub use transform::rules::{
    portal_rules, registry_rules, rules_for, Source, SourceRules, PORTAL_RULES, REGISTRY_RULES,
};
pub use transform::steps::{max_from_pair, max_of_range, slash_field, OperandRule, Step};

// =============================================================================
// Re-exports - Merge
// =============================================================================

pub use merge::{merge, MergedRow, MergedTable};

// =============================================================================
// Re-exports - Export contract
// =============================================================================

pub use export::{placeholder_context, placeholder_tag, template_drift, TEMPLATE_FIELDS};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, pairs_from_json, parse_dump_bytes,
    parse_dump_file, parse_pairs, DumpError, RawDump,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    is_valid, is_valid_source_rules, load_rules_file, validate, validate_source_rules,
};
