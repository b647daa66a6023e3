//! JSON Schema validation for rule-set files.
//!
//! Builtin rule sets are constructed in code and always well-formed;
//! user-supplied rule-set files are validated against an embedded JSON
//! Schema (Draft 7) before deserialization so a typo in a step
//! descriptor surfaces as a config error with a pointable message, not
//! as a half-applied pipeline.
//!
//! The schema is embedded at compile time from `schemas/`:
//! - `source-rules.json`

use std::path::Path;

use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::transform::rules::SourceRules;

/// Validate a JSON object against a JSON schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with every violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Boolean-only variant of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

fn rules_schema() -> Value {
    serde_json::from_str(include_str!("../../schemas/source-rules.json"))
        .expect("Invalid embedded schema")
}

/// Validate a JSON value against the rule-set schema.
pub fn validate_source_rules(data: &Value) -> Result<(), Vec<String>> {
    validate(&rules_schema(), data)
}

/// Quick check against the rule-set schema.
pub fn is_valid_source_rules(data: &Value) -> bool {
    is_valid(&rules_schema(), data)
}

/// Load a rule-set file: read, schema-validate, deserialize.
pub fn load_rules_file<P: AsRef<Path>>(path: P) -> ConfigResult<SourceRules> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    validate_source_rules(&value).map_err(ConfigError::Schema)?;
    Ok(SourceRules::from_value(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::rules::{portal_rules, registry_rules};
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_builtin_rules_pass_the_schema() {
        for rules in [registry_rules(), portal_rules()] {
            let value = serde_json::to_value(&rules).unwrap();
            if let Err(errors) = validate_source_rules(&value) {
                panic!("builtin rules rejected: {:?}", errors);
            }
        }
    }

    #[test]
    fn test_missing_rename_is_rejected() {
        let value = json!({
            "steps": [],
            "schema": ["Length"]
        });
        assert!(!is_valid_source_rules(&value));
        let errors = validate_source_rules(&value).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unknown_step_type_is_rejected() {
        let value = json!({
            "rename": {},
            "steps": [{ "type": "explode", "key": "Length" }],
            "schema": ["Length"]
        });
        assert!(!is_valid_source_rules(&value));
    }

    #[test]
    fn test_bad_delim_is_rejected() {
        let value = json!({
            "rename": {},
            "steps": [{
                "type": "max_of_pair",
                "source": "a",
                "target": "b",
                "delim": "//"
            }],
            "schema": ["Length"]
        });
        assert!(!is_valid_source_rules(&value));
    }

    #[test]
    fn test_load_rules_file_roundtrip() {
        let rules = portal_rules();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", rules.to_json().unwrap()).unwrap();

        let loaded = load_rules_file(file.path()).unwrap();
        assert_eq!(loaded, rules);
    }

    #[test]
    fn test_load_rules_file_schema_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!({ "steps": [] })).unwrap();

        let err = load_rules_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }
}
