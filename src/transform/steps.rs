//! Derivation steps.
//!
//! Each step is a declarative descriptor over an [`AttributeTable`]: if
//! its input key(s) are present it restructures or augments the table,
//! otherwise it is a no-op. Steps run in the fixed order their rule set
//! declares them: later steps may rely on keys earlier steps produced
//! or removed (the portal's `transmission_code` must run before
//! `drive_ratio`, which consumes the shared source row), so reordering
//! changes output.
//!
//! A present key whose value lacks the expected structure is a
//! [`DeriveError`]; the step leaves the original rows in place so the
//! offending value stays visible to the caller.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DeriveError, DeriveResult};
use crate::schema::SENTINEL;
use crate::table::AttributeTable;

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static pattern"));

/// How [`Step::CombinePair`] reduces each operand before joining them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum OperandRule {
    /// Use the operand as scraped.
    #[default]
    Verbatim,
    /// Reduce a textual range `"a-b"` to its upper bound.
    MaxOfRange,
    /// Reduce a delimited integer pair to its maximum.
    MaxOfPair { delim: char },
}

/// All available derivation steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Combine two split keys into one `"{left}/{right}"` row, removing
    /// the originals; optionally mirror the combined value into a second
    /// key (mass distribution doubles as the per-axle maximum).
    CombinePair {
        left: String,
        right: String,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mirror: Option<String>,
        #[serde(default)]
        operand: OperandRule,
    },

    /// Replace `source` with `target = "{constant}/{value}"`.
    PrefixConstant {
        source: String,
        target: String,
        constant: String,
    },

    /// Append `key = value` when `key` is absent.
    DefaultValue { key: String, value: String },

    /// Replace `source` with `target` holding the maximum of its
    /// delimited integer pair (a bare number stands as is).
    MaxOfPair {
        source: String,
        target: String,
        #[serde(default = "default_delim")]
        delim: char,
    },

    /// Split `source` on `/`: field 0 becomes `head`, the remaining
    /// segments (rejoined with `" / "`) become `tail`; `source` is removed.
    SplitSlash {
        source: String,
        head: String,
        tail: String,
    },

    /// Rewrite a `"a / b"` numeric pair in place as `"a/b"`, collapsing
    /// whole floats (`96.0` → `96`).
    NormalizeFloatPair { key: String },

    /// Derive a gearbox classification and a gear count from a compound
    /// transmission code. The classification comes from the marker letter
    /// of the first `/`-field, the count from its first integer substring.
    TransmissionCode {
        source: String,
        gearbox: String,
        gear: String,
    },

    /// Extract the second `/`-field of `source` into `target` and remove
    /// `source`.
    DriveRatio { source: String, target: String },

    /// Drop everything up to and including the first `/` of a value.
    StripLeadingSegment { key: String },
}

fn default_delim() -> char {
    '/'
}

impl Step {
    /// Apply this step to a table.
    pub fn apply(&self, table: &mut AttributeTable) -> DeriveResult<()> {
        match self {
            Step::CombinePair {
                left,
                right,
                target,
                mirror,
                operand,
            } => self.apply_combine_pair(table, left, right, target, mirror.as_deref(), *operand),
            Step::PrefixConstant {
                source,
                target,
                constant,
            } => self.apply_prefix_constant(table, source, target, constant),
            Step::DefaultValue { key, value } => self.apply_default_value(table, key, value),
            Step::MaxOfPair {
                source,
                target,
                delim,
            } => self.apply_max_of_pair(table, source, target, *delim),
            Step::SplitSlash { source, head, tail } => {
                self.apply_split_slash(table, source, head, tail)
            }
            Step::NormalizeFloatPair { key } => self.apply_normalize_float_pair(table, key),
            Step::TransmissionCode {
                source,
                gearbox,
                gear,
            } => self.apply_transmission_code(table, source, gearbox, gear),
            Step::DriveRatio { source, target } => self.apply_drive_ratio(table, source, target),
            Step::StripLeadingSegment { key } => self.apply_strip_leading_segment(table, key),
        }
    }

    fn apply_combine_pair(
        &self,
        table: &mut AttributeTable,
        left: &str,
        right: &str,
        target: &str,
        mirror: Option<&str>,
        operand: OperandRule,
    ) -> DeriveResult<()> {
        let (l, r) = match (table.get(left), table.get(right)) {
            (Some(l), Some(r)) => (l.to_string(), r.to_string()),
            _ => return Ok(()),
        };

        let l = reduce_operand(&l, operand, left)?;
        let r = reduce_operand(&r, operand, right)?;

        table.remove_all(left);
        table.remove_all(right);

        let combined = format!("{}/{}", l, r);
        table.push(target, combined.clone());
        if let Some(mirror) = mirror {
            table.push(mirror, combined);
        }
        Ok(())
    }

    fn apply_prefix_constant(
        &self,
        table: &mut AttributeTable,
        source: &str,
        target: &str,
        constant: &str,
    ) -> DeriveResult<()> {
        let Some(value) = table.get(source).map(str::to_string) else {
            return Ok(());
        };
        table.remove_all(source);
        table.push(target, format!("{}/{}", constant, value));
        Ok(())
    }

    fn apply_default_value(
        &self,
        table: &mut AttributeTable,
        key: &str,
        value: &str,
    ) -> DeriveResult<()> {
        if !table.contains_key(key) {
            table.push(key, value);
        }
        Ok(())
    }

    fn apply_max_of_pair(
        &self,
        table: &mut AttributeTable,
        source: &str,
        target: &str,
        delim: char,
    ) -> DeriveResult<()> {
        let Some(value) = table.get(source).map(str::to_string) else {
            return Ok(());
        };
        let max = max_from_pair(&value, delim).ok_or_else(|| DeriveError::BadPair {
            key: source.to_string(),
            delim,
            value: value.clone(),
        })?;
        table.remove_all(source);
        table.push(target, max.to_string());
        Ok(())
    }

    fn apply_split_slash(
        &self,
        table: &mut AttributeTable,
        source: &str,
        head: &str,
        tail: &str,
    ) -> DeriveResult<()> {
        let Some(value) = table.get(source).map(str::to_string) else {
            return Ok(());
        };
        let mut parts = value.split('/').map(str::trim);
        let head_value = parts.next().unwrap_or("").to_string();
        let tail_value = parts.collect::<Vec<_>>().join(" / ");

        table.push(head, head_value);
        table.push(tail, tail_value);
        table.remove_all(source);
        Ok(())
    }

    fn apply_normalize_float_pair(&self, table: &mut AttributeTable, key: &str) -> DeriveResult<()> {
        let Some(value) = table.get(key).map(str::to_string) else {
            return Ok(());
        };
        let bad = || DeriveError::BadFloatPair {
            key: key.to_string(),
            value: value.clone(),
        };
        let first = slash_field(&value, 0).ok_or_else(bad)?;
        let second = slash_field(&value, 1).ok_or_else(bad)?;
        let first: f64 = first.parse().map_err(|_| bad())?;
        let second: f64 = second.parse().map_err(|_| bad())?;

        // f64 Display already renders whole floats without the ".0".
        table.set_value(key, format!("{}/{}", first, second));
        Ok(())
    }

    fn apply_transmission_code(
        &self,
        table: &mut AttributeTable,
        source: &str,
        gearbox: &str,
        gear: &str,
    ) -> DeriveResult<()> {
        let Some(code) = table.get(source).map(str::to_string) else {
            return Ok(());
        };
        let marker = code
            .split('/')
            .next()
            .unwrap_or(code.as_str())
            .trim()
            .to_lowercase();

        // Classification before count: downstream logic assumes the
        // gearbox key exists once this step has run.
        let gearbox_value = if marker.contains('m') {
            "Manual"
        } else if marker.contains('a') {
            "Automatic"
        } else {
            SENTINEL
        };
        let gear_value = match FIRST_INTEGER.find(&marker) {
            Some(m) => m
                .as_str()
                .parse::<u64>()
                .map_err(|_| DeriveError::BadCount {
                    key: source.to_string(),
                    value: code.clone(),
                })?
                .to_string(),
            None => SENTINEL.to_string(),
        };

        table.push(gearbox, gearbox_value);
        table.push(gear, gear_value);
        Ok(())
    }

    fn apply_drive_ratio(
        &self,
        table: &mut AttributeTable,
        source: &str,
        target: &str,
    ) -> DeriveResult<()> {
        let Some(code) = table.get(source).map(str::to_string) else {
            return Ok(());
        };
        let ratio = slash_field(&code, 1).ok_or_else(|| DeriveError::MissingSegment {
            key: source.to_string(),
            index: 1,
            value: code.clone(),
        })?;
        table.push(target, ratio);
        table.remove_all(source);
        Ok(())
    }

    fn apply_strip_leading_segment(&self, table: &mut AttributeTable, key: &str) -> DeriveResult<()> {
        let Some(value) = table.get(key).map(str::to_string) else {
            return Ok(());
        };
        if let Some((_, rest)) = value.split_once('/') {
            table.set_value(key, rest.trim().to_string());
        }
        Ok(())
    }
}

fn reduce_operand(value: &str, rule: OperandRule, key: &str) -> DeriveResult<String> {
    match rule {
        OperandRule::Verbatim => Ok(value.to_string()),
        OperandRule::MaxOfRange => Ok(max_of_range(value)),
        OperandRule::MaxOfPair { delim } => max_from_pair(value, delim)
            .map(|n| n.to_string())
            .ok_or_else(|| DeriveError::BadPair {
                key: key.to_string(),
                delim,
                value: value.to_string(),
            }),
    }
}

/// Upper bound of a textual range: the last `-`-segment, trimmed.
pub fn max_of_range(value: &str) -> String {
    value.rsplit('-').next().unwrap_or(value).trim().to_string()
}

/// Maximum of a delimited integer pair; a bare number yields itself.
///
/// `None` when an operand is not an integer or the value has more than
/// two fields.
pub fn max_from_pair(value: &str, delim: char) -> Option<i64> {
    if value.contains(delim) {
        let mut parts = value.split(delim);
        let a: i64 = parts.next()?.trim().parse().ok()?;
        let b: i64 = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(a.max(b))
    } else {
        value.trim().parse().ok()
    }
}

/// The `index`-th `/`-separated field, trimmed.
pub fn slash_field(value: &str, index: usize) -> Option<String> {
    value.split('/').nth(index).map(|s| s.trim().to_string())
}
