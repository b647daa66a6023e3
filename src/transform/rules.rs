//! Source rule sets.
//!
//! A [`SourceRules`] value is the whole per-source configuration: the
//! rename map from raw scraped labels to canonical keys, the ordered
//! derivation steps, the required-defaults set, the canonical schema and
//! an optional row-count limit. Rule sets are plain data: they load
//! from JSON (see [`crate::validation`] for the schema check) and the
//! two production sources ship as builtin constructors.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::schema::{keys, portal_schema, registry_schema, CanonicalSchema};
use crate::transform::steps::{OperandRule, Step};

fn default_version() -> String {
    "1.0".to_string()
}

/// Which production source a raw listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// National vehicle-registry site (Dutch attribute labels).
    Registry,
    /// Certificate-of-conformity portal (numbered attribute labels).
    Portal,
}

/// A complete transformation rule set for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRules {
    /// Version of the rule-set format.
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Raw label → canonical-ish key. Exact match; unmapped labels pass
    /// through unchanged.
    pub rename: HashMap<String, String>,

    /// Derivation steps, executed in declaration order.
    pub steps: Vec<Step>,

    /// Keys appended with the sentinel when the source never reported them.
    #[serde(default)]
    pub required_defaults: Vec<String>,

    /// Canonical key ordering for this pipeline.
    pub schema: CanonicalSchema,

    /// Optional cap on finalized row count (historical output contract of
    /// the registry pipeline).
    #[serde(default)]
    pub row_limit: Option<usize>,
}

impl SourceRules {
    /// Parse a rule set from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a rule set from a JSON value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// All raw labels this rule set knows how to rename.
    pub fn known_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.rename.keys().cloned().collect();
        labels.sort();
        labels
    }
}

/// Builtin rule set for the vehicle-registry source.
pub static REGISTRY_RULES: Lazy<SourceRules> = Lazy::new(registry_rules);

/// Builtin rule set for the certificate-portal source.
pub static PORTAL_RULES: Lazy<SourceRules> = Lazy::new(portal_rules);

/// Builtin rule set for a source.
pub fn rules_for(source: Source) -> &'static SourceRules {
    match source {
        Source::Registry => &REGISTRY_RULES,
        Source::Portal => &PORTAL_RULES,
    }
}

/// Rule set for the vehicle-registry source.
///
/// Registry listings carry Dutch labels, centimetre lengths and
/// dotted-thousands masses; axle figures arrive split per axle.
pub fn registry_rules() -> SourceRules {
    let rename: HashMap<String, String> = [
        ("Eigenschappen - Aantal wielen", "wheel"),
        ("Afmetingen - Wielbasis", keys::WHEELBASE),
        ("As #1 - Spoorbreedte", "Axle track  1"),
        ("As #2 - Spoorbreedte", "Axle track  2"),
        ("Afmetingen - Lengte", keys::LENGTH),
        ("Afmetingen - Breedte", keys::WIDTH),
        ("Massa - Rijklaar gewicht", keys::MASS_RUNNING_ORDER),
        ("Massa - Technisch limiet massa", keys::MAX_LADEN_MASS),
        (
            "As #1 - Technisch limiet",
            "Distribution of this mass among the axles – 1",
        ),
        (
            "As #2 - Technisch limiet",
            "Distribution of this mass among the axles – 2",
        ),
        ("Trekkracht - Maximaal trekgewicht geremd", "Braked"),
        ("Trekkracht - Maximaal trekgewicht ongeremd", "Unbraked"),
        ("Massa - Maximum massa samenstelling", keys::COMBINATION_MASS),
        ("Algemeen - Merk", keys::ENGINE_MANUFACTURER),
        ("Motor - Aantal cilinders", keys::CYLINDERS),
        ("Motor - Cilinderinhoud", keys::CAPACITY),
        // The registry renders this label with a trailing tab.
        ("Brandstof #1 - Brandstof\t", keys::FUEL),
        ("Brandstof #1 - Vermogen", keys::MAX_NET_POWER),
    ]
    .into_iter()
    .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
    .collect();

    let steps = vec![
        // The registry reports the wheel count only; every vehicle it
        // lists has two axles.
        Step::PrefixConstant {
            source: "wheel".into(),
            target: keys::AXLES_WHEELS.into(),
            constant: "2".into(),
        },
        Step::DefaultValue {
            key: keys::POWERED_AXLES.into(),
            value: "1".into(),
        },
        Step::CombinePair {
            left: "Axle track  1".into(),
            right: "Axle track  2".into(),
            target: keys::AXLE_TRACK.into(),
            mirror: None,
            operand: OperandRule::Verbatim,
        },
        Step::CombinePair {
            left: "Distribution of this mass among the axles – 1".into(),
            right: "Distribution of this mass among the axles – 2".into(),
            target: keys::MASS_DISTRIBUTION.into(),
            mirror: Some(keys::MAX_MASS_PER_AXLE.into()),
            operand: OperandRule::Verbatim,
        },
        Step::CombinePair {
            left: "Braked".into(),
            right: "Unbraked".into(),
            target: keys::TRAILER_MASS.into(),
            mirror: None,
            operand: OperandRule::Verbatim,
        },
    ];

    let required_defaults = [
        keys::HEIGHT,
        keys::REAR_OVERHANG,
        keys::ROOF_LOAD,
        keys::COUPLING_LOAD,
        keys::ENGINE_CODE,
        keys::WORKING_PRINCIPLE,
        keys::DIRECT_INJECTION,
        keys::PURE_ELECTRIC,
        keys::HYBRID,
        keys::FUEL,
        keys::CLUTCH,
        keys::GEARBOX,
        keys::GEAR,
        keys::FINAL_DRIVE_RATIO,
    ]
    .into_iter()
    .map(String::from)
    .collect();

    SourceRules {
        version: default_version(),
        description: "Vehicle-registry listing to certification table".into(),
        rename,
        steps,
        required_defaults,
        schema: registry_schema(),
        row_limit: Some(30),
    }
}

/// Rule set for the certificate-portal source.
///
/// Portal listings already use certificate vocabulary but express axle
/// guarantees and trailer masses as tolerance pairs, and fold engine and
/// transmission data into compound `/`-coded fields.
pub fn portal_rules() -> SourceRules {
    let rename: HashMap<String, String> = [
        ("14 Axles/Wheels", keys::AXLES_WHEELS),
        ("21 Powered axles", keys::POWERED_AXLES),
        ("44 Distance axis 1-2", keys::WHEELBASE),
        ("47 Track Axis 1", "Axle(s) track – 1"),
        ("48 Track Axis 2", "Axle(s) track – 2"),
        ("40 Length", keys::LENGTH),
        ("41 Width", keys::WIDTH),
        ("42 Height", keys::HEIGHT),
        ("43 Überhange f/b", keys::REAR_OVERHANG),
        ("52 Netweight", keys::MASS_RUNNING_ORDER),
        ("Wet Weigh Kg", keys::MAX_LADEN_MASS),
        (
            "54 Axle guarantees v.",
            "Distribution of this mass among the axles - 1",
        ),
        (
            "54 Axle guarantees b.",
            "Distribution of this mass among the axles - 2",
        ),
        ("55 Roof load", keys::ROOF_LOAD),
        ("57 braked", "Braked trailer"),
        ("58 unbraked", "Unbraked trailer"),
        ("67 Support load", "Support load"),
        ("25 Brand / Type", "Brand / Type"),
        ("27 Capacity:", keys::CAPACITY),
        ("Cylinder", keys::CYLINDERS),
        ("Fuel code", keys::FUEL),
        ("28 Power / n", keys::MAX_NET_POWER),
        ("18 Transmission/IA", "Transmission/IA"),
    ]
    .into_iter()
    .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
    .collect();

    let steps = vec![
        Step::CombinePair {
            left: "Axle(s) track – 1".into(),
            right: "Axle(s) track – 2".into(),
            target: keys::AXLE_TRACK.into(),
            mirror: None,
            operand: OperandRule::MaxOfRange,
        },
        Step::DefaultValue {
            key: keys::POWERED_AXLES.into(),
            value: "1".into(),
        },
        Step::CombinePair {
            left: "Braked trailer".into(),
            right: "Unbraked trailer".into(),
            target: keys::TRAILER_MASS.into(),
            mirror: None,
            operand: OperandRule::MaxOfPair { delim: '/' },
        },
        // Portal axle guarantees come as "v. 930 - 980" pairs with an
        // ASCII hyphen, unlike the en-dash the canonical keys carry.
        Step::CombinePair {
            left: "Distribution of this mass among the axles - 1".into(),
            right: "Distribution of this mass among the axles - 2".into(),
            target: keys::MASS_DISTRIBUTION.into(),
            mirror: Some(keys::MAX_MASS_PER_AXLE.into()),
            operand: OperandRule::MaxOfPair { delim: '-' },
        },
        Step::MaxOfPair {
            source: "Support load".into(),
            target: keys::COUPLING_LOAD.into(),
            delim: '/',
        },
        Step::SplitSlash {
            source: "Brand / Type".into(),
            head: keys::ENGINE_MANUFACTURER.into(),
            tail: keys::ENGINE_CODE.into(),
        },
        Step::NormalizeFloatPair {
            key: keys::MAX_NET_POWER.into(),
        },
        Step::TransmissionCode {
            source: "Transmission/IA".into(),
            gearbox: keys::GEARBOX.into(),
            gear: keys::GEAR.into(),
        },
        Step::DriveRatio {
            source: "Transmission/IA".into(),
            target: keys::FINAL_DRIVE_RATIO.into(),
        },
        Step::StripLeadingSegment {
            key: keys::REAR_OVERHANG.into(),
        },
    ];

    let required_defaults = [
        keys::COMBINATION_MASS,
        keys::WORKING_PRINCIPLE,
        keys::DIRECT_INJECTION,
        keys::PURE_ELECTRIC,
        keys::HYBRID,
        keys::CLUTCH,
    ]
    .into_iter()
    .map(String::from)
    .collect();

    SourceRules {
        version: default_version(),
        description: "Certificate-portal listing to certification table".into(),
        rename,
        steps,
        required_defaults,
        schema: portal_schema(),
        row_limit: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_serde_roundtrip() {
        for rules in [registry_rules(), portal_rules()] {
            let json = rules.to_json().unwrap();
            let parsed = SourceRules::from_json(&json).unwrap();
            assert_eq!(parsed, rules);
        }
    }

    #[test]
    fn test_registry_keeps_its_historical_row_cap() {
        assert_eq!(registry_rules().row_limit, Some(30));
        assert_eq!(portal_rules().row_limit, None);
    }

    #[test]
    fn test_required_defaults_are_schema_keys() {
        for rules in [registry_rules(), portal_rules()] {
            for key in &rules.required_defaults {
                assert!(rules.schema.contains(key), "not a schema key: {}", key);
            }
        }
    }

    #[test]
    fn test_rename_targets_reach_the_schema() {
        // Every rename target is either a canonical key or an
        // intermediate consumed by a later step.
        let intermediates = [
            "wheel",
            "Axle track  1",
            "Axle track  2",
            "Axle(s) track – 1",
            "Axle(s) track – 2",
            "Distribution of this mass among the axles – 1",
            "Distribution of this mass among the axles – 2",
            "Distribution of this mass among the axles - 1",
            "Distribution of this mass among the axles - 2",
            "Braked",
            "Unbraked",
            "Braked trailer",
            "Unbraked trailer",
            "Support load",
            "Brand / Type",
            "Transmission/IA",
        ];
        for rules in [registry_rules(), portal_rules()] {
            for target in rules.rename.values() {
                assert!(
                    rules.schema.contains(target) || intermediates.contains(&target.as_str()),
                    "rename target neither canonical nor intermediate: {}",
                    target
                );
            }
        }
    }

    #[test]
    fn test_rules_for_maps_sources() {
        assert_eq!(rules_for(Source::Registry).row_limit, Some(30));
        assert!(rules_for(Source::Portal)
            .rename
            .contains_key("18 Transmission/IA"));
    }
}
