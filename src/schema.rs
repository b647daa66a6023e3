//! Canonical attribute schema for the certification document.
//!
//! The schema is the fixed, ordered list of attribute names the document
//! template expects, in document order. Two named variants exist, one per
//! source pipeline (`registry` and `portal`); they are intentionally kept
//! as distinct configurations even where their contents coincide, because
//! each mirrors the contract of its own source pipeline.

use serde::{Deserialize, Serialize};

/// Placeholder value for "source did not report this attribute".
pub const SENTINEL: &str = "None";

/// Canonical attribute names, in document order.
///
/// These are the join keys for the cross-source merge and the sort keys
/// for finalized tables, so they must match byte-for-byte across both
/// source rule sets (including the historical spelling of
/// [`keys::ENGINE_CODE`], which the document template inherited).
pub mod keys {
    pub const AXLES_WHEELS: &str = "Number of axles / wheels";
    pub const POWERED_AXLES: &str = "Powered axles";
    pub const WHEELBASE: &str = "Wheelbase";
    pub const AXLE_TRACK: &str = "Axle(s) track – 1 / 2";
    pub const LENGTH: &str = "Length";
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const REAR_OVERHANG: &str = "Rear overhang";
    pub const MASS_RUNNING_ORDER: &str = "Mass of the vehicle with bodywork in running order";
    pub const MAX_LADEN_MASS: &str = "Technically permissible maximum laden mass";
    pub const MASS_DISTRIBUTION: &str = "Distribution of this mass among the axles – 1 / 2";
    pub const MAX_MASS_PER_AXLE: &str = "Technically permissible max mass on each axle – 1 / 2";
    pub const ROOF_LOAD: &str = "Maximum permissible roof load";
    pub const TRAILER_MASS: &str = "Maximum mass of trailer – braked / unbraked";
    pub const COMBINATION_MASS: &str = "Maximum mass of combination";
    pub const COUPLING_LOAD: &str = "Maximum vertical load at the coupling point for a trailer";
    pub const ENGINE_MANUFACTURER: &str = "Engine manufacturer";
    pub const ENGINE_CODE: &str = "Engine code as marked on the enginee";
    pub const WORKING_PRINCIPLE: &str = "Working principle";
    pub const DIRECT_INJECTION: &str = "Direct injection";
    pub const PURE_ELECTRIC: &str = "Pure electric";
    pub const HYBRID: &str = "Hybrid [electric] vehicle";
    pub const CYLINDERS: &str = "Number and arrangement of cylinders";
    pub const CAPACITY: &str = "Capacity";
    pub const FUEL: &str = "Fuel";
    pub const MAX_NET_POWER: &str = "Maximum net power";
    pub const CLUTCH: &str = "Clutch";
    pub const GEARBOX: &str = "Gearbox";
    pub const GEAR: &str = "Gear";
    pub const FINAL_DRIVE_RATIO: &str = "Final drive ratio";
}

/// An ordered list of canonical keys.
///
/// Position in the schema defines output order; keys not present in the
/// schema sort after every schema key (see `transform::finalize`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSchema(Vec<String>);

impl CanonicalSchema {
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    /// Position of `key` in document order, if it is a schema key.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|k| k == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for CanonicalSchema {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn document_order() -> Vec<String> {
    [
        keys::AXLES_WHEELS,
        keys::POWERED_AXLES,
        keys::WHEELBASE,
        keys::AXLE_TRACK,
        keys::LENGTH,
        keys::WIDTH,
        keys::HEIGHT,
        keys::REAR_OVERHANG,
        keys::MASS_RUNNING_ORDER,
        keys::MAX_LADEN_MASS,
        keys::MASS_DISTRIBUTION,
        keys::MAX_MASS_PER_AXLE,
        keys::ROOF_LOAD,
        keys::TRAILER_MASS,
        keys::COMBINATION_MASS,
        keys::COUPLING_LOAD,
        keys::ENGINE_MANUFACTURER,
        keys::ENGINE_CODE,
        keys::WORKING_PRINCIPLE,
        keys::DIRECT_INJECTION,
        keys::PURE_ELECTRIC,
        keys::HYBRID,
        keys::CYLINDERS,
        keys::CAPACITY,
        keys::FUEL,
        keys::MAX_NET_POWER,
        keys::CLUTCH,
        keys::GEARBOX,
        keys::GEAR,
        keys::FINAL_DRIVE_RATIO,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Canonical schema used by the vehicle-registry pipeline.
pub fn registry_schema() -> CanonicalSchema {
    CanonicalSchema(document_order())
}

/// Canonical schema used by the certificate-portal pipeline.
pub fn portal_schema() -> CanonicalSchema {
    CanonicalSchema(document_order())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_positions_follow_document_order() {
        let schema = registry_schema();
        assert_eq!(schema.position(keys::AXLES_WHEELS), Some(0));
        assert_eq!(schema.position(keys::FINAL_DRIVE_RATIO), Some(29));
        assert_eq!(schema.position("Totally unknown"), None);
    }

    #[test]
    fn test_both_variants_have_thirty_keys() {
        assert_eq!(registry_schema().len(), 30);
        assert_eq!(portal_schema().len(), 30);
    }

    #[test]
    fn test_schema_serde_roundtrip() {
        let schema = portal_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: CanonicalSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
    }
}
