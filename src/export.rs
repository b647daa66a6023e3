//! Document-export contract.
//!
//! The Word template addresses its fields positionally: placeholder
//! `B1` is the first merged row, `B2` the second, and so on. The engine
//! guarantees a stable, gap-free row order; this module turns a merged
//! table into the `B{n}` → value context the external templating step
//! substitutes, and checks the table against the certification
//! template's fixed field list. The templating step leaves placeholders
//! with no context entry untouched, so a short table shows up as raw
//! `{{B27}}` text in the document: worth a warning, never an error.

use serde_json::{Map, Value};
use tracing::warn;

use crate::merge::MergedTable;

/// Field captions of the certification template, in placeholder order
/// (`B1`..`B29`).
pub const TEMPLATE_FIELDS: [&str; 29] = [
    "Number of axles / wheels:",
    "Powered axles:",
    "Wheelbase :(mm)",
    "Axle(s) track 1/ 2: (mm)",
    "Length:(mm)",
    "Width:(mm)",
    "Height:(mm)",
    "Rear overhang:(mm)",
    "Mass of the vehicle with bodywork in running order:(kg)",
    "Technically permissable maximum laden mass:(kg)",
    "Distribution of this mass among the axles – 1 / 2:(kg)",
    "Technically perm. max mass on each axle – 1 / 2:(kg)",
    "Maximum permissible roof load:(kg)",
    "Maximum mass of trailer – braked / unbraked:(kg)",
    "Maximum mass of combination:(kg)",
    "Maximum vertical load at the coupling point for a trailer:(kg)",
    "Engine manufacturer:",
    "Engine code as marked on the engine:",
    "Working principle:",
    "Direct injection:",
    "Pure electric:",
    "Hybrid [electric] vehicle:",
    "Number and arrangement of cylinders:",
    "Capacity:( cm3)",
    "Fuel:",
    "Maximum net power:( kW/min -1)",
    "Clutch (type):",
    "Gearbox (type):",
    "Gear:",
];

/// Placeholder tag for a 0-based row index (`0` → `"B1"`).
pub fn placeholder_tag(index: usize) -> String {
    format!("B{}", index + 1)
}

/// Build the `B{n}` → final-value substitution context for a merged
/// table, as a JSON object.
pub fn placeholder_context(table: &MergedTable) -> Map<String, Value> {
    table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| (placeholder_tag(i), Value::String(row.value_final.clone())))
        .collect()
}

/// Compare a merged table against the template's expected field count.
///
/// Returns human-readable warnings (also logged); empty means the table
/// lines up with the template.
pub fn template_drift(table: &MergedTable) -> Vec<String> {
    let mut warnings = Vec::new();
    let expected = TEMPLATE_FIELDS.len();
    let actual = table.len();

    if actual < expected {
        warnings.push(format!(
            "merged table has {} rows but the template expects {}; placeholders B{}..B{} will stay unfilled",
            actual,
            expected,
            actual + 1,
            expected
        ));
    } else if actual > expected {
        warnings.push(format!(
            "merged table has {} rows but the template expects {}; rows beyond B{} are ignored by the template",
            actual, expected, expected
        ));
    }

    for w in &warnings {
        warn!("{}", w);
    }
    warnings
}
