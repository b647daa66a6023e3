//! Per-source transformation pipeline.
//!
//! [`transform`] takes one raw scraped listing and a [`SourceRules`] and
//! produces a finalized canonical table:
//!
//! ```text
//! rename → derivation steps → default-fill → value-clean → finalize
//! ```
//!
//! Cleaning and derivation failures never abort the run; the offending
//! rows keep their scraped text and every failure is recorded as an
//! attributable [`TransformIssue`] next to the table. Callers that want
//! fail-fast semantics use [`TransformOutcome::strict`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clean::clean_value;
use crate::error::{PipelineError, PipelineResult};
use crate::schema::{CanonicalSchema, SENTINEL};
use crate::table::{AttributeTable, RawPair};
use crate::transform::rules::SourceRules;

/// What kind of condition a [`TransformIssue`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A value matched a unit pattern but would not normalize.
    Cleaning,
    /// A derivation step found its key but not its structure.
    Derivation,
    /// A key found no home in the canonical schema and sorted to the
    /// tail. Expected, observable, non-fatal.
    Drift,
}

/// One attributable problem found while transforming a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformIssue {
    pub kind: IssueKind,
    /// Key of the row the issue is about.
    pub key: String,
    pub detail: String,
}

impl TransformIssue {
    /// Drift is observable but never blocks strict mode.
    pub fn is_blocking(&self) -> bool {
        self.kind != IssueKind::Drift
    }
}

/// A finalized canonical table plus everything that went wrong on the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOutcome {
    pub table: AttributeTable,
    pub issues: Vec<TransformIssue>,
}

impl TransformOutcome {
    /// True when no blocking (non-drift) issue was recorded.
    pub fn is_clean(&self) -> bool {
        !self.issues.iter().any(TransformIssue::is_blocking)
    }

    /// Fail-fast accessor: the table, or an error if any blocking issue
    /// was recorded.
    pub fn strict(self) -> PipelineResult<AttributeTable> {
        let blocking = self.issues.iter().filter(|i| i.is_blocking()).count();
        if blocking > 0 {
            return Err(PipelineError::UnresolvedIssues(blocking));
        }
        Ok(self.table)
    }
}

/// Transform one raw listing with a source rule set.
pub fn transform(raw: &[RawPair], rules: &SourceRules) -> TransformOutcome {
    let mut table = AttributeTable::from_raw(raw);
    table.rename_keys(&rules.rename);

    let mut issues = Vec::new();

    for step in &rules.steps {
        debug!(?step, "applying derivation step");
        if let Err(err) = step.apply(&mut table) {
            warn!(key = err.key(), %err, "derivation step failed; rows kept as scraped");
            issues.push(TransformIssue {
                kind: IssueKind::Derivation,
                key: err.key().to_string(),
                detail: err.to_string(),
            });
        }
    }

    fill_defaults(&mut table, &rules.required_defaults);

    for row in table.rows_mut() {
        match clean_value(Some(row.value.as_str())) {
            Ok(Some(cleaned)) => row.value = cleaned,
            Ok(None) => {}
            Err(err) => {
                warn!(key = %row.key, %err, "value kept as scraped");
                issues.push(TransformIssue {
                    kind: IssueKind::Cleaning,
                    key: row.key.clone(),
                    detail: err.to_string(),
                });
            }
        }
    }

    // Drift is reported before the row cap so unmapped keys the cap
    // would swallow still leave a trace.
    for row in table.rows() {
        if !rules.schema.contains(&row.key) {
            warn!(key = %row.key, "key has no canonical home; sorted to tail");
            issues.push(TransformIssue {
                kind: IssueKind::Drift,
                key: row.key.clone(),
                detail: "no canonical home; sorted after schema rows".to_string(),
            });
        }
    }

    let table = finalize(table, &rules.schema, rules.row_limit);

    TransformOutcome { table, issues }
}

/// Append the sentinel for every required key the source never reported.
pub fn fill_defaults(table: &mut AttributeTable, required: &[String]) {
    for key in required {
        if !table.contains_key(key) {
            table.push(key.clone(), SENTINEL);
        }
    }
}

/// Order rows by canonical-schema position, sort unknown keys after every
/// schema row (stable among themselves), collapse duplicate keys to the
/// first occurrence, and optionally truncate.
///
/// Idempotent: finalizing a finalized table changes nothing.
pub fn finalize(
    table: AttributeTable,
    schema: &CanonicalSchema,
    limit: Option<usize>,
) -> AttributeTable {
    let mut rows = table.into_rows();
    rows.sort_by_key(|row| schema.position(&row.key).unwrap_or(usize::MAX));

    let mut seen = HashSet::new();
    rows.retain(|row| seen.insert(row.key.clone()));

    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    AttributeTable::from(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::keys;
    use crate::transform::rules::{portal_rules, registry_rules};

    fn raw(pairs: &[(&str, &str)]) -> Vec<RawPair> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.to_string())))
            .collect()
    }

    fn registry_listing() -> Vec<RawPair> {
        raw(&[
            ("Eigenschappen - Aantal wielen", "4"),
            ("Afmetingen - Wielbasis", "261 cm"),
            ("As #1 - Spoorbreedte", "154 cm"),
            ("As #2 - Spoorbreedte", "154 cm"),
            ("Afmetingen - Lengte", "435 cm"),
            ("Afmetingen - Breedte", "178 cm"),
            ("Massa - Rijklaar gewicht", "1.395 kg"),
            ("Massa - Technisch limiet massa", "1.850 kg"),
            ("As #1 - Technisch limiet", "930 kg"),
            ("As #2 - Technisch limiet", "980 kg"),
            ("Trekkracht - Maximaal trekgewicht geremd", "1.500 kg"),
            ("Trekkracht - Maximaal trekgewicht ongeremd", "680 kg"),
            ("Massa - Maximum massa samenstelling", "3.350 kg"),
            ("Algemeen - Merk", "Volkswagen"),
            ("Motor - Aantal cilinders", "4"),
            ("Motor - Cilinderinhoud", "1.998 cm³"),
            ("Brandstof #1 - Brandstof\t", "Benzine"),
            ("Brandstof #1 - Vermogen", "110 kW"),
        ])
    }

    fn portal_listing() -> Vec<RawPair> {
        raw(&[
            ("14 Axles/Wheels", "2/4"),
            ("21 Powered axles", "1"),
            ("44 Distance axis 1-2", "2631"),
            ("47 Track Axis 1", "1521 - 1538"),
            ("48 Track Axis 2", "1526 - 1543"),
            ("40 Length", "4436"),
            ("41 Width", "1793"),
            ("42 Height", "1459"),
            ("43 Überhange f/b", "/ 869 - 869"),
            ("52 Netweight", "1339"),
            ("Wet Weigh Kg", "1.870 kg"),
            ("54 Axle guarantees v.", "930 - 980"),
            ("54 Axle guarantees b.", "1020 - 1020"),
            ("55 Roof load", "75"),
            ("57 braked", "600 / 1000"),
            ("58 unbraked", "450 / 1222"),
            ("67 Support load", "50 / 80"),
            ("25 Brand / Type", "Volkswagen / DADA / DFY"),
            ("27 Capacity:", "1.968 cm³"),
            ("Cylinder", "4"),
            ("Fuel code", "Diesel"),
            ("28 Power / n", "110.0 / 3500.5"),
            ("18 Transmission/IA", "m6/3.389"),
        ])
    }

    #[test]
    fn test_registry_end_to_end() {
        let rules = registry_rules();
        let outcome = transform(&registry_listing(), &rules);
        assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);

        let table = outcome.table;
        assert_eq!(table.len(), 30);
        assert_eq!(table.get(keys::AXLES_WHEELS), Some("2/4"));
        assert_eq!(table.get(keys::POWERED_AXLES), Some("1"));
        assert_eq!(table.get(keys::WHEELBASE), Some("2610"));
        assert_eq!(table.get(keys::AXLE_TRACK), Some("1540/1540"));
        assert_eq!(table.get(keys::LENGTH), Some("4350"));
        assert_eq!(table.get(keys::MASS_RUNNING_ORDER), Some("1395"));
        assert_eq!(table.get(keys::MASS_DISTRIBUTION), Some("930/980"));
        assert_eq!(table.get(keys::MAX_MASS_PER_AXLE), Some("930/980"));
        assert_eq!(table.get(keys::TRAILER_MASS), Some("1500/680"));
        assert_eq!(table.get(keys::COMBINATION_MASS), Some("3350"));
        assert_eq!(table.get(keys::CAPACITY), Some("1998"));
        assert_eq!(table.get(keys::MAX_NET_POWER), Some("110 kW"));
        // Source never reports these; the defaults fill them.
        assert_eq!(table.get(keys::HEIGHT), Some(SENTINEL));
        assert_eq!(table.get(keys::GEARBOX), Some(SENTINEL));
        // Row order is document order.
        assert_eq!(table.rows()[0].key, keys::AXLES_WHEELS);
        assert_eq!(table.rows()[29].key, keys::FINAL_DRIVE_RATIO);
    }

    #[test]
    fn test_portal_end_to_end() {
        let rules = portal_rules();
        let outcome = transform(&portal_listing(), &rules);
        assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);

        let table = outcome.table;
        assert_eq!(table.len(), 30);
        assert_eq!(table.get(keys::AXLE_TRACK), Some("1538/1543"));
        assert_eq!(table.get(keys::REAR_OVERHANG), Some("869 - 869"));
        assert_eq!(table.get(keys::MAX_LADEN_MASS), Some("1870"));
        assert_eq!(table.get(keys::MASS_DISTRIBUTION), Some("980/1020"));
        assert_eq!(table.get(keys::TRAILER_MASS), Some("1000/1222"));
        assert_eq!(table.get(keys::COUPLING_LOAD), Some("80"));
        assert_eq!(table.get(keys::ENGINE_MANUFACTURER), Some("Volkswagen"));
        assert_eq!(table.get(keys::ENGINE_CODE), Some("DADA / DFY"));
        assert_eq!(table.get(keys::MAX_NET_POWER), Some("110/3500.5"));
        assert_eq!(table.get(keys::GEARBOX), Some("Manual"));
        assert_eq!(table.get(keys::GEAR), Some("6"));
        assert_eq!(table.get(keys::FINAL_DRIVE_RATIO), Some("3.389"));
        assert_eq!(table.get(keys::COMBINATION_MASS), Some(SENTINEL));
        assert_eq!(table.get(keys::CLUTCH), Some(SENTINEL));
    }

    #[test]
    fn test_defaults_fill_exactly_once() {
        let rules = registry_rules();
        let outcome = transform(&registry_listing(), &rules);
        for key in &rules.required_defaults {
            let count = outcome.table.keys().filter(|&k| k == key.as_str()).count();
            assert_eq!(count, 1, "key {} appears {} times", key, count);
        }
    }

    #[test]
    fn test_unmapped_label_passes_through_and_reports_drift() {
        let rules = portal_rules();
        let mut listing = portal_listing();
        listing.push(("99 Bananas".to_string(), Some("yes".to_string())));

        let outcome = transform(&listing, &rules);
        // Passed through, sorted to the tail.
        let last = outcome.table.rows().last().unwrap();
        assert_eq!(last.key, "99 Bananas");
        assert_eq!(last.value, "yes");

        let drift: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::Drift)
            .collect();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].key, "99 Bananas");
        // Drift never blocks strict mode.
        assert!(outcome.is_clean());
        assert!(outcome.strict().is_ok());
    }

    #[test]
    fn test_registry_row_cap_drops_tail_keys() {
        let rules = registry_rules();
        let mut listing = registry_listing();
        listing.push(("Onbekend label".to_string(), Some("42".to_string())));

        let outcome = transform(&listing, &rules);
        // 30 schema rows fill the cap; the unmapped key is cut.
        assert_eq!(outcome.table.len(), 30);
        assert!(!outcome.table.contains_key("Onbekend label"));
    }

    #[test]
    fn test_bad_derivation_is_reported_not_fatal() {
        let rules = portal_rules();
        let listing = raw(&[
            ("57 braked", "six hundred"),
            ("58 unbraked", "450/1222"),
            ("40 Length", "4436"),
        ]);

        let outcome = transform(&listing, &rules);
        let derivation: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::Derivation)
            .collect();
        assert_eq!(derivation.len(), 1);
        assert_eq!(derivation[0].key, "Braked trailer");
        // Originals survive for diagnosis (tail-sorted, also drift).
        assert_eq!(outcome.table.get("Braked trailer"), Some("six hundred"));
        assert!(!outcome.is_clean());
        assert!(matches!(
            outcome.strict(),
            Err(PipelineError::UnresolvedIssues(1))
        ));
    }

    #[test]
    fn test_missing_keys_make_steps_noops() {
        let rules = portal_rules();
        let outcome = transform(&raw(&[("40 Length", "4436")]), &rules);
        // Only derivation outputs with inputs present, plus defaults.
        assert!(outcome
            .issues
            .iter()
            .all(|i| i.kind == IssueKind::Drift || !i.is_blocking()));
        assert_eq!(outcome.table.get(keys::LENGTH), Some("4436"));
        assert_eq!(outcome.table.get(keys::POWERED_AXLES), Some("1"));
        assert!(!outcome.table.contains_key(keys::AXLE_TRACK));
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let rules = registry_rules();
        let mut table = AttributeTable::new();
        table.push("Unknown B", "2");
        table.push(keys::LENGTH, "4350");
        table.push("Unknown A", "1");
        table.push(keys::AXLES_WHEELS, "2/4");
        table.push(keys::LENGTH, "9999");

        let once = finalize(table, &rules.schema, Some(30));
        let twice = finalize(once.clone(), &rules.schema, Some(30));
        assert_eq!(once, twice);

        // Schema rows first, duplicates collapsed to first occurrence,
        // unknown keys stable at the tail.
        let ordered: Vec<_> = once.keys().collect();
        assert_eq!(
            ordered,
            vec![keys::AXLES_WHEELS, keys::LENGTH, "Unknown B", "Unknown A"]
        );
        assert_eq!(once.get(keys::LENGTH), Some("4350"));
    }

    #[test]
    fn test_finalize_limit_truncates() {
        let mut table = AttributeTable::new();
        table.push(keys::AXLES_WHEELS, "2/4");
        table.push(keys::POWERED_AXLES, "1");
        table.push(keys::WHEELBASE, "2610");
        let schema = crate::schema::registry_schema();

        let capped = finalize(table, &schema, Some(2));
        assert_eq!(capped.len(), 2);
        assert!(!capped.contains_key(keys::WHEELBASE));
    }
}
