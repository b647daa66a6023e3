//! Cross-source merge.
//!
//! Two canonical tables, one per source, are reconciled into a single
//! authoritative table with per-field provenance. The document template
//! addresses rows by *position*, so the merge preserves order strictly:
//! side-A rows first, in A's order, then keys only B knows appended in
//! B's order. Any reordering here silently corrupts the exported
//! document.

use serde::{Deserialize, Serialize};

use crate::schema::SENTINEL;
use crate::table::AttributeTable;

/// One merged row with both source values and the chosen final value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRow {
    pub key: String,
    /// Value from side A (the registry, in the production pairing).
    pub value_a: Option<String>,
    /// Value from side B (the portal, in the production pairing).
    pub value_b: Option<String>,
    /// The authoritative value the document receives.
    pub value_final: String,
}

/// The reconciled table, ordered for positional export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergedTable {
    rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MergedRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Overwrite a row's final value. This is the one post-merge mutation
    /// the engine supports; the UI collaborator calls it for user edits.
    pub fn set_final(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.rows.iter_mut().find(|r| r.key == key) {
            Some(row) => {
                row.value_final = value.into();
                true
            }
            None => false,
        }
    }
}

/// Merge two canonical tables; `None` on both sides yields `None` (a
/// valid terminal state when neither source was reachable).
///
/// For keys both sides report, B wins unless its value is missing or the
/// sentinel; keys a single side reports keep that side's value verbatim.
pub fn merge(a: Option<&AttributeTable>, b: Option<&AttributeTable>) -> Option<MergedTable> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(one_sided(a, Side::A)),
        (None, Some(b)) => Some(one_sided(b, Side::B)),
        (Some(a), Some(b)) => Some(outer_join(a, b)),
    }
}

enum Side {
    A,
    B,
}

fn one_sided(table: &AttributeTable, side: Side) -> MergedTable {
    let mut rows = Vec::with_capacity(table.len());
    let mut seen = std::collections::HashSet::new();
    for row in table.rows() {
        if !seen.insert(row.key.as_str()) {
            continue;
        }
        let (value_a, value_b) = match side {
            Side::A => (Some(row.value.clone()), None),
            Side::B => (None, Some(row.value.clone())),
        };
        rows.push(MergedRow {
            key: row.key.clone(),
            value_a,
            value_b,
            value_final: row.value.clone(),
        });
    }
    MergedTable { rows }
}

fn outer_join(a: &AttributeTable, b: &AttributeTable) -> MergedTable {
    let mut rows = Vec::with_capacity(a.len().max(b.len()));
    let mut seen = std::collections::HashSet::new();

    for row in a.rows() {
        if !seen.insert(row.key.clone()) {
            continue;
        }
        let value_b = b.get(&row.key).map(String::from);
        let value_final = match &value_b {
            Some(vb) if vb != SENTINEL => vb.clone(),
            _ => row.value.clone(),
        };
        rows.push(MergedRow {
            key: row.key.clone(),
            value_a: Some(row.value.clone()),
            value_b,
            value_final,
        });
    }

    for row in b.rows() {
        if !seen.insert(row.key.clone()) {
            continue;
        }
        rows.push(MergedRow {
            key: row.key.clone(),
            value_a: None,
            value_b: Some(row.value.clone()),
            value_final: row.value.clone(),
        });
    }

    MergedTable { rows }
}
