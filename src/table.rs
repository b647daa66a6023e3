//! Attribute tables.
//!
//! A scraped listing arrives as an ordered sequence of `(label, value)`
//! pairs; the transformation pipeline turns it into an [`AttributeTable`]
//! of canonical rows. Rows keep insertion order, and duplicate keys are
//! allowed while a table is under construction (a pairing step may append
//! its derived row before the originals are dropped); `finalize` is what
//! guarantees at most one row per retained canonical key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::SENTINEL;

/// One `(label, value)` pair as delivered by the scraping collaborator.
///
/// `None` means the source listed the attribute without a value.
pub type RawPair = (String, Option<String>);

/// A single attribute row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub key: String,
    pub value: String,
}

/// An ordered table of attribute rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTable {
    rows: Vec<Row>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw scraped pairs.
    ///
    /// Missing values become the [`SENTINEL`] so every downstream step
    /// operates on plain strings.
    pub fn from_raw(pairs: &[RawPair]) -> Self {
        let rows = pairs
            .iter()
            .map(|(label, value)| Row {
                key: label.clone(),
                value: value.clone().unwrap_or_else(|| SENTINEL.to_string()),
            })
            .collect();
        Self { rows }
    }

    /// Append a row.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.rows.push(Row {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Value of the first row with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove every row with `key`. Returns how many rows went away.
    pub fn remove_all(&mut self, key: &str) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| r.key != key);
        before - self.rows.len()
    }

    /// Replace the value of the first row with `key`, in place.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.rows.iter_mut().find(|r| r.key == key) {
            Some(row) => {
                row.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Apply a rename map to every key; unmapped keys pass through
    /// unchanged so upstream schema drift stays visible downstream.
    pub fn rename_keys(&mut self, rename: &HashMap<String, String>) {
        for row in &mut self.rows {
            if let Some(canonical) = rename.get(&row.key) {
                row.key = canonical.clone();
            }
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Row>> for AttributeTable {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, Option<&str>)]) -> Vec<RawPair> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(String::from)))
            .collect()
    }

    #[test]
    fn test_from_raw_maps_missing_values_to_sentinel() {
        let table = AttributeTable::from_raw(&raw(&[
            ("Length", Some("435 cm")),
            ("Height", None),
        ]));
        assert_eq!(table.get("Length"), Some("435 cm"));
        assert_eq!(table.get("Height"), Some(SENTINEL));
    }

    #[test]
    fn test_get_returns_first_occurrence() {
        let mut table = AttributeTable::new();
        table.push("Fuel", "Benzine");
        table.push("Fuel", "Diesel");
        assert_eq!(table.get("Fuel"), Some("Benzine"));
    }

    #[test]
    fn test_remove_all_drops_duplicates() {
        let mut table = AttributeTable::new();
        table.push("Fuel", "Benzine");
        table.push("Width", "1780");
        table.push("Fuel", "Diesel");
        assert_eq!(table.remove_all("Fuel"), 2);
        assert_eq!(table.len(), 1);
        assert!(!table.contains_key("Fuel"));
    }

    #[test]
    fn test_rename_keeps_unmapped_keys() {
        let mut rename = HashMap::new();
        rename.insert("Afmetingen - Lengte".to_string(), "Length".to_string());

        let mut table = AttributeTable::new();
        table.push("Afmetingen - Lengte", "435 cm");
        table.push("Mystery label", "42");
        table.rename_keys(&rename);

        assert!(table.contains_key("Length"));
        assert!(table.contains_key("Mystery label"));
    }

    #[test]
    fn test_serde_shape_is_a_plain_array() {
        let mut table = AttributeTable::new();
        table.push("Length", "4350");
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"[{"key":"Length","value":"4350"}]"#);
        let back: AttributeTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
