//! Feature alignment for the heart disease classifier.
//!
//! Callers send a loosely shaped JSON record of feature values. The model
//! only understands a fixed-width vector ordered exactly as it was during
//! training. This crate owns that boundary: [`align`] projects a
//! [`FeatureRecord`] onto a [`ColumnSchema`] and nothing else in the
//! workspace touches the dynamic record.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use serde_json::Value;

/// Value used for every schema column the record does not provide.
pub const FILL_VALUE: f32 = 0.0;

/// A caller-supplied mapping of feature name to value for one prediction.
pub type FeatureRecord = serde_json::Map<String, Value>;

/// The ordered list of feature names a model expects at inference time.
///
/// The order is the order the classifier was trained on; reordering the
/// columns silently corrupts predictions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    /// Creates a schema from an ordered list of column names.
    ///
    /// # Errors
    ///
    /// Returns an error if a column name appears more than once.
    pub fn new(columns: Vec<String>) -> anyhow::Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                bail!("duplicate column `{column}` in schema");
            }
        }

        Ok(Self { columns })
    }

    /// Loads a schema persisted as a JSON array of column names.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a JSON array of
    /// strings, or contains duplicate names.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read column schema {}", path.display()))?;
        let columns: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid column schema {}", path.display()))?;

        Self::new(columns).with_context(|| format!("invalid column schema {}", path.display()))
    }

    /// Writes the schema in the format [`ColumnSchema::load`] reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(&self.columns)?;
        std::fs::write(path, raw)
            .with_context(|| format!("failed to write column schema {}", path.display()))
    }

    /// Number of columns, i.e. the width of every aligned row.
    pub const fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    pub const fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The column names in training order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

/// A single row of model input, ordered per the [`ColumnSchema`] it was
/// aligned against.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub values: Vec<f32>,
}

impl AlignedRow {
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Projects a feature record onto the schema's column order.
///
/// Schema columns missing from the record (or explicitly `null`) are filled
/// with [`FILL_VALUE`]. Record fields the schema does not name are dropped
/// without being inspected.
///
/// # Errors
///
/// Returns an error if a schema column holds a value that is neither a
/// number nor a boolean.
pub fn align(record: &FeatureRecord, schema: &ColumnSchema) -> anyhow::Result<AlignedRow> {
    let values = schema
        .iter()
        .map(|column| match record.get(column) {
            Some(value) => feature_value(column, value),
            None => Ok(FILL_VALUE),
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(AlignedRow { values })
}

/// Converts one JSON value to a model input.
#[expect(clippy::cast_possible_truncation)]
fn feature_value(column: &str, value: &Value) -> anyhow::Result<f32> {
    match value {
        Value::Null => Ok(FILL_VALUE),
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number
            .as_f64()
            .map(|v| v as f32)
            .with_context(|| format!("column `{column}` is not representable as a float")),
        Value::String(_) | Value::Array(_) | Value::Object(_) => {
            bail!("column `{column}` has non-numeric value {value}")
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn schema(columns: &[&str]) -> ColumnSchema {
        ColumnSchema::new(columns.iter().map(ToString::to_string).collect())
            .expect("valid schema")
    }

    fn record(value: Value) -> FeatureRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_partial_record_is_zero_filled() {
        let schema = schema(&["age", "sex", "chol"]);
        let row = align(&record(json!({"age": 54, "sex": 1})), &schema).expect("aligns");
        assert_eq!(row.values, vec![54.0, 1.0, 0.0]);
    }

    #[test]
    fn test_empty_record_is_all_zeros() {
        let schema = schema(&["age", "sex", "chol"]);
        let row = align(&FeatureRecord::new(), &schema).expect("aligns");
        assert_eq!(row.values, vec![0.0; 3]);
    }

    #[test]
    fn test_extra_fields_are_dropped() {
        let schema = schema(&["age", "chol"]);
        let input = record(json!({
            "chol": 233,
            "patient_name": "not a number",
            "notes": {"nested": true},
            "age": 63.5,
        }));
        let row = align(&input, &schema).expect("extra fields never fail");
        assert_eq!(row.values, vec![63.5, 233.0]);
    }

    #[test]
    fn test_order_follows_schema_not_record() {
        let schema = schema(&["thalach", "age"]);
        let row = align(&record(json!({"age": 1, "thalach": 2})), &schema).expect("aligns");
        assert_eq!(row.values, vec![2.0, 1.0]);
    }

    #[test]
    fn test_bool_and_null_values() {
        let schema = schema(&["fbs", "exang", "ca"]);
        let row = align(
            &record(json!({"fbs": true, "exang": false, "ca": null})),
            &schema,
        )
        .expect("aligns");
        assert_eq!(row.values, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_non_numeric_schema_value_fails() {
        let schema = schema(&["age"]);
        let err = align(&record(json!({"age": "fifty"})), &schema).unwrap_err();
        assert!(err.to_string().contains("age"), "error should name the column: {err}");
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = ColumnSchema::new(vec!["age".into(), "sex".into(), "age".into()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_round_trip_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("heart_columns.json");
        let schema = schema(&["age", "sex", "cp", "trestbps"]);

        schema.save(&path).expect("save");
        let loaded = ColumnSchema::load(&path).expect("load");
        assert_eq!(loaded, schema);
    }

    #[test]
    fn test_schema_load_rejects_non_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("heart_columns.json");
        std::fs::write(&path, r#"{"age": 0}"#).expect("write");

        assert!(ColumnSchema::load(&path).is_err());
    }

    #[test]
    fn test_schema_load_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(ColumnSchema::load(&dir.path().join("missing.json")).is_err());
    }

    proptest! {
        #[test]
        fn aligned_row_matches_record_on_shared_keys(
            values in proptest::collection::vec(proptest::option::of(-1000i32..1000), 0..16),
            extra in -1000i32..1000,
        ) {
            let columns: Vec<String> = (0..values.len()).map(|i| format!("f{i}")).collect();
            let schema = ColumnSchema::new(columns.clone()).expect("unique names");

            let mut input = FeatureRecord::new();
            for (column, value) in columns.iter().zip(&values) {
                if let Some(v) = value {
                    input.insert(column.clone(), json!(v));
                }
            }
            input.insert("not_in_schema".into(), json!(extra));

            let row = align(&input, &schema).expect("numeric records always align");
            prop_assert_eq!(row.len(), schema.len());
            for (aligned, expected) in row.values.iter().zip(&values) {
                let expected = expected.map_or(FILL_VALUE, |v| v as f32);
                prop_assert_eq!(*aligned, expected);
            }

            let again = align(&input, &schema).expect("aligns");
            prop_assert_eq!(again, row);
        }
    }
}
