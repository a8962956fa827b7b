//! Form validation.
//!
//! Two passes run before anything leaves the process: a presence check over the required
//! fields, then a range check over every range-bearing field. Both are pure; logging of what
//! failed is left to the caller.

use crate::record::FormRecord;
use crate::schema::FieldSchema;
use serde::Serialize;

/// A measurement that fell outside its plausible range.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RangeViolation {
    pub field: String,
    pub label: String,
    /// The value as entered, or `None` when a non-optional field was left blank.
    pub value: Option<String>,
    pub min: f64,
    pub max: f64,
}

/// Returns `true` when every field in `required` holds a value.
pub fn check_required(record: &FormRecord, required: &[&str]) -> bool {
    required.iter().all(|name| record.contains(name))
}

/// The required fields that are unset, in `required` order.
pub fn missing_required<'a>(record: &FormRecord, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|name| !record.contains(name))
        .collect()
}

/// Checks one field against `[min, max]`.
///
/// An optional field that is absent passes unconditionally. Anything else is read as a number;
/// absent or non-numeric values read as `NaN` and fail both bounds.
pub fn check_range(record: &FormRecord, schema: &FieldSchema, name: &str, min: f64, max: f64) -> bool {
    let value = match record.get(name) {
        Some(value) => value.as_f64(),
        None if schema.is_optional(name) => return true,
        None => f64::NAN,
    };
    min <= value && value <= max
}

/// Runs the range check over every range-bearing field without stopping at the first failure.
///
/// Violations come back in range-table order.
pub fn range_violations(record: &FormRecord, schema: &FieldSchema) -> Vec<RangeViolation> {
    schema
        .ranges()
        .filter(|(name, entry)| !check_range(record, schema, name, entry.min, entry.max))
        .map(|(name, entry)| RangeViolation {
            field: name.to_owned(),
            label: entry.label.to_owned(),
            value: record.get(name).map(ToString::to_string),
            min: entry.min,
            max: entry.max,
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::record::FieldValue;

    /// A record with every required field present and in range.
    pub(crate) fn valid_record() -> FormRecord {
        [
            ("MaternalAge", "45"),
            ("Gender", "Female"),
            ("EstimatedFetalWeight", "2500"),
            ("FemurLength", "6.5"),
            ("GestationalAge", "238"),
            ("HeadCircumference", "30"),
            ("AbdominalCircumference", "28"),
        ]
        .into_iter()
        .collect()
    }

    fn schema() -> FieldSchema {
        FieldSchema::clinical().expect("clinical schema should be valid")
    }

    #[test]
    fn test_check_required_accepts_complete_record() {
        let schema = schema();
        assert!(check_required(&valid_record(), schema.required()));
    }

    #[test]
    fn test_missing_required_reports_gender() {
        let schema = schema();
        let mut record = valid_record();
        record.remove("Gender");
        assert!(!check_required(&record, schema.required()));
        assert_eq!(missing_required(&record, schema.required()), vec!["Gender"]);
    }

    #[test]
    fn test_missing_required_counts_blank_text_as_present() {
        let schema = schema();
        let mut record = valid_record();
        record.set("Gender", "");
        assert!(check_required(&record, schema.required()));
    }

    #[test]
    fn test_check_range_inclusive_bounds() {
        let schema = schema();
        let mut record = FormRecord::new();
        record.set("MaternalAge", "16");
        assert!(check_range(&record, &schema, "MaternalAge", 16.0, 70.0));
        record.set("MaternalAge", "70");
        assert!(check_range(&record, &schema, "MaternalAge", 16.0, 70.0));
        record.set("MaternalAge", "10");
        assert!(!check_range(&record, &schema, "MaternalAge", 16.0, 70.0));
    }

    #[test]
    fn test_check_range_rejects_garbage() {
        let schema = schema();
        let mut record = FormRecord::new();
        record.set("MaternalHeight", "tall");
        assert!(!check_range(&record, &schema, "MaternalHeight", 120.0, 200.0));
    }

    #[test]
    fn test_check_range_optional_absent_passes() {
        let schema = schema();
        let record = FormRecord::new();
        assert!(check_range(&record, &schema, "MaternalHeight", 120.0, 200.0));
    }

    #[test]
    fn test_check_range_optional_blank_fails() {
        let schema = schema();
        let mut record = FormRecord::new();
        record.set("MaternalHeight", "");
        assert!(!check_range(&record, &schema, "MaternalHeight", 120.0, 200.0));
    }

    #[test]
    fn test_check_range_required_absent_fails() {
        let schema = schema();
        let record = FormRecord::new();
        assert!(!check_range(&record, &schema, "MaternalAge", 16.0, 70.0));
    }

    #[test]
    fn test_range_violations_empty_for_valid_record() {
        assert!(range_violations(&valid_record(), &schema()).is_empty());
    }

    #[test]
    fn test_range_violations_collects_every_field_in_table_order() {
        let mut record = valid_record();
        record.set("MaternalAge", "10");
        record.set("UmbilicalArterialPulsatilityIndex", "2.0");
        record.set("FemurLength", "abc");

        let violations = range_violations(&record, &schema());
        let labels: Vec<&str> = violations.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Maternal Age", "Femur Length", "Umbilical Arterial Pulsatility Index"]
        );
        assert_eq!(violations[0].value.as_deref(), Some("10"));
        assert_eq!((violations[0].min, violations[0].max), (16.0, 70.0));
    }

    #[test]
    fn test_range_violations_reads_numeric_values() {
        let mut record = valid_record();
        record.set("EstimatedFetalWeight", FieldValue::Number(5000.into()));
        let violations = range_violations(&record, &schema());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "EstimatedFetalWeight");
    }
}
