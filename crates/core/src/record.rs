//! Form state for one assessment.
//!
//! A [`FormRecord`] is a flat map from field name to the value the clinician entered. Keys are
//! dynamic: a field that has never been touched is simply absent. Values are strings as typed,
//! except true/false fields after normalisation, which hold the integers `0` or `1`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single entered value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
}

impl FieldValue {
    /// Numeric reading of the value, or `NaN` when it does not parse.
    ///
    /// Blank and non-numeric text read as `NaN`, so they fail every range comparison.
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Text(text) => text.trim().parse::<f64>().unwrap_or(f64::NAN),
            FieldValue::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        FieldValue::Number(value.into())
    }
}

/// Field name to entered value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord(BTreeMap<String, FieldValue>);

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.0.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Sets a field, returning the previous value if there was one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Unsets a field.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for FormRecord
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_parses_padded_numbers() {
        assert_eq!(FieldValue::from(" 45 ").as_f64(), 45.0);
        assert_eq!(FieldValue::from("4.5").as_f64(), 4.5);
        assert_eq!(FieldValue::from(1u8).as_f64(), 1.0);
    }

    #[test]
    fn test_field_value_garbage_reads_as_nan() {
        assert!(FieldValue::from("forty").as_f64().is_nan());
        assert!(FieldValue::from("").as_f64().is_nan());
    }

    #[test]
    fn test_form_record_serialises_flat() {
        let record: FormRecord = [("MaternalAge", FieldValue::from("45")), ("Smoking", 1u8.into())]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&record).expect("serialise");
        assert_eq!(json, serde_json::json!({ "MaternalAge": "45", "Smoking": 1 }));
    }

    #[test]
    fn test_form_record_deserialises_mixed_values() {
        let record: FormRecord =
            serde_json::from_str(r#"{"FemurLength": 6.2, "Gender": "Female"}"#).expect("parse");
        assert_eq!(record.get("FemurLength").map(FieldValue::as_f64), Some(6.2));
        assert_eq!(
            record.get("Gender").and_then(FieldValue::as_text),
            Some("Female")
        );
    }

    #[test]
    fn test_form_record_set_and_remove() {
        let mut record = FormRecord::new();
        assert!(record.set("MaternalAge", "30").is_none());
        assert_eq!(record.set("MaternalAge", "31"), Some(FieldValue::from("30")));
        assert!(record.remove("MaternalAge").is_some());
        assert!(record.is_empty());
    }
}
