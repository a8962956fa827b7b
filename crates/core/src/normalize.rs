//! Encoding of true/false clinical history fields.
//!
//! The prediction services expect `0`/`1` integers for a fixed set of history fields, while the
//! form collects them as `""`, `"false"` or `"true"`.

use crate::record::{FieldValue, FormRecord};
use crate::schema::FieldSchema;

/// Rewrites boolean-encoded fields in place: `""` and `"false"` become `0`, `"true"` becomes `1`.
///
/// Fields outside the boolean-encoded set, and values other than those three tokens, are left
/// untouched. Already-encoded integers are left as they are, so applying this twice is the same
/// as applying it once. Returns the number of fields rewritten.
pub fn normalize_booleans(record: &mut FormRecord, schema: &FieldSchema) -> usize {
    let names: Vec<String> = record
        .iter()
        .filter(|(name, _)| schema.is_boolean_encoded(name))
        .map(|(name, _)| name.to_owned())
        .collect();

    let mut rewritten = 0;
    for name in names {
        let Some(value) = record.get_mut(&name) else {
            continue;
        };
        let encoded: u8 = match value.as_text() {
            Some("") | Some("false") => 0,
            Some("true") => 1,
            _ => continue,
        };
        *value = FieldValue::from(encoded);
        rewritten += 1;
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FieldSchema {
        FieldSchema::clinical().expect("clinical schema should be valid")
    }

    fn history_record() -> FormRecord {
        [
            ("Smoking", "true"),
            ("GestationalDiabetes", "false"),
            ("PregestationalDiabetes", ""),
            ("EssentialHypertension", "unknown"),
            ("LastPregnancySga", "true"),
            ("MaternalAge", "30"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_normalize_maps_tokens_to_integers() {
        let mut record = history_record();
        let rewritten = normalize_booleans(&mut record, &schema());

        assert_eq!(rewritten, 3);
        assert_eq!(record.get("Smoking"), Some(&FieldValue::from(1u8)));
        assert_eq!(record.get("GestationalDiabetes"), Some(&FieldValue::from(0u8)));
        assert_eq!(record.get("PregestationalDiabetes"), Some(&FieldValue::from(0u8)));
    }

    #[test]
    fn test_normalize_leaves_other_values_untouched() {
        let mut record = history_record();
        normalize_booleans(&mut record, &schema());

        assert_eq!(
            record.get("EssentialHypertension"),
            Some(&FieldValue::from("unknown"))
        );
        assert_eq!(record.get("LastPregnancySga"), Some(&FieldValue::from("true")));
        assert_eq!(record.get("MaternalAge"), Some(&FieldValue::from("30")));
        assert!(!record.contains("PregnancyInducedHypertension"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let schema = schema();
        let mut once = history_record();
        normalize_booleans(&mut once, &schema);
        let mut twice = once.clone();
        let rewritten = normalize_booleans(&mut twice, &schema);

        assert_eq!(rewritten, 0);
        assert_eq!(once, twice);
    }
}
