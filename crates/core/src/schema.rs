//! Clinical field catalogue and validation schema.
//!
//! The schema is the companion to the dynamic-keyed [`FormRecord`](crate::record::FormRecord):
//! it names every known field, the plausible numeric range of each measurement, which fields
//! must be present before submission, which range-bearing fields may be left blank, and which
//! true/false fields are encoded as `0`/`1` before leaving the process.
//!
//! The schema is built and checked once at startup via [`FieldSchema::clinical`]; nothing in
//! the submission path re-derives these sets.

use crate::error::{AssessmentError, AssessmentResult};
use serde::Serialize;
use std::collections::BTreeSet;

/// Display label and inclusive numeric bounds for one measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RangeEntry {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

impl RangeEntry {
    pub const fn new(label: &'static str, min: f64, max: f64) -> Self {
        Self { label, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Grouping used by presentation layers when laying out the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSection {
    CompulsoryMeasurements,
    MaternalHistory,
    FetalBiometry,
}

impl FieldSection {
    pub fn title(&self) -> &'static str {
        match self {
            FieldSection::CompulsoryMeasurements => "Compulsory Clinical Measurements",
            FieldSection::MaternalHistory => "Maternal Health & History",
            FieldSection::FetalBiometry => "Fetal Biometry & Doppler Assessments",
        }
    }
}

/// How a field is entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum InputKind {
    Numeric,
    Choice(&'static [&'static str]),
    TrueFalse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub section: FieldSection,
    pub input: InputKind,
}

const fn field(
    name: &'static str,
    label: &'static str,
    section: FieldSection,
    input: InputKind,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        label,
        section,
        input,
    }
}

use FieldSection::{CompulsoryMeasurements, FetalBiometry, MaternalHistory};
use InputKind::{Choice, Numeric, TrueFalse};

const GENDER_OPTIONS: &[&str] = &["Male", "Female"];

const PLACENTA_SITE_OPTIONS: &[&str] = &[
    "Anterior Placenta",
    "Fundal Placenta",
    "Lateral Placenta",
    "Placenta Previa",
    "Posterior Placenta",
];

const AMNIOTIC_FLUID_OPTIONS: &[&str] = &["Oligohydramnios", "Normal", "Polyhydramnios"];

/// Every clinical field the form knows about, in presentation order.
pub const CLINICAL_FIELDS: &[FieldDescriptor] = &[
    field("Gender", "Gender", CompulsoryMeasurements, Choice(GENDER_OPTIONS)),
    field("MaternalAge", "Maternal Age", CompulsoryMeasurements, Numeric),
    field("HeadCircumference", "Head Circumference (cm)", CompulsoryMeasurements, Numeric),
    field(
        "AbdominalCircumference",
        "Abdominal Circumference (cm)",
        CompulsoryMeasurements,
        Numeric,
    ),
    field("FemurLength", "Femur Length (cm)", CompulsoryMeasurements, Numeric),
    field("GestationalAge", "Gestational Age", CompulsoryMeasurements, Numeric),
    field(
        "EstimatedFetalWeight",
        "Estimated Fetal Weight (grams)",
        CompulsoryMeasurements,
        Numeric,
    ),
    field("MaternalHeight", "Maternal Height (cm)", MaternalHistory, Numeric),
    field("MaternalWeight", "Maternal Weight (kg)", MaternalHistory, Numeric),
    field("LastPregnancySga", "Last Pregnancy SGA", MaternalHistory, TrueFalse),
    field("LastPregnancyFgr", "Last Pregnancy FGR", MaternalHistory, TrueFalse),
    field("LastPregnancyNormal", "Last Pregnancy Normal", MaternalHistory, TrueFalse),
    field(
        "PreviousFailedPregnancy",
        "Previous Failed Pregnancy",
        MaternalHistory,
        TrueFalse,
    ),
    field(
        "HighRiskPretermPreeclampsia",
        "High Risk Preterm Preeclampsia",
        MaternalHistory,
        TrueFalse,
    ),
    field(
        "PregestationalDiabetes",
        "Pregestational Diabetes",
        MaternalHistory,
        TrueFalse,
    ),
    field("GestationalDiabetes", "Gestational Diabetes", MaternalHistory, TrueFalse),
    field(
        "EssentialHypertension",
        "Essential Hypertension",
        MaternalHistory,
        TrueFalse,
    ),
    field(
        "PregnancyInducedHypertension",
        "Pregnancy Induced Hypertension",
        MaternalHistory,
        TrueFalse,
    ),
    field("Smoking", "Smoking", MaternalHistory, TrueFalse),
    field("PlacentaSite", "Placenta Site", FetalBiometry, Choice(PLACENTA_SITE_OPTIONS)),
    field("BiparietalDiameter", "Biparietal Diameter (mm)", FetalBiometry, Numeric),
    field("CerebroplacentalRatio", "Cerebroplacental Ratio", FetalBiometry, Numeric),
    field("AmnioticFluid", "Amniotic Fluid", FetalBiometry, Choice(AMNIOTIC_FLUID_OPTIONS)),
    field("AmnioticFluidIndex", "Amniotic Fluid Index", FetalBiometry, Numeric),
    field(
        "UterineArteryResistanceIndex",
        "Uterine Artery Resistance Index",
        FetalBiometry,
        Numeric,
    ),
    field(
        "UterineArteryPulsatilityIndex",
        "Uterine Artery Pulsatility Index",
        FetalBiometry,
        Numeric,
    ),
    field(
        "UmbilicalArterialPulsatilityIndex",
        "Umbilical Arterial Pulsatility Index",
        FetalBiometry,
        Numeric,
    ),
    field(
        "MiddleCerebralArteryPeakSystolicVelocity",
        "Middle Cerebral Artery Peak Systolic Velocity (cm/s)",
        FetalBiometry,
        Numeric,
    ),
];

/// Plausible bounds for each measurement, in the order violations are reported.
pub const RANGE_TABLE: &[(&str, RangeEntry)] = &[
    ("MaternalAge", RangeEntry::new("Maternal Age", 16.0, 70.0)),
    ("MaternalHeight", RangeEntry::new("Maternal Height", 120.0, 200.0)),
    ("MaternalWeight", RangeEntry::new("Maternal Weight", 30.0, 100.0)),
    ("GestationalAge", RangeEntry::new("Gestational Age", 196.0, 280.0)),
    ("BiparietalDiameter", RangeEntry::new("Biparietal Diameter", 60.0, 120.0)),
    ("HeadCircumference", RangeEntry::new("Head Circumference", 20.0, 50.0)),
    ("AbdominalCircumference", RangeEntry::new("Abdominal Circumference", 20.0, 40.0)),
    ("FemurLength", RangeEntry::new("Femur Length", 4.5, 9.0)),
    ("AmnioticFluidIndex", RangeEntry::new("Amniotic Fluid Index", 0.0, 40.0)),
    (
        "UterineArteryResistanceIndex",
        RangeEntry::new("Uterine Artery Resistance Index", 0.3, 1.0),
    ),
    (
        "UterineArteryPulsatilityIndex",
        RangeEntry::new("Uterine Artery Pulsatility Index", 0.5, 2.5),
    ),
    ("CerebroplacentalRatio", RangeEntry::new("Cerebroplacental Ratio", 0.4, 3.8)),
    (
        "MiddleCerebralArteryPeakSystolicVelocity",
        RangeEntry::new("Middle Cerebral Artery Peak Systolic Velocity", 10.0, 90.0),
    ),
    ("EstimatedFetalWeight", RangeEntry::new("Estimated Fetal Weight", 900.0, 4000.0)),
    (
        "UmbilicalArterialPulsatilityIndex",
        RangeEntry::new("Umbilical Arterial Pulsatility Index", 0.8, 1.4),
    ),
];

/// Fields that must hold a value before anything is sent anywhere.
pub const REQUIRED_FIELDS: &[&str] = &[
    "MaternalAge",
    "Gender",
    "EstimatedFetalWeight",
    "FemurLength",
    "GestationalAge",
    "HeadCircumference",
    "AbdominalCircumference",
];

/// Range-bearing fields that pass the range check when left blank.
pub const OPTIONAL_FIELDS: &[&str] = &[
    "MaternalHeight",
    "MaternalWeight",
    "BiparietalDiameter",
    "AmnioticFluidIndex",
    "UterineArteryResistanceIndex",
    "UterineArteryPulsatilityIndex",
    "CerebroplacentalRatio",
    "MiddleCerebralArteryPeakSystolicVelocity",
    "UmbilicalArterialPulsatilityIndex",
];

/// Fields whose `""`/`"false"`/`"true"` values are sent as `0`/`0`/`1`.
pub const BOOLEAN_ENCODED_FIELDS: &[&str] = &[
    "EssentialHypertension",
    "GestationalDiabetes",
    "PregestationalDiabetes",
    "PregnancyInducedHypertension",
    "Smoking",
];

fn unknown_field(set: &str, name: &str) -> AssessmentError {
    AssessmentError::InvalidSchema(format!("{set} entry {name} is not a known field"))
}

/// The validated field schema shared by every assessment.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
    ranges: Vec<(&'static str, RangeEntry)>,
    required: Vec<&'static str>,
    optional: BTreeSet<&'static str>,
    boolean_encoded: BTreeSet<&'static str>,
}

impl FieldSchema {
    /// Builds the clinical schema from the static tables and checks its invariants.
    pub fn clinical() -> AssessmentResult<Self> {
        Self::new(
            CLINICAL_FIELDS.to_vec(),
            RANGE_TABLE.to_vec(),
            REQUIRED_FIELDS.to_vec(),
            OPTIONAL_FIELDS.iter().copied().collect(),
            BOOLEAN_ENCODED_FIELDS.iter().copied().collect(),
        )
    }

    /// Creates a schema, rejecting it if any invariant does not hold.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::InvalidSchema` if:
    /// - a field name is catalogued twice,
    /// - a range, required, optional or boolean-encoded entry names an unknown field,
    /// - a range has non-finite bounds or `min > max`,
    /// - a field is both required and optional.
    pub fn new(
        fields: Vec<FieldDescriptor>,
        ranges: Vec<(&'static str, RangeEntry)>,
        required: Vec<&'static str>,
        optional: BTreeSet<&'static str>,
        boolean_encoded: BTreeSet<&'static str>,
    ) -> AssessmentResult<Self> {
        let mut known = BTreeSet::new();
        for descriptor in &fields {
            if !known.insert(descriptor.name) {
                return Err(AssessmentError::InvalidSchema(format!(
                    "field {} is catalogued more than once",
                    descriptor.name
                )));
            }
        }

        for (name, entry) in &ranges {
            if !known.contains(name) {
                return Err(unknown_field("range", name));
            }
            if !entry.min.is_finite() || !entry.max.is_finite() || entry.min > entry.max {
                return Err(AssessmentError::InvalidSchema(format!(
                    "range for {name} must satisfy min <= max (got {} > {})",
                    entry.min, entry.max
                )));
            }
        }
        if let Some(name) = required.iter().find(|name| !known.contains(*name)) {
            return Err(unknown_field("required", name));
        }
        if let Some(name) = optional.iter().find(|name| !known.contains(*name)) {
            return Err(unknown_field("optional", name));
        }
        if let Some(name) = boolean_encoded.iter().find(|name| !known.contains(*name)) {
            return Err(unknown_field("boolean-encoded", name));
        }
        if let Some(name) = required.iter().find(|name| optional.contains(*name)) {
            return Err(AssessmentError::InvalidSchema(format!(
                "field {name} cannot be both required and optional"
            )));
        }

        Ok(Self {
            fields,
            ranges,
            required,
            optional,
            boolean_encoded,
        })
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|d| d.name == name)
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.descriptor(name).is_some()
    }

    pub fn ranges(&self) -> impl Iterator<Item = (&'static str, RangeEntry)> + '_ {
        self.ranges.iter().copied()
    }

    pub fn range(&self, name: &str) -> Option<RangeEntry> {
        self.ranges
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, entry)| *entry)
    }

    pub fn required(&self) -> &[&'static str] {
        &self.required
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|field| *field == name)
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.optional.contains(name)
    }

    pub fn is_boolean_encoded(&self, name: &str) -> bool {
        self.boolean_encoded.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clinical_schema_builds() {
        let schema = FieldSchema::clinical().expect("clinical schema should be valid");
        assert_eq!(schema.required().len(), 7);
        assert!(schema.is_known("AmnioticFluidIndex"));
        assert!(schema.is_boolean_encoded("Smoking"));
        assert!(!schema.is_boolean_encoded("LastPregnancySga"));
    }

    #[test]
    fn test_clinical_ranges_match_table() {
        let schema = FieldSchema::clinical().expect("clinical schema should be valid");
        let femur = schema.range("FemurLength").expect("femur range");
        assert_eq!((femur.label, femur.min, femur.max), ("Femur Length", 4.5, 9.0));
        let efw = schema.range("EstimatedFetalWeight").expect("efw range");
        assert_eq!((efw.min, efw.max), (900.0, 4000.0));
        assert_eq!(schema.ranges().count(), 15);
        assert!(schema.range("Gender").is_none());
    }

    #[test]
    fn test_every_range_field_is_required_or_optional() {
        let schema = FieldSchema::clinical().expect("clinical schema should be valid");
        for (name, _) in schema.ranges() {
            assert!(
                schema.is_required(name) ^ schema.is_optional(name),
                "{name} should be exactly one of required or optional"
            );
        }
    }

    #[test]
    fn test_range_entry_bounds_are_inclusive() {
        let entry = RangeEntry::new("Maternal Age", 16.0, 70.0);
        assert!(entry.contains(16.0));
        assert!(entry.contains(70.0));
        assert!(!entry.contains(15.99));
        assert!(!entry.contains(f64::NAN));
    }

    #[test]
    fn test_schema_rejects_inverted_range() {
        let err = FieldSchema::new(
            CLINICAL_FIELDS.to_vec(),
            vec![("MaternalAge", RangeEntry::new("Maternal Age", 70.0, 16.0))],
            vec![],
            BTreeSet::new(),
            BTreeSet::new(),
        )
        .expect_err("should reject inverted range");
        assert!(matches!(err, AssessmentError::InvalidSchema(msg) if msg.contains("min <= max")));
    }

    #[test]
    fn test_schema_rejects_unknown_required_field() {
        let err = FieldSchema::new(
            CLINICAL_FIELDS.to_vec(),
            vec![],
            vec!["ShoeSize"],
            BTreeSet::new(),
            BTreeSet::new(),
        )
        .expect_err("should reject unknown field");
        assert!(matches!(err, AssessmentError::InvalidSchema(msg) if msg.contains("ShoeSize")));
    }

    #[test]
    fn test_schema_rejects_unknown_boolean_field() {
        let err = FieldSchema::new(
            CLINICAL_FIELDS.to_vec(),
            vec![],
            vec![],
            BTreeSet::new(),
            ["Alcohol"].into_iter().collect(),
        )
        .expect_err("should reject unknown field");
        assert!(
            matches!(err, AssessmentError::InvalidSchema(msg) if msg.contains("boolean-encoded"))
        );
    }

    #[test]
    fn test_schema_rejects_required_and_optional_overlap() {
        let err = FieldSchema::new(
            CLINICAL_FIELDS.to_vec(),
            vec![],
            vec!["MaternalAge"],
            ["MaternalAge"].into_iter().collect(),
            BTreeSet::new(),
        )
        .expect_err("should reject overlap");
        assert!(
            matches!(err, AssessmentError::InvalidSchema(msg) if msg.contains("both required"))
        );
    }
}
