//! Patient history: mothers and the scans recorded against them.
//!
//! The patient history service is plain JSON CRUD under a configured base URL. A stored mother
//! can prefill the maternal part of a new assessment.

use crate::classification::Classification;
use crate::config::CoreConfig;
use crate::error::{AssessmentError, AssessmentResult, RemoteError, RemoteService};
use crate::record::FormRecord;
use crate::remote::{build_http_client, send_json};
use crate::schema::FieldSchema;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use sga_types::NonEmptyText;
use std::time::Duration;

/// Details of a mother as entered at registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMother {
    pub name: NonEmptyText,
    pub age: f64,
    pub height: f64,
    pub weight: f64,
    pub hospital: String,
    pub does_smoke: bool,
    #[serde(rename = "gestationalLDM")]
    pub gestational_ldm: bool,
    #[serde(rename = "pregestationalLDM")]
    pub pregestational_ldm: bool,
    pub pregnancy_hypertension: bool,
    pub essential_hypertension: bool,
    /// Whether any earlier pregnancy failed; the service names this `failedPregnancyCount`.
    #[serde(rename = "failedPregnancyCount")]
    pub previous_failed_pregnancy: bool,
    pub high_risk_preeclampsia: bool,
}

impl NewMother {
    /// Checks age, height and weight against the same plausibility ranges the assessment uses.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::InvalidInput` naming the first implausible measurement.
    pub fn validate(&self, schema: &FieldSchema) -> AssessmentResult<()> {
        for (field, value) in [
            ("MaternalAge", self.age),
            ("MaternalHeight", self.height),
            ("MaternalWeight", self.weight),
        ] {
            let Some(range) = schema.range(field) else {
                continue;
            };
            if !range.contains(value) {
                return Err(AssessmentError::InvalidInput(format!(
                    "{} must be between {} and {} (got {value})",
                    range.label, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// A mother as stored by the patient history service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mother {
    pub id: String,
    #[serde(flatten)]
    pub details: NewMother,
}

impl Mother {
    /// Copies the mother's measurements and history into an assessment record.
    ///
    /// Fields already present in `record` are overwritten.
    pub fn prefill(&self, record: &mut FormRecord) {
        let details = &self.details;
        record.set("MaternalAge", details.age.to_string());
        record.set("MaternalHeight", details.height.to_string());
        record.set("MaternalWeight", details.weight.to_string());

        for (field, flag) in [
            ("Smoking", details.does_smoke),
            ("GestationalDiabetes", details.gestational_ldm),
            ("PregestationalDiabetes", details.pregestational_ldm),
            ("PregnancyInducedHypertension", details.pregnancy_hypertension),
            ("EssentialHypertension", details.essential_hypertension),
            ("PreviousFailedPregnancy", details.previous_failed_pregnancy),
            ("HighRiskPretermPreeclampsia", details.high_risk_preeclampsia),
        ] {
            record.set(field, flag.to_string());
        }
    }
}

/// A completed assessment to store against a mother.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScan {
    pub mother_id: String,
    pub measurements: FormRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    pub recorded_at: DateTime<Utc>,
}

impl NewScan {
    pub fn new(
        mother_id: impl Into<String>,
        measurements: FormRecord,
        classification: Option<Classification>,
    ) -> Self {
        Self {
            mother_id: mother_id.into(),
            measurements,
            classification,
            recorded_at: Utc::now(),
        }
    }
}

/// A scan as acknowledged by the patient history service.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub id: String,
    pub mother_id: String,
}

/// Client for the patient history service.
#[derive(Clone, Debug)]
pub struct PatientHistoryClient {
    client: Client,
    base_url: Url,
}

impl PatientHistoryClient {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> AssessmentResult<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url,
        })
    }

    /// Builds a client from the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Config` when no patient history URL is configured.
    pub fn from_config(cfg: &CoreConfig) -> AssessmentResult<Self> {
        let base_url = cfg.patient_api_url().cloned().ok_or_else(|| {
            AssessmentError::Config(format!(
                "{} must be set to use patient history",
                crate::constants::PATIENT_API_URL_ENV
            ))
        })?;
        Self::new(base_url, cfg.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get_mother(&self, id: &str) -> Result<Mother, RemoteError> {
        let url = self.url(&[id])?;
        tracing::debug!(%url, "fetching mother");
        send_json(RemoteService::PatientHistory, self.client.get(url)).await
    }

    pub async fn create_mother(&self, mother: &NewMother) -> Result<Mother, RemoteError> {
        let url = self.url(&[])?;
        tracing::debug!(%url, "creating mother");
        send_json(RemoteService::PatientHistory, self.client.post(url).json(mother)).await
    }

    pub async fn create_scan(&self, scan: &NewScan) -> Result<Scan, RemoteError> {
        let url = self.url(&[scan.mother_id.as_str(), "scans"])?;
        tracing::debug!(%url, "recording scan");
        send_json(RemoteService::PatientHistory, self.client.post(url).json(scan)).await
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Malformed {
                service: RemoteService::PatientHistory,
                reason: format!("{} cannot be used as a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mother_json() -> serde_json::Value {
        json!({
            "id": "m-17",
            "name": "Jane Doe",
            "age": 31,
            "height": 162.5,
            "weight": 58,
            "hospital": "General",
            "doesSmoke": true,
            "gestationalLDM": false,
            "pregestationalLDM": false,
            "pregnancyHypertension": true,
            "essentialHypertension": false,
            "failedPregnancyCount": true,
            "highRiskPreeclampsia": false
        })
    }

    fn client(base: &str) -> PatientHistoryClient {
        let cfg = CoreConfig::new(
            Url::parse("http://localhost/impute").expect("url"),
            Url::parse("http://localhost/classify").expect("url"),
            Some(Url::parse(base).expect("url")),
            None,
        );
        PatientHistoryClient::from_config(&cfg).expect("client")
    }

    #[test]
    fn test_mother_deserialises_service_field_names() {
        let mother: Mother = serde_json::from_value(mother_json()).expect("mother");
        assert_eq!(mother.id, "m-17");
        assert_eq!(mother.details.name.as_str(), "Jane Doe");
        assert!(mother.details.does_smoke);
        assert!(mother.details.pregnancy_hypertension);
        assert!(mother.details.previous_failed_pregnancy);
    }

    #[test]
    fn test_mother_rejects_numeric_failed_pregnancy_flag() {
        let mut value = mother_json();
        value["failedPregnancyCount"] = json!(2);
        assert!(serde_json::from_value::<Mother>(value).is_err());
    }

    #[test]
    fn test_mother_rejects_blank_name() {
        let mut value = mother_json();
        value["name"] = json!("   ");
        assert!(serde_json::from_value::<Mother>(value).is_err());
    }

    #[test]
    fn test_prefill_sets_maternal_fields() {
        let mother: Mother = serde_json::from_value(mother_json()).expect("mother");
        let mut record = FormRecord::new();
        mother.prefill(&mut record);

        assert_eq!(record.get("MaternalAge").map(ToString::to_string).as_deref(), Some("31"));
        assert_eq!(
            record.get("MaternalHeight").map(ToString::to_string).as_deref(),
            Some("162.5")
        );
        assert_eq!(record.get("Smoking").map(ToString::to_string).as_deref(), Some("true"));
        assert_eq!(
            record.get("GestationalDiabetes").map(ToString::to_string).as_deref(),
            Some("false")
        );
        assert_eq!(
            record.get("PreviousFailedPregnancy").map(ToString::to_string).as_deref(),
            Some("true")
        );
        assert_eq!(
            record.get("HighRiskPretermPreeclampsia").map(ToString::to_string).as_deref(),
            Some("false")
        );
        assert!(!record.contains("Gender"));
    }

    #[test]
    fn test_validate_rejects_implausible_age() {
        let schema = FieldSchema::clinical().expect("clinical schema should be valid");
        let mut mother: Mother = serde_json::from_value(mother_json()).expect("mother");
        mother.details.validate(&schema).expect("plausible mother");

        mother.details.age = 12.0;
        let err = mother.details.validate(&schema).expect_err("too young");
        assert!(matches!(err, AssessmentError::InvalidInput(msg) if msg.contains("Maternal Age")));
    }

    #[test]
    fn test_client_requires_configured_url() {
        let cfg = CoreConfig::new(
            Url::parse("http://localhost/impute").expect("url"),
            Url::parse("http://localhost/classify").expect("url"),
            None,
            None,
        );
        let err = PatientHistoryClient::from_config(&cfg).expect_err("no base url");
        assert!(matches!(err, AssessmentError::Config(_)));
    }

    #[test]
    fn test_urls_are_built_from_segments() {
        let client = client("http://localhost:8080/api/mothers/");
        assert_eq!(
            client.url(&["m 1"]).expect("url").as_str(),
            "http://localhost:8080/api/mothers/m%201"
        );
        assert_eq!(
            client.url(&["m-1", "scans"]).expect("url").as_str(),
            "http://localhost:8080/api/mothers/m-1/scans"
        );
        assert_eq!(
            client.url(&[]).expect("url").as_str(),
            "http://localhost:8080/api/mothers"
        );
    }

    #[test]
    fn test_scan_serialises_for_the_service() {
        let scan = NewScan::new(
            "m-1",
            [("GestationalAge", "238")].into_iter().collect(),
            Some(Classification::SmallForGestationalAge),
        );
        let value = serde_json::to_value(&scan).expect("serialise");
        assert_eq!(value["motherId"], "m-1");
        assert_eq!(value["classification"], "small_for_gestational_age");
        assert_eq!(value["measurements"]["GestationalAge"], "238");
    }
}
