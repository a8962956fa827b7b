//! JSON messages exchanged over the REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// One entry of the field catalogue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldRes {
    pub name: String,
    pub label: String,
    pub section: String,
    /// `numeric`, `choice` or `true_false`.
    pub input: String,
    /// Allowed values for `choice` inputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListFieldsRes {
    pub fields: Vec<FieldRes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateSessionRes {
    pub session_id: String,
}

/// Sets a field to `value`, or clears it when `value` is null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SetFieldReq {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GuidanceItemRes {
    pub topic: String,
    pub advice: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RangeViolationRes {
    pub field: String,
    pub label: String,
    pub value: Option<String>,
    pub min: f64,
    pub max: f64,
}

/// Outcome of the latest submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResultRes {
    /// `pending`, `success` or `failure`.
    pub status: String,
    /// `AGA` or `SGA` on success.
    pub classification: Option<String>,
    pub headline: Option<String>,
    pub guidance_heading: Option<String>,
    #[serde(default)]
    pub guidance: Vec<GuidanceItemRes>,
    /// `missing_required_fields`, `out_of_range` or `remote_call_failure` on failure.
    pub failure: Option<String>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub out_of_range: Vec<RangeViolationRes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NoticeRes {
    pub kind: String,
    pub title: String,
    pub message: String,
    /// Milliseconds until the notice dismisses itself; absent if it stays until the next submit.
    pub remaining_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionRes {
    pub session_id: String,
    pub state: String,
    /// Shown while the prediction services are working.
    pub processing_message: Option<String>,
    /// Field values as entered.
    #[schema(value_type = Object)]
    pub record: serde_json::Value,
    pub result: Option<ResultRes>,
    pub notice: Option<NoticeRes>,
}
