//! # SGA Core
//!
//! Core logic for the fetal growth (SGA/AGA) assessment workflow.
//!
//! This crate contains the clinical rules and the submission pipeline:
//! - The field catalogue, plausibility ranges and required/optional/boolean field sets
//! - Form records and their validation (presence check, then range check)
//! - Boolean normalisation of the outgoing record
//! - Assessment sessions that call the imputation and classification services in order
//! - The patient history client
//!
//! **No API concerns**: HTTP servers, routing and command-line handling belong in `api-rest`,
//! `api-shared` or the `sga` CLI.

pub mod classification;
pub mod config;
pub mod constants;
pub mod error;
pub mod mother;
pub mod normalize;
pub mod notice;
pub mod record;
pub mod remote;
pub mod schema;
pub mod submission;
pub mod validation;

pub use classification::{Classification, Guidance, GuidanceItem};
pub use config::CoreConfig;
pub use error::{AssessmentError, AssessmentResult, RemoteError, RemoteService};
pub use mother::{Mother, NewMother, NewScan, PatientHistoryClient, Scan};
pub use notice::{Notice, NoticeKind};
pub use record::{FieldValue, FormRecord};
pub use remote::{HttpPredictionClient, ImputedRecord, PredictionService};
pub use schema::{FieldDescriptor, FieldSchema, FieldSection, InputKind, RangeEntry};
pub use submission::{
    AssessmentSession, FailureReason, SubmissionEvent, SubmissionResult, SubmissionState,
};
pub use validation::RangeViolation;
