//! Assessment sessions and the submission pipeline.
//!
//! An [`AssessmentSession`] owns the form record for one assessment and drives a submission
//! through a single explicit state value:
//!
//! ```text
//! Idle -> Validating -> Invalid
//!                    -> Normalizing -> Imputing -> Classifying -> Succeeded
//!                                            \            \-> Failed
//!                                             \-> Failed
//! ```
//!
//! `Invalid`, `Succeeded` and `Failed` are terminal; the next submission starts again from
//! `Validating`. Every state change goes through [`SubmissionState::apply`].
//!
//! Imputation always completes before classification starts and its output is the
//! classification input. Remote failures are not retried. A second `submit` while one is in
//! flight is rejected with `AssessmentError::SubmissionInFlight` and changes nothing. A
//! submission whose future is dropped while imputing or classifying ends in `Failed`, so the
//! session can be submitted again.

use crate::classification::Classification;
use crate::error::{AssessmentError, AssessmentResult, RemoteError, RemoteService};
use crate::normalize::normalize_booleans;
use crate::notice::Notice;
use crate::record::FormRecord;
use crate::remote::PredictionService;
use crate::schema::{FieldSchema, InputKind};
use crate::validation::{missing_required, range_violations, RangeViolation};
use sga_types::FieldName;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Why a submission did not produce a classification.
#[derive(Clone, Debug, PartialEq)]
pub enum FailureReason {
    /// Required fields that were unset, in required-field order.
    MissingRequiredFields(Vec<String>),
    /// Every range-bearing field that failed its check, in range-table order.
    OutOfRange(Vec<RangeViolation>),
    /// A prediction service call failed; the cause is logged, not carried.
    RemoteCallFailure(RemoteService),
}

impl FailureReason {
    pub fn notice(&self, raised_at: Instant) -> Notice {
        match self {
            FailureReason::MissingRequiredFields(_) => Notice::missing_required(raised_at),
            FailureReason::OutOfRange(violations) => {
                Notice::out_of_range(violations.iter().map(|v| v.label.as_str()), raised_at)
            }
            FailureReason::RemoteCallFailure(_) => Notice::remote_failure(raised_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionResult {
    Pending,
    Success(Classification),
    Failure(FailureReason),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Invalid(FailureReason),
    Normalizing,
    Imputing,
    Classifying,
    Succeeded(Classification),
    Failed(FailureReason),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionEvent {
    Submit,
    Rejected(FailureReason),
    Validated,
    Normalized,
    Imputed,
    Classified(Classification),
    RemoteFailed(FailureReason),
    /// The submitting task went away before the pipeline finished.
    Abandoned,
}

impl SubmissionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionEvent::Submit => "submit",
            SubmissionEvent::Rejected(_) => "rejected",
            SubmissionEvent::Validated => "validated",
            SubmissionEvent::Normalized => "normalized",
            SubmissionEvent::Imputed => "imputed",
            SubmissionEvent::Classified(_) => "classified",
            SubmissionEvent::RemoteFailed(_) => "remote_failed",
            SubmissionEvent::Abandoned => "abandoned",
        }
    }
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Validating => "validating",
            SubmissionState::Invalid(_) => "invalid",
            SubmissionState::Normalizing => "normalizing",
            SubmissionState::Imputing => "imputing",
            SubmissionState::Classifying => "classifying",
            SubmissionState::Succeeded(_) => "succeeded",
            SubmissionState::Failed(_) => "failed",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SubmissionState::Validating
                | SubmissionState::Normalizing
                | SubmissionState::Imputing
                | SubmissionState::Classifying
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Invalid(_) | SubmissionState::Succeeded(_) | SubmissionState::Failed(_)
        )
    }

    /// True while the remote calls are outstanding.
    pub fn is_processing(&self) -> bool {
        matches!(self, SubmissionState::Imputing | SubmissionState::Classifying)
    }

    /// The state that follows `event`.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::InvalidTransition` for any event the current state does not
    /// accept, e.g. `Submit` while a submission is in flight.
    pub fn apply(&self, event: SubmissionEvent) -> AssessmentResult<Self> {
        use SubmissionEvent as E;
        use SubmissionState as S;

        match (self, event) {
            (state, E::Submit) if !state.is_in_flight() => Ok(S::Validating),
            (S::Validating, E::Rejected(reason)) => Ok(S::Invalid(reason)),
            (S::Validating, E::Validated) => Ok(S::Normalizing),
            (S::Normalizing, E::Normalized) => Ok(S::Imputing),
            (S::Imputing, E::Imputed) => Ok(S::Classifying),
            (S::Imputing | S::Classifying, E::RemoteFailed(reason)) => Ok(S::Failed(reason)),
            (S::Classifying, E::Classified(classification)) => Ok(S::Succeeded(classification)),
            (S::Validating | S::Normalizing, E::Abandoned) => Ok(S::Idle),
            (S::Imputing, E::Abandoned) => Ok(S::Failed(FailureReason::RemoteCallFailure(
                RemoteService::Imputation,
            ))),
            (S::Classifying, E::Abandoned) => Ok(S::Failed(FailureReason::RemoteCallFailure(
                RemoteService::Classification,
            ))),
            (state, event) => Err(AssessmentError::InvalidTransition {
                from: state.name(),
                event: event.name(),
            }),
        }
    }

    /// The result to show for this state; `None` before the first submission.
    pub fn result(&self) -> Option<SubmissionResult> {
        match self {
            SubmissionState::Idle => None,
            SubmissionState::Validating
            | SubmissionState::Normalizing
            | SubmissionState::Imputing
            | SubmissionState::Classifying => Some(SubmissionResult::Pending),
            SubmissionState::Invalid(reason) | SubmissionState::Failed(reason) => {
                Some(SubmissionResult::Failure(reason.clone()))
            }
            SubmissionState::Succeeded(classification) => {
                Some(SubmissionResult::Success(*classification))
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a session as having a submission in flight until dropped.
///
/// A submission dropped part way (cancelled, timed out or panicked) leaves no in-flight state
/// behind: the guard settles it before releasing the flag.
struct InFlightGuard<'a>(&'a AssessmentSession);

impl<'a> InFlightGuard<'a> {
    fn acquire(session: &'a AssessmentSession) -> AssessmentResult<Self> {
        session
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AssessmentError::SubmissionInFlight)?;
        Ok(Self(session))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.0.state);
        if state.is_in_flight() {
            warn!(state = state.name(), "submission abandoned before completing");
            if let Ok(next) = state.apply(SubmissionEvent::Abandoned) {
                if matches!(next, SubmissionState::Failed(_)) {
                    *lock(&self.0.notice) = Some(Notice::remote_failure(Instant::now()));
                }
                *state = next;
            }
        }
        drop(state);
        self.0.in_flight.store(false, Ordering::Release);
    }
}

/// One assessment: the form being filled in, and the state of its latest submission.
pub struct AssessmentSession {
    schema: Arc<FieldSchema>,
    service: Arc<dyn PredictionService>,
    record: Mutex<FormRecord>,
    state: Mutex<SubmissionState>,
    notice: Mutex<Option<Notice>>,
    in_flight: AtomicBool,
}

impl AssessmentSession {
    pub fn new(schema: Arc<FieldSchema>, service: Arc<dyn PredictionService>) -> Self {
        Self::with_record(schema, service, FormRecord::new())
    }

    /// Starts a session from an already-filled record, e.g. one loaded from a file.
    pub fn with_record(
        schema: Arc<FieldSchema>,
        service: Arc<dyn PredictionService>,
        record: FormRecord,
    ) -> Self {
        Self {
            schema,
            service,
            record: Mutex::new(record),
            state: Mutex::new(SubmissionState::Idle),
            notice: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Sets or clears one field.
    ///
    /// Fields stay editable while a submission is in flight; the submission works on the
    /// record as it was when submitted. Clearing a numeric field, or setting it to blank text,
    /// unsets it. Blank text on other fields is kept, since `""` is the "not selected" value of
    /// true/false fields.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Text` for malformed names and `AssessmentError::UnknownField`
    /// for names outside the field catalogue.
    pub fn set_field(&self, name: &str, value: Option<String>) -> AssessmentResult<()> {
        let name = FieldName::new(name)?;
        let descriptor = self
            .schema
            .descriptor(name.as_str())
            .ok_or_else(|| AssessmentError::UnknownField(name.to_string()))?;

        let mut record = lock(&self.record);
        match value {
            Some(value) if !(descriptor.input == InputKind::Numeric && value.trim().is_empty()) => {
                record.set(name.into_string(), value);
            }
            _ => {
                record.remove(name.as_str());
            }
        }
        Ok(())
    }

    /// Snapshot of the form as currently entered.
    pub fn record(&self) -> FormRecord {
        lock(&self.record).clone()
    }

    pub fn state(&self) -> SubmissionState {
        lock(&self.state).clone()
    }

    pub fn result(&self) -> Option<SubmissionResult> {
        lock(&self.state).result()
    }

    /// The notice to display at `now`, if one is raised and has not yet dismissed itself.
    pub fn notice(&self, now: Instant) -> Option<Notice> {
        lock(&self.notice)
            .as_ref()
            .filter(|notice| notice.is_active(now))
            .cloned()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Discards the record and any previous result to begin a new assessment.
    pub fn reset(&self) -> AssessmentResult<()> {
        let _guard = InFlightGuard::acquire(self)?;
        lock(&self.record).clear();
        *lock(&self.state) = SubmissionState::Idle;
        *lock(&self.notice) = None;
        debug!("assessment reset");
        Ok(())
    }

    /// Validates, normalises and submits the current record.
    ///
    /// Validation and remote failures come back as `Ok(SubmissionResult::Failure(..))`.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::SubmissionInFlight` if this session is already submitting.
    pub async fn submit(&self) -> AssessmentResult<SubmissionResult> {
        let _guard = InFlightGuard::acquire(self)?;
        self.apply(SubmissionEvent::Submit)?;
        *lock(&self.notice) = None;

        let mut record = self.record();

        let missing = missing_required(&record, self.schema.required());
        if !missing.is_empty() {
            warn!(missing = %missing.join(", "), "required fields are incomplete");
            let reason =
                FailureReason::MissingRequiredFields(missing.into_iter().map(String::from).collect());
            return self.reject(reason);
        }

        let violations = range_violations(&record, &self.schema);
        if !violations.is_empty() {
            for violation in &violations {
                warn!(
                    field = %violation.field,
                    value = violation.value.as_deref().unwrap_or("<unset>"),
                    min = violation.min,
                    max = violation.max,
                    "value is out of range"
                );
            }
            return self.reject(FailureReason::OutOfRange(violations));
        }
        self.apply(SubmissionEvent::Validated)?;

        let encoded = normalize_booleans(&mut record, &self.schema);
        debug!(encoded, "normalised boolean fields");
        self.apply(SubmissionEvent::Normalized)?;

        let imputed = match self.service.impute(&record).await {
            Ok(imputed) => imputed,
            Err(e) => return self.fail(e),
        };
        self.apply(SubmissionEvent::Imputed)?;

        let code = match self.service.classify(&imputed).await {
            Ok(code) => code,
            Err(e) => return self.fail(e),
        };
        let classification = Classification::from_code(code);
        self.apply(SubmissionEvent::Classified(classification))?;

        info!(classification = classification.abbreviation(), "assessment classified");
        Ok(SubmissionResult::Success(classification))
    }

    fn apply(&self, event: SubmissionEvent) -> AssessmentResult<()> {
        let mut state = lock(&self.state);
        let next = state.apply(event)?;
        debug!(from = state.name(), to = next.name(), "submission state changed");
        *state = next;
        Ok(())
    }

    fn reject(&self, reason: FailureReason) -> AssessmentResult<SubmissionResult> {
        *lock(&self.notice) = Some(reason.notice(Instant::now()));
        self.apply(SubmissionEvent::Rejected(reason.clone()))?;
        Ok(SubmissionResult::Failure(reason))
    }

    fn fail(&self, cause: RemoteError) -> AssessmentResult<SubmissionResult> {
        error!(service = %cause.service(), error = %cause, "prediction call failed");
        let reason = FailureReason::RemoteCallFailure(cause.service());
        *lock(&self.notice) = Some(reason.notice(Instant::now()));
        self.apply(SubmissionEvent::RemoteFailed(reason.clone()))?;
        Ok(SubmissionResult::Failure(reason))
    }
}

impl std::fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("record", &*lock(&self.record))
            .field("state", &*lock(&self.state))
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}
