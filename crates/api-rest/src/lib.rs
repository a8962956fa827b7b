//! # API REST
//!
//! REST API for SGA assessments.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Assessment sessions live in memory and are dropped once left untouched for the session TTL.
//! Uses `api-shared` for the wire types and `sga-core` for everything clinical.

#![warn(rust_2018_idioms)]

use api_shared::{
    CreateSessionRes, ErrorRes, FieldRes, GuidanceItemRes, HealthRes, HealthService,
    ListFieldsRes, NoticeRes, RangeViolationRes, ResultRes, SessionRes, SetFieldReq,
};
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use sga_core::{
    constants::{DEFAULT_SESSION_TTL, PROCESSING_MESSAGE},
    AssessmentError, AssessmentSession, FailureReason,
    FieldDescriptor, FieldSchema, InputKind, Notice, NoticeKind, PredictionService,
    SubmissionResult,
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

type ApiError = (StatusCode, Json<ErrorRes>);
type ApiResult<T> = Result<T, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorRes::new(message)))
}

struct SessionEntry {
    session: Arc<AssessmentSession>,
    last_access: Instant,
}

type SessionMap = HashMap<Uuid, SessionEntry>;

/// Application state shared across REST API handlers
///
/// Holds the field schema, the prediction service and the open assessment sessions. Sessions
/// idle for longer than the TTL are swept whenever a request touches the map.
#[derive(Clone)]
pub struct AppState {
    schema: Arc<FieldSchema>,
    service: Arc<dyn PredictionService>,
    sessions: Arc<RwLock<SessionMap>>,
    session_ttl: Duration,
}

impl AppState {
    pub fn new(schema: Arc<FieldSchema>, service: Arc<dyn PredictionService>) -> Self {
        Self {
            schema,
            service,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Sets how long a session may go without a request before it is discarded.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    fn session(&self, id: &str) -> ApiResult<(Uuid, Arc<AssessmentSession>)> {
        let id = Uuid::parse_str(id)
            .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid session id"))?;
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        self.evict_idle(&mut sessions, now);
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Assessment session not found"))?;
        entry.last_access = now;
        Ok((id, entry.session.clone()))
    }

    fn insert_session(&self, id: Uuid, session: Arc<AssessmentSession>) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        self.evict_idle(&mut sessions, now);
        sessions.insert(
            id,
            SessionEntry {
                session,
                last_access: now,
            },
        );
    }

    /// Drops sessions idle for at least the TTL. A session with a submission in flight is kept.
    fn evict_idle(&self, sessions: &mut SessionMap, now: Instant) {
        sessions.retain(|id, entry| {
            let keep = entry.session.is_in_flight()
                || now.saturating_duration_since(entry.last_access) < self.session_ttl;
            if !keep {
                tracing::info!(session = %id, "assessment session expired");
            }
            keep
        });
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_fields,
        create_session,
        get_session,
        set_field,
        submit,
        delete_session,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        FieldRes,
        ListFieldsRes,
        CreateSessionRes,
        SetFieldReq,
        SessionRes,
        ResultRes,
        GuidanceItemRes,
        RangeViolationRes,
        NoticeRes,
    ))
)]
struct ApiDoc;

/// Builds the REST router with Swagger UI mounted at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fields", get(list_fields))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/fields/:name", put(set_field))
        .route("/sessions/:id/submit", post(submit))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/fields",
    responses(
        (status = 200, description = "Field catalogue", body = ListFieldsRes)
    )
)]
/// List every clinical field with its section, input kind and plausible range.
#[axum::debug_handler]
async fn list_fields(State(state): State<AppState>) -> Json<ListFieldsRes> {
    let fields = state
        .schema
        .fields()
        .iter()
        .map(|descriptor| field_res(&state.schema, descriptor))
        .collect();
    Json(ListFieldsRes { fields })
}

#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Assessment session created", body = CreateSessionRes)
    )
)]
/// Start a new, empty assessment.
#[axum::debug_handler]
async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<CreateSessionRes>) {
    let id = Uuid::new_v4();
    let session = Arc::new(AssessmentSession::new(
        state.schema.clone(),
        state.service.clone(),
    ));
    state.insert_session(id, session);
    tracing::info!(session = %id, "assessment session created");

    (
        StatusCode::CREATED,
        Json(CreateSessionRes {
            session_id: id.to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Current session state", body = SessionRes),
        (status = 400, description = "Invalid session id", body = ErrorRes),
        (status = 404, description = "Unknown session", body = ErrorRes)
    )
)]
/// Read the form, the submission state, the latest result and any active notice.
#[axum::debug_handler]
async fn get_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<SessionRes>> {
    let (id, session) = state.session(&id)?;
    Ok(Json(session_res(id, &session)?))
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/fields/{name}",
    request_body = SetFieldReq,
    responses(
        (status = 200, description = "Field updated", body = SessionRes),
        (status = 400, description = "Unknown or malformed field name", body = ErrorRes),
        (status = 404, description = "Unknown session", body = ErrorRes)
    )
)]
/// Set one field, or clear it with a null value.
#[axum::debug_handler]
async fn set_field(
    State(state): State<AppState>,
    AxumPath((id, name)): AxumPath<(String, String)>,
    Json(req): Json<SetFieldReq>,
) -> ApiResult<Json<SessionRes>> {
    let (id, session) = state.session(&id)?;
    match session.set_field(&name, req.value) {
        Ok(()) => Ok(Json(session_res(id, &session)?)),
        Err(e @ (AssessmentError::UnknownField(_) | AssessmentError::Text(_))) => {
            tracing::warn!(session = %id, field = %name, "rejected field update: {e}");
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => {
            tracing::error!("Set field error: {:?}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/submit",
    responses(
        (status = 200, description = "Submission finished; see result and notice", body = SessionRes),
        (status = 404, description = "Unknown session", body = ErrorRes),
        (status = 409, description = "A submission is already in flight", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Validate the form and, if it passes, run imputation then classification.
///
/// Validation and prediction failures are part of the normal result, not HTTP errors.
#[axum::debug_handler]
async fn submit(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<SessionRes>> {
    let (id, session) = state.session(&id)?;

    // Run detached so a dropped connection cannot abandon the pipeline half way.
    let task = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });

    match task.await {
        Ok(Ok(_)) => Ok(Json(session_res(id, &session)?)),
        Ok(Err(AssessmentError::SubmissionInFlight)) => Err(api_error(
            StatusCode::CONFLICT,
            AssessmentError::SubmissionInFlight.to_string(),
        )),
        Ok(Err(e)) => {
            tracing::error!("Submit error: {:?}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
        Err(e) => {
            tracing::error!("Submit task failed: {:?}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown session", body = ErrorRes)
    )
)]
/// Discard an assessment.
#[axum::debug_handler]
async fn delete_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<StatusCode> {
    let (id, _) = state.session(&id)?;
    state
        .sessions
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&id);
    tracing::info!(session = %id, "assessment session discarded");
    Ok(StatusCode::NO_CONTENT)
}

fn field_res(schema: &FieldSchema, descriptor: &FieldDescriptor) -> FieldRes {
    let (input, options) = match descriptor.input {
        InputKind::Numeric => ("numeric", Vec::new()),
        InputKind::Choice(options) => ("choice", options.iter().map(|o| o.to_string()).collect()),
        InputKind::TrueFalse => ("true_false", vec!["true".into(), "false".into()]),
    };
    let range = schema.range(descriptor.name);

    FieldRes {
        name: descriptor.name.into(),
        label: descriptor.label.into(),
        section: descriptor.section.title().into(),
        input: input.into(),
        options,
        required: schema.is_required(descriptor.name),
        min: range.map(|r| r.min),
        max: range.map(|r| r.max),
    }
}

fn session_res(id: Uuid, session: &AssessmentSession) -> ApiResult<SessionRes> {
    let record = serde_json::to_value(session.record()).map_err(|e| {
        tracing::error!("Serialise record error: {:?}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })?;
    let state = session.state();

    Ok(SessionRes {
        session_id: id.to_string(),
        state: state.name().into(),
        processing_message: state.is_processing().then(|| PROCESSING_MESSAGE.into()),
        record,
        result: state.result().as_ref().map(result_res),
        notice: session
            .notice(Instant::now())
            .map(|notice| notice_res(&notice, Instant::now())),
    })
}

fn result_res(result: &SubmissionResult) -> ResultRes {
    let mut res = ResultRes {
        status: String::new(),
        classification: None,
        headline: None,
        guidance_heading: None,
        guidance: Vec::new(),
        failure: None,
        missing_fields: Vec::new(),
        out_of_range: Vec::new(),
    };

    match result {
        SubmissionResult::Pending => res.status = "pending".into(),
        SubmissionResult::Success(classification) => {
            let guidance = classification.guidance();
            res.status = "success".into();
            res.classification = Some(classification.abbreviation().into());
            res.headline = Some(classification.headline().into());
            res.guidance_heading = Some(guidance.heading.into());
            res.guidance = guidance
                .items
                .iter()
                .map(|item| GuidanceItemRes {
                    topic: item.topic.into(),
                    advice: item.advice.into(),
                })
                .collect();
        }
        SubmissionResult::Failure(reason) => {
            res.status = "failure".into();
            match reason {
                FailureReason::MissingRequiredFields(missing) => {
                    res.failure = Some("missing_required_fields".into());
                    res.missing_fields = missing.clone();
                }
                FailureReason::OutOfRange(violations) => {
                    res.failure = Some("out_of_range".into());
                    res.out_of_range = violations
                        .iter()
                        .map(|v| RangeViolationRes {
                            field: v.field.clone(),
                            label: v.label.clone(),
                            value: v.value.clone(),
                            min: v.min,
                            max: v.max,
                        })
                        .collect();
                }
                FailureReason::RemoteCallFailure(_) => {
                    res.failure = Some("remote_call_failure".into());
                }
            }
        }
    }
    res
}

fn notice_res(notice: &Notice, now: Instant) -> NoticeRes {
    let kind = match notice.kind {
        NoticeKind::MissingRequiredFields => "missing_required_fields",
        NoticeKind::OutOfRange => "out_of_range",
        NoticeKind::RemoteFailure => "remote_failure",
    };
    NoticeRes {
        kind: kind.into(),
        title: notice.title.clone(),
        message: notice.message.clone(),
        remaining_ms: notice
            .remaining(now)
            .map(|remaining| u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX)),
    }
}
