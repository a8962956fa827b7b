use std::fmt;

/// Remote collaborators reached over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteService {
    Imputation,
    Classification,
    PatientHistory,
}

impl fmt::Display for RemoteService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteService::Imputation => "imputation service",
            RemoteService::Classification => "classification service",
            RemoteService::PatientHistory => "patient history service",
        };
        f.write_str(name)
    }
}

/// A failed call to one of the remote collaborators.
///
/// These are logged with their full cause and surfaced to clinicians only as a generic notice.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: RemoteService,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} returned HTTP status {status}")]
    Status { service: RemoteService, status: u16 },
    #[error("{service} returned a malformed response: {reason}")]
    Malformed {
        service: RemoteService,
        reason: String,
    },
}

impl RemoteError {
    pub fn service(&self) -> RemoteService {
        match self {
            RemoteError::Transport { service, .. }
            | RemoteError::Status { service, .. }
            | RemoteError::Malformed { service, .. } => *service,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid field schema: {0}")]
    InvalidSchema(String),
    #[error("unknown clinical field: {0}")]
    UnknownField(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("a submission is already in flight for this assessment")]
    SubmissionInFlight,
    #[error("invalid submission transition from {from} on {event}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Text(#[from] sga_types::TextError),
}

pub type AssessmentResult<T> = std::result::Result<T, AssessmentError>;
