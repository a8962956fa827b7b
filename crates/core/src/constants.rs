//! Constants used throughout the SGA core crate.
//!
//! Environment variable names, notice lifetimes and the fixed wording shown to clinicians live
//! here so the REST server and the CLI present identical text.

use std::time::Duration;

/// Environment variable holding the imputation service URL.
pub const IMPUTE_URL_ENV: &str = "SGA_IMPUTE_URL";

/// Environment variable holding the binary classification service URL.
pub const CLASSIFY_URL_ENV: &str = "SGA_CLASSIFY_URL";

/// Environment variable holding the optional patient history base URL.
pub const PATIENT_API_URL_ENV: &str = "SGA_PATIENT_API_URL";

/// Environment variable holding the optional remote call timeout, in whole seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "SGA_REQUEST_TIMEOUT_SECS";

/// Environment variable holding the REST listen address.
pub const REST_ADDR_ENV: &str = "SGA_REST_ADDR";

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Environment variable holding how long an untouched REST session is kept, in whole seconds.
pub const SESSION_TTL_ENV: &str = "SGA_SESSION_TTL_SECS";

/// Idle lifetime of a REST assessment session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// How long the "required fields incomplete" notice stays up.
pub const REQUIRED_NOTICE_LIFETIME: Duration = Duration::from_secs(5);

/// How long an out-of-range notice stays up.
pub const RANGE_NOTICE_LIFETIME: Duration = Duration::from_secs(3);

pub const REQUIRED_NOTICE_TITLE: &str = "Required Fields Incomplete";

pub const REQUIRED_NOTICE_MESSAGE: &str = "Please ensure that the Maternal Age, Gender, \
     Estimated Fetal Weight, Femur Length, Gestational Age, Head Circumference and Abdominal \
     Circumference are filled.";

pub const RANGE_NOTICE_MESSAGE: &str =
    "The value is illogical and out of range, please check again.";

pub const REMOTE_FAILURE_MESSAGE: &str = "An error occurred. Please try again.";

/// Shown while the imputation and classification calls are in flight.
pub const PROCESSING_MESSAGE: &str = "Processing... It might take up to few minutes.";
