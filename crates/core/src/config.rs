//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! nothing in the submission path reads process-wide environment variables. Binaries read the
//! raw values from the environment and hand them to the `*_from_env_value` helpers here.

use crate::constants::{
    CLASSIFY_URL_ENV, DEFAULT_SESSION_TTL, IMPUTE_URL_ENV, PATIENT_API_URL_ENV,
    REQUEST_TIMEOUT_ENV, SESSION_TTL_ENV,
};
use crate::error::{AssessmentError, AssessmentResult};
use reqwest::Url;
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    impute_url: Url,
    classify_url: Url,
    patient_api_url: Option<Url>,
    request_timeout: Option<Duration>,
}

impl CoreConfig {
    pub fn new(
        impute_url: Url,
        classify_url: Url,
        patient_api_url: Option<Url>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            impute_url,
            classify_url,
            patient_api_url,
            request_timeout,
        }
    }

    /// Builds the configuration from raw environment values.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Config` if either prediction service URL is missing or any
    /// URL or the timeout fails to parse.
    pub fn from_env_values(
        impute_url: Option<String>,
        classify_url: Option<String>,
        patient_api_url: Option<String>,
        request_timeout: Option<String>,
    ) -> AssessmentResult<Self> {
        let impute_url = service_url_from_env_value(IMPUTE_URL_ENV, impute_url)?
            .ok_or_else(|| missing(IMPUTE_URL_ENV))?;
        let classify_url = service_url_from_env_value(CLASSIFY_URL_ENV, classify_url)?
            .ok_or_else(|| missing(CLASSIFY_URL_ENV))?;
        let patient_api_url = service_url_from_env_value(PATIENT_API_URL_ENV, patient_api_url)?;
        let request_timeout = request_timeout_from_env_value(request_timeout)?;

        Ok(Self::new(
            impute_url,
            classify_url,
            patient_api_url,
            request_timeout,
        ))
    }

    pub fn impute_url(&self) -> &Url {
        &self.impute_url
    }

    pub fn classify_url(&self) -> &Url {
        &self.classify_url
    }

    pub fn patient_api_url(&self) -> Option<&Url> {
        self.patient_api_url.as_ref()
    }

    /// Remote call timeout; `None` means calls wait as long as the service takes.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

fn missing(var: &str) -> AssessmentError {
    AssessmentError::Config(format!("{var} must be set"))
}

/// Parses an optional service URL. Blank values count as unset.
///
/// Only `http` and `https` URLs are accepted.
pub fn service_url_from_env_value(var: &str, value: Option<String>) -> AssessmentResult<Option<Url>> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let url = Url::parse(&value)
        .map_err(|e| AssessmentError::Config(format!("{var} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AssessmentError::Config(format!(
            "{var} must use http or https (got {})",
            url.scheme()
        )));
    }
    Ok(Some(url))
}

/// Parses the remote call timeout in whole seconds.
///
/// Unset, blank or `0` mean no timeout.
pub fn request_timeout_from_env_value(value: Option<String>) -> AssessmentResult<Option<Duration>> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let secs: u64 = value.parse().map_err(|_| {
        AssessmentError::Config(format!(
            "{REQUEST_TIMEOUT_ENV} must be a whole number of seconds (got {value})"
        ))
    })?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

/// Parses the idle lifetime of REST sessions in whole seconds.
///
/// Unset or blank falls back to `DEFAULT_SESSION_TTL`. Zero is rejected since every session
/// would expire before its next request.
pub fn session_ttl_from_env_value(value: Option<String>) -> AssessmentResult<Duration> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_SESSION_TTL);
    };

    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AssessmentError::Config(format!(
            "{SESSION_TTL_ENV} must be a positive whole number of seconds (got {value})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_values_requires_both_prediction_urls() {
        let err = CoreConfig::from_env_values(
            Some("http://localhost:8000/impute".into()),
            None,
            None,
            None,
        )
        .expect_err("should require classify url");
        assert!(matches!(err, AssessmentError::Config(msg) if msg.contains(CLASSIFY_URL_ENV)));
    }

    #[test]
    fn test_from_env_values_defaults_to_no_timeout() {
        let cfg = CoreConfig::from_env_values(
            Some("http://localhost:8000/impute".into()),
            Some("http://localhost:8000/classify".into()),
            Some("  ".into()),
            None,
        )
        .expect("should parse");
        assert_eq!(cfg.impute_url().path(), "/impute");
        assert!(cfg.patient_api_url().is_none());
        assert!(cfg.request_timeout().is_none());
    }

    #[test]
    fn test_service_url_rejects_other_schemes() {
        let err = service_url_from_env_value(IMPUTE_URL_ENV, Some("ftp://example.org".into()))
            .expect_err("should reject ftp");
        assert!(matches!(err, AssessmentError::Config(msg) if msg.contains("http or https")));
    }

    #[test]
    fn test_service_url_rejects_garbage() {
        let err = service_url_from_env_value(IMPUTE_URL_ENV, Some("not a url".into()))
            .expect_err("should reject garbage");
        assert!(matches!(err, AssessmentError::Config(msg) if msg.contains("not a valid URL")));
    }

    #[test]
    fn test_request_timeout_parsing() {
        assert_eq!(
            request_timeout_from_env_value(Some("30".into())).expect("parse"),
            Some(Duration::from_secs(30))
        );
        assert_eq!(request_timeout_from_env_value(Some("0".into())).expect("parse"), None);
        assert!(request_timeout_from_env_value(Some("soon".into())).is_err());
    }

    #[test]
    fn test_session_ttl_parsing() {
        assert_eq!(session_ttl_from_env_value(None).expect("parse"), DEFAULT_SESSION_TTL);
        assert_eq!(
            session_ttl_from_env_value(Some(" 600 ".into())).expect("parse"),
            Duration::from_secs(600)
        );
        let err = session_ttl_from_env_value(Some("0".into())).expect_err("zero ttl");
        assert!(matches!(err, AssessmentError::Config(msg) if msg.contains(SESSION_TTL_ENV)));
        assert!(session_ttl_from_env_value(Some("forever".into())).is_err());
    }
}
