//! Transient notices raised by a failed submission.
//!
//! Validation notices dismiss themselves after a fixed lifetime; the remote failure notice stays
//! until the next submission. Expiry is evaluated against a caller-supplied `Instant` and never
//! touches the submission state.

use crate::constants::{
    RANGE_NOTICE_LIFETIME, RANGE_NOTICE_MESSAGE, REMOTE_FAILURE_MESSAGE, REQUIRED_NOTICE_LIFETIME,
    REQUIRED_NOTICE_MESSAGE, REQUIRED_NOTICE_TITLE,
};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    MissingRequiredFields,
    OutOfRange,
    RemoteFailure,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    raised_at: Instant,
    lifetime: Option<Duration>,
}

impl Notice {
    pub fn missing_required(raised_at: Instant) -> Self {
        Self {
            kind: NoticeKind::MissingRequiredFields,
            title: REQUIRED_NOTICE_TITLE.to_owned(),
            message: REQUIRED_NOTICE_MESSAGE.to_owned(),
            raised_at,
            lifetime: Some(REQUIRED_NOTICE_LIFETIME),
        }
    }

    /// Notice naming the offending field labels, e.g. "Error with Maternal Age".
    pub fn out_of_range<'a>(labels: impl IntoIterator<Item = &'a str>, raised_at: Instant) -> Self {
        let labels: Vec<&str> = labels.into_iter().collect();
        Self {
            kind: NoticeKind::OutOfRange,
            title: format!("Error with {}", labels.join(", ")),
            message: RANGE_NOTICE_MESSAGE.to_owned(),
            raised_at,
            lifetime: Some(RANGE_NOTICE_LIFETIME),
        }
    }

    pub fn remote_failure(raised_at: Instant) -> Self {
        Self {
            kind: NoticeKind::RemoteFailure,
            title: REMOTE_FAILURE_MESSAGE.to_owned(),
            message: REMOTE_FAILURE_MESSAGE.to_owned(),
            raised_at,
            lifetime: None,
        }
    }

    /// How long after being raised the notice dismisses itself, if ever.
    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.lifetime.map(|lifetime| self.raised_at + lifetime)
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.expires_at().map_or(true, |expires_at| now < expires_at)
    }

    /// Time left before auto-dismissal; `None` for notices that do not expire.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at()
            .map(|expires_at| expires_at.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_notice_expires_after_five_seconds() {
        let raised = Instant::now();
        let notice = Notice::missing_required(raised);
        assert!(notice.is_active(raised + Duration::from_millis(4_999)));
        assert!(!notice.is_active(raised + Duration::from_secs(5)));
    }

    #[test]
    fn test_out_of_range_notice_names_labels_and_expires_after_three_seconds() {
        let raised = Instant::now();
        let notice = Notice::out_of_range(["Maternal Age", "Femur Length"], raised);
        assert_eq!(notice.title, "Error with Maternal Age, Femur Length");
        assert_eq!(notice.lifetime(), Some(Duration::from_secs(3)));
        assert_eq!(
            notice.remaining(raised + Duration::from_secs(1)),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_remote_failure_notice_never_expires() {
        let raised = Instant::now();
        let notice = Notice::remote_failure(raised);
        assert!(notice.is_active(raised + Duration::from_secs(3_600)));
        assert!(notice.remaining(raised).is_none());
    }
}
