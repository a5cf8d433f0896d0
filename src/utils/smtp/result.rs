//! Outcome of a single RCPT probe.

/// `exists` is `Some(true)` only for a 2xx answer to RCPT TO, `Some(false)`
/// for a definitive rejection, `None` when the probe could not decide.
/// `should_retry` marks inconclusive outcomes worth one more attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpVerificationResult {
    pub exists: Option<bool>,
    pub message: String,
    pub should_retry: bool,
}

impl SmtpVerificationResult {
    pub fn conclusive(exists: bool, message: impl Into<String>) -> Self {
        Self {
            exists: Some(exists),
            message: message.into(),
            should_retry: false,
        }
    }

    pub fn inconclusive_retry(message: impl Into<String>) -> Self {
        Self {
            exists: None,
            message: message.into(),
            should_retry: true,
        }
    }

    pub fn inconclusive_no_retry(message: impl Into<String>) -> Self {
        Self {
            exists: None,
            message: message.into(),
            should_retry: false,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.exists == Some(true)
    }
}
