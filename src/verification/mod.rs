//! Mailbox verification: a single-probe seam plus the rate limiter and
//! retry policy composed around it.

mod limiter;
mod retry;
mod verifier;

pub use limiter::RateLimiter;
pub use retry::RetryPolicy;
pub use verifier::{
    apply_verification, collect_verifiable_emails, results_by_email, VerificationOutcome, Verifier,
};

use crate::utils::smtp::SmtpVerificationResult;
use async_trait::async_trait;

/// One attempt at deciding whether a mailbox exists.
///
/// Implementations must not fail: network problems are reported through an
/// inconclusive [`SmtpVerificationResult`].
#[async_trait]
pub trait MailboxProbe: Send + Sync {
    async fn probe(&self, email: &str) -> SmtpVerificationResult;
}
