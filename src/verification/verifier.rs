//! Rate-limited, retrying batch verification over any [`MailboxProbe`].

use super::limiter::RateLimiter;
use super::retry::RetryPolicy;
use super::MailboxProbe;
use crate::core::config::Config;
use crate::core::models::ScoredLead;
use crate::utils::domain::is_verifiable_email;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Final answer for one address after retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub email: String,
    /// True only when a probe saw a 2xx answer to RCPT TO.
    pub verified: bool,
    pub attempts: u32,
    pub message: String,
}

/// Applies the limiter and the retry policy around every probe.
///
/// The limiter is gated per attempt, so a retry spends a slot like a first
/// try does. Cloning shares the limiter.
pub struct Verifier<P> {
    probe: Arc<P>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    concurrency: usize,
}

impl<P> Clone for Verifier<P> {
    fn clone(&self) -> Self {
        Self {
            probe: Arc::clone(&self.probe),
            limiter: Arc::clone(&self.limiter),
            retry: self.retry,
            concurrency: self.concurrency,
        }
    }
}

impl<P: MailboxProbe> Verifier<P> {
    pub fn new(probe: P, limiter: Arc<RateLimiter>, retry: RetryPolicy, concurrency: usize) -> Self {
        Self {
            probe: Arc::new(probe),
            limiter,
            retry,
            concurrency: concurrency.max(1),
        }
    }

    /// Builds the verifier from the verification section of `config`,
    /// gated by a limiter the caller owns and may share between runs.
    pub fn from_config(probe: P, limiter: Arc<RateLimiter>, config: &Config) -> Self {
        Self::new(
            probe,
            limiter,
            RetryPolicy::new(config.max_verification_attempts, config.retry_backoff),
            config.verification_concurrency,
        )
    }

    pub async fn verify_one(&self, email: &str) -> VerificationOutcome {
        let probe = &self.probe;
        let limiter = &self.limiter;
        let (result, attempts) = self
            .retry
            .run(email, || async move {
                limiter.acquire().await;
                probe.probe(email).await
            })
            .await;

        tracing::debug!(target: "verification",
            "{} -> exists={:?} after {} attempt(s): {}",
            email, result.exists, attempts, result.message
        );
        VerificationOutcome {
            email: email.to_string(),
            verified: result.is_accepted(),
            attempts,
            message: result.message,
        }
    }

    /// Verifies every address. One failing probe never affects the others;
    /// outcomes arrive in completion order.
    pub async fn verify_batch(&self, emails: &[String]) -> Vec<VerificationOutcome> {
        tracing::info!(target: "verification",
            "Verifying {} address(es), concurrency {}, at most {} probe(s) per minute",
            emails.len(), self.concurrency, self.limiter.max_calls()
        );
        stream::iter(emails.iter())
            .map(|email| self.verify_one(email))
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

/// Indexes outcomes by email for joining back onto leads.
pub fn results_by_email(outcomes: &[VerificationOutcome]) -> HashMap<String, bool> {
    outcomes
        .iter()
        .map(|o| (o.email.clone(), o.verified))
        .collect()
}

/// Unique verifiable addresses of `leads`, sorted.
pub fn collect_verifiable_emails(leads: &[ScoredLead]) -> Vec<String> {
    leads
        .iter()
        .filter_map(|lead| lead.email.as_deref())
        .map(str::trim)
        .filter(|email| is_verifiable_email(email))
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Writes `smtp_verified` by exact email match. Leads without a result
/// (including those without an email) are left untouched.
pub fn apply_verification(leads: &mut [ScoredLead], results: &HashMap<String, bool>) {
    for lead in leads.iter_mut() {
        if let Some(verified) = lead
            .email
            .as_deref()
            .and_then(|email| results.get(email.trim()))
        {
            lead.smtp_verified = Some(*verified);
        }
    }
}
