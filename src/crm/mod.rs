//! Write-only CRM sinks for scored leads.

mod hubspot;
mod salesforce;

pub use hubspot::HubSpotSink;
pub use salesforce::SalesforceSink;

use crate::core::models::ScoredLead;
use async_trait::async_trait;
use serde::Serialize;

/// Result of one push. `status` explains a failure or partial success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    pub ok: bool,
    pub count: usize,
    pub status: Option<String>,
}

impl PushOutcome {
    pub fn success(count: usize) -> Self {
        Self {
            ok: true,
            count,
            status: None,
        }
    }

    pub fn failure(status: impl Into<String>) -> Self {
        Self {
            ok: false,
            count: 0,
            status: Some(status.into()),
        }
    }
}

/// A CRM that accepts lead rows keyed by email. Pushing never fails the run.
#[async_trait]
pub trait CrmSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn push(&self, leads: &[ScoredLead]) -> PushOutcome;
}

/// Rows that carry a non-empty email, paired with it.
pub(crate) fn pushable(leads: &[ScoredLead]) -> impl Iterator<Item = (&ScoredLead, &str)> {
    leads.iter().filter_map(|lead| {
        lead.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| (lead, e))
    })
}

/// First and last whitespace token of a display name.
pub(crate) fn first_last(name: &str) -> (&str, &str) {
    let mut tokens = name.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    let last = tokens.last().unwrap_or(first);
    (first, last)
}

pub(crate) fn lead_summary(lead: &ScoredLead) -> String {
    format!(
        "Lead score: {}, MX: {}, pattern: {}",
        lead.lead_score,
        lead.mx_ok,
        lead.pattern.as_deref().unwrap_or("none")
    )
}

/// Truncates a response body on a char boundary.
pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
