//! Infers a domain's dominant email naming convention from observed addresses.

use crate::core::models::{EmailPattern, PatternInfo};
use crate::utils::domain::split_email;
use std::collections::BTreeMap;

/// Buckets a local part into one of the two inferable templates.
fn classify_local_part(local: &str) -> Option<EmailPattern> {
    let segments: Vec<&str> = local.split('.').collect();
    match segments.as_slice() {
        [first, last] if !first.is_empty() && !last.is_empty() => Some(EmailPattern::FirstDotLast),
        [single] if single.chars().count() > 1 => Some(EmailPattern::First),
        _ => None,
    }
}

/// Tallies template shapes over the addresses hosted on `domain`.
///
/// Addresses without `@` and addresses on any other host are skipped; the
/// host must equal `domain` exactly, so callers lower-case both sides. On a
/// tie the template seen first in `emails` wins, so the result depends only
/// on the input order.
pub fn infer_patterns<S: AsRef<str>>(emails: &[S], domain: &str) -> PatternInfo {
    let target = domain.trim();
    let mut counts: BTreeMap<EmailPattern, usize> = BTreeMap::new();
    let mut first_seen: Vec<EmailPattern> = Vec::new();

    for raw in emails {
        let Some((local, host)) = split_email(raw.as_ref().trim()) else {
            tracing::trace!(target: "lead_pipeline", "Skipping malformed address '{}'", raw.as_ref());
            continue;
        };
        if target.is_empty() || host != target {
            continue;
        }
        if let Some(pattern) = classify_local_part(local) {
            *counts.entry(pattern).or_insert(0) += 1;
            if !first_seen.contains(&pattern) {
                first_seen.push(pattern);
            }
        }
    }

    let mut best_pattern: Option<EmailPattern> = None;
    let mut best_count = 0;
    for pattern in first_seen {
        let count = counts.get(&pattern).copied().unwrap_or(0);
        if count > best_count {
            best_pattern = Some(pattern);
            best_count = count;
        }
    }

    tracing::debug!(target: "lead_pipeline",
        "Pattern inference for {}: best={:?}, counts={:?}",
        target, best_pattern.map(|p| p.label()), counts
    );

    PatternInfo {
        best_pattern,
        counts,
    }
}
