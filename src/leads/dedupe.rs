//! Drops duplicate people: exact email first, then fuzzy name similarity.
//!
//! The fuzzy pass is a heuristic. Two different people with near-identical
//! names ("Jon Smith" and "John Smith") can be merged at high thresholds,
//! which is why the threshold is configuration rather than a constant.

use crate::core::models::{PersonRecord, ScoredLead};
use std::collections::{BTreeSet, HashSet};

/// Default similarity threshold on the 0-100 scale.
pub const DEFAULT_FUZZY_THRESHOLD: u8 = 93;

/// Anything the deduplicator can inspect.
pub trait LeadIdentity {
    fn identity_name(&self) -> &str;
    fn identity_email(&self) -> Option<&str>;
}

impl LeadIdentity for PersonRecord {
    fn identity_name(&self) -> &str {
        &self.name
    }
    fn identity_email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

impl LeadIdentity for ScoredLead {
    fn identity_name(&self) -> &str {
        &self.name
    }
    fn identity_email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

fn tokens(name: &str) -> BTreeSet<String> {
    name.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '-').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn join_tokens<'a>(set: impl Iterator<Item = &'a String>) -> String {
    set.map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Order-independent token-set similarity in `0..=100`.
///
/// Identical token sets and subset relations ("John Smith" vs "John A. Smith")
/// score 100; empty names score 0 against anything. Otherwise the best edit
/// similarity between the shared tokens and each side's full sorted token
/// string is returned.
pub fn token_set_similarity(a: &str, b: &str) -> u8 {
    let left = tokens(a);
    let right = tokens(b);
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let shared: Vec<&String> = left.intersection(&right).collect();
    let only_left: Vec<&String> = left.difference(&right).collect();
    let only_right: Vec<&String> = right.difference(&left).collect();

    if !shared.is_empty() && (only_left.is_empty() || only_right.is_empty()) {
        return 100;
    }

    let sect = join_tokens(shared.iter().copied());
    let diff_left = join_tokens(only_left.iter().copied());
    let diff_right = join_tokens(only_right.iter().copied());

    let (combined_left, combined_right) = if sect.is_empty() {
        (diff_left, diff_right)
    } else {
        (
            format!("{} {}", sect, diff_left),
            format!("{} {}", sect, diff_right),
        )
    };

    let mut best = ratio(&combined_left, &combined_right);
    if !sect.is_empty() {
        best = best
            .max(ratio(&sect, &combined_left))
            .max(ratio(&sect, &combined_right));
    }
    best.round().clamp(0.0, 100.0) as u8
}

/// Keeps the first record per email and per fuzzy name cluster, in input order.
///
/// `name_of` and `email_of` pick the fields to compare. Emails compare
/// case-insensitively; empty emails never count as seen.
pub fn dedupe_by<T, N, E>(rows: Vec<T>, name_of: N, email_of: E, threshold: u8) -> Vec<T>
where
    N: Fn(&T) -> &str,
    E: Fn(&T) -> Option<&str>,
{
    let total = rows.len();
    let mut seen_emails: HashSet<String> = HashSet::new();
    let mut kept_names: Vec<String> = Vec::new();
    let mut out = Vec::with_capacity(total);

    for row in rows {
        let email = email_of(&row).map(|e| e.trim().to_lowercase()).unwrap_or_default();
        let name = name_of(&row).trim().to_string();

        if !email.is_empty() && seen_emails.contains(&email) {
            tracing::trace!(target: "lead_pipeline", "Dropping '{}': email {} already kept", name, email);
            continue;
        }

        if let Some(existing) = kept_names
            .iter()
            .find(|existing| token_set_similarity(existing, &name) >= threshold)
        {
            tracing::trace!(target: "lead_pipeline", "Dropping '{}': near-duplicate of '{}'", name, existing);
            continue;
        }

        if !email.is_empty() {
            seen_emails.insert(email);
        }
        kept_names.push(name);
        out.push(row);
    }

    tracing::debug!(target: "lead_pipeline", "Deduplicated {} records down to {}", total, out.len());
    out
}

/// [`dedupe_by`] over the identity fields of a record type.
pub fn dedupe_people<T: LeadIdentity>(rows: Vec<T>, threshold: u8) -> Vec<T> {
    dedupe_by(
        rows,
        |r: &T| r.identity_name(),
        |r: &T| r.identity_email(),
        threshold,
    )
}
