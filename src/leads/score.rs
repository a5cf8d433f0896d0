//! Lead quality scoring.

use crate::core::models::{CompanySignals, PatternInfo, PersonRecord, ScoredLead};

const BASE_SCORE: i32 = 50;
const PATTERN_BONUS: i32 = 8;
const MX_BONUS: i32 = 10;
const MX_PENALTY: i32 = -5;
const TAG_MANAGER_BONUS: i32 = 5;
const CRM_BONUS: i32 = 5;
const ANALYTICS_BONUS: i32 = 3;

pub const TAG_MANAGER_TAG: &str = "Google Tag Manager";
pub const CRM_TAG: &str = "HubSpot";
pub const ANALYTICS_TAG: &str = "Google Analytics";

/// Role keyword groups, checked in order; the first hit decides the weight.
const ROLE_WEIGHTS: &[(&[&str], i32)] = &[
    (&["growth", "demand", "marketing"], 12),
    (&["sales"], 8),
    (&["founder", "ceo", "co-founder", "chief executive"], 6),
];

/// Weight for a free-text role; 0 when no keyword group matches.
pub fn role_weight(role: &str) -> i32 {
    let role = role.to_lowercase();
    ROLE_WEIGHTS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| role.contains(k)))
        .map(|(_, weight)| *weight)
        .unwrap_or(0)
}

/// Sum of the bonuses shared by every lead of a domain.
pub fn domain_bonus(mx_ok: bool, signals: &CompanySignals, pattern: &PatternInfo) -> i32 {
    let pattern_bonus = if pattern.best_pattern.is_some() { PATTERN_BONUS } else { 0 };
    let mx_bonus = if mx_ok { MX_BONUS } else { MX_PENALTY };
    let tag_manager = if signals.has_tag(TAG_MANAGER_TAG) { TAG_MANAGER_BONUS } else { 0 };
    let crm = if signals.has_tag(CRM_TAG) { CRM_BONUS } else { 0 };
    let analytics = if signals.has_tag(ANALYTICS_TAG) { ANALYTICS_BONUS } else { 0 };
    pattern_bonus + mx_bonus + tag_manager + crm + analytics
}

/// Clamps a raw score into `1..=100`.
pub fn clamp_score(raw: i32) -> u8 {
    raw.clamp(1, 100) as u8
}

/// Scores each record into a new [`ScoredLead`] carrying the company fields.
///
/// Inputs are left untouched.
pub fn score_leads(
    rows: &[PersonRecord],
    mx_ok: bool,
    signals: &CompanySignals,
    pattern: &PatternInfo,
) -> Vec<ScoredLead> {
    let shared = domain_bonus(mx_ok, signals, pattern);
    let tech_summary = signals.tech_summary();
    let pattern_label = pattern.label().map(String::from);

    rows.iter()
        .map(|row| ScoredLead {
            name: row.name.clone(),
            role: row.role.clone(),
            email: row.email.clone(),
            source: row.source,
            lead_score: clamp_score(BASE_SCORE + role_weight(&row.role) + shared),
            company_name: signals.name.clone(),
            company_domain: signals.domain.clone(),
            tech_summary: tech_summary.clone(),
            mx_ok,
            pattern: pattern_label.clone(),
            ..ScoredLead::default()
        })
        .collect()
}
