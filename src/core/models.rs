//! Data records flowing through the lead pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The fixed set of local-part templates the pipeline knows about.
///
/// Variant order is the fallback generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EmailPattern {
    #[serde(rename = "{first}@{domain}")]
    First,
    #[serde(rename = "{first}.{last}@{domain}")]
    FirstDotLast,
    #[serde(rename = "{f}{last}@{domain}")]
    InitialLast,
    #[serde(rename = "{first}{l}@{domain}")]
    FirstInitial,
    #[serde(rename = "{f}.{last}@{domain}")]
    InitialDotLast,
}

impl EmailPattern {
    /// Fallback set used when no pattern could be inferred for a domain.
    pub const ALL: [EmailPattern; 5] = [
        EmailPattern::First,
        EmailPattern::FirstDotLast,
        EmailPattern::InitialLast,
        EmailPattern::FirstInitial,
        EmailPattern::InitialDotLast,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EmailPattern::First => "{first}@{domain}",
            EmailPattern::FirstDotLast => "{first}.{last}@{domain}",
            EmailPattern::InitialLast => "{f}{last}@{domain}",
            EmailPattern::FirstInitial => "{first}{l}@{domain}",
            EmailPattern::InitialDotLast => "{f}.{last}@{domain}",
        }
    }

    /// Whether the template needs a last name (or its initial).
    pub fn needs_last(&self) -> bool {
        !matches!(self, EmailPattern::First)
    }

    /// Renders the local part, or `None` when a referenced segment is empty.
    pub fn local_part(&self, parts: &NameParts) -> Option<String> {
        if parts.first.is_empty() || (self.needs_last() && parts.last.is_empty()) {
            return None;
        }
        let local = match self {
            EmailPattern::First => parts.first.clone(),
            EmailPattern::FirstDotLast => format!("{}.{}", parts.first, parts.last),
            EmailPattern::InitialLast => format!("{}{}", parts.first_initial, parts.last),
            EmailPattern::FirstInitial => format!("{}{}", parts.first, parts.last_initial),
            EmailPattern::InitialDotLast => format!("{}.{}", parts.first_initial, parts.last),
        };
        Some(local)
    }
}

impl fmt::Display for EmailPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower-cased name decomposition used for candidate generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub first: String,
    pub last: String,
    pub first_initial: String,
    pub last_initial: String,
}

/// Where a person record came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    /// Extracted from page text.
    #[default]
    Found,
    /// Generated from an email pattern.
    Pattern,
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadSource::Found => f.write_str("found"),
            LeadSource::Pattern => f.write_str("pattern"),
        }
    }
}

/// A (name, role) pair as handed over by the extraction provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPerson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

/// A person before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: String,
    pub role: String,
    pub email: Option<String>,
    pub source: LeadSource,
}

impl From<&ExtractedPerson> for PersonRecord {
    fn from(person: &ExtractedPerson) -> Self {
        Self {
            name: person.name.clone(),
            role: person.role.clone(),
            email: None,
            source: LeadSource::Found,
        }
    }
}

/// Result of pattern inference for a single domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternInfo {
    pub best_pattern: Option<EmailPattern>,
    pub counts: BTreeMap<EmailPattern, usize>,
}

impl PatternInfo {
    pub fn label(&self) -> Option<&'static str> {
        self.best_pattern.map(|p| p.label())
    }
}

/// Company-level signals, computed once per site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySignals {
    pub name: String,
    pub domain: String,
    pub tech_stack: BTreeSet<String>,
}

impl CompanySignals {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tech_stack.contains(tag)
    }

    /// First six tags, comma separated.
    pub fn tech_summary(&self) -> String {
        self.tech_stack
            .iter()
            .take(6)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Optional firmographics returned by the enrichment API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Firmographics {
    pub size: Option<String>,
    pub employees: Option<u64>,
    pub founded_year: Option<u32>,
    pub hq_country: Option<String>,
    pub linkedin: Option<String>,
}

/// The flat output row: one per lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredLead {
    pub name: String,
    pub role: String,
    pub email: Option<String>,
    pub source: LeadSource,
    pub lead_score: u8,
    pub company_name: String,
    pub company_domain: String,
    pub tech_summary: String,
    pub mx_ok: bool,
    pub pattern: Option<String>,
    pub wappalyzer_status: String,
    pub firmographics_status: String,
    pub firmo_size: Option<String>,
    pub firmo_employees: Option<u64>,
    pub firmo_founded_year: Option<u32>,
    pub firmo_hq_country: Option<String>,
    pub firmo_linkedin: Option<String>,
    pub smtp_verified: Option<bool>,
}

impl ScoredLead {
    pub fn attach_firmographics(&mut self, firmo: &Firmographics) {
        self.firmo_size = firmo.size.clone();
        self.firmo_employees = firmo.employees;
        self.firmo_founded_year = firmo.founded_year;
        self.firmo_hq_country = firmo.hq_country.clone();
        self.firmo_linkedin = firmo.linkedin.clone();
    }
}

/// One site as supplied by the bundle and extraction providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInput {
    pub url: String,
    pub domain: Option<String>,
    pub company_name: Option<String>,
    pub tech_stack: Vec<String>,
    /// Raw HTML keyed by path.
    pub pages: BTreeMap<String, String>,
    pub people: Vec<ExtractedPerson>,
    pub emails: Vec<String>,
}

/// Outcome of processing one site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteReport {
    pub url: String,
    pub domain: Option<String>,
    pub pattern: PatternInfo,
    pub mx_ok: bool,
    pub leads: Vec<ScoredLead>,
    pub error: Option<String>,
}

impl SiteReport {
    pub(crate) fn failed(url: &str, reason: String) -> Self {
        Self {
            url: url.to_string(),
            error: Some(reason),
            ..Self::default()
        }
    }
}
