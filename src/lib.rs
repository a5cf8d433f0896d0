//! # Lead Sleuth Core Library
//!
//! Turns extracted company-site data into scored contact leads: infers the
//! domain's email convention, generates candidate addresses for target roles,
//! removes near-duplicate people and scores each lead. Optional stages probe
//! mailboxes over SMTP and push the rows to CRMs.
//!
//! It is used by the `lead-sleuth` command-line tool but works as a library
//! on its own.

mod core;
pub mod crm;
pub mod enrichment;
pub mod export;
pub mod leads;
mod utils;
pub mod verification;

pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{
    CompanySignals, EmailPattern, ExtractedPerson, Firmographics, LeadSource, PatternInfo,
    PersonRecord, ScoredLead, SiteInput, SiteReport,
};
pub use crate::core::sleuth::{build_site_leads, LeadSleuth};
pub use crate::utils::domain::{is_verifiable_email, split_email};
pub use crate::utils::smtp::{SmtpVerificationResult, SmtpVerifier};
pub use crate::utils::text::harvest_emails;

use crate::core::sleuth::ValidatedSite;
use crate::utils::domain::{get_domain_from_url, normalize_url};
use crate::utils::smtp::test_smtp_connectivity;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Builds the HTTP client and DNS resolver shared by every site.
pub fn initialize_sleuth(config: &Config) -> Result<LeadSleuth> {
    LeadSleuth::new(config)
}

/// Early check that outbound SMTP on the configured port is possible.
pub async fn check_smtp_connectivity(config: &Config) -> Result<()> {
    test_smtp_connectivity(config.smtp_port).await
}

/// Reads a JSON array of [`SiteInput`] records.
pub fn load_sites(path: &Path) -> Result<Vec<SiteInput>> {
    tracing::debug!("Opening input file: {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let sites: Vec<SiteInput> = serde_json::from_reader(reader)?;
    Ok(sites)
}

/// Processes one site. Never fails: a bad site yields a report carrying
/// the error string.
pub async fn process_single_site(sleuth: &LeadSleuth, site: &SiteInput) -> SiteReport {
    let task_id = format!(
        "Site: {}",
        site.domain.as_deref().filter(|d| !d.trim().is_empty()).unwrap_or(site.url.as_str())
    );
    tracing::info!(target: "lead_pipeline", "[{}] Starting processing.", task_id);

    match validate_site_input(site) {
        Ok(target) => sleuth.process_site(site, &target).await,
        Err(reason) => {
            tracing::warn!(target: "lead_pipeline", "[{}] Skipping site. Reason: {}", task_id, reason);
            SiteReport::failed(&site.url, reason)
        }
    }
}

/// Processes sites one after another; `on_done` sees each report as it
/// completes.
pub async fn process_sites<F>(sleuth: &LeadSleuth, sites: &[SiteInput], mut on_done: F) -> Vec<SiteReport>
where
    F: FnMut(&SiteReport),
{
    let mut reports = Vec::with_capacity(sites.len());
    for site in sites {
        let report = process_single_site(sleuth, site).await;
        on_done(&report);
        reports.push(report);
    }
    reports
}

/// Every lead of every report, in site order.
pub fn collect_leads(reports: &[SiteReport]) -> Vec<ScoredLead> {
    reports.iter().flat_map(|r| r.leads.iter().cloned()).collect()
}

fn validate_site_input(site: &SiteInput) -> std::result::Result<ValidatedSite, String> {
    let url_input = site.url.trim();
    let domain_input = site
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(url_input);

    if domain_input.is_empty() {
        return Err("Missing url and domain".to_string());
    }

    let domain = get_domain_from_url(domain_input)
        .map_err(|e| format!("Cannot extract domain from '{}': {}", domain_input, e))?;

    let url_source = if url_input.is_empty() { domain.as_str() } else { url_input };
    let url = normalize_url(url_source).map_err(|e| format!("Invalid URL '{}': {}", url_source, e))?;

    Ok(ValidatedSite { url, domain })
}

/// Counters for the end-of-run log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sites: usize,
    pub failed_sites: usize,
    pub leads: usize,
    pub leads_with_email: usize,
    pub mx_valid_leads: usize,
    pub verified: usize,
}

impl RunSummary {
    pub fn from_run(reports: &[SiteReport], leads: &[ScoredLead]) -> Self {
        Self {
            sites: reports.len(),
            failed_sites: reports.iter().filter(|r| r.error.is_some()).count(),
            leads: leads.len(),
            leads_with_email: leads
                .iter()
                .filter(|l| l.email.as_deref().is_some_and(is_verifiable_email))
                .count(),
            mx_valid_leads: leads.iter().filter(|l| l.mx_ok).count(),
            verified: leads.iter().filter(|l| l.smtp_verified == Some(true)).count(),
        }
    }
}
