use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{
    CompanySignals, PatternInfo, PersonRecord, ScoredLead, SiteInput, SiteReport,
};
use crate::crm::{CrmSink, HubSpotSink, PushOutcome, SalesforceSink};
use crate::enrichment::{enrich_company, firmographics_enrich, wappalyzer_enrich};
use crate::leads::{dedupe_people, generate_candidates, infer_patterns, matches_target_role, score_leads};
use crate::utils::dns::{check_mx, create_resolver};
use crate::utils::smtp::SmtpVerifier;
use crate::utils::text::harvest_emails;
use crate::verification::{
    apply_verification, collect_verifiable_emails, results_by_email, MailboxProbe, RateLimiter,
    VerificationOutcome, Verifier,
};

use reqwest::Client;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use trust_dns_resolver::TokioAsyncResolver;
use url::Url;

/// A site whose URL and domain have been checked.
#[derive(Debug, Clone)]
pub(crate) struct ValidatedSite {
    pub url: Url,
    pub domain: String,
}

/// Owns the shared network resources and runs the per-site pipeline.
#[derive(Clone)]
pub struct LeadSleuth {
    config: Arc<Config>,
    http_client: Client,
    dns_resolver: Arc<TokioAsyncResolver>,
    /// One budget for every verification run of this process.
    verification_limiter: Arc<RateLimiter>,
}

impl LeadSleuth {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        tracing::debug!("Initializing LeadSleuth components...");
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;
        tracing::debug!("HTTP client initialized.");
        let dns_resolver = Arc::new(create_resolver(config)?);
        tracing::debug!("DNS resolver initialized.");
        let verification_limiter = Arc::new(RateLimiter::per_minute(config.verifications_per_minute));

        tracing::info!("LeadSleuth initialized successfully.");
        Ok(Self {
            config: Arc::new(config.clone()),
            http_client,
            dns_resolver,
            verification_limiter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enrichment, MX check and the lead pipeline for one validated site.
    pub(crate) async fn process_site(&self, site: &SiteInput, target: &ValidatedSite) -> SiteReport {
        let task_label = format!("[{}]", target.domain);
        let start_time = Instant::now();
        tracing::info!(target: "lead_pipeline", "{} Starting site processing", task_label);

        let signals = enrich_company(site, &target.domain);
        let wappalyzer = wappalyzer_enrich(&self.http_client, &self.config, target.url.as_str()).await;
        let firmographics =
            firmographics_enrich(&self.http_client, &self.config, &target.domain).await;
        tracing::debug!(target: "enrichment",
            "{} wappalyzer={}, firmographics={}", task_label, wappalyzer.status, firmographics.status
        );

        let mx_ok = check_mx(&self.dns_resolver, &target.domain).await;
        tracing::debug!(target: "lead_pipeline", "{} MX valid: {}", task_label, mx_ok);

        let (pattern, mut leads) = build_site_leads(site, &signals, mx_ok, &self.config);
        for lead in leads.iter_mut() {
            lead.wappalyzer_status = wappalyzer.status.clone();
            lead.firmographics_status = firmographics.status.clone();
            if let Some(firmo) = &firmographics.data {
                lead.attach_firmographics(firmo);
            }
        }

        tracing::info!(target: "lead_pipeline",
            "{} Finished in {:.2?}: {} lead(s), pattern {}",
            task_label, start_time.elapsed(), leads.len(), pattern.label().unwrap_or("none")
        );
        SiteReport {
            url: target.url.to_string(),
            domain: Some(target.domain.clone()),
            pattern,
            mx_ok,
            leads,
            error: None,
        }
    }

    /// Probes every unique lead email and writes `smtp_verified` back.
    pub async fn verify_leads(&self, leads: &mut [ScoredLead]) -> Result<Vec<VerificationOutcome>> {
        let emails = collect_verifiable_emails(leads);
        if emails.is_empty() {
            tracing::info!(target: "verification", "No verifiable addresses among {} lead(s).", leads.len());
            return Ok(Vec::new());
        }
        let probe = SmtpVerifier::new(Arc::clone(&self.config), Arc::clone(&self.dns_resolver))?;
        Ok(self.verify_leads_with(probe, leads).await)
    }

    /// Same as [`verify_leads`](Self::verify_leads) with a caller-supplied
    /// probe. Every call draws on the sleuth's single rate limiter.
    pub async fn verify_leads_with<P: MailboxProbe>(
        &self,
        probe: P,
        leads: &mut [ScoredLead],
    ) -> Vec<VerificationOutcome> {
        let emails = collect_verifiable_emails(leads);
        if emails.is_empty() {
            return Vec::new();
        }
        let verifier = Verifier::from_config(probe, Arc::clone(&self.verification_limiter), &self.config);
        let outcomes = verifier.verify_batch(&emails).await;
        apply_verification(leads, &results_by_email(&outcomes));
        outcomes
    }

    /// CRM sinks in push order.
    pub fn crm_sinks(&self, hubspot: bool, salesforce: bool) -> Vec<Box<dyn CrmSink>> {
        let mut sinks: Vec<Box<dyn CrmSink>> = Vec::new();
        if hubspot {
            sinks.push(Box::new(HubSpotSink::new(self.http_client.clone(), &self.config)));
        }
        if salesforce {
            sinks.push(Box::new(SalesforceSink::new(self.http_client.clone(), &self.config)));
        }
        sinks
    }

    pub async fn push_leads(&self, sink: &dyn CrmSink, leads: &[ScoredLead]) -> PushOutcome {
        let outcome = sink.push(leads).await;
        if outcome.ok {
            tracing::info!(target: "crm", "[{}] Pushed {} lead(s)", sink.name(), outcome.count);
        } else {
            tracing::warn!(target: "crm",
                "[{}] Push failed: {}", sink.name(), outcome.status.as_deref().unwrap_or("unknown")
            );
        }
        outcome
    }
}

/// Observed addresses in discovery order: the provided ones, then those
/// harvested from pages. Anything `email_regex` rejects is dropped.
fn observed_emails(site: &SiteInput, email_regex: &Regex) -> Vec<String> {
    let provided = site
        .emails
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let harvested = harvest_emails(site.pages.values().map(String::as_str));

    let mut seen = HashSet::new();
    provided
        .chain(harvested)
        .filter(|e| email_regex.is_match(e))
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

/// The synchronous core of site processing: pattern inference, role-gated
/// candidate generation, found-then-generated deduplication and scoring.
pub fn build_site_leads(
    site: &SiteInput,
    signals: &CompanySignals,
    mx_ok: bool,
    config: &Config,
) -> (PatternInfo, Vec<ScoredLead>) {
    let domain = signals.domain.as_str();
    let observed = observed_emails(site, &config.email_regex);
    let pattern = infer_patterns(&observed, domain);
    tracing::debug!(target: "lead_pipeline",
        "[{}] {} observed address(es), best pattern {:?}", domain, observed.len(), pattern.label()
    );

    let found: Vec<PersonRecord> = site.people.iter().map(PersonRecord::from).collect();
    let candidates: Vec<PersonRecord> = site
        .people
        .iter()
        .filter(|p| matches_target_role(&p.role, &config.target_roles))
        .flat_map(|p| generate_candidates(p, domain, &pattern))
        .filter(|c| c.email.as_deref().is_some_and(|e| config.email_regex.is_match(e)))
        .collect();
    tracing::debug!(target: "lead_pipeline",
        "[{}] {} found people, {} generated candidate(s)", domain, found.len(), candidates.len()
    );

    let combined: Vec<PersonRecord> = found.into_iter().chain(candidates).collect();
    let before = combined.len();
    let people = dedupe_people(combined, config.fuzzy_threshold);
    tracing::debug!(target: "lead_pipeline",
        "[{}] Dedup kept {} of {} record(s)", domain, people.len(), before
    );

    let leads = score_leads(&people, mx_ok, signals, &pattern);
    (pattern, leads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{EmailPattern, ExtractedPerson, LeadSource};
    use pretty_assertions::assert_eq;

    fn person(name: &str, role: &str) -> ExtractedPerson {
        ExtractedPerson {
            name: name.into(),
            role: role.into(),
        }
    }

    fn signals() -> CompanySignals {
        CompanySignals {
            name: "Acme".into(),
            domain: "acme.co".into(),
            tech_stack: ["HubSpot".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn test_found_person_beats_own_generated_candidate() {
        let site = SiteInput {
            url: "https://acme.co".into(),
            people: vec![person("Jane Doe", "Head of Growth"), person("Bob Stone", "Accountant")],
            emails: vec!["john.smith@acme.co".into(), "mary.jones@acme.co".into(), "x@other.io".into()],
            ..SiteInput::default()
        };
        let (pattern, leads) = build_site_leads(&site, &signals(), true, &Config::default());

        assert_eq!(pattern.best_pattern, Some(EmailPattern::FirstDotLast));
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].name, "Jane Doe");
        assert_eq!(leads[0].source, LeadSource::Found);
        assert_eq!(leads[0].role, "Head of Growth");
        // 50 + 12 role + 8 pattern + 10 mx + 5 crm
        assert_eq!(leads[0].lead_score, 85);
        assert_eq!(leads[1].lead_score, 73);
        assert!(leads.iter().all(|l| l.company_domain == "acme.co"));
    }

    #[test]
    fn test_candidates_survive_when_threshold_disables_fuzzy_merge() {
        let site = SiteInput {
            url: "https://acme.co".into(),
            people: vec![person("Jane Doe", "VP Sales")],
            pages: [("/team".to_string(), "<p>Write to jane@acme.co</p>".to_string())]
                .into_iter()
                .collect(),
            ..SiteInput::default()
        };
        let mut config = Config::default();
        // Above the 0-100 scale: only exact emails can merge.
        config.fuzzy_threshold = 101;
        let (pattern, leads) = build_site_leads(&site, &signals(), false, &config);

        assert_eq!(pattern.best_pattern, Some(EmailPattern::First));
        let emails: Vec<Option<&str>> = leads.iter().map(|l| l.email.as_deref()).collect();
        assert_eq!(emails, vec![None, Some("jane@acme.co")]);
        assert_eq!(leads[1].source, LeadSource::Pattern);
    }

    #[test]
    fn test_tie_breaks_on_discovery_order_of_observed_emails() {
        let site = SiteInput {
            url: "https://acme.co".into(),
            emails: vec!["sales@acme.co".into(), "jane.doe@acme.co".into()],
            ..SiteInput::default()
        };
        let (pattern, _) = build_site_leads(&site, &signals(), true, &Config::default());
        assert_eq!(pattern.best_pattern, Some(EmailPattern::First));
    }

    #[test]
    fn test_email_regex_filters_observed_and_generated_addresses() {
        let site = SiteInput {
            url: "https://acme.co".into(),
            people: vec![person("José Núñez", "VP Sales")],
            emails: vec![
                "a b@acme.co".into(),
                "c d@acme.co".into(),
                "john.smith@acme.co".into(),
            ],
            ..SiteInput::default()
        };
        let mut config = Config::default();
        config.fuzzy_threshold = 101;
        let (pattern, leads) = build_site_leads(&site, &signals(), true, &config);

        assert_eq!(pattern.best_pattern, Some(EmailPattern::FirstDotLast));
        assert_eq!(pattern.counts.values().sum::<usize>(), 1);
        // "josé.núñez@acme.co" is not a valid address, so only the found record stays.
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].email, None);
    }

    #[test]
    fn test_non_target_roles_get_no_candidates() {
        let site = SiteInput {
            url: "https://acme.co".into(),
            people: vec![person("Ann Lee", "Office Manager")],
            ..SiteInput::default()
        };
        let mut config = Config::default();
        config.fuzzy_threshold = 101;
        let (_, leads) = build_site_leads(&site, &signals(), false, &config);
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].email, None);
    }

    struct AcceptAll;

    #[async_trait::async_trait]
    impl MailboxProbe for AcceptAll {
        async fn probe(&self, _email: &str) -> crate::utils::smtp::SmtpVerificationResult {
            crate::utils::smtp::SmtpVerificationResult::conclusive(true, "250 OK")
        }
    }

    fn lead_with(email: &str) -> ScoredLead {
        ScoredLead {
            email: Some(email.into()),
            ..ScoredLead::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_spans_verify_calls() {
        let mut config = Config::default();
        config.verifications_per_minute = 1;
        config.max_verification_attempts = 1;
        let sleuth = LeadSleuth::new(&config).unwrap();

        let start = tokio::time::Instant::now();
        let mut first = vec![lead_with("jane@acme.co")];
        sleuth.verify_leads_with(AcceptAll, &mut first).await;
        let mut second = vec![lead_with("john@acme.co")];
        sleuth.verify_leads_with(AcceptAll, &mut second).await;

        assert!(start.elapsed() >= std::time::Duration::from_secs(60));
        assert_eq!(first[0].smtp_verified, Some(true));
        assert_eq!(second[0].smtp_verified, Some(true));
    }

    #[test]
    fn test_empty_site_yields_no_leads() {
        let (pattern, leads) = build_site_leads(&SiteInput::default(), &signals(), false, &Config::default());
        assert_eq!(pattern, PatternInfo::default());
        assert!(leads.is_empty());
    }
}
