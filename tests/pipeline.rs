use async_trait::async_trait;
use lead_sleuth_core::enrichment::enrich_company;
use lead_sleuth_core::export::{export_leads, ExportFormat};
use lead_sleuth_core::verification::{
    apply_verification, collect_verifiable_emails, results_by_email, MailboxProbe, RateLimiter,
    RetryPolicy, Verifier,
};
use lead_sleuth_core::{
    build_site_leads, load_sites, Config, EmailPattern, LeadSource, RunSummary, ScoredLead,
    SmtpVerificationResult,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const SITES: &str = r#"[
  {
    "url": "https://www.acme.co",
    "pages": {
      "/": "<html><head><title>Acme | Rockets</title><script src=\"https://www.googletagmanager.com/gtm.js\"></script></head><body>Contact jane.doe@acme.co or press@other.io</body></html>"
    },
    "people": [
      {"name": "John Smith", "role": "VP Marketing"},
      {"name": "Smith, John", "role": "Marketing lead"},
      {"name": "Mia Wong", "role": "Accountant"}
    ],
    "emails": ["mark.twain@acme.co"]
  },
  {
    "url": "",
    "people": [{"name": "Nobody", "role": "CEO"}]
  }
]"#;

/// Accepts only the addresses it was built with.
struct AllowList(Vec<&'static str>);

#[async_trait]
impl MailboxProbe for AllowList {
    async fn probe(&self, email: &str) -> SmtpVerificationResult {
        if self.0.iter().any(|allowed| *allowed == email) {
            SmtpVerificationResult::conclusive(true, "250 OK")
        } else {
            SmtpVerificationResult::conclusive(false, "550 No such user")
        }
    }
}

fn write_sites() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SITES.as_bytes()).unwrap();
    file
}

fn leads_for_first_site(config: &Config) -> Vec<ScoredLead> {
    let file = write_sites();
    let sites = load_sites(file.path()).unwrap();
    assert_eq!(sites.len(), 2);
    let signals = enrich_company(&sites[0], "acme.co");
    let (pattern, leads) = build_site_leads(&sites[0], &signals, true, config);
    assert_eq!(pattern.best_pattern, Some(EmailPattern::FirstDotLast));
    leads
}

#[test]
fn test_site_to_scored_leads() {
    let leads = leads_for_first_site(&Config::default());

    // "Smith, John" merges into "John Smith"; the generated candidate for
    // John is dropped behind the extracted record.
    let names: Vec<&str> = leads.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["John Smith", "Mia Wong"]);
    assert!(leads.iter().all(|l| l.source == LeadSource::Found));
    assert!(leads.iter().all(|l| l.company_name == "Acme"));
    // 50 + 12 marketing + 8 pattern + 10 mx + 5 tag manager
    assert_eq!(leads[0].lead_score, 85);
    assert_eq!(leads[1].lead_score, 73);
    assert_eq!(leads[0].pattern.as_deref(), Some("{first}.{last}@{domain}"));
}

#[test]
fn test_strict_threshold_keeps_generated_candidates() {
    let mut config = Config::default();
    config.fuzzy_threshold = 101;
    let leads = leads_for_first_site(&config);

    let generated: Vec<&str> = leads
        .iter()
        .filter(|l| l.source == LeadSource::Pattern)
        .filter_map(|l| l.email.as_deref())
        .collect();
    assert_eq!(generated, vec!["john.smith@acme.co", "smith.john@acme.co"]);
    assert!(leads
        .iter()
        .all(|l| l.lead_score >= 1 && l.lead_score <= 100));
}

#[tokio::test(start_paused = true)]
async fn test_verify_join_and_export() {
    let mut config = Config::default();
    config.fuzzy_threshold = 101;
    let mut leads = leads_for_first_site(&config);

    let verifier = Verifier::new(
        AllowList(vec!["john.smith@acme.co"]),
        Arc::new(RateLimiter::per_minute(30)),
        RetryPolicy::new(2, Duration::from_millis(500)),
        2,
    );
    let emails = collect_verifiable_emails(&leads);
    let outcomes = verifier.verify_batch(&emails).await;
    apply_verification(&mut leads, &results_by_email(&outcomes));

    let with_email = leads.iter().find(|l| l.email.is_some()).unwrap();
    assert_eq!(with_email.smtp_verified, Some(true));
    assert!(leads
        .iter()
        .filter(|l| l.email.is_none())
        .all(|l| l.smtp_verified.is_none()));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/leads.csv");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    export_leads(&path, ExportFormat::Csv, &leads).unwrap();
    let csv_text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(csv_text.lines().count(), leads.len() + 1);

    let summary = RunSummary::from_run(&[], &leads);
    assert_eq!(summary.verified, 1);
    assert_eq!(summary.leads_with_email, 2);
}
