//! # Lead Sleuth CLI
//!
//! Command-line interface for the `lead_sleuth_core` library. It reads site
//! bundles from a JSON file, runs the lead pipeline over every site, then
//! optionally verifies mailboxes and pushes the rows to CRMs before writing
//! the export.

use lead_sleuth_core::export::{export_leads, ExportFormat};
use lead_sleuth_core::{
    check_smtp_connectivity, collect_leads, initialize_sleuth, load_sites, process_sites, Config,
    ConfigBuilder, LeadSleuth, RunSummary, ScoredLead,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Scores contact leads extracted from company websites.",
    long_about = "Lead Sleuth infers each domain's email convention, generates candidate addresses for target roles, de-duplicates and scores the leads, and can optionally verify mailboxes over SMTP and push the results to HubSpot or Salesforce."
)]
struct AppArgs {
    /// Path to the input JSON file: an array of site bundles.
    #[arg(short, long, default_value = "sites.json", env = "LEAD_SLEUTH_INPUT")]
    input: String,

    /// Path to the export file.
    #[arg(short, long, default_value = "leads.csv", env = "LEAD_SLEUTH_OUTPUT")]
    output: String,

    /// Export format.
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,

    /// Path to a configuration file (TOML). CLI args override file settings.
    #[arg(long, env = "LEAD_SLEUTH_CONFIG")]
    config_file: Option<String>,

    /// Name similarity (0-100) at which two people are treated as the same.
    #[arg(long, env = "LEAD_SLEUTH_FUZZY_THRESHOLD")]
    fuzzy_threshold: Option<u8>,

    /// Comma-separated roles that get generated email candidates.
    #[arg(long, value_delimiter = ',', env = "LEAD_SLEUTH_TARGET_ROLES")]
    target_roles: Option<Vec<String>>,

    /// Probe mailboxes over SMTP. Only use on addresses you are allowed to contact.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    verify_consent: bool,

    /// Maximum SMTP probes started per minute.
    #[arg(long, env = "LEAD_SLEUTH_VERIFICATIONS_PER_MINUTE")]
    verifications_per_minute: Option<u32>,

    /// Sender address used in the SMTP envelope.
    #[arg(long, env = "LEAD_SLEUTH_SMTP_SENDER")]
    smtp_sender: Option<String>,

    /// SMTP connection/command timeout in seconds.
    #[arg(long, env = "LEAD_SLEUTH_SMTP_TIMEOUT")]
    smtp_timeout: Option<u64>,

    /// DNS resolution timeout in seconds.
    #[arg(long, env = "LEAD_SLEUTH_DNS_TIMEOUT")]
    dns_timeout: Option<u64>,

    /// Comma-separated list of DNS servers to use for lookups.
    #[arg(long, value_delimiter = ',', env = "LEAD_SLEUTH_DNS_SERVERS")]
    dns_servers: Option<Vec<String>>,

    /// Number of probes allowed in flight at once.
    #[arg(long, env = "LEAD_SLEUTH_VERIFICATION_CONCURRENCY")]
    verification_concurrency: Option<usize>,

    /// Look up each site on the Wappalyzer API.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    wappalyzer: bool,

    /// Query the firmographics API for each domain.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    firmographics: bool,

    /// Create the leads as HubSpot contacts.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    push_hubspot: bool,

    /// Create the leads as Salesforce Leads.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    push_salesforce: bool,

    #[arg(long, env = "WAPPALYZER_API_KEY", hide_env_values = true, hide = true)]
    wappalyzer_api_key: Option<String>,

    #[arg(long, env = "FIRMO_API_URL", hide = true)]
    firmo_api_url: Option<String>,

    #[arg(long, env = "FIRMO_API_KEY", hide_env_values = true, hide = true)]
    firmo_api_key: Option<String>,

    #[arg(long, env = "HUBSPOT_ACCESS_TOKEN", hide_env_values = true, hide = true)]
    hubspot_access_token: Option<String>,

    #[arg(long, env = "SALESFORCE_INSTANCE_URL", hide = true)]
    salesforce_instance_url: Option<String>,

    #[arg(long, env = "SALESFORCE_ACCESS_TOKEN", hide_env_values = true, hide = true)]
    salesforce_access_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!("Lead Sleuth CLI v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = AppArgs::parse();
    tracing::debug!(
        "Parsed CLI arguments: input={}, output={}, format={:?}, verify={}",
        args.input,
        args.output,
        args.format,
        args.verify_consent
    );

    let config = match build_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(anyhow::anyhow!("Failed to build configuration: {}", e));
        }
    };
    tracing::debug!(
        "Effective configuration: fuzzy_threshold={}, target_roles={:?}, verifications_per_minute={}, config_file={:?}",
        config.fuzzy_threshold,
        config.target_roles,
        config.verifications_per_minute,
        config.loaded_config_path
    );

    let sleuth = match initialize_sleuth(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(anyhow::anyhow!("Failed to initialize LeadSleuth core: {}", e));
        }
    };

    let start_time = Instant::now();
    if let Err(e) = run(&config, &sleuth, &args, start_time).await {
        tracing::error!("Execution failed: {}", e);
        return Err(e);
    }
    tracing::info!(
        "Processing finished successfully. Total duration: {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}

fn build_config(args: &AppArgs) -> lead_sleuth_core::Result<Config> {
    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(t) = args.fuzzy_threshold {
        config_builder = config_builder.fuzzy_threshold(t);
    }
    if let Some(ref roles) = args.target_roles {
        if !roles.is_empty() {
            config_builder = config_builder.target_roles(roles.clone());
        }
    }
    if let Some(n) = args.verifications_per_minute {
        config_builder = config_builder.verifications_per_minute(n);
    }
    if let Some(ref s) = args.smtp_sender {
        config_builder = config_builder.smtp_sender_email(s);
    }
    if let Some(t) = args.smtp_timeout {
        config_builder = config_builder.smtp_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.dns_timeout {
        config_builder = config_builder.dns_timeout(Duration::from_secs(t));
    }
    if let Some(ref servers) = args.dns_servers {
        if !servers.is_empty() {
            config_builder = config_builder.dns_servers(servers.clone());
        }
    }
    if let Some(c) = args.verification_concurrency {
        config_builder = config_builder.verification_concurrency(c);
    }
    if args.wappalyzer {
        config_builder = config_builder.enable_wappalyzer(true);
    }
    if args.firmographics {
        config_builder = config_builder.enable_firmographics(true);
    }
    if let Some(ref url) = args.firmo_api_url {
        config_builder = config_builder.firmographics_api_url(url);
    }
    if let Some(ref url) = args.salesforce_instance_url {
        config_builder = config_builder.salesforce_instance_url(url);
    }
    if let Some(ref key) = args.wappalyzer_api_key {
        config_builder = config_builder.wappalyzer_api_key(key);
    }
    if let Some(ref key) = args.firmo_api_key {
        config_builder = config_builder.firmographics_api_key(key);
    }
    if let Some(ref token) = args.hubspot_access_token {
        config_builder = config_builder.hubspot_access_token(token);
    }
    if let Some(ref token) = args.salesforce_access_token {
        config_builder = config_builder.salesforce_access_token(token);
    }

    config_builder.build()
}

async fn run(config: &Config, sleuth: &LeadSleuth, args: &AppArgs, start_time: Instant) -> Result<()> {
    let input_path = Path::new(&args.input);
    let output_path = Path::new(&args.output);

    if !input_path.is_file() {
        return Err(anyhow::anyhow!(
            "Input file not found or is not a file: {}",
            args.input
        ));
    }
    if let Some(parent_dir) = output_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            tracing::debug!("Creating output directory: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!("Failed to create output directory '{}'", parent_dir.display())
            })?;
        }
    }

    tracing::info!("Loading sites from '{}'...", args.input);
    let sites = load_sites(input_path)
        .with_context(|| format!("Failed to read site bundles from '{}'", args.input))?;
    tracing::info!("Loaded {} site(s) from input file.", sites.len());

    let pb = ProgressBar::new(sites.len() as u64);
    pb.set_style(ProgressStyle::default_bar()
         .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
         .context("Failed to set progress bar template")?
         .progress_chars("=> "));
    pb.set_message("Processing sites...");

    let reports = process_sites(sleuth, &sites, |report| {
        pb.set_message(report.domain.clone().unwrap_or_else(|| report.url.clone()));
        pb.inc(1);
    })
    .await;
    pb.finish_with_message(format!("Processed {} site(s)", reports.len()));

    for report in reports.iter().filter(|r| r.error.is_some()) {
        tracing::warn!(
            "Site '{}' failed: {}",
            report.url,
            report.error.as_deref().unwrap_or_default()
        );
    }

    let mut leads = collect_leads(&reports);

    if args.verify_consent {
        verify(config, sleuth, &mut leads).await;
    } else {
        tracing::info!("SMTP verification skipped (pass --verify-consent to enable).");
    }

    for sink in sleuth.crm_sinks(args.push_hubspot, args.push_salesforce) {
        sleuth.push_leads(sink.as_ref(), &leads).await;
    }

    tracing::info!("Saving {} lead(s) to '{}'...", leads.len(), args.output);
    export_leads(output_path, args.format, &leads)
        .with_context(|| format!("Failed to write leads to '{}'", args.output))?;

    log_summary(&RunSummary::from_run(&reports, &leads), start_time.elapsed());
    Ok(())
}

async fn verify(config: &Config, sleuth: &LeadSleuth, leads: &mut [ScoredLead]) {
    match check_smtp_connectivity(config).await {
        Ok(_) => tracing::info!(
            "SMTP connectivity test passed (outbound port {} likely open).",
            config.smtp_port
        ),
        Err(e) => {
            tracing::error!("SMTP connectivity test failed: {}", e);
            tracing::warn!("Mailbox probes on port {} may fail or be unreliable.", config.smtp_port);
        }
    }

    match sleuth.verify_leads(leads).await {
        Ok(outcomes) => tracing::info!(
            "Verified {} address(es), {} accepted.",
            outcomes.len(),
            outcomes.iter().filter(|o| o.verified).count()
        ),
        Err(e) => tracing::error!("SMTP verification could not run: {}", e),
    }
}

/// Logs a summary of the run using `tracing::info`.
fn log_summary(summary: &RunSummary, duration: Duration) {
    tracing::info!("-------------------- Processing Summary --------------------");
    tracing::info!("Sites in Input File         : {}", summary.sites);
    tracing::info!("  - Failed Sites            : {}", summary.failed_sites);
    tracing::info!("Leads Exported              : {}", summary.leads);
    tracing::info!("  - With Email              : {}", summary.leads_with_email);
    tracing::info!("  - On MX-valid Domains     : {}", summary.mx_valid_leads);
    tracing::info!("  - SMTP Verified           : {}", summary.verified);
    tracing::info!("Total Time Taken            : {:.2?}", duration);
    if duration.as_secs_f64() > 0.01 && summary.sites > 0 {
        let rate = (summary.sites as f64) / duration.as_secs_f64();
        tracing::info!("Processing Rate             : {:.2} sites/sec", rate);
    }
    tracing::info!("----------------------------------------------------------");
}
