//! Runtime configuration for the lead pipeline and the verifier.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

pub(crate) use crate::core::error::Result;

use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

/// Resolved configuration. Build it with [`ConfigBuilder`].
#[derive(Debug, Clone)]
pub struct Config {
    // Pipeline
    pub fuzzy_threshold: u8,
    pub target_roles: Vec<String>,
    pub email_regex: Regex,

    // Network
    pub request_timeout: Duration,
    pub user_agent: String,

    // DNS
    pub dns_timeout: Duration,
    pub dns_servers: Vec<String>,

    // SMTP
    pub smtp_timeout: Duration,
    pub smtp_sender_email: String,
    pub smtp_port: u16,
    pub helo_name: String,

    // Verification policy
    pub verifications_per_minute: u32,
    pub max_verification_attempts: u32,
    pub retry_backoff: Duration,
    pub verification_concurrency: usize,

    // Remote enrichment
    pub enable_wappalyzer: bool,
    pub enable_firmographics: bool,
    pub wappalyzer_api_key: Option<String>,
    pub firmographics_api_url: Option<String>,
    pub firmographics_api_key: Option<String>,

    // CRM sinks
    pub hubspot_base_url: String,
    pub hubspot_access_token: Option<String>,
    pub salesforce_instance_url: Option<String>,
    pub salesforce_access_token: Option<String>,

    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 93,
            target_roles: [
                "Head of Growth",
                "Marketing",
                "Demand Gen",
                "Sales",
                "Founder",
                "CEO",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            email_regex: Regex::new(r"^[a-z0-9._%+'\-]+@[a-z0-9.\-]+\.[a-z]{2,}$")
                .expect("static email regex is valid"),
            request_timeout: Duration::from_secs(8),
            user_agent: format!(
                "Mozilla/5.0 (compatible; lead-sleuth/{})",
                env!("CARGO_PKG_VERSION")
            ),
            dns_timeout: Duration::from_secs(3),
            dns_servers: Vec::new(),
            smtp_timeout: Duration::from_secs(6),
            smtp_sender_email: "noreply@example.com".to_string(),
            smtp_port: 25,
            helo_name: "localhost".to_string(),
            verifications_per_minute: 30,
            max_verification_attempts: 2,
            retry_backoff: Duration::from_millis(500),
            verification_concurrency: 1,
            enable_wappalyzer: false,
            enable_firmographics: false,
            wappalyzer_api_key: None,
            firmographics_api_url: None,
            firmographics_api_key: None,
            hubspot_base_url: "https://api.hubapi.com".to_string(),
            hubspot_access_token: None,
            salesforce_instance_url: None,
            salesforce_access_token: None,
            loaded_config_path: None,
        }
    }
}

/// TOML file shape. Every key is optional; secrets are not read from files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    pub network: NetworkSection,
    pub dns: DnsSection,
    pub smtp: SmtpSection,
    pub verification: VerificationSection,
    pub enrichment: EnrichmentSection,
    pub crm: CrmSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub fuzzy_threshold: Option<u8>,
    pub target_roles: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub request_timeout: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DnsSection {
    pub dns_timeout: Option<u64>,
    pub dns_servers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SmtpSection {
    pub smtp_timeout: Option<u64>,
    pub smtp_sender_email: Option<String>,
    pub smtp_port: Option<u16>,
    pub helo_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerificationSection {
    pub verifications_per_minute: Option<u32>,
    pub max_verification_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrichmentSection {
    pub enable_wappalyzer: Option<bool>,
    pub enable_firmographics: Option<bool>,
    pub firmographics_api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrmSection {
    pub hubspot_base_url: Option<String>,
    pub salesforce_instance_url: Option<String>,
}

/// Secrets and other values that only arrive through builder overrides.
#[derive(Debug, Clone, Default)]
pub(crate) struct SecretOverrides {
    pub wappalyzer_api_key: Option<String>,
    pub firmographics_api_key: Option<String>,
    pub hubspot_access_token: Option<String>,
    pub salesforce_access_token: Option<String>,
}
