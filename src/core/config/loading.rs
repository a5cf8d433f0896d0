//! Loads TOML configuration files and merges them into a `Config`.

use super::{Config, ConfigFile, SecretOverrides};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Reads and parses a TOML configuration file.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Reading config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let parsed: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Parsed configuration file: {}", file_path);
    Ok(parsed)
}

/// Applies every key present in `file_config` onto `config`.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Pipeline
    if let Some(threshold) = file_config.pipeline.fuzzy_threshold {
        config.fuzzy_threshold = threshold;
    }
    if let Some(ref roles) = file_config.pipeline.target_roles {
        config.target_roles = roles
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
    }

    // Network
    if let Some(timeout) = file_config.network.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref user_agent) = file_config.network.user_agent {
        config.user_agent = user_agent.clone();
    }

    // DNS
    if let Some(timeout) = file_config.dns.dns_timeout {
        config.dns_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref servers) = file_config.dns.dns_servers {
        if !servers.is_empty() {
            config.dns_servers = servers.clone();
        }
    }

    // SMTP
    if let Some(timeout) = file_config.smtp.smtp_timeout {
        config.smtp_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref sender) = file_config.smtp.smtp_sender_email {
        config.smtp_sender_email = sender.trim().to_string();
    }
    if let Some(port) = file_config.smtp.smtp_port {
        config.smtp_port = port;
    }
    if let Some(ref helo) = file_config.smtp.helo_name {
        config.helo_name = helo.trim().to_string();
    }

    // Verification
    if let Some(rate) = file_config.verification.verifications_per_minute {
        config.verifications_per_minute = rate;
    }
    if let Some(attempts) = file_config.verification.max_verification_attempts {
        config.max_verification_attempts = attempts;
    }
    if let Some(backoff) = file_config.verification.retry_backoff_ms {
        config.retry_backoff = Duration::from_millis(backoff);
    }
    if let Some(concurrency) = file_config.verification.concurrency {
        config.verification_concurrency = concurrency;
    }

    // Enrichment
    if let Some(enable) = file_config.enrichment.enable_wappalyzer {
        config.enable_wappalyzer = enable;
    }
    if let Some(enable) = file_config.enrichment.enable_firmographics {
        config.enable_firmographics = enable;
    }
    if let Some(ref url) = file_config.enrichment.firmographics_api_url {
        config.firmographics_api_url = non_blank(url);
    }

    // CRM
    if let Some(ref url) = file_config.crm.hubspot_base_url {
        if let Some(url) = non_blank(url) {
            config.hubspot_base_url = url;
        }
    }
    if let Some(ref url) = file_config.crm.salesforce_instance_url {
        config.salesforce_instance_url = non_blank(url);
    }
}

pub(crate) fn apply_secrets(config: &mut Config, secrets: &SecretOverrides) {
    if let Some(ref key) = secrets.wappalyzer_api_key {
        config.wappalyzer_api_key = non_blank(key);
    }
    if let Some(ref key) = secrets.firmographics_api_key {
        config.firmographics_api_key = non_blank(key);
    }
    if let Some(ref token) = secrets.hubspot_access_token {
        config.hubspot_access_token = non_blank(token);
    }
    if let Some(ref token) = secrets.salesforce_access_token {
        config.salesforce_access_token = non_blank(token);
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
