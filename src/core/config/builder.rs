//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, apply_secrets, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, Result, SecretOverrides};
use crate::AppError;
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// Precedence, lowest first: defaults, configuration file, builder overrides.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    overrides: ConfigFile,
    secrets: SecretOverrides,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    pub fn fuzzy_threshold(mut self, value: u8) -> Self {
        self.overrides.pipeline.fuzzy_threshold = Some(value);
        self
    }
    pub fn target_roles(mut self, roles: Vec<String>) -> Self {
        self.overrides.pipeline.target_roles = Some(roles);
        self
    }
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs());
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.user_agent = Some(value.into());
        self
    }
    pub fn dns_timeout(mut self, duration: Duration) -> Self {
        self.overrides.dns.dns_timeout = Some(duration.as_secs());
        self
    }
    pub fn dns_servers(mut self, servers: Vec<String>) -> Self {
        self.overrides.dns.dns_servers = Some(servers);
        self
    }
    pub fn smtp_timeout(mut self, duration: Duration) -> Self {
        self.overrides.smtp.smtp_timeout = Some(duration.as_secs());
        self
    }
    pub fn smtp_sender_email(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.smtp_sender_email = Some(value.into());
        self
    }
    pub fn smtp_port(mut self, port: u16) -> Self {
        self.overrides.smtp.smtp_port = Some(port);
        self
    }
    pub fn verifications_per_minute(mut self, value: u32) -> Self {
        self.overrides.verification.verifications_per_minute = Some(value);
        self
    }
    pub fn max_verification_attempts(mut self, value: u32) -> Self {
        self.overrides.verification.max_verification_attempts = Some(value);
        self
    }
    pub fn retry_backoff(mut self, duration: Duration) -> Self {
        self.overrides.verification.retry_backoff_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn verification_concurrency(mut self, value: usize) -> Self {
        self.overrides.verification.concurrency = Some(value);
        self
    }
    pub fn enable_wappalyzer(mut self, enable: bool) -> Self {
        self.overrides.enrichment.enable_wappalyzer = Some(enable);
        self
    }
    pub fn enable_firmographics(mut self, enable: bool) -> Self {
        self.overrides.enrichment.enable_firmographics = Some(enable);
        self
    }
    pub fn firmographics_api_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.enrichment.firmographics_api_url = Some(url.into());
        self
    }
    pub fn hubspot_base_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.crm.hubspot_base_url = Some(url.into());
        self
    }
    pub fn salesforce_instance_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.crm.salesforce_instance_url = Some(url.into());
        self
    }
    pub fn wappalyzer_api_key(mut self, key: impl Into<String>) -> Self {
        self.secrets.wappalyzer_api_key = Some(key.into());
        self
    }
    pub fn firmographics_api_key(mut self, key: impl Into<String>) -> Self {
        self.secrets.firmographics_api_key = Some(key.into());
        self
    }
    pub fn hubspot_access_token(mut self, token: impl Into<String>) -> Self {
        self.secrets.hubspot_access_token = Some(token.into());
        self
    }
    pub fn salesforce_access_token(mut self, token: impl Into<String>) -> Self {
        self.secrets.salesforce_access_token = Some(token.into());
        self
    }

    /// Builds the final `Config`, applying file settings, overrides and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./lead-sleuth.toml", "./config.toml"] {
                if !Path::new(path_str).exists() {
                    continue;
                }
                match load_config_file(path_str) {
                    Ok(file_config) => {
                        apply_file_config(&mut self.config, &file_config);
                        loaded_path = Some(path_str.to_string());
                        tracing::info!(
                            "Loaded base configuration from default location: {}",
                            path_str
                        );
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load or parse default config '{}': {}",
                            path_str,
                            e
                        );
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::info!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        apply_secrets(&mut self.config, &self.secrets);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}
