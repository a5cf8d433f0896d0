//! Contains validation logic for the final Config struct.

use super::{Config, Result};
use crate::core::error::AppError;

/// Validates the configuration after loading and overrides.
/// Clamps values where a safe substitute exists, rejects the rest.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.fuzzy_threshold > 100 {
        tracing::warn!(
            "Fuzzy threshold ({}) > 100. Clamping to 100.",
            config.fuzzy_threshold
        );
        config.fuzzy_threshold = 100;
    }
    if config.target_roles.is_empty() {
        tracing::warn!("Target role list is empty. No email candidates will be generated.");
    }
    if config.verifications_per_minute == 0 {
        tracing::warn!("Verifications per minute was set to 0. Setting to 1.");
        config.verifications_per_minute = 1;
    }
    if config.max_verification_attempts == 0 {
        tracing::warn!("Max verification attempts was set to 0. Setting to 1.");
        config.max_verification_attempts = 1;
    }
    if config.verification_concurrency == 0 {
        tracing::warn!("Verification concurrency was set to 0. Setting to 1.");
        config.verification_concurrency = 1;
    }
    if config.smtp_port == 0 {
        return Err(AppError::Config("SMTP port cannot be 0.".to_string()));
    }
    if config.helo_name.is_empty() {
        config.helo_name = "localhost".to_string();
    }
    let sender = &config.smtp_sender_email;
    if !sender.contains('@') || !sender.contains('.') || sender.starts_with('@') {
        return Err(AppError::Config(format!(
            "Invalid SMTP sender email format: {}",
            sender
        )));
    }
    if config.dns_servers.is_empty() {
        tracing::debug!("No DNS servers configured. Using resolver defaults.");
    }
    if config.enable_firmographics && config.firmographics_api_url.is_none() {
        tracing::warn!("Firmographics enrichment enabled without an API URL. Lookups will report 'no_api'.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_out_of_range_values() {
        let mut config = Config {
            fuzzy_threshold: 150,
            verifications_per_minute: 0,
            max_verification_attempts: 0,
            verification_concurrency: 0,
            ..Config::default()
        };
        validate_config(&mut config).unwrap();
        assert_eq!(config.fuzzy_threshold, 100);
        assert_eq!(config.verifications_per_minute, 1);
        assert_eq!(config.max_verification_attempts, 1);
        assert_eq!(config.verification_concurrency, 1);
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = Config {
            smtp_port: 0,
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }
}
