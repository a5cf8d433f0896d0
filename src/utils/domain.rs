//! Helpers for site URLs, registrable hosts and email addresses.

use crate::core::error::{AppError, Result};
use url::Url;

fn with_scheme(input: &str) -> String {
    if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input.trim_start_matches('/'))
    }
}

fn looks_like_domain(host: &str) -> bool {
    host.contains('.') && !host.starts_with('.') && !host.ends_with('.')
}

/// Reduces a lower-cased host to its registrable domain
/// (`careers.acme.co` -> `acme.co`, `shop.acme.co.uk` -> `acme.co.uk`).
fn registrable_domain(host: &str) -> Result<String> {
    if !looks_like_domain(host) {
        return Err(AppError::DomainExtraction(format!(
            "Extracted domain appears invalid: {}",
            host
        )));
    }
    psl::domain_str(host).map(str::to_string).ok_or_else(|| {
        AppError::DomainExtraction(format!("'{}' has no registrable domain", host))
    })
}

/// Extracts the site's registrable domain (e.g. "acme.co") from a URL or
/// bare domain.
///
/// Adds `https://` when the scheme is missing, lower-cases the host and
/// drops every label below the public suffix plus one.
pub(crate) fn get_domain_from_url(website_url_or_domain: &str) -> Result<String> {
    let trimmed = website_url_or_domain.trim();
    if trimmed.is_empty() {
        return Err(AppError::DomainExtraction("Input string is empty".to_string()));
    }

    let url = match Url::parse(&with_scheme(trimmed)) {
        Ok(url) => url,
        Err(e) => {
            if !trimmed.contains('/') && looks_like_domain(trimmed) {
                tracing::warn!(
                    "Input '{}' failed URL parsing but looks like a domain, using it directly.",
                    trimmed
                );
                return registrable_domain(&trimmed.to_lowercase());
            }
            return Err(AppError::UrlParse(e));
        }
    };

    let host = url.host_str().ok_or_else(|| {
        AppError::DomainExtraction(format!("Could not extract host from parsed URL: {}", url))
    })?;
    let domain = registrable_domain(&host.to_lowercase())?;

    tracing::debug!("Extracted domain '{}' from '{}'", domain, trimmed);
    Ok(domain)
}

/// Parses the input into a `Url`, adding `https://` when missing.
pub(crate) fn normalize_url(website_url_str: &str) -> Result<Url> {
    let trimmed = website_url_str.trim();
    if trimmed.is_empty() {
        return Err(AppError::InsufficientInput(
            "Website URL input is empty".to_string(),
        ));
    }
    let url = Url::parse(&with_scheme(trimmed))?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(AppError::UrlParse(url::ParseError::EmptyHost)),
    }
}

/// Splits `local@host`; `None` without an `@` or with an empty side.
pub fn split_email(email: &str) -> Option<(&str, &str)> {
    let (local, host) = email.split_once('@')?;
    if local.is_empty() || host.is_empty() {
        return None;
    }
    Some((local, host))
}

/// True for non-empty addresses containing an `@`.
pub fn is_verifiable_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.contains('@')
}
