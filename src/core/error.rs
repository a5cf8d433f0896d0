//! Error types for the lead pipeline library.

use thiserror::Error;

/// Errors surfaced by the library.
///
/// Most network-facing failures never reach the caller as an `AppError`: the
/// verifier and the enrichment/CRM clients fold them into status data instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    #[error("Could not extract domain: {0}")]
    DomainExtraction(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Domain does not exist (NXDOMAIN): {0}")]
    NxDomain(String),

    #[error("No DNS records found: {0}")]
    NoDnsRecords(String),

    #[error("DNS resolution error: {0}")]
    Dns(#[from] trust_dns_resolver::error::ResolveError),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
