//! MX resolution on top of the trust-dns async resolver.
//!
//! The resolver keeps its own answer cache and is safe to share between
//! concurrent probes behind an `Arc`.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};

use std::net::IpAddr;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// One mail exchanger for a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailServer {
    pub exchange: String,
    pub preference: u16,
}

/// Builds the shared resolver from the DNS section of the configuration.
pub(crate) fn create_resolver(config: &Config) -> Result<TokioAsyncResolver> {
    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_timeout;
    opts.attempts = 1;

    let resolver_config = if config.dns_servers.is_empty() {
        ResolverConfig::default()
    } else {
        let ips = config
            .dns_servers
            .iter()
            .map(|s| {
                s.trim().parse::<IpAddr>().map_err(|e| {
                    AppError::Config(format!("Invalid DNS server address '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<IpAddr>>>()?;
        tracing::debug!(target: "dns", "Using custom DNS servers: {:?}", ips);
        ResolverConfig::from_parts(None, vec![], NameServerConfigGroup::from_ips_clear(&ips, 53, true))
    };

    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}

/// Resolves the MX hosts for `domain`, lowest preference first.
///
/// Null MX records (`.`) are dropped. An empty answer is reported as
/// `NoDnsRecords`, a non-existent domain as `NxDomain`.
pub(crate) async fn resolve_mail_servers(
    resolver: &TokioAsyncResolver,
    domain: &str,
) -> Result<Vec<MailServer>> {
    tracing::debug!(target: "dns", "Looking up MX records for {}", domain);
    let lookup = match resolver.mx_lookup(domain).await {
        Ok(lookup) => lookup,
        Err(e) => {
            let nx_domain = match e.kind() {
                ResolveErrorKind::NoRecordsFound { response_code, .. } => {
                    Some(*response_code == ResponseCode::NXDomain)
                }
                _ => None,
            };
            return Err(match nx_domain {
                Some(true) => AppError::NxDomain(domain.to_string()),
                Some(false) => AppError::NoDnsRecords(format!("No MX records for {}", domain)),
                None => AppError::Dns(e),
            });
        }
    };

    let mut servers: Vec<MailServer> = lookup
        .iter()
        .map(|mx| MailServer {
            exchange: mx.exchange().to_utf8().trim_end_matches('.').to_string(),
            preference: mx.preference(),
        })
        .filter(|ms| !ms.exchange.is_empty())
        .collect();
    servers.sort_by_key(|ms| ms.preference);

    if servers.is_empty() {
        return Err(AppError::NoDnsRecords(format!(
            "Only null MX records for {}",
            domain
        )));
    }
    tracing::debug!(target: "dns", "MX for {}: {:?}", domain, servers);
    Ok(servers)
}

/// Cheap deliverability check: does `domain` publish any MX host?
pub(crate) async fn check_mx(resolver: &TokioAsyncResolver, domain: &str) -> bool {
    match resolve_mail_servers(resolver, domain).await {
        Ok(servers) => !servers.is_empty(),
        Err(e) => {
            tracing::info!(target: "dns", "MX check failed for {}: {}", domain, e);
            false
        }
    }
}
