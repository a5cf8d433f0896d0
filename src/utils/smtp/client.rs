//! RCPT TO mailbox probing over plain SMTP.
//!
//! The probe connects to the lowest-preference MX, says EHLO, declares the
//! envelope sender and recipient, and quits without ever sending DATA.
//! A 2xx answer to RCPT TO is reported as "exists". Catch-all domains
//! accept every recipient and servers may refuse unknown senders, so a
//! positive answer is not proof of a mailbox and a negative one is not
//! proof of its absence.

use super::error::handle_smtp_error;
use super::result::SmtpVerificationResult;
use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::utils::dns::resolve_mail_servers;
use crate::utils::domain::split_email;
use crate::verification::MailboxProbe;

use async_trait::async_trait;
use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::commands::{Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::response::Severity;
use lettre::Address;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use trust_dns_resolver::TokioAsyncResolver;

/// Everything the blocking part of a probe needs, owned.
struct ProbeTarget {
    mail_server: String,
    port: u16,
    helo_name: ClientId,
    timeout: Duration,
    sender: Address,
    recipient: Address,
}

/// Probes mailboxes via SMTP using a shared resolver.
#[derive(Clone)]
pub struct SmtpVerifier {
    config: Arc<Config>,
    resolver: Arc<TokioAsyncResolver>,
    sender: Address,
}

impl SmtpVerifier {
    pub fn new(config: Arc<Config>, resolver: Arc<TokioAsyncResolver>) -> Result<Self> {
        let sender = Address::from_str(&config.smtp_sender_email)
            .map_err(|e| AppError::Config(format!("Invalid sender email in config: {}", e)))?;
        Ok(Self {
            config,
            resolver,
            sender,
        })
    }

    /// Runs one probe for `email`. Never fails: every problem becomes an
    /// inconclusive or negative result.
    pub async fn verify_email(&self, email: &str) -> SmtpVerificationResult {
        let Some((_, domain)) = split_email(email) else {
            return SmtpVerificationResult::conclusive(false, "Address has no domain part");
        };

        let recipient = match Address::from_str(email) {
            Ok(addr) => addr,
            Err(e) => {
                tracing::warn!(target: "smtp_task", "Invalid recipient format '{}': {}", email, e);
                return SmtpVerificationResult::conclusive(false, format!("Invalid email format: {}", e));
            }
        };

        let mail_server = match resolve_mail_servers(&self.resolver, domain).await {
            Ok(servers) => match servers.into_iter().next() {
                Some(server) => server.exchange,
                None => return SmtpVerificationResult::conclusive(false, "No MX hosts"),
            },
            Err(e @ AppError::NxDomain(_)) | Err(e @ AppError::NoDnsRecords(_)) => {
                tracing::info!(target: "smtp_task", "No mail exchanger for {}: {}", domain, e);
                return SmtpVerificationResult::conclusive(false, format!("No MX: {}", e));
            }
            Err(e) => {
                tracing::warn!(target: "smtp_task", "DNS failure for {}: {}", domain, e);
                return SmtpVerificationResult::inconclusive_retry(format!("DNS failure: {}", e));
            }
        };

        let target = ProbeTarget {
            mail_server: mail_server.clone(),
            port: self.config.smtp_port,
            helo_name: ClientId::Domain(self.config.helo_name.clone()),
            timeout: self.config.smtp_timeout,
            sender: self.sender.clone(),
            recipient,
        };

        // lettre's connection is blocking; keep it off the async workers and
        // bound the whole exchange so a stalled server cannot hang the batch.
        let overall = self.config.smtp_timeout * 3;
        match tokio::time::timeout(overall, tokio::task::spawn_blocking(move || rcpt_probe(&target)))
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::error!(target: "smtp_task", "Probe task for {} failed: {}", email, join_error);
                SmtpVerificationResult::inconclusive_no_retry(format!("Probe task failed: {}", join_error))
            }
            Err(_) => {
                tracing::warn!(target: "smtp_task", "Probe for {} via {} timed out after {:?}", email, mail_server, overall);
                SmtpVerificationResult::inconclusive_retry(format!("Timed out after {:?}", overall))
            }
        }
    }
}

#[async_trait]
impl MailboxProbe for SmtpVerifier {
    async fn probe(&self, email: &str) -> SmtpVerificationResult {
        self.verify_email(email).await
    }
}

fn first_socket_addr(host: &str, port: u16) -> std::io::Result<Option<SocketAddr>> {
    Ok((host, port).to_socket_addrs()?.next())
}

/// Blocking EHLO / MAIL FROM / RCPT TO exchange, closed with QUIT.
fn rcpt_probe(target: &ProbeTarget) -> SmtpVerificationResult {
    let server = target.mail_server.as_str();

    let socket_addr = match first_socket_addr(server, target.port) {
        Ok(Some(addr)) => addr,
        Ok(None) => {
            return SmtpVerificationResult::inconclusive_no_retry(format!(
                "Mail server {} has no address",
                server
            ))
        }
        Err(e) => {
            return SmtpVerificationResult::inconclusive_retry(format!(
                "Could not resolve mail server {}: {}",
                server, e
            ))
        }
    };

    tracing::debug!(target: "smtp_task", "Connecting to {} ({})", server, socket_addr);
    // `connect` reads the greeting and performs EHLO.
    let mut conn = match SmtpConnection::connect(
        socket_addr,
        Some(target.timeout),
        &target.helo_name,
        None,
        None,
    ) {
        Ok(conn) => conn,
        Err(e) => return handle_smtp_error(&e, server),
    };

    tracing::debug!(target: "smtp_task", "MAIL FROM:<{}> on {}", target.sender, server);
    if let Err(e) = conn.command(Mail::new(Some(target.sender.clone()), vec![])) {
        conn.quit().ok();
        let mut result = handle_smtp_error(&e, server);
        // A rejected sender says nothing about the recipient.
        if result.exists == Some(false) {
            result = SmtpVerificationResult::inconclusive_no_retry(format!(
                "MAIL FROM rejected: {}",
                e
            ));
        }
        return result;
    }

    tracing::debug!(target: "smtp_task", "RCPT TO:<{}> on {}", target.recipient, server);
    let result = match conn.command(Rcpt::new(target.recipient.clone(), vec![])) {
        Ok(response) if response.code().severity == Severity::PositiveCompletion => {
            SmtpVerificationResult::conclusive(
                true,
                format!("RCPT accepted: {}", response.code()),
            )
        }
        Ok(response) => SmtpVerificationResult::conclusive(
            false,
            format!("RCPT not accepted: {}", response.code()),
        ),
        Err(e) => handle_smtp_error(&e, server),
    };

    if let Err(e) = conn.quit() {
        tracing::debug!(target: "smtp_task", "QUIT on {} failed: {}", server, e);
    }
    tracing::info!(target: "smtp_task",
        "RCPT probe for <{}> via {}: exists={:?} ({})",
        target.recipient, server, result.exists, result.message
    );
    result
}

/// Checks that outbound SMTP to a well-known exchanger is possible.
pub async fn test_smtp_connectivity(port: u16) -> Result<()> {
    let test_server = "gmail-smtp-in.l.google.com";
    tracing::info!("Testing outbound SMTP (port {}) connectivity to {}...", port, test_server);

    let timeout = Duration::from_secs(5);
    let result = tokio::time::timeout(
        timeout * 2,
        tokio::task::spawn_blocking(move || -> Result<()> {
            let addr = first_socket_addr(test_server, port)?.ok_or_else(|| {
                AppError::Config(format!("Could not resolve any address for {}", test_server))
            })?;
            let helo = ClientId::Domain("localhost".to_string());
            let mut conn = SmtpConnection::connect(addr, Some(timeout), &helo, None, None)?;
            conn.quit().ok();
            Ok(())
        }),
    )
    .await;

    match result {
        Ok(Ok(inner)) => inner,
        Ok(Err(join_error)) => Err(AppError::Initialization(format!(
            "Connectivity check task failed: {}",
            join_error
        ))),
        Err(_) => Err(AppError::Initialization(format!(
            "SMTP connection to {} timed out; port {} is likely blocked.",
            test_server, port
        ))),
    }
}
