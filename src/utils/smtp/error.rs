//! Maps lettre SMTP errors onto probe outcomes.

use super::result::SmtpVerificationResult;
use lettre::transport::smtp::Error as SmtpError;

/// Classifies an SMTP error seen during the handshake or envelope steps.
///
/// 4xx replies, timeouts and dropped connections are transient and worth a
/// retry; 5xx replies are definitive; anything else is inconclusive.
pub(crate) fn handle_smtp_error(error: &SmtpError, server: &str) -> SmtpVerificationResult {
    if error.is_transient() {
        tracing::warn!(target: "smtp_task", "Transient SMTP reply from {}: {}", server, error);
        return SmtpVerificationResult::inconclusive_retry(format!(
            "SMTP transient failure (4xx): {}",
            error
        ));
    }

    if error.is_permanent() {
        tracing::info!(target: "smtp_task", "Permanent SMTP reply from {}: {}", server, error);
        return SmtpVerificationResult::conclusive(
            false,
            format!("SMTP rejected (5xx): {}", error),
        );
    }

    if error.is_timeout() {
        tracing::warn!(target: "smtp_task", "SMTP timeout talking to {}: {}", server, error);
        return SmtpVerificationResult::inconclusive_retry(format!("SMTP timeout: {}", error));
    }

    let err_string = error.to_string().to_lowercase();
    if err_string.contains("timed out")
        || err_string.contains("connection refused")
        || err_string.contains("connection reset")
        || err_string.contains("network is unreachable")
    {
        tracing::warn!(target: "smtp_task",
            "Connection problem with {}: {}. Outbound port 25 may be blocked.", server, error);
        return SmtpVerificationResult::inconclusive_retry(format!(
            "Connection failed ({})",
            error
        ));
    }

    tracing::error!(target: "smtp_task", "Unhandled SMTP error for {}: {}", server, error);
    SmtpVerificationResult::inconclusive_no_retry(format!("Unhandled SMTP error: {}", error))
}
