//! SMTP mailbox probing.

mod client;
mod error;
mod result;

pub use client::{test_smtp_connectivity, SmtpVerifier};
pub use result::SmtpVerificationResult;
