//! Outbound email
//!
//! Email is best-effort: a failed send is logged by the effect runner and
//! never rolls back the state change that triggered it.

mod log;
mod smtp;
pub mod templates;

use async_trait::async_trait;

pub use self::log::LogMailer;
pub use self::smtp::SmtpMailer;

/// Plain-text message to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("smtp: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
