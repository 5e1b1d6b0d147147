use log::info;

use crate::error::AppError;

/// Delivery failure reported by a mailer.
#[derive(Debug, thiserror::Error)]
#[error("Couldn't send email to {recipient}: {reason}")]
pub struct MailerError {
    pub recipient: String,
    pub reason: String,
}

impl From<MailerError> for AppError {
    fn from(err: MailerError) -> Self {
        AppError::Email(err.to_string())
    }
}

/// Outbound delivery of account confirmation links.
pub trait ConfirmationMailer: Send + Sync {
    fn send_confirmation(&self, username: &str, confirmation_link: &str) -> Result<(), MailerError>;
}

/// Writes the confirmation link to the log instead of sending mail.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl ConfirmationMailer for LogMailer {
    fn send_confirmation(&self, username: &str, confirmation_link: &str) -> Result<(), MailerError> {
        info!("Confirmation link for {}: {}", username, confirmation_link);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn delivery_failure_becomes_email_error() {
        let err: AppError = MailerError {
            recipient: "ana@example.com".to_string(),
            reason: "smtp down".to_string(),
        }
        .into();

        assert_eq!(err.descriptor().api_code, "0004");
        assert!(matches!(err, AppError::Email(msg) if msg.contains("smtp down")));
    }
}
