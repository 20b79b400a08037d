//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport. When email is disabled in the
//! configuration every send is skipped and logged instead.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Debug, Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Returns true when mail is actually delivered.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port);

        if !self.config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }

        Ok(builder.build())
    }

    /// Sends the welcome mail a new worker receives when an owner adds them.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_worker_invitation(
        &self,
        to_email: &str,
        to_name: &str,
        business_name: &str,
    ) -> Result<(), EmailError> {
        let message = self.worker_invitation(to_email, to_name, business_name)?;
        self.deliver(message).await
    }

    /// Sends a generic plain-text email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let message = self.build_message(to_email, subject, body)?;
        self.deliver(message).await
    }

    fn worker_invitation(
        &self,
        to_email: &str,
        to_name: &str,
        business_name: &str,
    ) -> Result<Message, EmailError> {
        let login_url = format!("{}/login", self.config.frontend_url);
        let subject = format!("You have been added to {business_name} on Local Fishing");
        let body = format!(
            r"Hi {to_name},

{business_name} has added you as a worker on Local Fishing.

Sign in with this email address and the password your manager gave you:

{login_url}

Please change your password after your first sign in.

Best regards,
The Local Fishing Team"
        );

        self.build_message(to_email, &subject, &body)
    }

    fn build_message(&self, to_email: &str, subject: &str, body: &str) -> Result<Message, EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }

    async fn deliver(&self, message: Message) -> Result<(), EmailError> {
        if !self.config.enabled {
            tracing::debug!("Email disabled, skipping delivery");
            return Ok(());
        }

        let transport = self.create_transport()?;
        transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EmailService {
        EmailService::new(EmailConfig::default())
    }

    #[test]
    fn test_email_config_default() {
        let config = EmailConfig::default();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 1025);
        assert!(!config.enabled);
    }

    #[test]
    fn test_worker_invitation_mentions_business() {
        let message = service()
            .worker_invitation("ana@example.com", "Ana", "Lake Fresh")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Lake Fresh"));
        assert!(raw.contains("http://localhost:5173/login"));
        assert!(raw.contains("To: ana@example.com"));
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let result = service().worker_invitation("not-an-address", "Ana", "Lake Fresh");
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_disabled_service_skips_delivery() {
        let result = service()
            .send_worker_invitation("ana@example.com", "Ana", "Lake Fresh")
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_transport() {
        let config = EmailConfig {
            smtp_username: "user".to_string(),
            smtp_password: "password".to_string(),
            ..EmailConfig::default()
        };
        assert!(EmailService::new(config).create_transport().is_ok());
    }

    #[test]
    fn test_email_error_display() {
        assert_eq!(
            EmailError::BuildError("msg".into()).to_string(),
            "Failed to build email: msg"
        );
        assert_eq!(
            EmailError::SendError("msg".into()).to_string(),
            "Failed to send email: msg"
        );
    }
}
