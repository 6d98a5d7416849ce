use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use wayfare_core::mailer::{Email, Mailer};
use wayfare_core::{CoreError, CoreResult};

use crate::app_config::MailConfig;

/// Sends mail through an SMTP relay over STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// `None` when no relay host is configured.
    pub fn from_config(config: &MailConfig) -> CoreResult<Option<Self>> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| CoreError::ExternalService(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.expose().clone()));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from: config.from.clone(),
        }))
    }
}

fn build_message(from: &str, email: &Email) -> CoreResult<Message> {
    Message::builder()
        .from(
            from.parse()
                .map_err(|e| CoreError::validation(format!("Invalid from address: {}", e)))?,
        )
        .to(email
            .to
            .expose()
            .parse()
            .map_err(|e| CoreError::validation(format!("Invalid recipient: {}", e)))?)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .map_err(|e| CoreError::ExternalService(format!("Failed to build email: {}", e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> CoreResult<()> {
        let message = build_message(&self.from, email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| CoreError::ExternalService(format!("Failed to send email: {}", e)))?;
        tracing::info!("Email '{}' sent to {}", email.subject, email.to);
        Ok(())
    }
}

/// Used when no SMTP relay is configured. The recipient stays masked.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> CoreResult<()> {
        tracing::info!("Email (not sent) to {}: {}", email.to, email.subject);
        Ok(())
    }
}
