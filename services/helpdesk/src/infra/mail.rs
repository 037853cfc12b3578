use anyhow::{Context as _, anyhow};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::domain::repository::Mailer;
use crate::error::HelpdeskError;

/// SMTP delivery through a STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("invalid SMTP relay {}", config.host))?
            .port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.from.clone(),
        })
    }
}

impl Mailer for SmtpMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<(), HelpdeskError> {
        let content_type = if is_html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| anyhow!("invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| anyhow!("invalid to address: {e}"))?)
            .subject(subject)
            .header(content_type)
            .body(body.to_owned())
            .context("build email")?;

        self.transport
            .send(message)
            .await
            .context("send email via SMTP")?;
        Ok(())
    }
}

/// Writes outgoing mail to the log instead of sending it. Used when no SMTP relay is
/// configured. Bodies are not logged since they may hold reset codes.
#[derive(Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        _body: &str,
        is_html: bool,
    ) -> Result<(), HelpdeskError> {
        tracing::warn!(to, subject, is_html, "SMTP not configured; email not delivered");
        Ok(())
    }
}

/// Mailer selected at startup from configuration.
#[derive(Clone)]
pub enum AppMailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl AppMailer {
    pub fn from_config(smtp: Option<&SmtpConfig>) -> anyhow::Result<Self> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpMailer::new(config)?)),
            None => Ok(Self::Log(LogMailer)),
        }
    }
}

impl Mailer for AppMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<(), HelpdeskError> {
        match self {
            Self::Smtp(m) => m.send(to, subject, body, is_html).await,
            Self::Log(m) => m.send(to, subject, body, is_html).await,
        }
    }
}
