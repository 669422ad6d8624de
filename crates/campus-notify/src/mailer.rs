use anyhow::{Context, Result};
use lettre::Address;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use crate::messages::Email;

const SENDER_NAME: &str = "Campus Events";

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".into(),
            port: 587,
            username: None,
            password: None,
        }
    }
}

/// Whether `email` is a single deliverable address. Anything with embedded
/// whitespace or control characters is rejected, since subscriber storage is
/// line-oriented.
pub fn is_valid_address(email: &str) -> bool {
    !email.chars().any(|c| c.is_whitespace() || c.is_control()) && email.parse::<Address>().is_ok()
}

/// Outbound transactional email over a STARTTLS relay.
///
/// Without credentials the mailer is disabled and every send reports `false`.
pub struct Mailer {
    inner: Option<Enabled>,
}

struct Enabled {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let (Some(username), Some(password)) = (
            settings.username.as_deref().filter(|u| !u.is_empty()),
            settings.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            warn!("Email configuration missing (EMAIL_USERNAME / EMAIL_PASSWORD), notifications disabled");
            return Ok(Self::disabled());
        };

        let from = Mailbox::new(
            Some(SENDER_NAME.to_string()),
            username.parse().context("EMAIL_USERNAME is not a valid address")?,
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .with_context(|| format!("configuring SMTP relay {}", settings.host))?
            .port(settings.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        info!("Email notifications via {}:{} as {}", settings.host, settings.port, username);
        Ok(Self {
            inner: Some(Enabled { transport, from }),
        })
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Best-effort delivery. Failures are logged and reported as `false`.
    pub async fn send(&self, to: &str, email: &Email) -> bool {
        let Some(enabled) = &self.inner else {
            debug!("Skipping email to {}: mailer disabled", to);
            return false;
        };

        match enabled.deliver(to, email).await {
            Ok(()) => {
                info!("Email sent to {}", to);
                true
            }
            Err(e) => {
                warn!("Failed to send email to {}: {:#}", to, e);
                false
            }
        }
    }
}

impl Enabled {
    async fn deliver(&self, to: &str, email: &Email) -> Result<()> {
        let recipient: Mailbox = to.parse().context("invalid recipient address")?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        self.transport.send(message).await?;
        Ok(())
    }
}
