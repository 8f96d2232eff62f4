use crate::domain::model::{Delivery, SkipReason};
use crate::domain::ports::Notifier;
use crate::utils::error::{NotifyError, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor,
};

pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP settings as configured; any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; defaults to the username.
    pub from: Option<String>,
}

struct ResolvedSmtp<'a> {
    host: &'a str,
    username: &'a str,
    password: &'a str,
    from: &'a str,
}

impl SmtpSettings {
    fn resolve(&self) -> std::result::Result<ResolvedSmtp<'_>, &'static str> {
        let host = self.host.as_deref().ok_or("SMTP_HOST")?;
        let username = self.username.as_deref().ok_or("SMTP_USER")?;
        let password = self.password.as_deref().ok_or("SMTP_PASS")?;
        Ok(ResolvedSmtp {
            host,
            username,
            password,
            from: self.from.as_deref().unwrap_or(username),
        })
    }
}

pub struct SmtpNotifier {
    settings: SmtpSettings,
    dry_run: bool,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings, dry_run: bool) -> Self {
        Self { settings, dry_run }
    }

    fn print_dry_run(&self, recipients: &[String], subject: &str, body: &str) {
        let from = self
            .settings
            .from
            .as_deref()
            .or(self.settings.username.as_deref())
            .unwrap_or("(unset)");

        println!("--- DRY RUN: email not sent ---");
        println!("From: {}", from);
        println!("To: {}", recipients[0]);
        if recipients.len() > 1 {
            println!("Bcc: {}", recipients[1..].join(", "));
        }
        println!("Subject: {}", subject);
        println!();
        println!("{}", body);
        println!("-------------------------------");
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|source| NotifyError::AddressError {
            address: address.to_string(),
            source,
        })
}

/// One message: the first recipient in `To`, the rest in `Bcc`.
pub fn build_message(from: &str, recipients: &[String], subject: &str, body: &str) -> Result<Message> {
    let Some((primary, others)) = recipients.split_first() else {
        return Err(NotifyError::ConfigValidationError {
            field: "recipients".to_string(),
            message: "at least one recipient is required".to_string(),
        });
    };

    let mut builder = Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(primary)?)
        .subject(subject)
        .user_agent("ems-notify".to_string())
        .header(ContentType::TEXT_PLAIN);

    for address in others {
        builder = builder.bcc(parse_mailbox(address)?);
    }

    Ok(builder.body(body.to_string())?)
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<Delivery> {
        if recipients.is_empty() {
            tracing::info!("No recipients found. Skipping email.");
            return Ok(Delivery::Skipped(SkipReason::NoRecipients));
        }

        if self.dry_run {
            tracing::info!("Dry run enabled, printing email for {} recipients", recipients.len());
            self.print_dry_run(recipients, subject, body);
            return Ok(Delivery::DryRun);
        }

        let smtp = match self.settings.resolve() {
            Ok(smtp) => smtp,
            Err(missing) => {
                tracing::warn!("SMTP setting {} not configured. Skipping email.", missing);
                return Ok(Delivery::Skipped(SkipReason::MissingSetting(missing)));
            }
        };

        let message = build_message(smtp.from, recipients, subject, body)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp.host)?
            .port(self.settings.port)
            .credentials(Credentials::new(
                smtp.username.to_string(),
                smtp.password.to_string(),
            ))
            .build();

        tracing::debug!("Connecting to {}:{}", smtp.host, self.settings.port);
        transport.send(message).await?;

        tracing::info!("Email sent to {} addresses", recipients.len());
        Ok(Delivery::Sent {
            recipients: recipients.len(),
        })
    }
}
