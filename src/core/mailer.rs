use crate::config::MailConfig;
use crate::core::spreadsheet::XLSX_MIME_TYPE;
use crate::error::{Error, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;

pub const SMTP_RELAY: &str = "smtp.gmail.com";
pub const SMTP_PORT: u16 = 465;

const SUBJECT: &str = "📈 YouTube Trend Analysis & AI Channel Ideas Report";
const BODY: &str = "Automatically generated YouTube trend analysis and channel idea report.";

pub trait ReportDelivery {
    async fn deliver(&self, report: &Path) -> Result<()>;
}

/// Sends the report over SMTPS with username/password authentication.
pub struct SmtpMailer {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(mail: &MailConfig, timeout: Duration) -> Result<Self> {
        let from = parse_mailbox(&mail.username)?;
        let to = parse_mailbox(&mail.recipient)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(SMTP_RELAY)
            .map_err(|e| Error::Delivery(format!("cannot configure relay {SMTP_RELAY}: {e}")))?
            .port(SMTP_PORT)
            .credentials(Credentials::new(
                mail.username.clone(),
                mail.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            from,
            to,
            transport,
        })
    }
}

impl ReportDelivery for SmtpMailer {
    async fn deliver(&self, report: &Path) -> Result<()> {
        let document = fs::read(report)
            .await
            .map_err(|e| Error::Delivery(format!("cannot read {}: {e}", report.display())))?;
        let file_name = report
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(crate::core::spreadsheet::REPORT_FILE_NAME);

        let message = compose_message(self.from.clone(), self.to.clone(), file_name, document)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;

        info!(to = %self.to, relay = SMTP_RELAY, "report emailed");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| Error::Delivery(format!("invalid mail address {address:?}: {e}")))
}

fn compose_message(
    from: Mailbox,
    to: Mailbox,
    file_name: &str,
    document: Vec<u8>,
) -> Result<Message> {
    let content_type = ContentType::parse(XLSX_MIME_TYPE)
        .map_err(|e| Error::Delivery(format!("bad attachment content type: {e}")))?;
    let attachment = Attachment::new(file_name.to_string()).body(document, content_type);

    Message::builder()
        .from(from)
        .to(to)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(attachment),
        )
        .map_err(|e| Error::Delivery(format!("cannot build message: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_xlsx_attachment() {
        let message = compose_message(
            parse_mailbox("me@example.com").unwrap(),
            parse_mailbox("team@example.com").unwrap(),
            "yt_trend_channel_ideas.xlsx",
            b"PK\x03\x04fake".to_vec(),
        )
        .expect("message");

        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(raw.contains("From: me@example.com"));
        assert!(raw.contains("To: team@example.com"));
        assert!(raw.contains(XLSX_MIME_TYPE));
        assert!(raw.contains("yt_trend_channel_ideas.xlsx"));
        assert!(raw.contains(BODY));
    }

    #[tokio::test]
    async fn invalid_sender_is_a_delivery_failure() {
        let mail = MailConfig {
            username: "not an address".to_string(),
            password: "secret".to_string(),
            recipient: "team@example.com".to_string(),
        };

        let err = SmtpMailer::new(&mail, Duration::from_secs(1)).err().expect("error");
        assert!(matches!(err, Error::Delivery(_)));
    }

    #[tokio::test]
    async fn mailer_targets_configured_recipient() {
        let mail = MailConfig {
            username: "me@example.com".to_string(),
            password: "secret".to_string(),
            recipient: "team@example.com".to_string(),
        };

        let mailer = SmtpMailer::new(&mail, Duration::from_secs(1)).expect("mailer");
        assert_eq!(mailer.to.email.to_string(), "team@example.com");
        assert_eq!(mailer.from.email.to_string(), "me@example.com");
    }
}
