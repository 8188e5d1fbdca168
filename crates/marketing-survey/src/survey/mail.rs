use std::fmt;
use std::fs;
use std::path::PathBuf;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, FileTransport, Message, SmtpTransport, Transport};
use tracing::info;

/// Display name used in the `From` header of report mails.
pub const SENDER_DISPLAY_NAME: &str = "마케팅 컨설팅 설문조사";

const GMAIL_HOST: &str = "smtp.gmail.com";
const GMAIL_PORT: u16 = 465;

/// A single HTML message addressed to the report recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

impl MailMessage {
    /// `"<display name>" <address>` form of the sender, for logs.
    pub fn from_header(&self) -> String {
        format!("\"{SENDER_DISPLAY_NAME}\" <{}>", self.from)
    }

    /// Build the MIME message. Headers are RFC 2047 encoded and the body gets
    /// a transfer encoding that keeps every line within SMTP limits.
    pub fn to_message(&self) -> Result<Message, MailError> {
        if self.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let sender = Mailbox::new(
            Some(SENDER_DISPLAY_NAME.to_string()),
            self.from.trim().parse::<Address>()?,
        );
        let mut builder = Message::builder()
            .from(sender)
            .subject(strip_line_breaks(&self.subject))
            .header(ContentType::TEXT_HTML)
            .date_now();
        for recipient in &self.to {
            builder = builder.to(recipient.trim().parse::<Mailbox>()?);
        }

        Ok(builder.body(self.html_body.clone())?)
    }

    /// Wire form of [`MailMessage::to_message`].
    pub fn formatted(&self) -> Result<Vec<u8>, MailError> {
        Ok(self.to_message()?.formatted())
    }
}

// Header values must stay on one line; a store name is user input.
fn strip_line_breaks(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

/// Outbound mail hook used by the intake service.
pub trait MailTransport: Send + Sync {
    fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("mail io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("message has no recipients")]
    NoRecipients,
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("message could not be built: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("outbox write failed: {0}")]
    Outbox(#[from] lettre::transport::file::Error),
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// TLS from the first byte, usually port 465.
    Implicit,
    /// Plain connection upgraded with STARTTLS when the server offers it.
    Opportunistic,
}

/// Relay settings for [`SmtpMailer`].
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SmtpSettings {
    /// Gmail relay authenticated with an app password.
    pub fn gmail(username: Option<String>, app_password: Option<String>) -> Self {
        Self {
            host: GMAIL_HOST.to_string(),
            port: GMAIL_PORT,
            security: SmtpSecurity::Implicit,
            username,
            password: app_password,
        }
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Delivers report mails through an SMTP relay.
pub struct SmtpMailer {
    host: String,
    port: u16,
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// Prepare the relay. No connection is made until the first send.
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let builder = match settings.security {
            SmtpSecurity::Implicit => SmtpTransport::relay(&settings.host)?,
            SmtpSecurity::Opportunistic => SmtpTransport::builder_dangerous(&settings.host).tls(
                Tls::Opportunistic(TlsParameters::new(settings.host.clone())?),
            ),
        };
        let mut builder = builder.port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            host: settings.host.clone(),
            port: settings.port,
            transport: builder.build(),
        })
    }
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let email = message.to_message()?;
        self.transport.send(&email)?;
        info!(
            host = %self.host,
            recipients = message.to.len(),
            "report mail delivered over smtp"
        );
        Ok(())
    }
}

/// Writes each message as an `.eml` file into a pickup directory watched by
/// the local MTA.
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    dir: PathBuf,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MailTransport for OutboxMailer {
    fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let email = message.to_message()?;
        fs::create_dir_all(&self.dir)?;

        let id = FileTransport::new(&self.dir).send(&email)?;
        info!(
            dir = %self.dir.display(),
            id = %id,
            recipients = message.to.len(),
            "report mail queued in outbox"
        );
        Ok(())
    }
}

/// Logs the envelope instead of delivering.
#[derive(Debug, Clone, Default)]
pub struct TracingMailer;

impl MailTransport for TracingMailer {
    fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        info!(
            from = %message.from_header(),
            to = %message.to.join(", "),
            subject = %message.subject,
            body_bytes = message.html_body.len(),
            "report mail"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> MailMessage {
        MailMessage {
            from: "survey@example.com".to_string(),
            to: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            subject: "[신규 설문] 카페\r\nBcc: x@evil - 결과".to_string(),
            html_body: "<p>one</p>\n<p>two</p>".to_string(),
        }
    }

    fn split_headers(raw: &[u8]) -> (String, String) {
        let text = String::from_utf8(raw.to_vec()).expect("ascii wire format");
        let (headers, body) = text.split_once("\r\n\r\n").expect("header block");
        (headers.to_string(), body.to_string())
    }

    #[test]
    fn korean_headers_are_encoded_to_ascii() {
        let (headers, _) = split_headers(&message().formatted().expect("message builds"));

        assert!(headers.is_ascii(), "headers not encoded: {headers}");
        assert!(headers.contains("survey@example.com"));
        assert!(headers.contains("a@example.com"));
        assert!(!headers.contains("\r\nBcc:"));
        assert!(headers.contains("Content-Type: text/html"));
    }

    #[test]
    fn long_body_lines_are_wrapped_by_the_transfer_encoding() {
        let mut message = message();
        message.html_body = format!("<p>{}</p>", "맛있는 분식 ".repeat(400));

        let raw = message.formatted().expect("message builds");
        let text = String::from_utf8(raw).expect("ascii wire format");

        assert!(text.lines().all(|line| line.len() <= 998));
    }

    #[test]
    fn invalid_sender_is_rejected_before_delivery() {
        let mut message = message();
        message.from = "not an address".to_string();
        assert!(matches!(message.to_message(), Err(MailError::Address(_))));
    }

    #[test]
    fn outbox_writes_one_eml_file_per_message() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mailer = OutboxMailer::new(dir.path().join("outbox"));

        mailer.send(&message()).expect("first send");
        mailer.send(&message()).expect("second send");

        let files: Vec<_> = fs::read_dir(dir.path().join("outbox"))
            .expect("outbox exists")
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "eml"))
            .collect();
        assert_eq!(files.len(), 2);
        let contents = fs::read_to_string(&files[0]).expect("readable");
        assert!(contents.contains("Content-Type: text/html"));
    }

    #[test]
    fn smtp_relays_build_without_connecting() {
        let gmail = SmtpSettings::gmail(
            Some("survey@example.com".to_string()),
            Some("app-password".to_string()),
        );
        assert_eq!(gmail.port, 465);
        assert!(SmtpMailer::new(&gmail).is_ok());

        let starttls = SmtpSettings {
            host: "mail.example.com".to_string(),
            port: 587,
            security: SmtpSecurity::Opportunistic,
            username: None,
            password: None,
        };
        let mailer = SmtpMailer::new(&starttls).expect("relay builds");
        assert!(format!("{mailer:?}").contains("mail.example.com"));
        assert!(!format!("{gmail:?}").contains("app-password"));
    }

    #[test]
    fn transports_refuse_empty_recipient_lists() {
        let mut message = message();
        message.to.clear();
        assert!(matches!(
            TracingMailer.send(&message),
            Err(MailError::NoRecipients)
        ));
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            OutboxMailer::new(dir.path()).send(&message),
            Err(MailError::NoRecipients)
        ));
    }
}
