use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::survey::mail::{SmtpSecurity, SmtpSettings};
use crate::survey::service::IntakeSettings;

const DEFAULT_RECIPIENTS: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: &str = "587";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the survey service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub survey: SurveyConfig,
    pub mail: MailConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let survey = SurveyConfig {
            dir: PathBuf::from(env::var("SURVEY_DIR").unwrap_or_else(|_| "surveys".to_string())),
            save_to_file: parse_flag("SAVE_TO_FILE")?,
        };

        let recipients = parse_recipients(
            &env::var("RECIPIENT_EMAILS").unwrap_or_else(|_| DEFAULT_RECIPIENTS.to_string()),
        );
        if recipients.is_empty() {
            return Err(ConfigError::NoRecipients);
        }
        let sender = non_empty_var("EMAIL_USER");
        let smtp = smtp_settings(sender.clone())?;
        let mail = MailConfig {
            sender,
            recipients,
            outbox_dir: non_empty_var("MAIL_OUTBOX_DIR").map(PathBuf::from),
            smtp,
        };

        let refresh_secs = env::var("ADMIN_REFRESH_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidRefreshPeriod)?;
        let admin = AdminConfig {
            password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            refresh_period: Duration::from_secs(refresh_secs),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            survey,
            mail,
            admin,
        })
    }

    /// Delivery settings for the intake service.
    pub fn intake_settings(&self) -> IntakeSettings {
        IntakeSettings {
            persist: self.survey.save_to_file,
            sender: self.mail.sender.clone(),
            recipients: self.mail.recipients.clone(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(key: &'static str) -> Result<bool, ConfigError> {
    match non_empty_var(key) {
        None => Ok(false),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { key, value }),
        },
    }
}

// `EMAIL_PROVIDER=gmail` selects the Gmail relay with an app password;
// otherwise the relay is described by the SMTP_* variables.
fn smtp_settings(username: Option<String>) -> Result<SmtpSettings, ConfigError> {
    let provider = non_empty_var("EMAIL_PROVIDER");
    if provider.is_some_and(|provider| provider.eq_ignore_ascii_case("gmail")) {
        return Ok(SmtpSettings::gmail(username, non_empty_var("EMAIL_APP_PASSWORD")));
    }

    let port = non_empty_var("SMTP_PORT")
        .unwrap_or_else(|| DEFAULT_SMTP_PORT.to_string())
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidSmtpPort)?;
    let security = if parse_flag("SMTP_SECURE")? {
        SmtpSecurity::Implicit
    } else {
        SmtpSecurity::Opportunistic
    };

    Ok(SmtpSettings {
        host: non_empty_var("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
        port,
        security,
        username,
        password: non_empty_var("EMAIL_PASSWORD"),
    })
}

fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where submitted surveys are kept.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    pub dir: PathBuf,
    pub save_to_file: bool,
}

/// Report mail delivery. Without a sender the service runs in development
/// mode and only logs submissions. With an outbox directory messages are
/// written there instead of going to the SMTP relay.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender: Option<String>,
    pub recipients: Vec<String>,
    pub outbox_dir: Option<PathBuf>,
    pub smtp: SmtpSettings,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub password: String,
    pub refresh_period: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { key: &'static str, value: String },
    NoRecipients,
    InvalidRefreshPeriod,
    InvalidSmtpPort,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "{key} must be true or false, got '{value}'")
            }
            ConfigError::NoRecipients => {
                write!(f, "RECIPIENT_EMAILS must list at least one address")
            }
            ConfigError::InvalidRefreshPeriod => {
                write!(f, "ADMIN_REFRESH_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidSmtpPort => write!(f, "SMTP_PORT must be a valid u16"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::NoRecipients
            | ConfigError::InvalidRefreshPeriod
            | ConfigError::InvalidSmtpPort => None,
        }
    }
}
