use std::env;
use std::fmt;
use std::time::Duration;

use lettre::message::Mailbox;
use lettre::Address;

const DEFAULT_SERVICE_NAME: &str = "北商熱音社郵件服務";
const DEFAULT_WEBSITE_URL: &str = "http://localhost:3000/";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub service_name: String,
    pub log_format: LogFormat,
    pub mail_adapter: MailAdapter,
    pub smtp: SmtpSettings,
    pub mail_from: Mailbox,
    pub links: Links,
    pub allowed_origins: Vec<String>,
    pub health_check: HealthCheckSettings,
    pub self_test_recipient: Option<Address>,
}

/// Outbound links embedded in notification bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    /// Front-end base URL, used in user-facing mails.
    pub website_url: String,
    /// Admin console URL, used in admin-facing mails.
    pub admin_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailAdapter {
    Smtp,
    Console,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// Plain connection upgraded with STARTTLS (usually port 587).
    StartTls,
    /// TLS from the first byte (usually port 465).
    Implicit,
    /// No encryption. Only meant for local relays such as MailHog.
    None,
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: SmtpTls,
    pub timeout: Duration,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HealthCheckSettings {
    /// Zero disables the background check.
    pub interval: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        // Secrets are used verbatim.
        let secret = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let server_port = var("SERVER_PORT")
            .or_else(|| var("PORT"))
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let mail_adapter = match var("MAIL_ADAPTER").as_deref() {
            None | Some("smtp") => MailAdapter::Smtp,
            Some("console") => MailAdapter::Console,
            Some(other) => return Err(ConfigError::UnknownMailAdapter(other.to_string())),
        };

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::UnknownLogFormat(other.to_string())),
        };

        let smtp = SmtpSettings::from_lookup(&var, &secret, mail_adapter)?;

        let mail_from = var("MAIL_FROM")
            .or_else(|| smtp.username.clone())
            .ok_or(ConfigError::MissingMailFrom)?;
        let mail_from = mail_from
            .parse::<Mailbox>()
            .map_err(|_| ConfigError::InvalidMailFrom(mail_from))?;

        let website_url = var("WEBSITE_URL").unwrap_or_else(|| DEFAULT_WEBSITE_URL.to_string());
        let admin_url = var("ADMIN_URL").unwrap_or_else(|| website_url.clone());

        let allowed_origins = parse_origins(
            &var("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
        );

        let health_check = HealthCheckSettings {
            interval: Duration::from_secs(parse_or(&var, "SMTP_CHECK_INTERVAL_SECONDS", 300)?),
            max_retries: parse_or(&var, "SMTP_CHECK_MAX_RETRIES", 3)?,
            retry_delay: Duration::from_secs(parse_or(&var, "SMTP_CHECK_RETRY_DELAY_SECONDS", 5)?),
        };

        let self_test_recipient = var("MAIL_SELF_TEST_TO")
            .map(|raw| {
                raw.parse::<Address>()
                    .map_err(|_| ConfigError::InvalidValue("MAIL_SELF_TEST_TO", raw))
            })
            .transpose()?;

        Ok(Config {
            server_host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port,
            service_name: var("SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            log_format,
            mail_adapter,
            smtp,
            mail_from,
            links: Links {
                website_url,
                admin_url,
            },
            allowed_origins,
            health_check,
            self_test_recipient,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl SmtpSettings {
    fn from_lookup<F, S>(var: &F, secret: &S, adapter: MailAdapter) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        S: Fn(&str) -> Option<String>,
    {
        let host = match (var("SMTP_HOST"), adapter) {
            (Some(host), _) => host,
            (None, MailAdapter::Console) => "localhost".to_string(),
            (None, MailAdapter::Smtp) => return Err(ConfigError::MissingSmtpHost),
        };

        let username = var("SMTP_USERNAME");
        let password = secret("SMTP_PASSWORD");
        if username.is_some() != password.is_some() {
            return Err(ConfigError::IncompleteCredentials);
        }

        let tls = match var("SMTP_TLS").as_deref() {
            None | Some("starttls") => SmtpTls::StartTls,
            Some("tls") => SmtpTls::Implicit,
            Some("none") => SmtpTls::None,
            Some(other) => return Err(ConfigError::InvalidValue("SMTP_TLS", other.to_string())),
        };

        Ok(SmtpSettings {
            host,
            port: parse_or(var, "SMTP_PORT", 587)?,
            username,
            password,
            tls,
            timeout: Duration::from_secs(parse_or(var, "SMTP_TIMEOUT_SECONDS", 30)?),
        })
    }
}

fn parse_or<F, T>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

/// Split a comma separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("SMTP_HOST environment variable is required for the smtp adapter")]
    MissingSmtpHost,
    #[error("SMTP_USERNAME and SMTP_PASSWORD must be set together")]
    IncompleteCredentials,
    #[error("MAIL_FROM (or SMTP_USERNAME) environment variable is required")]
    MissingMailFrom,
    #[error("MAIL_FROM is not a valid mailbox: {0}")]
    InvalidMailFrom(String),
    #[error("Unknown MAIL_ADAPTER: {0}")]
    UnknownMailAdapter(String),
    #[error("Unknown LOG_FORMAT: {0}")]
    UnknownLogFormat(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_smtp_defaults() {
        let config = load(&[
            ("SMTP_HOST", "smtp.office365.com"),
            ("SMTP_USERNAME", "club@example.com"),
            ("SMTP_PASSWORD", "secret"),
        ])
        .expect("Should load config");

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.mail_adapter, MailAdapter::Smtp);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.tls, SmtpTls::StartTls);
        assert_eq!(config.mail_from.email.to_string(), "club@example.com");
        assert_eq!(config.links.admin_url, config.links.website_url);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
    }

    #[test]
    fn test_server_port_wins_over_port() {
        let config = load(&[
            ("MAIL_ADAPTER", "console"),
            ("MAIL_FROM", "club@example.com"),
            ("PORT", "4000"),
            ("SERVER_PORT", "5000"),
        ])
        .expect("Should load config");

        assert_eq!(config.server_port, 5000);
    }

    #[test]
    fn test_smtp_host_required() {
        let result = load(&[("MAIL_FROM", "club@example.com")]);
        assert!(matches!(result, Err(ConfigError::MissingSmtpHost)));
    }

    #[test]
    fn test_credentials_must_be_paired() {
        let result = load(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "club@example.com"),
        ]);
        assert!(matches!(result, Err(ConfigError::IncompleteCredentials)));
    }

    #[test]
    fn test_invalid_tls_mode() {
        let result = load(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("MAIL_FROM", "club@example.com"),
            ("SMTP_TLS", "ssl3"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidValue("SMTP_TLS", _))));
    }

    #[test]
    fn test_password_is_redacted() {
        let config = load(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "club@example.com"),
            ("SMTP_PASSWORD", "hunter2"),
        ])
        .expect("Should load config");

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_password_whitespace_is_preserved() {
        let config = load(&[
            ("SMTP_HOST", " smtp.example.com "),
            ("SMTP_USERNAME", " club@example.com "),
            ("SMTP_PASSWORD", " pa ss "),
        ])
        .expect("Should load config");

        assert_eq!(config.smtp.host, "smtp.example.com");
        assert_eq!(config.smtp.username.as_deref(), Some("club@example.com"));
        assert_eq!(config.smtp.password.as_deref(), Some(" pa ss "));
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.netlify.app/ ,, https://*.netlify.app"),
            vec!["https://a.netlify.app", "https://*.netlify.app"]
        );
    }
}
