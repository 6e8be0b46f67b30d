use std::{env, fmt, net::SocketAddr};

use super::server_bind_address;

pub const DEFAULT_EMAIL_PORT: u16 = 587;
pub const DEFAULT_NOTIFY_TIMEZONE: &str = "UTC";

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub database_url: String,
    /// `None` when no relay host is configured; notifications are then disabled.
    pub mail: Option<MailConfig>,
    pub notify_timezone: String,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;
        let database_url = required("DATABASE_URL")?;
        let mail = MailConfig::from_env()?;
        let notify_timezone =
            optional("NOTIFY_TIMEZONE").unwrap_or_else(|| DEFAULT_NOTIFY_TIMEZONE.to_string());

        Ok(Self {
            bind_addr,
            environment,
            database_url,
            mail,
            notify_timezone,
        })
    }
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<MailCredentials>,
    pub from: String,
    pub to: String,
    pub accept_invalid_certs: bool,
}

impl MailConfig {
    /// Reads relay settings; returns `Ok(None)` when `EMAIL_HOST` is unset.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = optional("EMAIL_HOST") else {
            return Ok(None);
        };

        let port = match optional("EMAIL_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_EMAIL_PORT,
        };

        let credentials = match (optional("EMAIL_USER"), optional("EMAIL_PASS")) {
            (Some(username), Some(password)) => Some(MailCredentials { username, password }),
            _ => None,
        };

        let accept_invalid_certs = match optional("EMAIL_ACCEPT_INVALID_CERTS") {
            Some(raw) => parse_flag("EMAIL_ACCEPT_INVALID_CERTS", &raw)?,
            None => false,
        };

        Ok(Some(Self {
            host,
            port,
            credentials,
            from: required("EMAIL_FROM")?,
            to: required("EMAIL_TO")?,
            accept_invalid_certs,
        }))
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("authenticated", &self.credentials.is_some())
            .field("from", &self.from)
            .field("to", &self.to)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Relay login. Only used when both user and password are provided.
#[derive(Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    MissingVar(&'static str),
    InvalidPort(String),
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::MissingVar(name) => {
                write!(f, "missing required environment variable {name}; check your .env file")
            }
            Self::InvalidPort(value) => write!(f, "EMAIL_PORT must be a port number (got {value})"),
            Self::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
