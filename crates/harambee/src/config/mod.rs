use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub policy: FundPolicy,
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

        let policy = FundPolicy::load()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            policy,
        })
    }
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Fund-wide policy dials, constructed once at startup and passed into each
/// service rather than read from ambient global state.
#[derive(Debug, Clone)]
pub struct FundPolicy {
    /// Uniform per-member share created for each obligation batch.
    pub contribution_amount: u32,
    /// Contribution window applied to newly approved cases.
    pub default_duration_days: i64,
    /// Fallback recipient for administrative notifications.
    pub admin_email: String,
}

impl FundPolicy {
    pub fn load() -> Result<Self, ConfigError> {
        let contribution_amount = env::var("FUND_CONTRIBUTION_AMOUNT")
            .unwrap_or_else(|_| "500".to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidContributionAmount)?;
        if contribution_amount == 0 {
            return Err(ConfigError::InvalidContributionAmount);
        }

        let default_duration_days = env::var("FUND_DURATION_DAYS")
            .unwrap_or_else(|_| "14".to_string())
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidDurationDays)?;
        if default_duration_days <= 0 {
            return Err(ConfigError::InvalidDurationDays);
        }

        let admin_email =
            env::var("FUND_ADMIN_EMAIL").unwrap_or_else(|_| "admin@harambee.example".to_string());

        Ok(Self {
            contribution_amount,
            default_duration_days,
            admin_email,
        })
    }
}

impl Default for FundPolicy {
    fn default() -> Self {
        Self {
            contribution_amount: 500,
            default_duration_days: 14,
            admin_email: "admin@harambee.example".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidContributionAmount,
    InvalidDurationDays,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidContributionAmount => {
                write!(f, "FUND_CONTRIBUTION_AMOUNT must be a positive integer")
            }
            ConfigError::InvalidDurationDays => {
                write!(f, "FUND_DURATION_DAYS must be a positive number of days")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
