use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::applications::media::{sanitize_segment, DEFAULT_MEDIA_FOLDER};

const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_LOCAL_MEDIA_ROOT: &str = "./media";

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
    pub media: MediaConfig,
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
        let body_limit_bytes = match non_empty_var("UPLOAD_LIMIT_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidBodyLimit)?,
            None => DEFAULT_BODY_LIMIT_BYTES,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let media = MediaConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                body_limit_bytes,
            },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            media,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for request bodies, multipart uploads included.
    pub body_limit_bytes: usize,
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
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

/// Which media host receives uploaded documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaBackend {
    Local,
    GoogleDrive,
}

impl MediaBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "local" | "fs" => Ok(Self::Local),
            "drive" | "gdrive" | "google-drive" => Ok(Self::GoogleDrive),
            other => Err(ConfigError::UnknownMediaBackend(other.to_string())),
        }
    }
}

/// Document storage settings.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub folder: String,
    pub local_root: PathBuf,
    pub public_base_url: String,
    pub drive_service_account: Option<PathBuf>,
    pub drive_parent_id: Option<String>,
}

impl MediaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = MediaBackend::parse(&env::var("MEDIA_BACKEND").unwrap_or_default())?;
        let folder =
            non_empty_var("MEDIA_FOLDER").unwrap_or_else(|| DEFAULT_MEDIA_FOLDER.to_string());
        let local_root = PathBuf::from(
            non_empty_var("MEDIA_LOCAL_ROOT").unwrap_or_else(|| DEFAULT_LOCAL_MEDIA_ROOT.to_string()),
        );
        let public_base_url = non_empty_var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("file://{}", local_root.display()));
        let drive_service_account = non_empty_var("MEDIA_DRIVE_SERVICE_ACCOUNT").map(PathBuf::from);
        let drive_parent_id = non_empty_var("MEDIA_DRIVE_PARENT_ID");

        if sanitize_segment(&folder).is_empty() {
            return Err(ConfigError::InvalidMediaFolder(folder));
        }
        if backend == MediaBackend::GoogleDrive && drive_service_account.is_none() {
            return Err(ConfigError::MissingDriveCredentials);
        }

        Ok(Self {
            backend,
            folder,
            local_root,
            public_base_url,
            drive_service_account,
            drive_parent_id,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBodyLimit,
    UnknownMediaBackend(String),
    InvalidMediaFolder(String),
    MissingDriveCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBodyLimit => {
                write!(f, "UPLOAD_LIMIT_BYTES must be a positive byte count")
            }
            ConfigError::UnknownMediaBackend(value) => {
                write!(f, "MEDIA_BACKEND '{}' is not one of local|drive", value)
            }
            ConfigError::InvalidMediaFolder(value) => write!(
                f,
                "MEDIA_FOLDER '{}' needs at least one letter, digit, '-' or '_'",
                value
            ),
            ConfigError::MissingDriveCredentials => write!(
                f,
                "MEDIA_DRIVE_SERVICE_ACCOUNT is required when MEDIA_BACKEND=drive"
            ),
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
