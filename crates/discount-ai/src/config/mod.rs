use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

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
    pub model: ModelConfig,
    pub catalog: CatalogConfig,
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let training_data = env::var("DISCOUNT_TRAINING_CSV")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TRAINING_CSV));
        let trees = parse_var("DISCOUNT_MODEL_TREES", DEFAULT_TREES)?;
        if trees == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "DISCOUNT_MODEL_TREES",
                value: "0".to_string(),
            });
        }
        let seed = parse_var("DISCOUNT_MODEL_SEED", DEFAULT_SEED)?;
        let max_depth = parse_optional_var::<usize>("DISCOUNT_MODEL_MAX_DEPTH")?;

        let products_csv = env::var("DISCOUNT_CATALOG_CSV").ok().map(PathBuf::from);

        let api_url = env::var("DISCOUNT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout_secs = parse_var("DISCOUNT_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            model: ModelConfig {
                training_data,
                trees,
                seed,
                max_depth,
            },
            catalog: CatalogConfig { products_csv },
            client: ClientConfig {
                api_url,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

const DEFAULT_TRAINING_CSV: &str = "data/sales_history.csv";
const DEFAULT_TREES: usize = 200;
const DEFAULT_SEED: u64 = 42;
const DEFAULT_API_URL: &str = "http://127.0.0.1:8001/predict";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_optional_var(key)?.unwrap_or(default))
}

fn parse_optional_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        _ => Ok(None),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Training input and forest hyperparameters.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub training_data: PathBuf,
    pub trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
}

/// Optional override of the built-in product catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub products_csv: Option<PathBuf>,
}

/// Where dashboards send prediction requests when running against a remote service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive number (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
