/*
 * Responsibility
 * - Load settings from the environment (DATABASE_URL, CORS allow-list, JWT secret, uploads,
 *   rate limit, log files)
 * - Validate them up front (missing or malformed values fail startup)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;
// Ten years. Longer lifetimes no longer fit a token's `exp`.
pub const MAX_JWT_EXPIRE_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    pub cors_allowed_origins: Vec<String>,

    pub sqids_min_length: usize,
    pub sqids_alphabet: String,

    // HS256 signing secret, process-wide and immutable after startup
    pub jwt_secret: String,
    pub jwt_expire_seconds: u64,
    pub credential_lookup_timeout: Duration,
    pub bcrypt_cost: u32,

    pub upload_dir: PathBuf,
    pub upload_max_bytes: usize,
    pub body_limit_bytes: usize,
    pub public_base_url: Option<String>,

    // Per-client budget on /api/v1; 0 requests disables the limiter
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,

    // None keeps logs on stdout only
    pub log_dir: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the database url or the signing secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database_max_connections", &self.database_max_connections)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_expire_seconds", &self.jwt_expire_seconds)
            .field("credential_lookup_timeout", &self.credential_lookup_timeout)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("upload_dir", &self.upload_dir)
            .field("upload_max_bytes", &self.upload_max_bytes)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("log_dir", &self.log_dir)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` wires this to the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&get, "PORT", 3000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(&get("APP_ENV").unwrap_or_else(|| "development".to_string()));

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let database_max_connections = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?;

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let sqids_min_length = parse_or(&get, "SQIDS_MIN_LENGTH", 10)?;
        let sqids_alphabet = get("SQIDS_ALPHABET").unwrap_or_else(|| {
            "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string()
        });

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }
        if app_env.is_production() && jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let jwt_expire_seconds: u64 = parse_or(&get, "JWT_EXPIRE_SECONDS", 604_800)?; // 7 days
        if !(1..=MAX_JWT_EXPIRE_SECONDS).contains(&jwt_expire_seconds) {
            return Err(ConfigError::Invalid("JWT_EXPIRE_SECONDS"));
        }

        let lookup_timeout_ms: u64 = parse_or(&get, "CREDENTIAL_LOOKUP_TIMEOUT_MS", 3_000)?;
        if lookup_timeout_ms == 0 {
            return Err(ConfigError::Invalid("CREDENTIAL_LOOKUP_TIMEOUT_MS"));
        }

        let bcrypt_cost: u32 = parse_or(&get, "BCRYPT_COST", 10)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid("BCRYPT_COST"));
        }

        let upload_dir = PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()));
        let upload_max_bytes = parse_or(&get, "UPLOAD_MAX_BYTES", 5 * 1024 * 1024)?;
        let body_limit_bytes = parse_or(&get, "BODY_LIMIT_BYTES", 10 * 1024 * 1024)?;

        let public_base_url = get("PUBLIC_BASE_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let rate_limit_max_requests = parse_or(&get, "RATE_LIMIT_MAX_REQUESTS", 100)?;
        let rate_limit_window_seconds: u64 = parse_or(&get, "RATE_LIMIT_WINDOW_SECONDS", 15 * 60)?;
        if rate_limit_window_seconds == 0 {
            return Err(ConfigError::Invalid("RATE_LIMIT_WINDOW_SECONDS"));
        }

        let log_dir = get("LOG_DIR")
            .unwrap_or_else(|| "logs".to_string())
            .trim()
            .to_string();
        let log_dir = (!log_dir.is_empty()).then(|| PathBuf::from(log_dir));

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            sqids_min_length,
            sqids_alphabet,
            jwt_secret,
            jwt_expire_seconds,
            credential_lookup_timeout: Duration::from_millis(lookup_timeout_ms),
            bcrypt_cost,
            upload_dir,
            upload_max_bytes,
            body_limit_bytes,
            public_base_url,
            rate_limit_max_requests,
            rate_limit_window: Duration::from_secs(rate_limit_window_seconds),
            log_dir,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
