// app/src/config.rs

use crate::errors::{AppError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(format!("expected 'pretty' or 'json', got '{}'", other)),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,

  // Startup seeding of users and sample products
  pub seed_db: bool,
  pub seed_admin_password: String,

  pub token_ttl: chrono::Duration,
  pub low_stock_threshold: i64,
  pub log_format: LogFormat,

  pub chatbot: ChatbotConfig,
}

/// Settings for the outbound chat provider client.
#[derive(Clone)]
pub struct ChatbotConfig {
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
  pub timeout: Duration,
  pub connect_timeout: Duration,
  /// Retries after the first attempt; 0 disables retrying.
  pub max_retries: u32,
  /// Base delay, doubled per attempt before jitter.
  pub retry_delay: Duration,
  /// Extra PEM root certificate trusted by the chat client only.
  pub ca_cert_path: Option<PathBuf>,
}

impl fmt::Debug for ChatbotConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChatbotConfig")
      .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .field("timeout", &self.timeout)
      .field("connect_timeout", &self.connect_timeout)
      .field("max_retries", &self.max_retries)
      .field("retry_delay", &self.retry_delay)
      .field("ca_cert_path", &self.ca_cert_path)
      .finish()
  }
}

/// Tokens live at most a year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Builds the configuration from any variable source (the environment, or a map in tests).
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let parse_or = |name: &str, default: &str| get_env(name).unwrap_or_else(|| default.to_string());

    fn parse_var<T>(name: &str, raw: String) -> Result<T>
    where
      T: FromStr,
      T::Err: fmt::Display,
    {
      raw
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
    }

    let server_host = parse_or("SERVER_HOST", "127.0.0.1");
    let server_port: u16 = parse_var("SERVER_PORT", parse_or("SERVER_PORT", "8080"))?;
    let database_url = parse_or("DATABASE_URL", "sqlite://data/stockroom.db?mode=rwc");
    let database_max_connections: u32 =
      parse_var("DATABASE_MAX_CONNECTIONS", parse_or("DATABASE_MAX_CONNECTIONS", "5"))?;
    if database_max_connections == 0 {
      return Err(AppError::Config("Invalid DATABASE_MAX_CONNECTIONS: must be at least 1".to_string()));
    }

    let seed_db: bool = parse_var("SEED_DB", parse_or("SEED_DB", "false"))?;
    let seed_admin_password = parse_or("SEED_ADMIN_PASSWORD", "password");

    let token_ttl_minutes: i64 = parse_var("TOKEN_TTL_MINUTES", parse_or("TOKEN_TTL_MINUTES", "60"))?;
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
      return Err(AppError::Config(format!(
        "Invalid TOKEN_TTL_MINUTES: must be between 1 and {}",
        MAX_TOKEN_TTL_MINUTES
      )));
    }
    let token_ttl = chrono::Duration::try_minutes(token_ttl_minutes)
      .ok_or_else(|| AppError::Config("Invalid TOKEN_TTL_MINUTES: out of range".to_string()))?;
    let low_stock_threshold: i64 = parse_var("LOW_STOCK_THRESHOLD", parse_or("LOW_STOCK_THRESHOLD", "10"))?;
    if low_stock_threshold < 0 {
      return Err(AppError::Config("Invalid LOW_STOCK_THRESHOLD: cannot be negative".to_string()));
    }
    let log_format: LogFormat = parse_var("LOG_FORMAT", parse_or("LOG_FORMAT", "pretty"))?;

    let chatbot = ChatbotConfig {
      api_key: get_env("GEMINI_API_KEY"),
      base_url: parse_or("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com")
        .trim_end_matches('/')
        .to_string(),
      model: parse_or("GEMINI_MODEL", "gemini-1.5-flash"),
      timeout: Duration::from_secs(parse_var("GEMINI_TIMEOUT_SECS", parse_or("GEMINI_TIMEOUT_SECS", "30"))?),
      connect_timeout: Duration::from_secs(parse_var(
        "GEMINI_CONNECT_TIMEOUT_SECS",
        parse_or("GEMINI_CONNECT_TIMEOUT_SECS", "10"),
      )?),
      max_retries: parse_var("GEMINI_MAX_RETRIES", parse_or("GEMINI_MAX_RETRIES", "3"))?,
      retry_delay: Duration::from_millis(parse_var(
        "GEMINI_RETRY_DELAY_MS",
        parse_or("GEMINI_RETRY_DELAY_MS", "1000"),
      )?),
      ca_cert_path: get_env("GEMINI_CA_CERT_PATH").map(PathBuf::from),
    };

    tracing::info!("Application configuration loaded successfully.");
    tracing::debug!(?chatbot, "Chat provider settings");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      seed_db,
      seed_admin_password,
      token_ttl,
      low_stock_threshold,
      log_format,
      chatbot,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
