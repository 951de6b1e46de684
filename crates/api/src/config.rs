use std::path::PathBuf;

use convertx_replicate::api::DEFAULT_BASE_URL;
use secrecy::SecretString;

/// Errors raised while reading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// Everything except the Replicate tokens has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `150`). Must exceed the
    /// two-minute poll budget of a generation.
    pub request_timeout_secs: u64,
    /// Replicate API tokens in rotation order.
    pub replicate_tokens: Vec<SecretString>,
    /// Replicate REST base URL.
    pub replicate_base_url: String,
    /// JSON file holding per-user history. `None` keeps history in memory.
    pub history_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                         |
    /// |------------------------|---------------------------------|
    /// | `HOST`                 | `0.0.0.0`                       |
    /// | `PORT`                 | `3001`                          |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS` | `150`                           |
    /// | `REPLICATE_API_TOKENS` | required, comma-separated       |
    /// | `REPLICATE_BASE_URL`   | `https://api.replicate.com/v1`  |
    /// | `HISTORY_PATH`         | unset (in-memory history)       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port = parse_var(&lookup, "PORT", 3001u16)?;

        let cors_origins = split_list(
            &lookup("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:5173".into()),
        );

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 150u64)?;

        let replicate_tokens: Vec<SecretString> = split_list(
            &lookup("REPLICATE_API_TOKENS").ok_or(ConfigError::Missing("REPLICATE_API_TOKENS"))?,
        )
        .into_iter()
        .map(SecretString::from)
        .collect();
        if replicate_tokens.is_empty() {
            return Err(ConfigError::Missing("REPLICATE_API_TOKENS"));
        }

        let replicate_base_url =
            lookup("REPLICATE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());

        let history_path = lookup("HISTORY_PATH")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            replicate_tokens,
            replicate_base_url,
            history_path,
        })
    }
}

// ---- private helpers ----

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
