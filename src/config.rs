//! Server configuration
//!
//! Read from `EVENTS_*` environment variables, with `.env` support:
//!
//! ```bash
//! EVENTS_HOST=0.0.0.0
//! EVENTS_PORT=8000
//! EVENTS_DATA_DIR=data
//! EVENTS_JWT_SECRET=your-super-secret-key-at-least-32-chars
//! EVENTS_ACCESS_TOKEN_TTL=3600
//! EVENTS_REFRESH_TOKEN_TTL=604800
//! EVENTS_CORS_ORIGINS=http://localhost:3000,http://localhost:5173
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Minimum accepted JWT secret length
pub const MIN_SECRET_LEN: usize = 32;

/// Name of the persisted fallback secret inside the data directory
const SECRET_FILE: &str = ".jwt_secret";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("JWT secret must be at least 32 characters")]
    SecretTooShort,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runtime configuration for the server
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// `None` means "load or generate `<data_dir>/.jwt_secret`"
    pub jwt_secret: Option<String>,
    pub access_token_ttl: i64,
    pub refresh_token_ttl: i64,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            data_dir: PathBuf::from("data"),
            jwt_secret: None,
            access_token_ttl: 3600,     // 1 hour
            refresh_token_ttl: 604_800, // 7 days
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("EVENTS_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("EVENTS_PORT") {
            config.port = parse_value("EVENTS_PORT", &port)?;
        }
        if let Some(dir) = lookup("EVENTS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secret) = lookup("EVENTS_JWT_SECRET") {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::SecretTooShort);
            }
            config.jwt_secret = Some(secret);
        }
        if let Some(ttl) = lookup("EVENTS_ACCESS_TOKEN_TTL") {
            config.access_token_ttl = parse_value("EVENTS_ACCESS_TOKEN_TTL", &ttl)?;
        }
        if let Some(ttl) = lookup("EVENTS_REFRESH_TOKEN_TTL") {
            config.refresh_token_ttl = parse_value("EVENTS_REFRESH_TOKEN_TTL", &ttl)?;
        }
        if let Some(origins) = lookup("EVENTS_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(config)
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidValue {
            key: "EVENTS_HOST",
            value: addr,
        })
    }

    /// The configured secret, or one persisted in the data directory
    ///
    /// Keeps tokens valid across restarts when no secret is configured.
    pub fn resolve_jwt_secret(&self) -> Result<String, ConfigError> {
        match self.jwt_secret {
            Some(ref secret) => Ok(secret.clone()),
            None => load_or_create_secret_file(&self.data_dir),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn load_or_create_secret_file(data_dir: &Path) -> Result<String, ConfigError> {
    let secret_path = data_dir.join(SECRET_FILE);

    if secret_path.exists() {
        let secret = std::fs::read_to_string(&secret_path)?.trim().to_string();
        if secret.len() >= MIN_SECRET_LEN {
            info!(path = %secret_path.display(), "Loaded JWT secret");
            return Ok(secret);
        }
        warn!(path = %secret_path.display(), "Stored JWT secret is too short, regenerating");
    }

    let secret = generate_secret();
    std::fs::create_dir_all(data_dir)?;
    std::fs::write(&secret_path, &secret)?;
    warn!(
        path = %secret_path.display(),
        "Generated JWT secret; set EVENTS_JWT_SECRET in production"
    );
    Ok(secret)
}

/// 64 hex chars mixed from the clock, the pid and std's random hasher keys
fn generate_secret() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let now = chrono::Utc::now();
    let nanos = now.timestamp_nanos_opt().unwrap_or(0);

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_i64(nanos);
    hasher.write_u32(std::process::id());
    let first = hasher.finish();

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(first);
    hasher.write_i64(now.timestamp_micros());
    let second = hasher.finish();

    format!("{:016x}{:016x}{:016x}{:016x}", first, second, nanos as u64, first ^ second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.access_token_ttl, 3600);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("EVENTS_PORT", "9090"),
            ("EVENTS_DATA_DIR", "/tmp/events"),
            ("EVENTS_CORS_ORIGINS", "http://a.test, http://b.test"),
            ("EVENTS_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/events"));
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.bind_addr().unwrap().port(), 9090);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("EVENTS_PORT", "eighty")])),
            Err(ConfigError::InvalidValue { key: "EVENTS_PORT", .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("EVENTS_JWT_SECRET", "short")])),
            Err(ConfigError::SecretTooShort)
        ));
    }

    #[test]
    fn test_generated_secret_is_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let first = config.resolve_jwt_secret().unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(config.resolve_jwt_secret().unwrap(), first);
    }
}
