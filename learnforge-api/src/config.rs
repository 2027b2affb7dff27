//! Application Configuration
//!
//! Configuration is read from an optional YAML file and then overridden
//! field by field from environment variables. Defaults suit local
//! development against the in-memory store.

use learnforge_core::ConfigError;
use learnforge_llm::providers::{gemini, openai};
use learnforge_storage::DbConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_AI_TIMEOUT_SECS, DEFAULT_BIND_HOST, DEFAULT_CACHE_SWEEP_SECS, DEFAULT_PORT,
};

// ============================================================================
// ENUMS
// ============================================================================

/// Which result store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    #[serde(alias = "inmem")]
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "inmem" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::InvalidValue {
                field: "storage".to_string(),
                value: other.to_string(),
                reason: "must be one of: memory, postgres".to_string(),
            }),
        }
    }
}

/// Which upstream generation backend is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAI,
    Gemini,
}

impl ProviderKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => openai::DEFAULT_BASE_URL,
            ProviderKind::Gemini => gemini::DEFAULT_BASE_URL,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => openai::DEFAULT_MODEL,
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(ConfigError::ProviderNotSupported {
                provider: other.to_string(),
            }),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidValue {
                field: "log_format".to_string(),
                value: other.to_string(),
                reason: "must be one of: json, pretty".to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

/// PostgreSQL settings, used when `storage` is `postgres`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            host: db.host,
            port: db.port,
            name: db.dbname,
            user: db.user,
            password: db.password,
            pool_size: db.max_size,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

/// Upstream generation provider settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub provider: ProviderKind,
    /// Server root; the provider's public endpoint when unset.
    pub base_url: Option<String>,
    pub api_key: String,
    /// Model name; the provider's default when unset.
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            api_key: String::new(),
            model: None,
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

impl AiConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url())
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ============================================================================
// APP CONFIGURATION
// ============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub cache_sweep_secs: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            storage: StorageBackend::default(),
            database: DatabaseConfig::default(),
            ai: AiConfig::default(),
            cache_sweep_secs: DEFAULT_CACHE_SWEEP_SECS,
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment.
    ///
    /// The file is `LEARNFORGE_CONFIG` if set (and must exist), otherwise
    /// `config/<LEARNFORGE_ENV>.yml` when present. Environment variables:
    /// - `LEARNFORGE_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` / `LEARNFORGE_PORT`: Listen port (default: 8080)
    /// - `LEARNFORGE_STORAGE`: "memory" or "postgres" (default: memory)
    /// - `LEARNFORGE_DB_HOST`, `LEARNFORGE_DB_PORT`, `LEARNFORGE_DB_NAME`,
    ///   `LEARNFORGE_DB_USER`, `LEARNFORGE_DB_PASSWORD`, `LEARNFORGE_DB_POOL_SIZE`
    /// - `LEARNFORGE_AI_PROVIDER`: "openai" or "gemini" (default: openai)
    /// - `LEARNFORGE_AI_BASE_URL`, `LEARNFORGE_AI_API_KEY`, `LEARNFORGE_AI_MODEL`,
    ///   `LEARNFORGE_AI_TIMEOUT_SECS`
    /// - `LEARNFORGE_CACHE_SWEEP_SECS`: Cache sweep interval (default: 60)
    /// - `LEARNFORGE_LOG_LEVEL`, `LEARNFORGE_LOG_FORMAT`: "json" or "pretty"
    pub fn load() -> Result<Self, ConfigError> {
        let env = |key: &str| std::env::var(key).ok();

        let mut config = match env("LEARNFORGE_CONFIG") {
            Some(path) => Self::from_yaml_file(Path::new(&path))?,
            None => {
                let profile = env("LEARNFORGE_ENV").unwrap_or_else(|| "development".to_string());
                let path = PathBuf::from("config").join(format!("{}.yml", profile));
                if path.exists() {
                    Self::from_yaml_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(env)?;
        Ok(config)
    }

    /// Parse a YAML file. Absent fields keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&contents, &display)
    }

    pub fn from_yaml_str(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// Override fields from `lookup`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("LEARNFORGE_BIND") {
            self.bind_host = host;
        }
        if let Some(port) = get("PORT").or_else(|| get("LEARNFORGE_PORT")) {
            self.port = parse_field("port", &port)?;
        }
        if let Some(storage) = get("LEARNFORGE_STORAGE") {
            self.storage = storage.parse()?;
        }

        if let Some(host) = get("LEARNFORGE_DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = get("LEARNFORGE_DB_PORT") {
            self.database.port = parse_field("database.port", &port)?;
        }
        if let Some(name) = get("LEARNFORGE_DB_NAME") {
            self.database.name = name;
        }
        if let Some(user) = get("LEARNFORGE_DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = get("LEARNFORGE_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(size) = get("LEARNFORGE_DB_POOL_SIZE") {
            self.database.pool_size = parse_field("database.pool_size", &size)?;
        }

        if let Some(provider) = get("LEARNFORGE_AI_PROVIDER") {
            self.ai.provider = provider.parse()?;
        }
        if let Some(base_url) = get("LEARNFORGE_AI_BASE_URL") {
            self.ai.base_url = Some(base_url);
        }
        if let Some(api_key) = get("LEARNFORGE_AI_API_KEY") {
            self.ai.api_key = api_key;
        }
        if let Some(model) = get("LEARNFORGE_AI_MODEL") {
            self.ai.model = Some(model);
        }
        if let Some(secs) = get("LEARNFORGE_AI_TIMEOUT_SECS") {
            self.ai.timeout_secs = parse_field("ai.timeout_secs", &secs)?;
        }

        if let Some(secs) = get("LEARNFORGE_CACHE_SWEEP_SECS") {
            self.cache_sweep_secs = parse_field("cache_sweep_secs", &secs)?;
        }
        if let Some(level) = get("LEARNFORGE_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = get("LEARNFORGE_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }

        Ok(())
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ai.api_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "ai.api_key".to_string(),
            });
        }
        if self.storage == StorageBackend::Postgres && self.database.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "database.name".to_string(),
            });
        }
        if self.cache_sweep_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache_sweep_secs".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "bind".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_secs.max(1))
    }

    /// Pool configuration for the PostgreSQL store.
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            host: self.database.host.clone(),
            port: self.database.port,
            dbname: self.database.name.clone(),
            user: self.database.user.clone(),
            password: self.database.password.clone(),
            max_size: self.database.pool_size,
            ..DbConfig::default()
        }
    }
}

fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.ai.base_url(), "https://api.openai.com");
        assert_eq!(config.ai.model(), "gpt-3.5-turbo");
        assert_eq!(config.cache_sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_gemini_defaults_follow_provider() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[("LEARNFORGE_AI_PROVIDER", "gemini")]))
            .unwrap();
        assert_eq!(config.ai.base_url(), "https://generativelanguage.googleapis.com");
        assert_eq!(config.ai.model(), "gemini-2.0-flash-exp");
    }

    #[test]
    fn test_env_overrides_yaml() {
        let yaml = r#"
port: 9000
storage: postgres
database:
  name: lessons
ai:
  provider: gemini
  api_key: from-file
  model: gemini-pro
"#;
        let mut config = AppConfig::from_yaml_str(yaml, "inline").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database.name, "lessons");
        assert_eq!(config.database.host, "localhost");

        config
            .apply_overrides(lookup(&[
                ("PORT", "7000"),
                ("LEARNFORGE_AI_API_KEY", "from-env"),
                ("LEARNFORGE_DB_HOST", "db.internal"),
                ("LEARNFORGE_AI_MODEL", ""),
            ]))
            .unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.ai.api_key, "from-env");
        assert_eq!(config.ai.model(), "gemini-pro");
        assert_eq!(config.db_config().host, "db.internal");
        assert_eq!(config.db_config().dbname, "lessons");
    }

    #[test]
    fn test_port_prefers_platform_variable() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[("PORT", "3001"), ("LEARNFORGE_PORT", "3002")]))
            .unwrap();
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(lookup(&[("LEARNFORGE_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "port"));

        let err = config
            .apply_overrides(lookup(&[("LEARNFORGE_AI_PROVIDER", "claude")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ProviderNotSupported {
                provider: "claude".to_string()
            }
        );
    }

    #[test]
    fn test_storage_aliases() {
        assert_eq!("inmem".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("PostgreSQL".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::MissingRequired {
                field: "ai.api_key".to_string()
            }
        );

        config.ai.api_key = "sk-test".to_string();
        assert!(config.validate().is_ok());

        config.storage = StorageBackend::Postgres;
        config.database.name = String::new();
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::MissingRequired {
                field: "database.name".to_string()
            }
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.ai.api_key = "sk-secret".to_string();
        config.database.password = "hunter2".to_string();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_malformed_yaml_is_a_parse_error() {
        let err = AppConfig::from_yaml_str("port: [", "bad.yml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "bad.yml"));
    }
}
