use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub engine: EngineConfigValues,
    pub log: LogConfig,
    pub tracing: TracingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfigValues {
    pub max_concurrent_lookups: usize,
    pub max_value_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
    pub sample_rate: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8181,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            timeout_ms: 2000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost:5432/sieve".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for EngineConfigValues {
    fn default() -> Self {
        let defaults = sieve_core::EngineConfig::default();
        Self {
            max_concurrent_lookups: defaults.max_concurrent_lookups,
            max_value_len: defaults.max_value_len,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "sieve".to_string(),
            sample_rate: 1.0,
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e.to_string()))?;
            toml::from_str::<AppConfig>(&contents)
                .map_err(|e| ConfigError::ParseToml(e.to_string()))?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SIEVE_HTTP_HOST") {
            self.http.host = v;
        }
        if let Ok(v) = std::env::var("SIEVE_HTTP_PORT")
            && let Ok(port) = v.parse()
        {
            self.http.port = port;
        }
        if let Ok(v) = std::env::var("SIEVE_STORE_BACKEND") {
            match v.as_str() {
                "memory" => self.store.backend = StoreBackend::Memory,
                "postgres" => self.store.backend = StoreBackend::Postgres,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("SIEVE_STORE_TIMEOUT_MS")
            && let Ok(ms) = v.parse()
        {
            self.store.timeout_ms = ms;
        }
        if let Ok(v) = std::env::var("SIEVE_DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("SIEVE_DATABASE_MAX_CONNECTIONS")
            && let Ok(n) = v.parse()
        {
            self.database.max_connections = n;
        }
        if let Ok(v) = std::env::var("SIEVE_ENGINE_MAX_CONCURRENT_LOOKUPS")
            && let Ok(n) = v.parse()
        {
            self.engine.max_concurrent_lookups = n;
        }
        if let Ok(v) = std::env::var("SIEVE_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Ok(v) = std::env::var("SIEVE_LOG_FORMAT") {
            match v.as_str() {
                "json" => self.log.format = LogFormat::Json,
                "pretty" => self.log.format = LogFormat::Pretty,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("SIEVE_TRACING_ENABLED") {
            self.tracing.enabled = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("SIEVE_TRACING_OTLP_ENDPOINT") {
            self.tracing.otlp_endpoint = v;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Validation(
                "http.port must be non-zero".to_string(),
            ));
        }
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "store.timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.engine.max_concurrent_lookups == 0 {
            return Err(ConfigError::Validation(
                "engine.max_concurrent_lookups must be non-zero".to_string(),
            ));
        }
        if self.engine.max_value_len == 0 {
            return Err(ConfigError::Validation(
                "engine.max_value_len must be non-zero".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Postgres && self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.tracing.sample_rate) {
            return Err(ConfigError::Validation(
                "tracing.sample_rate must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_engine_config(&self) -> sieve_core::EngineConfig {
        sieve_core::EngineConfig {
            max_concurrent_lookups: self.engine.max_concurrent_lookups,
            max_value_len: self.engine.max_value_len,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    ReadFile(String, String),

    #[error("failed to parse TOML config: {0}")]
    ParseToml(String),

    #[error("config validation failed: {0}")]
    Validation(String),
}
