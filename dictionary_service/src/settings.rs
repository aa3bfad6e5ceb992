//! Configuration management with layered file and environment variable support.

use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for receiving the request line and headers.
    pub read_timeout_seconds: u64,
    /// Upper bound for producing a response once the request is read.
    pub request_timeout_seconds: u64,
    /// Keep-alive connections with no request for this long are closed.
    pub idle_timeout_seconds: u64,
    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            read_timeout_seconds: 10,
            request_timeout_seconds: 10,
            idle_timeout_seconds: 30,
            shutdown_timeout_seconds: 5,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/dico.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            enable_target: false,
        }
    }
}

/// Main settings structure with all configuration sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from the embedded defaults, an optional local
    /// `dictionary.{toml,yaml,json}` file and `DICO__*` environment variables.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(
                include_str!("../config.toml"),
                FileFormat::Toml,
            ))
            .add_source(File::with_name("dictionary").required(false))
            .add_source(
                Environment::with_prefix("DICO")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        Self::apply_env_overrides(&mut settings)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Short-form overrides for the two settings most often changed per host.
    fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
        if let Ok(port) = std::env::var("DICO_SERVER_PORT") {
            settings.server.port = port
                .parse()
                .map_err(|e| anyhow!("DICO_SERVER_PORT '{}' is not a port: {}", port, e))?;
        }
        if let Ok(data_file) = std::env::var("DICO_DATA_FILE") {
            settings.storage.data_file = PathBuf::from(data_file);
        }

        Ok(())
    }

    /// Override the listen address with a `host:port` string.
    pub fn set_addr(&mut self, addr: &str) -> Result<()> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("address '{}' must be HOST:PORT", addr))?;
        self.server.host = host.trim_matches(|c| c == '[' || c == ']').to_string();
        self.server.port = port
            .parse()
            .map_err(|e| anyhow!("invalid port in '{}': {}", addr, e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port cannot be 0"));
        }
        if self.server.read_timeout_seconds == 0 {
            return Err(anyhow!("Read timeout cannot be 0"));
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(anyhow!("Request timeout cannot be 0"));
        }
        if self.server.idle_timeout_seconds == 0 {
            return Err(anyhow!("Idle timeout cannot be 0"));
        }
        if self.server.shutdown_timeout_seconds == 0 {
            return Err(anyhow!("Shutdown timeout cannot be 0"));
        }
        if self.storage.data_file.as_os_str().is_empty() {
            return Err(anyhow!("Data file path cannot be empty"));
        }
        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => return Err(anyhow!("Unknown log format '{}'", other)),
        }

        Ok(())
    }
}
