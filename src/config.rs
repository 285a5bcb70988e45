use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::report::{DEFAULT_CODE_LENGTH, DEFAULT_MAX_EVIDENCE_BYTES};

/// Main configuration structure for ClearWhistle
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClearWhistleConfig {
    /// Email and one-time code verification
    pub verification: VerificationConfig,
    /// Content-addressed report storage
    pub storage: StorageConfig,
    /// Ledger anchoring
    pub anchoring: AnchoringConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Required one-time code length
    pub code_length: usize,
    /// Code accepted by the demo verifier
    pub demo_code: String,
    /// Code checks allowed per minute per workflow (unlimited when unset)
    pub code_attempts_per_minute: Option<u32>,
    /// Deadline for each verification call
    pub call_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Filesystem,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Which content store to use
    pub backend: StorageBackend,
    /// Root directory for filesystem storage and the ledger
    pub data_dir: PathBuf,
    /// Largest accepted evidence attachment
    pub max_evidence_bytes: usize,
    /// Public gateway prefix used when printing content links
    pub gateway_url: String,
    /// Deadline for each storage call
    pub call_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnchoringConfig {
    /// Ledger file, relative to the data directory unless absolute
    pub ledger_file: PathBuf,
    /// Deadline for each anchoring call
    pub call_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON structured logs instead of human-readable lines
    pub json_logs: bool,
}

impl Default for ClearWhistleConfig {
    fn default() -> Self {
        Self {
            verification: VerificationConfig {
                code_length: DEFAULT_CODE_LENGTH,
                demo_code: "123456".to_string(),
                code_attempts_per_minute: None,
                call_timeout_seconds: 10,
            },
            storage: StorageConfig {
                backend: StorageBackend::Filesystem,
                data_dir: PathBuf::from(".clearwhistle"),
                max_evidence_bytes: DEFAULT_MAX_EVIDENCE_BYTES,
                gateway_url: "https://gateway.pinata.cloud/ipfs/".to_string(),
                call_timeout_seconds: 30,
            },
            anchoring: AnchoringConfig {
                ledger_file: PathBuf::from("ledger.jsonl"),
                call_timeout_seconds: 30,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl VerificationConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }
}

impl StorageConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    pub fn content_url(&self, content_id: &str) -> String {
        format!("{}{}", self.gateway_url, content_id)
    }
}

impl AnchoringConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }
}

impl ClearWhistleConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (clearwhistle.toml, .clearwhistle-rc)
    /// 3. Environment variables (prefixed with CLEARWHISTLE__)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("clearwhistle.toml").exists() {
            builder = builder.add_source(File::with_name("clearwhistle"));
        }

        if Path::new(".clearwhistle-rc").exists() {
            builder = builder
                .add_source(File::with_name(".clearwhistle-rc").format(config::FileFormat::Toml));
        }

        builder = builder.add_source(env_source());

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load configuration from an explicit file on top of the defaults
    ///
    /// Environment variables still override the file, as they do for `load`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// Ledger location with relative paths resolved against the data directory
    pub fn ledger_path(&self) -> PathBuf {
        if self.anchoring.ledger_file.is_absolute() {
            self.anchoring.ledger_file.clone()
        } else {
            self.storage.data_dir.join(&self.anchoring.ledger_file)
        }
    }
}

// Nested keys contain underscores, so sections are split on a double underscore.
fn env_source() -> Environment {
    Environment::with_prefix("CLEARWHISTLE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ClearWhistleConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = ClearWhistleConfig::load_env_file();
        ClearWhistleConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ClearWhistleConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
