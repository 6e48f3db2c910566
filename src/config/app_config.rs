use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::errors::{KeysealError, Result};

/// Top-level configuration read from `config.toml`.
///
/// Every section is optional; missing values fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub keyseal: KeysealSection,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub operations: OperationsConfig,
}

impl AppConfig {
    /// Load and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(KeysealError::InvalidConfig {
                detail: format!("{} not found", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| KeysealError::InvalidConfig {
            detail: format!("Failed to parse config.toml: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Default config location for the current platform.
    ///
    /// - Linux: `~/.config/keyseal/config.toml`
    /// - macOS: `~/Library/Application Support/keyseal/config.toml`
    /// - Windows: `%APPDATA%/keyseal/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| KeysealError::InvalidConfig {
            detail: "Could not determine config directory".into(),
        })?;
        Ok(config_dir.join("keyseal").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.keyseal.format_version > CURRENT_FORMAT_VERSION {
            return Err(KeysealError::FormatVersionTooNew {
                config_version: self.keyseal.format_version,
                supported_version: CURRENT_FORMAT_VERSION,
            });
        }
        self.engine.validate()?;
        self.operations.validate()
    }
}

/// Current format version supported by this build.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// Highest scrypt work factor (log2 N) the config may request.
pub const MAX_SCRYPT_WORK_FACTOR: u8 = 30;

/// The `[keyseal]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct KeysealSection {
    /// Format version for backward compatibility. Defaults to 1 if missing.
    #[serde(default = "default_format_version")]
    pub format_version: u32,
}

impl Default for KeysealSection {
    fn default() -> Self {
        Self {
            format_version: default_format_version(),
        }
    }
}

fn default_format_version() -> u32 {
    1
}

/// The `[engine]` section: cost and size limits for the crypto engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// scrypt work factor (log2 N) used when sealing with a passphrase.
    pub scrypt_work_factor: u8,
    /// Highest work factor accepted when opening a passphrase envelope.
    pub max_work_factor: u8,
    /// zlib level, 0 to 9.
    pub compression_level: u32,
    /// Upper bound on a decompressed message body, in bytes.
    pub max_message_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scrypt_work_factor: 18,
            max_work_factor: 22,
            compression_level: 6,
            max_message_size: 16 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scrypt_work_factor == 0 || self.scrypt_work_factor > MAX_SCRYPT_WORK_FACTOR {
            return Err(KeysealError::InvalidConfig {
                detail: format!(
                    "engine.scrypt_work_factor must be 1-{MAX_SCRYPT_WORK_FACTOR}, got {}",
                    self.scrypt_work_factor
                ),
            });
        }
        if self.max_work_factor < self.scrypt_work_factor
            || self.max_work_factor > MAX_SCRYPT_WORK_FACTOR
        {
            return Err(KeysealError::InvalidConfig {
                detail: format!(
                    "engine.max_work_factor must be {}-{MAX_SCRYPT_WORK_FACTOR}, got {}",
                    self.scrypt_work_factor, self.max_work_factor
                ),
            });
        }
        if self.compression_level > 9 {
            return Err(KeysealError::InvalidConfig {
                detail: format!(
                    "engine.compression_level must be 0-9, got {}",
                    self.compression_level
                ),
            });
        }
        if self.max_message_size == 0 {
            return Err(KeysealError::InvalidConfig {
                detail: "engine.max_message_size must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

/// The `[operations]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OperationsConfig {
    /// Timeout applied by `SharedIdentity` to each engine call.
    pub timeout_secs: u64,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl OperationsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(KeysealError::InvalidConfig {
                detail: "operations.timeout_secs must be greater than 0".into(),
            });
        }
        Ok(())
    }
}
