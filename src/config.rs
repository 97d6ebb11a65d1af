use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub storage: StorageConfig,

    pub loans: LoanConfig,

    pub ai: AiConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding `users.json`, `books.json`, `issues.json` and `history.json`.
    pub data_dir: String,

    /// Directory profile pictures are copied into.
    pub profiles_dir: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 1)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "library_data".to_string(),
            profiles_dir: "library_data/profiles".to_string(),
            log_level: "warn".to_string(),
            worker_threads: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// When true, an unreadable or unparsable collection file is an error
    /// instead of being treated as an empty collection.
    pub strict_load: bool,

    /// Write collections as indented JSON.
    pub pretty: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            strict_load: false,
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanConfig {
    /// Days between issue date and due date.
    pub loan_days: i64,

    /// Fine charged per whole day a book is returned late.
    pub fine_per_day: u32,

    /// Label printed after fine amounts.
    pub currency: String,
}

impl Default for LoanConfig {
    fn default() -> Self {
        Self {
            loan_days: 14,
            fine_per_day: crate::services::fine::DEFAULT_FINE_PER_DAY,
            currency: "rupees".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,

    /// API key stored directly in the config file. Prefer `api_key_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,

    pub base_url: String,

    /// Models tried in order until one answers.
    pub models: Vec<String>,

    pub request_timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            models: vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-pro".to_string(),
            ],
            request_timeout_seconds: 30,
        }
    }
}

impl AiConfig {
    /// Resolves the API key from the config file or the configured environment variable.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Store new passwords as Argon2id hashes instead of plaintext.
    /// Existing plaintext entries keep working either way.
    pub hash_passwords: bool,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hash_passwords: false,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_config_path()];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("libris").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".libris").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("libris.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.data_dir.trim().is_empty() {
            anyhow::bail!("general.data_dir cannot be empty");
        }

        if self.loans.loan_days <= 0 {
            anyhow::bail!("loans.loan_days must be > 0");
        }

        if self.ai.enabled && self.ai.models.is_empty() {
            anyhow::bail!("ai.models must list at least one model when ai is enabled");
        }

        Ok(())
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.data_dir)
    }

    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.profiles_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.loans.loan_days, 14);
        assert_eq!(config.loans.fine_per_day, 5);
        assert_eq!(config.general.data_dir, "library_data");
        assert!(!config.storage.strict_load);
        assert!(!config.security.hash_passwords);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[loans]"));
        assert!(toml_str.contains("[ai]"));
        assert!(!toml_str.contains("api_key ="));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [loans]
            fine_per_day = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.loans.fine_per_day, 10);

        assert_eq!(config.loans.loan_days, 14);
        assert_eq!(config.general.data_dir, "library_data");
    }

    #[test]
    fn test_validate_rejects_zero_loan_period() {
        let mut config = Config::default();
        config.loans.loan_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = Config::default();
        config.ai.api_key = Some("from-file".to_string());
        config.ai.api_key_env = "LIBRIS_TEST_UNSET_KEY_VAR".to_string();
        assert_eq!(config.ai.resolve_api_key().as_deref(), Some("from-file"));

        config.ai.api_key = Some("   ".to_string());
        assert_eq!(config.ai.resolve_api_key(), None);
    }
}
