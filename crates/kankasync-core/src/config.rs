//! Configuration module for kankasync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{Account, AccountId, AccountTier};

/// Environment variable consulted when `api.token` is not set.
pub const TOKEN_ENV_VAR: &str = "KANKA_API_TOKEN";

/// Default root of the Kanka campaigns API.
pub const DEFAULT_BASE_URL: &str = "https://api.kanka.io/1.0/campaigns";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for kankasync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vault: VaultConfig,
    pub api: ApiConfig,
    pub accounts: Vec<AccountConfig>,
    pub rate_limiting: RateLimitingConfig,
    pub tags: TagsConfig,
    pub logging: LoggingConfig,
}

/// Local document vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory holding the Markdown documents.
    pub root: PathBuf,
}

/// Remote API endpoint and credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token; falls back to `KANKA_API_TOKEN` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// One campaign bound to a vault folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Numeric campaign id.
    pub id: u64,
    pub name: String,
    /// Folder prefix inside the vault; empty means the whole vault.
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Boosted campaigns get the larger request budget.
    #[serde(default)]
    pub boosted: bool,
}

/// Per-account request budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    pub standard_requests_per_minute: u32,
    pub boosted_requests_per_minute: u32,
    /// Seconds between reservoir refills.
    pub refill_interval_secs: u64,
}

/// Tag cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Minimum seconds between remote tag listings per account.
    pub refresh_interval_secs: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when neither `RUST_LOG` nor `-v` is given.
    pub level: String,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config::load / default_path
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/kankasync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("kankasync")
            .join("config.yaml")
    }

    /// Domain accounts for every configured campaign, in file order.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.iter().map(AccountConfig::to_account).collect()
    }
}

impl AccountConfig {
    /// Converts the config entry into a domain account.
    pub fn to_account(&self) -> Account {
        let account = Account::new(AccountId::new(self.id), self.name.clone(), self.path.clone())
            .with_enabled(self.enabled)
            .with_tier(AccountTier::from_boosted(self.boosted));
        match &self.glob {
            Some(glob) => account.with_glob(glob.clone()),
            None => account,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: dirs::document_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Vault"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
        }
    }
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            standard_requests_per_minute: 30,
            boosted_requests_per_minute: 90,
            refill_interval_secs: 60,
        }
    }
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"tags.refresh_interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: &str| {
            errors.push(ValidationError {
                field,
                message: message.to_string(),
            })
        };

        // --- api ---
        if url::Url::parse(&self.api.base_url).is_err() {
            push("api.base_url".into(), "must be an absolute URL");
        }

        // --- accounts ---
        let mut seen = HashSet::new();
        for (idx, account) in self.accounts.iter().enumerate() {
            if account.id == 0 {
                push(format!("accounts[{idx}].id"), "must be greater than 0");
            }
            if !seen.insert(account.id) {
                push(format!("accounts[{idx}].id"), "duplicate account id");
            }
            if account.name.trim().is_empty() {
                push(format!("accounts[{idx}].name"), "must not be empty");
            }
            if let Some(glob) = &account.glob {
                if glob.trim().is_empty() {
                    push(format!("accounts[{idx}].glob"), "must not be empty when set");
                }
            }
        }

        // --- rate_limiting ---
        if self.rate_limiting.standard_requests_per_minute == 0 {
            push(
                "rate_limiting.standard_requests_per_minute".into(),
                "must be greater than 0",
            );
        }
        if self.rate_limiting.boosted_requests_per_minute == 0 {
            push(
                "rate_limiting.boosted_requests_per_minute".into(),
                "must be greater than 0",
            );
        }
        if self.rate_limiting.refill_interval_secs == 0 {
            push(
                "rate_limiting.refill_interval_secs".into(),
                "must be greater than 0",
            );
        }

        // --- tags ---
        if self.tags.refresh_interval_secs == 0 {
            push("tags.refresh_interval_secs".into(), "must be greater than 0");
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            push(
                "logging.level".into(),
                "must be one of: trace, debug, info, warn, error",
            );
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use kankasync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .vault_root(PathBuf::from("/home/user/Vault"))
///     .account(194416, "Shattered Isles", "Campaigns/Isles")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- vault / api ---

    pub fn vault_root(mut self, root: PathBuf) -> Self {
        self.config.vault.root = root;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api.token = Some(token.into());
        self
    }

    // --- accounts ---

    /// Adds an enabled, standard-tier account.
    pub fn account(mut self, id: u64, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.config.accounts.push(AccountConfig {
            id,
            name: name.into(),
            path: path.into(),
            glob: None,
            enabled: true,
            boosted: false,
        });
        self
    }

    /// Adds a fully specified account.
    pub fn account_config(mut self, account: AccountConfig) -> Self {
        self.config.accounts.push(account);
        self
    }

    // --- rate_limiting ---

    pub fn rate_limiting_standard_requests_per_minute(mut self, n: u32) -> Self {
        self.config.rate_limiting.standard_requests_per_minute = n;
        self
    }

    pub fn rate_limiting_boosted_requests_per_minute(mut self, n: u32) -> Self {
        self.config.rate_limiting.boosted_requests_per_minute = n;
        self
    }

    pub fn rate_limiting_refill_interval_secs(mut self, seconds: u64) -> Self {
        self.config.rate_limiting.refill_interval_secs = seconds;
        self
    }

    // --- tags ---

    pub fn tags_refresh_interval_secs(mut self, seconds: u64) -> Self {
        self.config.tags.refresh_interval_secs = seconds;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
