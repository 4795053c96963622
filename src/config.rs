//! Runtime settings for the billing engine.
//!
//! Settings resolve in three layers: built-in defaults, the first TOML file
//! found in the search list, then `LOG_*` and `CDR_BILLING_*` environment
//! variables. The merged result is checked once before use.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Every tunable of a billing run, grouped by concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub logging: LoggingConfig,

    /// Fallback classification policy
    pub classifier: ClassifierConfig,

    /// Client revenue reconciliation
    pub reconciler: ReconcilerConfig,

    /// Terminal and JSON rendering
    pub output: OutputConfig,

    /// Files read or written outside the CDR inputs
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

/// What the classifier answers when no prefix rule matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierConfig {
    pub unknown_domestic_rate: Decimal,
    pub unknown_international_rate: Decimal,
    pub unknown_domestic_label: String,
    pub unknown_international_label: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            unknown_domestic_rate: Decimal::ZERO,
            unknown_international_rate: dec!(0.50),
            unknown_domestic_label: "Altro".to_string(),
            unknown_international_label: "Internazionale Sconosciuto".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconcilerConfig {
    /// `per_minute` or `cost_plus`
    pub mode: String,
    pub markup_pct: Decimal,
    pub unassigned_label: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            mode: "per_minute".to_string(),
            markup_pct: dec!(30),
            unassigned_label: "Senza cliente".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub json_pretty: bool,
    pub default_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
    #[serde(default)]
    pub prefix_table: Option<PathBuf>,
    #[serde(default)]
    pub clients: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "WARN".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            classifier: ClassifierConfig::default(),
            reconciler: ReconcilerConfig::default(),
            output: OutputConfig {
                json_pretty: true,
                default_limit: 20,
            },
            paths: PathsConfig {
                log_directory: PathBuf::from("logs"),
                prefix_table: None,
                clients: None,
            },
        }
    }
}

impl Config {
    /// Defaults, then the first config file on the search list, then env.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("cdr-billing.toml"),
            PathBuf::from(".cdr-billing.toml"),
            dirs::config_dir()
                .map(|d| d.join("cdr-billing").join("config.toml"))
                .unwrap_or_default(),
        ];

        if let Some(path) = config_paths.iter().find(|p| p.is_file()) {
            info!(file = %path.display(), "Using config file");
            config = Self::load_from_file(path)?;
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read settings from {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Overlay `LOG_*` and `CDR_BILLING_*` variables. Rates and markup must
    /// parse as decimals.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        for (var, slot) in [
            ("LOG_LEVEL", &mut self.logging.level),
            ("LOG_FORMAT", &mut self.logging.format),
            ("LOG_OUTPUT", &mut self.logging.output),
            ("CDR_BILLING_REVENUE_MODE", &mut self.reconciler.mode),
        ] {
            if let Ok(value) = env::var(var) {
                *slot = value;
            }
        }

        if let Ok(val) = env::var("CDR_BILLING_UNKNOWN_DOMESTIC_RATE") {
            self.classifier.unknown_domestic_rate = Decimal::from_str(&val)
                .context("Invalid CDR_BILLING_UNKNOWN_DOMESTIC_RATE")?;
        }
        if let Ok(val) = env::var("CDR_BILLING_UNKNOWN_INTERNATIONAL_RATE") {
            self.classifier.unknown_international_rate = Decimal::from_str(&val)
                .context("Invalid CDR_BILLING_UNKNOWN_INTERNATIONAL_RATE")?;
        }

        if let Ok(val) = env::var("CDR_BILLING_MARKUP_PCT") {
            self.reconciler.markup_pct =
                Decimal::from_str(&val).context("Invalid CDR_BILLING_MARKUP_PCT")?;
        }

        if let Some(dir) = env::var_os("CDR_BILLING_LOG_DIR") {
            self.paths.log_directory = dir.into();
        }
        if let Ok(val) = env::var("CDR_BILLING_PREFIX_TABLE") {
            self.paths.prefix_table = Some(PathBuf::from(val));
        }
        if let Ok(val) = env::var("CDR_BILLING_CLIENTS") {
            self.paths.clients = Some(PathBuf::from(val));
        }

        Ok(())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "Log format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            );
        }
        if !matches!(self.logging.output.as_str(), "console" | "file" | "both") {
            anyhow::bail!(
                "Log output must be 'console', 'file' or 'both', got '{}'",
                self.logging.output
            );
        }

        let classifier = &self.classifier;
        if classifier.unknown_domestic_rate.is_sign_negative()
            && !classifier.unknown_domestic_rate.is_zero()
        {
            anyhow::bail!("Unknown domestic rate cannot be negative");
        }
        if classifier.unknown_international_rate.is_sign_negative()
            && !classifier.unknown_international_rate.is_zero()
        {
            anyhow::bail!("Unknown international rate cannot be negative");
        }
        if classifier.unknown_domestic_label.trim().is_empty()
            || classifier.unknown_international_label.trim().is_empty()
        {
            anyhow::bail!("Unknown category labels must not be empty");
        }
        if classifier.unknown_international_rate.is_zero() {
            warn!("Unknown international numbers will be costed at zero");
        }

        if !matches!(self.reconciler.mode.as_str(), "per_minute" | "cost_plus") {
            anyhow::bail!(
                "Revenue mode must be 'per_minute' or 'cost_plus', got '{}'",
                self.reconciler.mode
            );
        }
        if self.reconciler.markup_pct.is_sign_negative() && !self.reconciler.markup_pct.is_zero() {
            anyhow::bail!("Markup percentage cannot be negative");
        }
        if self.reconciler.unassigned_label.trim().is_empty() {
            anyhow::bail!("Unassigned client label must not be empty");
        }

        if self.output.default_limit == 0 {
            anyhow::bail!("Default limit must be greater than 0");
        }

        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).context("Cannot encode settings as TOML")?;
        fs::write(path, text)
            .with_context(|| format!("Cannot write settings to {}", path.display()))?;
        info!(file = %path.display(), "Settings written");
        Ok(())
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Process-wide settings, resolved on first use. Unusable sources fall back
/// to the defaults with a warning on stderr.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: ignoring invalid configuration: {:#}", e);
            Config::default()
        })
    })
}
