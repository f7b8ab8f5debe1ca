// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{FeedError, Result};
use ::config::builder::{ConfigBuilder, DefaultState};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "LEGIONTRAP";
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub privacy: PrivacyConfig,
    pub export: ExportConfig,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub events_path: PathBuf,
    pub rotate_max_bytes: u64,
    pub retention_days: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrivacyConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing)]
    pub salt: Option<String>,
    /// Mask the last octet instead of hashing when no salt is configured.
    #[serde(default)]
    pub legacy_mask: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Emit a placeholder address when the feed would otherwise be empty.
    #[serde(default)]
    pub demo_fallback: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    #[serde(default, skip_serializing)]
    pub telegram_token: Option<String>,
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    pub timeout_secs: u64,
}

impl NotifierConfig {
    pub fn is_configured(&self) -> bool {
        self.telegram_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.telegram_chat_id.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Non-secret view of the running configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub privacy_mode: &'static str,
    pub privacy_scheme: &'static str,
    pub events_path: String,
    pub rotate_max_bytes: u64,
    pub retention_days: u32,
    pub api_key_set: bool,
    pub notifier_enabled: bool,
    pub demo_fallback: bool,
}

impl Config {
    /// Loads configuration once at startup from defaults, an optional toml
    /// file, `LEGIONTRAP__*` variables and the flat legacy variables
    /// (`API_KEY`, `PRIVACY_MODE`, `FEED_SALT`, `EVENTS_PATH`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::build(path, &vars, true)
    }

    /// Same layering as [`Config::load`] but reads the flat variables from
    /// `vars` instead of the process environment.
    pub fn from_env_map(path: Option<&Path>, vars: &HashMap<String, String>) -> Result<Self> {
        Self::build(path, vars, false)
    }

    fn build(
        path: Option<&Path>,
        vars: &HashMap<String, String>,
        process_env: bool,
    ) -> Result<Self> {
        let mut builder = Self::with_defaults(::config::Config::builder())?;

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        } else {
            builder = builder
                .add_source(::config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        if process_env {
            builder = builder.add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        builder = apply_legacy_env(builder, vars)?;

        let settings = builder.build().map_err(config_error)?;

        let config: Config = settings.try_deserialize().map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>> {
        let defaults = Self::default_config();

        builder
            .set_default("server.host", defaults.server.host)
            .and_then(|b| b.set_default("server.port", i64::from(defaults.server.port)))
            .and_then(|b| {
                b.set_default(
                    "storage.events_path",
                    defaults.storage.events_path.display().to_string(),
                )
            })
            .and_then(|b| {
                b.set_default(
                    "storage.rotate_max_bytes",
                    defaults.storage.rotate_max_bytes as i64,
                )
            })
            .and_then(|b| {
                b.set_default(
                    "storage.retention_days",
                    i64::from(defaults.storage.retention_days),
                )
            })
            .and_then(|b| b.set_default("privacy.enabled", defaults.privacy.enabled))
            .and_then(|b| b.set_default("privacy.legacy_mask", defaults.privacy.legacy_mask))
            .and_then(|b| b.set_default("export.demo_fallback", defaults.export.demo_fallback))
            .and_then(|b| {
                b.set_default(
                    "notifier.timeout_secs",
                    defaults.notifier.timeout_secs as i64,
                )
            })
            .map_err(config_error)
    }

    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                api_key: None,
            },
            storage: StorageConfig {
                events_path: PathBuf::from("storage/events.jsonl"),
                rotate_max_bytes: 1_000_000,
                retention_days: 14,
            },
            privacy: PrivacyConfig {
                enabled: false,
                salt: None,
                legacy_mask: false,
            },
            export: ExportConfig {
                demo_fallback: false,
            },
            notifier: NotifierConfig {
                telegram_token: None,
                telegram_chat_id: None,
                timeout_secs: 8,
            },
        }
    }

    pub fn summary(&self) -> ConfigSummary {
        let salted = self.privacy.salt.as_deref().is_some_and(|s| !s.is_empty());
        let privacy_scheme = match (self.privacy.enabled, salted) {
            (false, _) => "none",
            (true, true) => "salted-hash",
            (true, false) => "mask-last-octet",
        };

        ConfigSummary {
            privacy_mode: if self.privacy.enabled { "on" } else { "off" },
            privacy_scheme,
            events_path: self.storage.events_path.display().to_string(),
            rotate_max_bytes: self.storage.rotate_max_bytes,
            retention_days: self.storage.retention_days,
            api_key_set: self.server.api_key.as_deref().is_some_and(|k| !k.is_empty()),
            notifier_enabled: self.notifier.is_configured(),
            demo_fallback: self.export.demo_fallback,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(FeedError::Config("port must be greater than 0".to_string()));
        }

        if self.storage.rotate_max_bytes == 0 {
            return Err(FeedError::Config(
                "rotate_max_bytes must be greater than 0".to_string(),
            ));
        }

        let salted = self.privacy.salt.as_deref().is_some_and(|s| !s.is_empty());
        if self.privacy.enabled && !salted && !self.privacy.legacy_mask {
            return Err(FeedError::Config(
                "privacy mode is enabled but no FEED_SALT is configured".to_string(),
            ));
        }

        Ok(())
    }
}

/// `on`, `true` and `1` (any case) enable a flag; everything else disables it.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1"
    )
}

fn apply_legacy_env(
    builder: ConfigBuilder<DefaultState>,
    vars: &HashMap<String, String>,
) -> Result<ConfigBuilder<DefaultState>> {
    let lookup = |key: &str| {
        vars.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let events_path = lookup("EVENTS_PATH").or_else(|| lookup("EVENTS_FILE"));

    let mut builder = builder
        .set_override_option("server.api_key", lookup("API_KEY"))
        .and_then(|b| b.set_override_option("privacy.salt", lookup("FEED_SALT")))
        .and_then(|b| b.set_override_option("storage.events_path", events_path))
        .and_then(|b| b.set_override_option("notifier.telegram_token", lookup("TELEGRAM_BOT_TOKEN")))
        .and_then(|b| b.set_override_option("notifier.telegram_chat_id", lookup("TELEGRAM_CHAT_ID")))
        .and_then(|b| {
            b.set_override_option("privacy.enabled", lookup("PRIVACY_MODE").map(|v| parse_flag(&v)))
        })
        .and_then(|b| {
            b.set_override_option("export.demo_fallback", lookup("DEMO_FALLBACK").map(|v| parse_flag(&v)))
        })
        .map_err(config_error)?;

    for (var, key) in [
        ("ROTATE_MAX_BYTES", "storage.rotate_max_bytes"),
        ("RETENTION_DAYS", "storage.retention_days"),
    ] {
        if let Some(raw) = lookup(var) {
            let value: i64 = raw.parse().map_err(|_| {
                FeedError::Config(format!("{} must be a non-negative integer, got {:?}", var, raw))
            })?;
            builder = builder.set_override(key, value).map_err(config_error)?;
        }
    }

    Ok(builder)
}

fn config_error(e: ::config::ConfigError) -> FeedError {
    FeedError::Config(e.to_string())
}
