use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "CATALOG_ENV";
const CONFIG_DIR_ENV: &str = "CATALOG_CONFIG_DIR";
const ENV_PREFIX: &str = "CATALOG";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub scraper: ScraperSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay and
    /// `CATALOG__*` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load from an explicit config directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed_environment;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        5000
    }

    fn default_request_timeout_ms() -> u64 {
        // covers an on-demand crawl
        120_000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Scraper schedule, fetch behaviour and the configured sources.
///
/// Raw strings only; the ingest layer compiles them at startup and refuses to
/// boot on bad input.
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    #[serde(default = "ScraperSettings::default_schedule_enabled")]
    pub schedule_enabled: bool,
    /// Daily run time, `HH:MM` in UTC.
    #[serde(default = "ScraperSettings::default_daily_at")]
    pub daily_at: String,
    #[serde(default = "ScraperSettings::default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "ScraperSettings::default_user_agent")]
    pub user_agent: String,
    /// Replaces the stock topical keyword list when present.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub sources: Vec<SourceSettings>,
}

impl ScraperSettings {
    fn default_schedule_enabled() -> bool {
        true
    }

    fn default_daily_at() -> String {
        "03:00".to_string()
    }

    fn default_fetch_timeout_ms() -> u64 {
        30_000
    }

    fn default_user_agent() -> String {
        concat!("catalog-scraper/", env!("CARGO_PKG_VERSION")).to_string()
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            schedule_enabled: Self::default_schedule_enabled(),
            daily_at: Self::default_daily_at(),
            fetch_timeout_ms: Self::default_fetch_timeout_ms(),
            user_agent: Self::default_user_agent(),
            keywords: None,
            sources: Vec::new(),
        }
    }
}

/// One site to scrape: its listing URL, the publisher label stamped on every
/// entry and the CSS selectors locating each field.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SourceSettings {
    pub name: String,
    pub url: String,
    pub locators: LocatorSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LocatorSettings {
    pub entry: String,
    pub title: String,
    pub author: String,
    pub blurb: String,
    pub cover: String,
    pub date: String,
}
