use std::path::PathBuf;

use anyhow::{Context, Result};
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://www.camphub.in.th/";
const DEFAULT_SITE_DOMAIN: &str = "camphub.in.th";
const DEFAULT_SEEN_PATH: &str = "seen_contests.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings: defaults, then `camphub.toml`, then `CAMPHUB_*` env vars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub site_domain: String,
    pub seen_path: PathBuf,
    pub timeout_secs: u64,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        defaults()?
            .add_source(File::with_name("camphub").required(false))
            .add_source(Environment::with_prefix("CAMPHUB"))
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("base_url", DEFAULT_BASE_URL)?
        .set_default("site_domain", DEFAULT_SITE_DOMAIN)?
        .set_default("seen_path", DEFAULT_SEEN_PATH)?
        .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_domain: DEFAULT_SITE_DOMAIN.to_string(),
            seen_path: PathBuf::from(DEFAULT_SEEN_PATH),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            webhook_url: None,
        }
    }
}

// ── Tests ──
