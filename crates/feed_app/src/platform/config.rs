use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use feed_core::{DEFAULT_COMMENT_LIMIT, DEFAULT_PAGE_LIMIT};
use feed_engine::{ApiSettings, Session, DEFAULT_API_BASE_URL, DEFAULT_BACKEND_URL};
use feed_logging::feed_info;
use log::LevelFilter;
use serde::Deserialize;

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "feed_client.ron";

/// Settings read from `feed_client.ron`; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub backend_url: String,
    pub page_limit: u32,
    pub comment_limit: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_destination: LogDestination,
    pub verbose: bool,
    pub token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            comment_limit: DEFAULT_COMMENT_LIMIT,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            log_destination: LogDestination::File,
            verbose: false,
            token: None,
        }
    }
}

impl AppConfig {
    /// Loads the given file, or `feed_client.ron` when present, then applies env overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("parsing {}", path.display()))?;
        feed_info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("FEED_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = lookup("FEED_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(token) = lookup("FEED_TOKEN") {
            self.token = Some(token);
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.page_limit == 0 || self.comment_limit == 0 {
            bail!("page_limit and comment_limit must be at least 1");
        }
        Ok(())
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_base_url.clone(),
            backend_url: self.backend_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn session(&self) -> Session {
        match &self.token {
            Some(token) => Session::bearer(token.as_str()),
            None => Session::anonymous(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
