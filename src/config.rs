use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils;

pub const DEFAULT_ENDPOINT: &str = "https://connpass.com/api/v1/event/";

const ENV_ENDPOINT: &str = "EVENT_SEARCH_ENDPOINT";
const ENV_TIMEOUT_SECS: &str = "EVENT_SEARCH_TIMEOUT_SECS";
const ENV_USER_AGENT: &str = "EVENT_SEARCH_USER_AGENT";
const ENV_REQUIRE_SUCCESS: &str = "EVENT_SEARCH_REQUIRE_SUCCESS";
const ENV_DATABASE: &str = "EVENT_SEARCH_DATABASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the event search API.
    pub endpoint: String,
    /// Transport deadline. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Reject non-2xx responses instead of decoding whatever body came back.
    pub require_success_status: bool,
    pub database_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
            user_agent: None,
            require_success_status: false,
            database_path: None,
        }
    }
}

impl SearchConfig {
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|s| !s.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|s| s.trim().parse::<u64>().ok()) {
            self.timeout_secs = Some(secs);
        }
        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|s| !s.trim().is_empty()) {
            self.user_agent = Some(agent);
        }
        if let Some(flag) = lookup(ENV_REQUIRE_SUCCESS).and_then(|s| parse_flag(&s)) {
            self.require_success_status = flag;
        }
        if let Some(path) = lookup(ENV_DATABASE).filter(|s| !s.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(utils::database_path)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: Mutex<SearchConfig>,
}

impl ConfigStore {
    pub fn load() -> Self {
        Self::load_from(utils::config_path())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let data = match read_config(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("ignoring unreadable config {:?}: {err}", path);
                SearchConfig::default()
            }
        };
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored configuration, without environment overrides.
    pub fn read(&self) -> SearchConfig {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Stored configuration with `EVENT_SEARCH_*` overrides applied.
    pub fn effective(&self) -> SearchConfig {
        self.read().with_env_overrides()
    }

    pub fn update<F>(&self, transform: F) -> Result<SearchConfig, ConfigError>
    where
        F: FnOnce(&mut SearchConfig),
    {
        let mut guard = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = guard.clone();
        transform(&mut next);
        write_config(&self.path, &next)?;
        *guard = next;
        Ok(guard.clone())
    }
}

fn read_config(path: &Path) -> Result<SearchConfig, ConfigError> {
    if !path.exists() {
        return Ok(SearchConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_config(path: &Path, config: &SearchConfig) -> Result<(), ConfigError> {
    utils::ensure_parent(path);
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}
