// src/config/monitor.rs
use std::collections::BTreeSet;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::config::ai::AiConfig;
use crate::ingest::providers::sam_gov::SamGovSettings;
use crate::notify::linear::{LinearSettings, DEFAULT_LINEAR_API_URL};

pub const DEFAULT_MONITOR_CONFIG_PATH: &str = "config/monitor.toml";
pub const ENV_MONITOR_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

fn default_naics_codes() -> Vec<String> {
    vec!["332992".to_string()]
}
fn default_notice_types() -> Vec<String> {
    ["Sources Sought", "Request for Information", "RFI", "Sources Sought Synopsis"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_scan_interval_minutes() -> u64 {
    60
}
fn default_lookback_days() -> u32 {
    90
}
fn default_page_size() -> u32 {
    1000
}
fn default_notice_ptype() -> String {
    "r".to_string()
}
fn default_http_timeout_secs() -> u64 {
    30
}
fn default_issue_priority() -> u8 {
    crate::notify::DEFAULT_PRIORITY
}

/// Operational parameters, normally from `config/monitor.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Operational {
    #[serde(default = "default_naics_codes")]
    pub naics_codes: Vec<String>,
    #[serde(default = "default_notice_types")]
    pub notice_types: Vec<String>,
    #[serde(default = "default_scan_interval_minutes")]
    pub scan_interval_minutes: u64,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_notice_ptype")]
    pub notice_ptype: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_issue_priority")]
    pub issue_priority: u8,
}

impl Default for Operational {
    fn default() -> Self {
        Self {
            naics_codes: default_naics_codes(),
            notice_types: default_notice_types(),
            scan_interval_minutes: default_scan_interval_minutes(),
            lookback_days: default_lookback_days(),
            page_size: default_page_size(),
            notice_ptype: default_notice_ptype(),
            http_timeout_secs: default_http_timeout_secs(),
            issue_priority: default_issue_priority(),
        }
    }
}

impl Operational {
    pub fn parse(s: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an explicit path (must exist).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// $MONITOR_CONFIG_PATH (must exist), else `config/monitor.toml` if present, else defaults.
    pub fn load_default<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = lookup(ENV_MONITOR_CONFIG_PATH) {
            return Self::load_from(Path::new(&p));
        }
        let default = Path::new(DEFAULT_MONITOR_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(default);
        }
        Ok(Self::default())
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MONITOR_NAICS_CODES") {
            self.naics_codes = split_list(&v);
        }
        if let Some(v) = lookup("MONITOR_NOTICE_TYPES") {
            self.notice_types = split_list(&v);
        }
        if let Some(v) = lookup("MONITOR_SCAN_INTERVAL_MINUTES") {
            self.scan_interval_minutes = parse_num("MONITOR_SCAN_INTERVAL_MINUTES", &v)?;
        }
        if let Some(v) = lookup("MONITOR_LOOKBACK_DAYS") {
            self.lookback_days = parse_num("MONITOR_LOOKBACK_DAYS", &v)?;
        }
        Ok(())
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        self.naics_codes = clean_list(self.naics_codes);
        self.notice_types = clean_list(self.notice_types);
        if self.naics_codes.is_empty() {
            return Err(invalid("naics_codes", "at least one code is required"));
        }
        if self.notice_types.is_empty() {
            return Err(invalid("notice_types", "at least one notice type is required"));
        }
        if self.scan_interval_minutes == 0 {
            return Err(invalid("scan_interval_minutes", "must be greater than zero"));
        }
        if self.scan_interval_minutes.checked_mul(60).is_none() {
            return Err(invalid("scan_interval_minutes", "too large to express in seconds"));
        }
        if self.issue_priority > 4 {
            return Err(invalid("issue_priority", "must be between 0 and 4"));
        }
        if self.page_size == 0 {
            return Err(invalid("page_size", "must be greater than zero"));
        }
        Ok(self)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_minutes.saturating_mul(60))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, v: &str) -> Result<T, ConfigError> {
    v.trim()
        .parse()
        .map_err(|_| invalid(key, &format!("{v:?} is not a number")))
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(str::to_string).collect()
}

/// Trim, drop blanks, dedup; first occurrence keeps its position.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// Everything the monitor needs at startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub operational: Operational,
    pub sam: SamGovSettings,
    pub linear: LinearSettings,
    pub ai: AiConfig,
    pub metrics_addr: Option<SocketAddr>,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        let require = |primary: &'static str, alias: Option<&str>| {
            get(primary)
                .or_else(|| alias.and_then(|a| get(a)))
                .ok_or(ConfigError::Missing(primary))
        };

        let sam_api_key = require("SAM_API_KEY", Some("API_KEY"))?;
        let sam_api_url = require("SAM_API_URL", Some("API_URL"))?;
        let linear_api_key = require("LINEAR_API_KEY", None)?;
        let linear_team_id = require("LINEAR_TEAM_ID", None)?;

        let mut operational = Operational::load_default(&get)?;
        operational.apply_env(&get)?;
        let operational = operational.validate()?;

        let metrics_addr = match get("METRICS_ADDR") {
            Some(v) => Some(v.trim().parse().map_err(|_| {
                invalid("METRICS_ADDR", &format!("{v:?} is not a socket address"))
            })?),
            None => None,
        };

        let ai = AiConfig::from_lookup(&get);

        Ok(Self {
            sam: SamGovSettings {
                base_url: sam_api_url,
                api_key: sam_api_key,
                page_size: operational.page_size,
                ptype: operational.notice_ptype.clone(),
                timeout: operational.http_timeout(),
            },
            linear: LinearSettings {
                api_url: get("LINEAR_API_URL").unwrap_or_else(|| DEFAULT_LINEAR_API_URL.to_string()),
                api_key: linear_api_key,
                team_id: linear_team_id,
                priority: operational.issue_priority,
                timeout: operational.http_timeout(),
            },
            ai,
            metrics_addr,
            operational,
        })
    }
}
