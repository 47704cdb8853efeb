// src/config/ai.rs
use std::env;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// `None` disables AI titles entirely.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 100,
            timeout: Duration::from_secs(20),
        }
    }
}

impl AiConfig {
    /// Reads OPENAI_API_KEY / OPENAI_MODEL / OPENAI_BASE_URL from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(&|k: &str| env::var(k).ok())
    }

    /// Same as `from_env` over any lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut cfg = Self {
            api_key: non_blank("OPENAI_API_KEY"),
            ..Self::default()
        };
        if let Some(model) = non_blank("OPENAI_MODEL") {
            cfg.model = model;
        }
        if let Some(url) = non_blank("OPENAI_BASE_URL") {
            cfg.base_url = url;
        }
        cfg
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}
