//! AI adapter: language-model abstraction for issue titles.
//! Concrete providers: OpenAI chat completions, a disabled stub, and a fixed mock.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ai::AiConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that creates concise, actionable project titles for defense contracting opportunities.";

/// Trait object used by the title generator (and tests).
pub trait TitleModel: Send + Sync {
    /// Send one user prompt and return the raw completion text.
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
    /// `false` means callers should go straight to their fallback.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Convenient alias used by callers.
pub type DynTitleModel = Arc<dyn TitleModel>;

/// Factory: build a model according to config.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock.
/// * Else if no API key is configured, returns a disabled model.
/// * Else builds the OpenAI provider.
pub fn build_title_model(config: &AiConfig) -> Result<DynTitleModel> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockProvider {
            fixed: "Review Sources Sought Notice (mock)".to_string(),
        }));
    }

    match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(Arc::new(OpenAiProvider::new(config, key)?)),
        _ => Ok(Arc::new(DisabledClient)),
    }
}

// ------------------------------------------------------------
// Concrete providers
// ------------------------------------------------------------

/// OpenAI provider (Chat Completions API).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(config: &AiConfig, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sam-opportunity-monitor/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(config.timeout)
            .build()
            .context("building openai http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

impl TitleModel for OpenAiProvider {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    Msg {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };

            let resp = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .context("openai request")?;

            let status = resp.status();
            if !status.is_success() {
                bail!("openai returned {status}");
            }
            let body: Resp = resp.json().await.context("openai response json")?;
            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| anyhow!("openai response had no choices"))
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Always fails; used when no API key is configured.
pub struct DisabledClient;

impl TitleModel for DisabledClient {
    fn complete<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async { Err(anyhow!("title model disabled")) })
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Simple mock provider for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl TitleModel for MockProvider {
    fn complete<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
