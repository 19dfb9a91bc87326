//! Configuration types for itinerary generation.
//!
//! All generation behaviour is controlled through [`PlannerConfig`], built
//! via its [`PlannerConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share a config between the CLI and the web handlers, and to
//! log exactly which models a run was allowed to try.

use crate::document::DocumentStyles;
use crate::error::ConfigError;
use crate::pipeline::llm::ChatBackend;
use crate::progress::GenerationProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Candidate models, most capable first.
///
/// Later entries are only tried when an earlier one is reported unavailable
/// (deprecated, no access, quota exhausted).
pub const DEFAULT_MODELS: [&str; 3] = ["gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"];

/// Default `edgequake-llm` provider name.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Configuration for itinerary generation and rendering.
///
/// Built via [`PlannerConfig::builder()`] or using
/// [`PlannerConfig::default()`].
///
/// # Example
/// ```rust
/// use travel_planner::PlannerConfig;
///
/// let config = PlannerConfig::builder()
///     .models(["gpt-4o", "gpt-4o-mini"])
///     .max_tokens(3000)
///     .build()
///     .unwrap();
/// assert_eq!(config.models.len(), 2);
/// ```
#[derive(Clone)]
pub struct PlannerConfig {
    /// Ordered candidate model identifiers. Must not be empty.
    pub models: Vec<String>,

    /// LLM provider name passed to `edgequake_llm::ProviderFactory`.
    pub provider_name: String,

    /// Pre-constructed backend. Takes precedence over `provider_name`.
    pub backend: Option<Arc<dyn ChatBackend>>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Itineraries benefit from some variety; values near 0 produce the same
    /// landmarks for every request.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2500.
    ///
    /// A week-long itinerary with five sections runs to roughly 1 500–2 000
    /// tokens; lower values truncate the logistics section.
    pub max_tokens: usize,

    /// Per-attempt timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Page geometry and font sizes for the PDF.
    pub styles: DocumentStyles,

    /// Optional progress events.
    pub progress_callback: Option<Arc<dyn GenerationProgressCallback>>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            provider_name: DEFAULT_PROVIDER.to_string(),
            backend: None,
            temperature: 0.7,
            max_tokens: 2500,
            api_timeout_secs: 120,
            system_prompt: None,
            styles: DocumentStyles::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("models", &self.models)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ChatBackend>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("styles", &self.styles)
            .finish()
    }
}

impl PlannerConfig {
    /// Create a new builder for `PlannerConfig`.
    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The environment variable the provider reads its key from.
    ///
    /// `edgequake-llm` providers only look at their own variable, so this is
    /// derived from `provider_name` and cannot be overridden.
    pub fn api_key_var(&self) -> &'static str {
        api_key_var_for(&self.provider_name)
    }

    /// Check that the provider credential is present.
    ///
    /// Not needed when a pre-built `backend` is configured, nor for the
    /// keyless local providers.
    pub fn require_api_key(&self) -> Result<(), ConfigError> {
        if self.backend.is_some() || is_keyless(&self.provider_name) {
            return Ok(());
        }
        require_api_key(self.api_key_var())
    }
}

/// Fail unless `var` is set to a non-blank value.
pub fn require_api_key(var: &str) -> Result<(), ConfigError> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingApiKey {
            var: var.to_string(),
        }),
    }
}

/// API key variable conventionally read by each `edgequake-llm` provider.
pub fn api_key_var_for(provider: &str) -> &'static str {
    match provider.to_ascii_lowercase().as_str() {
        "anthropic" => "ANTHROPIC_API_KEY",
        "gemini" | "google" => "GEMINI_API_KEY",
        "mistral" => "MISTRAL_API_KEY",
        "openrouter" => "OPENROUTER_API_KEY",
        "azure" => "AZURE_OPENAI_API_KEY",
        _ => "OPENAI_API_KEY",
    }
}

fn is_keyless(provider: &str) -> bool {
    matches!(
        provider.to_ascii_lowercase().as_str(),
        "ollama" | "lmstudio" | "mock"
    )
}

/// Builder for [`PlannerConfig`].
#[derive(Debug)]
pub struct PlannerConfigBuilder {
    config: PlannerConfig,
}

impl PlannerConfigBuilder {
    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.models = models
            .into_iter()
            .map(|m| {
                let m: String = m.into();
                m.trim().to_string()
            })
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn styles(mut self, styles: DocumentStyles) -> Self {
        self.config.styles = styles;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn GenerationProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PlannerConfig, ConfigError> {
        let c = &self.config;
        if c.models.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "At least one candidate model is required".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        c.styles.validate()?;
        Ok(self.config)
    }
}
