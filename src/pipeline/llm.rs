//! Model interaction: the backend seam and the candidate fallback loop.
//!
//! This module turns a prompt pair into itinerary text. It stays thin:
//! all prompt wording lives in [`crate::prompts`] so it can change
//! without touching fallback or error-handling logic here.
//!
//! ## Fallback Strategy
//!
//! Candidates are tried strictly in order. Only a failure classified as
//! [`FailureKind::ModelUnavailable`] moves on to the next one; any other
//! failure (bad key, network, timeout, garbled reply) stops the request,
//! because retrying a different model would hit the same fault.

use crate::error::GenerationError;
use crate::output::{AttemptOutcome, AttemptRecord};
use crate::pipeline::postprocess;
use crate::progress::GenerationProgressCallback;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// System and user messages for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Sampling options forwarded to the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Text returned by a successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Coarse failure classes that decide whether fallback continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Not found, deprecated, no access, quota exhausted.
    ModelUnavailable,
    /// Credential rejected or missing.
    Auth,
    /// Network, timeout, or unrecognised provider failure.
    Transport,
    /// The provider answered with something unparseable.
    Malformed,
}

/// A failed call as reported by a [`ChatBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Build a failure whose kind is inferred from the provider message.
    pub fn classified(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            kind: classify_failure(&detail),
            detail,
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.detail)
    }
}

/// One chat-completion call against a named model.
///
/// The production implementation is [`EdgequakeBackend`]; tests plug in
/// scripted backends through [`crate::config::PlannerConfig::backend`].
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(
        &self,
        model: &str,
        prompt: &PromptPair,
        options: &GenerationOptions,
    ) -> Result<ChatReply, ProviderFailure>;
}

/// [`ChatBackend`] over `edgequake-llm` providers.
///
/// A provider is constructed per call because each candidate is a different
/// model; construction only reads the API key from the environment.
#[derive(Debug, Clone)]
pub struct EdgequakeBackend {
    provider_name: String,
}

impl EdgequakeBackend {
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}

#[async_trait]
impl ChatBackend for EdgequakeBackend {
    async fn chat(
        &self,
        model: &str,
        prompt: &PromptPair,
        options: &GenerationOptions,
    ) -> Result<ChatReply, ProviderFailure> {
        let provider = ProviderFactory::create_llm_provider(&self.provider_name, model)
            .map_err(|e| ProviderFailure::classified(format!("{e}")))?;

        let messages = vec![
            ChatMessage::system(prompt.system.as_str()),
            ChatMessage::user(prompt.user.as_str()),
        ];
        let completion = build_options(options);

        let response = provider
            .chat(&messages, Some(&completion))
            .await
            .map_err(|e| ProviderFailure::classified(format!("{e}")))?;

        Ok(ChatReply {
            content: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }
}

/// Build `CompletionOptions` from the generation options.
fn build_options(options: &GenerationOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(options.temperature),
        max_tokens: Some(options.max_tokens),
        ..Default::default()
    }
}

static RE_AUTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b401\b|invalid[_ ]api[_ ]key|incorrect api key|unauthori[sz]ed|authentication|api key (?:not found|not set|missing)",
    )
    .unwrap()
});

static RE_UNAVAILABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)model_not_found|does not exist|do(?:es)? not have access|no access to model|deprecat|decommission|insufficient_quota|exceeded your current quota|unsupported model|model .{0,60}not (?:found|available|supported)",
    )
    .unwrap()
});

static RE_MALFORMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)malformed|invalid json|deserializ|failed to parse|unexpected (?:eof|token|response)|missing field")
        .unwrap()
});

/// Map a provider error message to a [`FailureKind`].
///
/// Authentication markers win over availability markers, and anything
/// unrecognised is treated as a transport failure (terminal).
pub fn classify_failure(message: &str) -> FailureKind {
    if RE_AUTH.is_match(message) {
        FailureKind::Auth
    } else if RE_UNAVAILABLE.is_match(message) {
        FailureKind::ModelUnavailable
    } else if RE_MALFORMED.is_match(message) {
        FailureKind::Malformed
    } else {
        FailureKind::Transport
    }
}

/// Outcome of a successful fallback walk.
#[derive(Debug, Clone)]
pub struct Generated {
    pub reply: ChatReply,
    /// `reply.content` after [`postprocess::clean_itinerary`]; never blank.
    pub markdown: String,
    pub model: String,
    pub attempts: Vec<AttemptRecord>,
}

/// Try each candidate in order until one produces text.
///
/// Replies are cleaned before the emptiness check, so a reply that is only
/// fences or invisible characters counts as blank.
///
/// ## Termination
///
/// * non-blank reply → `Ok`, later candidates are never called
/// * unavailable → next candidate
/// * blank reply → next candidate; if nothing better follows, the request
///   ends with [`GenerationError::EmptyResponse`]
/// * any other failure → [`GenerationError::TransportOrAuth`] at once
/// * list exhausted → [`GenerationError::AllModelsUnavailable`]
pub async fn generate_with_fallback(
    backend: &dyn ChatBackend,
    models: &[String],
    prompt: &PromptPair,
    options: &GenerationOptions,
    timeout: Duration,
    progress: Option<&dyn GenerationProgressCallback>,
) -> Result<Generated, GenerationError> {
    let total = models.len();
    let mut attempts = Vec::with_capacity(total);
    let mut empty_models = Vec::new();
    let mut last_error: Option<String> = None;

    for (idx, model) in models.iter().enumerate() {
        if let Some(cb) = progress {
            cb.on_attempt_start(model, idx + 1, total);
        }
        debug!("Attempt {}/{}: model {}", idx + 1, total, model);

        let start = Instant::now();
        let result = match tokio::time::timeout(timeout, backend.chat(model, prompt, options)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderFailure::new(
                FailureKind::Transport,
                format!("timed out after {}s", timeout.as_secs_f32()),
            )),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = result.map(|reply| {
            let markdown = postprocess::clean_itinerary(&reply.content);
            (reply, markdown)
        });

        match result {
            Ok((_, markdown)) if markdown.trim().is_empty() => {
                warn!("Model {} returned an empty reply; trying next candidate", model);
                attempts.push(AttemptRecord {
                    model: model.clone(),
                    outcome: AttemptOutcome::Empty,
                    duration_ms,
                });
                empty_models.push(model.clone());
            }
            Ok((reply, markdown)) => {
                info!(
                    "Model {} answered: {} prompt tokens, {} completion tokens, {}ms",
                    model, reply.prompt_tokens, reply.completion_tokens, duration_ms
                );
                attempts.push(AttemptRecord {
                    model: model.clone(),
                    outcome: AttemptOutcome::Success,
                    duration_ms,
                });
                return Ok(Generated {
                    reply,
                    markdown,
                    model: model.clone(),
                    attempts,
                });
            }
            Err(failure) if failure.kind == FailureKind::ModelUnavailable => {
                let err = GenerationError::ModelUnavailable {
                    model: model.clone(),
                    detail: failure.detail.clone(),
                };
                warn!("{}; trying next candidate", err);
                if let Some(cb) = progress {
                    cb.on_model_unavailable(model, &failure.detail);
                }
                attempts.push(AttemptRecord {
                    model: model.clone(),
                    outcome: AttemptOutcome::Unavailable {
                        detail: failure.detail.clone(),
                    },
                    duration_ms,
                });
                last_error = Some(failure.detail);
            }
            Err(failure) => {
                warn!("Model {} failed ({:?}); not trying fallbacks", model, failure.kind);
                return Err(GenerationError::TransportOrAuth {
                    model: model.clone(),
                    detail: failure.detail,
                });
            }
        }
    }

    if !empty_models.is_empty() {
        return Err(GenerationError::EmptyResponse {
            models: empty_models,
        });
    }

    Err(GenerationError::AllModelsUnavailable {
        tried: models.to_vec(),
        last_error: last_error.unwrap_or_else(|| "no candidate models configured".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replies per model; models without an entry are "not found".
    struct ScriptedBackend {
        replies: HashMap<String, Result<ChatReply, ProviderFailure>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<(&str, Result<&str, ProviderFailure>)>) -> Self {
            let replies = script
                .into_iter()
                .map(|(m, r)| {
                    let r = r.map(|text| ChatReply {
                        content: text.to_string(),
                        prompt_tokens: 10,
                        completion_tokens: 20,
                    });
                    (m.to_string(), r)
                })
                .collect();
            Self {
                replies,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(
            &self,
            model: &str,
            _prompt: &PromptPair,
            _options: &GenerationOptions,
        ) -> Result<ChatReply, ProviderFailure> {
            self.calls.lock().unwrap().push(model.to_string());
            self.replies.get(model).cloned().unwrap_or_else(|| {
                Err(ProviderFailure::new(
                    FailureKind::ModelUnavailable,
                    "model_not_found",
                ))
            })
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl ChatBackend for SlowBackend {
        async fn chat(
            &self,
            _model: &str,
            _prompt: &PromptPair,
            _options: &GenerationOptions,
        ) -> Result<ChatReply, ProviderFailure> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ChatReply::default())
        }
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|m| m.to_string()).collect()
    }

    fn prompt() -> PromptPair {
        PromptPair {
            system: "system".into(),
            user: "user".into(),
        }
    }

    const OPTS: GenerationOptions = GenerationOptions {
        temperature: 0.7,
        max_tokens: 2500,
    };

    async fn run(backend: &dyn ChatBackend, names: &[&str]) -> Result<Generated, GenerationError> {
        generate_with_fallback(
            backend,
            &models(names),
            &prompt(),
            &OPTS,
            Duration::from_secs(5),
            None,
        )
        .await
    }

    fn unavailable(detail: &str) -> Result<&'static str, ProviderFailure> {
        Err(ProviderFailure::new(FailureKind::ModelUnavailable, detail))
    }

    #[tokio::test]
    async fn first_success_wins() {
        let backend = ScriptedBackend::new(vec![("a", Ok("# Plan")), ("b", Ok("# Other"))]);
        let out = run(&backend, &["a", "b"]).await.unwrap();
        assert_eq!(out.model, "a");
        assert_eq!(out.reply.content, "# Plan");
        assert_eq!(backend.calls(), vec!["a"]);
    }

    #[tokio::test]
    async fn unavailable_falls_through_and_stops_at_success() {
        let backend = ScriptedBackend::new(vec![
            ("a", unavailable("deprecated")),
            ("b", Ok("# From b")),
            ("c", Ok("# From c")),
        ]);
        let out = run(&backend, &["a", "b", "c"]).await.unwrap();
        assert_eq!(out.reply.content, "# From b");
        assert_eq!(backend.calls(), vec!["a", "b"]);
        assert_eq!(out.attempts.len(), 2);
        assert!(matches!(
            out.attempts[0].outcome,
            AttemptOutcome::Unavailable { .. }
        ));
        assert_eq!(out.attempts[1].outcome, AttemptOutcome::Success);
    }

    #[tokio::test]
    async fn auth_failure_short_circuits() {
        let backend = ScriptedBackend::new(vec![
            (
                "a",
                Err(ProviderFailure::new(FailureKind::Auth, "401 invalid api key")),
            ),
            ("b", Ok("# never")),
        ]);
        let err = run(&backend, &["a", "b"]).await.unwrap_err();
        assert!(
            matches!(err, GenerationError::TransportOrAuth { ref model, .. } if model == "a"),
            "got {err:?}"
        );
        assert_eq!(backend.calls(), vec!["a"]);
    }

    #[tokio::test]
    async fn transport_failure_after_fallback_still_terminal() {
        let backend = ScriptedBackend::new(vec![
            ("a", unavailable("model_not_found")),
            (
                "b",
                Err(ProviderFailure::new(FailureKind::Transport, "connection reset")),
            ),
            ("c", Ok("# never")),
        ]);
        let err = run(&backend, &["a", "b", "c"]).await.unwrap_err();
        assert!(matches!(err, GenerationError::TransportOrAuth { ref model, .. } if model == "b"));
        assert_eq!(backend.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn exhaustion_reports_all_candidates() {
        let backend = ScriptedBackend::new(vec![]);
        let err = run(&backend, &["a", "b", "c"]).await.unwrap_err();
        match err {
            GenerationError::AllModelsUnavailable { tried, last_error } => {
                assert_eq!(tried, vec!["a", "b", "c"]);
                assert_eq!(last_error, "model_not_found");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test]
    async fn blank_reply_is_never_a_success() {
        let backend = ScriptedBackend::new(vec![("a", Ok("  \n\t ")), ("b", unavailable("quota"))]);
        let err = run(&backend, &["a", "b"]).await.unwrap_err();
        assert!(
            matches!(err, GenerationError::EmptyResponse { ref models } if models == &vec!["a".to_string()])
        );
    }

    #[tokio::test]
    async fn blank_reply_then_success_uses_next_candidate() {
        let backend = ScriptedBackend::new(vec![("a", Ok("")), ("b", Ok("# Plan"))]);
        let out = run(&backend, &["a", "b"]).await.unwrap();
        assert_eq!(out.model, "b");
        assert_eq!(out.attempts[0].outcome, AttemptOutcome::Empty);
    }

    #[tokio::test]
    async fn timeout_is_terminal() {
        let err = generate_with_fallback(
            &SlowBackend,
            &models(&["a", "b"]),
            &prompt(),
            &OPTS,
            Duration::from_millis(20),
            None,
        )
        .await
        .unwrap_err();
        match err {
            GenerationError::TransportOrAuth { model, detail } => {
                assert_eq!(model, "a");
                assert!(detail.contains("timed out"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classify_openai_messages() {
        assert_eq!(
            classify_failure("The model `gpt-4` does not exist or you do not have access to it."),
            FailureKind::ModelUnavailable
        );
        assert_eq!(
            classify_failure("Error code: 404 - model_not_found"),
            FailureKind::ModelUnavailable
        );
        assert_eq!(
            classify_failure("The model gpt-3.5-turbo-0301 has been deprecated"),
            FailureKind::ModelUnavailable
        );
        assert_eq!(
            classify_failure("You exceeded your current quota, please check your plan"),
            FailureKind::ModelUnavailable
        );
    }

    #[test]
    fn classify_auth_beats_availability() {
        assert_eq!(
            classify_failure("401 Unauthorized: Incorrect API key provided"),
            FailureKind::Auth
        );
        assert_eq!(
            classify_failure("invalid_api_key: model does not exist"),
            FailureKind::Auth
        );
    }

    #[tokio::test]
    async fn reply_blank_after_cleanup_is_empty() {
        let backend = ScriptedBackend::new(vec![
            ("a", Ok("\u{200B}")),
            ("b", Ok("```markdown\n\n```")),
            ("c", Ok("\u{FEFF}\u{200B}\n")),
        ]);
        let err = run(&backend, &["a", "b", "c"]).await.unwrap_err();
        match err {
            GenerationError::EmptyResponse { models } => assert_eq!(models, vec!["a", "b", "c"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(backend.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn success_carries_cleaned_markdown() {
        let backend = ScriptedBackend::new(vec![("a", Ok("```md\n## Trip Overview\n```"))]);
        let out = run(&backend, &["a"]).await.unwrap();
        assert_eq!(out.markdown, "## Trip Overview\n");
    }

    #[test]
    fn bare_404_is_not_model_unavailability() {
        assert_eq!(
            classify_failure("HTTP status client error (404 Not Found) for url https://proxy.local/v1/chat"),
            FailureKind::Transport
        );
    }

    #[test]
    fn classify_other_failures() {
        assert_eq!(
            classify_failure("failed to parse response body: expected value"),
            FailureKind::Malformed
        );
        assert_eq!(
            classify_failure("error sending request: connection refused"),
            FailureKind::Transport
        );
    }

    #[test]
    fn build_options_forwards_values() {
        let opts = build_options(&OPTS);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(2500));
    }
}
