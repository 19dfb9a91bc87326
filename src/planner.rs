//! Planner entry points: generate an itinerary, then render its document.
//!
//! ## Why a facade?
//!
//! The CLI and the web server both need the same sequence (prompt, fallback
//! walk, cleanup, render) and both must resolve the backend exactly once at
//! startup so a missing API key is reported before the first request.
//! [`TravelPlanner`] holds that resolved state; the free functions are
//! conveniences for one-shot library use.

use crate::config::PlannerConfig;
use crate::document::{render_itinerary_document, RenderedDocument};
use crate::error::{ConfigError, GenerationError, PlanError, RenderError};
use crate::output::{Itinerary, PlanOutput};
use crate::pipeline::llm::{self, ChatBackend, EdgequakeBackend, GenerationOptions, PromptPair};
use crate::prompts::{build_user_prompt, DEFAULT_SYSTEM_PROMPT};
use crate::request::{document_filename, TripRequest};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A configured planner with its backend resolved.
///
/// Cheap to share behind an `Arc`; nothing is mutated per request.
#[derive(Clone)]
pub struct TravelPlanner {
    config: PlannerConfig,
    backend: Arc<dyn ChatBackend>,
}

impl std::fmt::Debug for TravelPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TravelPlanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TravelPlanner {
    /// Resolve the backend and check credentials.
    ///
    /// # Errors
    /// [`ConfigError::MissingApiKey`] when no backend is supplied and the
    /// provider's key variable is unset or blank.
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        let backend = resolve_backend(&config)?;
        info!(
            "Planner ready: provider={}, candidates=[{}]",
            config.provider_name,
            config.models.join(", ")
        );
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Ask the candidate models for an itinerary and clean the reply.
    pub async fn generate_itinerary(
        &self,
        request: &TripRequest,
    ) -> Result<Itinerary, GenerationError> {
        let start = Instant::now();
        let config = &self.config;
        let progress = config.progress_callback.as_deref();
        info!(
            "Planning {} day(s) in {}",
            request.duration_days(),
            request.destination()
        );

        if let Some(cb) = progress {
            cb.on_generation_start(request.destination(), config.models.len());
        }

        let prompt = PromptPair {
            system: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            user: build_user_prompt(request),
        };
        let options = GenerationOptions {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let generated = llm::generate_with_fallback(
            self.backend.as_ref(),
            &config.models,
            &prompt,
            &options,
            Duration::from_secs(config.api_timeout_secs),
            progress,
        )
        .await;

        let generated = match generated {
            Ok(g) => g,
            Err(e) => {
                warn!("Generation failed: {}", e);
                if let Some(cb) = progress {
                    cb.on_generation_error(&e.to_string());
                }
                return Err(e);
            }
        };

        if let Some(cb) = progress {
            cb.on_generation_complete(&generated.model, generated.markdown.len());
        }

        Ok(Itinerary {
            markdown: generated.markdown,
            model: generated.model,
            attempts: generated.attempts,
            prompt_tokens: generated.reply.prompt_tokens,
            completion_tokens: generated.reply.completion_tokens,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Render an itinerary dated today.
    pub fn render(
        &self,
        request: &TripRequest,
        markdown: &str,
    ) -> Result<RenderedDocument, RenderError> {
        let today = chrono::Local::now().date_naive();
        render_itinerary_document(request, markdown, today, &self.config.styles)
    }

    /// Generate and render.
    ///
    /// A document failure does not discard the itinerary: it is returned in
    /// [`PlanOutput::document`] so the text can still be shown.
    pub async fn plan(&self, request: &TripRequest) -> Result<PlanOutput, GenerationError> {
        let itinerary = self.generate_itinerary(request).await?;
        let document = self.render(request, &itinerary.markdown);
        match &document {
            Ok(doc) => info!(
                "Rendered {} page(s), {} bytes",
                doc.page_count(),
                doc.bytes.len()
            ),
            Err(e) => warn!("Document rendering failed: {}", e),
        }
        Ok(PlanOutput {
            itinerary,
            document,
            filename: document_filename(request.destination()),
        })
    }

    /// Generate, render and write the PDF to `path`.
    ///
    /// Uses atomic write (temp file + rename) so a failed run never leaves a
    /// partial document behind.
    pub async fn plan_to_file(
        &self,
        request: &TripRequest,
        path: impl AsRef<Path>,
    ) -> Result<Itinerary, PlanError> {
        let output = self.plan(request).await?;
        let document = output.document?;
        write_document(path, &document.bytes).await?;
        Ok(output.itinerary)
    }
}

/// One-shot generation with a fresh planner.
pub async fn generate_itinerary(
    request: &TripRequest,
    config: &PlannerConfig,
) -> Result<Itinerary, GenerationError> {
    let planner = TravelPlanner::new(config.clone())?;
    planner.generate_itinerary(request).await
}

/// Synchronous wrapper around [`TravelPlanner::plan`].
///
/// Creates a temporary tokio runtime internally.
pub fn plan_sync(request: &TripRequest, config: &PlannerConfig) -> Result<PlanOutput, GenerationError> {
    let planner = TravelPlanner::new(config.clone())?;
    tokio::runtime::Runtime::new()
        .map_err(|e| {
            GenerationError::Configuration(format!("Failed to create tokio runtime: {}", e))
        })?
        .block_on(planner.plan(request))
}

/// Write document bytes atomically, creating parent directories.
pub async fn write_document(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), RenderError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| RenderError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Pick the backend: a pre-built one wins, otherwise an `edgequake-llm`
/// provider whose API key must be present.
pub fn resolve_backend(config: &PlannerConfig) -> Result<Arc<dyn ChatBackend>, ConfigError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    config.require_api_key()?;
    Ok(Arc::new(EdgequakeBackend::new(config.provider_name.clone())))
}
