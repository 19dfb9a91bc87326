//! # travel-planner
//!
//! Generate personalised, day-by-day travel itineraries with a language model
//! and deliver them as paginated PDF documents.
//!
//! ## Why this crate?
//!
//! A traveler's hard constraints (wheelchair access, no long walks, dietary
//! limits) have to hold on *every* day of a plan, not just in a footnote.
//! This crate sends the trip details together with those guardrails to a
//! chat model, walks an ordered list of fallback models when one is not
//! available to the account, and turns the Markdown reply into a document
//! the traveler can print or keep offline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! TripRequest
//!  │
//!  ├─ 1. Prompt    role + five-section contract, trip details verbatim
//!  ├─ 2. Generate  gpt-4o → gpt-4-turbo → gpt-3.5-turbo (on unavailability)
//!  ├─ 3. Polish    strip fences/preamble, flatten tables, tidy whitespace
//!  ├─ 4. Layout    headings, bullets, bold spans → wrapped, paginated lines
//!  └─ 5. Output    itinerary text + PDF bytes ("Page N of M" footers)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use travel_planner::{PlannerConfig, TravelPlanner, TripRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY from the environment
//!     let planner = TravelPlanner::new(PlannerConfig::default())?;
//!     let request = TripRequest::new("Kyoto", 3, "temples, tea", "wheelchair accessible")?;
//!     let output = planner.plan(&request).await?;
//!     println!("{}", output.itinerary.markdown);
//!     std::fs::write(&output.filename, output.document?.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! Rendering needs no model at all:
//!
//! ```rust
//! use travel_planner::{render_document, DocumentStyles};
//!
//! let doc = render_document("# Day 1: Arrival\n- **Check in** early", &DocumentStyles::default()).unwrap();
//! assert_eq!(doc.page_count(), 1);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `travel-planner` binary (clap + anyhow + tracing-subscriber) |
//! | `web`   | on      | Enables [`web`], the axum form server behind `travel-planner serve` |
//!
//! Disable both when using only the library:
//! ```toml
//! travel-planner = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod planner;
pub mod progress;
pub mod prompts;
pub mod request;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PlannerConfig, PlannerConfigBuilder, DEFAULT_MODELS, DEFAULT_PROVIDER};
pub use document::{
    markdown_to_html, render_document, render_itinerary_document, DocumentStyles,
    RenderedDocument,
};
pub use error::{ConfigError, GenerationError, PlanError, RenderError, RequestError};
pub use output::{AttemptOutcome, AttemptRecord, Itinerary, PlanOutput};
pub use pipeline::llm::{
    ChatBackend, ChatReply, EdgequakeBackend, FailureKind, GenerationOptions, PromptPair,
    ProviderFailure,
};
pub use planner::{generate_itinerary, plan_sync, write_document, TravelPlanner};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::{document_filename, parse_duration, TripRequest};
