//! Error types for the travel-planner library.
//!
//! Failures fall into four groups that surface at different moments:
//!
//! * [`ConfigError`]: **Startup**: the provider credential is missing or the
//!   configuration is inconsistent. Raised before any request is accepted.
//!
//! * [`RequestError`]: **Input**: the submitted form cannot become a
//!   [`crate::request::TripRequest`]. No generation is attempted.
//!
//! * [`GenerationError`]: **Per request**: the model service could not
//!   produce an itinerary. Terminal for that request only.
//!
//! * [`RenderError`]: **Per document**: the PDF could not be built or
//!   written. The itinerary text is still shown to the user.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The provider API key is absent or blank.
    #[error(
        "API key not found: set {var} in the environment or in a .env file.\n\
No itinerary can be generated without it."
    )]
    MissingApiKey { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The submitted trip details are incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Please provide a destination.")]
    MissingDestination,

    /// Duration is missing, zero, or not a number.
    #[error("Number of days must be a whole number of at least 1 (got '{input}')")]
    InvalidDuration { input: String },
}

/// Errors raised while asking the model service for an itinerary.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The candidate model is not available to this account (not found,
    /// deprecated, no access, quota exhausted).
    ///
    /// Triggers fallback to the next candidate; only recorded in
    /// [`crate::output::AttemptRecord`] unless every candidate fails.
    #[error("Model '{model}' is unavailable: {detail}")]
    ModelUnavailable { model: String, detail: String },

    /// Every candidate reported unavailability.
    #[error(
        "No model could generate the itinerary (tried {}).\nLast error: {last_error}\n\
Please try again in a few minutes.",
        .tried.join(", ")
    )]
    AllModelsUnavailable {
        tried: Vec<String>,
        last_error: String,
    },

    /// Authentication, network, timeout, or malformed-response failure.
    /// Not model-specific, so no fallback is attempted.
    #[error("Request to model '{model}' failed: {detail}")]
    TransportOrAuth { model: String, detail: String },

    /// The service answered successfully but with no usable text.
    #[error("The model returned an empty itinerary ({}).", .models.join(", "))]
    EmptyResponse { models: Vec<String> },

    /// The generation backend could not be resolved.
    #[error("{0}")]
    Configuration(String),
}

impl From<ConfigError> for GenerationError {
    fn from(e: ConfigError) -> Self {
        GenerationError::Configuration(e.to_string())
    }
}

/// Errors raised while producing the downloadable document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The PDF writer rejected the document.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a full plan-and-save run.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
