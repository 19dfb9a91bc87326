//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::PlannerConfigBuilder::progress_callback`] to learn which
//! candidate model is being tried while the caller waits on the network.
//!
//! # Example
//!
//! ```rust
//! use travel_planner::{GenerationProgressCallback, PlannerConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     attempts: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_attempt_start(&self, model: &str, attempt: usize, total: usize) {
//!         self.attempts.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("trying {model} ({attempt}/{total})");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { attempts: AtomicUsize::new(0) });
//! let config = PlannerConfig::builder()
//!     .progress_callback(cb as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the planner as it walks the candidate model list.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before the first attempt.
    fn on_generation_start(&self, destination: &str, candidates: usize) {
        let _ = (destination, candidates);
    }

    /// Called just before a candidate model is asked.
    ///
    /// # Arguments
    /// * `model`  : candidate identifier
    /// * `attempt`: 1-indexed position in the candidate list
    /// * `total`  : number of candidates
    fn on_attempt_start(&self, model: &str, attempt: usize, total: usize) {
        let _ = (model, attempt, total);
    }

    /// Called when a candidate is skipped because it is unavailable.
    fn on_model_unavailable(&self, model: &str, detail: &str) {
        let _ = (model, detail);
    }

    /// Called when a candidate produced the itinerary.
    ///
    /// # Arguments
    /// * `markdown_len`: byte length of the produced text
    fn on_generation_complete(&self, model: &str, markdown_len: usize) {
        let _ = (model, markdown_len);
    }

    /// Called once when generation ends in a terminal error.
    fn on_generation_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PlannerConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
