//! Pipeline stages for itinerary generation.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the model backend can be swapped without
//! touching cleanup rules.
//!
//! ## Data Flow
//!
//! ```text
//! TripRequest ──▶ prompts ──▶ llm ──▶ postprocess ──▶ document
//!                 (text)     (fallback) (cleanup)     (blocks → pages → PDF)
//! ```
//!
//! 1. [`llm`]        : walk the candidate models; the only stage with
//!    network I/O
//! 2. [`postprocess`]: deterministic text-cleanup rules for model quirks
//!    (fences, preambles, tables, whitespace)

pub mod llm;
pub mod postprocess;
