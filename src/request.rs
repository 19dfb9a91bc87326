//! Trip request: the validated form input consumed by one generation.

use crate::error::RequestError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What the traveler asked for.
///
/// Built through [`TripRequest::new`] or [`TripRequest::from_form`] so that
/// every instance has a non-empty destination and at least one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    destination: String,
    duration_days: u32,
    interests: String,
    guardrails: String,
}

impl TripRequest {
    /// Validate and build a request. Free-text fields are trimmed.
    pub fn new(
        destination: impl AsRef<str>,
        duration_days: u32,
        interests: impl AsRef<str>,
        guardrails: impl AsRef<str>,
    ) -> Result<Self, RequestError> {
        let destination = destination.as_ref().trim();
        if destination.is_empty() {
            return Err(RequestError::MissingDestination);
        }
        if duration_days == 0 {
            return Err(RequestError::InvalidDuration {
                input: duration_days.to_string(),
            });
        }
        Ok(Self {
            destination: destination.to_string(),
            duration_days,
            interests: interests.as_ref().trim().to_string(),
            guardrails: guardrails.as_ref().trim().to_string(),
        })
    }

    /// Build a request from raw form strings, where the duration is free
    /// text such as `"5"` or `"5 days"`.
    pub fn from_form(
        destination: &str,
        duration: &str,
        interests: &str,
        guardrails: &str,
    ) -> Result<Self, RequestError> {
        if destination.trim().is_empty() {
            return Err(RequestError::MissingDestination);
        }
        let days = parse_duration(duration).ok_or_else(|| RequestError::InvalidDuration {
            input: duration.trim().to_string(),
        })?;
        Self::new(destination, days, interests, guardrails)
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    pub fn interests(&self) -> &str {
        &self.interests
    }

    pub fn guardrails(&self) -> &str {
        &self.guardrails
    }
}

static RE_LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)").unwrap());

/// Parse the leading whole number of a free-text duration.
///
/// Returns `None` for missing, zero, or overflowing values.
pub fn parse_duration(input: &str) -> Option<u32> {
    let caps = RE_LEADING_NUMBER.captures(input)?;
    caps[1].parse::<u32>().ok().filter(|&d| d >= 1)
}

/// Download name for the itinerary PDF, derived from the destination.
///
/// `"Tokyo, Japan"` → `"tokyo-japan-travel-plan.pdf"`. Falls back to
/// `"travel-plan.pdf"` when nothing ASCII-alphanumeric remains.
pub fn document_filename(destination: &str) -> String {
    let mut slug = String::with_capacity(destination.len());
    for c in destination.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "travel-plan.pdf".to_string()
    } else {
        format!("{slug}-travel-plan.pdf")
    }
}
