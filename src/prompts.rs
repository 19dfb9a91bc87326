//! Prompts sent to the model service.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: the section layout the renderer expects
//!    and the wording the model sees are edited in exactly one place.
//!
//! 2. **Testability**: unit tests can inspect the prompts directly without
//!    calling a model, so prompt regressions are easy to catch.
//!
//! Callers can override the system prompt via
//! [`crate::config::PlannerConfig::system_prompt`]; the constant here is used
//! only when no override is provided.

use crate::request::TripRequest;

/// Top-level sections the model is asked to produce, in order.
///
/// The renderer does not enforce them; they are an instruction only.
pub const ITINERARY_SECTIONS: [&str; 5] = [
    "Trip Overview",
    "Daily Itinerary",
    "Accessibility & Guardrail Notes",
    "Dining & Cuisine Recommendations",
    "Logistics & Transport Tips",
];

/// Default system prompt fixing the assistant's role and output contract.
pub const DEFAULT_SYSTEM_PROMPT: &str = r####"You are an expert TRAVEL PLANNER and CONCIERGE.

Requirements:
- Produce a detailed, day-by-day itinerary.
- Include specific recommendations for food, historic sites, and activities based on the traveler's interests.
- Strictly adhere to the traveler's guardrails on every day and in every recommendation (e.g. if 'no walking', suggest transport or stationary activities; if 'wheelchair accessible', only suggest step-free venues and say so).
- Provide a balanced mix of popular landmarks and hidden gems.

Output format: Markdown with exactly these top-level H2 sections (##), in this order:
  ## Trip Overview
  ## Daily Itinerary
  ## Accessibility & Guardrail Notes
  ## Dining & Cuisine Recommendations
  ## Logistics & Transport Tips

Inside "Daily Itinerary" use one H3 heading per day ("### Day 1: ..."), with
"- " bullet points for Morning, Afternoon and Evening. Use **bold** for venue
names. Do NOT wrap the answer in ``` fences and do NOT add commentary before
or after the itinerary."####;

/// Build the user message for a trip.
///
/// Every field is interpolated verbatim, including blank interests; only
/// blank guardrails are replaced, with `"None specified"`.
pub fn build_user_prompt(request: &TripRequest) -> String {
    let interests = request.interests();
    let guardrails = non_blank_or(request.guardrails(), "None specified");
    let days = request.duration_days();
    let day_word = if days == 1 { "day" } else { "days" };

    format!(
        "TRIP DETAILS\n\
- Destination: {destination}\n\
- Duration: {days} {day_word}\n\
- Special Interests: {interests}\n\
\n\
CONSTRAINTS & GUARDRAILS\n\
- {guardrails}\n\
\n\
INSTRUCTIONS\n\
- Create a plan for exactly {days} {day_word}.\n\
- Ensure every activity aligns with the interests: {interests}.\n\
- Ensure every activity respects the guardrails: {guardrails}.\n\
- Keep the tone helpful and exciting.",
        destination = request.destination(),
    )
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
