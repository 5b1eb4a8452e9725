//! Recommendation requester.
//!
//! Flow: build prompt (answers + already-shown names) → one provider call →
//! `parse_recommendation` on the reply. Nothing is retried.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm_client::{strip_json_fences, TextGenerator};
use crate::planner::prompts::{
    describe_party, format_inr, render_template, HISTORY_INSTRUCTION_TEMPLATE,
    NO_CUSTOM_PROMPT_RECOMMEND, RECOMMENDATION_PROMPT_TEMPLATE,
};
use crate::planner::{PlannerError, TripProfile};

/// One suggested destination, as the provider must return it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub description: String,
    /// Photographic search phrase, not a URL.
    #[serde(rename = "image")]
    pub image_search_term: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub profile: TripProfile,
    /// Names already shown in this session, oldest first.
    pub previous_recommendations: Vec<String>,
}

pub fn build_recommendation_prompt(request: &RecommendationRequest) -> String {
    let profile = &request.profile;

    let custom_prompt = if profile.custom_prompt.trim().is_empty() {
        NO_CUSTOM_PROMPT_RECOMMEND
    } else {
        profile.custom_prompt.trim()
    };

    let previous: Vec<String> = request
        .previous_recommendations
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| format!("\"{name}\""))
        .collect();
    let history_instruction = if previous.is_empty() {
        String::new()
    } else {
        render_template(
            HISTORY_INSTRUCTION_TEMPLATE,
            &[("previous", previous.join(", ").as_str())],
        )
    };

    render_template(
        RECOMMENDATION_PROMPT_TEMPLATE,
        &[
            ("num_people", describe_party(profile.num_people).as_str()),
            ("travel_styles", profile.travel_styles.join(", ").as_str()),
            ("budget", format_inr(profile.budget).as_str()),
            ("custom_prompt", custom_prompt),
            ("history_instruction", history_instruction.as_str()),
        ],
    )
}

/// Parses the provider reply into a `Recommendation`.
///
/// Tolerates code fences and prose around the JSON object. Missing or blank
/// fields are a contract failure.
pub fn parse_recommendation(text: &str) -> Result<Recommendation, PlannerError> {
    let body = strip_json_fences(text);
    let body = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    };

    let recommendation: Recommendation = serde_json::from_str(body)
        .map_err(|e| PlannerError::ProviderContract(format!("invalid recommendation JSON: {e}")))?;

    for (field, value) in [
        ("name", &recommendation.name),
        ("description", &recommendation.description),
        ("image", &recommendation.image_search_term),
    ] {
        if value.trim().is_empty() {
            return Err(PlannerError::ProviderContract(format!(
                "recommendation field '{field}' is empty"
            )));
        }
    }

    Ok(recommendation)
}

/// Requests one recommendation from the provider.
pub async fn request_recommendation(
    llm: &dyn TextGenerator,
    request: &RecommendationRequest,
) -> Result<Recommendation, PlannerError> {
    let prompt = build_recommendation_prompt(request);
    info!(
        "Requesting recommendation: styles={:?} budget={} people={} excluded={}",
        request.profile.travel_styles,
        request.profile.budget,
        request.profile.num_people,
        request.previous_recommendations.len()
    );

    let reply = llm.generate_text(&prompt).await?;

    let recommendation = parse_recommendation(&reply).inspect_err(|e| {
        warn!("Unparseable recommendation reply: {e}; reply={reply:?}");
    })?;

    info!("Recommended destination: {}", recommendation.name);
    Ok(recommendation)
}
