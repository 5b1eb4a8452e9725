//! Itinerary requester: one provider call, reply returned verbatim.

use tracing::info;

use crate::llm_client::TextGenerator;
use crate::planner::prompts::{
    describe_party, format_inr, render_template, ITINERARY_PROMPT_TEMPLATE,
    NO_CUSTOM_PROMPT_ITINERARY,
};
use crate::planner::{PlannerError, TripProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryRequest {
    pub destination_name: String,
    pub profile: TripProfile,
}

pub fn build_itinerary_prompt(request: &ItineraryRequest) -> String {
    let profile = &request.profile;
    let custom_prompt = if profile.custom_prompt.trim().is_empty() {
        NO_CUSTOM_PROMPT_ITINERARY
    } else {
        profile.custom_prompt.trim()
    };

    render_template(
        ITINERARY_PROMPT_TEMPLATE,
        &[
            ("num_people", describe_party(profile.num_people).as_str()),
            ("destination", request.destination_name.trim()),
            ("budget", format_inr(profile.budget).as_str()),
            ("travel_styles", profile.travel_styles.join(", ").as_str()),
            ("custom_prompt", custom_prompt),
        ],
    )
}

/// Requests a day-by-day plan. The text is not parsed or validated.
pub async fn request_itinerary(
    llm: &dyn TextGenerator,
    request: &ItineraryRequest,
) -> Result<String, PlannerError> {
    info!(
        "Requesting itinerary for {} (people={}, budget={})",
        request.destination_name, request.profile.num_people, request.profile.budget
    );
    let prompt = build_itinerary_prompt(request);
    let itinerary = llm.generate_text(&prompt).await?;
    Ok(itinerary)
}
