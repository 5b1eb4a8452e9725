//! Axum route handlers for the stateless planner endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::photos::{resolve_image, PhotoError};
use crate::planner::itinerary::{request_itinerary, ItineraryRequest};
use crate::planner::recommend::{request_recommendation, Recommendation, RecommendationRequest};
use crate::planner::{TripProfile, ITINERARY_FAILED, RECOMMENDATION_FAILED};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Budget as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BudgetInput {
    Number(f64),
    Text(String),
}

impl BudgetInput {
    /// Whole currency units, or `None` if the value is not a positive number.
    pub fn amount(&self) -> Option<u64> {
        let value = match self {
            BudgetInput::Number(n) => *n,
            BudgetInput::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        };
        if value.is_finite() && value >= 1.0 {
            Some(value.round() as u64)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendBody {
    #[serde(default)]
    pub travel_styles: Vec<String>,
    pub budget: Option<BudgetInput>,
    pub custom_prompt: Option<String>,
    pub num_people: Option<u32>,
    #[serde(default)]
    pub previous_recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryBody {
    pub destination_name: Option<String>,
    #[serde(default)]
    pub travel_styles: Vec<String>,
    pub budget: Option<BudgetInput>,
    pub num_people: Option<u32>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItineraryResponse {
    pub itinerary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBody {
    pub search_term: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_styles(styles: Vec<String>) -> Vec<String> {
    styles
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn party_size(num_people: Option<u32>) -> Result<u32, AppError> {
    match num_people {
        None => Ok(1),
        Some(0) => Err(AppError::Validation(
            "numPeople must be at least 1".to_string(),
        )),
        Some(n) => Ok(n),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/recommend
///
/// Returns one destination `{name, description, image}` for the given preferences,
/// avoiding every name in `previousRecommendations`.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(body): Json<RecommendBody>,
) -> Result<Json<Recommendation>, AppError> {
    let travel_styles = clean_styles(body.travel_styles);
    let budget = body.budget.as_ref().and_then(BudgetInput::amount);
    let budget = match (travel_styles.is_empty(), budget) {
        (false, Some(budget)) => budget,
        _ => {
            return Err(AppError::Validation(
                "Missing travelStyles or budget".to_string(),
            ))
        }
    };

    let request = RecommendationRequest {
        profile: TripProfile {
            travel_styles,
            budget,
            num_people: party_size(body.num_people)?,
            custom_prompt: body.custom_prompt.unwrap_or_default(),
        },
        previous_recommendations: body.previous_recommendations,
    };

    let recommendation = request_recommendation(state.llm.as_ref(), &request)
        .await
        .map_err(|e| e.into_app_error(RECOMMENDATION_FAILED))?;

    Ok(Json(recommendation))
}

/// POST /api/itinerary
///
/// Returns the provider's itinerary text for `destinationName` verbatim.
pub async fn handle_itinerary(
    State(state): State<AppState>,
    Json(body): Json<ItineraryBody>,
) -> Result<Json<ItineraryResponse>, AppError> {
    let destination_name = non_blank(body.destination_name)
        .ok_or_else(|| AppError::Validation("Missing destinationName".to_string()))?;
    let budget = body
        .budget
        .as_ref()
        .and_then(BudgetInput::amount)
        .ok_or_else(|| AppError::Validation("Missing budget".to_string()))?;

    let request = ItineraryRequest {
        destination_name,
        profile: TripProfile {
            travel_styles: clean_styles(body.travel_styles),
            budget,
            num_people: party_size(body.num_people)?,
            custom_prompt: body.custom_prompt.unwrap_or_default(),
        },
    };

    let itinerary = request_itinerary(state.llm.as_ref(), &request)
        .await
        .map_err(|e| e.into_app_error(ITINERARY_FAILED))?;

    Ok(Json(ItineraryResponse { itinerary }))
}

/// POST /api/image
///
/// Resolves a search term to a photo URL. Never reports "not found": misses and
/// provider failures return the fallback URL.
pub async fn handle_image(
    State(state): State<AppState>,
    Json(body): Json<ImageBody>,
) -> Result<Json<ImageResponse>, AppError> {
    let search_term = non_blank(body.search_term)
        .ok_or_else(|| AppError::Validation("Missing search term".to_string()))?;

    let image_url = resolve_image(state.photos.as_ref(), &search_term)
        .await
        .map_err(|e| match e {
            PhotoError::MissingAccessKey => AppError::Configuration(e.to_string()),
            other => AppError::Internal(other.into()),
        })?;

    Ok(Json(ImageResponse { image_url }))
}
