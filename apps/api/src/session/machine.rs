//! Quiz/result state machine.
//!
//! A session is one `SessionState` value plus the quiz answers and the
//! append-only recommendation history. Every user action is a method that
//! either performs a legal transition or returns `TransitionError` without
//! touching the state (a rejected submit only records its notice). Provider
//! work is described by tickets handed out on entering a loading state;
//! completions carrying a ticket that no longer matches the current state are
//! discarded.

use std::collections::BTreeSet;
use std::mem;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::photos::FALLBACK_IMAGE_URL;
use crate::planner::itinerary::ItineraryRequest;
use crate::planner::recommend::{Recommendation, RecommendationRequest};
use crate::planner::TripProfile;

/// Styles offered by the quiz.
pub const TRAVEL_STYLES: [&str; 6] = [
    "Adventure",
    "Culture",
    "Relaxation",
    "Foodie",
    "Historical",
    "Nightlife",
];
pub const DEFAULT_BUDGET: u64 = 75_000;
pub const DEFAULT_NUM_PEOPLE: u32 = 1;
pub const EMPTY_STYLES_NOTICE: &str = "Please select at least one travel style.";

// ────────────────────────────────────────────────────────────────────────────
// Data model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswers {
    pub travel_styles: BTreeSet<String>,
    pub num_people: u32,
    pub budget: u64,
    pub custom_prompt: String,
}

impl Default for QuizAnswers {
    fn default() -> Self {
        Self {
            travel_styles: BTreeSet::new(),
            num_people: DEFAULT_NUM_PEOPLE,
            budget: DEFAULT_BUDGET,
            custom_prompt: String::new(),
        }
    }
}

impl QuizAnswers {
    pub fn profile(&self) -> TripProfile {
        TripProfile {
            travel_styles: self.travel_styles.iter().cloned().collect(),
            budget: self.budget,
            num_people: self.num_people,
            custom_prompt: self.custom_prompt.clone(),
        }
    }
}

/// Partial update of the group size / budget / note step.
#[derive(Debug, Clone, Default)]
pub struct DetailsUpdate {
    pub budget: Option<u64>,
    pub num_people: Option<u32>,
    pub custom_prompt: Option<String>,
}

/// A recommendation as shown in this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShownRecommendation {
    pub id: Uuid,
    #[serde(flatten)]
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedImage {
    Pending,
    Resolved(String),
}

impl ResolvedImage {
    /// What to display right now: the resolved URL or the fallback.
    pub fn display_url(&self) -> &str {
        match self {
            ResolvedImage::Pending => FALLBACK_IMAGE_URL,
            ResolvedImage::Resolved(url) => url,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ResolvedImage::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Quiz {
        /// Local validation message from the last rejected submit.
        notice: Option<String>,
    },
    LoadingRecommendation {
        ticket: Uuid,
        /// View to return to if the request fails and the error is dismissed.
        resume: Box<SessionState>,
    },
    ShowingRecommendation {
        image: ResolvedImage,
    },
    LoadingItinerary {
        ticket: Uuid,
        image: ResolvedImage,
    },
    ShowingItinerary {
        image: ResolvedImage,
        itinerary: String,
    },
    Error {
        message: String,
        resume: Box<SessionState>,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Quiz { .. } => "quiz",
            SessionState::LoadingRecommendation { .. } => "loadingRecommendation",
            SessionState::ShowingRecommendation { .. } => "showingRecommendation",
            SessionState::LoadingItinerary { .. } => "loadingItinerary",
            SessionState::ShowingItinerary { .. } => "showingItinerary",
            SessionState::Error { .. } => "error",
        }
    }

    /// The image slot of the current recommendation, wherever the state keeps it.
    fn image_slot_mut(&mut self) -> Option<&mut ResolvedImage> {
        match self {
            SessionState::ShowingRecommendation { image }
            | SessionState::LoadingItinerary { image, .. }
            | SessionState::ShowingItinerary { image, .. } => Some(image),
            SessionState::LoadingRecommendation { resume, .. }
            | SessionState::Error { resume, .. } => resume.image_slot_mut(),
            SessionState::Quiz { .. } => None,
        }
    }

    pub fn image(&self) -> Option<&ResolvedImage> {
        match self {
            SessionState::ShowingRecommendation { image }
            | SessionState::LoadingItinerary { image, .. }
            | SessionState::ShowingItinerary { image, .. } => Some(image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadingState {
    Idle,
    FetchingRecommendation,
    FetchingItinerary,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{0}")]
    Validation(String),

    #[error("cannot {action} while in state '{state}'")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Work order for one recommendation request.
#[derive(Debug, Clone)]
pub struct RecommendationTicket {
    pub id: Uuid,
    pub request: RecommendationRequest,
}

/// Work order for one itinerary request.
#[derive(Debug, Clone)]
pub struct ItineraryTicket {
    pub id: Uuid,
    pub request: ItineraryRequest,
}

/// Work order for resolving the photo of one shown recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTicket {
    pub recommendation_id: Uuid,
    pub search_term: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub answers: QuizAnswers,
    /// Append-only until reset. The last entry is the one on display.
    pub history: Vec<ShownRecommendation>,
    pub state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            answers: QuizAnswers::default(),
            history: Vec::new(),
            state: SessionState::Quiz { notice: None },
        }
    }

    pub fn current(&self) -> Option<&ShownRecommendation> {
        self.history.last()
    }

    pub fn loading(&self) -> LoadingState {
        match self.state {
            SessionState::LoadingRecommendation { .. } => LoadingState::FetchingRecommendation,
            SessionState::LoadingItinerary { .. } => LoadingState::FetchingItinerary,
            _ => LoadingState::Idle,
        }
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    // ── Quiz step ───────────────────────────────────────────────────────────

    /// Adds or removes a style from the selection. Matching is case-insensitive.
    pub fn toggle_style(&mut self, style: &str) -> Result<(), TransitionError> {
        if !matches!(self.state, SessionState::Quiz { .. }) {
            return Err(self.invalid("change travel styles"));
        }

        let canonical = TRAVEL_STYLES
            .iter()
            .find(|s| s.eq_ignore_ascii_case(style.trim()))
            .ok_or_else(|| {
                TransitionError::Validation(format!(
                    "Unknown travel style '{}'. Choose from: {}",
                    style.trim(),
                    TRAVEL_STYLES.join(", ")
                ))
            })?;

        self.state = SessionState::Quiz { notice: None };
        if !self.answers.travel_styles.remove(*canonical) {
            self.answers.travel_styles.insert(canonical.to_string());
        }
        Ok(())
    }

    pub fn update_details(&mut self, update: DetailsUpdate) -> Result<(), TransitionError> {
        if !matches!(self.state, SessionState::Quiz { .. }) {
            return Err(self.invalid("change trip details"));
        }
        if update.budget == Some(0) {
            return Err(TransitionError::Validation(
                "budget must be positive".to_string(),
            ));
        }
        if update.num_people == Some(0) {
            return Err(TransitionError::Validation(
                "numPeople must be at least 1".to_string(),
            ));
        }

        if let Some(budget) = update.budget {
            self.answers.budget = budget;
        }
        if let Some(num_people) = update.num_people {
            self.answers.num_people = num_people;
        }
        if let Some(custom_prompt) = update.custom_prompt {
            self.answers.custom_prompt = custom_prompt;
        }
        Ok(())
    }

    /// Quiz → LoadingRecommendation. With no style selected the state stays
    /// `Quiz` with a notice and no ticket is issued.
    pub fn submit(&mut self) -> Result<RecommendationTicket, TransitionError> {
        if !matches!(self.state, SessionState::Quiz { .. }) {
            return Err(self.invalid("submit the quiz"));
        }
        if self.answers.travel_styles.is_empty() {
            self.state = SessionState::Quiz {
                notice: Some(EMPTY_STYLES_NOTICE.to_string()),
            };
            return Err(TransitionError::Validation(EMPTY_STYLES_NOTICE.to_string()));
        }
        Ok(self.begin_recommendation(SessionState::Quiz { notice: None }))
    }

    // ── Recommendation ──────────────────────────────────────────────────────

    /// ShowingRecommendation → LoadingRecommendation, excluding every shown name.
    pub fn suggest_again(&mut self) -> Result<RecommendationTicket, TransitionError> {
        let SessionState::ShowingRecommendation { image } = &self.state else {
            return Err(self.invalid("suggest another destination"));
        };
        let resume = SessionState::ShowingRecommendation {
            image: image.clone(),
        };
        Ok(self.begin_recommendation(resume))
    }

    fn begin_recommendation(&mut self, resume: SessionState) -> RecommendationTicket {
        let ticket = RecommendationTicket {
            id: Uuid::new_v4(),
            request: RecommendationRequest {
                profile: self.answers.profile(),
                previous_recommendations: self
                    .history
                    .iter()
                    .map(|shown| shown.recommendation.name.clone())
                    .collect(),
            },
        };
        self.state = SessionState::LoadingRecommendation {
            ticket: ticket.id,
            resume: Box::new(resume),
        };
        ticket
    }

    /// Applies the outcome of a recommendation request.
    ///
    /// On success the recommendation is appended and an image ticket returned.
    /// On failure the session enters `Error` with `message`. A stale ticket is ignored.
    pub fn complete_recommendation(
        &mut self,
        ticket: Uuid,
        outcome: Result<Recommendation, String>,
    ) -> Option<ImageTicket> {
        match &self.state {
            SessionState::LoadingRecommendation { ticket: current, .. } if *current == ticket => {}
            _ => return None,
        }
        let SessionState::LoadingRecommendation { resume, .. } =
            mem::replace(&mut self.state, SessionState::Quiz { notice: None })
        else {
            return None;
        };

        match outcome {
            Ok(recommendation) => {
                let shown = ShownRecommendation {
                    id: Uuid::new_v4(),
                    recommendation,
                };
                let image_ticket = ImageTicket {
                    recommendation_id: shown.id,
                    search_term: shown.recommendation.image_search_term.clone(),
                };
                self.history.push(shown);
                self.state = SessionState::ShowingRecommendation {
                    image: ResolvedImage::Pending,
                };
                Some(image_ticket)
            }
            Err(message) => {
                self.state = SessionState::Error { message, resume };
                None
            }
        }
    }

    // ── Itinerary ───────────────────────────────────────────────────────────

    /// ShowingRecommendation → LoadingItinerary for the current recommendation.
    pub fn request_itinerary(&mut self) -> Result<ItineraryTicket, TransitionError> {
        let (SessionState::ShowingRecommendation { image }, Some(current)) =
            (&self.state, self.history.last())
        else {
            return Err(self.invalid("create an itinerary"));
        };

        let ticket = ItineraryTicket {
            id: Uuid::new_v4(),
            request: ItineraryRequest {
                destination_name: current.recommendation.name.clone(),
                profile: self.answers.profile(),
            },
        };
        self.state = SessionState::LoadingItinerary {
            ticket: ticket.id,
            image: image.clone(),
        };
        Ok(ticket)
    }

    /// Applies the outcome of an itinerary request. Returns false for a stale ticket.
    pub fn complete_itinerary(&mut self, ticket: Uuid, outcome: Result<String, String>) -> bool {
        let image = match &self.state {
            SessionState::LoadingItinerary {
                ticket: current,
                image,
            } if *current == ticket => image.clone(),
            _ => return false,
        };

        self.state = match outcome {
            Ok(itinerary) => SessionState::ShowingItinerary { image, itinerary },
            Err(message) => SessionState::Error {
                message,
                resume: Box::new(SessionState::ShowingRecommendation { image }),
            },
        };
        true
    }

    /// Abandons an in-flight request without recording an error: the session
    /// returns to the view the request started from. Returns false for a stale ticket.
    pub fn cancel_request(&mut self, ticket: Uuid) -> bool {
        match &self.state {
            SessionState::LoadingRecommendation { ticket: current, .. }
            | SessionState::LoadingItinerary { ticket: current, .. }
                if *current == ticket => {}
            _ => return false,
        }
        self.state = match mem::replace(&mut self.state, SessionState::Quiz { notice: None }) {
            SessionState::LoadingRecommendation { resume, .. } => *resume,
            SessionState::LoadingItinerary { image, .. } => {
                SessionState::ShowingRecommendation { image }
            }
            other => other,
        };
        true
    }

    /// ShowingItinerary → ShowingRecommendation. The itinerary text is dropped.
    pub fn back(&mut self) -> Result<(), TransitionError> {
        let SessionState::ShowingItinerary { image, .. } = &self.state else {
            return Err(self.invalid("go back"));
        };
        self.state = SessionState::ShowingRecommendation {
            image: image.clone(),
        };
        Ok(())
    }

    // ── Errors, images, reset ───────────────────────────────────────────────

    pub fn dismiss_error(&mut self) -> Result<(), TransitionError> {
        if !matches!(self.state, SessionState::Error { .. }) {
            return Err(self.invalid("dismiss an error"));
        }
        if let SessionState::Error { resume, .. } =
            mem::replace(&mut self.state, SessionState::Quiz { notice: None })
        {
            self.state = *resume;
        }
        Ok(())
    }

    /// Stores a resolved photo URL if `ticket` still refers to the recommendation on display.
    pub fn apply_image(&mut self, ticket: &ImageTicket, url: String) -> bool {
        if self.current().map(|shown| shown.id) != Some(ticket.recommendation_id) {
            return false;
        }
        match self.state.image_slot_mut() {
            Some(slot) => {
                *slot = ResolvedImage::Resolved(url);
                true
            }
            None => false,
        }
    }

    /// Back to a fresh quiz from any state. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.answers = QuizAnswers::default();
        self.history.clear();
        self.state = SessionState::Quiz { notice: None };
    }
}
