use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::session::machine::{
    LoadingState, QuizAnswers, Session, SessionState, ShownRecommendation, TRAVEL_STYLES,
};

/// What a client renders for one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: &'static str,
    pub loading: LoadingState,
    pub answers: QuizAnswers,
    pub available_styles: [&'static str; 6],
    pub notice: Option<String>,
    pub recommendation: Option<ShownRecommendation>,
    pub image: Option<ImageView>,
    pub itinerary: Option<String>,
    pub error: Option<String>,
    pub history: Vec<ShownRecommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub url: String,
    /// True while the photo lookup is outstanding; `url` is the fallback meanwhile.
    pub pending: bool,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let image = session.state.image();

        let notice = match &session.state {
            SessionState::Quiz { notice } => notice.clone(),
            _ => None,
        };
        let itinerary = match &session.state {
            SessionState::ShowingItinerary { itinerary, .. } => Some(itinerary.clone()),
            _ => None,
        };
        let error = match &session.state {
            SessionState::Error { message, .. } => Some(message.clone()),
            _ => None,
        };

        SessionView {
            id: session.id,
            created_at: session.created_at,
            updated_at: session.updated_at,
            state: session.state.name(),
            loading: session.loading(),
            answers: session.answers.clone(),
            available_styles: TRAVEL_STYLES,
            notice,
            // Only states that display a recommendation carry an image slot.
            recommendation: image.and(session.current().cloned()),
            image: image.map(|image| ImageView {
                url: image.display_url().to_string(),
                pending: image.is_pending(),
            }),
            itinerary,
            error,
            history: session.history.clone(),
        }
    }
}
