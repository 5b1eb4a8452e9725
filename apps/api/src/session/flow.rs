//! Session flow: runs the provider requests the state machine asks for.
//!
//! Pattern for every request: take a ticket under the store lock, release the
//! lock, call the provider, then hand the outcome back with the ticket. The
//! machine drops outcomes whose ticket went stale in the meantime.
//!
//! The call and its completion run on a spawned task that the handler awaits,
//! so a client that disconnects mid-request cannot strand the session in a
//! loading state.

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::photos::{resolve_image, PhotoSearch, FALLBACK_IMAGE_URL};
use crate::planner::itinerary::request_itinerary;
use crate::planner::recommend::request_recommendation;
use crate::planner::{PlannerError, ITINERARY_FAILED, RECOMMENDATION_FAILED};
use crate::session::machine::{ImageTicket, ItineraryTicket, RecommendationTicket, Session};
use crate::session::store::SessionStore;
use crate::session::view::SessionView;
use crate::state::AppState;

/// Quiz → recommendation. Returns the view after the provider has answered.
pub async fn submit(state: &AppState, id: Uuid) -> Result<SessionView, AppError> {
    let (ticket, _) = state.sessions.update(id, Session::submit).await?;
    join(tokio::spawn(run_recommendation(state.clone(), id, ticket?))).await
}

/// Another recommendation for the same answers, excluding every name already shown.
pub async fn suggest_again(state: &AppState, id: Uuid) -> Result<SessionView, AppError> {
    let (ticket, _) = state.sessions.update(id, Session::suggest_again).await?;
    join(tokio::spawn(run_recommendation(state.clone(), id, ticket?))).await
}

/// Recommendation → itinerary for the destination on display.
pub async fn create_itinerary(state: &AppState, id: Uuid) -> Result<SessionView, AppError> {
    let (ticket, _) = state.sessions.update(id, Session::request_itinerary).await?;
    join(tokio::spawn(run_itinerary(state.clone(), id, ticket?))).await
}

async fn join(task: JoinHandle<Result<SessionView, AppError>>) -> Result<SessionView, AppError> {
    task.await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("session request task failed: {e}")))?
}

async fn run_recommendation(
    state: AppState,
    id: Uuid,
    ticket: RecommendationTicket,
) -> Result<SessionView, AppError> {
    let outcome = match request_recommendation(state.llm.as_ref(), &ticket.request).await {
        Err(PlannerError::Configuration(message)) => {
            return abandon(&state.sessions, id, ticket.id, message).await;
        }
        outcome => outcome.map_err(|e| {
            error!("Recommendation for session {id} failed: {e}");
            RECOMMENDATION_FAILED.to_string()
        }),
    };

    let (image_ticket, view) = state
        .sessions
        .update(id, |session| session.complete_recommendation(ticket.id, outcome))
        .await?;

    if let Some(image_ticket) = image_ticket {
        spawn_image_resolution(state.clone(), id, image_ticket);
    }
    Ok(view)
}

async fn run_itinerary(
    state: AppState,
    id: Uuid,
    ticket: ItineraryTicket,
) -> Result<SessionView, AppError> {
    let outcome = match request_itinerary(state.llm.as_ref(), &ticket.request).await {
        Err(PlannerError::Configuration(message)) => {
            return abandon(&state.sessions, id, ticket.id, message).await;
        }
        outcome => outcome.map_err(|e| {
            error!("Itinerary for session {id} failed: {e}");
            ITINERARY_FAILED.to_string()
        }),
    };

    let (applied, view) = state
        .sessions
        .update(id, |session| session.complete_itinerary(ticket.id, outcome))
        .await?;
    if !applied {
        debug!("Discarded stale itinerary for session {id}");
    }
    Ok(view)
}

/// A missing credential is not a provider failure: the session goes back to
/// where the request started and the caller gets a configuration error.
async fn abandon(
    sessions: &SessionStore,
    id: Uuid,
    ticket: Uuid,
    message: String,
) -> Result<SessionView, AppError> {
    sessions
        .update(id, |session| session.cancel_request(ticket))
        .await?;
    Err(AppError::Configuration(message))
}

/// The photo lookup runs detached from the request that produced the recommendation.
fn spawn_image_resolution(state: AppState, id: Uuid, ticket: ImageTicket) {
    tokio::spawn(async move {
        resolve_session_image(&state.sessions, state.photos.as_ref(), id, ticket).await;
    });
}

/// Resolves the photo for `ticket` and stores it if the recommendation is still on display.
/// Returns whether the URL was applied.
pub async fn resolve_session_image(
    sessions: &SessionStore,
    photos: &dyn PhotoSearch,
    id: Uuid,
    ticket: ImageTicket,
) -> bool {
    let url = resolve_image(photos, &ticket.search_term)
        .await
        .unwrap_or_else(|e| {
            error!("Photo lookup unavailable: {e}");
            FALLBACK_IMAGE_URL.to_string()
        });

    match sessions
        .update(id, |session| session.apply_image(&ticket, url))
        .await
    {
        Ok((true, _)) => true,
        Ok((false, _)) => {
            debug!(
                "Discarded stale photo for recommendation {} in session {id}",
                ticket.recommendation_id
            );
            false
        }
        Err(e) => {
            warn!("Session {id} vanished before its photo resolved: {e}");
            false
        }
    }
}
