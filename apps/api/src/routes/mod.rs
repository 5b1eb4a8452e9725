pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::planner::handlers as planner;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless provider proxies
        .route("/api/recommend", post(planner::handle_recommend))
        .route("/api/itinerary", post(planner::handle_itinerary))
        .route("/api/image", post(planner::handle_image))
        // Quiz sessions
        .route("/api/sessions", post(session::handle_create_session))
        .route(
            "/api/sessions/:id",
            get(session::handle_get_session).delete(session::handle_delete_session),
        )
        .route("/api/sessions/:id/styles", post(session::handle_toggle_style))
        .route("/api/sessions/:id/details", put(session::handle_update_details))
        .route("/api/sessions/:id/submit", post(session::handle_submit))
        .route(
            "/api/sessions/:id/suggest-again",
            post(session::handle_suggest_again),
        )
        .route(
            "/api/sessions/:id/itinerary",
            post(session::handle_create_itinerary),
        )
        .route("/api/sessions/:id/back", post(session::handle_back))
        .route(
            "/api/sessions/:id/dismiss-error",
            post(session::handle_dismiss_error),
        )
        .route("/api/sessions/:id/reset", post(session::handle_reset))
        .with_state(state)
}
