//! Axum route handlers for quiz sessions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::planner::handlers::BudgetInput;
use crate::session::flow;
use crate::session::machine::{DetailsUpdate, Session};
use crate::session::view::SessionView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleStyleBody {
    pub style: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsBody {
    pub budget: Option<BudgetInput>,
    pub num_people: Option<u32>,
    pub custom_prompt: Option<String>,
}

/// POST /api/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    (StatusCode::CREATED, Json(state.sessions.create().await))
}

/// GET /api/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(id).await?))
}

/// DELETE /api/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sessions/:id/styles
///
/// Toggles one style in the selection.
pub async fn handle_toggle_style(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ToggleStyleBody>,
) -> Result<Json<SessionView>, AppError> {
    let (result, view) = state
        .sessions
        .update(id, |session| session.toggle_style(&body.style))
        .await?;
    result?;
    Ok(Json(view))
}

/// PUT /api/sessions/:id/details
pub async fn handle_update_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<DetailsBody>,
) -> Result<Json<SessionView>, AppError> {
    let budget = match &body.budget {
        Some(input) => Some(
            input
                .amount()
                .ok_or_else(|| AppError::Validation("budget must be positive".to_string()))?,
        ),
        None => None,
    };
    let update = DetailsUpdate {
        budget,
        num_people: body.num_people,
        custom_prompt: body.custom_prompt,
    };

    let (result, view) = state
        .sessions
        .update(id, |session| session.update_details(update))
        .await?;
    result?;
    Ok(Json(view))
}

/// POST /api/sessions/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(flow::submit(&state, id).await?))
}

/// POST /api/sessions/:id/suggest-again
pub async fn handle_suggest_again(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(flow::suggest_again(&state, id).await?))
}

/// POST /api/sessions/:id/itinerary
pub async fn handle_create_itinerary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(flow::create_itinerary(&state, id).await?))
}

/// POST /api/sessions/:id/back
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let (result, view) = state.sessions.update(id, Session::back).await?;
    result?;
    Ok(Json(view))
}

/// POST /api/sessions/:id/dismiss-error
pub async fn handle_dismiss_error(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let (result, view) = state.sessions.update(id, Session::dismiss_error).await?;
    result?;
    Ok(Json(view))
}

/// POST /api/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let ((), view) = state.sessions.update(id, Session::reset).await?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::photos::tests::FakePhotos;
    use crate::photos::FALLBACK_IMAGE_URL;
    use crate::planner::tests::{kyoto_reply, FakeGenerator};
    use crate::routes::build_router;
    use crate::session::store::SessionStore;
    use crate::state::AppState;

    use super::*;

    fn test_app(llm: FakeGenerator, photos: FakePhotos) -> (Router, Arc<FakeGenerator>) {
        let llm = Arc::new(llm);
        let router = build_router(AppState {
            llm: llm.clone(),
            photos: Arc::new(photos),
            sessions: SessionStore::default(),
        });
        (router, llm)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn wait_for_image(app: &Router, id: &str) -> Value {
        for _ in 0..100 {
            let (_, view) = call(app, Method::GET, &format!("/api/sessions/{id}"), None).await;
            if view["image"]["pending"] == json!(false) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("image never resolved");
    }

    #[tokio::test]
    async fn test_new_session_defaults() {
        let (app, _) = test_app(FakeGenerator::default(), FakePhotos::default());
        let id = new_session(&app).await;
        let (status, view) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"], "quiz");
        assert_eq!(view["loading"], "idle");
        assert_eq!(view["answers"]["budget"], 75000);
        assert_eq!(view["answers"]["numPeople"], 1);
        assert_eq!(view["availableStyles"].as_array().unwrap().len(), 6);
        assert_eq!(view["history"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (app, _) = test_app(FakeGenerator::default(), FakePhotos::default());
        let uri = format!("/api/sessions/{}", Uuid::new_v4());
        let (status, _) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_empty_quiz_is_400_and_stays_in_quiz() {
        let (app, llm) = test_app(FakeGenerator::with_replies([kyoto_reply()]), FakePhotos::default());
        let id = new_session(&app).await;
        let (status, _) = call(&app, Method::POST, &format!("/api/sessions/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(llm.call_count(), 0);

        let (_, view) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(view["state"], "quiz");
        assert_eq!(view["notice"], "Please select at least one travel style.");
    }

    #[tokio::test]
    async fn test_full_quiz_flow() {
        let (app, llm) = test_app(
            FakeGenerator::with_replies([
                kyoto_reply(),
                r#"{"name":"Lisbon","description":"Tiles.","image":"lisbon tram"}"#.to_string(),
                "## Day 1\n- Stay: Alfama guesthouse".to_string(),
            ]),
            FakePhotos::returning("https://images.unsplash.com/photo-abc"),
        );
        let id = new_session(&app).await;
        let base = format!("/api/sessions/{id}");

        let (status, view) = call(
            &app,
            Method::POST,
            &format!("{base}/styles"),
            Some(json!({"style": "Culture"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["answers"]["travelStyles"], json!(["Culture"]));

        let (status, view) = call(
            &app,
            Method::PUT,
            &format!("{base}/details"),
            Some(json!({"budget": "150000", "numPeople": 2, "customPrompt": "near the sea"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["answers"]["budget"], 150000);

        let (status, view) = call(&app, Method::POST, &format!("{base}/submit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"], "showingRecommendation");
        assert_eq!(view["recommendation"]["name"], "Kyoto");
        assert_eq!(view["recommendation"]["image"], "kyoto temples autumn");

        let view = wait_for_image(&app, &id).await;
        assert_eq!(view["image"]["url"], "https://images.unsplash.com/photo-abc");

        let (_, view) = call(&app, Method::POST, &format!("{base}/suggest-again"), None).await;
        assert_eq!(view["recommendation"]["name"], "Lisbon");
        assert_eq!(view["history"].as_array().unwrap().len(), 2);
        assert!(llm.prompts()[1].contains("\"Kyoto\""));

        let (_, view) = call(&app, Method::POST, &format!("{base}/itinerary"), None).await;
        assert_eq!(view["state"], "showingItinerary");
        assert_eq!(view["itinerary"], "## Day 1\n- Stay: Alfama guesthouse");

        let (_, view) = call(&app, Method::POST, &format!("{base}/back"), None).await;
        assert_eq!(view["state"], "showingRecommendation");
        assert_eq!(view["itinerary"], Value::Null);

        let (_, view) = call(&app, Method::POST, &format!("{base}/reset"), None).await;
        assert_eq!(view["state"], "quiz");
        assert_eq!(view["history"], json!([]));
        assert_eq!(view["answers"]["budget"], 75000);
        assert_eq!(view["answers"]["travelStyles"], json!([]));
        assert_eq!(view["image"], Value::Null);
    }

    #[tokio::test]
    async fn test_provider_failure_then_dismiss() {
        let (app, _) = test_app(
            FakeGenerator::failing(crate::llm_client::LlmError::EmptyContent),
            FakePhotos::default(),
        );
        let id = new_session(&app).await;
        let base = format!("/api/sessions/{id}");
        call(&app, Method::POST, &format!("{base}/styles"), Some(json!({"style": "Relaxation"}))).await;

        let (status, view) = call(&app, Method::POST, &format!("{base}/submit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"], "error");
        assert_eq!(view["error"], "Failed to get recommendation from AI");
        assert_eq!(view["recommendation"], Value::Null);

        let (_, view) = call(&app, Method::POST, &format!("{base}/dismiss-error"), None).await;
        assert_eq!(view["state"], "quiz");
        assert_eq!(view["answers"]["travelStyles"], json!(["Relaxation"]));
    }

    #[tokio::test]
    async fn test_submit_without_api_key_is_500_and_quiz_can_retry() {
        let (app, _) = test_app(
            FakeGenerator::failing(crate::llm_client::LlmError::MissingApiKey),
            FakePhotos::default(),
        );
        let id = new_session(&app).await;
        let base = format!("/api/sessions/{id}");
        call(&app, Method::POST, &format!("{base}/styles"), Some(json!({"style": "Culture"}))).await;

        let (status, body) = call(&app, Method::POST, &format!("{base}/submit"), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");

        let (_, view) = call(&app, Method::GET, &base, None).await;
        assert_eq!(view["state"], "quiz");
        assert_eq!(view["loading"], "idle");

        let (status, _) = call(&app, Method::POST, &format!("{base}/submit"), None).await;
        assert_ne!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_image_failure_falls_back() {
        let (app, _) = test_app(
            FakeGenerator::with_replies([kyoto_reply()]),
            FakePhotos {
                fail: true,
                ..Default::default()
            },
        );
        let id = new_session(&app).await;
        let base = format!("/api/sessions/{id}");
        call(&app, Method::POST, &format!("{base}/styles"), Some(json!({"style": "Culture"}))).await;
        call(&app, Method::POST, &format!("{base}/submit"), None).await;

        let view = wait_for_image(&app, &id).await;
        assert_eq!(view["image"]["url"], FALLBACK_IMAGE_URL);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_409() {
        let (app, _) = test_app(FakeGenerator::default(), FakePhotos::default());
        let id = new_session(&app).await;
        let (status, body) = call(&app, Method::POST, &format!("/api/sessions/{id}/back"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_invalid_details_rejected() {
        let (app, _) = test_app(FakeGenerator::default(), FakePhotos::default());
        let id = new_session(&app).await;
        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/api/sessions/{id}/details"),
            Some(json!({"budget": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/api/sessions/{id}/details"),
            Some(json!({"numPeople": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (app, _) = test_app(FakeGenerator::default(), FakePhotos::default());
        let id = new_session(&app).await;
        let (status, _) = call(&app, Method::DELETE, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
