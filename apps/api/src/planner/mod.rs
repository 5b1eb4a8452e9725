// Trip planning: recommendation + itinerary requesters and the stateless proxy endpoints.
// All generation calls go through llm_client::TextGenerator; all photo calls through photos::PhotoSearch.

pub mod handlers;
pub mod itinerary;
pub mod prompts;
pub mod recommend;

use thiserror::Error;

use crate::errors::AppError;
use crate::llm_client::LlmError;

/// Caller-facing message when a recommendation cannot be produced.
pub const RECOMMENDATION_FAILED: &str = "Failed to get recommendation from AI";
/// Caller-facing message when an itinerary cannot be produced.
pub const ITINERARY_FAILED: &str = "Failed to create itinerary";

/// Traveller preferences shared by both requesters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripProfile {
    pub travel_styles: Vec<String>,
    /// Total group budget in INR. Always > 0.
    pub budget: u64,
    /// Always >= 1.
    pub num_people: u32,
    pub custom_prompt: String,
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("provider transport error: {0}")]
    ProviderTransport(String),

    #[error("provider contract error: {0}")]
    ProviderContract(String),
}

impl From<LlmError> for PlannerError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => PlannerError::Configuration(e.to_string()),
            LlmError::Http(_) | LlmError::Api { .. } => PlannerError::ProviderTransport(e.to_string()),
            LlmError::EmptyContent => PlannerError::ProviderContract(e.to_string()),
        }
    }
}

impl PlannerError {
    /// Converts into an HTTP error. Provider failures collapse to `message`; the cause is only logged.
    pub fn into_app_error(self, message: &'static str) -> AppError {
        match self {
            PlannerError::Configuration(msg) => AppError::Configuration(msg),
            other => AppError::Provider {
                message,
                cause: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::TextGenerator;

    /// Deterministic generation provider: replays scripted replies and records prompts.
    #[derive(Default)]
    pub(crate) struct FakeGenerator {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        pub fn with_replies<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
                prompts: Mutex::default(),
            }
        }

        pub fn failing(error: LlmError) -> Self {
            Self {
                replies: Mutex::new(VecDeque::from([Err(error)])),
                prompts: Mutex::default(),
            }
        }

        /// Queues a failure after the scripted replies.
        pub fn then_failing(self, error: LlmError) -> Self {
            self.replies.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    pub(crate) fn kyoto_reply() -> String {
        r#"{"name":"Kyoto","description":"Temples and tea houses.","image":"kyoto temples autumn"}"#
            .to_string()
    }

    #[test]
    fn test_missing_key_maps_to_configuration() {
        let err: PlannerError = LlmError::MissingApiKey.into();
        assert!(matches!(err, PlannerError::Configuration(_)));
        assert!(matches!(
            err.into_app_error(RECOMMENDATION_FAILED),
            AppError::Configuration(_)
        ));
    }

    #[test]
    fn test_api_failure_maps_to_generic_provider_error() {
        let err: PlannerError = LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        }
        .into();
        assert!(matches!(err, PlannerError::ProviderTransport(_)));
        match err.into_app_error(ITINERARY_FAILED) {
            AppError::Provider { message, cause } => {
                assert_eq!(message, "Failed to create itinerary");
                assert!(cause.contains("overloaded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
