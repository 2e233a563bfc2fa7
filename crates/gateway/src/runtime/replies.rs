//! User-facing reply texts.
//!
//! Three families of failure are kept apart: the bot owner has not set
//! something up ("not available"), the provider had a transient problem
//! ("try again later"), and the provider refused the content ("rejected").

use gr_domain::{ConversationScope, Error};
use gr_sessions::ResetOutcome;

/// Which feature a failure message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Chat,
    Vision,
    Image,
}

impl Service {
    fn label(self) -> &'static str {
        match self {
            Service::Chat => "AI service",
            Service::Vision => "AI vision service",
            Service::Image => "image generation service",
        }
    }
}

pub const INVALID_IMAGE: &str = "Please upload a valid image file (e.g., PNG, JPG, GIF).";
pub const SEARCH_NEEDS_TEXT: &str = "To use web search with an image, please also provide some text for the search query in the 'text' field.";
pub const EMPTY_IMAGE_PROMPT: &str = "Please provide a prompt to generate an image.";
pub const DEFAULT_VISION_PROMPT: &str = "Describe this image.";

/// Message for a request that failed at the provider.
pub fn failure(service: Service, err: &Error) -> String {
    let label = service.label();
    match err {
        Error::ContentBlocked { reason, .. } => match service {
            Service::Chat => format!(
                "I couldn't generate a response because the prompt was blocked. Reason: {reason}."
            ),
            Service::Vision => format!("Image analysis blocked. Reason: {reason}."),
            Service::Image => format!("Image generation blocked. Reason: {reason}."),
        },
        Error::NotConfigured(_) if service == Service::Image => {
            "Image generation failed: API Key not configured.".into()
        }
        Error::NotConfigured(_) => format!(
            "The {label} is not available right now: the bot owner has not configured it."
        ),
        Error::Transport {
            status, message, ..
        } => format!(
            "Sorry, I encountered an error trying to reach the {label} (HTTP {status}: {message}). Please try again later."
        ),
        Error::Http(_) | Error::Timeout(_) => format!(
            "Sorry, I couldn't reach the {label}. Please try again later."
        ),
        Error::MalformedResponse { .. } => match service {
            Service::Vision => {
                "Sorry, I received an unexpected response from the AI for the image.".into()
            }
            _ => "Sorry, I received an unexpected response from the AI. No content found.".into(),
        },
        Error::NoImageData(detail) => format!("Failed to generate image: {detail}"),
        Error::RetryExhausted { attempts, last } => {
            format!("Failed to generate image after {attempts} attempts: {last}")
        }
        _ => "Sorry, an unexpected error occurred.".into(),
    }
}

/// Confirmation for `reset-ai`, worded per scope kind.
pub fn reset(scope: ConversationScope, outcome: ResetOutcome) -> String {
    match (scope.is_private(), outcome) {
        (true, ResetOutcome::Cleared { .. }) => {
            "Your DM conversation history with the AI has been reset.".into()
        }
        (true, ResetOutcome::AlreadyEmpty) => {
            "You have no DM conversation history with the AI to reset.".into()
        }
        (false, ResetOutcome::Cleared { .. }) => {
            "The conversation history for this server with the AI has been reset.".into()
        }
        (false, ResetOutcome::AlreadyEmpty) => {
            "There is no conversation history for this server with the AI to reset.".into()
        }
    }
}
