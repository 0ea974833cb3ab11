/// Planner error types
/// Every failure between form submission and rendered itinerary ends up here

use std::time::Duration;

use thiserror::Error;

use crate::trip::TripField;

/// Hint shown under every generic error banner
pub const RETRY_HINT: &str = "Please try again or check your connection.";

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<TripField>),

    #[error("no messages found on thread")]
    NoMessages,

    #[error("no assistant message on thread")]
    NoAssistantMessage,

    #[error("assistant message has no text content")]
    EmptyContent,

    #[error("agent run did not finish within {}s", .waited.as_secs())]
    Timeout { waited: Duration },

    #[error("request cancelled while waiting for the agent")]
    Cancelled,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("agent service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("failed to decode agent response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PlannerError {
    /// True for the pre-submission warning (no network call was made)
    pub fn is_validation(&self) -> bool {
        matches!(self, PlannerError::MissingFields(_))
    }

    /// Text shown to the user in place of an itinerary
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::MissingFields(_) => "Please fill in all fields.".to_string(),
            PlannerError::NoMessages => "No messages found. Please try again.".to_string(),
            PlannerError::NoAssistantMessage => "No response received. Please try again.".to_string(),
            PlannerError::EmptyContent => "Unable to retrieve itinerary. Please try again.".to_string(),
            other => format!("An error occurred: {}", other),
        }
    }

    /// Retry hint appended to generic failures only
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            PlannerError::MissingFields(_)
            | PlannerError::NoMessages
            | PlannerError::NoAssistantMessage
            | PlannerError::EmptyContent => None,
            _ => Some(RETRY_HINT),
        }
    }
}

fn join_fields(fields: &[TripField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_messages_are_distinct() {
        assert_eq!(
            PlannerError::NoAssistantMessage.user_message(),
            "No response received. Please try again."
        );
        assert_eq!(
            PlannerError::EmptyContent.user_message(),
            "Unable to retrieve itinerary. Please try again."
        );
        assert_ne!(
            PlannerError::NoAssistantMessage.user_message(),
            PlannerError::EmptyContent.user_message()
        );
    }

    #[test]
    fn test_generic_error_carries_error_text_and_hint() {
        let err = PlannerError::Service {
            status: 429,
            body: "rate limited".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.starts_with("An error occurred: "));
        assert!(msg.contains("rate limited"));
        assert_eq!(err.hint(), Some(RETRY_HINT));
    }

    #[test]
    fn test_missing_fields_is_validation() {
        let err = PlannerError::MissingFields(vec![TripField::Origin, TripField::EndDate]);
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Please fill in all fields.");
        assert_eq!(err.to_string(), "missing required fields: Origin City, End Date");
        assert!(!PlannerError::Cancelled.is_validation());
    }

    #[test]
    fn test_timeout_message_reports_seconds() {
        let err = PlannerError::Timeout {
            waited: Duration::from_secs(600),
        };
        assert!(err.user_message().contains("600s"));
    }
}
