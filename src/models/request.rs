use serde::{Deserialize, Serialize};

/// Body of a `POST /agent` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRequest {
    /// The question to ask
    pub question: String,
    /// Existing conversation to continue - None starts a new one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl AgentRequest {
    /// Create a request that starts a new conversation
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            conversation_id: None,
        }
    }

    /// Create a request continuing an existing conversation
    pub fn with_conversation(question: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            conversation_id: Some(conversation_id.into()),
        }
    }
}

/// Thumbs up or down on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum FeedbackRating {
    Up,
    Down,
}

impl From<FeedbackRating> for i8 {
    fn from(rating: FeedbackRating) -> Self {
        match rating {
            FeedbackRating::Up => 1,
            FeedbackRating::Down => -1,
        }
    }
}

impl TryFrom<i8> for FeedbackRating {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FeedbackRating::Up),
            -1 => Ok(FeedbackRating::Down),
            other => Err(format!("rating must be 1 or -1, got {}", other)),
        }
    }
}

/// Body of a `POST /feedback` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRequest {
    pub message_id: i64,
    pub rating: FeedbackRating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FeedbackRequest {
    pub fn new(message_id: i64, rating: FeedbackRating) -> Self {
        Self {
            message_id,
            rating,
            comment: None,
        }
    }

    /// Attach a free-form comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Server acknowledgement for feedback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackAck {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_omits_conversation_id() {
        let request = AgentRequest::new("What is a borrow checker?");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"question":"What is a borrow checker?"}"#);
    }

    #[test]
    fn test_request_with_conversation() {
        let request = AgentRequest::with_conversation("And lifetimes?", "17");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["conversation_id"], "17");
        assert_eq!(json["question"], "And lifetimes?");
    }

    #[test]
    fn test_feedback_rating_serializes_as_number() {
        let request = FeedbackRequest::new(9, FeedbackRating::Down).with_comment("off topic");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["rating"], -1);
        assert_eq!(json["message_id"], 9);
        assert_eq!(json["comment"], "off topic");
    }

    #[test]
    fn test_feedback_rating_rejects_other_values() {
        let result = serde_json::from_str::<FeedbackRating>("0");
        assert!(result.is_err());
        let rating: FeedbackRating = serde_json::from_str("1").unwrap();
        assert_eq!(rating, FeedbackRating::Up);
    }
}
