use crate::error::DebateError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MAX_ROUNDS: i64 = 3;

/// A debating persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Optimist,
    Skeptic,
}

impl Node {
    pub fn opponent(self) -> Self {
        match self {
            Node::Optimist => Node::Skeptic,
            Node::Skeptic => Node::Optimist,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Node::Optimist => "Optimist",
            Node::Skeptic => "Skeptic",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Node::Optimist => "optimist",
            Node::Skeptic => "skeptic",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DebateRequest {
    #[schemars(description = "The motion being debated. Interpolated verbatim into every turn.")]
    pub topic: String,
    #[schemars(description = "Number of optimist/skeptic rounds. Zero skips straight to completion.")]
    #[serde(default = "default_max_rounds")]
    pub max_rounds: i64,
}

fn default_max_rounds() -> i64 {
    DEFAULT_MAX_ROUNDS
}

impl DebateRequest {
    pub fn new(topic: impl Into<String>, max_rounds: i64) -> Self {
        Self {
            topic: topic.into(),
            max_rounds,
        }
    }

    pub fn validate(&self) -> Result<(), DebateError> {
        if self.topic.trim().is_empty() {
            return Err(DebateError::invalid("topic must not be empty"));
        }
        if self.max_rounds < 0 {
            return Err(DebateError::invalid(format!(
                "max_rounds must be zero or greater, got {}",
                self.max_rounds
            )));
        }
        Ok(())
    }
}

/// One frame of the debate stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    Status { text: String },
    Speaker { node: Node, text: String },
    Token { node: Node, text: String },
    SpeakerEnd { node: Node },
    Complete { text: String },
}

impl DebateEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DebateEvent::Status { .. } => "status",
            DebateEvent::Speaker { .. } => "speaker",
            DebateEvent::Token { .. } => "token",
            DebateEvent::SpeakerEnd { .. } => "speaker_end",
            DebateEvent::Complete { .. } => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DebateEvent::Complete { .. })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub message: String,
    pub version: String,
    pub schema: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub active_streams: usize,
    pub completed_streams: u64,
    pub disconnected_streams: u64,
    pub failed_streams: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_use_the_snake_case_wire_shape() {
        let end = DebateEvent::SpeakerEnd {
            node: Node::Skeptic,
        };
        assert_eq!(
            serde_json::to_value(&end).unwrap(),
            json!({"type": "speaker_end", "node": "skeptic"})
        );

        let token = DebateEvent::Token {
            node: Node::Optimist,
            text: "a".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&token).unwrap(),
            r#"{"type":"token","node":"optimist","text":"a"}"#
        );
    }

    #[test]
    fn request_defaults_to_three_rounds() {
        let request: DebateRequest = serde_json::from_value(json!({"topic": "tea"})).unwrap();
        assert_eq!(request.max_rounds, 3);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn request_rejects_fractional_rounds() {
        let parsed = serde_json::from_value::<DebateRequest>(json!({"topic": "tea", "max_rounds": 1.5}));
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_rejects_blank_topic_and_negative_rounds() {
        assert!(matches!(
            DebateRequest::new("   ", 1).validate(),
            Err(DebateError::InvalidArgument(_))
        ));
        assert!(matches!(
            DebateRequest::new("tea", -1).validate(),
            Err(DebateError::InvalidArgument(_))
        ));
        assert!(DebateRequest::new("tea", 0).validate().is_ok());
    }

    #[test]
    fn node_opponent_flips() {
        assert_eq!(Node::Optimist.opponent(), Node::Skeptic);
        assert_eq!(Node::Skeptic.opponent(), Node::Optimist);
        assert_eq!(Node::Skeptic.to_string(), "skeptic");
    }
}
