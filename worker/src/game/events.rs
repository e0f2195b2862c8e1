use super::state::{ParticipantId, Phase, Role};
use serde::{Deserialize, Serialize};

/// Messages a participant sends to the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Sent on connect; admission already happened when the socket opened
    Join,
    /// The participant's one and only piece of text for this round
    Submit { content: String },
}

/// Messages the worker sends to participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Private admission notice for the new participant
    #[serde(rename_all = "camelCase")]
    Joined {
        participant_id: ParticipantId,
        role: Role,
        player_count: usize,
        phase: Phase,
    },
    /// Count/phase update broadcast to everyone in the session
    #[serde(rename_all = "camelCase")]
    State { player_count: usize, phase: Phase },
    /// Acknowledges the sender's submission
    Submitted,
    /// Both texts, paired by role
    Reveal { prompt: String, response: String },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
