use crate::common_derives;

/// Participant identities carrying this prefix belong to the agent. The
/// room backend names the agent participant `agent-<suffix>`, so a prefix
/// match is the identity contract, not an exact compare.
pub const AGENT_IDENTITY_PREFIX: &str = "agent";

pub fn is_agent_identity(identity: &str) -> bool {
    identity.starts_with(AGENT_IDENTITY_PREFIX)
}

common_derives! {
    /// One incremental speech-to-text unit from the room's transcription
    /// stream. Immutable once received; `final` marks the last revision of
    /// this stretch of speech.
    pub struct TranscriptionSegment {
        pub text: String,
        #[serde(rename = "final")]
        pub is_final: bool,
        #[serde(default)]
        pub sender_identity: Option<String>,
        #[serde(default)]
        pub participant_id: Option<String>,
        #[serde(default)]
        pub language: Option<String>,
    }
}

impl TranscriptionSegment {
    /// Best-effort speaker attribution key. Prefers the track-level
    /// participant id over the sender identity; either may be absent or
    /// wrong under overlapping speech.
    pub fn speaker_key(&self) -> &str {
        self.participant_id
            .as_deref()
            .or(self.sender_identity.as_deref())
            .unwrap_or("unknown")
    }

    pub fn is_from_agent_identity(&self) -> bool {
        self.sender_identity.as_deref().is_some_and(is_agent_identity)
    }
}

common_derives! {
    /// Everything the room delivers to the transcript layer, in arrival
    /// order. Active speaker changes arrive as their own event and are
    /// cached by the consumer for use at classification time.
    #[serde(tag = "type")]
    pub enum RoomEvent {
        #[serde(rename = "transcription")]
        Transcription { segments: Vec<TranscriptionSegment> },
        #[serde(rename = "activeSpeakers")]
        ActiveSpeakers { identities: Vec<String> },
        #[serde(rename = "chat")]
        Chat {
            #[serde(default)]
            identity: Option<String>,
            text: String,
        },
        #[serde(rename = "data")]
        Data {
            #[serde(default)]
            identity: Option<String>,
            payload: Vec<u8>,
        },
        #[serde(rename = "disconnected")]
        Disconnected,
    }
}

common_derives! {
    /// Reliable-data fallback envelope. The room's data channel carries
    /// JSON `{ "type": "message", "text": ... }` when the text stream API
    /// is unavailable.
    pub struct DataMessage {
        #[serde(rename = "type")]
        pub kind: String,
        pub text: String,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataMessageError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unsupported payload type: {0}")]
    UnsupportedType(String),
}

impl DataMessage {
    pub fn from_payload(payload: &[u8]) -> Result<Self, DataMessageError> {
        let message: DataMessage = serde_json::from_slice(payload)?;
        if message.kind != "message" {
            return Err(DataMessageError::UnsupportedType(message.kind));
        }
        Ok(message)
    }
}
