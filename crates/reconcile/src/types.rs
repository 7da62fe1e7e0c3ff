#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, specta::Type,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    User,
}

/// One displayable message unit in the transcript.
///
/// `key` is the dedup key (trimmed, case-folded full text) the bubble was
/// registered under; `text` is the latest display text, which may be revised
/// in place on dedup hits. `streaming` marks an agent bubble whose reveal
/// animation has not finished; `transcribing` marks a user bubble whose
/// transcription is not yet final.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Bubble {
    pub id: String,
    pub role: Role,
    pub key: String,
    pub text: String,
    pub streaming: bool,
    pub transcribing: bool,
}

/// Complete snapshot of the transcript at a point in time, in bubble
/// creation order. This is the rendering contract: everything a UI layer
/// needs to draw one frame, whether that is a terminal tool or a test
/// assertion.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct TranscriptFrame {
    pub bubbles: Vec<Bubble>,
}

impl TranscriptFrame {
    pub fn by_role(&self, role: Role) -> impl Iterator<Item = &Bubble> {
        self.bubbles.iter().filter(move |b| b.role == role)
    }
}

/// Mutations the core pushes to the presentation surface. The collaborator
/// owns actual rendering; removal implies whatever exit transition the
/// surface uses.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(tag = "type")]
pub enum TranscriptEvent {
    #[serde(rename = "bubbleCreated")]
    BubbleCreated { bubble: Bubble },
    #[serde(rename = "bubbleUpdated")]
    BubbleUpdated { id: String, text: String },
    #[serde(rename = "bubbleRemoved")]
    BubbleRemoved { id: String },
    #[serde(rename = "revealStep")]
    RevealStep { id: String, shown: String },
    #[serde(rename = "revealFinished")]
    RevealFinished { id: String },
}
