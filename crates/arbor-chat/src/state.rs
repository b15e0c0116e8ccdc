use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arbor_agent::ArtifactDraft;
use arbor_core::{MessageNode, MessageTree};

/// A generated document the host can open or export, linked to the assistant
/// message whose turn produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub id: Uuid,
    pub message_id: Uuid,
    pub title: String,
    pub kind: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn from_draft(draft: ArtifactDraft, message_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_id,
            title: draft.title,
            kind: draft.kind,
            content: draft.content,
            created_at: Utc::now(),
        }
    }
}

/// Everything the host observes about one conversation.
///
/// Serializes to the persistence blob (tree + current leaf + artifacts);
/// `is_loading` is transient and always deserializes as false.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatState {
    pub tree: MessageTree,
    pub current_leaf_id: Option<Uuid>,
    #[serde(skip)]
    pub is_loading: bool,
    pub artifacts: Vec<Artifact>,
}

/// Point-in-time copy handed to the host for rendering. `messages` is the
/// linear history of the current leaf in display order.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<MessageNode>,
    pub current_leaf_id: Option<Uuid>,
    pub is_loading: bool,
    pub artifacts: Vec<Artifact>,
    pub tree: MessageTree,
}
