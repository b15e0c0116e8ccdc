use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A source reference attached to an assistant message after generation.
/// The core never interprets citations; they ride along for display/export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub id: String,
    pub title: String,
    pub url: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

/// A node in the conversation tree.
///
/// Assistant nodes start empty and are filled incrementally while the
/// response streams; metrics are attached once the turn completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageNode {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub parent_id: Option<Uuid>,
    /// Insertion order is meaningful: the last child marks the active branch.
    pub children_ids: Vec<Uuid>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl MessageNode {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            parent_id: None,
            children_ids: Vec::new(),
            timestamp: Utc::now(),
            response_time_ms: None,
            token_count: None,
            cost: None,
            citations: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Empty assistant node, filled in while streaming.
    pub fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, "")
    }

    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }
}

/// A flat transcript entry sent to the model-call collaborator.
///
/// Distinct from [`MessageNode`]: the orchestrator grows a working transcript
/// (tool results, denial notes) that never lands in the tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
}

impl TranscriptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&MessageNode> for TranscriptMessage {
    fn from(node: &MessageNode) -> Self {
        Self {
            role: node.role,
            content: node.content.clone(),
        }
    }
}
