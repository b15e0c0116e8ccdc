use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::command::{ToolCommand, DESTRUCTIVE_TOOLS};

/// A generated document produced by a tool, before the controller assigns it
/// an id and links it to the message that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactDraft {
    pub title: String,
    pub kind: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    pub artifact: Option<ArtifactDraft>,
}

impl ToolResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            artifact: None,
        }
    }

    pub fn with_artifact(content: impl Into<String>, artifact: ArtifactDraft) -> Self {
        Self {
            success: true,
            content: content.into(),
            artifact: Some(artifact),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            success: false,
            content: content.into(),
            artifact: None,
        }
    }
}

/// Executes named tools on behalf of the orchestrator.
///
/// Failures are reported through [`ToolResult::error`], not `Err`: the agent
/// loop feeds them back to the model as context and keeps running.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Whether `tool_id` is in the supported set for this conversation.
    fn supports(&self, tool_id: &str) -> bool;

    /// Destructive tools require interactive confirmation before running.
    fn is_destructive(&self, tool_id: &str) -> bool {
        DESTRUCTIVE_TOOLS.contains(&tool_id)
    }

    async fn execute(&self, command: &ToolCommand) -> ToolResult;
}

/// Interactive yes/no gate for destructive tool calls.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, title: &str, description: &str) -> bool;
}

/// Approves everything. For headless hosts and tests.
pub struct AutoApprove;

#[async_trait]
impl ConfirmationGate for AutoApprove {
    async fn confirm(&self, _title: &str, _description: &str) -> bool {
        true
    }
}
