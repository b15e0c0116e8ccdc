//! Generation orchestration: the recursive tool loop and the optional
//! multi-stage reasoning wrapper around it.

pub mod command;
pub mod events;
pub mod orchestrator;
pub mod prompts;
pub mod reasoning;
pub mod tools;

pub use command::{parse_tool_command, ToolCallRecord, ToolCommand, DESTRUCTIVE_TOOLS};
pub use events::{EventSink, TurnEvent};
pub use orchestrator::{ContentSink, ToolOrchestrator};
pub use reasoning::{ReasoningPipeline, StageKind};
pub use tools::{ArtifactDraft, AutoApprove, ConfirmationGate, ToolExecutor, ToolResult};
