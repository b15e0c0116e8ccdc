use thiserror::Error;

/// Failure taxonomy for one generation turn.
///
/// The four guard variants terminate the agent loop but are shown to the user
/// as explicit in-transcript text rather than raised to the controller.
/// `Cancelled` must surface no error at all; `Model` is a visible failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Cancelled")]
    Cancelled,

    #[error("Unsupported tool: {0}")]
    UnsupportedTool(String),

    #[error("Tool call limit exceeded ({0} calls this turn)")]
    ToolCallLimitExceeded(u32),

    #[error("Tool loop detected: '{tool_id}' was already called with the same arguments")]
    ToolLoopDetected { tool_id: String },

    #[error("Maximum tool recursion depth reached")]
    RecursionDepthExceeded,

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Model call failed: {0}")]
    Model(String),
}

impl AgentError {
    /// The in-transcript text shown when a guard ends the turn.
    pub fn notice_text(&self) -> String {
        format!("Error: {self}")
    }
}
