use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use arbor_core::{AgentError, GenerationConfig, SessionHandle, TranscriptMessage};
use arbor_llm::{ChunkHandler, ModelClient, ModelConfig};

use crate::command::{parse_tool_command, ToolCallRecord, ToolCommand};
use crate::events::{EventSink, TurnEvent};
use crate::tools::{ConfirmationGate, ToolExecutor};

/// Receives the accumulated visible text for the current assistant message.
///
/// The sink is where the session guard lives: implementations must drop
/// writes once the owning session is no longer active.
pub type ContentSink = Arc<dyn Fn(&str) + Send + Sync>;

type TurnFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AgentError>> + Send + 'a>>;

/// The recursive agent loop: ask the model, maybe run a tool, feed the tool
/// result back, ask again — bounded by depth, a per-turn call cap, and
/// duplicate-call detection.
pub struct ToolOrchestrator {
    model: Arc<dyn ModelClient>,
    tools: Arc<dyn ToolExecutor>,
    gate: Arc<dyn ConfirmationGate>,
    config: GenerationConfig,
}

impl ToolOrchestrator {
    pub fn new(
        model: Arc<dyn ModelClient>,
        tools: Arc<dyn ToolExecutor>,
        gate: Arc<dyn ConfirmationGate>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            model,
            tools,
            gate,
            config,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run one top-level turn over `transcript`.
    ///
    /// Returns the final answer text. Guard limits (unsupported tool, call
    /// cap, loop, depth) end the turn with explicit error text in `Ok`;
    /// cancellation and model failures propagate as `Err` so the caller can
    /// distinguish silent stop from visible error.
    pub async fn run(
        &self,
        transcript: Vec<TranscriptMessage>,
        session: &SessionHandle,
        sink: Option<&ContentSink>,
        events: &EventSink,
    ) -> Result<String, AgentError> {
        let mut seen = HashSet::new();
        let mut calls_made = 0u32;
        self.run_at_depth(transcript, 0, &mut seen, &mut calls_made, session, sink, events)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    fn run_at_depth<'a>(
        &'a self,
        transcript: Vec<TranscriptMessage>,
        depth: u32,
        seen: &'a mut HashSet<ToolCallRecord>,
        calls_made: &'a mut u32,
        session: &'a SessionHandle,
        sink: Option<&'a ContentSink>,
        events: &'a EventSink,
    ) -> TurnFuture<'a> {
        Box::pin(async move {
            if session.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            if depth > self.config.max_depth() {
                tracing::warn!(
                    session = %session.id,
                    depth,
                    "ToolOrchestrator: recursion depth exceeded"
                );
                return Ok(AgentError::RecursionDepthExceeded.notice_text());
            }

            let response = self.call_model(&transcript, session, sink).await?;

            let Some(command) = parse_tool_command(&response) else {
                // No tool invocation: this is the final answer.
                return Ok(response);
            };

            tracing::debug!(
                session = %session.id,
                tool_id = %command.tool_id,
                depth,
                calls_made = *calls_made,
                "ToolOrchestrator: tool command parsed"
            );

            if !self.tools.supports(&command.tool_id) {
                return Ok(AgentError::UnsupportedTool(command.tool_id).notice_text());
            }

            if *calls_made >= self.config.max_tool_calls {
                return Ok(
                    AgentError::ToolCallLimitExceeded(self.config.max_tool_calls).notice_text(),
                );
            }

            if !seen.insert(ToolCallRecord::from(&command)) {
                // The model repeated an identical call; without this guard it
                // could spin until the depth limit on every turn.
                tracing::warn!(
                    session = %session.id,
                    tool_id = %command.tool_id,
                    "ToolOrchestrator: duplicate tool call, stopping"
                );
                return Ok(AgentError::ToolLoopDetected {
                    tool_id: command.tool_id,
                }
                .notice_text());
            }
            *calls_made += 1;

            if self.tools.is_destructive(&command.tool_id) {
                let approved = self
                    .gate
                    .confirm(
                        "Execute Tool?",
                        &format!(
                            "The assistant wants to run '{}'. This action may create or modify documents.",
                            command.tool_id
                        ),
                    )
                    .await;
                if session.is_cancelled() {
                    return Err(AgentError::Cancelled);
                }
                if !approved {
                    // Let the model respond to the denial instead of stalling.
                    let mut next = transcript;
                    next.push(TranscriptMessage::assistant(&response));
                    next.push(TranscriptMessage::system(format!(
                        "Tool Execution Denied: the user cancelled execution of {}.",
                        command.tool_id
                    )));
                    return self
                        .run_at_depth(next, depth + 1, seen, calls_made, session, sink, events)
                        .await;
                }
            }

            let tool_output = self.execute_tool(&command, session, sink, events).await?;

            let mut next = transcript;
            next.push(TranscriptMessage::assistant(&response));
            next.push(TranscriptMessage::system(format!(
                "Tool Output for {}:\n{}\n\nBased on this output, provide the final answer to the user.",
                command.tool_id, tool_output
            )));

            self.run_at_depth(next, depth + 1, seen, calls_made, session, sink, events)
                .await
        })
    }

    /// One model call, streaming accumulated text into the sink as it grows.
    async fn call_model(
        &self,
        transcript: &[TranscriptMessage],
        session: &SessionHandle,
        sink: Option<&ContentSink>,
    ) -> Result<String, AgentError> {
        let accumulated = Mutex::new(String::new());
        let forward = |delta: &str| {
            // A provider may keep emitting after the token fires; those
            // deltas must never become visible.
            if session.is_cancelled() {
                return;
            }
            if let Some(sink) = sink {
                let mut text = accumulated.lock().expect("chunk accumulator poisoned");
                text.push_str(delta);
                sink(&text);
            }
        };
        let handler: Option<ChunkHandler<'_>> = match sink {
            Some(_) => Some(&forward),
            None => None,
        };

        let result = self
            .model
            .complete(
                transcript,
                &ModelConfig::default(),
                handler,
                &session.cancel_token,
            )
            .await;

        // Cancellation can land mid-flight; it wins over whatever the
        // provider returned.
        if session.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let response = result.map_err(|error| AgentError::Model(error.to_string()))?;
        if let Some(sink) = sink {
            sink(&response);
        }
        Ok(response)
    }

    /// Execute one approved tool call. Tool failures come back as transcript
    /// text, never as `Err`, so the model can recover.
    async fn execute_tool(
        &self,
        command: &ToolCommand,
        session: &SessionHandle,
        sink: Option<&ContentSink>,
        events: &EventSink,
    ) -> Result<String, AgentError> {
        events.emit(TurnEvent::ToolStarted {
            tool_id: command.tool_id.clone(),
        });
        if let Some(sink) = sink {
            // Transient placeholder while the tool runs.
            sink(&format!("[Executing tool: {}...]", command.tool_id));
        }

        let result = self.tools.execute(command).await;
        if session.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        events.emit(TurnEvent::ToolCompleted {
            tool_id: command.tool_id.clone(),
            success: result.success,
        });
        if let Some(draft) = result.artifact.clone() {
            events.emit(TurnEvent::ArtifactCreated { draft });
        }

        tracing::info!(
            session = %session.id,
            tool_id = %command.tool_id,
            success = result.success,
            output_len = result.content.len(),
            "ToolOrchestrator: tool executed"
        );

        Ok(if result.success {
            result.content
        } else {
            format!("Tool Error: {}", result.content)
        })
    }
}
