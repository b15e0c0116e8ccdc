use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use arbor_agent::{
    ConfirmationGate, ContentSink, EventSink, ReasoningPipeline, ToolCommand, ToolExecutor,
    ToolOrchestrator, TurnEvent,
};
use arbor_core::{
    estimate_cost, estimate_tokens, AgentError, GenerationConfig, MessageNode, Role,
    SessionHandle, SessionRegistry, TranscriptMessage, TreeError,
};
use arbor_llm::ModelClient;

use crate::commands::{parse_local_command, resolve_command_chain, LocalCommand};
use crate::state::{Artifact, ChatSnapshot, ChatState};

/// Minimum interval between tree writes while a response streams. The final
/// text is always applied regardless.
const STREAM_WRITE_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChatError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Expected a {expected} message, found {found:?}")]
    RoleMismatch { expected: &'static str, found: Role },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchDirection {
    Prev,
    Next,
}

/// Top-level façade over one conversation.
///
/// Owns the observable [`ChatState`] and the single-session registry; every
/// user action flows through here. State is behind a `std::sync::Mutex` that
/// is never held across an await, so streaming writes from the sink cannot
/// deadlock against the turn driver.
pub struct ConversationController {
    state: Arc<Mutex<ChatState>>,
    sessions: Arc<SessionRegistry>,
    pipeline: ReasoningPipeline,
    tools: Arc<dyn ToolExecutor>,
    events: EventSink,
    config: GenerationConfig,
}

impl ConversationController {
    pub fn new(
        model: Arc<dyn ModelClient>,
        tools: Arc<dyn ToolExecutor>,
        gate: Arc<dyn ConfirmationGate>,
        config: GenerationConfig,
        events: EventSink,
    ) -> Self {
        let orchestrator =
            ToolOrchestrator::new(model.clone(), tools.clone(), gate, config.clone());
        let pipeline = ReasoningPipeline::new(orchestrator, model, config.reasoning_tier);
        Self {
            state: Arc::new(Mutex::new(ChatState::default())),
            sessions: Arc::new(SessionRegistry::new()),
            pipeline,
            tools,
            events,
            config,
        }
    }

    /// Handle one user input end to end. Returns the id of the new assistant
    /// node once the turn settles.
    ///
    /// Inline `(/tool args)` groups are resolved first; if what remains is
    /// itself a `/command`, its tool runs directly and no generation session
    /// is started. Otherwise the resolved text becomes a user node, a
    /// placeholder assistant node is appended, and a full pipeline turn fills
    /// it in.
    pub async fn send_message(&self, text: &str) -> Result<Uuid, ChatError> {
        let resolved = resolve_command_chain(text, self.tools.as_ref()).await;

        if let Some(command) = parse_local_command(&resolved) {
            return self.run_local_command(&resolved, command).await;
        }

        let (assistant_id, transcript) = {
            let mut state = self.lock_state();
            let parent_id = state.current_leaf_id;
            let user_id = state.tree.add_child(parent_id, MessageNode::user(&resolved))?;
            let transcript = transcript_for(&state, user_id)?;
            let assistant_id = state
                .tree
                .add_child(Some(user_id), MessageNode::assistant_placeholder())?;
            state.current_leaf_id = Some(assistant_id);
            state.is_loading = true;
            (assistant_id, transcript)
        };

        self.run_turn(assistant_id, transcript).await;
        Ok(assistant_id)
    }

    /// Fork a new assistant sibling under the same user message and run a
    /// fresh turn into it. The previous answer stays reachable as a branch.
    pub async fn regenerate(&self, message_id: Uuid) -> Result<Uuid, ChatError> {
        let (assistant_id, transcript) = {
            let mut state = self.lock_state();
            let node = state
                .tree
                .get(message_id)
                .ok_or(TreeError::NodeNotFound(message_id))?;
            if node.role != Role::Assistant {
                return Err(ChatError::RoleMismatch {
                    expected: "assistant",
                    found: node.role,
                });
            }

            let parent_id = node.parent_id;
            let transcript = match parent_id {
                Some(parent_id) => transcript_for(&state, parent_id)?,
                None => Vec::new(),
            };
            let assistant_id = state
                .tree
                .add_child(parent_id, MessageNode::assistant_placeholder())?;
            state.current_leaf_id = Some(assistant_id);
            state.is_loading = true;
            (assistant_id, transcript)
        };

        self.run_turn(assistant_id, transcript).await;
        Ok(assistant_id)
    }

    /// Replace a user message by forking: a new user sibling carries the
    /// edited text, gets its own placeholder, and a turn runs from there.
    pub async fn edit_message(&self, message_id: Uuid, new_text: &str) -> Result<Uuid, ChatError> {
        let (assistant_id, transcript) = {
            let mut state = self.lock_state();
            let node = state
                .tree
                .get(message_id)
                .ok_or(TreeError::NodeNotFound(message_id))?;
            if node.role != Role::User {
                return Err(ChatError::RoleMismatch {
                    expected: "user",
                    found: node.role,
                });
            }

            let parent_id = node.parent_id;
            let user_id = state.tree.add_child(parent_id, MessageNode::user(new_text))?;
            let transcript = transcript_for(&state, user_id)?;
            let assistant_id = state
                .tree
                .add_child(Some(user_id), MessageNode::assistant_placeholder())?;
            state.current_leaf_id = Some(assistant_id);
            state.is_loading = true;
            (assistant_id, transcript)
        };

        self.run_turn(assistant_id, transcript).await;
        Ok(assistant_id)
    }

    /// Move to the previous/next sibling of `message_id` and land on that
    /// branch's current leaf. At either end this is a no-op, so repeated
    /// switches are idempotent.
    pub fn switch_branch(
        &self,
        message_id: Uuid,
        direction: BranchDirection,
    ) -> Result<Uuid, ChatError> {
        let mut state = self.lock_state();
        let siblings = state.tree.siblings(message_id)?;
        let index = siblings
            .iter()
            .position(|id| *id == message_id)
            .ok_or(TreeError::NodeNotFound(message_id))?;

        let target = match direction {
            BranchDirection::Prev if index > 0 => siblings[index - 1],
            BranchDirection::Next if index + 1 < siblings.len() => siblings[index + 1],
            _ => message_id,
        };

        let leaf = state.tree.latest_leaf_from(target)?;
        state.current_leaf_id = Some(leaf);
        Ok(leaf)
    }

    /// Jump directly to the branch containing `node_id`.
    pub fn select_node(&self, node_id: Uuid) -> Result<Uuid, ChatError> {
        let mut state = self.lock_state();
        let leaf = state.tree.latest_leaf_from(node_id)?;
        state.current_leaf_id = Some(leaf);
        Ok(leaf)
    }

    /// Cooperatively stop the in-flight turn, if any. The turn unwinds on its
    /// own and leaves whatever content already streamed in place.
    pub fn cancel(&self) {
        self.sessions.cancel_active();
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.lock_state();
        let messages = match state.current_leaf_id {
            Some(leaf) => state
                .tree
                .linear_history(leaf)
                .map(|nodes| nodes.into_iter().cloned().collect())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        ChatSnapshot {
            messages,
            current_leaf_id: state.current_leaf_id,
            is_loading: state.is_loading,
            artifacts: state.artifacts.clone(),
            tree: state.tree.clone(),
        }
    }

    /// Direct tool execution for a whole-message `/command`. No session, no
    /// model call; the result lands in an assistant node immediately.
    async fn run_local_command(
        &self,
        raw_text: &str,
        command: LocalCommand,
    ) -> Result<Uuid, ChatError> {
        let assistant_id = {
            let mut state = self.lock_state();
            let parent_id = state.current_leaf_id;
            let user_id = state.tree.add_child(parent_id, MessageNode::user(raw_text))?;
            let assistant_id = state
                .tree
                .add_child(Some(user_id), MessageNode::assistant_placeholder())?;
            state.current_leaf_id = Some(assistant_id);
            state.is_loading = true;
            assistant_id
        };

        let tool_command = ToolCommand {
            tool_id: command.tool_id,
            args: command.args,
        };

        let (content, artifact) = if !self.tools.supports(&tool_command.tool_id) {
            (
                AgentError::UnsupportedTool(tool_command.tool_id.clone()).notice_text(),
                None,
            )
        } else {
            self.events.emit(TurnEvent::ToolStarted {
                tool_id: tool_command.tool_id.clone(),
            });
            let result = self.tools.execute(&tool_command).await;
            self.events.emit(TurnEvent::ToolCompleted {
                tool_id: tool_command.tool_id.clone(),
                success: result.success,
            });
            if result.success {
                (result.content, result.artifact)
            } else {
                (format!("Tool Error: {}", result.content), None)
            }
        };

        let mut state = self.lock_state();
        // A newer turn may have moved the leaf while the tool ran; its
        // loading flag and branch are not ours to touch anymore.
        if state.current_leaf_id != Some(assistant_id) {
            tracing::debug!(
                node = %assistant_id,
                tool_id = %tool_command.tool_id,
                "ConversationController: local command superseded, dropping result"
            );
            return Ok(assistant_id);
        }
        if let Some(node) = state.tree.get_mut(assistant_id) {
            node.content = content;
        }
        if let Some(draft) = artifact {
            let artifact = Artifact::from_draft(draft.clone(), assistant_id);
            state.artifacts.push(artifact);
            self.events.emit(TurnEvent::ArtifactCreated { draft });
        }
        state.is_loading = false;

        tracing::info!(
            node = %assistant_id,
            tool_id = %tool_command.tool_id,
            "ConversationController: local command completed"
        );
        Ok(assistant_id)
    }

    /// Drive one generation turn into the placeholder at `assistant_id`.
    async fn run_turn(&self, assistant_id: Uuid, transcript: Vec<TranscriptMessage>) {
        let session = self.sessions.begin();
        let started = Instant::now();
        tracing::info!(
            session = %session.id,
            node = %assistant_id,
            transcript_len = transcript.len(),
            "ConversationController: turn started"
        );

        let sink = self.content_sink(assistant_id, &session);

        // Turn events pass through a private channel so artifacts can be
        // recorded in state before the host sees them.
        let (tx, rx) = mpsc::unbounded_channel();
        let turn_events = EventSink::new(tx);
        let forwarder = self.spawn_event_forwarder(rx, assistant_id, session.id);

        let result = self.pipeline.run(transcript, &session, &sink, &turn_events).await;

        drop(turn_events);
        let _ = forwarder.await;

        self.finish_turn(assistant_id, session.id, started.elapsed(), result);
    }

    /// Session-guarded, write-coalescing sink for streamed content.
    ///
    /// Checks the cancel token as well as registry activity: after a user
    /// `cancel()` the session stays registered until the turn unwinds, and a
    /// provider that keeps streaming in that window must not touch the tree.
    fn content_sink(&self, assistant_id: Uuid, session: &SessionHandle) -> ContentSink {
        let state = Arc::clone(&self.state);
        let sessions = Arc::clone(&self.sessions);
        let session = session.clone();
        let last_write: Mutex<Option<Instant>> = Mutex::new(None);

        Arc::new(move |text: &str| {
            if session.is_cancelled() || !sessions.is_active(session.id) {
                return;
            }
            {
                let mut last = last_write.lock().expect("stream throttle poisoned");
                if matches!(*last, Some(at) if at.elapsed() < STREAM_WRITE_INTERVAL) {
                    return;
                }
                *last = Some(Instant::now());
            }
            let mut state = state.lock().expect("chat state poisoned");
            if let Some(node) = state.tree.get_mut(assistant_id) {
                node.content = text.to_string();
            }
        })
    }

    fn spawn_event_forwarder(
        &self,
        mut rx: mpsc::UnboundedReceiver<TurnEvent>,
        assistant_id: Uuid,
        session_id: Uuid,
    ) -> tokio::task::JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let sessions = Arc::clone(&self.sessions);
        let outward = self.events.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let TurnEvent::ArtifactCreated { draft } = &event {
                    if sessions.is_active(session_id) {
                        let artifact = Artifact::from_draft(draft.clone(), assistant_id);
                        state
                            .lock()
                            .expect("chat state poisoned")
                            .artifacts
                            .push(artifact);
                    }
                }
                outward.emit(event);
            }
        })
    }

    /// Merge the turn's outcome into the tree, but only if this session is
    /// still the active one. A superseded turn must not touch anything.
    fn finish_turn(
        &self,
        assistant_id: Uuid,
        session_id: Uuid,
        elapsed: Duration,
        result: Result<String, AgentError>,
    ) {
        match result {
            Ok(text) => {
                if self.sessions.complete(session_id) {
                    let mut state = self.lock_state();
                    if let Some(node) = state.tree.get_mut(assistant_id) {
                        let tokens = estimate_tokens(&text);
                        node.content = text;
                        node.response_time_ms = Some(elapsed.as_millis() as u64);
                        node.token_count = Some(tokens);
                        node.cost = Some(estimate_cost(tokens, &self.config.pricing, true));
                    }
                    state.is_loading = false;
                    tracing::info!(
                        session = %session_id,
                        node = %assistant_id,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "ConversationController: turn completed"
                    );
                }
            }
            Err(AgentError::Cancelled) => {
                // Silent stop: partial streamed content stays as-is.
                if self.sessions.complete(session_id) {
                    self.lock_state().is_loading = false;
                    tracing::info!(
                        session = %session_id,
                        "ConversationController: turn cancelled"
                    );
                }
            }
            Err(error) => {
                if self.sessions.complete(session_id) {
                    let mut state = self.lock_state();
                    if let Some(node) = state.tree.get_mut(assistant_id) {
                        node.content = error.notice_text();
                    }
                    state.is_loading = false;
                    tracing::error!(
                        session = %session_id,
                        node = %assistant_id,
                        error = %error,
                        "ConversationController: turn failed"
                    );
                }
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().expect("chat state poisoned")
    }
}

/// Flatten the history ending at `leaf_id` into a model transcript.
fn transcript_for(state: &ChatState, leaf_id: Uuid) -> Result<Vec<TranscriptMessage>, TreeError> {
    Ok(state
        .tree
        .linear_history(leaf_id)?
        .into_iter()
        .map(TranscriptMessage::from)
        .collect())
}
