use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use arbor_core::{AgentError, ReasoningTier, Role, SessionHandle, TranscriptMessage};
use arbor_llm::{ChunkHandler, ModelClient, ModelConfig};

use crate::events::{EventSink, TurnEvent};
use crate::orchestrator::{ContentSink, ToolOrchestrator};
use crate::prompts;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Initial,
    Critique,
    Verification,
}

impl StageKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Initial => "Initial Analysis",
            Self::Critique => "Self-Critique & Refinement",
            Self::Verification => "Iterative Verification",
        }
    }
}

/// Multi-stage refinement around a single orchestrator turn.
///
/// The initial stage is the full tool loop; critique (deep/expert tiers) and
/// verification (expert tier) are plain model calls over fixed prompts. Only
/// the last enabled stage streams to the visible sink; earlier stages surface
/// as [`TurnEvent::Thinking`] events.
pub struct ReasoningPipeline {
    orchestrator: ToolOrchestrator,
    model: Arc<dyn ModelClient>,
    tier: ReasoningTier,
}

impl ReasoningPipeline {
    pub fn new(
        orchestrator: ToolOrchestrator,
        model: Arc<dyn ModelClient>,
        tier: ReasoningTier,
    ) -> Self {
        Self {
            orchestrator,
            model,
            tier,
        }
    }

    pub fn tier(&self) -> ReasoningTier {
        self.tier
    }

    pub async fn run(
        &self,
        transcript: Vec<TranscriptMessage>,
        session: &SessionHandle,
        sink: &ContentSink,
        events: &EventSink,
    ) -> Result<String, AgentError> {
        let total =
            1 + u8::from(self.tier.uses_critique()) + u8::from(self.tier.uses_verification());
        let multi_stage = total > 1;

        // The critique/verification prompts restate the user's question.
        let query = transcript
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.clone())
            .unwrap_or_default();

        events.emit(TurnEvent::StageStarted {
            stage: StageKind::Initial,
            number: 1,
            total,
        });
        let initial = self
            .orchestrator
            .run(
                transcript,
                session,
                if multi_stage { None } else { Some(sink) },
                events,
            )
            .await?;
        if multi_stage {
            events.emit(TurnEvent::Thinking {
                stage: StageKind::Initial,
                content: initial.clone(),
            });
        }

        let mut best = initial;

        if self.tier.uses_critique() {
            let final_stage = !self.tier.uses_verification();
            events.emit(TurnEvent::StageStarted {
                stage: StageKind::Critique,
                number: 2,
                total,
            });
            best = self
                .stage_call(
                    prompts::CRITIQUE_REVIEWER_PROMPT,
                    prompts::self_critique_prompt(&query, &best),
                    ModelConfig {
                        temperature: 0.5,
                        max_tokens: 4096,
                    },
                    if final_stage { Some(sink) } else { None },
                    session,
                )
                .await?;
            if !final_stage {
                events.emit(TurnEvent::Thinking {
                    stage: StageKind::Critique,
                    content: best.clone(),
                });
            }
        }

        if self.tier.uses_verification() {
            events.emit(TurnEvent::StageStarted {
                stage: StageKind::Verification,
                number: total,
                total,
            });
            best = self
                .stage_call(
                    prompts::VERIFICATION_REVIEWER_PROMPT,
                    prompts::verification_prompt(&query, &best),
                    ModelConfig {
                        temperature: 0.7,
                        max_tokens: 6144,
                    },
                    Some(sink),
                    session,
                )
                .await?;
        }

        Ok(best)
    }

    /// One refinement call over a fixed two-message prompt.
    async fn stage_call(
        &self,
        system_prompt: &str,
        user_prompt: String,
        config: ModelConfig,
        sink: Option<&ContentSink>,
        session: &SessionHandle,
    ) -> Result<String, AgentError> {
        if session.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let messages = vec![
            TranscriptMessage::system(system_prompt),
            TranscriptMessage::user(user_prompt),
        ];

        let accumulated = Mutex::new(String::new());
        let forward = |delta: &str| {
            // Deltas arriving after the token fires must never stream.
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
            .complete(&messages, &config, handler, &session.cancel_token)
            .await;

        if session.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let text = result.map_err(|error| AgentError::Model(error.to_string()))?;
        if let Some(sink) = sink {
            sink(&text);
        }
        Ok(text)
    }
}
