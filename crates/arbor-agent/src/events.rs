use serde::Serialize;
use tokio::sync::mpsc;

use crate::reasoning::StageKind;
use crate::tools::ArtifactDraft;

/// Progress events surfaced to the host while a turn runs. The primary answer
/// flows through the content sink; these carry the rest (thinking stages,
/// tool progress, artifacts).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    StageStarted {
        stage: StageKind,
        number: u8,
        total: u8,
    },
    /// Output of a non-final reasoning stage, for optional display.
    Thinking {
        stage: StageKind,
        content: String,
    },
    ToolStarted {
        tool_id: String,
    },
    ToolCompleted {
        tool_id: String,
        success: bool,
    },
    ArtifactCreated {
        draft: ArtifactDraft,
    },
}

/// Optional fan-out of [`TurnEvent`]s. A closed or absent receiver never
/// fails a turn.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<TurnEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<TurnEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: TurnEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
