#![allow(dead_code)]

//! Shared stub collaborators for orchestrator and pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use arbor_agent::{ConfirmationGate, ContentSink, ToolCommand, ToolExecutor, ToolResult};
use arbor_core::TranscriptMessage;
use arbor_llm::{ChunkHandler, ModelClient, ModelConfig, Result as ModelResult};

/// Replays a fixed list of responses, repeating the last one when the list
/// runs out. Records every transcript and whether streaming was requested.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    pub calls: AtomicUsize,
    pub transcripts: Mutex<Vec<Vec<TranscriptMessage>>>,
    pub streamed_flags: Mutex<Vec<bool>>,
}

impl ScriptedModel {
    pub fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
            streamed_flags: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        messages: &[TranscriptMessage],
        _config: &ModelConfig,
        on_chunk: Option<ChunkHandler<'_>>,
        _cancel: &CancellationToken,
    ) -> ModelResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcripts.lock().unwrap().push(messages.to_vec());
        self.streamed_flags.lock().unwrap().push(on_chunk.is_some());

        let response = {
            let mut queue = self.responses.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match queue.pop_front() {
                Some(next) => {
                    *last = Some(next.clone());
                    next
                }
                None => last.clone().unwrap_or_default(),
            }
        };

        if let Some(chunk) = on_chunk {
            // Stream in two halves to exercise accumulation.
            let middle = response.len() / 2;
            let (head, tail) = response.split_at(middle);
            if !head.is_empty() {
                chunk(head);
            }
            if !tail.is_empty() {
                chunk(tail);
            }
        }

        Ok(response)
    }
}

/// Issues a different tool command on every call, so loop detection never
/// triggers and only the depth bound can stop the turn.
pub struct DistinctCommandModel {
    pub calls: AtomicUsize,
}

impl DistinctCommandModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for DistinctCommandModel {
    async fn complete(
        &self,
        _messages: &[TranscriptMessage],
        _config: &ModelConfig,
        _on_chunk: Option<ChunkHandler<'_>>,
        _cancel: &CancellationToken,
    ) -> ModelResult<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("COMMAND: web-search query-{n}"))
    }
}

/// Cancels the turn's token mid-call, then still returns a response — the
/// in-flight-completion race the orchestrator must discard.
pub struct CancellingModel {
    pub response: String,
}

#[async_trait]
impl ModelClient for CancellingModel {
    async fn complete(
        &self,
        _messages: &[TranscriptMessage],
        _config: &ModelConfig,
        _on_chunk: Option<ChunkHandler<'_>>,
        cancel: &CancellationToken,
    ) -> ModelResult<String> {
        cancel.cancel();
        Ok(self.response.clone())
    }
}

/// Cancels the turn's token on its `cancel_on_call`-th call and then still
/// pushes a delta, the way a stale provider keeps streaming after the token
/// fires. Earlier calls answer normally.
pub struct StreamingAfterCancelModel {
    pub cancel_on_call: usize,
    pub response: String,
    pub calls: AtomicUsize,
}

impl StreamingAfterCancelModel {
    pub fn new(cancel_on_call: usize, response: &str) -> Arc<Self> {
        Arc::new(Self {
            cancel_on_call,
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ModelClient for StreamingAfterCancelModel {
    async fn complete(
        &self,
        _messages: &[TranscriptMessage],
        _config: &ModelConfig,
        on_chunk: Option<ChunkHandler<'_>>,
        cancel: &CancellationToken,
    ) -> ModelResult<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.cancel_on_call {
            cancel.cancel();
            if let Some(chunk) = on_chunk {
                chunk("stale delta");
            }
        }
        Ok(self.response.clone())
    }
}

pub const SUPPORTED_TOOLS: &[&str] = &[
    "web-search",
    "fetch-url",
    "summarize",
    "extract-entities",
    "generate-document",
];

/// Records executed commands; optionally fails every call with a fixed error.
pub struct StubTools {
    pub executed: Mutex<Vec<ToolCommand>>,
    pub fail_with: Option<String>,
}

impl StubTools {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            executed: Mutex::new(Vec::new()),
            fail_with: None,
        })
    }

    pub fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            executed: Mutex::new(Vec::new()),
            fail_with: Some(error.to_string()),
        })
    }

    pub fn executed_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }
}

#[async_trait]
impl ToolExecutor for StubTools {
    fn supports(&self, tool_id: &str) -> bool {
        SUPPORTED_TOOLS.contains(&tool_id)
    }

    async fn execute(&self, command: &ToolCommand) -> ToolResult {
        self.executed.lock().unwrap().push(command.clone());
        match &self.fail_with {
            Some(error) => ToolResult::error(error.clone()),
            None => ToolResult::ok(format!("results for {}", command.args)),
        }
    }
}

/// Declines every confirmation request.
pub struct DenyAll {
    pub asked: AtomicUsize,
}

impl DenyAll {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            asked: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ConfirmationGate for DenyAll {
    async fn confirm(&self, _title: &str, _description: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        false
    }
}

/// Content sink that keeps every value it was handed.
pub fn recording_sink() -> (ContentSink, Arc<Mutex<Vec<String>>>) {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&seen);
    let sink: ContentSink = Arc::new(move |text: &str| {
        writer.lock().unwrap().push(text.to_string());
    });
    (sink, seen)
}
