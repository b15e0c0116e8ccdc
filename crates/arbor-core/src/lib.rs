//! Core data model for the branching chat client.
//!
//! Provides the message tree, generation sessions, shared configuration,
//! and the error taxonomy used by the orchestration layers.

pub mod config;
pub mod error;
pub mod message;
pub mod metrics;
pub mod session;
pub mod tree;

pub use config::{GenerationConfig, Pricing, ReasoningTier};
pub use error::AgentError;
pub use message::{Citation, MessageNode, Role, TranscriptMessage};
pub use metrics::{estimate_cost, estimate_tokens};
pub use session::{SessionHandle, SessionRegistry};
pub use tree::{MessageTree, TreeError};
