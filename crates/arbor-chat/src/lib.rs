//! Conversation façade: observable chat state plus the controller that turns
//! user input into tree mutations and generation turns.

pub mod commands;
pub mod controller;
pub mod state;

pub use commands::{parse_local_command, resolve_command_chain, LocalCommand};
pub use controller::{BranchDirection, ChatError, ConversationController};
pub use state::{Artifact, ChatSnapshot, ChatState};
