//! Model-call abstraction.
//!
//! Concrete providers (HTTP/SSE clients, local runtimes) live outside this
//! workspace; the orchestration core only depends on this seam.

pub mod provider;

pub use provider::{ChunkHandler, ModelClient, ModelConfig, ModelError, Result};
