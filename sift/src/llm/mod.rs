//! Chat model abstraction shared by the LLM-backed collaborators.
//!
//! The router, the three graders, and the generator each assemble a prompt and
//! need one completion back; this module defines that minimal contract and its
//! implementations: `OpenAiChat` (real API) and `MockChat` (scripted, for
//! tests and examples).

mod mock;
mod openai;

pub use mock::MockChat;
pub use openai::OpenAiChat;

use async_trait::async_trait;

use crate::error::WorkflowError;
use crate::message::Message;

/// Chat model: given messages, returns the assistant reply text.
///
/// Implementations must be `Send + Sync`; collaborators share one client via
/// `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One completion: read messages, return the assistant reply.
    async fn complete(&self, messages: &[Message]) -> Result<String, WorkflowError>;
}
