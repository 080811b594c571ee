//! Answer generation from a question and its evidence.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WorkflowError;
use crate::llm::ChatModel;
use crate::message::Message;
use crate::state::{join_passages, Passage};

/// Produces an answer from a question and supporting passages.
///
/// Empty output on success is a valid (low-quality) answer, not a failure; the
/// adequacy grader is what judges answer quality.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, question: &str, passages: &[Passage]) -> Result<String, WorkflowError>;
}

/// LLM-backed generator: joins passage contents with a blank line as context
/// and prompts for an answer.
pub struct ContextAnswerer {
    chat: Arc<dyn ChatModel>,
}

impl ContextAnswerer {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    fn prompt(question: &str, context: &str) -> String {
        format!(
            "You are a helpful assistant that answers questions based on the following context.\n\
             Use the provided context to answer the question.\n\n\
             Context: {context}\n\
             Question: {question}\n\
             Answer:"
        )
    }
}

#[async_trait]
impl Generator for ContextAnswerer {
    async fn generate(&self, question: &str, passages: &[Passage]) -> Result<String, WorkflowError> {
        let context = join_passages(passages);
        let messages = [Message::user(Self::prompt(question, &context))];
        self.chat.complete(&messages).await
    }
}
