//! Mock chat model for tests and examples.
//!
//! Returns scripted replies in order, repeating the last one once the script
//! is exhausted, so multi-round flows (regenerate loops) stay deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::WorkflowError;
use crate::llm::ChatModel;
use crate::message::Message;

/// Scripted chat model: replies come from a fixed list.
pub struct MockChat {
    replies: Vec<String>,
    calls: AtomicUsize,
}

impl MockChat {
    /// Always returns the same reply.
    pub fn fixed(reply: impl Into<String>) -> Self {
        Self {
            replies: vec![reply.into()],
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the replies in order; the last one repeats after the script runs out.
    pub fn scripted(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for MockChat {
    async fn complete(&self, _messages: &[Message]) -> Result<String, WorkflowError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .get(n)
            .or_else(|| self.replies.last())
            .cloned()
            .ok_or_else(|| WorkflowError::ExecutionFailed("mock chat has no replies".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: scripted replies come back in order, then the last repeats.
    #[tokio::test]
    async fn scripted_replies_in_order_then_repeat() {
        let chat = MockChat::scripted(["a", "b"]);
        assert_eq!(chat.complete(&[]).await.unwrap(), "a");
        assert_eq!(chat.complete(&[]).await.unwrap(), "b");
        assert_eq!(chat.complete(&[]).await.unwrap(), "b");
        assert_eq!(chat.calls(), 3);
    }

    /// **Scenario**: an empty script is an error, not a panic.
    #[tokio::test]
    async fn empty_script_errors() {
        let chat = MockChat::scripted(Vec::<String>::new());
        assert!(chat.complete(&[]).await.is_err());
    }
}
