//! Question routing: pick the data source for a question.
//!
//! The router is the first oracle consulted for a query. Its label domain is
//! closed: anything outside `{vectorstore, web_search}` is rejected at this
//! boundary as a routing contract violation, before any node has side effects.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::WorkflowError;
use crate::llm::ChatModel;
use crate::message::Message;

/// The routing decision: indexed corpus retrieval or live web search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SourceLabel {
    /// Answer from the local indexed corpus.
    Vectorstore,
    /// Answer from a live web search.
    WebSearch,
}

impl SourceLabel {
    /// Wire form of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::Vectorstore => "vectorstore",
            SourceLabel::WebSearch => "web_search",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceLabel {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vectorstore" => Ok(SourceLabel::Vectorstore),
            "web_search" => Ok(SourceLabel::WebSearch),
            other => Err(WorkflowError::RoutingContract(format!(
                "unknown datasource label: '{other}' (expected vectorstore or web_search)"
            ))),
        }
    }
}

/// Routes a question to the most appropriate data source.
#[async_trait]
pub trait QuestionRouter: Send + Sync {
    /// Returns exactly one of the two source labels, or a routing contract
    /// error when the underlying oracle steps outside its domain.
    async fn route(&self, question: &str) -> Result<SourceLabel, WorkflowError>;
}

const DEFAULT_TOPICS: &[&str] = &[
    "finance and real estate",
    "library and research topics",
    "biology and microbiology",
    "literature and writing",
    "movies and entertainment",
    "animals and nature",
    "history and geography",
    "astronomy",
];

/// LLM-backed router: a system prompt enumerates the corpus topics and the
/// model answers with one of the two labels.
pub struct LlmRouter {
    chat: Arc<dyn ChatModel>,
    topics: Vec<String>,
}

impl LlmRouter {
    /// Creates a router over the default corpus topic list.
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self {
            chat,
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Replaces the topic list the corpus is described with.
    pub fn with_topics(mut self, topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    fn system_prompt(&self) -> String {
        let topic_lines = self
            .topics
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "You are an expert at routing a user question to either a vectorstore or web search.\n\n\
             The vectorstore contains information on the following topics:\n{topic_lines}\n\n\
             If the question is related to these topics, route it to the vectorstore. \
             Otherwise, use web search.\n\
             Answer with exactly one word: vectorstore or web_search."
        )
    }

    /// Lowercases and strips quoting/punctuation so "Web search." still parses,
    /// while anything semantically different still fails the contract.
    fn normalize(reply: &str) -> String {
        reply
            .trim()
            .to_lowercase()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .replace(' ', "_")
    }
}

#[async_trait]
impl QuestionRouter for LlmRouter {
    async fn route(&self, question: &str) -> Result<SourceLabel, WorkflowError> {
        let messages = [
            Message::system(self.system_prompt()),
            Message::user(question),
        ];
        let reply = self.chat.complete(&messages).await?;
        let label: SourceLabel = Self::normalize(&reply).parse()?;
        info!(label = %label, "routed question");
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChat;

    /// **Scenario**: the two valid labels parse; anything else is a contract error.
    #[test]
    fn source_label_parse() {
        assert_eq!("vectorstore".parse::<SourceLabel>().unwrap(), SourceLabel::Vectorstore);
        assert_eq!("web_search".parse::<SourceLabel>().unwrap(), SourceLabel::WebSearch);
        let err = "wikipedia".parse::<SourceLabel>().unwrap_err();
        assert!(matches!(err, WorkflowError::RoutingContract(_)));
        assert!(err.to_string().contains("wikipedia"));
    }

    /// **Scenario**: router tolerates casing, quotes, and a spaced variant.
    #[tokio::test]
    async fn llm_router_normalizes_reply() {
        for reply in ["vectorstore", " Vectorstore.", "\"web_search\"", "Web search"] {
            let router = LlmRouter::new(Arc::new(MockChat::fixed(reply)));
            assert!(router.route("q").await.is_ok(), "reply {reply:?} should parse");
        }
    }

    /// **Scenario**: an out-of-domain reply is a fatal routing contract error.
    #[tokio::test]
    async fn llm_router_rejects_out_of_domain_label() {
        let router = LlmRouter::new(Arc::new(MockChat::fixed("wikipedia")));
        let err = router.route("q").await.unwrap_err();
        assert!(matches!(err, WorkflowError::RoutingContract(_)));
    }

    /// **Scenario**: with_topics replaces the topic list in the system prompt.
    #[test]
    fn with_topics_rewrites_prompt() {
        let router =
            LlmRouter::new(Arc::new(MockChat::fixed("vectorstore"))).with_topics(["rust crates"]);
        let prompt = router.system_prompt();
        assert!(prompt.contains("- rust crates"));
        assert!(!prompt.contains("astronomy"));
    }
}
