//! Query state and evidence types for the adaptive retrieval graph.
//!
//! `RagState` is created fresh per query, owned exclusively by one in-flight
//! execution, and discarded when it terminates. Nodes replace `documents`
//! wholesale; only `transform_query` touches `retry_count`.

use serde::{Deserialize, Serialize};

/// Where a passage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassageOrigin {
    /// Retrieved from the local indexed corpus.
    Corpus,
    /// Synthesized from a live web search.
    Web,
}

/// One unit of evidence: text content plus an origin tag.
///
/// Created by the retriever or web searcher, read (never mutated) by graders
/// and the generator, and dropped with the state at the end of the execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text.
    pub content: String,
    /// Corpus vs. web origin.
    pub origin: PassageOrigin,
}

impl Passage {
    /// Creates a corpus-origin passage.
    pub fn corpus(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            origin: PassageOrigin::Corpus,
        }
    }

    /// Creates a web-origin passage.
    pub fn web(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            origin: PassageOrigin::Web,
        }
    }
}

/// Joins passage contents with a blank line, the context format the generator
/// and the groundedness grader both consume.
pub fn join_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// State for one adaptive retrieval execution.
///
/// Satisfies `Clone + Send + Sync + Debug + 'static` for use with
/// `Node<RagState>` and `StateGraph<RagState>`.
///
/// Invariants upheld by the nodes:
/// - `retry_count` never decreases within one execution; it is incremented
///   only by the query-transform step.
/// - `documents` is set (possibly empty) once retrieval or web search has run.
/// - `generation` is only inspected by branch predicates after the generate
///   step has run at least once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagState {
    /// The question being answered. Rewritten in place by the query-transform
    /// step; the wrapping compounds across repeated transforms.
    pub question: String,
    /// Current evidence set. Replaced wholesale by retrieve, web_search, and
    /// grade_documents (filtering).
    pub documents: Vec<Passage>,
    /// Current answer; absent until generate runs, overwritten on regenerate.
    pub generation: Option<String>,
    /// Reformulation attempts so far; bounds the "not useful" feedback loop.
    #[serde(default)]
    pub retry_count: u32,
}

impl RagState {
    /// Creates the entry state for a query.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            documents: vec![],
            generation: None,
            retry_count: 0,
        }
    }
}
