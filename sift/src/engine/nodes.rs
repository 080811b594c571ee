//! The five workflow nodes.
//!
//! Each node reads and writes a fixed slice of `RagState` and makes at most
//! one collaborator call (`grade_documents` makes one per passage). All nodes
//! return `Next::Continue`; branching lives in the conditional edges.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::WorkflowError;
use crate::generate::Generator;
use crate::grade::Grader;
use crate::graph::{Next, Node};
use crate::retrieve::Retriever;
use crate::search::WebSearcher;
use crate::state::RagState;

/// Fetches ranked corpus passages for the question.
pub struct RetrieveNode {
    retriever: Arc<dyn Retriever>,
}

impl RetrieveNode {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Node<RagState> for RetrieveNode {
    fn id(&self) -> &str {
        "retrieve"
    }

    async fn run(&self, state: RagState) -> Result<(RagState, Next), WorkflowError> {
        info!("retrieving documents");
        let documents = self.retriever.retrieve(&state.question).await?;
        debug!(count = documents.len(), "retrieved documents");
        Ok((RagState { documents, ..state }, Next::Continue))
    }
}

/// Replaces the evidence with one synthesized web passage.
pub struct WebSearchNode {
    searcher: Arc<dyn WebSearcher>,
}

impl WebSearchNode {
    pub fn new(searcher: Arc<dyn WebSearcher>) -> Self {
        Self { searcher }
    }
}

#[async_trait]
impl Node<RagState> for WebSearchNode {
    fn id(&self) -> &str {
        "web_search"
    }

    async fn run(&self, state: RagState) -> Result<(RagState, Next), WorkflowError> {
        info!("searching the web");
        let passage = self.searcher.search(&state.question).await;
        Ok((
            RagState {
                documents: vec![passage],
                ..state
            },
            Next::Continue,
        ))
    }
}

/// Filters the evidence to passages the relevance grader affirms, preserving
/// their relative order. An empty result is valid and drives reformulation.
pub struct GradeDocumentsNode {
    relevance: Arc<dyn Grader>,
}

impl GradeDocumentsNode {
    pub fn new(relevance: Arc<dyn Grader>) -> Self {
        Self { relevance }
    }
}

#[async_trait]
impl Node<RagState> for GradeDocumentsNode {
    fn id(&self) -> &str {
        "grade_documents"
    }

    async fn run(&self, state: RagState) -> Result<(RagState, Next), WorkflowError> {
        info!("checking document relevance to question");
        let mut kept = Vec::new();
        for doc in &state.documents {
            if self
                .relevance
                .grade(&state.question, &doc.content)
                .await?
                .is_yes()
            {
                debug!("document relevant");
                kept.push(doc.clone());
            } else {
                debug!("document not relevant");
            }
        }
        info!(kept = kept.len(), total = state.documents.len(), "graded documents");
        Ok((
            RagState {
                documents: kept,
                ..state
            },
            Next::Continue,
        ))
    }
}

/// Produces (or reproduces) the answer from the current evidence.
pub struct GenerateNode {
    generator: Arc<dyn Generator>,
}

impl GenerateNode {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Node<RagState> for GenerateNode {
    fn id(&self) -> &str {
        "generate"
    }

    async fn run(&self, state: RagState) -> Result<(RagState, Next), WorkflowError> {
        info!("generating answer");
        let generation = self
            .generator
            .generate(&state.question, &state.documents)
            .await?;
        Ok((
            RagState {
                generation: Some(generation),
                ..state
            },
            Next::Continue,
        ))
    }
}

/// Pure reformulation step: wraps the current question in a clarifying
/// instruction and spends one unit of the retry budget. Repeated transforms
/// wrap the already-wrapped question, so the instruction compounds.
pub struct TransformQueryNode;

#[async_trait]
impl Node<RagState> for TransformQueryNode {
    fn id(&self) -> &str {
        "transform_query"
    }

    async fn run(&self, state: RagState) -> Result<(RagState, Next), WorkflowError> {
        let retry_count = state.retry_count + 1;
        let question = format!("Please provide more details about: {}", state.question);
        info!(retry_count, "transformed query");
        Ok((
            RagState {
                question,
                retry_count,
                ..state
            },
            Next::Continue,
        ))
    }
}
