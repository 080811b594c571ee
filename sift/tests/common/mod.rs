//! Shared test doubles: scripted collaborators and a stream-driving helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_stream::StreamExt;

use sift::engine::Collaborators;
use sift::grade::{Grader, Verdict};
use sift::generate::Generator;
use sift::retrieve::Retriever;
use sift::route::{QuestionRouter, SourceLabel};
use sift::search::WebSearcher;
use sift::state::{Passage, RagState};
use sift::stream::StreamEvent;
use sift::{AdaptiveRag, EngineConfig, WorkflowError};

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config with the mandatory keys filled so validate() passes.
pub fn config_with_keys() -> EngineConfig {
    EngineConfig {
        groq_api_key: Some("test-chat-key".into()),
        tavily_api_key: Some("test-search-key".into()),
        ..Default::default()
    }
}

/// Router with a fixed label.
pub struct StubRouter {
    label: SourceLabel,
}

impl StubRouter {
    pub fn vectorstore() -> Self {
        Self {
            label: SourceLabel::Vectorstore,
        }
    }

    pub fn web_search() -> Self {
        Self {
            label: SourceLabel::WebSearch,
        }
    }
}

#[async_trait]
impl QuestionRouter for StubRouter {
    async fn route(&self, _question: &str) -> Result<SourceLabel, WorkflowError> {
        Ok(self.label)
    }
}

/// Router that violates its contract.
pub struct BadRouter;

#[async_trait]
impl QuestionRouter for BadRouter {
    async fn route(&self, _question: &str) -> Result<SourceLabel, WorkflowError> {
        Err(WorkflowError::RoutingContract("got 'wikipedia'".into()))
    }
}

/// Retriever with fixed passages and a call counter.
pub struct StubRetriever {
    passages: Vec<Passage>,
    calls: AtomicUsize,
}

impl StubRetriever {
    pub fn with_passages(contents: &[&str]) -> Self {
        Self {
            passages: contents.iter().copied().map(Passage::corpus).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    async fn retrieve(&self, _question: &str) -> Result<Vec<Passage>, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.passages.clone())
    }
}

/// Retriever whose index was never built.
pub struct NotReadyRetriever;

#[async_trait]
impl Retriever for NotReadyRetriever {
    async fn retrieve(&self, _question: &str) -> Result<Vec<Passage>, WorkflowError> {
        Err(WorkflowError::IndexNotReady)
    }
}

/// Searcher with fixed content and a call counter.
pub struct StubSearcher {
    content: String,
    calls: AtomicUsize,
}

impl StubSearcher {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Mimics the degraded output of a searcher whose backend failed.
    pub fn degraded() -> Self {
        Self::new("Web search failed: connection refused")
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSearcher for StubSearcher {
    async fn search(&self, _question: &str) -> Passage {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Passage::web(self.content.clone())
    }
}

/// Grader that consumes a scripted verdict sequence, repeating the last
/// verdict once the script runs out.
pub struct ScriptedGrader {
    script: Mutex<VecDeque<Verdict>>,
    last: Verdict,
    calls: AtomicUsize,
}

impl ScriptedGrader {
    pub fn sequence(verdicts: &[Verdict]) -> Self {
        let last = *verdicts.last().expect("script must not be empty");
        Self {
            script: Mutex::new(verdicts.iter().copied().collect()),
            last,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_yes() -> Self {
        Self::sequence(&[Verdict::Yes])
    }

    pub fn always_no() -> Self {
        Self::sequence(&[Verdict::No])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Grader for ScriptedGrader {
    async fn grade(&self, _context: &str, _target: &str) -> Result<Verdict, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().expect("script lock").pop_front();
        Ok(next.unwrap_or(self.last))
    }
}

/// Generator with a fixed answer and a call counter.
pub struct CountingGenerator {
    answer: String,
    calls: AtomicUsize,
}

impl CountingGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for CountingGenerator {
    async fn generate(
        &self,
        _question: &str,
        _passages: &[Passage],
    ) -> Result<String, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// All-affirmative collaborator set over a two-passage corpus; tests swap in
/// the doubles they want to observe or script.
pub fn base_collaborators() -> Collaborators {
    Collaborators {
        router: Arc::new(StubRouter::vectorstore()),
        retriever: Arc::new(StubRetriever::with_passages(&["passage one", "passage two"])),
        searcher: Arc::new(StubSearcher::new("web result")),
        relevance: Arc::new(ScriptedGrader::always_yes()),
        groundedness: Arc::new(ScriptedGrader::always_yes()),
        adequacy: Arc::new(ScriptedGrader::always_yes()),
        generator: Arc::new(CountingGenerator::new("the answer")),
    }
}

/// Streams a question to completion, returning the executed node ids in order
/// and the final state. Panics on an error event.
pub async fn run_to_final(engine: &AdaptiveRag, question: &str) -> (Vec<String>, RagState) {
    let mut stream = engine.stream(question).expect("stream starts");
    let mut nodes = Vec::new();
    let mut last_state = None;
    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Updates { node, state } => {
                nodes.push(node);
                last_state = Some(state);
            }
            StreamEvent::Error { node, message } => {
                panic!("workflow failed at {node}: {message}")
            }
            StreamEvent::Values(_) => {}
        }
    }
    (nodes, last_state.expect("at least one node ran"))
}
