//! # Sift
//!
//! Adaptive retrieval workflows in Rust with a **state-in, state-out** graph
//! design: one state type flows through nodes, conditional edges delegate
//! branch decisions to external oracles, and a bounded retry policy guarantees
//! the feedback loop terminates.
//!
//! Per query, the engine routes a question to an indexed corpus or a live web
//! search, filters the evidence by relevance, generates an answer, and
//! validates it for groundedness and adequacy before returning it. Ungrounded
//! answers regenerate; inadequate answers reformulate the question, at most
//! three times.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledGraph`], [`Node`], [`Next`] — build
//!   and run state graphs with async conditional routing.
//! - [`engine`]: [`AdaptiveRag`], [`Collaborators`], the five workflow nodes —
//!   the assembled adaptive retrieval workflow.
//! - [`state`]: [`RagState`], [`Passage`] — per-query state and evidence.
//! - [`route`] / [`grade`] / [`generate`]: collaborator interfaces
//!   ([`QuestionRouter`], [`Grader`], [`Generator`]) and their LLM-backed
//!   implementations.
//! - [`retrieve`]: [`Retriever`], [`CorpusRetriever`], [`VectorIndex`],
//!   [`Embedder`] — the corpus index and its build/load/save lifecycle.
//! - [`search`]: [`WebSearcher`], [`TavilySearcher`] — live web search that
//!   degrades instead of crashing.
//! - [`llm`]: [`ChatModel`], [`OpenAiChat`], [`MockChat`].
//! - [`config`]: [`EngineConfig`] — explicit configuration with a `validate`
//!   gate ahead of every query.
//! - [`stream`]: [`StreamEvent`], [`StreamMode`] — per-node observability.
//! - [`ingest`]: corpus chunking and loading; [`eval`]: batch evaluation.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sift::{AdaptiveRag, EngineConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), sift::WorkflowError> {
//! let config = EngineConfig::from_env();
//! let engine = AdaptiveRag::new(config)?;
//! engine.load_corpus()?;
//! let answer = engine.answer("What is an interlibrary loan?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod generate;
pub mod grade;
pub mod graph;
pub mod ingest;
pub mod llm;
pub mod message;
pub mod retrieve;
pub mod route;
pub mod search;
pub mod state;
pub mod stream;

pub use config::EngineConfig;
pub use engine::{AdaptiveRag, Collaborators, NO_ANSWER};
pub use error::WorkflowError;
pub use generate::{ContextAnswerer, Generator};
pub use grade::{Grader, LlmGrader, Verdict};
pub use graph::{CompiledGraph, Next, Node, StateGraph, END, START};
pub use llm::{ChatModel, MockChat, OpenAiChat};
pub use message::Message;
pub use retrieve::{CorpusRetriever, Embedder, Retriever, VectorIndex};
pub use route::{LlmRouter, QuestionRouter, SourceLabel};
pub use search::{TavilySearcher, WebSearcher};
pub use state::{Passage, PassageOrigin, RagState};
pub use stream::{StreamEvent, StreamMode};
