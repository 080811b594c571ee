//! The adaptive retrieval engine: collaborators wired into a compiled graph.
//!
//! Per query: route to web search or corpus retrieval, grade the evidence,
//! generate, then grade the generation for groundedness and adequacy, looping
//! through regeneration or query reformulation until the answer is accepted.
//! Configuration is validated before any node runs.

mod decide;
mod nodes;

pub use decide::{judge_generation, GenerationOutcome, MAX_REFORMULATIONS};
pub use nodes::{
    GenerateNode, GradeDocumentsNode, RetrieveNode, TransformQueryNode, WebSearchNode,
};

use std::collections::HashMap;
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::WorkflowError;
use crate::generate::{ContextAnswerer, Generator};
use crate::grade::{Grader, LlmGrader};
use crate::graph::{CompiledGraph, EdgeRouterFn, GraphBuildError, StateGraph, END, START};
use crate::llm::{ChatModel, OpenAiChat};
use crate::retrieve::{CorpusRetriever, OpenAiEmbedder, Retriever};
use crate::route::{LlmRouter, QuestionRouter, SourceLabel};
use crate::search::{TavilySearcher, WebSearcher};
use crate::state::{join_passages, Passage, RagState};
use crate::stream::{StreamEvent, StreamMode};

/// Sentinel returned when a run terminates without ever producing an answer.
/// The graph topology makes this unreachable in practice; it is a defensive
/// fallback, not an expected outcome.
pub const NO_ANSWER: &str = "No answer generated";

/// The collaborator set behind one engine; the dependency-injection seam for
/// tests and alternative backends.
pub struct Collaborators {
    pub router: Arc<dyn QuestionRouter>,
    pub retriever: Arc<dyn Retriever>,
    pub searcher: Arc<dyn WebSearcher>,
    pub relevance: Arc<dyn Grader>,
    pub groundedness: Arc<dyn Grader>,
    pub adequacy: Arc<dyn Grader>,
    pub generator: Arc<dyn Generator>,
}

/// Adaptive retrieval engine: routing, retrieval, grading, generation, and the
/// retry policy, compiled into one graph at construction.
pub struct AdaptiveRag {
    config: EngineConfig,
    graph: CompiledGraph<RagState>,
    /// Present when the engine owns its corpus retriever (built via `new`);
    /// enables the index lifecycle methods.
    corpus: Option<Arc<CorpusRetriever>>,
}

impl AdaptiveRag {
    /// Assembles the default collaborator stack from the configuration and
    /// compiles the graph.
    pub fn new(config: EngineConfig) -> Result<Self, WorkflowError> {
        let chat_config = OpenAIConfig::new()
            .with_api_key(config.groq_api_key.clone().unwrap_or_default())
            .with_api_base(config.chat_api_base.clone());
        let chat: Arc<dyn ChatModel> = Arc::new(
            OpenAiChat::with_config(chat_config.clone(), config.chat_model.clone())
                .with_temperature(config.temperature),
        );
        let router_chat: Arc<dyn ChatModel> = Arc::new(
            OpenAiChat::with_config(chat_config, config.router_model.clone())
                .with_temperature(config.temperature),
        );

        let embedder_config =
            OpenAIConfig::new().with_api_key(config.openai_api_key.clone().unwrap_or_default());
        let embedder = Arc::new(OpenAiEmbedder::with_config(
            embedder_config,
            config.embedding_model.clone(),
        ));
        let corpus = Arc::new(CorpusRetriever::new(
            embedder,
            config.index_path.clone(),
            config.retrieval_k,
        ));

        let collaborators = Collaborators {
            router: Arc::new(LlmRouter::new(router_chat)),
            retriever: corpus.clone(),
            searcher: Arc::new(TavilySearcher::new(
                config.tavily_api_key.clone().unwrap_or_default(),
                config.web_search_results,
            )),
            relevance: Arc::new(LlmGrader::relevance(chat.clone())),
            groundedness: Arc::new(LlmGrader::groundedness(chat.clone())),
            adequacy: Arc::new(LlmGrader::adequacy(chat.clone())),
            generator: Arc::new(ContextAnswerer::new(chat)),
        };

        let mut engine = Self::from_parts(config, collaborators)?;
        engine.corpus = Some(corpus);
        Ok(engine)
    }

    /// Compiles an engine over caller-supplied collaborators. The index
    /// lifecycle methods are unavailable in this form; callers manage their
    /// own retriever.
    pub fn from_parts(
        config: EngineConfig,
        collaborators: Collaborators,
    ) -> Result<Self, WorkflowError> {
        let graph = build_graph(&config, &collaborators)?;
        Ok(Self {
            config,
            graph,
            corpus: None,
        })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answers a question, running the workflow to completion.
    ///
    /// Validates configuration first, so a missing mandatory key aborts before
    /// any node runs. Returns [`NO_ANSWER`] if the run somehow terminates
    /// without a generation.
    pub async fn answer(&self, question: &str) -> Result<String, WorkflowError> {
        self.config.validate()?;
        let state = self.graph.invoke(RagState::new(question)).await?;
        Ok(state.generation.unwrap_or_else(|| NO_ANSWER.to_string()))
    }

    /// Streams the workflow: one `Updates { node, state }` event per node
    /// execution, in execution order, ending with an `Error` event if the run
    /// fails. Validates configuration before the first node runs.
    pub fn stream(
        &self,
        question: &str,
    ) -> Result<ReceiverStream<StreamEvent<RagState>>, WorkflowError> {
        self.config.validate()?;
        Ok(self.graph.stream(RagState::new(question), StreamMode::Updates))
    }

    /// Embeds the passages, replaces the corpus index, and persists it.
    ///
    /// Administrative operation: run it before querying, not concurrently with
    /// queries.
    pub async fn index_corpus(&self, passages: &[Passage]) -> Result<(), WorkflowError> {
        let corpus = self.owned_corpus()?;
        corpus.build(passages).await?;
        corpus.save()
    }

    /// Loads a previously persisted corpus index.
    pub fn load_corpus(&self) -> Result<(), WorkflowError> {
        self.owned_corpus()?.load()
    }

    fn owned_corpus(&self) -> Result<&Arc<CorpusRetriever>, WorkflowError> {
        self.corpus.as_ref().ok_or_else(|| {
            WorkflowError::Configuration(
                "engine was built from parts; manage the corpus retriever directly".to_string(),
            )
        })
    }
}

/// Wires the five nodes and three predicates into a compiled graph.
fn build_graph(
    config: &EngineConfig,
    c: &Collaborators,
) -> Result<CompiledGraph<RagState>, GraphBuildError> {
    let mut graph: StateGraph<RagState> = StateGraph::new();
    if let Some(limit) = config.max_iterations {
        graph = graph.with_iteration_limit(limit);
    }

    graph.add_node("retrieve", Arc::new(RetrieveNode::new(c.retriever.clone())));
    graph.add_node("web_search", Arc::new(WebSearchNode::new(c.searcher.clone())));
    graph.add_node(
        "grade_documents",
        Arc::new(GradeDocumentsNode::new(c.relevance.clone())),
    );
    graph.add_node("generate", Arc::new(GenerateNode::new(c.generator.clone())));
    graph.add_node("transform_query", Arc::new(TransformQueryNode));

    // Entry: the router picks the data source from the question.
    let router = c.router.clone();
    let route: EdgeRouterFn<RagState> = Arc::new(move |state: &RagState| {
        let router = router.clone();
        let question = state.question.clone();
        Box::pin(async move {
            info!("routing question");
            Ok(match router.route(&question).await? {
                SourceLabel::WebSearch => "web_search".to_string(),
                SourceLabel::Vectorstore => "retrieve".to_string(),
            })
        })
    });
    graph.add_conditional_edges(START, route, None);

    graph.add_edge("web_search", "generate");
    graph.add_edge("retrieve", "grade_documents");
    graph.add_edge("transform_query", "generate");

    // Empty filtered evidence means the question as phrased is unlikely to be
    // answerable from the corpus; reformulate before generating.
    let decide: EdgeRouterFn<RagState> = Arc::new(|state: &RagState| {
        let no_evidence = state.documents.is_empty();
        Box::pin(async move {
            Ok(if no_evidence {
                info!("all documents filtered out; transforming query");
                "transform_query".to_string()
            } else {
                info!("relevant documents found; generating");
                "generate".to_string()
            })
        })
    });
    graph.add_conditional_edges("grade_documents", decide, None);

    let groundedness = c.groundedness.clone();
    let adequacy = c.adequacy.clone();
    let judge: EdgeRouterFn<RagState> = Arc::new(move |state: &RagState| {
        let groundedness = groundedness.clone();
        let adequacy = adequacy.clone();
        let question = state.question.clone();
        let facts = join_passages(&state.documents);
        let generation = state.generation.clone().unwrap_or_default();
        let retry_count = state.retry_count;
        Box::pin(async move {
            let outcome = judge_generation(
                groundedness.as_ref(),
                adequacy.as_ref(),
                &question,
                &facts,
                &generation,
                retry_count,
            )
            .await?;
            Ok(outcome.key().to_string())
        })
    });
    let judge_map: HashMap<String, String> = [
        ("not supported".to_string(), "generate".to_string()),
        ("useful".to_string(), END.to_string()),
        ("not useful".to_string(), "transform_query".to_string()),
    ]
    .into_iter()
    .collect();
    graph.add_conditional_edges("generate", judge, Some(judge_map));

    graph.compile()
}
