//! Index the bundled sample corpus, then answer questions end to end.
//!
//! Requires `GROQ_API_KEY`, `TAVILY_API_KEY`, and `OPENAI_API_KEY` (embeddings)
//! in the environment or a `.env` file.
//!
//! Run: `cargo run -p sift-examples --example basic`

use std::path::Path;

use tokio_stream::StreamExt;

use sift::ingest::{load_text_file, write_sample_corpus, TextSplitter};
use sift::{AdaptiveRag, EngineConfig, StreamEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_env();
    let engine = AdaptiveRag::new(config)?;

    // Build the index from the bundled sample corpus, or reuse a saved one.
    if engine.load_corpus().is_err() {
        let corpus_path = Path::new("./data/sample_corpus.txt");
        write_sample_corpus(corpus_path)?;
        let splitter =
            TextSplitter::new(engine.config().chunk_size, engine.config().chunk_overlap);
        let passages = load_text_file(corpus_path, &splitter)?;
        engine.index_corpus(&passages).await?;
    }

    for question in [
        "What is an interlibrary loan?",
        "What is retrieval-augmented generation?",
    ] {
        println!("Q: {question}");
        let answer = engine.answer(question).await?;
        println!("A: {answer}\n");
    }

    // Streaming mode: watch the workflow route, grade, and generate.
    let question = "Who won the most recent Formula 1 championship?";
    println!("Q: {question}");
    let mut stream = engine.stream(question)?;
    let mut answer = None;
    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Updates { node, state } => {
                println!("  [{node}]");
                answer = state.generation;
            }
            StreamEvent::Error { node, message } => {
                eprintln!("  failed at {node}: {message}");
            }
            StreamEvent::Values(_) => {}
        }
    }
    println!("A: {}\n", answer.as_deref().unwrap_or("(no answer)"));

    Ok(())
}
