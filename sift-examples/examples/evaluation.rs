//! Batch-evaluate the engine over mixed corpus and web questions, then print
//! and persist the report.
//!
//! Requires `GROQ_API_KEY`, `TAVILY_API_KEY`, and `OPENAI_API_KEY` (embeddings)
//! in the environment or a `.env` file.
//!
//! Run: `cargo run -p sift-examples --example evaluation`

use std::path::Path;

use sift::eval::Evaluator;
use sift::ingest::{load_text_file, write_sample_corpus, TextSplitter};
use sift::{AdaptiveRag, EngineConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_env();
    let engine = AdaptiveRag::new(config)?;

    if engine.load_corpus().is_err() {
        let corpus_path = Path::new("./data/sample_corpus.txt");
        write_sample_corpus(corpus_path)?;
        let splitter =
            TextSplitter::new(engine.config().chunk_size, engine.config().chunk_overlap);
        let passages = load_text_file(corpus_path, &splitter)?;
        engine.index_corpus(&passages).await?;
    }

    let questions = [
        "What is an interlibrary loan?",
        "How does machine learning relate to artificial intelligence?",
        "What is retrieval-augmented generation?",
        "What is the weather in Paris right now?",
    ];

    let mut evaluator = Evaluator::new(&engine);
    let ok = evaluator.evaluate_batch(&questions).await;
    println!("evaluated {ok}/{} questions\n", questions.len());

    if let Some(report) = evaluator.report() {
        println!("{}", report.render());
    }

    let out = Path::new("./data/evaluation_results.json");
    evaluator.save_json(out)?;
    println!("results saved to {}", out.display());

    Ok(())
}
