//! The generation-grading predicate: groundedness first, then adequacy, with
//! the bounded reformulation budget.

use tracing::{info, warn};

use crate::error::WorkflowError;
use crate::grade::Grader;

/// Reformulation budget: once `retry_count` reaches this, an inadequate but
/// grounded answer is accepted instead of looping again.
pub const MAX_REFORMULATIONS: u32 = 3;

/// Outcome of grading a generation against its documents and question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Not grounded in the documents: regenerate with the same context. This
    /// edge does not consume the reformulation budget and has no ceiling of
    /// its own; the engine-level iteration limit is the only bound.
    NotSupported,
    /// Grounded and adequate (or budget exhausted): accept and finish.
    Useful,
    /// Grounded but inadequate, budget remaining: reformulate the question.
    NotUseful,
}

impl GenerationOutcome {
    /// Routing key for the conditional edge out of the generate node.
    pub fn key(&self) -> &'static str {
        match self {
            GenerationOutcome::NotSupported => "not supported",
            GenerationOutcome::Useful => "useful",
            GenerationOutcome::NotUseful => "not useful",
        }
    }
}

/// Grades a generation: groundedness over (facts, generation), then adequacy
/// over (question, generation), applying the reformulation budget.
pub async fn judge_generation(
    groundedness: &dyn Grader,
    adequacy: &dyn Grader,
    question: &str,
    facts: &str,
    generation: &str,
    retry_count: u32,
) -> Result<GenerationOutcome, WorkflowError> {
    info!("checking generation for hallucinations");
    if !groundedness.grade(facts, generation).await?.is_yes() {
        info!("generation is not grounded in documents; regenerating");
        return Ok(GenerationOutcome::NotSupported);
    }

    info!("generation is grounded; checking it addresses the question");
    if adequacy.grade(question, generation).await?.is_yes() {
        info!("generation addresses the question");
        return Ok(GenerationOutcome::Useful);
    }

    if retry_count >= MAX_REFORMULATIONS {
        warn!(retry_count, "max reformulations reached; accepting answer");
        return Ok(GenerationOutcome::Useful);
    }

    info!(retry_count, "generation does not address the question");
    Ok(GenerationOutcome::NotUseful)
}
