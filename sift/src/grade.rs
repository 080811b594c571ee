//! Binary grading oracles: document relevance, groundedness, answer adequacy.
//!
//! One trait, three LLM-backed instances differing only in prompt. The verdict
//! domain is closed: anything outside `{yes, no}` is a grading contract
//! violation at this boundary.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::WorkflowError;
use crate::llm::ChatModel;
use crate::message::Message;

/// A binary judgment from a grading oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Verdict {
    Yes,
    No,
}

impl Verdict {
    /// True for the affirmative verdict.
    pub fn is_yes(&self) -> bool {
        matches!(self, Verdict::Yes)
    }
}

impl FromStr for Verdict {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Verdict::Yes),
            "no" => Ok(Verdict::No),
            other => Err(WorkflowError::GradingContract(format!(
                "unknown verdict: '{other}' (expected yes or no)"
            ))),
        }
    }
}

/// Binary grading oracle over a (context, target) pair.
///
/// Three instances drive the workflow: relevance (context = question, target =
/// passage text), groundedness (context = joined passage text, target =
/// generation), adequacy (context = question, target = generation).
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade(&self, context: &str, target: &str) -> Result<Verdict, WorkflowError>;
}

/// Which judgment an `LlmGrader` makes; selects its prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraderKind {
    Relevance,
    Groundedness,
    Adequacy,
}

impl GraderKind {
    fn name(&self) -> &'static str {
        match self {
            GraderKind::Relevance => "relevance",
            GraderKind::Groundedness => "groundedness",
            GraderKind::Adequacy => "adequacy",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            GraderKind::Relevance => {
                "You are a grader assessing relevance of a retrieved document to a user question. \
                 If the document contains keywords or semantic meaning related to the question, \
                 grade it as relevant. \
                 Give a binary score 'yes' or 'no' to indicate whether the document is relevant \
                 to the question. Answer with exactly one word."
            }
            GraderKind::Groundedness => {
                "You are a grader assessing whether an answer is grounded in / supported by a set \
                 of retrieved facts. \
                 Give a binary score 'yes' or 'no'. 'yes' means the answer is grounded in the \
                 facts. Answer with exactly one word."
            }
            GraderKind::Adequacy => {
                "You are a grader assessing whether an answer addresses / resolves a question. \
                 Give a binary score 'yes' or 'no'. 'yes' means the answer resolves the question. \
                 Answer with exactly one word."
            }
        }
    }

    fn user_prompt(&self, context: &str, target: &str) -> String {
        match self {
            GraderKind::Relevance => {
                format!("Retrieved document:\n\n{target}\n\nUser question: {context}")
            }
            GraderKind::Groundedness => {
                format!("Set of facts:\n\n{context}\n\nAnswer: {target}")
            }
            GraderKind::Adequacy => {
                format!("User question:\n\n{context}\n\nAnswer: {target}")
            }
        }
    }
}

/// LLM-backed grader; construct via `relevance`, `groundedness`, or `adequacy`.
pub struct LlmGrader {
    chat: Arc<dyn ChatModel>,
    kind: GraderKind,
}

impl LlmGrader {
    /// Grades a passage's relevance to the question.
    pub fn relevance(chat: Arc<dyn ChatModel>) -> Self {
        Self {
            chat,
            kind: GraderKind::Relevance,
        }
    }

    /// Grades whether a generation is grounded in the evidence.
    pub fn groundedness(chat: Arc<dyn ChatModel>) -> Self {
        Self {
            chat,
            kind: GraderKind::Groundedness,
        }
    }

    /// Grades whether a generation addresses the question.
    pub fn adequacy(chat: Arc<dyn ChatModel>) -> Self {
        Self {
            chat,
            kind: GraderKind::Adequacy,
        }
    }

    fn normalize(reply: &str) -> String {
        reply
            .trim()
            .to_lowercase()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric())
            .to_string()
    }
}

#[async_trait]
impl Grader for LlmGrader {
    async fn grade(&self, context: &str, target: &str) -> Result<Verdict, WorkflowError> {
        let messages = [
            Message::system(self.kind.system_prompt()),
            Message::user(self.kind.user_prompt(context, target)),
        ];
        let reply = self.chat.complete(&messages).await?;
        let verdict: Verdict = Self::normalize(&reply).parse()?;
        debug!(grader = self.kind.name(), verdict = ?verdict, "graded");
        Ok(verdict)
    }
}
