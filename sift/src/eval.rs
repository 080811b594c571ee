//! Built-in evaluation over the engine: per-question metrics and an aggregate
//! report.
//!
//! Evaluation drives the engine in streaming mode and recovers the route taken
//! from the first retrieval-side node it observes, so the measured run and the
//! reported route can never disagree.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tokio_stream::StreamExt;
use tracing::error;

use crate::engine::AdaptiveRag;
use crate::error::WorkflowError;
use crate::route::SourceLabel;
use crate::stream::StreamEvent;

const CITATION_PHRASES: &[&str] = &[
    "according to",
    "based on",
    "the document",
    "the context",
    "as mentioned",
];

/// Metrics for one evaluated question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMetrics {
    pub question: String,
    pub answer: String,
    pub route: SourceLabel,
    pub response_secs: f64,
    pub document_count: usize,
    pub answer_words: usize,
    pub cites_context: bool,
}

/// Aggregate statistics over a batch of evaluated questions.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub generated_at: String,
    pub summary: Summary,
    pub routing: Routing,
    pub quality: Quality,
    pub performance: Performance,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_questions: usize,
    pub avg_response_secs: f64,
    pub avg_answer_words: f64,
    pub avg_documents_used: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Routing {
    pub vectorstore_queries: usize,
    pub web_search_queries: usize,
    pub vectorstore_percentage: f64,
    pub web_search_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quality {
    pub responses_with_citations: usize,
    pub citation_percentage: f64,
    pub responses_with_context: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub fastest_response_secs: f64,
    pub slowest_response_secs: f64,
    pub longest_answer_words: usize,
    pub shortest_answer_words: usize,
}

impl EvaluationReport {
    /// Plain-text rendering of the report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("ADAPTIVE RETRIEVAL EVALUATION REPORT\n");
        out.push_str(&format!("generated at: {}\n\n", self.generated_at));
        out.push_str("summary:\n");
        out.push_str(&format!(
            "  total questions: {}\n  avg response time: {:.2}s\n  avg answer length: {:.1} words\n  avg documents used: {:.1}\n",
            self.summary.total_questions,
            self.summary.avg_response_secs,
            self.summary.avg_answer_words,
            self.summary.avg_documents_used,
        ));
        out.push_str("routing:\n");
        out.push_str(&format!(
            "  vectorstore: {} ({:.1}%)\n  web search: {} ({:.1}%)\n",
            self.routing.vectorstore_queries,
            self.routing.vectorstore_percentage,
            self.routing.web_search_queries,
            self.routing.web_search_percentage,
        ));
        out.push_str("quality:\n");
        out.push_str(&format!(
            "  responses with citations: {} ({:.1}%)\n  responses with context: {}\n",
            self.quality.responses_with_citations,
            self.quality.citation_percentage,
            self.quality.responses_with_context,
        ));
        out.push_str("performance:\n");
        out.push_str(&format!(
            "  fastest: {:.2}s\n  slowest: {:.2}s\n  longest answer: {} words\n  shortest answer: {} words\n",
            self.performance.fastest_response_secs,
            self.performance.slowest_response_secs,
            self.performance.longest_answer_words,
            self.performance.shortest_answer_words,
        ));
        out
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Aggregates metrics into a report; `None` when there are no results.
pub fn build_report(results: &[QueryMetrics]) -> Option<EvaluationReport> {
    if results.is_empty() {
        return None;
    }
    let total = results.len();
    let totalf = total as f64;

    let vectorstore = results
        .iter()
        .filter(|r| r.route == SourceLabel::Vectorstore)
        .count();
    let web = total - vectorstore;
    let citations = results.iter().filter(|r| r.cites_context).count();

    Some(EvaluationReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        summary: Summary {
            total_questions: total,
            avg_response_secs: round2(
                results.iter().map(|r| r.response_secs).sum::<f64>() / totalf,
            ),
            avg_answer_words: round1(
                results.iter().map(|r| r.answer_words as f64).sum::<f64>() / totalf,
            ),
            avg_documents_used: round1(
                results.iter().map(|r| r.document_count as f64).sum::<f64>() / totalf,
            ),
        },
        routing: Routing {
            vectorstore_queries: vectorstore,
            web_search_queries: web,
            vectorstore_percentage: round1(vectorstore as f64 / totalf * 100.0),
            web_search_percentage: round1(web as f64 / totalf * 100.0),
        },
        quality: Quality {
            responses_with_citations: citations,
            citation_percentage: round1(citations as f64 / totalf * 100.0),
            responses_with_context: results.iter().filter(|r| r.document_count > 0).count(),
        },
        performance: Performance {
            fastest_response_secs: round2(
                results
                    .iter()
                    .map(|r| r.response_secs)
                    .fold(f64::INFINITY, f64::min),
            ),
            slowest_response_secs: round2(
                results
                    .iter()
                    .map(|r| r.response_secs)
                    .fold(f64::NEG_INFINITY, f64::max),
            ),
            longest_answer_words: results.iter().map(|r| r.answer_words).max().unwrap_or(0),
            shortest_answer_words: results.iter().map(|r| r.answer_words).min().unwrap_or(0),
        },
    })
}

/// Evaluates questions against an engine and accumulates metrics.
pub struct Evaluator<'a> {
    engine: &'a AdaptiveRag,
    results: Vec<QueryMetrics>,
}

impl<'a> Evaluator<'a> {
    pub fn new(engine: &'a AdaptiveRag) -> Self {
        Self {
            engine,
            results: vec![],
        }
    }

    /// Runs one question through the engine's stream and records its metrics.
    pub async fn evaluate(&mut self, question: &str) -> Result<&QueryMetrics, WorkflowError> {
        let started = Instant::now();
        let mut stream = self.engine.stream(question)?;

        let mut route = None;
        let mut last_state = None;
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::Updates { node, state } => {
                    if route.is_none() {
                        route = match node.as_str() {
                            "retrieve" => Some(SourceLabel::Vectorstore),
                            "web_search" => Some(SourceLabel::WebSearch),
                            _ => None,
                        };
                    }
                    last_state = Some(state);
                }
                StreamEvent::Error { node, message } => {
                    return Err(WorkflowError::ExecutionFailed(format!("{node}: {message}")));
                }
                StreamEvent::Values(_) => {}
            }
        }

        let state = last_state
            .ok_or_else(|| WorkflowError::ExecutionFailed("engine stream emitted no events".into()))?;
        let route = route.ok_or_else(|| {
            WorkflowError::ExecutionFailed("no retrieval-side node observed in stream".into())
        })?;

        let answer = state.generation.unwrap_or_default();
        let lower = answer.to_lowercase();
        let metrics = QueryMetrics {
            question: question.to_string(),
            answer_words: answer.split_whitespace().count(),
            cites_context: CITATION_PHRASES.iter().any(|p| lower.contains(p)),
            answer,
            route,
            response_secs: started.elapsed().as_secs_f64(),
            document_count: state.documents.len(),
        };
        self.results.push(metrics);
        Ok(self.results.last().expect("just pushed"))
    }

    /// Evaluates each question, logging failures; returns how many succeeded.
    pub async fn evaluate_batch(&mut self, questions: &[&str]) -> usize {
        let mut ok = 0;
        for question in questions {
            match self.evaluate(question).await {
                Ok(_) => ok += 1,
                Err(e) => error!(question = %question, error = %e, "evaluation failed"),
            }
        }
        ok
    }

    /// The metrics accumulated so far.
    pub fn results(&self) -> &[QueryMetrics] {
        &self.results
    }

    /// Aggregate report; `None` when nothing has been evaluated.
    pub fn report(&self) -> Option<EvaluationReport> {
        build_report(&self.results)
    }

    /// Writes the report and the per-question results as one JSON document.
    pub fn save_json(&self, path: &Path) -> Result<(), WorkflowError> {
        let doc = serde_json::json!({
            "report": self.report(),
            "results": self.results,
        });
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&doc)
            .map_err(|e| WorkflowError::ExecutionFailed(format!("report serialize failed: {e}")))?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(route: SourceLabel, secs: f64, words: usize, docs: usize, cites: bool) -> QueryMetrics {
        QueryMetrics {
            question: "q".into(),
            answer: "a".into(),
            route,
            response_secs: secs,
            document_count: docs,
            answer_words: words,
            cites_context: cites,
        }
    }

    /// **Scenario**: no results means no report.
    #[test]
    fn empty_results_no_report() {
        assert!(build_report(&[]).is_none());
    }

    /// **Scenario**: the aggregate arithmetic over a small batch.
    #[test]
    fn report_aggregates() {
        let results = vec![
            metric(SourceLabel::Vectorstore, 1.0, 10, 2, true),
            metric(SourceLabel::Vectorstore, 3.0, 30, 4, false),
            metric(SourceLabel::WebSearch, 2.0, 20, 0, false),
        ];
        let report = build_report(&results).unwrap();
        assert_eq!(report.summary.total_questions, 3);
        assert_eq!(report.summary.avg_response_secs, 2.0);
        assert_eq!(report.summary.avg_answer_words, 20.0);
        assert_eq!(report.summary.avg_documents_used, 2.0);
        assert_eq!(report.routing.vectorstore_queries, 2);
        assert_eq!(report.routing.web_search_queries, 1);
        assert_eq!(report.routing.vectorstore_percentage, 66.7);
        assert_eq!(report.quality.responses_with_citations, 1);
        assert_eq!(report.quality.responses_with_context, 2);
        assert_eq!(report.performance.fastest_response_secs, 1.0);
        assert_eq!(report.performance.slowest_response_secs, 3.0);
        assert_eq!(report.performance.longest_answer_words, 30);
        assert_eq!(report.performance.shortest_answer_words, 10);
    }

    /// **Scenario**: render produces the four sections.
    #[test]
    fn render_has_sections() {
        let report = build_report(&[metric(SourceLabel::WebSearch, 0.5, 5, 1, true)]).unwrap();
        let text = report.render();
        for section in ["summary:", "routing:", "quality:", "performance:"] {
            assert!(text.contains(section), "missing {section}");
        }
    }
}
