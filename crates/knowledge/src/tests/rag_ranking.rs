//! Tests for RAG ranking correctness.

use super::{alpha_beta_gamma, selected, whole_document_config, MockBackend};
use crate::corpus::build_corpus;
use crate::rag::answer_query;
use crate::types::{Document, Query};
use docqa_core::{AppError, RagConfig};
use docqa_prompt::NO_EXCERPTS_NOTICE;
use std::sync::Arc;
use std::time::Duration;

fn ids(result: &crate::types::RetrievalResult) -> Vec<&str> {
    result.entries().iter().map(|e| e.chunk_id.as_str()).collect()
}

/// A corpus with several chunks per document and varied vocabulary.
fn report_corpus() -> Vec<Document> {
    let paragraphs = [
        "Quarterly revenue rose while operating costs fell, lifting profit.",
        "Pricing decisions drive margins; discounts erode profit quickly.",
        "Supply chain delays increased inventory costs in the north region.",
        "Staff training programs improved retention and customer satisfaction.",
        "Currency swings created market risk for exported goods.",
        "The board approved a new dividend policy tied to profit growth.",
    ];
    paragraphs
        .iter()
        .enumerate()
        .map(|(i, text)| {
            Document::new(
                format!("report-{}.md", i),
                format!("/reports/report-{}.md", i),
                text.repeat(3),
            )
        })
        .collect()
}

#[test]
fn test_relevant_document_ranks_first_and_unrelated_is_excluded() {
    let snapshot = build_corpus(alpha_beta_gamma(), &whole_document_config()).unwrap();
    let result = snapshot.retrieve("What affects profit?", 5, 0.01);

    assert_eq!(ids(&result), vec!["alpha.txt#0", "beta.txt#0"]);
    assert!(result.score_of("gamma.txt#0").is_none());
    assert!(result.entries()[0].score > result.entries()[1].score);
}

#[test]
fn test_one_line_documents_rank_by_shared_terms() {
    let documents = vec![
        Document::new("alpha.txt", "/docs/alpha.txt", "Alpha discusses profit margins."),
        Document::new("beta.txt", "/docs/beta.txt", "Beta discusses market risk."),
        Document::new("gamma.txt", "/docs/gamma.txt", "Gamma is unrelated weather notes."),
    ];
    let snapshot = build_corpus(documents, &whole_document_config()).unwrap();
    assert_eq!(snapshot.stats().chunks, 3);

    let result = snapshot.retrieve("What affects profit?", 5, 0.01);
    assert_eq!(ids(&result)[0], "alpha.txt#0");
    assert!(result.score_of("gamma.txt#0").is_none());
    for entry in result.entries() {
        assert!(entry.score >= 0.01);
    }

    // Without a threshold every chunk is ranked and alpha still leads
    let unfiltered = snapshot.retrieve("What affects profit?", 5, 0.0);
    assert_eq!(unfiltered.len(), 3);
    assert_eq!(ids(&unfiltered)[0], "alpha.txt#0");
    assert!(unfiltered.score_of("alpha.txt#0") > unfiltered.score_of("beta.txt#0"));
    assert!(unfiltered.score_of("gamma.txt#0").unwrap() < 0.01);
}

#[test]
fn test_ranking_is_deterministic() {
    let config = RagConfig {
        chunk_size: 80,
        overlap: 20,
        ..RagConfig::default()
    };
    let first = build_corpus(report_corpus(), &config).unwrap();
    let second = build_corpus(report_corpus(), &config).unwrap();

    for question in ["profit margins", "market risk", "inventory costs"] {
        assert_eq!(
            first.retrieve(question, 5, 0.01),
            second.retrieve(question, 5, 0.01)
        );
    }
}

#[test]
fn test_scores_non_increasing_and_bounded() {
    let config = RagConfig {
        chunk_size: 80,
        overlap: 20,
        ..RagConfig::default()
    };
    let snapshot = build_corpus(report_corpus(), &config).unwrap();

    for (top_k, threshold) in [(1, 0.0), (3, 0.01), (5, 0.1), (50, 0.3)] {
        let result = snapshot.retrieve("How do costs and pricing affect profit?", top_k, threshold);
        assert!(result.len() <= top_k);
        for entry in result.entries() {
            assert!(entry.score >= threshold);
            assert!(entry.score <= 1.0);
        }
        for pair in result.entries().windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}

#[test]
fn test_out_of_vocabulary_query_returns_nothing() {
    let snapshot = build_corpus(alpha_beta_gamma(), &whole_document_config()).unwrap();
    assert!(snapshot.retrieve("xylophone zeppelin", 5, 0.0).is_empty());
}

#[tokio::test]
async fn test_answer_cites_included_documents() {
    let backend = Arc::new(MockBackend::new("Pricing affects profit (From: alpha.txt)."));
    let config = whole_document_config();
    let snapshot = Arc::new(build_corpus(alpha_beta_gamma(), &config).unwrap());

    let answer = answer_query(
        snapshot,
        &selected(&backend),
        &config,
        Query::new("What affects profit?"),
    )
    .await
    .unwrap();

    assert_eq!(answer.text, "Pricing affects profit (From: alpha.txt).");
    assert_eq!(
        answer.cited_sources.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["alpha.txt", "beta.txt"]
    );
    assert_eq!(answer.excerpts.len(), 2);
    assert_eq!(answer.excerpts[0].document_name, "alpha.txt");
    assert!(answer.excerpts[0].preview.starts_with("Alpha discusses"));
    assert_eq!(answer.model, "mock-model");
    assert_eq!(answer.provider, "mock");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let system = requests[0].system.as_deref().unwrap();
    let alpha = system.find("[From: alpha.txt]").unwrap();
    let beta = system.find("[From: beta.txt]").unwrap();
    assert!(alpha < beta);
    assert!(!system.contains("gamma"));
    assert_eq!(requests[0].prompt, "What affects profit?");
    assert_eq!(requests[0].model, "mock-model");
    assert_eq!(requests[0].params.temperature, config.temperature);
    assert_eq!(requests[0].params.max_output_tokens, config.max_output_tokens);
}

#[tokio::test]
async fn test_empty_retrieval_still_generates() {
    let backend = Arc::new(MockBackend::new(
        "I could not find this information in the provided documents.",
    ));
    let config = whole_document_config();
    let snapshot = Arc::new(build_corpus(alpha_beta_gamma(), &config).unwrap());

    let answer = answer_query(snapshot, &selected(&backend), &config, Query::new("Who won the cup?"))
        .await
        .unwrap();

    assert!(answer.cited_sources.is_empty());
    assert!(answer.is_ungrounded());
    let system = backend.requests()[0].system.clone().unwrap();
    assert!(system.contains(NO_EXCERPTS_NOTICE));
}

#[tokio::test]
async fn test_backend_errors_propagate_typed() {
    let backend = Arc::new(MockBackend::failing(|| AppError::RateLimited {
        message: "slow down".to_string(),
        retry_after: Some(Duration::from_secs(3)),
    }));
    let config = whole_document_config();
    let snapshot = Arc::new(build_corpus(alpha_beta_gamma(), &config).unwrap());

    let err = answer_query(snapshot, &selected(&backend), &config, Query::new("profit?"))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
}
