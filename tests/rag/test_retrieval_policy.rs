// Integration tests for RetrievalPolicy - tier selection over a corpus snapshot

use async_trait::async_trait;
use chrono::Utc;
use fabstir_rag::{
    ChunkInput, CorpusSnapshot, DocumentInfo, Embedding, EmbeddingProvider, RagError,
    RetrievalOutcome, RetrievalPolicy, VectorIndex,
};
use mockall::mock;
use std::sync::Arc;
use uuid::Uuid;

mock! {
    Embedder {}

    #[async_trait]
    impl EmbeddingProvider for Embedder {
        async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, RagError>;
        async fn embed_one(&self, text: &str) -> Result<Embedding, RagError>;
        fn model(&self) -> &str;
    }
}

fn doc(name: &str, chunk_count: usize) -> DocumentInfo {
    DocumentInfo {
        id: Uuid::new_v4(),
        name: name.to_string(),
        chunk_count,
        uploaded_at: Utc::now(),
    }
}

/// Unit vector whose cosine against [1, 0] is exactly `score`
fn at_similarity(score: f32) -> Vec<f32> {
    vec![score, (1.0 - score * score).sqrt()]
}

async fn snapshot_with_scores(scores: &[f32]) -> CorpusSnapshot {
    let mut provider = MockEmbedder::new();
    let vectors: Vec<Vec<f32>> = scores.iter().map(|&s| at_similarity(s)).collect();
    provider
        .expect_embed_many()
        .times(1)
        .returning(move |texts| {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| Embedding::new(vectors[i].clone()))
                .collect())
        });

    let chunks: Vec<ChunkInput> = scores
        .iter()
        .enumerate()
        .map(|(i, _)| ChunkInput {
            text: format!("chunk-{}", i),
            source_id: "doc1".to_string(),
        })
        .collect();
    let index = VectorIndex::build(&chunks, &provider).await.unwrap();

    CorpusSnapshot {
        index: Arc::new(index),
        documents: vec![doc("doc1", scores.len())],
    }
}

/// Provider whose single-query embedding is the [1, 0] axis
fn axis_query_embedder(times: usize) -> MockEmbedder {
    let mut provider = MockEmbedder::new();
    provider
        .expect_embed_one()
        .times(times)
        .returning(|_| Ok(Embedding::new(vec![1.0, 0.0])));
    provider
}

#[tokio::test]
async fn test_meta_query_short_circuits_without_embedding() {
    // Zero producer invocations allowed; a call would fail the test
    let mut provider = MockEmbedder::new();
    provider.expect_embed_one().times(0);
    provider.expect_embed_many().times(0);

    let snapshot = CorpusSnapshot {
        index: Arc::new(VectorIndex::new()),
        documents: vec![doc("manual.pdf", 7), doc("notes.txt", 2)],
    };

    let policy = RetrievalPolicy::default();
    let outcome = policy
        .retrieve("Which documents are loaded?", &snapshot, &provider)
        .await
        .unwrap();

    match outcome {
        RetrievalOutcome::Meta {
            documents,
            chunk_count,
            ..
        } => {
            assert_eq!(documents.len(), 2);
            assert_eq!(documents[0].name, "manual.pdf");
            assert_eq!(chunk_count, 0);
        }
        other => panic!("expected Meta outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_high_confidence_single_chunk_scenario() {
    let mut provider = MockEmbedder::new();
    provider
        .expect_embed_many()
        .times(1)
        .returning(|_| Ok(vec![Embedding::new(vec![1.0, 0.0])]));
    provider
        .expect_embed_one()
        .times(1)
        .returning(|_| Ok(Embedding::new(at_similarity(0.91))));

    let chunks = vec![ChunkInput {
        text: "Python lists are ordered, mutable sequences.".to_string(),
        source_id: "python-guide.pdf".to_string(),
    }];
    let snapshot = CorpusSnapshot {
        index: Arc::new(VectorIndex::build(&chunks, &provider).await.unwrap()),
        documents: vec![doc("python-guide.pdf", 1)],
    };

    let policy = RetrievalPolicy::default();
    let outcome = policy
        .retrieve("What is a list in Python?", &snapshot, &provider)
        .await
        .unwrap();

    match outcome {
        RetrievalOutcome::Match {
            tier,
            contexts,
            scores,
            ..
        } => {
            assert_eq!(tier.label(), "HIGH");
            assert_eq!(
                contexts,
                vec!["Python lists are ordered, mutable sequences.".to_string()]
            );
            assert_eq!(scores.len(), 1);
            assert!(scores[0] > 0.9);
        }
        other => panic!("expected Match outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_high_tier_caps_at_three_ranked_hits() {
    let snapshot = snapshot_with_scores(&[0.95, 0.91, 0.88, 0.86, 0.60]).await;
    let provider = axis_query_embedder(1);

    let policy = RetrievalPolicy::default();
    let outcome = policy.retrieve("some question", &snapshot, &provider).await.unwrap();

    match outcome {
        RetrievalOutcome::Match {
            tier,
            contexts,
            scores,
            ..
        } => {
            assert_eq!(tier.label(), "HIGH");
            assert_eq!(contexts, vec!["chunk-0", "chunk-1", "chunk-2"]);
            assert!(scores[0] >= scores[1] && scores[1] >= scores[2]);
        }
        other => panic!("expected Match outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_medium_tier_caps_at_two_when_no_high_hit() {
    let snapshot = snapshot_with_scores(&[0.80, 0.75, 0.72, 0.60]).await;
    let provider = axis_query_embedder(1);

    let policy = RetrievalPolicy::default();
    let outcome = policy.retrieve("some question", &snapshot, &provider).await.unwrap();

    match outcome {
        RetrievalOutcome::Match { tier, contexts, .. } => {
            assert_eq!(tier.label(), "MEDIUM");
            assert_eq!(contexts.len(), 2);
        }
        other => panic!("expected Match outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_below_floor_degrades_to_no_match() {
    let snapshot = snapshot_with_scores(&[0.54, 0.30, 0.10]).await;
    let provider = axis_query_embedder(1);

    let policy = RetrievalPolicy::default();
    let outcome = policy.retrieve("unrelated question", &snapshot, &provider).await.unwrap();

    match outcome {
        RetrievalOutcome::NoMatch {
            chunks_searched,
            document_count,
            query,
        } => {
            assert_eq!(chunks_searched, 3);
            assert_eq!(document_count, 1);
            assert_eq!(query, "unrelated question");
        }
        other => panic!("expected NoMatch outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retrieve_is_idempotent_on_unchanged_index() {
    let snapshot = snapshot_with_scores(&[0.90, 0.75]).await;
    let provider = axis_query_embedder(2);

    let policy = RetrievalPolicy::default();
    let first = policy.retrieve("same question", &snapshot, &provider).await.unwrap();
    let second = policy.retrieve("same question", &snapshot, &provider).await.unwrap();

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[tokio::test]
async fn test_producer_failure_propagates_as_typed_error() {
    let snapshot = snapshot_with_scores(&[0.90]).await;

    let mut provider = MockEmbedder::new();
    provider.expect_embed_one().times(1).returning(|_| {
        Err(RagError::EmbeddingProducer {
            status: 429,
            message: "rate limit exceeded".to_string(),
        })
    });

    let policy = RetrievalPolicy::default();
    let err = policy
        .retrieve("some question", &snapshot, &provider)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "EMBEDDING_PRODUCER_ERROR");
}
