// Integration tests for CorpusManager - accumulate, rebuild, clear

use async_trait::async_trait;
use fabstir_rag::{CorpusManager, Embedding, EmbeddingProvider, RagError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Embeds text length onto one axis; counts every producer call
struct CountingEmbeddings {
    batch_calls: AtomicUsize,
    texts_embedded: AtomicUsize,
}

impl CountingEmbeddings {
    fn new() -> Self {
        Self {
            batch_calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbeddings {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, RagError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| Embedding::new(vec![t.len() as f32, 1.0]))
            .collect())
    }

    fn model(&self) -> &str {
        "counting"
    }
}

struct FailingEmbeddings;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddings {
    async fn embed_many(&self, _texts: &[String]) -> Result<Vec<Embedding>, RagError> {
        Err(RagError::EmbeddingProducer {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }

    fn model(&self) -> &str {
        "failing"
    }
}

fn chunks(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

#[tokio::test]
async fn test_every_add_rebuilds_over_the_full_corpus() {
    let corpus = CorpusManager::new();
    let provider = CountingEmbeddings::new();

    corpus.add(chunks(&["a", "b"]), "doc1", &provider).await.unwrap();
    corpus.add(chunks(&["c"]), "doc2", &provider).await.unwrap();
    corpus.add(chunks(&["d", "e"]), "doc3", &provider).await.unwrap();

    // One batched call per add; each re-embeds the whole accumulated corpus
    assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 3);
    assert_eq!(provider.texts_embedded.load(Ordering::SeqCst), 2 + 3 + 5);

    let status = corpus.status().await;
    assert_eq!(status.chunk_count, 5);
    assert_eq!(status.document_count, 3);
}

#[tokio::test]
async fn test_document_registry_keeps_upload_order() {
    let corpus = CorpusManager::new();
    let provider = CountingEmbeddings::new();

    corpus.add(chunks(&["a"]), "first.pdf", &provider).await.unwrap();
    corpus.add(chunks(&["b", "c"]), "second.pdf", &provider).await.unwrap();

    let documents = corpus.documents().await;
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].name, "first.pdf");
    assert_eq!(documents[0].chunk_count, 1);
    assert_eq!(documents[1].name, "second.pdf");
    assert_eq!(documents[1].chunk_count, 2);
    assert_ne!(documents[0].id, documents[1].id);
}

#[tokio::test]
async fn test_failed_rebuild_preserves_previous_state() {
    let corpus = CorpusManager::new();
    let provider = CountingEmbeddings::new();
    corpus.add(chunks(&["a", "b"]), "doc1", &provider).await.unwrap();

    let err = corpus
        .add(chunks(&["c"]), "doc2", &FailingEmbeddings)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "EMBEDDING_PRODUCER_ERROR");

    // The failed upload left no trace
    let status = corpus.status().await;
    assert_eq!(status.chunk_count, 2);
    assert_eq!(status.document_count, 1);

    let snapshot = corpus.snapshot().await;
    assert_eq!(snapshot.index.size(), 2);
}

#[tokio::test]
async fn test_clear_then_search_on_fresh_empty_index() {
    let corpus = CorpusManager::new();
    let provider = CountingEmbeddings::new();
    corpus.add(chunks(&["a", "b", "c"]), "doc1", &provider).await.unwrap();

    corpus.clear().await;

    let status = corpus.status().await;
    assert_eq!(status.chunk_count, 0);
    assert_eq!(status.document_count, 0);

    let snapshot = corpus.snapshot().await;
    let hits = snapshot.index.search(&Embedding::new(vec![1.0, 1.0]), 5).unwrap();
    assert!(hits.is_empty());

    // The corpus accepts uploads again after a clear
    corpus.add(chunks(&["d"]), "doc2", &provider).await.unwrap();
    assert_eq!(corpus.status().await.chunk_count, 1);
}

#[tokio::test]
async fn test_snapshot_is_stable_across_concurrent_mutation() {
    let corpus = CorpusManager::new();
    let provider = CountingEmbeddings::new();
    corpus.add(chunks(&["a"]), "doc1", &provider).await.unwrap();

    let before = corpus.snapshot().await;
    corpus.add(chunks(&["bb", "ccc"]), "doc2", &provider).await.unwrap();
    corpus.clear().await;

    // The old handle still serves the index it captured
    assert_eq!(before.index.size(), 1);
    assert_eq!(before.documents.len(), 1);
    assert_eq!(corpus.snapshot().await.index.size(), 0);
}

#[tokio::test]
async fn test_concurrent_adds_all_land() {
    let corpus = Arc::new(CorpusManager::new());
    let provider = Arc::new(CountingEmbeddings::new());

    let mut handles = Vec::new();
    for i in 0..8 {
        let corpus = Arc::clone(&corpus);
        let provider = Arc::clone(&provider);
        handles.push(tokio::spawn(async move {
            corpus
                .add(
                    vec![format!("chunk-{}", i)],
                    &format!("doc-{}", i),
                    provider.as_ref(),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let status = corpus.status().await;
    assert_eq!(status.chunk_count, 8);
    assert_eq!(status.document_count, 8);
    assert_eq!(corpus.snapshot().await.index.size(), 8);
}
