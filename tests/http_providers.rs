//! Wire-format and failure-cause tests for the HTTP providers, against a
//! local mock server.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use helpdesk_qa::{
    CompletionProvider, EmbeddingProvider, GenerationFailure, HttpCompletionProvider,
    HttpEmbeddingProvider, QaError,
};

fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap()
}

fn endpoint(server: &MockServer, path: &str) -> Url {
    Url::parse(&server.url(path)).unwrap()
}

#[tokio::test]
async fn embedding_provider_preserves_input_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "test-embedder"}"#);
            // Items deliberately out of order; the provider must sort by index.
            then.status(200).json_body(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            }));
        })
        .await;

    let provider = HttpEmbeddingProvider::new(
        client(Duration::from_secs(5)),
        endpoint(&server, "/embeddings"),
        Some("test-key".to_string()),
        "test-embedder",
        2,
    );

    let vectors = provider
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn embedding_provider_rejects_wrong_dimensionality() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]
            }));
        })
        .await;

    let provider = HttpEmbeddingProvider::new(
        client(Duration::from_secs(5)),
        endpoint(&server, "/embeddings"),
        None,
        "test-embedder",
        2,
    );

    let err = provider
        .embed_batch(&["text".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QaError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
}

#[tokio::test]
async fn embedding_provider_rejects_short_batches() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2]}]
            }));
        })
        .await;

    let provider = HttpEmbeddingProvider::new(
        client(Duration::from_secs(5)),
        endpoint(&server, "/embeddings"),
        None,
        "test-embedder",
        2,
    );

    let err = provider
        .embed_batch(&["one".to_string(), "two".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, QaError::Embedding(_)));
}

#[tokio::test]
async fn completion_provider_returns_first_choice_content() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body_partial(r#"{"model": "test-llm"}"#);
            then.status(200).json_body(json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "You can open an account online."}}
                ]
            }));
        })
        .await;

    let provider = HttpCompletionProvider::new(
        client(Duration::from_secs(5)),
        endpoint(&server, "/chat/completions"),
        None,
        "test-llm",
    );

    let answer = provider.complete("prompt", 0.3, 100).await.unwrap();
    mock.assert_async().await;
    assert_eq!(answer, "You can open an account online.");
}

#[tokio::test]
async fn completion_server_error_is_transport_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503);
        })
        .await;

    let provider = HttpCompletionProvider::new(
        client(Duration::from_secs(5)),
        endpoint(&server, "/chat/completions"),
        None,
        "test-llm",
    );

    let err = provider.complete("prompt", 0.3, 100).await.unwrap_err();
    assert!(matches!(
        err,
        QaError::Generation {
            cause: GenerationFailure::Transport,
            ..
        }
    ));
}

#[tokio::test]
async fn completion_without_choices_is_empty_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    let provider = HttpCompletionProvider::new(
        client(Duration::from_secs(5)),
        endpoint(&server, "/chat/completions"),
        None,
        "test-llm",
    );

    let err = provider.complete("prompt", 0.3, 100).await.unwrap_err();
    assert!(matches!(
        err,
        QaError::Generation {
            cause: GenerationFailure::EmptyResponse,
            ..
        }
    ));
}

#[tokio::test]
async fn completion_with_blank_content_is_empty_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "   "}}]
            }));
        })
        .await;

    let provider = HttpCompletionProvider::new(
        client(Duration::from_secs(5)),
        endpoint(&server, "/chat/completions"),
        None,
        "test-llm",
    );

    let err = provider.complete("prompt", 0.3, 100).await.unwrap_err();
    assert!(matches!(
        err,
        QaError::Generation {
            cause: GenerationFailure::EmptyResponse,
            ..
        }
    ));
}

#[tokio::test]
async fn completion_deadline_overrun_is_timeout_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "too late"}}]
                }));
        })
        .await;

    let provider = HttpCompletionProvider::new(
        client(Duration::from_millis(50)),
        endpoint(&server, "/chat/completions"),
        None,
        "test-llm",
    );

    let err = provider.complete("prompt", 0.3, 100).await.unwrap_err();
    assert!(matches!(
        err,
        QaError::Generation {
            cause: GenerationFailure::Timeout,
            ..
        }
    ));
}
