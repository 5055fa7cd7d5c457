//! Client-level services: embeddings and user context.

mod common;

use pretty_assertions::assert_eq;

use common::*;
use genaiclient::error::{ErrorKind, GenaiError};
use genaiclient::prelude::*;
use genaiclient::store::StoreError;

#[tokio::test]
async fn embed_uses_default_model_without_options() {
    let (client, inference) = mock_client();
    inference.queue_embedding(Ok(vec![0.1, 0.2, 0.3]));

    let vector = client.embed("hello world", None).await.expect("embed");
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);

    let embeds = inference.embeds();
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0].model, "gemini-embedding-001");
    assert_eq!(embeds[0].text, "hello world");
    assert!(embeds[0].config.is_none());
}

#[tokio::test]
async fn embed_dimensions_request_retrieval_documents() {
    let (client, inference) = mock_client();
    inference.queue_embedding(Ok(vec![1.0; 8]));

    let options = EmbedOptions {
        model: Some("text-embedding-004".to_string()),
        dimensions: Some(8),
    };
    let vector = client.embed("doc", Some(&options)).await.expect("embed");
    assert_eq!(vector.len(), 8);

    let embed = &inference.embeds()[0];
    assert_eq!(embed.model, "text-embedding-004");
    let config = embed.config.as_ref().expect("config");
    assert_eq!(config.output_dimensionality, Some(8));
    assert_eq!(config.task_type.as_deref(), Some("RETRIEVAL_DOCUMENT"));
}

#[tokio::test]
async fn embed_zero_dimensions_keeps_model_default() {
    let (client, inference) = mock_client();
    inference.queue_embedding(Ok(vec![0.5]));

    let options = EmbedOptions {
        dimensions: Some(0),
        ..Default::default()
    };
    client.embed("doc", Some(&options)).await.expect("embed");
    assert!(inference.embeds()[0].config.is_none());
}

#[tokio::test]
async fn embed_rejects_empty_text() {
    let (client, inference) = mock_client();

    let err = client.embed("", None).await.expect_err("empty");
    assert_eq!(err.kind(), ErrorKind::ContentConversion);
    assert_eq!(err.root().kind(), ErrorKind::Validation);
    assert_eq!(inference.call_count(), 0);
}

#[tokio::test]
async fn embed_failure_is_wrapped() {
    let (client, inference) = mock_client();
    inference.queue_embedding(Err(GenaiError::api(400, "bad input")));

    let err = client.embed("doc", None).await.expect_err("failure");
    assert_eq!(err.kind(), ErrorKind::Embed);
    assert!(matches!(err.root(), GenaiError::Api { status: 400, .. }));
}

#[tokio::test]
async fn embed_bulk_preserves_order() {
    let (client, inference) = mock_client();
    inference.queue_embedding(Ok(vec![1.0]));
    inference.queue_embedding(Ok(vec![2.0]));
    inference.queue_embedding(Ok(vec![3.0]));

    let vectors = client
        .embed_bulk(&["a", "b", "c"], None)
        .await
        .expect("bulk");
    assert_eq!(vectors, vec![vec![1.0], vec![2.0], vec![3.0]]);

    let texts: Vec<String> = inference.embeds().into_iter().map(|e| e.text).collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn embed_bulk_reports_failing_index_with_truncated_value() {
    let (client, inference) = mock_client();
    inference.queue_embedding(Ok(vec![1.0]));
    inference.queue_embedding(Err(GenaiError::api(500, "boom")));

    let long = "x".repeat(400);
    let texts = vec!["first".to_string(), long, "never".to_string()];
    let err = client.embed_bulk(&texts, None).await.expect_err("failure");

    let message = err.to_string();
    assert!(message.contains("bulk item 1"), "unexpected error: {message}");
    assert!(message.contains(&format!("{}...", "x".repeat(250))));
    assert!(!message.contains(&"x".repeat(251)));
    assert_eq!(inference.embeds().len(), 2);
}

#[tokio::test]
async fn user_context_round_trips() {
    let (client, _inference) = mock_client();

    let user = client
        .set_user_context("user-1", "Vegetarian.")
        .await
        .expect("save");
    assert_eq!(user, User::new("user-1", "Vegetarian."));
    assert_eq!(
        client.get_user("user-1").await.expect("load"),
        Some(user.clone())
    );

    client
        .set_user_context("user-1", "Vegan.")
        .await
        .expect("overwrite");
    assert_eq!(
        client
            .get_user("user-1")
            .await
            .expect("load")
            .map(|u| u.context),
        Some("Vegan.".to_string())
    );

    client.remove_user("user-1").await.expect("remove");
    assert_eq!(client.get_user("user-1").await.expect("load"), None);
}

#[tokio::test]
async fn store_failures_surface_as_persistence_errors() {
    let inference = MockInference::new();
    let backend = FlakyBackend::new();
    let client = client_with(inference, Store::new(backend.clone()));
    backend.fail_writes(true);

    let err = client
        .new_agent(AgentConfig::default())
        .await
        .expect_err("write fails");
    assert_eq!(err.kind(), ErrorKind::Persistence);

    let err = client
        .set_user_context("user-1", "ctx")
        .await
        .expect_err("write fails");
    assert!(matches!(
        err,
        GenaiError::Persistence {
            source: StoreError::Unavailable(_),
            ..
        }
    ));
}
