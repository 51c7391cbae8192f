use super::common::*;
use anyhow::Result;
use mockito::{Matcher, Server};
use planstream::config::LlmProvider;
use planstream::llm::create_client;
use planstream::planning::{GenerationOracle, LlmOracle, OracleError, Proposal, TaskRecord};

fn gemini_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 40 }
    })
    .to_string()
}

fn openai_body(text: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    })
    .to_string()
}

#[tokio::test]
async fn test_gemini_oracle_proposes_task() -> Result<()> {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body(
            r#"{"task": {"id": "t1", "title": "Design schema", "description": "Users and habits tables", "tags": ["Backend"]}, "is_finished": false}"#,
        ))
        .create_async()
        .await;

    let client = create_client(&llm_config(LlmProvider::Gemini, Some(server.url())))?;
    let oracle = LlmOracle::new(client);

    match oracle.propose("habit tracker", &[]).await? {
        Proposal::Task(task) => {
            assert_eq!(task.id.as_deref(), Some("t1"));
            assert_eq!(task.title, "Design schema");
            assert_eq!(task.tags, vec!["Backend".to_string()]);
        }
        other => panic!("expected a task, got {:?}", other),
    }

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_gemini_oracle_sends_history() -> Result<()> {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(Matcher::Any)
        .match_body(Matcher::Regex("Set up CI".to_string()))
        .with_status(200)
        .with_body(gemini_body(r#"{"task": null, "is_finished": true}"#))
        .create_async()
        .await;

    let client = create_client(&llm_config(LlmProvider::Gemini, Some(server.url())))?;
    let oracle = LlmOracle::new(client);
    let history = vec![TaskRecord::new("Set up CI", "GitHub Actions pipeline")];

    assert_eq!(oracle.propose("habit tracker", &history).await?, Proposal::Finished);

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_backend_error_status_is_backend_failure() -> Result<()> {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"error": {"message": "internal"}}"#)
        .create_async()
        .await;

    let client = create_client(&llm_config(LlmProvider::Gemini, Some(server.url())))?;
    let oracle = LlmOracle::new(client);

    let err = oracle.propose("idea", &[]).await.unwrap_err();
    assert!(matches!(err, OracleError::Backend(_)));
    assert!(err.to_string().contains("500"));
    assert!(!err.public_detail().contains("internal"));
    Ok(())
}

#[tokio::test]
async fn test_openai_oracle_tolerates_fenced_reply() -> Result<()> {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "response_format": { "type": "json_object" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(openai_body(
            "```json\n{\"task\": {\"title\": \"Build API\", \"description\": \"REST endpoints\"}, \"is_finished\": false}\n```",
        ))
        .create_async()
        .await;

    let client = create_client(&llm_config(LlmProvider::OpenAI, Some(server.url())))?;
    let oracle = LlmOracle::new(client);

    match oracle.propose("todo app", &[]).await? {
        Proposal::Task(task) => {
            assert!(task.id.is_none());
            assert_eq!(task.title, "Build API");
            assert!(task.tags.is_empty());
        }
        other => panic!("expected a task, got {:?}", other),
    }

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_openai_oracle_rejects_prose() -> Result<()> {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(openai_body("Sure! Here is the next task: build the API."))
        .create_async()
        .await;

    let client = create_client(&llm_config(LlmProvider::OpenAI, Some(server.url())))?;
    let oracle = LlmOracle::new(client);

    let err = oracle.propose("todo app", &[]).await.unwrap_err();
    assert!(matches!(err, OracleError::Malformed(_)));
    Ok(())
}

#[tokio::test]
async fn test_anthropic_oracle_finishes() -> Result<()> {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{ "type": "text", "text": "{\"is_finished\": true}" }],
                "usage": { "input_tokens": 12, "output_tokens": 3 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = create_client(&llm_config(LlmProvider::Anthropic, Some(server.url())))?;
    let oracle = LlmOracle::new(client);

    assert_eq!(oracle.propose("idea", &[]).await?, Proposal::Finished);

    mock.assert_async().await;
    Ok(())
}
