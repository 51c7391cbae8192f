use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use planstream::planning::{Proposal, TaskCandidate, TaskRecord};
use planstream::server::{build_router, AppState, StatusFrame, WireEvent};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

async fn get(state: AppState, uri: &str) -> (StatusCode, Option<String>, String) {
    let app = build_router(Arc::new(state));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Last frame of each task id, in arrival order
fn final_records(frames: &[WireEvent]) -> Vec<TaskRecord> {
    let mut records: Vec<TaskRecord> = Vec::new();
    for frame in frames {
        if let WireEvent::Task(t) = frame {
            match records.last_mut() {
                Some(last) if last.id == t.id => *last = t.clone(),
                _ => records.push(t.clone()),
            }
        }
    }
    records
}

#[tokio::test]
async fn test_stream_tasks_happy_path() {
    let oracle = Arc::new(ReplayOracle::tasks(3, "Set up the database"));
    let state = AppState::new(test_config(), oracle.clone());

    let (status, content_type, body) = get(state, "/api/stream_tasks?prompt=todo%20app").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/event-stream"));

    let frames = parse_frames(&body);
    // 19 chars at chunk 4 -> 5 prefixes + 1 empty frame per task
    assert_eq!(frames.len(), 3 * 6 + 1);
    assert_eq!(frames.last(), Some(&WireEvent::completed()));
    assert_eq!(frames.iter().filter(|f| f.is_status()).count(), 1);

    let records = final_records(&frames);
    assert_eq!(records.len(), 3);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.title, format!("Task {}", i + 1));
        assert_eq!(record.description, "Set up the database");
        assert_eq!(record.tags, vec!["Backend".to_string()]);
    }
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_stream_frames_grow_monotonically() {
    let oracle = Arc::new(ReplayOracle::tasks(1, "Write integration tests"));
    let state = AppState::new(test_config(), oracle);

    let (_, _, body) = get(state, "/api/stream_tasks?prompt=x").await;
    let frames = parse_frames(&body);

    let descriptions: Vec<String> = frames
        .iter()
        .filter_map(|f| match f {
            WireEvent::Task(t) => Some(t.description.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(descriptions[0], "");
    for pair in descriptions.windows(2) {
        assert!(pair[1].starts_with(&pair[0]));
    }
    assert_eq!(descriptions.last().unwrap(), "Write integration tests");
}

#[tokio::test]
async fn test_stream_respects_task_cap() {
    let oracle = Arc::new(ReplayOracle::tasks(50, "d"));
    let mut config = test_config();
    config.planner.max_tasks = 4;
    let state = AppState::new(config, oracle.clone());

    let (_, _, body) = get(state, "/api/stream_tasks?prompt=big%20idea").await;
    let frames = parse_frames(&body);

    assert_eq!(final_records(&frames).len(), 4);
    assert_eq!(frames.last(), Some(&WireEvent::completed()));
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_stream_reports_backend_failure_without_details() {
    let oracle = Arc::new(ReplayOracle::new(vec![
        Ok(Proposal::Task(TaskCandidate::new("Schema", "Tables"))),
        Err("401 from https://api.example.com?key=hunter2".to_string()),
    ]));
    let state = AppState::new(test_config(), oracle);

    let (status, _, body) = get(state, "/api/stream_tasks?prompt=app").await;
    assert_eq!(status, StatusCode::OK);

    let frames = parse_frames(&body);
    assert_eq!(final_records(&frames).len(), 1);
    match frames.last() {
        Some(WireEvent::Status(StatusFrame::Error { detail })) => {
            assert!(!detail.is_empty());
            assert!(!detail.contains("hunter2"));
        }
        other => panic!("expected error frame, got {:?}", other),
    }
    assert_eq!(frames.iter().filter(|f| f.is_status()).count(), 1);
}

#[tokio::test]
async fn test_stream_finished_immediately() {
    let oracle = Arc::new(ReplayOracle::new(vec![Ok(Proposal::Finished)]));
    let state = AppState::new(test_config(), oracle);

    let (_, _, body) = get(state, "/api/stream_tasks?prompt=nothing").await;
    assert_eq!(parse_frames(&body), vec![WireEvent::completed()]);
    assert!(body.contains("data: {\"status\":\"completed\"}"));
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    for uri in ["/api/stream_tasks?prompt=", "/api/stream_tasks?prompt=%20%20", "/api/stream_tasks"] {
        let oracle = Arc::new(ReplayOracle::tasks(1, "d"));
        let state = AppState::new(test_config(), oracle.clone());

        let (status, _, body) = get(state, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], "EMPTY_PROMPT");
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = AppState::new(test_config(), Arc::new(ReplayOracle::new(vec![])));

    let (status, _, body) = get(state, "/api/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["provider"], "gemini");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_config_endpoint_hides_key() {
    let state = AppState::new(test_config(), Arc::new(ReplayOracle::new(vec![])));

    let (status, _, body) = get(state, "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("test-key"));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["model"], "gemini-2.5-flash");
    assert_eq!(json["max_tasks"], 10);
    assert_eq!(json["chunk_size"], 4);
}
