//! Tests for the HTTP ingestion backend against a mock server

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use twin_cli::api::{HttpBackend, IngestBackend, StatusReport, TransportError};
use twin_cli::observer::NoopObserver;
use twin_cli::scheduler::RecordingScheduler;
use twin_cli::validation::{CandidateFile, ValidatedFile, ValidationRules};
use twin_cli::Ingestor;
use twin_common::{FailureKind, Phase, TaskId};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::with_timeout(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
}

fn validated(name: &str, body: &[u8]) -> ValidatedFile {
    ValidationRules::default()
        .validate(CandidateFile::in_memory(name, body.to_vec()))
        .unwrap()
}

fn task_id(id: &str) -> TaskId {
    TaskId::new(id).unwrap()
}

#[tokio::test]
async fn test_submit_sends_multipart_file_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload/"))
        .and(body_string_contains("name=\"file\"; filename=\"chat.txt\""))
        .and(body_string_contains("alice: hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "task_id": "t1",
            "status": "processing",
            "message": "File uploaded successfully, processing started"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let submission = backend(&server)
        .submit(&validated("chat.txt", b"alice: hello"))
        .await
        .unwrap();

    assert_eq!(submission.task_id, task_id("t1"));
    assert_eq!(
        submission.message.as_deref(),
        Some("File uploaded successfully, processing started")
    );
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/upload/status/t1"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "processing"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = backend(&server)
        .with_token("secret")
        .poll_status(&task_id("t1"))
        .await
        .unwrap();

    assert_eq!(report, StatusReport::processing());
}

#[tokio::test]
async fn test_upload_response_without_task_id_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"task_id": ""})),
        )
        .mount(&server)
        .await;

    let err = backend(&server)
        .submit(&validated("chat.txt", b"hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_upload_rejection_surfaces_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"detail": "File type not allowed"})),
        )
        .mount(&server)
        .await;

    let err = backend(&server)
        .submit(&validated("chat.txt", b"hi"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransportError::Status {
            status: 400,
            detail: "File type not allowed".to_string()
        }
    );
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_status_decoding() {
    let server = MockServer::start().await;

    let cases = [
        (
            "flat",
            serde_json::json!({"status": "completed", "persona_id": "p1"}),
            StatusReport::completed("p1"),
        ),
        (
            "nested",
            serde_json::json!({"status": "completed", "result": {"persona_id": "p2"}}),
            StatusReport::completed("p2"),
        ),
        (
            "progress",
            serde_json::json!({"status": "processing", "progress": 42.0, "message": "Parsing"}),
            StatusReport::Processing {
                progress: Some(42),
                message: Some("Parsing".to_string()),
            },
        ),
        (
            "failed",
            serde_json::json!({"status": "failed", "error": "bad format"}),
            StatusReport::failed("bad format"),
        ),
    ];

    for (id, body, _) in &cases {
        Mock::given(method("GET"))
            .and(path(format!("/api/upload/status/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;
    }

    let backend = backend(&server);
    for (id, _, expected) in cases {
        let report = backend.poll_status(&task_id(id)).await.unwrap();
        assert_eq!(report, expected, "case {id}");
    }
}

#[tokio::test]
async fn test_unknown_status_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/upload/status/t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "queued"})),
        )
        .mount(&server)
        .await;

    let err = backend(&server).poll_status(&task_id("t1")).await.unwrap_err();
    assert!(matches!(err, TransportError::MalformedPayload(ref msg) if msg.contains("queued")));
}

#[tokio::test]
async fn test_status_errors_map_to_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/upload/status/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"detail": "Task not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/upload/status/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let backend = backend(&server);

    let err = backend.poll_status(&task_id("missing")).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 404,
            detail: "Task not found".to_string()
        }
    );

    let err = backend.poll_status(&task_id("broken")).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 500,
            detail: "Internal Server Error".to_string()
        }
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_file_grown_after_validation_is_not_uploaded() {
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let chat = dir.path().join("chat.txt");
    std::fs::write(&chat, b"0123456789").unwrap();
    let file = ValidationRules::new([".txt"], 16)
        .validate(CandidateFile::from_path(&chat).unwrap())
        .unwrap();

    std::fs::write(&chat, vec![b'x'; 1010]).unwrap();

    let err = backend(&server).submit(&file).await.unwrap_err();
    assert!(matches!(err, TransportError::Read(ref msg) if msg.contains("changed")));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_health_check_against_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(backend(&server).health_check().await);
}

#[tokio::test]
async fn test_health_check_treats_error_status_as_down() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(!backend(&server).health_check().await);
}

#[tokio::test]
async fn test_unreachable_server_is_connect_error() {
    let backend =
        HttpBackend::with_timeout("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();

    let err = backend.poll_status(&task_id("t1")).await.unwrap_err();
    assert!(matches!(err, TransportError::Connect(_)), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_full_ingestion_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"task_id": "t1"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/upload/status/t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "processing"})),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/upload/status/t1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "completed", "persona_id": "p1"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("export.json");
    std::fs::write(&file, br#"[{"from": "alice", "text": "hi"}]"#).unwrap();

    let scheduler = RecordingScheduler::new();
    let ingestor = Ingestor::new(backend(&server)).with_scheduler(scheduler.clone());

    let task = ingestor
        .start_ingestion(
            CandidateFile::from_path(&file).unwrap(),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(task.phase(), Phase::Succeeded);
    assert_eq!(task.result_resource_id(), Some("p1"));
    assert_eq!(task.attempt_count(), 3);
    assert_eq!(scheduler.delays().len(), 2);
}

#[tokio::test]
async fn test_server_error_fails_ingestion_as_transport() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let ingestor = Ingestor::new(backend(&server)).with_scheduler(RecordingScheduler::new());
    let task = ingestor
        .start_ingestion(
            CandidateFile::in_memory("chat.txt", b"hi".to_vec()),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(task.phase(), Phase::Failed);
    assert_eq!(task.failure_kind(), Some(FailureKind::Transport));
    assert!(task.error_detail().unwrap().contains("503"));
}
