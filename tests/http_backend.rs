//! Integration tests for the HTTP backend.
//!
//! A wiremock server stands in for the platform API.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skyway::archive::Archive;
use skyway::backend::http::{HttpBackend, ARCHIVE_DIGEST_HEADER, PROJECT_TOKEN_HEADER};
use skyway::backend::{Backend, BackendError, LogLine, LogSink, LogTarget, UploadRequest};
use skyway::core::config::Credentials;
use skyway::core::types::{
    CommitMeta, DeploymentId, EnvironmentId, GitInfo, ProjectId, ServiceId,
};
use skyway::deploy::monitor::{Backoff, LogMonitor, RetryPolicy};
use skyway::deploy::report::RecordingConsole;
use skyway::deploy::trace::NoopTracer;

#[derive(Default)]
struct Lines(Mutex<Vec<String>>);

impl LogSink for Lines {
    fn line(&self, line: &LogLine) {
        self.0.lock().unwrap().push(line.message.clone());
    }
}

impl Lines {
    fn get(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn session(server: &MockServer) -> HttpBackend {
    HttpBackend::new(server.uri(), Some(Credentials::Session("tok".into())))
        .with_poll_interval(Duration::from_millis(5))
}

fn project_id() -> ProjectId {
    ProjectId::new("prj_1").unwrap()
}

fn target(deployment: Option<&str>) -> LogTarget {
    LogTarget {
        project_id: project_id(),
        environment_id: EnvironmentId::new("env_1").unwrap(),
        deployment_id: deployment.map(|d| DeploymentId::new(d).unwrap()),
    }
}

#[tokio::test]
async fn get_project_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "prj_1",
            "name": "shop",
            "services": [{"id": "svc_web", "name": "web"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let project = session(&server).get_project(&project_id()).await.unwrap();

    assert_eq!(project.name, "shop");
    assert_eq!(project.services[0].id.as_str(), "svc_web");
}

#[tokio::test]
async fn project_token_uses_dedicated_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_1"))
        .and(header(PROJECT_TOKEN_HEADER, "scoped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "prj_1",
            "name": "shop"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri(), Some(Credentials::Project("scoped".into())));
    let project = backend.get_project(&project_id()).await.unwrap();

    assert!(project.services.is_empty());
}

#[tokio::test]
async fn resolve_environment_by_exact_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_1/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "env_stg", "name": "staging"},
            {"id": "env_prod", "name": "production"}
        ])))
        .mount(&server)
        .await;

    let backend = session(&server);
    let env = backend
        .resolve_environment(&project_id(), "production")
        .await
        .unwrap();
    assert_eq!(env.id.as_str(), "env_prod");

    let missing = backend.resolve_environment(&project_id(), "prod").await;
    assert!(matches!(missing, Err(BackendError::NotFound(_))));
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(path("/projects/unauthorized"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(path("/projects/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "project not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(path("/projects/busy"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/projects/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let backend = session(&server);
    let get = |id: &str| {
        let id = ProjectId::new(id).unwrap();
        let backend = &backend;
        async move { backend.get_project(&id).await.unwrap_err() }
    };

    assert!(matches!(get("unauthorized").await, BackendError::AuthFailed(_)));
    assert_eq!(
        get("missing").await,
        BackendError::NotFound("project not found".into())
    );
    assert_eq!(get("busy").await, BackendError::RateLimited);
    assert_eq!(
        get("broken").await,
        BackendError::ApiError {
            status: 500,
            message: "boom".into()
        }
    );
}

#[tokio::test]
async fn missing_credentials_fail_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri(), None);
    let err = backend.get_project(&project_id()).await.unwrap_err();

    assert_eq!(err, BackendError::AuthRequired);
}

#[tokio::test]
async fn upload_is_multipart_with_digest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/prj_1/environments/env_1/up"))
        .and(header(ARCHIVE_DIGEST_HEADER, "cafebabe"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://dash/build/9",
            "deploymentDomain": "shop.up.skyway.app",
            "deploymentId": "dep_9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = UploadRequest {
        project_id: project_id(),
        environment_id: EnvironmentId::new("env_1").unwrap(),
        service_id: Some(ServiceId::new("svc_web").unwrap()),
        root_dir: "/work/shop".into(),
        git_info: GitInfo {
            is_repo: true,
            repo_name: "shop".into(),
            branch: "main".into(),
            commit: CommitMeta {
                hash: "abc123".into(),
                message: "Ship it".into(),
                author: "Test User".into(),
            },
            error: None,
        },
    };
    let archive = Archive {
        bytes: b"not really gzip".to_vec(),
        file_count: 1,
        sha256: "cafebabe".into(),
    };

    let result = session(&server).upload(&request, archive).await.unwrap();
    assert_eq!(result.url, "https://dash/build/9");
    assert_eq!(result.deployment_id.unwrap().as_str(), "dep_9");

    let received = server.received_requests().await.unwrap();
    let content_type = received[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("name=\"metadata\""));
    assert!(body.contains("name=\"archive\""));
    assert!(body.contains("\"serviceId\":\"svc_web\""));
    assert!(body.contains("\"rootDirName\":\"shop\""));
    assert!(body.contains("\"hash\":\"abc123\""));
    assert!(body.contains("not really gzip"));
}

#[tokio::test]
async fn build_logs_page_until_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_1/environments/env_1/builds/active/logs"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "BUILDING",
            "lines": [{"message": "Step 1"}, {"message": "Step 2"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_1/environments/env_1/builds/active/logs"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "lines": [{"message": "Done", "timestamp": "2026-01-01T00:00:00Z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lines = Lines::default();
    session(&server)
        .fetch_active_build_logs(&target(None), 0, &lines)
        .await
        .unwrap();

    assert_eq!(lines.get(), vec!["Step 1", "Step 2", "Done"]);
}

#[tokio::test]
async fn monitor_retry_does_not_repeat_build_lines() {
    let server = MockServer::start().await;
    let logs = "/projects/prj_1/environments/env_1/builds/active/logs";
    Mock::given(method("GET"))
        .and(path(logs))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "BUILDING",
            "lines": [{"message": "step 1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(logs))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(logs))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "lines": [{"message": "step 2"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_1/environments/env_1/deployments/latest/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lines": []})))
        .mount(&server)
        .await;

    let console = RecordingConsole::new();
    let monitor = LogMonitor::default().with_retry(RetryPolicy {
        max_attempts: 3,
        backoff: Backoff::Linear(Duration::from_millis(10)),
    });
    let report = monitor
        .run(
            &session(&server),
            &target(None),
            &console,
            &console,
            &NoopTracer,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.build_attempts, 2);
    assert_eq!(console.log_lines(), vec!["step 1", "step 2"]);
}

#[tokio::test]
async fn no_active_build_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(path("/projects/prj_1/environments/env_1/builds/active/logs"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "no active build"})),
        )
        .mount(&server)
        .await;

    let lines = Lines::default();
    let err = session(&server)
        .fetch_active_build_logs(&target(None), 0, &lines)
        .await
        .unwrap_err();

    assert_eq!(err, BackendError::NotFound("no active build".into()));
}

#[tokio::test]
async fn deployment_logs_request_bounded_tail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_1/environments/env_1/deployments/dep_9/logs"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lines": [{"message": "a"}, {"message": "b"}, {"message": "c"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lines = Lines::default();
    session(&server)
        .stream_deployment_logs(&target(Some("dep_9")), 2, &lines)
        .await
        .unwrap();

    assert_eq!(lines.get(), vec!["b", "c"]);
}

#[tokio::test]
async fn deployment_logs_default_to_latest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_1/environments/env_1/deployments/latest/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lines": []})))
        .expect(1)
        .mount(&server)
        .await;

    let lines = Lines::default();
    session(&server)
        .stream_deployment_logs(&target(None), 1000, &lines)
        .await
        .unwrap();

    assert!(lines.get().is_empty());
}
