//! End-to-end tests of the skyway binary.
//!
//! Each test points `SKYWAY_CONFIG` and `HOME` at a private temp directory and
//! clears the credential variables so the developer's own setup never leaks in.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn skyway(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("skyway").unwrap();
    let home = config.parent().unwrap();
    cmd.env("SKYWAY_CONFIG", config)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("SKYWAY_TOKEN")
        .env_remove("SKYWAY_PROJECT_TOKEN")
        .env_remove("SKYWAY_PROJECT_ID")
        .env_remove("SKYWAY_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

struct Workspace {
    home: TempDir,
    project: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("server.js"), "listen(8080)\n").unwrap();
        Self {
            home: TempDir::new().unwrap(),
            project,
        }
    }

    fn config(&self) -> std::path::PathBuf {
        self.home.path().join("config.toml")
    }

    fn cmd(&self) -> Command {
        let mut cmd = skyway(&self.config());
        cmd.arg("--cwd").arg(self.project.path());
        cmd
    }
}

#[test]
fn help_lists_commands() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("logs"))
        .stdout(predicate::str::contains("link"));
}

#[test]
fn completion_script_for_bash() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skyway"));
}

#[test]
fn link_writes_config() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["link", "prj_77", "-e", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("to project prj_77"));

    let written = std::fs::read_to_string(ws.config()).unwrap();
    let canonical = ws.project.path().canonicalize().unwrap();
    assert!(written.contains("prj_77"));
    assert!(written.contains("staging"));
    assert!(written.contains(canonical.to_string_lossy().as_ref()));
}

#[test]
fn link_rejects_malformed_project_id() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["link", "not a project"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));

    assert!(!ws.config().exists());
}

#[test]
fn up_without_link_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("up")
        .env("SKYWAY_TOKEN", "tok")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("skyway link"));
}

#[test]
fn up_without_credentials_fails() {
    let ws = Workspace::new();
    ws.cmd().args(["link", "prj_77"]).assert().success();

    ws.cmd()
        .arg("up")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not logged in"));
}

#[test]
fn missing_cwd_fails() {
    let ws = Workspace::new();
    skyway(&ws.config())
        .arg("--cwd")
        .arg(ws.project.path().join("nope"))
        .arg("up")
        .assert()
        .code(1);
}

async fn platform() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "prj_77",
            "name": "shop",
            "services": [{"id": "svc_web", "name": "web"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/prj_77/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "env_prod", "name": "production"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/prj_77/environments/env_prod/up"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://dash.skyway.dev/build/5",
            "deploymentDomain": "shop.up.skyway.app",
            "deploymentId": "dep_5"
        })))
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn up_detach_uploads_once() {
    let server = platform().await;
    let ws = Workspace::new();
    let uri = server.uri();

    tokio::task::spawn_blocking(move || {
        ws.cmd().args(["link", "prj_77"]).assert().success();
        ws.cmd()
            .args(["--no-interactive", "up", "--detach"])
            .env("SKYWAY_TOKEN", "tok")
            .env("SKYWAY_API_URL", &uri)
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Build logs available at https://dash.skyway.dev/build/5",
            ))
            .stdout(predicate::str::contains("Deployment live").not());
    })
    .await
    .unwrap();

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn up_follows_logs_to_public_url() {
    let server = platform().await;
    Mock::given(method("GET"))
        .and(path(
            "/projects/prj_77/environments/env_prod/builds/active/logs",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "lines": [{"message": "npm run build"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/projects/prj_77/environments/env_prod/deployments/dep_5/logs",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lines": [{"message": "listening on 8080"}]
        })))
        .mount(&server)
        .await;

    let ws = Workspace::new();
    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        ws.cmd().args(["link", "prj_77"]).assert().success();
        ws.cmd()
            .args(["--no-interactive", "up"])
            .env("SKYWAY_TOKEN", "tok")
            .env("SKYWAY_API_URL", &uri)
            .assert()
            .success()
            .stdout(predicate::str::contains("npm run build"))
            .stdout(predicate::str::contains("Build Completed"))
            .stdout(predicate::str::contains("listening on 8080"))
            .stdout(predicate::str::contains(
                "Deployment live at https://shop.up.skyway.app",
            ));
    })
    .await
    .unwrap();
}
