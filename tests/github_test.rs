use std::io::Read;
use std::sync::mpsc;
use std::thread;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};

use leetsync_host::github::{commit_message, target_path, write_body, GithubClient};
use leetsync_host::record::{Difficulty, SubmissionRecord};
use leetsync_host::settings::{FileNaming, FileStructure, SyncSettings};
use leetsync_host::SyncError;

fn sample_record() -> SubmissionRecord {
    SubmissionRecord {
        problem_title: "Two Sum".to_string(),
        problem_slug: "two-sum".to_string(),
        problem_id: "1".to_string(),
        difficulty: Difficulty::Easy,
        language: "python".to_string(),
        code: "print(1)".to_string(),
        ..SubmissionRecord::default()
    }
}

fn sample_settings() -> SyncSettings {
    SyncSettings {
        github_token: "t".to_string(),
        github_owner: "o".to_string(),
        github_repo: "r".to_string(),
        ..SyncSettings::default()
    }
}

struct Recorded {
    method: String,
    url: String,
    body: String,
    auth: Option<String>,
}

/// Serve a fixed sequence of responses on a local port and record what the
/// client sent for each of them.
fn spawn_remote(responses: Vec<(u16, Value)>) -> (String, mpsc::Receiver<Recorded>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let mut request = match server.recv() {
                Ok(r) => r,
                Err(_) => return,
            };
            let mut req_body = String::new();
            let _ = request.as_reader().read_to_string(&mut req_body);
            let auth = request
                .headers()
                .iter()
                .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case("authorization"))
                .map(|h| h.value.as_str().to_string());
            let _ = tx.send(Recorded {
                method: format!("{:?}", request.method()),
                url: request.url().to_string(),
                body: req_body,
                auth,
            });
            let response = tiny_http::Response::from_string(body.to_string())
                .with_status_code(tiny_http::StatusCode(status));
            let _ = request.respond(response);
        }
    });

    (format!("http://127.0.0.1:{}", port), rx)
}

fn client_for(base: &str) -> GithubClient {
    GithubClient::from_settings(&sample_settings())
        .unwrap()
        .with_api_base(base)
}

#[test]
fn target_path_by_difficulty_and_problem_name() {
    let path = target_path(
        &sample_record(),
        FileStructure::ByDifficulty,
        FileNaming::ProblemName,
    );
    assert_eq!(path, "easy/two-sum.py");
}

#[test]
fn target_path_by_language_with_id_prefix() {
    let path = target_path(
        &sample_record(),
        FileStructure::ByLanguage,
        FileNaming::IdAndName,
    );
    assert_eq!(path, "python/1-two-sum.py");
}

#[test]
fn target_path_flat_and_unrecognized_language() {
    let mut record = sample_record();
    record.language = "brainfuck".to_string();
    let path = target_path(&record, FileStructure::Flat, FileNaming::ProblemName);
    assert_eq!(path, "two-sum.txt");
}

#[test]
fn write_body_omits_sha_on_create() {
    let body = write_body("Add Two Sum (Easy)", "cHJpbnQoMSk=", "main", None);
    assert!(body.get("sha").is_none(), "create must not carry a sha");
    assert_eq!(body["branch"], "main");
    assert_eq!(body["content"], "cHJpbnQoMSk=");
}

#[test]
fn write_body_carries_sha_on_update() {
    let body = write_body("Update Two Sum (Easy)", "cHJpbnQoMSk=", "main", Some("abc123"));
    assert_eq!(body["sha"], "abc123");
}

#[test]
fn commit_message_distinguishes_create_and_update() {
    let record = sample_record();
    assert_eq!(commit_message(&record, false), "Add Two Sum (Easy)");
    assert_eq!(commit_message(&record, true), "Update Two Sum (Easy)");
}

#[test]
fn missing_token_fails_before_any_network_call() {
    let mut incomplete = sample_settings();
    incomplete.github_token = String::new();

    match GithubClient::from_settings(&incomplete) {
        Err(SyncError::Config(msg)) => {
            assert!(msg.contains("token"), "actionable message, got: {}", msg)
        }
        _ => panic!("expected a config error"),
    }
}

#[test]
fn test_connection_returns_remote_metadata() {
    let (base, rx) = spawn_remote(vec![(200, json!({"full_name": "o/r", "private": true}))]);

    let info = client_for(&base).test_connection().unwrap();
    assert_eq!(info.full_name, "o/r");
    assert!(info.private);

    let seen = rx.recv().unwrap();
    assert_eq!(seen.method, "Get");
    assert_eq!(seen.url, "/repos/o/r");
    assert_eq!(seen.auth.as_deref(), Some("Bearer t"));
}

#[test]
fn test_connection_surfaces_remote_message_on_404() {
    let (base, _rx) = spawn_remote(vec![(404, json!({"message": "Not Found"}))]);

    match client_for(&base).test_connection() {
        Err(SyncError::Remote { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("expected remote error, got {:?}", other.map(|i| i.full_name)),
    }
}

#[test]
fn get_file_treats_404_as_absent() {
    let (base, rx) = spawn_remote(vec![(404, json!({"message": "Not Found"}))]);

    let found = client_for(&base).get_file("easy/two-sum.py").unwrap();
    assert!(found.is_none());

    let seen = rx.recv().unwrap();
    assert_eq!(seen.url, "/repos/o/r/contents/easy/two-sum.py?ref=main");
}

#[test]
fn get_file_returns_revision_identifier() {
    let (base, _rx) = spawn_remote(vec![(
        200,
        json!({"sha": "abc123", "path": "easy/two-sum.py"}),
    )]);

    let found = client_for(&base).get_file("easy/two-sum.py").unwrap();
    let file = found.expect("file should be reported present");
    assert_eq!(file.sha, "abc123");
    assert_eq!(file.path, "easy/two-sum.py");
}

#[test]
fn get_file_propagates_other_failures() {
    let (base, _rx) = spawn_remote(vec![(500, json!({"message": "boom"}))]);

    match client_for(&base).get_file("easy/two-sum.py") {
        Err(SyncError::Remote { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        _ => panic!("a non-404 failure must abort, not read as absence"),
    }
}

#[test]
fn sync_creates_when_file_is_absent() {
    let remote_response = json!({
        "content": {"path": "easy/two-sum.py", "sha": "newsha"},
        "commit": {"sha": "commitsha"},
    });
    let (base, rx) = spawn_remote(vec![
        (404, json!({"message": "Not Found"})),
        (201, remote_response.clone()),
    ]);

    let result = client_for(&base)
        .sync_submission(
            &sample_record(),
            FileStructure::ByDifficulty,
            FileNaming::ProblemName,
        )
        .unwrap();
    assert_eq!(result, remote_response, "remote response passes through verbatim");

    let lookup = rx.recv().unwrap();
    assert_eq!(lookup.method, "Get");
    assert_eq!(lookup.url, "/repos/o/r/contents/easy/two-sum.py?ref=main");

    let write = rx.recv().unwrap();
    assert_eq!(write.method, "Put");
    assert_eq!(write.url, "/repos/o/r/contents/easy/two-sum.py");
    let body: Value = serde_json::from_str(&write.body).unwrap();
    assert_eq!(body["content"], BASE64.encode("print(1)"));
    assert_eq!(body["branch"], "main");
    assert_eq!(body["message"], "Add Two Sum (Easy)");
    assert!(body.get("sha").is_none(), "create must not carry a sha");
}

#[test]
fn sync_updates_with_the_fetched_revision() {
    let (base, rx) = spawn_remote(vec![
        (200, json!({"sha": "abc123", "path": "easy/two-sum.py"})),
        (200, json!({"content": {"sha": "newsha"}})),
    ]);

    client_for(&base)
        .sync_submission(
            &sample_record(),
            FileStructure::ByDifficulty,
            FileNaming::ProblemName,
        )
        .unwrap();

    let _lookup = rx.recv().unwrap();
    let write = rx.recv().unwrap();
    let body: Value = serde_json::from_str(&write.body).unwrap();
    assert_eq!(body["sha"], "abc123");
    assert_eq!(body["message"], "Update Two Sum (Easy)");
}
