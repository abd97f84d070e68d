//! End-to-end tests for the API client against a canned HTTP server.
//!
//! The stub accepts a fixed number of connections, records each raw request,
//! and replies with pre-baked responses, which is enough to verify request
//! shapes, cookie handling, and error classification without a real backend.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use assert_matches::assert_matches;
use tempfile::TempDir;

use notes_client::api::{classify, Alert, ApiError, ApiHandle, Operation};
use notes_client::config::ServerOptions;
use notes_client::session::{SessionStore, StoredSession};

struct StubServer {
    base_url: String,
    requests: mpsc::Receiver<String>,
    handle: thread::JoinHandle<()>,
}

impl StubServer {
    /// Serves `responses` in order, one connection each, capturing the raw
    /// request (head plus body) for later assertions.
    fn start(responses: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server addr");
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            for response in responses {
                let (mut stream, _) = match listener.accept() {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let request = read_request(&mut stream);
                let _ = tx.send(request);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
            handle,
        }
    }

    fn next_request(&self) -> String {
        self.requests
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("stub server saw a request")
    }

    fn finish(self) {
        self.handle.join().expect("stub server thread");
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(_) => break,
        }
    }
    let head_end = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|idx| idx + 4)
        .unwrap_or(buf.len());
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn response(status_line: &str, extra_headers: &[&str], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {status_line}\r\n");
    for header in extra_headers {
        out.push_str(header);
        out.push_str("\r\n");
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));
    out
}

fn json_response(status_line: &str, body: &str) -> String {
    response(
        status_line,
        &["Content-Type: application/json"],
        body,
    )
}

fn connect(base_url: &str, temp: &TempDir) -> ApiHandle {
    let options = ServerOptions {
        base_url: base_url.to_string(),
        timeout_secs: 5,
    };
    let store = SessionStore::new(temp.path().join("session.json"));
    ApiHandle::connect(&options, store).expect("client connects")
}

const NOTE_LIST_BODY: &str = r#"{"notes":[
    {"id":1,"title":"first","content":"alpha","user_id":7,
     "created_at":"2025-06-01T12:00:00Z","updated_at":"2025-06-01T12:00:00Z"},
    {"id":2,"title":"second","content":"beta","user_id":7,
     "created_at":"2025-06-02T12:00:00Z","updated_at":"2025-06-02T13:00:00Z"}
]}"#;

#[test]
fn login_persists_cookie_and_replays_it() {
    let server = StubServer::start(vec![
        response(
            "200 OK",
            &[
                "Content-Type: application/json",
                "Set-Cookie: token=abc123; Path=/; HttpOnly; Max-Age=86400",
            ],
            r#"{"message":"Login successful","user_id":7,"username":"ada"}"#,
        ),
        json_response("200 OK", NOTE_LIST_BODY),
    ]);
    let temp = TempDir::new().expect("temp dir");
    let api = connect(&server.base_url, &temp);

    let user = api.login("ada@example.com", "hunter2").expect("login ok");
    assert_eq!(user.id, 7);
    assert_eq!(user.username, "ada");

    let login_request = server.next_request();
    assert!(login_request.starts_with("POST /api/auth/login HTTP/1.1"));
    assert!(login_request.contains(r#""email":"ada@example.com""#));

    let store = SessionStore::new(temp.path().join("session.json"));
    let stored = store.load().expect("session persisted");
    assert_eq!(stored.token, "abc123");
    assert_eq!(stored.username.as_deref(), Some("ada"));

    let notes = api.list_notes().expect("list ok");
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "first");

    let list_request = server.next_request();
    assert!(list_request.starts_with("GET /api/notes/list HTTP/1.1"));
    assert!(
        list_request.to_ascii_lowercase().contains("cookie: token=abc123"),
        "session cookie missing from {list_request}"
    );
    server.finish();
}

#[test]
fn persisted_session_is_loaded_on_connect() {
    let server = StubServer::start(vec![json_response(
        "200 OK",
        r#"{"id":7,"username":"ada","email":"ada@example.com"}"#,
    )]);
    let temp = TempDir::new().expect("temp dir");
    let store = SessionStore::new(temp.path().join("session.json"));
    store
        .save(&StoredSession::new("seeded-token".into(), Some("ada".into())))
        .expect("seed session");

    let api = connect(&server.base_url, &temp);
    let user = api.me().expect("session resumed");
    assert_eq!(user.username, "ada");

    let request = server.next_request();
    assert!(request.starts_with("GET /api/auth/me HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains("cookie: token=seeded-token"));
    server.finish();
}

#[test]
fn blank_fields_are_rejected_before_any_request() {
    // no connections expected; a request would make finish() hang forever
    let server = StubServer::start(vec![]);
    let temp = TempDir::new().expect("temp dir");
    let api = connect(&server.base_url, &temp);

    assert_matches!(
        api.create_note("", "body"),
        Err(ApiError::EmptyField("title"))
    );
    assert_matches!(
        api.create_note("title", "  "),
        Err(ApiError::EmptyField("content"))
    );
    assert_matches!(api.login("", "pw"), Err(ApiError::EmptyField("email")));
    assert_matches!(
        api.register("user", "a@b.c", ""),
        Err(ApiError::EmptyField("password"))
    );
    server.finish();
}

#[test]
fn unauthorized_list_classifies_as_login_required() {
    let server = StubServer::start(vec![response(
        "401 Unauthorized",
        &["Content-Type: text/plain; charset=utf-8"],
        "Unauthorized\n",
    )]);
    let temp = TempDir::new().expect("temp dir");
    let api = connect(&server.base_url, &temp);

    let err = api.list_notes().expect_err("401 surfaces");
    assert_matches!(
        &err,
        ApiError::Status { status, message }
            if status.as_u16() == 401 && message == "Unauthorized"
    );
    assert_matches!(classify(Operation::ListNotes, &err), Alert::LoginRequired);
    server.finish();
}

#[test]
fn duplicate_registration_classifies_as_duplicate_user() {
    let server = StubServer::start(vec![json_response(
        "500 Internal Server Error",
        r#"{"error":"user already exists"}"#,
    )]);
    let temp = TempDir::new().expect("temp dir");
    let api = connect(&server.base_url, &temp);

    let err = api
        .register("ada", "ada@example.com", "hunter2")
        .expect_err("500 surfaces");
    assert_matches!(classify(Operation::Register, &err), Alert::DuplicateUser);
    server.finish();
}

#[test]
fn note_mutations_send_id_as_query_parameter() {
    let server = StubServer::start(vec![
        json_response("200 OK", r#"{"message":"Note updated"}"#),
        json_response("200 OK", r#"{"message":"Note deleted"}"#),
    ]);
    let temp = TempDir::new().expect("temp dir");
    let api = connect(&server.base_url, &temp);

    api.update_note(42, "new title", "new body").expect("update ok");
    let update_request = server.next_request();
    assert!(update_request.starts_with("PUT /api/notes/update?id=42 HTTP/1.1"));
    assert!(update_request.contains(r#""title":"new title""#));

    api.delete_note(42).expect("delete ok");
    let delete_request = server.next_request();
    assert!(delete_request.starts_with("DELETE /api/notes/delete?id=42 HTTP/1.1"));
    server.finish();
}

#[test]
fn null_note_list_reads_as_empty() {
    let server = StubServer::start(vec![json_response("200 OK", r#"{"notes":null}"#)]);
    let temp = TempDir::new().expect("temp dir");
    let api = connect(&server.base_url, &temp);

    let notes = api.list_notes().expect("list ok");
    assert!(notes.is_empty());
    server.finish();
}

#[test]
fn create_note_returns_server_assigned_id() {
    let server = StubServer::start(vec![json_response(
        "201 Created",
        r#"{"message":"Note created successfully","note_id":99}"#,
    )]);
    let temp = TempDir::new().expect("temp dir");
    let api = connect(&server.base_url, &temp);

    let note_id = api.create_note("title", "body").expect("create ok");
    assert_eq!(note_id, 99);

    let request = server.next_request();
    assert!(request.starts_with("POST /api/notes HTTP/1.1"));
    server.finish();
}

#[test]
fn logout_clears_the_session_file_even_on_server_error() {
    let server = StubServer::start(vec![response(
        "500 Internal Server Error",
        &["Content-Type: text/plain; charset=utf-8"],
        "Error logging out\n",
    )]);
    let temp = TempDir::new().expect("temp dir");
    let store = SessionStore::new(temp.path().join("session.json"));
    store
        .save(&StoredSession::new("stale".into(), None))
        .expect("seed session");

    let api = connect(&server.base_url, &temp);
    let err = api.logout().expect_err("500 surfaces");
    assert_matches!(classify(Operation::Logout, &err), Alert::ServerError);
    assert!(store.load().is_none(), "session file should be removed");
    server.finish();
}
