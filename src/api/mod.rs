//! HTTP client for the notes service.
//!
//! One method per backend operation, each the same linear shape: validate
//! inputs, issue the request, lift non-success statuses into [`ApiError`],
//! decode the JSON body. The session cookie rides in a shared cookie jar and
//! is mirrored to disk so it survives across invocations.

use std::sync::Arc;

use reqwest::blocking::{Client, Response};
use reqwest::cookie::Jar;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use crate::config::ServerOptions;
use crate::session::{SessionStore, StoredSession};

pub mod error;
mod wire;

pub use error::{classify, Alert, ApiError, Operation};
pub use wire::{Note, SessionUser};

/// Cookie name used by the backend for the signed session token.
const SESSION_COOKIE: &str = "token";

#[derive(Clone, Debug)]
pub struct ApiHandle {
    base: Url,
    http: Client,
    jar: Arc<Jar>,
    session: SessionStore,
}

impl ApiHandle {
    /// Builds a client against `options.base_url`, seeding the cookie jar
    /// from the persisted session when one exists.
    pub fn connect(options: &ServerOptions, session: SessionStore) -> Result<Self, ApiError> {
        let base: Url = options
            .base_url
            .parse()
            .map_err(|_| ApiError::InvalidBaseUrl(options.base_url.clone()))?;
        let jar = Arc::new(Jar::default());
        if let Some(stored) = session.load() {
            tracing::debug!(username = ?stored.username, "restoring persisted session cookie");
            jar.add_cookie_str(
                &format!("{SESSION_COOKIE}={}; Path=/", stored.token),
                &base,
            );
        }
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(options.timeout())
            .build()?;
        Ok(Self {
            base,
            http,
            jar,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Username recorded alongside the persisted session, if any.
    pub fn stored_username(&self) -> Option<String> {
        self.session.load().and_then(|stored| stored.username)
    }

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, ApiError> {
        require_field(username, "username")?;
        require_field(email, "email")?;
        require_field(password, "password")?;

        let response = self
            .http
            .post(self.endpoint("/api/auth/register")?)
            .json(&wire::RegisterRequest {
                username,
                email,
                password,
            })
            .send()?;
        let response = check_status(response)?;
        self.persist_session(&response, username);
        let ack: wire::AuthAck = parse_json(response)?;
        tracing::info!(user_id = ack.user_id, "registered new user");
        Ok(SessionUser {
            id: ack.user_id,
            username: if ack.username.is_empty() {
                username.to_string()
            } else {
                ack.username
            },
            email: email.to_string(),
        })
    }

    pub fn login(&self, email: &str, password: &str) -> Result<SessionUser, ApiError> {
        require_field(email, "email")?;
        require_field(password, "password")?;

        let response = self
            .http
            .post(self.endpoint("/api/auth/login")?)
            .json(&wire::LoginRequest { email, password })
            .send()?;
        let response = check_status(response)?;
        let ack: wire::AuthAck = {
            // grab the cookie before the body consumes the response
            self.persist_session(&response, "");
            parse_json(response)?
        };
        let username = if ack.username.is_empty() {
            // the server omits the username for legacy accounts
            email.split('@').next().unwrap_or(email).to_string()
        } else {
            ack.username
        };
        if let Some(stored) = self.session.load() {
            let refreshed = StoredSession {
                username: Some(username.clone()),
                ..stored
            };
            if let Err(err) = self.session.save(&refreshed) {
                tracing::warn!(?err, "failed to record username in session file");
            }
        }
        tracing::info!(user_id = ack.user_id, "logged in");
        Ok(SessionUser {
            id: ack.user_id,
            username,
            email: email.to_string(),
        })
    }

    /// Ends the session. The local session state is dropped even when the
    /// request fails; a stale cookie is useless to keep.
    pub fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .http
            .post(self.endpoint("/api/auth/logout")?)
            .send()
            .map_err(ApiError::from)
            .and_then(check_status);

        self.jar.add_cookie_str(
            &format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"),
            &self.base,
        );
        if let Err(err) = self.session.clear() {
            tracing::warn!(?err, "failed to remove session file");
        }

        result.map(|_| ())
    }

    /// Identifies the current session. 401 means "not logged in".
    pub fn me(&self) -> Result<SessionUser, ApiError> {
        let response = self.http.get(self.endpoint("/api/auth/me")?).send()?;
        let response = check_status(response)?;
        parse_json(response)
    }

    pub fn create_note(&self, title: &str, content: &str) -> Result<i64, ApiError> {
        require_field(title, "title")?;
        require_field(content, "content")?;

        let response = self
            .http
            .post(self.endpoint("/api/notes")?)
            .json(&wire::NotePayload { title, content })
            .send()?;
        let response = check_status(response)?;
        let created: wire::NoteCreated = parse_json(response)?;
        tracing::debug!(note_id = created.note_id, "note created");
        Ok(created.note_id)
    }

    pub fn list_notes(&self) -> Result<Vec<Note>, ApiError> {
        let response = self.http.get(self.endpoint("/api/notes/list")?).send()?;
        let response = check_status(response)?;
        let list: wire::NoteList = parse_json(response)?;
        Ok(list.notes.unwrap_or_default())
    }

    pub fn update_note(&self, note_id: i64, title: &str, content: &str) -> Result<(), ApiError> {
        require_field(title, "title")?;
        require_field(content, "content")?;

        let mut url = self.endpoint("/api/notes/update")?;
        url.query_pairs_mut().append_pair("id", &note_id.to_string());
        let response = self
            .http
            .put(url)
            .json(&wire::NotePayload { title, content })
            .send()?;
        check_status(response)?;
        tracing::debug!(note_id, "note updated");
        Ok(())
    }

    pub fn delete_note(&self, note_id: i64) -> Result<(), ApiError> {
        let mut url = self.endpoint("/api/notes/delete")?;
        url.query_pairs_mut().append_pair("id", &note_id.to_string());
        let response = self.http.delete(url).send()?;
        check_status(response)?;
        tracing::debug!(note_id, "note deleted");
        Ok(())
    }

    /// Backend liveness probe (`GET /health`, plain `OK`).
    pub fn health(&self) -> Result<(), ApiError> {
        let response = self.http.get(self.endpoint("/health")?).send()?;
        check_status(response)?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|_| ApiError::InvalidBaseUrl(format!("{}{path}", self.base)))
    }

    /// Writes the `token` cookie from a successful auth response to disk.
    /// Persistence failure is logged, not fatal: the in-memory jar still
    /// carries the session for the rest of the process.
    fn persist_session(&self, response: &Response, username: &str) {
        let Some(token) = response
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
        else {
            tracing::warn!("auth response did not set a session cookie");
            return;
        };
        let username = if username.trim().is_empty() {
            None
        } else {
            Some(username.to_string())
        };
        let stored = StoredSession {
            token,
            username,
            saved_at: OffsetDateTime::now_utc(),
        };
        if let Err(err) = self.session.save(&stored) {
            tracing::warn!(?err, "failed to persist session cookie");
        }
    }
}

fn require_field(value: &str, name: &'static str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::EmptyField(name));
    }
    Ok(())
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ApiError::Status {
        status,
        message: extract_error_message(status, &body),
    })
}

/// Error-body fallback chain: JSON `{"error": ...}`, then the plain-text
/// body, then the status reason.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<wire::ErrorBody>(body) {
        let trimmed = parsed.error.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text()?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn require_field_rejects_blank_values() {
        assert_matches!(require_field("", "title"), Err(ApiError::EmptyField("title")));
        assert_matches!(require_field("   ", "email"), Err(ApiError::EmptyField("email")));
        assert_matches!(require_field("ok", "title"), Ok(()));
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        let message =
            extract_error_message(StatusCode::CONFLICT, r#"{"error":"user already exists"}"#);
        assert_eq!(message, "user already exists");
    }

    #[test]
    fn error_message_falls_back_to_plain_text() {
        let message = extract_error_message(StatusCode::UNAUTHORIZED, "Unauthorized\n");
        assert_eq!(message, "Unauthorized");
    }

    #[test]
    fn error_message_falls_back_to_status_reason() {
        let message = extract_error_message(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(message, "Internal Server Error");
    }

    #[test]
    fn connect_rejects_unparseable_base_url() {
        let options = ServerOptions {
            base_url: "not a url".into(),
            timeout_secs: 5,
        };
        let store = SessionStore::new(std::env::temp_dir().join("notecli-test-session.json"));
        assert_matches!(
            ApiHandle::connect(&options, store),
            Err(ApiError::InvalidBaseUrl(_))
        );
    }
}
