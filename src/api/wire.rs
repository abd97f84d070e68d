//! Request and response bodies for the notes service API.
//!
//! The backend encodes timestamps as RFC 3339 strings and reports an empty
//! note list as JSON `null`, so the list wrapper keeps an `Option`.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A note as stored by the server. Read-only for this client.
#[derive(Debug, Clone, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The authenticated user, as reported by `/api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NotePayload<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

/// Body of a successful register/login. The server omits the email, and
/// older deployments omit the username too.
#[derive(Debug, Deserialize)]
pub struct AuthAck {
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteCreated {
    pub note_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct NoteList {
    pub notes: Option<Vec<Note>>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_list_parses_server_shape() {
        let raw = r#"{
            "notes": [{
                "id": 3,
                "title": "Groceries",
                "content": "milk, bread",
                "user_id": 7,
                "created_at": "2024-05-01T10:30:00Z",
                "updated_at": "2024-05-02T08:00:00Z"
            }]
        }"#;
        let list: NoteList = serde_json::from_str(raw).expect("valid note list");
        let notes = list.notes.expect("notes present");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, 3);
        assert_eq!(notes[0].title, "Groceries");
        assert_eq!(notes[0].created_at.year(), 2024);
    }

    #[test]
    fn note_list_accepts_null_notes() {
        let list: NoteList = serde_json::from_str(r#"{"notes": null}"#).expect("valid");
        assert!(list.notes.is_none());
    }

    #[test]
    fn auth_ack_tolerates_missing_username() {
        let ack: AuthAck =
            serde_json::from_str(r#"{"message":"Login successful","user_id":12}"#).expect("valid");
        assert_eq!(ack.user_id, 12);
        assert!(ack.username.is_empty());
    }
}
