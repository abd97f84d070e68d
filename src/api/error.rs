use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by [`crate::api::ApiHandle`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status. `message` is the
    /// extracted error text: JSON `{"error": ...}` when present, otherwise the
    /// trimmed plain-text body, otherwise the canonical status reason.
    #[error("server responded {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Body(#[from] serde_json::Error),
    /// Client-side validation; never reaches the wire.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("invalid server base url '{0}'")]
    InvalidBaseUrl(String),
}

/// The user-visible operation a request belongs to. Alerts are phrased per
/// operation, so classification carries it along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Login,
    Logout,
    CreateNote,
    ListNotes,
    UpdateNote,
    DeleteNote,
}

/// Closed set of user-facing failure conditions. The alert catalog turns
/// these into localized text; see [`crate::alerts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    MissingFields,
    DuplicateUser,
    InvalidInput,
    InvalidCredentials,
    UserNotFound,
    LoginRequired,
    NoteNotFound,
    ServerError,
    Network,
    Other(String),
}

/// Maps an API failure to an alert. Classification keys on the HTTP status
/// code; message substrings are consulted only where the backend overloads a
/// status (duplicate registrations arrive as 500, missing users on login as a
/// bare 401 body).
pub fn classify(op: Operation, err: &ApiError) -> Alert {
    match err {
        ApiError::EmptyField(_) => Alert::MissingFields,
        ApiError::Transport(_) => Alert::Network,
        ApiError::Body(parse) => Alert::Other(format!("unexpected response: {parse}")),
        ApiError::InvalidBaseUrl(url) => Alert::Other(format!("invalid server url '{url}'")),
        ApiError::Status { status, message } => classify_status(op, *status, message),
    }
}

fn classify_status(op: Operation, status: StatusCode, message: &str) -> Alert {
    let lowered = message.to_ascii_lowercase();
    match status {
        StatusCode::UNAUTHORIZED => match op {
            Operation::Login => {
                if lowered.contains("user not found") {
                    Alert::UserNotFound
                } else {
                    Alert::InvalidCredentials
                }
            }
            _ => Alert::LoginRequired,
        },
        StatusCode::NOT_FOUND => match op {
            Operation::UpdateNote | Operation::DeleteNote => Alert::NoteNotFound,
            _ => Alert::Other(message.to_string()),
        },
        StatusCode::BAD_REQUEST => Alert::InvalidInput,
        _ if status.is_server_error() => {
            if op == Operation::Register
                && (lowered.contains("already exists") || lowered.contains("duplicate"))
            {
                Alert::DuplicateUser
            } else {
                Alert::ServerError
            }
        }
        _ => Alert::Other(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn status_error(status: u16, message: &str) -> ApiError {
        ApiError::Status {
            status: StatusCode::from_u16(status).expect("valid status"),
            message: message.to_string(),
        }
    }

    #[test]
    fn empty_field_classifies_as_missing_fields() {
        let err = ApiError::EmptyField("title");
        assert_matches!(classify(Operation::CreateNote, &err), Alert::MissingFields);
    }

    #[test]
    fn unauthorized_on_login_is_invalid_credentials() {
        let err = status_error(401, "Invalid email or password");
        assert_matches!(classify(Operation::Login, &err), Alert::InvalidCredentials);
    }

    #[test]
    fn unauthorized_login_with_missing_user_is_user_not_found() {
        let err = status_error(401, "user not found");
        assert_matches!(classify(Operation::Login, &err), Alert::UserNotFound);
    }

    #[test]
    fn unauthorized_elsewhere_requires_login() {
        let err = status_error(401, "Unauthorized");
        assert_matches!(classify(Operation::ListNotes, &err), Alert::LoginRequired);
        assert_matches!(classify(Operation::DeleteNote, &err), Alert::LoginRequired);
    }

    #[test]
    fn duplicate_registration_detected_despite_500() {
        let err = status_error(500, "user already exists");
        assert_matches!(classify(Operation::Register, &err), Alert::DuplicateUser);

        let err = status_error(500, "duplicate key value violates unique constraint");
        assert_matches!(classify(Operation::Register, &err), Alert::DuplicateUser);
    }

    #[test]
    fn other_500s_are_server_errors() {
        let err = status_error(500, "Error creating note");
        assert_matches!(classify(Operation::CreateNote, &err), Alert::ServerError);
    }

    #[test]
    fn missing_note_maps_to_note_not_found_only_for_note_mutations() {
        let err = status_error(404, "not found");
        assert_matches!(classify(Operation::UpdateNote, &err), Alert::NoteNotFound);
        assert_matches!(classify(Operation::DeleteNote, &err), Alert::NoteNotFound);
        assert_matches!(classify(Operation::ListNotes, &err), Alert::Other(_));
    }

    #[test]
    fn bad_request_is_invalid_input() {
        let err = status_error(400, "Invalid request body");
        assert_matches!(classify(Operation::Register, &err), Alert::InvalidInput);
    }
}
