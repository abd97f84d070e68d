//! Localized user-facing messages.
//!
//! The `ru` catalog carries the alert strings of the web client this tool
//! replaces; `en` is the default. Alerts are keyed by operation plus the
//! classified failure so phrasing can differ per action ("log in to create a
//! note" vs "log in to delete a note").

use serde::{Deserialize, Serialize};

use crate::api::{Alert, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

/// Localized text for a failed operation.
pub fn alert_text(locale: Locale, op: Operation, alert: &Alert) -> String {
    match locale {
        Locale::En => alert_en(op, alert),
        Locale::Ru => alert_ru(op, alert),
    }
}

/// Localized toast for a completed operation. `detail` carries the username
/// for registration greetings.
pub fn success_text(locale: Locale, op: Operation, detail: Option<&str>) -> String {
    match locale {
        Locale::En => success_en(op, detail),
        Locale::Ru => success_ru(op, detail),
    }
}

/// Placeholder shown when the note list is empty.
pub fn empty_list_text(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "No notes yet.",
        Locale::Ru => "Нет заметок",
    }
}

/// Body of the delete confirmation dialog.
pub fn confirm_delete_text(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Are you sure you want to delete this note?",
        Locale::Ru => "Вы уверены, что хотите удалить эту заметку?",
    }
}

fn alert_en(op: Operation, alert: &Alert) -> String {
    let text = match (op, alert) {
        (Operation::Register, Alert::MissingFields) => "❌ Fill in all registration fields",
        (Operation::Login, Alert::MissingFields) => "❌ Fill in email and password",
        (_, Alert::MissingFields) => "❌ Fill in the note title and text",
        (_, Alert::DuplicateUser) => "❌ A user with this email or username already exists",
        (Operation::Register, Alert::InvalidInput) => "❌ Invalid registration data",
        (Operation::Login, Alert::InvalidInput) => "❌ Fill in all fields",
        (_, Alert::InvalidInput) => "❌ Invalid note data",
        (_, Alert::InvalidCredentials) => "❌ Invalid email or password",
        (_, Alert::UserNotFound) => "❌ User not found",
        (Operation::CreateNote, Alert::LoginRequired) => "❌ Log in to create a note",
        (Operation::UpdateNote, Alert::LoginRequired) => "❌ Log in to edit a note",
        (Operation::DeleteNote, Alert::LoginRequired) => "❌ Log in to delete a note",
        (_, Alert::LoginRequired) => "❌ Log in to view your notes",
        (_, Alert::NoteNotFound) => "❌ Note not found",
        (_, Alert::ServerError) => "❌ Server error, please try again later",
        (_, Alert::Network) => "❌ Cannot reach the notes server",
        (_, Alert::Other(message)) => return format!("❌ {}: {message}", failure_label_en(op)),
    };
    text.to_string()
}

fn failure_label_en(op: Operation) -> &'static str {
    match op {
        Operation::Register => "Registration failed",
        Operation::Login => "Login failed",
        Operation::Logout => "Logout failed",
        Operation::CreateNote => "Failed to create note",
        Operation::ListNotes => "Failed to load notes",
        Operation::UpdateNote => "Failed to update note",
        Operation::DeleteNote => "Failed to delete note",
    }
}

fn success_en(op: Operation, detail: Option<&str>) -> String {
    match op {
        Operation::Register => match detail {
            Some(username) => format!("✅ Registration successful! Welcome, {username}!"),
            None => "✅ Registration successful!".to_string(),
        },
        Operation::Login => "✅ Logged in successfully!".to_string(),
        Operation::Logout => "✅ Logged out".to_string(),
        Operation::CreateNote => "✅ Note created!".to_string(),
        Operation::ListNotes => "✅ Notes loaded".to_string(),
        Operation::UpdateNote => "✅ Note updated!".to_string(),
        Operation::DeleteNote => "✅ Note deleted!".to_string(),
    }
}

fn alert_ru(op: Operation, alert: &Alert) -> String {
    let text = match (op, alert) {
        (Operation::Register, Alert::MissingFields) => "Заполните все поля для регистрации",
        (Operation::Login, Alert::MissingFields) => "Заполните email и пароль",
        (_, Alert::MissingFields) => "Заполните заголовок и текст заметки",
        (_, Alert::DuplicateUser) => {
            "❌ Пользователь с таким email или именем уже существует"
        }
        (Operation::Register, Alert::InvalidInput) => "❌ Неверные данные для регистрации",
        (Operation::Login, Alert::InvalidInput) => "❌ Заполните все поля",
        (_, Alert::InvalidInput) => "❌ Неверные данные для заметки",
        (_, Alert::InvalidCredentials) => "❌ Неверный email или пароль",
        (_, Alert::UserNotFound) => "❌ Пользователь не найден",
        (Operation::CreateNote, Alert::LoginRequired) => {
            "❌ Для создания заметки необходимо войти в систему"
        }
        (Operation::UpdateNote, Alert::LoginRequired) => {
            "❌ Для редактирования заметки необходимо войти в систему"
        }
        (Operation::DeleteNote, Alert::LoginRequired) => {
            "❌ Для удаления заметки необходимо войти в систему"
        }
        (_, Alert::LoginRequired) => "❌ Для просмотра заметок необходимо войти в систему",
        (_, Alert::NoteNotFound) => "❌ Заметка не найдена",
        (_, Alert::ServerError) => "❌ Ошибка сервера, попробуйте позже",
        (_, Alert::Network) => "❌ Не удаётся подключиться к серверу",
        (_, Alert::Other(message)) => return format!("❌ {}: {message}", failure_label_ru(op)),
    };
    text.to_string()
}

fn failure_label_ru(op: Operation) -> &'static str {
    match op {
        Operation::Register => "Ошибка регистрации",
        Operation::Login => "Ошибка входа",
        Operation::Logout => "Ошибка выхода",
        Operation::CreateNote => "Ошибка создания заметки",
        Operation::ListNotes => "Ошибка загрузки заметок",
        Operation::UpdateNote => "Ошибка обновления заметки",
        Operation::DeleteNote => "Ошибка удаления заметки",
    }
}

fn success_ru(op: Operation, detail: Option<&str>) -> String {
    match op {
        Operation::Register => match detail {
            Some(username) => format!("✅ Регистрация успешна! Добро пожаловать, {username}!"),
            None => "✅ Регистрация успешна!".to_string(),
        },
        Operation::Login => "✅ Вход выполнен успешно!".to_string(),
        Operation::Logout => "✅ Выход выполнен".to_string(),
        Operation::CreateNote => "✅ Заметка создана!".to_string(),
        Operation::ListNotes => "✅ Заметки загружены".to_string(),
        Operation::UpdateNote => "✅ Заметка обновлена!".to_string(),
        Operation::DeleteNote => "✅ Заметка удалена!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_required_phrasing_differs_per_operation() {
        let create = alert_text(Locale::En, Operation::CreateNote, &Alert::LoginRequired);
        let delete = alert_text(Locale::En, Operation::DeleteNote, &Alert::LoginRequired);
        assert_ne!(create, delete);
        assert!(create.contains("create"));
        assert!(delete.contains("delete"));
    }

    #[test]
    fn russian_catalog_keeps_original_strings() {
        assert_eq!(
            alert_text(Locale::Ru, Operation::Login, &Alert::InvalidCredentials),
            "❌ Неверный email или пароль"
        );
        assert_eq!(
            alert_text(Locale::Ru, Operation::Register, &Alert::MissingFields),
            "Заполните все поля для регистрации"
        );
        assert_eq!(
            success_text(Locale::Ru, Operation::CreateNote, None),
            "✅ Заметка создана!"
        );
    }

    #[test]
    fn other_alert_carries_raw_message() {
        let text = alert_text(
            Locale::En,
            Operation::ListNotes,
            &Alert::Other("boom".to_string()),
        );
        assert!(text.contains("boom"));
        assert!(text.contains("Failed to load notes"));
    }

    #[test]
    fn register_success_greets_by_name() {
        let text = success_text(Locale::En, Operation::Register, Some("ada"));
        assert!(text.contains("ada"));
    }
}
