use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::alerts::Locale;
use crate::api::{Note, SessionUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Notes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    List,
    Preview,
}

#[derive(Debug, Clone)]
pub struct NoteSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub preview: String,
}

/// Single-line input with a grapheme-aware cursor. Used by the auth form
/// and the note title field; `masked` renders bullets for passwords.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub masked: bool,
}

impl InputField {
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            cursor: value.len(),
            value: value.to_string(),
            masked: false,
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut scratch = [0u8; 4];
        let encoded = ch.encode_utf8(&mut scratch);
        self.value.insert_str(self.cursor, encoded);
        self.cursor += encoded.len();
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.value, self.cursor);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.value, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.value.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.value, self.cursor);
        true
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.len();
    }

    /// What the field shows on screen; masked fields render one bullet per
    /// grapheme so the cursor column still lines up.
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.graphemes(true).count())
        } else {
            self.value.clone()
        }
    }
}

/// Multi-line buffer for the note body. Cursor moves by grapheme
/// horizontally and keeps a preferred column across vertical moves.
#[derive(Debug, Clone, Default)]
pub struct TextArea {
    pub buffer: String,
    pub cursor: usize,
    preferred_column: Option<usize>,
}

impl TextArea {
    pub fn with_content(content: &str) -> Self {
        Self {
            cursor: content.len(),
            buffer: content.to_string(),
            preferred_column: None,
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut scratch = [0u8; 4];
        let encoded = ch.encode_utf8(&mut scratch);
        self.buffer.insert_str(self.cursor, encoded);
        self.cursor += encoded.len();
        self.preferred_column = None;
    }

    pub fn insert_newline(&mut self) {
        self.buffer.insert(self.cursor, '\n');
        self.cursor += 1;
        self.preferred_column = Some(0);
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        self.preferred_column = None;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.preferred_column = None;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.buffer, self.cursor);
        self.preferred_column = None;
        true
    }

    pub fn move_up(&mut self) -> bool {
        let current_line_start = line_start(&self.buffer, self.cursor);
        let column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.buffer, current_line_start, self.cursor));
        if current_line_start == 0 {
            if self.cursor == 0 {
                return false;
            }
            self.cursor = 0;
            self.preferred_column = Some(column);
            return true;
        }
        let prev_line_start = line_start(&self.buffer, current_line_start - 1);
        self.cursor = position_for_column(&self.buffer, prev_line_start, column);
        self.preferred_column = Some(column);
        true
    }

    pub fn move_down(&mut self) -> bool {
        let current_line_start = line_start(&self.buffer, self.cursor);
        let column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.buffer, current_line_start, self.cursor));
        let current_line_end = line_end(&self.buffer, self.cursor);
        if current_line_end == self.buffer.len() {
            if self.cursor == self.buffer.len() {
                return false;
            }
            self.cursor = self.buffer.len();
            self.preferred_column = Some(column);
            return true;
        }
        let next_line_start = current_line_end + 1;
        self.cursor = position_for_column(&self.buffer, next_line_start, column);
        self.preferred_column = Some(column);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Email,
    Password,
}

/// Login/registration form. The username row only exists in register mode;
/// focus cycling skips it while logging in.
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub username: InputField,
    pub email: InputField,
    pub password: InputField,
    pub focus: AuthField,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            username: InputField::default(),
            email: InputField::default(),
            password: InputField::masked(),
            focus: AuthField::Email,
        }
    }
}

impl AuthForm {
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.focus = match self.mode {
            AuthMode::Login => AuthField::Email,
            AuthMode::Register => AuthField::Username,
        };
    }

    pub fn focus_next(&mut self) {
        self.focus = match (self.mode, self.focus) {
            (AuthMode::Register, AuthField::Username) => AuthField::Email,
            (AuthMode::Register, AuthField::Email) => AuthField::Password,
            (AuthMode::Register, AuthField::Password) => AuthField::Username,
            (AuthMode::Login, AuthField::Email) => AuthField::Password,
            (AuthMode::Login, _) => AuthField::Email,
        };
    }

    pub fn focus_previous(&mut self) {
        self.focus = match (self.mode, self.focus) {
            (AuthMode::Register, AuthField::Username) => AuthField::Password,
            (AuthMode::Register, AuthField::Email) => AuthField::Username,
            (AuthMode::Register, AuthField::Password) => AuthField::Email,
            (AuthMode::Login, AuthField::Email) => AuthField::Password,
            (AuthMode::Login, _) => AuthField::Email,
        };
    }

    pub fn active_field_mut(&mut self) -> &mut InputField {
        match self.focus {
            AuthField::Username => &mut self.username,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteFormFocus {
    Title,
    Content,
}

/// Create/edit dialog. `note_id` distinguishes the two: `None` submits a
/// create, `Some(id)` an update for that note.
#[derive(Debug, Clone)]
pub struct NoteFormOverlay {
    pub note_id: Option<i64>,
    pub title: InputField,
    pub content: TextArea,
    pub focus: NoteFormFocus,
}

#[derive(Debug, Clone)]
pub struct DeleteNoteOverlay {
    pub note_id: i64,
    pub title: String,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    NoteForm(NoteFormOverlay),
    DeleteNote(DeleteNoteOverlay),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub focus: FocusPane,
    pub selected: usize,
    pub preview_lines: usize,
    pub locale: Locale,
    pub session: Option<SessionUser>,
    pub notes: Vec<NoteSummary>,
    pub auth: AuthForm,
    pub status_message: Option<String>,
    pub overlay: Option<OverlayState>,
}

impl AppState {
    pub fn new(preview_lines: usize, locale: Locale) -> Self {
        Self {
            screen: Screen::Auth,
            focus: FocusPane::List,
            selected: 0,
            preview_lines,
            locale,
            session: None,
            notes: Vec::new(),
            auth: AuthForm::default(),
            status_message: None,
            overlay: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn selected(&self) -> Option<&NoteSummary> {
        self.notes.get(self.selected)
    }

    pub fn selected_note_id(&self) -> Option<i64> {
        self.selected().map(|note| note.id)
    }

    /// Switches screens to match the session: logged in shows the note
    /// list, logged out returns to the auth form with cleared state.
    pub fn set_session(&mut self, session: Option<SessionUser>) {
        match session {
            Some(user) => {
                self.session = Some(user);
                self.screen = Screen::Notes;
                self.auth = AuthForm::default();
            }
            None => {
                self.session = None;
                self.screen = Screen::Auth;
                self.notes.clear();
                self.selected = 0;
                self.overlay = None;
            }
        }
    }

    pub fn set_notes(&mut self, notes: Vec<Note>) {
        let preview_lines = self.preview_lines;
        self.notes = notes
            .into_iter()
            .map(|note| summarize(note, preview_lines))
            .collect();
        self.normalize_selection();
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.notes.is_empty() {
            return;
        }
        let len = self.notes.len() as isize;
        let next = (self.selected as isize + delta).clamp(0, len - 1);
        self.selected = next as usize;
    }

    pub fn select_note_by_id(&mut self, note_id: i64) {
        if let Some(idx) = self.notes.iter().position(|note| note.id == note_id) {
            self.selected = idx;
        } else {
            self.normalize_selection();
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::List => FocusPane::Preview,
            FocusPane::Preview => FocusPane::List,
        };
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn open_new_note(&mut self) {
        self.overlay = Some(OverlayState::NoteForm(NoteFormOverlay {
            note_id: None,
            title: InputField::default(),
            content: TextArea::default(),
            focus: NoteFormFocus::Title,
        }));
    }

    pub fn open_edit_note(&mut self) {
        if let Some(note) = self.selected() {
            self.overlay = Some(OverlayState::NoteForm(NoteFormOverlay {
                note_id: Some(note.id),
                title: InputField::with_value(&note.title),
                content: TextArea::with_content(&note.content),
                focus: NoteFormFocus::Title,
            }));
        }
    }

    pub fn open_delete_note(&mut self) {
        if let Some(note) = self.selected() {
            self.overlay = Some(OverlayState::DeleteNote(DeleteNoteOverlay {
                note_id: note.id,
                title: note.title.clone(),
            }));
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn note_form(&self) -> Option<&NoteFormOverlay> {
        match self.overlay() {
            Some(OverlayState::NoteForm(ref overlay)) => Some(overlay),
            _ => None,
        }
    }

    pub fn note_form_mut(&mut self) -> Option<&mut NoteFormOverlay> {
        match self.overlay.as_mut() {
            Some(OverlayState::NoteForm(ref mut overlay)) => Some(overlay),
            _ => None,
        }
    }

    pub fn delete_note_overlay(&self) -> Option<&DeleteNoteOverlay> {
        match self.overlay() {
            Some(OverlayState::DeleteNote(ref overlay)) => Some(overlay),
            _ => None,
        }
    }

    /// Id of the note currently open in the form, if the form is an edit.
    pub fn editing_note_id(&self) -> Option<i64> {
        self.note_form().and_then(|form| form.note_id)
    }

    fn normalize_selection(&mut self) {
        if self.notes.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.notes.len() {
            self.selected = self.notes.len() - 1;
        }
    }
}

pub fn summarize(note: Note, preview_lines: usize) -> NoteSummary {
    let Note {
        id,
        title,
        content,
        created_at,
        updated_at,
        ..
    } = note;
    let preview = build_preview(&content, preview_lines);
    NoteSummary {
        id,
        title,
        content,
        created_at: format_timestamp(created_at),
        updated_at: format_timestamp(updated_at),
        preview,
    }
}

fn format_timestamp(dt: OffsetDateTime) -> String {
    dt.format(&Rfc3339)
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn build_preview(content: &str, preview_lines: usize) -> String {
    if preview_lines == 0 {
        return String::new();
    }
    let mut lines = content.lines();
    let mut collected = Vec::with_capacity(preview_lines);
    for _ in 0..preview_lines {
        if let Some(line) = lines.next() {
            collected.push(line.trim_end());
        } else {
            break;
        }
    }
    let mut preview = collected.join("\n");
    if lines.next().is_some() {
        if !preview.is_empty() {
            preview.push_str("\n…");
        } else {
            preview.push('…');
        }
    }
    preview
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in text[..cursor].grapheme_indices(true) {
        last = idx;
    }
    last
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor >= text.len() {
        return text.len();
    }
    let mut iter = text[cursor..].graphemes(true);
    if let Some(grapheme) = iter.next() {
        cursor + grapheme.len()
    } else {
        text.len()
    }
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

fn column_at(text: &str, line_start: usize, cursor: usize) -> usize {
    text[line_start..cursor].graphemes(true).count()
}

fn position_for_column(text: &str, line_start: usize, column: usize) -> usize {
    let line_end = line_end(text, line_start);
    let mut position = line_start;
    let mut count = 0;
    for grapheme in text[line_start..line_end].graphemes(true) {
        if count >= column {
            break;
        }
        position += grapheme.len();
        count += 1;
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_note(id: i64) -> Note {
        Note {
            id,
            title: format!("note {id}"),
            content: "first line\nsecond line\nthird line\nfourth line".to_string(),
            user_id: 1,
            created_at: datetime!(2025-06-01 12:00 UTC),
            updated_at: datetime!(2025-06-02 08:30 UTC),
        }
    }

    #[test]
    fn login_form_skips_username_field() {
        let mut form = AuthForm::default();
        assert_eq!(form.focus, AuthField::Email);
        form.focus_next();
        assert_eq!(form.focus, AuthField::Password);
        form.focus_next();
        assert_eq!(form.focus, AuthField::Email);
    }

    #[test]
    fn register_form_cycles_all_fields() {
        let mut form = AuthForm::default();
        form.toggle_mode();
        assert_eq!(form.mode, AuthMode::Register);
        assert_eq!(form.focus, AuthField::Username);
        form.focus_next();
        form.focus_next();
        assert_eq!(form.focus, AuthField::Password);
        form.focus_next();
        assert_eq!(form.focus, AuthField::Username);
        form.focus_previous();
        assert_eq!(form.focus, AuthField::Password);
    }

    #[test]
    fn masked_input_displays_bullets() {
        let mut field = InputField::masked();
        field.insert_char('h');
        field.insert_char('i');
        assert_eq!(field.display(), "••");
        assert_eq!(field.value, "hi");
    }

    #[test]
    fn input_cursor_respects_graphemes() {
        let mut field = InputField::default();
        field.insert_char('й');
        field.insert_char('ё');
        assert!(field.move_left());
        field.insert_char('x');
        assert_eq!(field.value, "йxё");
        assert!(field.backspace());
        assert_eq!(field.value, "йё");
    }

    #[test]
    fn textarea_vertical_moves_keep_column() {
        let mut area = TextArea::with_content("alpha\nbe\ngamma");
        area.cursor = 4; // inside "alpha"
        assert!(area.move_down());
        assert_eq!(area.cursor, 8); // end of "be"
        assert!(area.move_down());
        assert_eq!(&area.buffer[area.cursor..area.cursor + 1], "a");
    }

    #[test]
    fn logging_out_returns_to_auth_screen() {
        let mut state = AppState::new(3, Locale::En);
        state.set_session(Some(SessionUser {
            id: 1,
            username: "ada".into(),
            email: "ada@example.com".into(),
        }));
        assert_eq!(state.screen, Screen::Notes);

        state.set_notes(vec![sample_note(7)]);
        state.open_edit_note();
        assert_eq!(state.editing_note_id(), Some(7));

        state.set_session(None);
        assert_eq!(state.screen, Screen::Auth);
        assert!(state.notes.is_empty());
        assert!(state.overlay().is_none());
    }

    #[test]
    fn new_note_form_has_no_note_id() {
        let mut state = AppState::new(3, Locale::En);
        state.open_new_note();
        assert!(state.note_form().is_some());
        assert_eq!(state.editing_note_id(), None);
    }

    #[test]
    fn summary_preview_truncates_with_ellipsis() {
        let summary = summarize(sample_note(1), 2);
        assert_eq!(summary.preview, "first line\nsecond line\n…");
        assert!(summary.created_at.starts_with("2025-06-01"));
    }

    #[test]
    fn selection_clamps_to_list_bounds() {
        let mut state = AppState::new(3, Locale::En);
        state.set_notes(vec![sample_note(1), sample_note(2)]);
        state.move_selection(5);
        assert_eq!(state.selected, 1);
        state.move_selection(-5);
        assert_eq!(state.selected, 0);

        state.selected = 1;
        state.set_notes(vec![sample_note(1)]);
        assert_eq!(state.selected, 0);
    }
}
