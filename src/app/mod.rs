use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::alerts;
use crate::api::{classify, ApiError, ApiHandle, Operation};
use crate::config::AppConfig;
use crate::ui;

pub mod state;

pub use state::{
    AppState, AuthMode, FocusPane, NoteFormFocus, NoteSummary, OverlayState, Screen,
};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    ToggleFocus,
    Refresh,
    NewNote,
    EditNote,
    DeleteNote,
    Logout,
}

pub struct App {
    pub config: Arc<AppConfig>,
    api: ApiHandle,
    state: AppState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    /// Builds the TUI and tries to resume a persisted session. When the
    /// stored cookie is still valid the app opens straight onto the note
    /// list; otherwise it starts at the auth form.
    pub fn new(config: Arc<AppConfig>, api: ApiHandle) -> Result<Self> {
        let mut state = AppState::new(config.ui.preview_lines as usize, config.locale);
        match api.me() {
            Ok(user) => {
                let username = user.username.clone();
                state.set_session(Some(user));
                match api.list_notes() {
                    Ok(notes) => state.set_notes(notes),
                    Err(err) => {
                        tracing::warn!(?err, "session restored but note list failed");
                    }
                }
                state.set_status_message(Some(format!("Welcome back, {username}!")));
            }
            Err(err) => {
                tracing::debug!(?err, "no resumable session, starting at auth screen");
            }
        }
        let mut list_state = ListState::default();
        if !state.is_empty() {
            list_state.select(Some(state.selected));
        }
        let tick_rate = config.ui.tick();
        Ok(Self {
            config,
            api,
            state,
            list_state,
            should_quit: false,
            tick_rate,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if !self.state.is_empty() {
                        self.list_state.select(Some(self.state.selected));
                    } else {
                        self.list_state.select(None);
                    }
                    ui::draw_app(frame, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // no-op: next draw will naturally adapt to the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        match self.state.screen {
            Screen::Auth => self.handle_auth_key(key),
            Screen::Notes => self.handle_notes_key(key),
        }
    }

    fn handle_auth_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.auth.toggle_mode();
                let message = match self.state.auth.mode {
                    AuthMode::Login => "Log in: Tab next field • Enter submit • Ctrl-n register",
                    AuthMode::Register => {
                        "Register: Tab next field • Enter submit • Ctrl-n log in"
                    }
                };
                self.state.set_status_message(Some(message));
            }
            KeyCode::Tab | KeyCode::Down => self.state.auth.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.state.auth.focus_previous(),
            KeyCode::Enter => self.submit_auth_form(),
            KeyCode::Backspace => {
                self.state.auth.active_field_mut().backspace();
            }
            KeyCode::Left => {
                self.state.auth.active_field_mut().move_left();
            }
            KeyCode::Right => {
                self.state.auth.active_field_mut().move_right();
            }
            KeyCode::Home => self.state.auth.active_field_mut().move_home(),
            KeyCode::End => self.state.auth.active_field_mut().move_end(),
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                self.state.auth.active_field_mut().insert_char(ch);
            }
            _ => {}
        }
    }

    fn handle_notes_key(&mut self, key: KeyEvent) {
        let action = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Tab => Some(Action::ToggleFocus),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Refresh)
            }
            KeyCode::Char('a')
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                Some(Action::NewNote)
            }
            KeyCode::Char('e')
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                Some(Action::EditNote)
            }
            KeyCode::Char('d')
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                Some(Action::DeleteNote)
            }
            KeyCode::Char('o')
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                Some(Action::Logout)
            }
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::ToggleFocus => self.state.toggle_focus(),
            Action::Refresh => self.reload_notes(None),
            Action::NewNote => {
                if self.state.overlay().is_none() {
                    self.state.open_new_note();
                    self.state.set_status_message(Some(
                        "New note: Tab switch field • Ctrl-s save • Esc cancel",
                    ));
                }
            }
            Action::EditNote => {
                if self.state.overlay().is_some() {
                    return;
                }
                if self.state.selected().is_none() {
                    self.state.set_status_message(Some("No note selected"));
                    return;
                }
                self.state.open_edit_note();
                self.state.set_status_message(Some(
                    "Edit note: Tab switch field • Ctrl-s save • Esc cancel",
                ));
            }
            Action::DeleteNote => {
                if self.state.overlay().is_some() {
                    return;
                }
                if self.state.selected().is_none() {
                    self.state.set_status_message(Some("No note selected"));
                    return;
                }
                self.state.open_delete_note();
            }
            Action::Logout => self.submit_logout(),
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        match self.state.overlay() {
            Some(OverlayState::NoteForm(_)) => {
                match key.code {
                    KeyCode::Esc => {
                        self.state.close_overlay();
                        self.state.set_status_message(Some("Canceled"));
                    }
                    KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.submit_note_form();
                    }
                    KeyCode::Tab => {
                        if let Some(form) = self.state.note_form_mut() {
                            form.focus = match form.focus {
                                NoteFormFocus::Title => NoteFormFocus::Content,
                                NoteFormFocus::Content => NoteFormFocus::Title,
                            };
                        }
                    }
                    KeyCode::Enter => {
                        if let Some(form) = self.state.note_form_mut() {
                            match form.focus {
                                NoteFormFocus::Title => form.focus = NoteFormFocus::Content,
                                NoteFormFocus::Content => form.content.insert_newline(),
                            }
                        }
                    }
                    KeyCode::Backspace => {
                        if let Some(form) = self.state.note_form_mut() {
                            match form.focus {
                                NoteFormFocus::Title => {
                                    form.title.backspace();
                                }
                                NoteFormFocus::Content => {
                                    form.content.backspace();
                                }
                            }
                        }
                    }
                    KeyCode::Left => {
                        if let Some(form) = self.state.note_form_mut() {
                            match form.focus {
                                NoteFormFocus::Title => {
                                    form.title.move_left();
                                }
                                NoteFormFocus::Content => {
                                    form.content.move_left();
                                }
                            }
                        }
                    }
                    KeyCode::Right => {
                        if let Some(form) = self.state.note_form_mut() {
                            match form.focus {
                                NoteFormFocus::Title => {
                                    form.title.move_right();
                                }
                                NoteFormFocus::Content => {
                                    form.content.move_right();
                                }
                            }
                        }
                    }
                    KeyCode::Up => {
                        if let Some(form) = self.state.note_form_mut() {
                            if form.focus == NoteFormFocus::Content {
                                form.content.move_up();
                            }
                        }
                    }
                    KeyCode::Down => {
                        if let Some(form) = self.state.note_form_mut() {
                            if form.focus == NoteFormFocus::Content {
                                form.content.move_down();
                            }
                        }
                    }
                    KeyCode::Char(ch)
                        if !key.modifiers.intersects(
                            KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                        ) =>
                    {
                        if let Some(form) = self.state.note_form_mut() {
                            match form.focus {
                                NoteFormFocus::Title => form.title.insert_char(ch),
                                NoteFormFocus::Content => form.content.insert_char(ch),
                            }
                        }
                    }
                    _ => {}
                }
                true
            }
            Some(OverlayState::DeleteNote(_)) => {
                match key.code {
                    KeyCode::Enter | KeyCode::Char('y') => {
                        self.submit_delete_note();
                    }
                    KeyCode::Esc | KeyCode::Char('n') => {
                        self.state.close_overlay();
                        self.state.set_status_message(Some("Delete canceled"));
                    }
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    fn submit_auth_form(&mut self) {
        let locale = self.state.locale;
        match self.state.auth.mode {
            AuthMode::Register => {
                let username = self.state.auth.username.value.clone();
                let email = self.state.auth.email.value.clone();
                let password = self.state.auth.password.value.clone();
                match self.api.register(&username, &email, &password) {
                    Ok(user) => {
                        let greeting = alerts::success_text(
                            locale,
                            Operation::Register,
                            Some(&user.username),
                        );
                        self.state.set_session(Some(user));
                        self.reload_notes(Some(greeting));
                    }
                    Err(err) => self.report_failure(Operation::Register, err),
                }
            }
            AuthMode::Login => {
                let email = self.state.auth.email.value.clone();
                let password = self.state.auth.password.value.clone();
                match self.api.login(&email, &password) {
                    Ok(user) => {
                        let greeting = alerts::success_text(locale, Operation::Login, None);
                        self.state.set_session(Some(user));
                        self.reload_notes(Some(greeting));
                    }
                    Err(err) => self.report_failure(Operation::Login, err),
                }
            }
        }
    }

    fn submit_logout(&mut self) {
        let locale = self.state.locale;
        match self.api.logout() {
            Ok(()) => {
                self.state.set_session(None);
                self.state.set_status_message(Some(alerts::success_text(
                    locale,
                    Operation::Logout,
                    None,
                )));
            }
            Err(err) => {
                // the local session is already gone; still land on the auth
                // screen rather than a note list we can no longer refresh
                tracing::warn!(?err, "logout request failed");
                self.state.set_session(None);
                self.report_failure(Operation::Logout, err);
            }
        }
    }

    fn submit_note_form(&mut self) {
        let Some(form) = self.state.note_form() else {
            return;
        };
        let note_id = form.note_id;
        let title = form.title.value.clone();
        let content = form.content.buffer.clone();
        let locale = self.state.locale;

        match note_id {
            None => match self.api.create_note(&title, &content) {
                Ok(created_id) => {
                    self.state.close_overlay();
                    self.reload_notes(Some(alerts::success_text(
                        locale,
                        Operation::CreateNote,
                        None,
                    )));
                    self.state.select_note_by_id(created_id);
                }
                Err(err) => self.report_failure(Operation::CreateNote, err),
            },
            Some(id) => match self.api.update_note(id, &title, &content) {
                Ok(()) => {
                    self.state.close_overlay();
                    self.reload_notes(Some(alerts::success_text(
                        locale,
                        Operation::UpdateNote,
                        None,
                    )));
                    self.state.select_note_by_id(id);
                }
                Err(err) => self.report_failure(Operation::UpdateNote, err),
            },
        }
    }

    fn submit_delete_note(&mut self) {
        let Some(overlay) = self.state.delete_note_overlay() else {
            return;
        };
        let note_id = overlay.note_id;
        let locale = self.state.locale;
        match self.api.delete_note(note_id) {
            Ok(()) => {
                self.state.close_overlay();
                self.reload_notes(Some(alerts::success_text(
                    locale,
                    Operation::DeleteNote,
                    None,
                )));
            }
            Err(err) => {
                self.state.close_overlay();
                self.report_failure(Operation::DeleteNote, err);
            }
        }
    }

    /// Re-fetches the list, keeping `message` as the status line when the
    /// fetch succeeds.
    fn reload_notes(&mut self, message: Option<String>) {
        match self.api.list_notes() {
            Ok(notes) => {
                self.state.set_notes(notes);
                self.state.set_status_message(message);
            }
            Err(err) => self.report_failure(Operation::ListNotes, err),
        }
    }

    /// Turns an API failure into a status-line alert. An expired session
    /// drops the user back to the auth form.
    fn report_failure(&mut self, op: Operation, err: ApiError) {
        let alert = classify(op, &err);
        tracing::debug!(?op, ?alert, %err, "operation failed");
        let text = alerts::alert_text(self.state.locale, op, &alert);
        if alert == crate::api::Alert::LoginRequired {
            self.state.set_session(None);
        }
        self.state.set_status_message(Some(text));
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
