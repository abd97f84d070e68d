use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::alerts;
use crate::app::state::{
    AppState, AuthField, AuthMode, FocusPane, InputField, NoteFormFocus, OverlayState, Screen,
};

pub fn draw_app(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    match state.screen {
        Screen::Auth => draw_auth_screen(frame, state),
        Screen::Notes => draw_notes_screen(frame, state, list_state),
    }
    render_overlay(frame, state);
}

fn draw_auth_screen(frame: &mut Frame, state: &AppState) {
    let area = centered_rect(50, 60, frame.size());
    frame.render_widget(Clear, area);

    let form = &state.auth;
    let (title, submit_hint) = match form.mode {
        AuthMode::Login => ("Log In", "Enter log in • Ctrl-n switch to register"),
        AuthMode::Register => ("Register", "Enter register • Ctrl-n switch to log in"),
    };

    let mut lines = Vec::new();
    if form.mode == AuthMode::Register {
        lines.push(field_label("Username", form.focus == AuthField::Username));
        lines.push(field_line(&form.username, form.focus == AuthField::Username));
        lines.push(Line::from(""));
    }
    lines.push(field_label("Email", form.focus == AuthField::Email));
    lines.push(field_line(&form.email, form.focus == AuthField::Email));
    lines.push(Line::from(""));
    lines.push(field_label("Password", form.focus == AuthField::Password));
    lines.push(field_line(&form.password, form.focus == AuthField::Password));
    lines.push(Line::from(""));
    if let Some(message) = &state.status_message {
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        format!("Tab next field • {submit_hint} • Esc quit"),
        Style::default().fg(Color::Gray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn field_label(label: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(Span::styled(label.to_string(), style))
}

fn field_line(field: &InputField, focused: bool) -> Line<'static> {
    let mut display = field.display();
    if focused {
        display.push('▌');
    }
    Line::from(Span::raw(display))
}

fn draw_notes_screen(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(vertical[0]);

    let list_block_style = if matches!(state.focus, FocusPane::List) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let mut items = Vec::with_capacity(state.notes.len());
    for note in &state.notes {
        let title_line = Line::from(Span::styled(
            note.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let meta_line = Line::from(Span::styled(
            format!("Created {}", note.created_at),
            Style::default().fg(Color::Gray),
        ));
        let mut lines = vec![title_line, meta_line];
        for line in note.preview.lines() {
            lines.push(Line::from(line.to_string()));
        }
        if lines.len() == 2 {
            lines.push(Line::from(""));
        }
        items.push(ListItem::new(lines));
    }
    if items.is_empty() {
        items.push(ListItem::new(format!(
            "{} Press `a` to create one.",
            alerts::empty_list_text(state.locale)
        )));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title("Notes")
                .borders(Borders::ALL)
                .border_style(list_block_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, columns[0], list_state);

    let detail_block_style = if matches!(state.focus, FocusPane::Preview) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let preview_text: Text = state
        .selected()
        .map(|note| {
            let mut lines = vec![
                Line::from(Span::styled(
                    note.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("Created {} • Updated {}", note.created_at, note.updated_at),
                    Style::default().fg(Color::Gray),
                )),
                Line::from(""),
            ];
            for line in note.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            Text::from(lines)
        })
        .unwrap_or_else(|| Text::from("Select a note to see its contents."));

    let detail = Paragraph::new(preview_text)
        .block(
            Block::default()
                .title("Preview")
                .borders(Borders::ALL)
                .border_style(detail_block_style),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, columns[1]);
    frame.render_widget(detail, columns[1]);

    let status = build_status_line(state);
    let status_paragraph = Paragraph::new(status)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_paragraph, vertical[1]);
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let position = if state.is_empty() {
        "0/0".to_string()
    } else {
        format!("{}/{}", state.selected + 1, state.notes.len())
    };

    let mut spans = Vec::new();
    if let Some(user) = &state.session {
        spans.push(Span::styled(
            user.username.clone(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" | "));
    }
    spans.push(Span::styled(
        position,
        Style::default().add_modifier(Modifier::BOLD),
    ));
    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::raw(
        " | j/k move • a new • e edit • d delete • Ctrl-r refresh • o log out • q quit",
    ));
    Text::from(Line::from(spans))
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    match state.overlay() {
        Some(OverlayState::NoteForm(form)) => {
            let area = centered_rect(70, 70, frame.size());
            frame.render_widget(Clear, area);

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(5),
                    Constraint::Length(1),
                ])
                .split(area);

            let (dialog_title, accent) = match form.note_id {
                None => ("New Note".to_string(), Color::Cyan),
                Some(id) => (format!("Edit Note #{id}"), Color::Magenta),
            };

            let title_focused = form.focus == NoteFormFocus::Title;
            let mut title_display = form.title.value.clone();
            if title_focused {
                title_display.push('▌');
            }
            let title_border = if title_focused {
                Style::default().fg(accent)
            } else {
                Style::default()
            };
            let title_widget = Paragraph::new(title_display).block(
                Block::default()
                    .title(dialog_title)
                    .borders(Borders::ALL)
                    .border_style(title_border),
            );
            frame.render_widget(title_widget, layout[0]);

            let content_focused = form.focus == NoteFormFocus::Content;
            let mut content_display = form.content.buffer.clone();
            if content_focused {
                content_display.insert(form.content.cursor.min(content_display.len()), '▌');
            }
            let content_border = if content_focused {
                Style::default().fg(accent)
            } else {
                Style::default()
            };
            let content_widget = Paragraph::new(content_display)
                .block(
                    Block::default()
                        .title("Content")
                        .borders(Borders::ALL)
                        .border_style(content_border),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(content_widget, layout[1]);

            let hint = Paragraph::new("Tab switch field • Ctrl-s save • Esc cancel")
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(hint, layout[2]);
        }
        Some(OverlayState::DeleteNote(dialog)) => {
            let area = centered_rect(60, 30, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    dialog.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(alerts::confirm_delete_text(state.locale)),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter or y confirm • Esc or n cancel",
                    Style::default().fg(Color::Red),
                )),
            ])
            .block(
                Block::default()
                    .title(format!("Confirm Delete (#{})", dialog.note_id))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {}
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_within_parent() {
        let parent = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(60, 30, parent);
        assert!(rect.x >= parent.x && rect.right() <= parent.right());
        assert!(rect.y >= parent.y && rect.bottom() <= parent.bottom());
        assert_eq!(rect.width, 60);
    }

    #[test]
    fn masked_field_renders_cursor_after_bullets() {
        let mut field = InputField::masked();
        field.insert_char('a');
        field.insert_char('b');
        let line = field_line(&field, true);
        let rendered: String = line.spans.iter().map(|span| span.content.clone()).collect();
        assert_eq!(rendered, "••▌");
    }
}
