use std::fmt::Write as _;
use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::alerts::{self, Locale};
use crate::api::{classify, ApiError, ApiHandle, Note, Operation};
use crate::app::state::summarize;
use crate::app::App;
use crate::config::AppConfig;

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg()]
    pub username: String,
    /// Email for the new account (prompted if omitted)
    #[arg()]
    pub email: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Account email (prompted if omitted)
    #[arg()]
    pub email: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Provide the note body inline. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Limit the number of notes printed
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Note identifier
    pub note_id: i64,
    /// New title (unchanged if omitted)
    #[arg(long)]
    pub title: Option<String>,
    /// New body (unchanged if omitted)
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub note_id: i64,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn register(config: Arc<AppConfig>, api: &ApiHandle, args: RegisterArgs) -> Result<()> {
    let username = args.username.trim().to_owned();
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let password = prompt("Password")?;

    match api.register(&username, email.trim(), &password) {
        Ok(user) => {
            println!(
                "{}",
                alerts::success_text(config.locale, Operation::Register, Some(&user.username))
            );
            Ok(())
        }
        Err(err) => fail(config.locale, Operation::Register, err),
    }
}

pub fn login(config: Arc<AppConfig>, api: &ApiHandle, args: LoginArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let password = prompt("Password")?;

    match api.login(email.trim(), &password) {
        Ok(user) => {
            println!(
                "{} Signed in as {}.",
                alerts::success_text(config.locale, Operation::Login, None),
                user.username
            );
            Ok(())
        }
        Err(err) => fail(config.locale, Operation::Login, err),
    }
}

pub fn logout(config: Arc<AppConfig>, api: &ApiHandle) -> Result<()> {
    match api.logout() {
        Ok(()) => {
            println!(
                "{}",
                alerts::success_text(config.locale, Operation::Logout, None)
            );
            Ok(())
        }
        Err(err) => fail(config.locale, Operation::Logout, err),
    }
}

pub fn whoami(api: &ApiHandle) -> Result<()> {
    match api.me() {
        Ok(user) => {
            println!("#{}  {}  <{}>", user.id, user.username, user.email);
            Ok(())
        }
        Err(ApiError::Status { status, .. }) if status.as_u16() == 401 => {
            println!("Not logged in.");
            Ok(())
        }
        Err(err) => Err(err).context("querying current session"),
    }
}

pub fn new_note(config: Arc<AppConfig>, api: &ApiHandle, args: NewArgs) -> Result<()> {
    let title = match args.title {
        Some(t) => t,
        None => prompt("Title")?,
    };
    let content = if let Some(content) = args.content {
        content
    } else {
        read_stdin()?.unwrap_or_default()
    };

    match api.create_note(title.trim(), &content) {
        Ok(note_id) => {
            println!(
                "{} (#{note_id})",
                alerts::success_text(config.locale, Operation::CreateNote, None)
            );
            Ok(())
        }
        Err(err) => fail(config.locale, Operation::CreateNote, err),
    }
}

pub fn list_notes(config: Arc<AppConfig>, api: &ApiHandle, args: ListArgs) -> Result<()> {
    match api.list_notes() {
        Ok(notes) => {
            print!("{}", format_note_list(&notes, args.limit, config.locale));
            Ok(())
        }
        Err(err) => fail(config.locale, Operation::ListNotes, err),
    }
}

pub fn edit_note(config: Arc<AppConfig>, api: &ApiHandle, args: EditArgs) -> Result<()> {
    if args.title.is_none() && args.content.is_none() {
        bail!("nothing to change; pass --title and/or --content");
    }
    let notes = match api.list_notes() {
        Ok(notes) => notes,
        Err(err) => return fail(config.locale, Operation::ListNotes, err),
    };
    let Some(existing) = notes.into_iter().find(|note| note.id == args.note_id) else {
        bail!(
            "{}",
            alerts::alert_text(
                config.locale,
                Operation::UpdateNote,
                &crate::api::Alert::NoteNotFound
            )
        );
    };

    let (title, content) = merge_note_fields(&existing, args.title, args.content);
    match api.update_note(args.note_id, &title, &content) {
        Ok(()) => {
            println!(
                "{}",
                alerts::success_text(config.locale, Operation::UpdateNote, None)
            );
            Ok(())
        }
        Err(err) => fail(config.locale, Operation::UpdateNote, err),
    }
}

pub fn delete_note(config: Arc<AppConfig>, api: &ApiHandle, args: DeleteArgs) -> Result<()> {
    if !args.yes {
        let answer = prompt(&format!(
            "{} (y/N)",
            alerts::confirm_delete_text(config.locale)
        ))?;
        if !is_affirmative(&answer) {
            println!("Canceled.");
            return Ok(());
        }
    }
    match api.delete_note(args.note_id) {
        Ok(()) => {
            println!(
                "{}",
                alerts::success_text(config.locale, Operation::DeleteNote, None)
            );
            Ok(())
        }
        Err(err) => fail(config.locale, Operation::DeleteNote, err),
    }
}

pub fn ping(api: &ApiHandle) -> Result<()> {
    api.health()
        .with_context(|| format!("pinging {}", api.base_url()))?;
    println!("{} is up", api.base_url());
    Ok(())
}

fn fail(locale: Locale, op: Operation, err: ApiError) -> Result<()> {
    let alert = classify(op, &err);
    tracing::debug!(?op, ?alert, %err, "command failed");
    bail!("{}", alerts::alert_text(locale, op, &alert))
}

fn format_note_list(notes: &[Note], limit: usize, locale: Locale) -> String {
    if notes.is_empty() {
        return format!("{}\n", alerts::empty_list_text(locale));
    }
    let mut out = String::new();
    for note in notes.iter().take(limit) {
        let summary = summarize(note.clone(), 1);
        let _ = writeln!(&mut out, "#{}  {}", summary.id, summary.title);
        let _ = writeln!(&mut out, "    created {}", summary.created_at);
        let snippet = summary.preview.replace('\n', " ");
        let snippet = snippet.trim();
        if !snippet.is_empty() {
            let _ = writeln!(&mut out, "    {snippet}");
        }
        out.push('\n');
    }
    if notes.len() > limit {
        let _ = writeln!(&mut out, "… and {} more", notes.len() - limit);
    }
    out
}

fn merge_note_fields(
    existing: &Note,
    title: Option<String>,
    content: Option<String>,
) -> (String, String) {
    (
        title.unwrap_or_else(|| existing.title.clone()),
        content.unwrap_or_else(|| existing.content.clone()),
    )
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}
