use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::api::ApiHandle;
use crate::app::App;
use crate::config::ConfigLoader;
use crate::session::SessionStore;

pub mod commands;

use self::commands::{DeleteArgs, EditArgs, ListArgs, LoginArgs, NewArgs, RegisterArgs};

#[derive(Parser, Debug)]
#[command(
    name = "notecli",
    version,
    about = "Keyboard-first terminal client for a self-hosted notes service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTECLI_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over NOTECLI_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override the server base url from the config file
    #[arg(long)]
    pub server: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Create an account on the notes server
    Register(RegisterArgs),
    /// Log in and persist the session cookie
    Login(LoginArgs),
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create a new note from the command line
    New(NewArgs),
    /// Print your notes
    List(ListArgs),
    /// Update an existing note
    Edit(EditArgs),
    /// Delete a note
    Delete(DeleteArgs),
    /// Check that the notes server is reachable
    Ping,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("NOTECLI_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("NOTECLI_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let mut config = loader.load_or_init()?;
    if let Some(server) = cli.server {
        config.server.base_url = server.trim_end_matches('/').to_string();
    }

    let session = SessionStore::new(paths.session_file.clone());
    let api = ApiHandle::connect(&config.server, session)
        .with_context(|| format!("connecting to {}", config.server.base_url))?;

    let config = Arc::new(config);
    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let mut app = App::new(config.clone(), api)?;
            commands::run_tui(&mut app)
        }
        Commands::Register(args) => commands::register(config, &api, args),
        Commands::Login(args) => commands::login(config, &api, args),
        Commands::Logout => commands::logout(config, &api),
        Commands::Whoami => commands::whoami(&api),
        Commands::New(args) => commands::new_note(config, &api, args),
        Commands::List(args) => commands::list_notes(config, &api, args),
        Commands::Edit(args) => commands::edit_note(config, &api, args),
        Commands::Delete(args) => commands::delete_note(config, &api, args),
        Commands::Ping => commands::ping(&api),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
