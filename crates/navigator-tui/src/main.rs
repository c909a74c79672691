use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};
use anyhow::Result;
use clap::{Parser, Subcommand};
use navigator_core::{Config, GeminiTutor, Navigator};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

const LOG_FILE: &str = "navigator.log";
const TUI_LOG_FILTER: &str = "ansible_navigator=info,navigator_core=info";
const CLI_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "ansible-navigator")]
#[command(about = "Learn Ansible with AI-generated lessons and a chat tutor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive terminal UI (default)
    Tui,
    /// List the curriculum
    List,
    /// Fetch and print the lesson for one subtopic
    Topic {
        /// Subtopic title, or a unique prefix of it
        subtopic: String,
        /// Print an HTML fragment instead of terminal text
        #[arg(long)]
        html: bool,
    },
    /// Ask the tutor a single question
    Ask {
        /// Your question
        question: String,
        /// Use the thinking model for harder questions
        #[arg(short, long)]
        thinking: bool,
    },
    /// Save the Gemini API key to the config file
    SetKey {
        /// API key from Google AI Studio
        key: String,
    },
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// The TUI owns the terminal, so its logs go to a file in the config directory
fn init_file_logging() -> Result<()> {
    let dir = Config::config_dir()?;
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(TUI_LOG_FILTER))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(CLI_LOG_FILTER))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    if matches!(command, Commands::Tui) {
        init_file_logging()?;
    } else {
        init_stderr_logging();
    }

    match command {
        Commands::Tui => run_tui(Config::load()?).await?,
        Commands::List => commands::list_curriculum(),
        Commands::Topic { subtopic, html } => {
            commands::show_topic(&Config::load()?, &subtopic, html).await?
        }
        Commands::Ask { question, thinking } => {
            commands::ask(&Config::load()?, &question, thinking).await?
        }
        Commands::SetKey { key } => commands::set_key(&key)?,
    }

    Ok(())
}

async fn run_tui(config: Config) -> Result<()> {
    let tutor = GeminiTutor::from_config(&config);
    let has_api_key = tutor.has_api_key();
    info!(has_api_key, model = %tutor.models().content_model, "starting terminal UI");

    let (navigator, completions) = Navigator::new(Arc::new(tutor));
    let mut app = App::new(navigator, has_api_key);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(completions);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
