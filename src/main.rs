use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use swiftaid::{AudioExporter, ChatBackend, ChatSession, Config, Tab, TabSet};

#[derive(Parser)]
#[command(name = "swiftaid")]
#[command(about = "View extracted text and summaries, ask questions, and listen to them")]
struct Cli {
    /// File with the extracted text
    #[arg(long, global = true)]
    text: Option<PathBuf>,
    /// File with the summary
    #[arg(long, global = true)]
    summary: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the formatted reply
    Ask {
        /// Your question
        question: String,
    },
    /// Download the audio for one tab
    Export {
        /// Which tab to export: text or summary
        #[arg(short, long, default_value = "summary")]
        tab: String,
        /// Directory to save into (defaults to the configured download dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::load();

    let text = read_optional(cli.text.as_deref())?;
    let summary = read_optional(cli.summary.as_deref())?;

    match cli.command {
        None => {
            init_file_logging();
            run_tui(&config_or_defaults(loaded), text, summary).await
        }
        Some(Commands::Ask { question }) => {
            init_stderr_logging();
            ask(&config_or_defaults(loaded), &question).await
        }
        Some(Commands::Export { tab, out }) => {
            init_stderr_logging();
            let config = config_or_defaults(loaded);
            export(&config, TabSet::new(text, summary), &tab, out).await
        }
    }
}

/// Must run after logging is set up so a bad config file is reported
fn config_or_defaults(loaded: Result<Config>) -> Config {
    loaded.unwrap_or_else(|e| {
        warn!("Using default config: {:#}", e);
        Config::new()
    })
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|p| std::fs::read_to_string(p).with_context(|| format!("Failed to read {:?}", p)))
        .transpose()
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// The TUI owns the terminal, so logs go to a file
fn init_file_logging() {
    let Ok(path) = Config::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

async fn run_tui(config: &Config, text: Option<String>, summary: Option<String>) -> Result<()> {
    info!("SwiftAid v{} starting", env!("CARGO_PKG_VERSION"));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(config, text, summary);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            if let Some(event) = events.next().await {
                handler::handle_event(&mut app, event).await?;
            } else {
                break;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    app.player.pause();
    tui::restore()?;
    result
}

async fn ask(config: &Config, question: &str) -> Result<()> {
    let mut session = ChatSession::new(ChatBackend::from_config(config), &config.persona());
    session.input = question.to_string();
    if !session.submit() {
        return Ok(());
    }
    session.dispatch_next();
    session.wait_reply().await;

    if let Some(reply) = session.transcript().last() {
        println!("{}", ui::markup_plain_lines(&reply.content).join("\n"));
    }
    Ok(())
}

async fn export(config: &Config, mut tabs: TabSet, tab: &str, out: Option<PathBuf>) -> Result<()> {
    let tab = Tab::from_str(tab)
        .ok_or_else(|| anyhow::anyhow!("Unknown tab '{}', expected text or summary", tab))?;
    tabs.select(tab);

    let dir = out.unwrap_or_else(|| config.download_dir());
    let exporter = AudioExporter::new(&config.audio_server_url(), dir);

    match exporter.download(tabs.active_pane()).await {
        Ok(path) => {
            println!("Saved {}", path.display());
            Ok(())
        }
        Err(alert) => Err(anyhow::anyhow!(alert)),
    }
}
