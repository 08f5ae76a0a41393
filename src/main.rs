use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{error, info};

mod app;
mod ask;
mod chat;
mod config;
mod error;
mod handler;
mod input;
mod kms;
mod logging;
mod platform;
mod tui;
mod ui;
mod upload;

use app::App;
use ask::AskOutcome;
use chat::literal_text;
use config::Config;
use kms::KmsClient;
use platform::DEFAULT_PLATFORM;
use tui::{EventHandler, Tui};
use upload::UploadSelection;

#[derive(Parser)]
#[command(name = "kms-chat")]
#[command(about = "Chat with the KMS TENESA knowledge base and upload PDFs to it")]
#[command(version)]
struct Cli {
    /// Backend URL (overrides KMS_SERVER_URL and the config file)
    #[arg(long, global = true)]
    server: Option<String>,
    /// AI platform sent with each question
    #[arg(short, long, global = true)]
    platform: Option<String>,
    /// Give up on a request after this many seconds (default: wait forever)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (the default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Upload a PDF to the knowledge base
    Upload {
        /// Path to the PDF file
        file: PathBuf,
    },
    /// Write the effective settings to the config file
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = logging::init()?;
    info!(log = %log_path.display(), "kms-chat starting");

    let mut config = Config::load()?;
    apply_cli(&mut config, &cli);
    if let Err(err) = config.validate() {
        error!(error = %err, "invalid configuration");
        return Err(err);
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_tui(&config).await?,
        Commands::Ask { question } => ask_once(&config, &question).await?,
        Commands::Upload { file } => upload_once(&config, &file).await?,
        Commands::Config => save_config(config)?,
    }

    Ok(())
}

fn apply_cli(config: &mut Config, cli: &Cli) {
    if let Some(server) = &cli.server {
        config.server_override = Some(server.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = Some(timeout);
    }
    if let Some(platform) = &cli.platform {
        config.prefer_platform(platform);
    }
}

async fn run_tui(config: &Config) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(config, events.sender())?;
    if let Ok(path) = Config::get_config_path() {
        app = app.with_config_path(path);
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("kms-chat exiting");
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

async fn ask_once(config: &Config, question: &str) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        bail!("The question is empty");
    }

    let client = KmsClient::new(&config.server_url(), config.request_timeout())?;
    let platform = config.platform.as_deref().unwrap_or(DEFAULT_PLATFORM);

    println!("🤖 Asking {} via {}...\n", client.base_url().bold(), platform.magenta());

    match AskOutcome::from_result(client.ask(question, platform).await) {
        AskOutcome::Success(answer) => {
            println!("{}", "Answer:".bold().green());
            println!("{}", literal_text(&answer));
            Ok(())
        }
        failed => Err(anyhow!("{}", literal_text(failed.text()).red())),
    }
}

async fn upload_once(config: &Config, file: &Path) -> Result<()> {
    let selection = UploadSelection::read(file).await?;
    let client = KmsClient::new(&config.server_url(), config.request_timeout())?;

    println!("📄 Uploading {} to {}...", selection.name.bold(), client.base_url().bold());

    let message = client.upload(&selection.name, selection.bytes).await?;
    println!("{} {}", "Success:".bold().green(), literal_text(&message));
    Ok(())
}

fn save_config(mut config: Config) -> Result<()> {
    if let Some(server) = config.server_override.take() {
        config.server_url = Some(server);
    }
    config.save()?;
    println!("Saved settings to {}", Config::get_config_path()?.display().to_string().bold());
    Ok(())
}
