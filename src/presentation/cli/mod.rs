use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::posts::GenerationRequest;
use crate::infrastructure::client::RedbookifyClient;

#[derive(Debug, Parser)]
#[command(author, version, about = "Turn book titles into Xiaohongshu-style posts", long_about = None)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "REDBOOKIFY_URL",
        default_value = "http://localhost:3000"
    )]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Generate a post for a book title via a running server
    Generate(GenerateCommand),

    /// Manage generation history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Debug, Args)]
pub struct ServeCommand {
    #[arg(long, env = "REDBOOKIFY_BIND_ADDRESS", default_value = "127.0.0.1:3000")]
    pub bind_address: SocketAddr,

    #[arg(
        long,
        env = "REDBOOKIFY_HISTORY_PATH",
        default_value = "redbookify-history.json"
    )]
    pub history_path: PathBuf,

    /// Keep history in memory only; nothing is written to disk
    #[arg(long, env = "REDBOOKIFY_EPHEMERAL")]
    pub ephemeral: bool,

    #[arg(long, env = "REDBOOKIFY_OPENROUTER_API_KEY")]
    pub openrouter_api_key: Option<String>,

    #[arg(
        long,
        env = "REDBOOKIFY_OPENROUTER_MODEL",
        default_value = "openrouter/free"
    )]
    pub openrouter_model: String,

    /// Image-capable model for cover/illustration generation; images are
    /// skipped when unset
    #[arg(long, env = "REDBOOKIFY_OPENROUTER_IMAGE_MODEL")]
    pub openrouter_image_model: Option<String>,
}

#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Book title to generate a post for
    pub title: String,

    /// Context to hand the prompt instead of the built-in placeholder
    #[arg(long)]
    pub context: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommands {
    /// Print the saved history, most recent first
    List,

    /// Delete all saved history
    Clear,
}

pub async fn run_generate(client: &RedbookifyClient, command: GenerateCommand) -> anyhow::Result<()> {
    let request = GenerationRequest {
        book_title: command.title,
        scraped_content: command.context,
    };
    let result = client.generate(&request).await?;

    if let Some(warning) = &result.persist_warning {
        eprintln!("warning: history was not persisted: {warning}");
    }
    print_json(&result.entry)
}

pub async fn run_history(client: &RedbookifyClient, command: HistoryCommands) -> anyhow::Result<()> {
    match command {
        HistoryCommands::List => {
            let entries = client.list_history().await?;
            print_json(&entries)
        }
        HistoryCommands::Clear => {
            client.clear_history().await?;
            eprintln!("History cleared.");
            Ok(())
        }
    }
}

pub(crate) fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
