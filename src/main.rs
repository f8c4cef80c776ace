use anyhow::Result;
use clap::Parser;
use redbookify::application::{ServerConfig, serve};
use redbookify::infrastructure::client::RedbookifyClient;
use redbookify::presentation::cli::{Cli, Commands, ServeCommand, run_generate, run_history};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before clap parses env vars)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => run_server(cmd).await,
        Commands::Generate(cmd) => {
            let client = RedbookifyClient::from_base_url(&cli.api_url)?;
            run_generate(&client, cmd).await
        }
        Commands::History { command } => {
            let client = RedbookifyClient::from_base_url(&cli.api_url)?;
            run_history(&client, command).await
        }
    }
}

async fn run_server(command: ServeCommand) -> Result<()> {
    let openrouter_api_key = command.openrouter_api_key.unwrap_or_default();
    if openrouter_api_key.is_empty() {
        tracing::warn!("no OpenRouter API key configured - generation requests will fail");
    }

    let history_path = (!command.ephemeral).then_some(command.history_path);

    let config = ServerConfig {
        bind_address: command.bind_address,
        history_path,
        openrouter_api_key,
        openrouter_model: command.openrouter_model,
        openrouter_image_model: command.openrouter_image_model,
    };

    serve(config).await
}

#[allow(clippy::expect_used)] // Startup: panicking is appropriate if logging cannot be initialized
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}
