//! Brevis Bot CLI - Voice message summarization over Telegram.
//!
//! A command-line interface for running the Brevis summarization bot.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use brevis::prelude::*;
use brevis_bot::bot::{VoiceBot, VoiceBotConfig};
use brevis_bot::config::{BotConfig, config_path, init_config, load_config, load_config_from};
use brevis_bot::error::{BotError, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Brevis Bot - voice message transcription and summarization
#[derive(Parser)]
#[command(name = "brevis-bot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "BREVIS_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and setup
    Init(InitArgs),

    /// Start the Telegram bot
    Run(RunArgs),

    /// Summarize a local audio file and print the result
    Summarize(SummarizeArgs),

    /// Show bot status and configuration
    Status,
}

/// Arguments for the init command
#[derive(Args)]
struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the run command
#[derive(Args)]
struct RunArgs {
    /// Model to use (overrides config)
    #[arg(short, long, env = "BREVIS_MODEL")]
    model: Option<String>,
}

/// Arguments for the summarize command
#[derive(Args)]
struct SummarizeArgs {
    /// Audio file to summarize
    file: PathBuf,

    /// Model to use (overrides config)
    #[arg(short, long, env = "BREVIS_MODEL")]
    model: Option<String>,

    /// Also print the full transcript
    #[arg(short, long)]
    transcript: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose);

    // Run the async main
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "brevis_bot={level},brevis={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => cmd_init(args).await,
        Commands::Run(args) => cmd_run(args, cli.config).await,
        Commands::Summarize(args) => cmd_summarize(args, cli.config).await,
        Commands::Status => cmd_status(cli.config).await,
    }
}

/// Initialize configuration.
async fn cmd_init(args: InitArgs) -> Result<()> {
    let config_file = config_path();

    if config_file.exists() && !args.force {
        println!("Configuration already exists at: {}", config_file.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    init_config().await?;

    println!("Configuration created: {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. edit {}", config_file.display());
    println!("  2. export TELEGRAM_BOT_TOKEN=<token>");
    println!("  3. export OPENAI_API_KEY=<key>");
    println!("  4. brevis-bot run");

    Ok(())
}

/// Start the Telegram bot.
async fn cmd_run(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Brevis Bot...");

    let mut config = load_from(config_path).await;

    // Override model if specified
    if args.model.is_some() {
        config.llm.model = args.model;
    }

    config.validate()?;
    let token = config
        .telegram_token()
        .ok_or_else(|| BotError::config("no Telegram bot token configured"))?;

    let pipeline = build_pipeline(&config);
    let bot_config = VoiceBotConfig::new(token).allow_users(config.telegram.allow_from.clone());

    tracing::info!(
        backend = config.llm.backend.as_str(),
        "pipeline ready, starting Telegram dispatcher"
    );

    println!("Bot running. Press Ctrl+C to stop.\n");

    let bot = VoiceBot::new(bot_config, pipeline);

    // Run with graceful shutdown
    tokio::select! {
        result = bot.run() => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            Ok(())
        }
    }
}

/// Summarize a local audio file.
async fn cmd_summarize(args: SummarizeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = load_from(config_path).await;

    if args.model.is_some() {
        config.llm.model = args.model;
    }

    let pipeline = build_pipeline(&config);
    let result = pipeline.run(&args.file).await?;

    if args.transcript {
        println!("Transcript:\n{}\n", result.full_text);
    }
    println!("Summary:\n{}", result.summary);

    Ok(())
}

/// Show status.
async fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.unwrap_or_else(brevis_bot::config::config_path);

    println!("Brevis Bot Status\n");

    println!("Configuration:");
    println!("  Path:   {}", config_file.display());
    println!(
        "  Exists: {}",
        if config_file.exists() { "yes" } else { "no" }
    );

    if config_file.exists() {
        match load_config_from(&config_file).await {
            Ok(config) => {
                println!("  Valid:  yes");
                println!();
                println!("Backend:");
                println!("  Kind:            {}", config.llm.backend.as_str());
                println!(
                    "  Model:           {}",
                    config.llm.model.as_deref().unwrap_or("(default)")
                );
                println!("  Token budget:    {}", config.llm.token_budget);
                println!("  Map concurrency: {}", config.llm.map_concurrency);
                if config.llm.backend == BackendKind::Local {
                    let mut builder = OllamaBackend::builder();
                    if let Some(base_url) = ollama_base_url(&config) {
                        builder = builder.base_url(base_url);
                    }
                    let reachable = builder.build().health_check().await.unwrap_or(false);
                    println!(
                        "  Server:          {}",
                        if reachable { "reachable" } else { "unreachable" }
                    );
                }
                println!();
                println!("Transcription:");
                println!("  Model: {}", config.transcription.model);
                println!();
                println!("Telegram:");
                if config.telegram.allow_from.is_empty() {
                    println!("  Allowlist: (open to all users)");
                } else {
                    println!("  Allowlist: {} user(s)", config.telegram.allow_from.len());
                }
            }
            Err(e) => {
                println!("  Valid:  no ({e})");
            }
        }
    }

    println!();
    println!("Environment:");
    print_env_status("TELEGRAM_BOT_TOKEN");
    print_env_status("OPENAI_API_KEY");
    print_env_status("OLLAMA_BASE_URL");
    print_env_status("BREVIS_MODEL");

    Ok(())
}

/// Load config from an explicit path or the default location, falling back
/// to defaults when neither exists.
async fn load_from(path: Option<PathBuf>) -> BotConfig {
    match path {
        Some(path) => load_config_from(&path).await.unwrap_or_default(),
        None => load_config().await.unwrap_or_default(),
    }
}

/// Assemble the pipeline from configuration.
fn build_pipeline(config: &BotConfig) -> Arc<SummaryPipeline> {
    let backend: Arc<dyn LlmBackend> = match config.llm.backend {
        BackendKind::Remote => {
            let mut builder = OpenAiBackend::builder();
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                builder = builder.api_key(key);
            }
            if let Some(model) = &config.llm.model {
                builder = builder.model(model.clone());
            }
            if let Some(base_url) = &config.llm.base_url {
                builder = builder.base_url(base_url.clone());
            }
            Arc::new(builder.build())
        }
        BackendKind::Local => {
            let mut builder = OllamaBackend::builder();
            if let Some(model) = &config.llm.model {
                builder = builder.model(model.clone());
            }
            if let Some(base_url) = ollama_base_url(config) {
                builder = builder.base_url(base_url);
            }
            Arc::new(builder.build())
        }
    };

    let transcriber =
        Arc::new(WhisperTranscriber::from_env().with_model(config.transcription.model.clone()));

    let pipeline_config = PipelineConfig {
        token_budget: config.llm.token_budget,
        map_concurrency: config.llm.map_concurrency,
        ..PipelineConfig::default()
    };

    Arc::new(
        SummaryPipeline::builder()
            .backend(backend)
            .transcriber(transcriber)
            .config(pipeline_config)
            .build(),
    )
}

/// Resolve the Ollama base URL. The environment wins over the config file,
/// matching the bot token policy.
fn ollama_base_url(config: &BotConfig) -> Option<String> {
    std::env::var("OLLAMA_BASE_URL")
        .ok()
        .or_else(|| config.llm.base_url.clone())
}

/// Print environment variable status.
fn print_env_status(name: &str) {
    let status = if std::env::var(name).is_ok() {
        "set"
    } else {
        "-"
    };
    println!("  {name}: {status}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(unsafe_code)] // env mutation is confined to this test
    fn ollama_base_url_prefers_environment() {
        let mut config = BotConfig::default();
        config.llm.base_url = Some("http://filehost:11434".to_string());

        unsafe { std::env::set_var("OLLAMA_BASE_URL", "http://envhost:11434") };
        assert_eq!(
            ollama_base_url(&config).as_deref(),
            Some("http://envhost:11434")
        );

        unsafe { std::env::remove_var("OLLAMA_BASE_URL") };
        assert_eq!(
            ollama_base_url(&config).as_deref(),
            Some("http://filehost:11434")
        );
    }
}
