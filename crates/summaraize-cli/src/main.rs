//! summaraize: summaries, transcript action items, and document Q&A
//!
//! Usage:
//!   summaraize serve
//!   summaraize summarize --prompt "focus on decisions" notes.txt
//!   summaraize optimize transcript.txt
//!   summaraize ask --document report.txt --question "What changed?"
//!   summaraize providers

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use summaraize_core::flows;
use summaraize_core::status::{format_report, provider_report};
use summaraize_core::{Config, FallbackRouter};
use summaraize_gateway::GatewayServer;
use tokio::io::AsyncReadExt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "summaraize", version, about = "Summaries, action items, and document Q&A over hosted LLMs")]
struct Cli {
    /// Path to config.toml (default: ~/.summaraize/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Summarize text through the provider fallback chain
    Summarize {
        /// Guidance for the summary
        #[arg(short, long, default_value = "")]
        prompt: String,
        /// Input file, or `-` / omitted for stdin
        file: Option<PathBuf>,
    },
    /// List optimizations and action items for a transcript
    Optimize {
        /// Transcript file, or `-` / omitted for stdin
        file: Option<PathBuf>,
    },
    /// Ask a question about a text document
    Ask {
        /// UTF-8 text document
        #[arg(short, long)]
        document: PathBuf,
        #[arg(short, long)]
        question: String,
    },
    /// Show the fallback chain and which providers have credentials
    Providers,
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Read a file, or stdin when `path` is `None` or `-`
async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => read_text_file(p).await,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

async fn read_text_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    String::from_utf8(bytes)
        .with_context(|| format!("{} is not a UTF-8 text file", path.display()))
}

fn print_output<T: Serialize>(json: bool, value: &T, plain: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", plain(value));
    }
    Ok(())
}

fn load_router(config: &Config) -> Arc<FallbackRouter> {
    let router = Arc::new(FallbackRouter::from_config(&config.providers));
    info!(
        chain = ?router.providers().iter().map(|p| p.identifier()).collect::<Vec<_>>(),
        timeout_secs = config.providers.timeout_secs,
        "Loaded provider chain"
    );
    router
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init { force } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(config::default_config_path);
            config::init(&path, force)?;
            println!("Wrote {}", path.display());
        }
        Commands::Serve { bind } => {
            let mut config = config::load(config_path)?;
            if let Some(bind) = bind {
                config.gateway.bind = bind;
            }
            config.validate()?;
            info!("summaraize v{} starting", env!("CARGO_PKG_VERSION"));
            GatewayServer::with_router(load_router(&config), config.gateway.clone())
                .run()
                .await?;
        }
        Commands::Summarize { prompt, file } => {
            let router = load_router(&config::load(config_path)?);
            let text = read_input(file.as_deref()).await?;
            let output = flows::summarize(&router, &text, &prompt)
                .await
                .context("Failed to generate summary")?;
            print_output(cli.json, &output, |o| o.summary.clone())?;
        }
        Commands::Optimize { file } => {
            let router = load_router(&config::load(config_path)?);
            let transcript = read_input(file.as_deref()).await?;
            let output = flows::optimize_transcript(&router, &transcript)
                .await
                .context("Failed to optimize transcript")?;
            print_output(cli.json, &output, |o| {
                o.optimizations
                    .iter()
                    .map(|item| format!("- {}", item))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Commands::Ask { document, question } => {
            let router = load_router(&config::load(config_path)?);
            let content = read_text_file(&document).await?;
            let output = flows::ask_document_question(&router, &content, &question)
                .await
                .context("Failed to get an answer")?;
            print_output(cli.json, &output, |o| o.answer.clone())?;
        }
        Commands::Providers => {
            let router = load_router(&config::load(config_path)?);
            let report = provider_report(&router);
            print_output(cli.json, &report, |r| format_report(r))?;
        }
    }

    Ok(())
}
