//! VectorMentor CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive tutoring session
//! - `ask`      — Single question, single answer
//! - `status`   — Show runtime status
//! - `topic`    — Browse reference passages for a topic
//! - `onboard`  — Write the default configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vectormentor",
    about = "VectorMentor — tutor de álgebra lineal",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive tutoring session
    Chat,

    /// Ask a single question
    Ask {
        /// The question to send
        #[arg(short, long)]
        message: String,

        /// Print the full turn as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show runtime status
    Status,

    /// Show reference passages for a topic
    Topic {
        /// Topic name, e.g. `vectores` or `producto_punto`
        name: String,

        /// Highest difficulty to include (1-5)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        level: Option<u8>,
    },

    /// Write the default configuration file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat => commands::chat::run().await?,
        Commands::Ask { message, json } => commands::ask::run(message, json).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Topic { name, level } => commands::topic::run(name, level).await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
