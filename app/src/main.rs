#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;

use command::{
    ChatInput, ChatStrategy, CommandStrategy, InfoStrategy, InitStrategy, ReplyInput,
    ReplyStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "chatdeck")]
#[command(about = "Chat with a hosted language model from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a conversation
    Chat {
        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,

        /// Session name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Display language (th, en, zh)
        #[arg(short = 'l', long)]
        language: Option<String>,

        /// Use canned replies instead of the API
        #[arg(long)]
        offline: bool,

        /// Resume from an exported session file
        #[arg(long, value_name = "FILE")]
        import: Option<PathBuf>,

        /// Export the session to this file on exit
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },
    /// Answer one message from the canned reply book
    Reply {
        /// Message text
        text: String,
    },
    /// Initialize configuration
    Init,
    /// Show configuration
    Info,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            model,
            name,
            language,
            offline,
            import,
            export,
        } => {
            ChatStrategy
                .execute(ChatInput {
                    message,
                    model,
                    session_name: name,
                    language,
                    offline,
                    import,
                    export,
                })
                .await
        }
        Commands::Reply { text } => ReplyStrategy.execute(ReplyInput { text }).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
