//! Sauti CLI - token and model administration for the serving core.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use sauti_core::{Database, SpeakerStore, TokenStore};

mod commands;

/// Sauti - text-to-speech serving core
///
/// Examples:
///   sauti token create --name ci-bot     # Issue a bearer token
///   sauti token list                     # Inspect issued tokens
///   sauti models list                    # Show known model variants
#[derive(Parser)]
#[command(
    name = "sauti",
    about = "Administration CLI for the sauti TTS serving core",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true,
    propagate_version = true,
)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, value_name = "PATH", env = "SAUTI_DATABASE", default_value = "sauti.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage auth tokens
    #[command(name = "token", alias = "tokens")]
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Inspect model variants
    #[command(name = "models", alias = "model")]
    Models {
        #[command(subcommand)]
        command: ModelCommands,
    },

    /// Inspect speaker profiles
    Speakers {
        #[command(subcommand)]
        command: SpeakerCommands,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Create a new auth token and print it to stdout
    ///
    /// The token string is only shown once; it cannot be retrieved later.
    Create {
        /// Name for the token
        #[arg(short, long)]
        name: String,

        /// Token expiration in days (omit for no expiration)
        #[arg(short = 'e', long = "expires-in", value_name = "DAYS")]
        expires_in_days: Option<i64>,

        /// Only output the token without additional information
        #[arg(short, long)]
        quiet: bool,
    },

    /// List all tokens (metadata only, never secrets)
    List,

    /// Show a single token by id
    Show { id: Uuid },

    /// Revoke a token, keeping its record for audit
    Revoke { id: Uuid },

    /// Permanently delete a token
    Delete { id: Uuid },

    /// Verify a full token string
    Verify { token: String },
}

#[derive(Subcommand)]
enum ModelCommands {
    /// List known model variants and their capabilities
    List,
}

#[derive(Subcommand)]
enum SpeakerCommands {
    /// List stored speaker profiles
    List,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sauti=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Models { command } => match command {
            ModelCommands::List => commands::models::list(),
        },
        Commands::Token { command } => {
            let tokens = TokenStore::new(open_database(&cli.database)?);
            match command {
                TokenCommands::Create {
                    name,
                    expires_in_days,
                    quiet,
                } => commands::token::create(&tokens, &name, expires_in_days, quiet),
                TokenCommands::List => commands::token::list(&tokens),
                TokenCommands::Show { id } => commands::token::show(&tokens, id),
                TokenCommands::Revoke { id } => commands::token::revoke(&tokens, id),
                TokenCommands::Delete { id } => commands::token::delete(&tokens, id),
                TokenCommands::Verify { token } => commands::token::verify(&tokens, &token),
            }
        }
        Commands::Speakers { command } => {
            let speakers = SpeakerStore::new(open_database(&cli.database)?);
            match command {
                SpeakerCommands::List => commands::speakers::list(&speakers),
            }
        }
    }
}

fn open_database(path: &PathBuf) -> anyhow::Result<Arc<Database>> {
    Ok(Arc::new(Database::open(path)?))
}
