//! User Lookup CLI - Database migrations and seeding tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ul-cli migrate
//!
//! # Insert a user record
//! ul-cli user create -e ann@example.com -n "Ann" --instant 2024-01-01T00:00:00Z
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Insert a user record (the HTTP service is read-only)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::user::CreateUserArgs;

#[derive(Parser)]
#[command(name = "ul-cli")]
#[command(author, version, about = "User lookup CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user records
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Insert a new user; the database assigns the id
    Create(CreateUserArgs),
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create(args) => commands::user::create(args).await?,
        },
    }
    Ok(())
}
