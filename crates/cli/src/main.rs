//! Stockroom CLI - database migrations and account maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! stockroom-cli migrate
//!
//! # Create a user, optionally with a role
//! stockroom-cli user create -n "Jane Doe" -e jane@example.com -p 5551234567 \
//!     --password 'S3cure!pass' -r admin
//!
//! # Delete expired login tokens
//! stockroom-cli tokens purge
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create users
//! - `tokens purge` - Delete expired login tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stockroom-cli")]
#[command(author, version, about = "Stockroom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage login tokens
    Tokens {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Phone number (7 to 15 digits, optional leading +)
        #[arg(short, long)]
        phone: String,

        /// Password (at least 8 characters, one uppercase letter, one digit, one symbol)
        #[arg(long)]
        password: String,

        /// Role (`admin`, `staff`, `customer`)
        #[arg(short, long)]
        role: Option<String>,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Delete expired login tokens
    Purge,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                name,
                email,
                phone,
                password,
                role,
            } => {
                let user = commands::user::NewUserArgs {
                    name,
                    email,
                    phone,
                    password,
                    role,
                };
                commands::user::create(user).await?;
            }
        },
        Commands::Tokens { action } => match action {
            TokenAction::Purge => {
                commands::tokens::purge().await?;
            }
        },
    }
    Ok(())
}
