//! Tity Creations CLI - database migrations and shop management.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront schema and the session table
//! tity-cli migrate
//!
//! # Insert the demo catalog (existing products keep their stock)
//! tity-cli seed
//!
//! # Insert products from a YAML file instead
//! tity-cli seed --file catalog.yaml
//!
//! # Create a customer account
//! tity-cli user create -u maria -p 'una contraseña larga'
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tity-cli")]
#[command(author, version, about = "Tity Creations CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (storefront schema and sessions)
    Migrate,
    /// Insert catalog products that do not exist yet
    Seed {
        /// YAML file with a list of products (defaults to the demo catalog)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Manage customer accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new customer account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::catalog(file.as_deref()).await?,
        Commands::User { action } => match action {
            UserAction::Create { username, password } => {
                commands::user::create(&username, &password).await?;
            }
        },
    }
    Ok(())
}
