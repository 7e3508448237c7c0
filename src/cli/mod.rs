use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

pub mod auth;
pub mod serve;
pub mod slots;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Run the MCP server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Set the server port
        #[arg(long, env = "PORT", default_value = "8000")]
        port: u16,
    },
    /// Perform OAuth authentication and print the refresh token
    Auth {
        /// Redirect URI registered for the OAuth client
        #[arg(long, default_value = "urn:ietf:wg:oauth:2.0:oob")]
        redirect_uri: String,
    },
    /// Print the free appointment slots of a day
    Slots {
        /// Date in YYYY-MM-DD format
        #[arg(long)]
        date: NaiveDate,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    // A missing .env file is fine, the environment may be set directly
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let config = AppConfig::from_env()?;

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port, config).await?;
        }
        Some(Command::Auth { redirect_uri }) => {
            auth::run(&config, &redirect_uri).await?;
        }
        Some(Command::Slots { date }) => {
            slots::run(&config, date).await?;
        }
        None => {}
    }

    Ok(())
}
