use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::auth;
use crate::config::config;
use crate::database::DatabaseManager;
use crate::server::{self, AppState};

#[derive(Parser)]
#[command(name = "jobly")]
#[command(about = "Jobly API - companies and job listings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to API_PORT / PORT / 3001)")]
        port: Option<u16>,
    },

    #[command(about = "Print a signed token for manual testing")]
    Token {
        #[arg(help = "Username to embed in the token")]
        username: String,
        #[arg(long, help = "Grant admin rights")]
        admin: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => serve(port).await,
        Commands::Token { username, admin } => {
            let token = auth::create_token(&username, admin)?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config();
    info!("Starting Jobly API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    server::serve(AppState::new(pool), port.unwrap_or(config.api.port)).await
}
