mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod render;
mod services;
mod session;
#[cfg(test)]
mod testing;
mod validate;
mod workflow;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::ticket::{self, TicketArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::infra::dbs::DbsClient;
use crate::infra::github::GithubReleases;
use crate::infra::ticket_api::{Credentials, TicketApiClient};
use crate::infra::{grid_identity, http_client};
use crate::services::ReleaseCatalog;
use crate::session::{EditSession, FileSessionStore};
use crate::validate::Catalogs;

#[derive(Parser)]
#[command(name = "relval", author, version, about = "Create and edit RelVal tickets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open, edit, clone, submit and list tickets.
    Ticket(TicketArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(())
        }
        Commands::Ticket(args) => {
            let context = build_context()?;
            ticket::run(&context, args.command).await
        }
    }
}

fn build_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;

    if config.api_url.is_none() {
        warn!("ticket API URL not configured; run `relval config init` or set RELVAL_API_URL");
    }
    if config.api_token.is_none() && config.api_user.is_none() {
        warn!("no ticket API credentials configured; requests are sent unauthenticated");
    }

    let credentials = match (&config.api_token, &config.api_user, &config.api_password) {
        (Some(token), _, _) => Some(Credentials::Bearer(token.clone())),
        (None, Some(user), Some(password)) => Some(Credentials::Basic {
            user: user.clone(),
            password: password.clone(),
        }),
        (None, Some(_), None) => {
            return Err(AppError::Configuration(
                "ticket API user is set but the password is missing".to_string(),
            ));
        }
        _ => None,
    };

    let identity = match (&config.grid_cert, &config.grid_key) {
        (Some(cert), Some(key)) => Some(grid_identity(cert, key)?),
        (None, None) => {
            warn!("grid certificate not configured; DBS lookups may be rejected");
            None
        }
        _ => {
            return Err(AppError::Configuration(
                "grid certificate and key must be configured together".to_string(),
            ));
        }
    };

    let http = http_client(config.http_timeout, None)?;
    let dbs_http = http_client(config.http_timeout, identity)?;

    let tickets = Arc::new(TicketApiClient::new(
        http.clone(),
        config.api_url.clone(),
        credentials,
    ));
    let releases: Option<Arc<dyn ReleaseCatalog>> = if config.check_release {
        Some(Arc::new(GithubReleases::new(http, config.github_url.clone())))
    } else {
        None
    };
    let catalogs = Catalogs {
        metadata: Arc::new(DbsClient::new(dbs_http, config.dbs_url.clone())),
        releases,
    };

    let sessions = FileSessionStore::open_default()?;
    debug!(path = %sessions.path().display(), "using session file");
    let session_key = EditSession::compute_key(
        &config.user,
        config.api_url.as_deref().unwrap_or_default(),
    );

    Ok(AppContext::new(
        config,
        tickets,
        catalogs,
        Arc::new(sessions),
        session_key,
    ))
}
