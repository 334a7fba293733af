//! `up`: a small command line front end over the SDK.
//!
//! Reads `UP_ENDPOINT` (base URL), `UP_TOKEN` (bearer token) and
//! `UP_REQUEST_ID` from the environment or a `.env` file.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use up_sdk::context::{new_id, with_id};
use up_sdk::fetch::BasicClient;
use up_sdk::fetch::auth::HeaderAuth;
use up_sdk::oauth2::parse_scope;
use up_sdk::services::{
    CreatePermission, GitSourcesClient, Permission, RepositoryPermissionsClient,
    TeamCreateParameters, TeamsClient, UserInfoClient,
};
use up_sdk::{Config, Context};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "up")]
#[command(about = "Talk to the Upbound API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in user
    Whoami,
    /// Manage teams
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },
    /// Manage team permissions on repositories
    RepoPermission {
        #[command(subcommand)]
        command: RepoPermissionCommands,
    },
    /// Start the GitHub login and print where it redirects
    GitLogin {
        /// Local port a CLI callback listens on (0 = none)
        #[arg(short, long, default_value_t = 0)]
        port: u16,
    },
    /// Check whether a string is a valid OAuth2 scope
    Scope {
        #[arg(value_name = "SCOPE")]
        raw: String,
    },
}

#[derive(Subcommand)]
enum TeamCommands {
    Get { id: Uuid },
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        organization_id: u32,
    },
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum RepoPermissionCommands {
    List {
        #[arg(long)]
        org: String,
        #[arg(long)]
        team: Uuid,
    },
    Grant {
        #[arg(long)]
        org: String,
        #[arg(long)]
        team: Uuid,
        #[arg(long)]
        repository: String,
        /// admin, read, write or view
        #[arg(long)]
        permission: Permission,
    },
    Revoke {
        #[arg(long)]
        org: String,
        #[arg(long)]
        team: Uuid,
        #[arg(long)]
        repository: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr, plus a JSON rolling log file when asked for
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")));

    let (json_layer, _file_guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let log_dir = Path::new(&log_file_path)
                .parent()
                .unwrap_or(Path::new("logs"));
            let log_file_name = Path::new(&log_file_path)
                .file_name()
                .unwrap_or(OsStr::new("up.log"));
            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(
                    EnvFilter::try_from_env("RUST_LOG_JSON")
                        .unwrap_or_else(|_| EnvFilter::new("debug")),
                );
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    if let Commands::Scope { raw } = &cli.command {
        match parse_scope(raw) {
            Some(scope) => println!("{} ({})", scope, scope.scope_type().as_str()),
            None => anyhow::bail!("{raw:?} is not a recognised scope"),
        }
        return Ok(());
    }

    let config = load_config()?;
    let request_id = std::env::var("UP_REQUEST_ID").unwrap_or_else(|_| new_id());
    let ctx = with_id(&Context::background(), request_id.as_str());
    info!(request_id = %request_id, base_url = %config.transport().base_url(), "Calling API");

    match cli.command {
        Commands::Whoami => {
            let info = UserInfoClient::from_config(&config)
                .get(&ctx)
                .await
                .context("fetching user info")?;
            print_json(&info)?;
        }
        Commands::Team { command } => {
            let teams = TeamsClient::from_config(&config);
            match command {
                TeamCommands::Get { id } => {
                    let team = teams.get(&ctx, id).await.context("fetching team")?;
                    print_json(&team)?;
                }
                TeamCommands::Create {
                    name,
                    organization_id,
                } => {
                    let params = TeamCreateParameters {
                        name,
                        organization_id,
                    };
                    let team = teams.create(&ctx, &params).await.context("creating team")?;
                    print_json(&team)?;
                }
                TeamCommands::Delete { id } => {
                    teams.delete(&ctx, id).await.context("deleting team")?;
                    info!(team = %id, "Team deleted");
                }
            }
        }
        Commands::RepoPermission { command } => {
            let perms = RepositoryPermissionsClient::from_config(&config);
            match command {
                RepoPermissionCommands::List { org, team } => {
                    let list = perms
                        .list(&ctx, &org, team)
                        .await
                        .context("listing permissions")?;
                    print_json(&list)?;
                }
                RepoPermissionCommands::Grant {
                    org,
                    team,
                    repository,
                    permission,
                } => {
                    let params = CreatePermission {
                        repository,
                        permission,
                    };
                    perms
                        .create(&ctx, &org, team, &params)
                        .await
                        .context("granting permission")?;
                }
                RepoPermissionCommands::Revoke {
                    org,
                    team,
                    repository,
                } => {
                    perms
                        .delete(&ctx, &org, team, &repository)
                        .await
                        .context("revoking permission")?;
                }
            }
        }
        Commands::GitLogin { port } => {
            let login = GitSourcesClient::from_config(&config)
                .login(&ctx, port)
                .await
                .context("starting git login")?;
            println!("{}", login.status_code);
            if let Some(url) = login.redirect_url {
                println!("{url}");
            }
        }
        Commands::Scope { .. } => {}
    }

    Ok(())
}

/// Builds the SDK configuration from the environment.
fn load_config() -> Result<Config> {
    let mut builder = Config::builder();
    if let Ok(endpoint) = std::env::var("UP_ENDPOINT") {
        builder = builder
            .base_url_str(&endpoint)
            .with_context(|| format!("UP_ENDPOINT {endpoint:?} is not a valid URL"))?;
    }
    if let Ok(token) = std::env::var("UP_TOKEN") {
        let engine = HeaderAuth::bearer(BasicClient::new(), &token).context("UP_TOKEN")?;
        builder = builder.http_client(Arc::new(engine));
    }
    Ok(builder.build())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
