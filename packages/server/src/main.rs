use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use foodgram_common::model::NewUser;
use foodgram_common::{DomainError, users};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use foodgram_server::build_router;
use foodgram_server::config::AppConfig;
use foodgram_server::seed;
use foodgram_server::state::{AppState, open_store};
use foodgram_server::utils::jwt;

#[derive(Parser)]
#[command(name = "foodgram", version, about = "Foodgram recipe-sharing API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (the default).
    Serve,
    /// Create a user account.
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Grant staff rights (tag and ingredient curation, editing any recipe).
        #[arg(long)]
        staff: bool,
    },
    /// Print a bearer token for an existing user.
    IssueToken { user_id: i32 },
    /// Import ingredients from a JSON array of `{name, measurement_unit}`.
    LoadIngredients { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load config")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateUser {
            email,
            username,
            first_name,
            last_name,
            staff,
        } => {
            let store = open_store(&config).await?;
            let new_user = NewUser {
                email,
                username,
                first_name,
                last_name,
                is_staff: staff,
            };
            let user = users::provision(&*store, &new_user)
                .await
                .context("Failed to create user")?;
            println!("{}", user.id);
            Ok(())
        }
        Command::IssueToken { user_id } => {
            let store = open_store(&config).await?;
            let user = store
                .get_user(user_id)
                .await?
                .ok_or(DomainError::NotFound("User"))
                .with_context(|| format!("No user with id {user_id}"))?;
            let token = jwt::sign(
                &config.auth.jwt_secret,
                config.auth.token_ttl_days,
                user.id,
                &user.username,
                user.is_staff,
            )?;
            println!("{token}");
            Ok(())
        }
        Command::LoadIngredients { file } => {
            let store = open_store(&config).await?;
            let inserted = seed::load_ingredients(&*store, &file).await?;
            println!("{inserted}");
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState::from_config(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
