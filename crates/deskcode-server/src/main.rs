//! `DeskCode` Admin Server
//!
//! Serves the client config-code API and the admin API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use deskcode_core::config::{self, Config};
use deskcode_core::db::unix_timestamp;
use deskcode_core::tracing_init::init_tracing;
use deskcode_server::auth::JwtManager;
use deskcode_server::auth::password::hash_password;
use deskcode_server::engine::{ConfigCodeEngine, EngineLimits, decode_offline_code};
use deskcode_server::http::{AppState, build_router};
use deskcode_server::settings::{SharedSettings, SystemSettings};
use deskcode_server::storage::AdminDatabase;

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Parser, Debug)]
#[command(name = "deskcode-server")]
#[command(
    version,
    about = "DeskCode admin server - server profiles and config codes"
)]
struct Args {
    /// Address to listen on (overrides config).
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file (overrides config).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Explicit JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shared secret for offline-code envelopes.
    #[arg(long, env = "DESKCODE_SECRET", default_value = DEV_SECRET, hide_env_values = true)]
    secret: String,

    /// JWT signing secret for admin tokens.
    #[arg(long, env = "DESKCODE_JWT_SECRET", default_value = DEV_SECRET, hide_env_values = true)]
    jwt_secret: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Create an admin account.
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long, env = "DESKCODE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Decode an offline config code with the shared secret and print it.
    DecodeOffline {
        code: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(path) = &args.db_path {
        config.server.database_path = Some(path.clone());
    }

    init_tracing(
        &format!("deskcode_server={}", config.server.log_level),
        args.log_json,
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, &args.secret, &args.jwt_secret).await,
        Command::CreateAdmin { username, password } => {
            create_admin(&config, &username, &password).await
        }
        Command::DecodeOffline { code } => decode_offline(&config, &args.secret, &code),
    }
}

async fn open_database(config: &Config) -> anyhow::Result<AdminDatabase> {
    let path = match &config.server.database_path {
        Some(path) => path.clone(),
        None => config::database_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine default database path"))?,
    };
    info!(path = %path.display(), "Opening admin database");
    AdminDatabase::open(&path)
        .await
        .with_context(|| format!("open database {}", path.display()))
}

async fn serve(config: &Config, secret: &str, jwt_secret: &str) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        "Starting deskcode-server"
    );
    if secret == DEV_SECRET || jwt_secret == DEV_SECRET {
        warn!("Running with the built-in development secret; set DESKCODE_SECRET and DESKCODE_JWT_SECRET");
    }

    let db = open_database(config).await?;
    let engine = ConfigCodeEngine::new(db, secret, EngineLimits::from(&config.codes));
    let jwt = JwtManager::new(jwt_secret.as_bytes());
    let ttl = u64::try_from(config.auth.access_ttl_secs).unwrap_or(3600);
    let settings = SharedSettings::new(SystemSettings::with_token_expire(Duration::from_secs(ttl)));

    let app = build_router(AppState::new(engine, jwt, settings));

    let listener = tokio::net::TcpListener::bind(config.server.addr)
        .await
        .with_context(|| format!("bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "deskcode-server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("deskcode-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn create_admin(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    if username.trim().is_empty() || password.len() < 8 {
        anyhow::bail!("username must not be blank and password must be at least 8 characters");
    }
    let db = open_database(config).await?;
    let hash = hash_password(password)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    let user = db.create_admin_user(username.trim(), &hash).await?;
    info!(admin_id = user.id, username = %user.username, "Admin user created");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn decode_offline(config: &Config, secret: &str, code: &str) -> anyhow::Result<()> {
    let payload = decode_offline_code(
        code,
        secret,
        &config.codes.prefix,
        config.codes.offline_max_age_secs,
        unix_timestamp(),
    )?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
