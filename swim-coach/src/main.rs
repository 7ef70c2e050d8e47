//! swim-coach - swim-school progress service
//!
//! Serves the JSON API for coaches and parents: level progress, video
//! submissions and reviews, chat and notifications.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use swim_coach::db::registrations::purge_expired_registrations;
use swim_coach::db::users::{create_user, find_user_by_email, NewUser};
use swim_coach::settings::RuntimeSettings;
use swim_coach::{build_router, AppState};
use swim_common::config::{RootFolderInitializer, RootFolderResolver, ServerConfig, TomlConfig};
use swim_common::db::{init_database, Role};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "swim-coach")]
#[command(about = "Swim-school progress service")]
#[command(version)]
struct Args {
    /// Folder holding the database
    #[arg(short, long, env = "SWIMCOACH_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides config.toml)
    #[arg(short, long, env = "SWIMCOACH_PORT")]
    port: Option<u16>,

    /// Create this coach account at startup if it does not exist yet
    #[arg(long, env = "SWIMCOACH_COACH_EMAIL", requires = "coach_password")]
    coach_email: Option<String>,

    #[arg(long, env = "SWIMCOACH_COACH_NAME", default_value = "Coach")]
    coach_name: String,

    #[arg(long, env = "SWIMCOACH_COACH_PASSWORD", hide_env_values = true)]
    coach_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting swim-coach v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let mut toml_config = TomlConfig::load_default();
    if let Some(port) = args.port {
        toml_config.port = Some(port);
    }

    let root_folder = RootFolderResolver::new("swim-coach")
        .with_cli_arg(args.root_folder.clone())
        .with_toml(toml_config.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let purged = purge_expired_registrations(&pool).await?;
    if purged > 0 {
        info!("Removed {} expired pending registrations", purged);
    }

    if let (Some(email), Some(password)) = (&args.coach_email, &args.coach_password) {
        ensure_coach(&pool, email, &args.coach_name, password).await?;
    }

    let settings = RuntimeSettings::load(&pool).await?;
    info!(?settings, "Runtime settings loaded");

    let server = ServerConfig::from_toml(&toml_config);

    let state = AppState::new(pool, settings, &server.app_url);
    let app = build_router(state);

    let bind_address = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("swim-coach listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the bootstrap coach account unless the email is already taken
async fn ensure_coach(pool: &sqlx::SqlitePool, email: &str, name: &str, password: &str) -> Result<()> {
    if find_user_by_email(pool, email).await?.is_some() {
        info!("Coach account {} already exists", email);
        return Ok(());
    }

    let coach = create_user(
        pool,
        &NewUser {
            email,
            name,
            password,
            role: Role::Coach,
            coach_id: None,
            phone: None,
        },
    )
    .await?;
    info!(coach_id = %coach.id, "Created coach account {}", coach.email);
    Ok(())
}
