use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starship_command::api::{self, SecurityConfig};
use starship_command::clock::SystemClock;
use starship_command::config::FleetConfig;
use starship_command::db::Database;
use starship_command::services::FleetService;

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "starship")]
#[command(about = "Household command service: starships, modules, missions and crew")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Database file (overrides STARSHIP_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "starship_command=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16, db_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = FleetConfig::from_env();
    if db_path.is_some() {
        config.database_path = db_path;
    }

    let path = config.resolve_database_path()?;
    tracing::info!("Opening database at {}", path.display());
    let db = Database::open(path)?;
    db.migrate()?;

    let service = FleetService::new(db, Arc::new(SystemClock), config);
    let security = SecurityConfig::from_env();
    if let Some(limiter) = &security.rate_limiter {
        limiter.spawn_cleanup();
    }
    let app = api::create_router_with_config(service, security);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Starship Command listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    match Cli::parse().command {
        Some(Commands::Serve { port, db }) => serve(port, db).await,
        None => serve(DEFAULT_PORT, None).await,
    }
}
