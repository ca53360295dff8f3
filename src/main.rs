use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Instrument;

mod app;
mod config;
mod error;
mod pb;
mod state;
mod users;

#[derive(Parser, Debug)]
#[command(name = "auth-service", version, about = "gRPC service for auth user records")]
struct Cli {
    /// Path to a dotenv file loaded before reading configuration
    #[arg(long, default_value = ".env")]
    config_path: PathBuf,

    /// Log filter, overrides RUST_LOG
    #[arg(short, long)]
    log_level: Option<String>,

    /// Runs the server when omitted
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert random users and print the first rows of the table
    Seed {
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },
}

fn init_tracing(log_level: Option<&str>) {
    let env_filter = log_level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "auth_service=debug,tower_http=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Loaded before the subscriber so RUST_LOG and LOG_FORMAT can live in the file.
    let dotenv = dotenvy::from_path(&cli.config_path);
    init_tracing(cli.log_level.as_deref());
    if let Err(e) = dotenv {
        tracing::warn!(path = %cli.config_path.display(), error = %e, "config file not loaded; using process environment");
    }

    let span = tracing::info_span!("app", api = app::API_NAME);
    run(cli).instrument(span).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let app_state = state::AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    match cli.command {
        Some(Command::Seed { count }) => users::seed::run(app_state.users.as_ref(), count).await,
        None => app::serve(app_state).await,
    }
}
