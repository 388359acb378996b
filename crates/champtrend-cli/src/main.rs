mod ingest;
mod maintenance;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "champtrend")]
#[command(about = "Daily champion difficulty and popularity snapshots")]
struct Cli {
    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect and store today's reference and metric snapshots.
    Run,
    #[command(flatten)]
    Store(StoreCommands),
}

/// Commands that read or maintain an already opened store.
#[derive(Debug, Subcommand)]
enum StoreCommands {
    /// Current leaderboard, sorted by views.
    Leaderboard {
        /// Only include entities with at least this difficulty.
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=10))]
        min_difficulty: u8,
    },
    /// View history and growth rate for one entity.
    History {
        entity: String,
        /// Show dates without a metric as gaps instead of zero.
        #[arg(long)]
        gaps: bool,
    },
    /// Raw rows of the latest-date view.
    Latest {
        #[arg(long)]
        entity: Option<String>,
    },
    /// Generate synthetic history before the newest snapshot date (development aid).
    Backfill {
        #[arg(long, default_value_t = 5)]
        days: u32,
    },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Migrate,
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = champtrend_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let command = match cli.command.unwrap_or(Commands::Run) {
        // Opens its own store so that setup failures reach the notifier.
        Commands::Run => return ingest::run_ingestion(&config).await,
        Commands::Store(command) => command,
    };

    let pool_config = champtrend_db::PoolConfig::from_app_config(&config);
    let pool = champtrend_db::connect_pool(&config.database_url, pool_config).await?;

    let outcome = dispatch(&pool, command).await;

    // The store is released on every path, including failed runs.
    pool.close().await;
    outcome
}

async fn dispatch(pool: &sqlx::SqlitePool, command: StoreCommands) -> anyhow::Result<()> {
    if !matches!(command, StoreCommands::Db { .. }) {
        champtrend_db::run_migrations(pool).await?;
    }

    match command {
        StoreCommands::Leaderboard { min_difficulty } => {
            report::print_leaderboard(pool, min_difficulty).await
        }
        StoreCommands::History { entity, gaps } => {
            report::print_history(pool, &entity, gaps).await
        }
        StoreCommands::Latest { entity } => report::print_latest(pool, entity.as_deref()).await,
        StoreCommands::Backfill { days } => maintenance::run_backfill(pool, days).await,
        StoreCommands::Db { command } => match command {
            DbCommands::Migrate => maintenance::run_migrate(pool).await,
            DbCommands::Ping => maintenance::run_ping(pool).await,
        },
    }
}
