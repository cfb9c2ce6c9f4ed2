use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use engine::{BudgetTracking, Engine};
use migration::{Migrator, MigratorTrait};

mod scheduler;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "ledgerd")]
#[command(about = "Personal finance ledger: HTTP API and recurring scheduler")]
struct Cli {
    /// Settings file, with or without the `.toml` extension.
    #[arg(long, env = "LEDGER_CONFIG", default_value = "settings")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API and run the daily scheduler (default).
    Serve,
    /// Apply pending migrations and exit.
    Migrate,
    /// Run one recurring sweep and exit.
    RunRecurring {
        /// Day to sweep, `YYYY-MM-DD`. Defaults to today in the scheduler timezone.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;
    let timezone = settings.timezone()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerd={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect(&settings.database).await?;
    let tracking = if settings.budgets.tracking {
        BudgetTracking::Enabled
    } else {
        BudgetTracking::Disabled
    };
    let engine = Arc::new(
        Engine::builder()
            .database(db)
            .budget_tracking(tracking)
            .build()
            .await?,
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::RunRecurring { date } => {
            let today = date.unwrap_or_else(|| Utc::now().with_timezone(&timezone).date_naive());
            if scheduler::sweep(&engine, today).await.is_none() {
                return Err("recurring sweep failed".into());
            }
        }
        Command::Serve => {
            let mut tasks = tokio::task::JoinSet::new();

            if let Some(server) = settings.server {
                let state = server::ServerState::new(engine.clone(), timezone);
                let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
                let listener = tokio::net::TcpListener::bind(format!("{bind}:{}", server.port)).await?;
                tasks.spawn(async move {
                    if let Err(err) = server::run_with_listener(state, listener).await {
                        tracing::error!("server failed: {err}");
                    }
                });
            }

            if settings.scheduler.enabled {
                let engine = engine.clone();
                let hour = settings.scheduler.hour;
                tasks.spawn(scheduler::run(engine, timezone, hour));
            }

            if tasks.is_empty() {
                tracing::warn!("neither server nor scheduler configured, nothing to do");
            }

            while tasks.join_next().await.is_some() {
                tasks.shutdown().await;
            }
        }
    }

    Ok(())
}

async fn connect(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
