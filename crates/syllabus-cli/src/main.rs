mod config;
mod participant_cmds;
mod plan_cmds;
mod resolve;
mod schedule_cmds;
mod serve_cmd;
mod settings_cmd;
mod status_cmd;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use sqlx::PgPool;

use syllabus_core::Workbench;
use syllabus_core::settings::SettingsService;
use syllabus_db::pool;
use syllabus_db::store::{PgStore, WorkbenchStore};

use config::SyllabusConfig;

#[derive(Parser)]
#[command(name = "syllabus", about = "Schedule plan workbench")]
struct Cli {
    /// Database URL (overrides SYLLABUS_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Owner whose settings apply (defaults to $USER)
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a syllabus config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/syllabus")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database and run migrations
    DbInit,
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Apply schedule batches and inspect rosters
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Attach or detach participants
    Participant {
        #[command(subcommand)]
        command: ParticipantCommands,
    },
    /// Show schedules by urgency (omit plan_id to list all plans)
    Status {
        /// Plan ID or batch file
        plan_id: Option<String>,
    },
    /// Show or change the owner's settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Serve the JSON HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a plan from a batch file and apply its operations
    Create {
        /// Path to the batch TOML file
        file: String,
    },
    /// Show plan details (or list all plans)
    Show {
        /// Plan ID or batch file (omit to list all)
        plan_id: Option<String>,
    },
    /// Delete a plan with its schedules and participants
    Delete {
        /// Plan ID or batch file
        plan_id: String,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Apply the operations in a batch file to its plan
    Apply {
        /// Path to the batch TOML file
        file: String,
    },
    /// Show the effective roster of a schedule
    Roster {
        /// Schedule ID
        schedule_id: String,
    },
}

#[derive(Subcommand)]
pub enum ParticipantCommands {
    /// Attach a person to a plan or schedule
    Add {
        /// Person reference
        person: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Detach a participant from a plan or schedule
    Remove {
        /// Participant ID
        participant_id: String,
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Exactly one of `--plan` or `--schedule`.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Plan ID or batch file
    #[arg(long)]
    plan: Option<String>,
    /// Schedule ID
    #[arg(long)]
    schedule: Option<String>,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print the effective settings
    Show,
    /// Change one setting
    Set {
        /// Setting name (max_batch_operations, show_cancelled)
        key: String,
        /// New value
        value: String,
    },
}

/// An open connection plus a workbench configured for one owner.
pub struct Session {
    pool: PgPool,
    pub owner: String,
    pub settings: SettingsService,
    pub workbench: Workbench,
}

impl Session {
    async fn open(cli_db_url: Option<&str>, owner: String) -> anyhow::Result<Self> {
        let resolved = SyllabusConfig::resolve(cli_db_url)?;
        let db_pool = pool::create_pool(&resolved.db_config).await?;
        let store: Arc<dyn WorkbenchStore> = Arc::new(PgStore::new(db_pool.clone()));

        let settings = SettingsService::new(store.clone()).with_cache(config::settings_cache_path());
        let loaded = settings.load(&owner).await;
        let workbench = Workbench::new(store, loaded);

        Ok(Self {
            pool: db_pool,
            owner,
            settings,
            workbench,
        })
    }

    async fn close(self) {
        self.pool.close().await;
    }
}

fn resolve_owner(cli_owner: Option<String>) -> String {
    cli_owner
        .or_else(|| std::env::var("USER").ok())
        .filter(|o| !o.trim().is_empty())
        .unwrap_or_else(|| "operator".to_string())
}

/// Execute the `syllabus init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
    };
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `syllabus db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `syllabus db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = SyllabusConfig::resolve(cli_db_url)?;

    println!("Initializing syllabus database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("syllabus db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let db_url = cli.database_url.as_deref();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(db_url).await?;
        }
        Commands::Serve { bind, port } => {
            let session = Session::open(db_url, resolve_owner(cli.owner)).await?;
            let pool = session.pool.clone();
            let result = serve_cmd::run_serve(session.workbench, &bind, port).await;
            pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let session = Session::open(db_url, resolve_owner(cli.owner)).await?;
            let result = plan_cmds::run_plan_command(command, &session).await;
            session.close().await;
            result?;
        }
        Commands::Schedule { command } => {
            let session = Session::open(db_url, resolve_owner(cli.owner)).await?;
            let result = schedule_cmds::run_schedule_command(command, &session).await;
            session.close().await;
            result?;
        }
        Commands::Participant { command } => {
            let session = Session::open(db_url, resolve_owner(cli.owner)).await?;
            let result = participant_cmds::run_participant_command(command, &session).await;
            session.close().await;
            result?;
        }
        Commands::Status { plan_id } => {
            let session = Session::open(db_url, resolve_owner(cli.owner)).await?;
            let result = status_cmd::run_status(&session, plan_id.as_deref()).await;
            session.close().await;
            result?;
        }
        Commands::Settings { command } => {
            let session = Session::open(db_url, resolve_owner(cli.owner)).await?;
            let result = settings_cmd::run_settings_command(command, &session).await;
            session.close().await;
            result?;
        }
    }

    Ok(())
}
