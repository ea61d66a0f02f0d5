//! dbal-migrate CLI
//!
//! Command-line tool for inspecting and migrating MySQL schemas.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use dbal_core::prelude::*;
use dbal_migrate::prelude::*;

/// Declarative schema migrations for MySQL.
#[derive(Parser)]
#[command(name = "dbal-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Connection configuration file (JSON).
    #[arg(short, long, env = "DBAL_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL, used when no configuration file is given.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Name of the configured connection (first one if not specified).
    #[arg(long)]
    connection: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current database schema as JSON.
    Inspect,

    /// Show the SQL needed to reach the desired schema.
    Diff {
        /// Desired schema file (JSON).
        #[arg(long)]
        desired: PathBuf,
    },

    /// Bring the database to the desired schema.
    Migrate {
        /// Desired schema file (JSON).
        #[arg(long)]
        desired: PathBuf,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },
}

const DEFAULT_CONNECTION: &str = "default";

fn load_config(cli: &Cli) -> anyhow::Result<DbalConfig> {
    if let Some(path) = &cli.config {
        return DbalConfig::from_path(path)
            .with_context(|| format!("loading configuration {}", path.display()));
    }

    let url = cli
        .database
        .clone()
        .context("either --config or --database (DATABASE_URL) is required")?;

    Ok(DbalConfig {
        connections: vec![ConnectionConfig::new(DEFAULT_CONNECTION, MYSQL_DRIVER, url)],
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;
    let mut manager = ConnectionManager::new(config, vec![Box::new(MySqlDriver)])?;

    let name = match &cli.connection {
        Some(name) => name.clone(),
        None => manager
            .connection_names()
            .next()
            .map(str::to_string)
            .context("no connection configured")?,
    };

    info!(connection = %name, "Connecting");
    let connection = manager.connection(&name)?;

    match cli.command {
        Commands::Inspect => {
            let executor = MigrationExecutor::new(connection, MySqlDialect::new());
            let schema = executor.inspect()?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }

        Commands::Diff { desired } => {
            let desired = Schema::from_json_file(&desired)?;
            let executor = MigrationExecutor::new(connection, MySqlDialect::new());

            let plan = executor.plan(&desired)?;
            if plan.is_empty() {
                info!("Schema is up to date.");
            }
            for sql in &plan {
                println!("{};", sql);
            }
        }

        Commands::Migrate { desired, dry_run } => {
            let desired = Schema::from_json_file(&desired)?;
            let executor =
                MigrationExecutor::new(connection, MySqlDialect::new()).dry_run(dry_run);

            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }

            executor.migrate(&desired)?;
        }
    }

    Ok(())
}
