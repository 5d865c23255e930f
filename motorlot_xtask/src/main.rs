use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use motorlot_store::{MotorlotStore, SeedConflict, Version, seeds};

const OPERATOR_SECRET_ENV: &str = "MOTORLOT_OPERATOR_SECRET";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let store = MotorlotStore::open(&cli.datastore)
        .await
        .with_context(|| format!("open datastore {}", cli.datastore.display()))?;
    match cli.command {
        Command::Migrate { action } => migrate(&store, action).await,
        Command::Seed { action } => seed(&store, action).await,
        Command::Schema { action } => schema(&store, action).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Schema migrations and reference data for a Motorlot datastore"
)]
struct Cli {
    /// Directory holding motorlot.json and the sqlite file.
    #[arg(long, global = true, default_value = ".motorlot")]
    datastore: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply, revert and inspect schema migrations.
    Migrate {
        #[command(subcommand)]
        action: MigrateCommand,
    },
    /// Load or remove reference rows.
    Seed {
        #[command(subcommand)]
        action: SeedCommand,
    },
    /// Inspect the schema implied by the applied migrations.
    Schema {
        #[command(subcommand)]
        action: SchemaCommand,
    },
}

#[derive(Subcommand)]
enum MigrateCommand {
    /// Apply pending migrations in version order.
    Up {
        /// Stop after this version (inclusive).
        #[arg(long)]
        to: Option<String>,
    },
    /// Revert the most recently applied migrations.
    Down {
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
    /// List every migration with its applied instant.
    Status,
    /// Clear a migration lock left behind by a crashed run.
    Unlock,
}

#[derive(Subcommand)]
enum SeedCommand {
    /// Insert a seed's rows, skipping ids that already exist.
    Up {
        name: String,
        /// Fail instead of skipping rows that already exist.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Delete the rows a seed inserted.
    Down { name: String },
}

#[derive(Subcommand)]
enum SchemaCommand {
    /// Print the applied schema shape as JSON.
    Dump,
}

async fn migrate(store: &MotorlotStore, action: MigrateCommand) -> Result<()> {
    let runner = store.catalog_runner().context("load migration catalog")?;
    match action {
        MigrateCommand::Up { to } => {
            let to = to.as_deref().map(Version::parse).transpose()?;
            let applied = runner.apply_forward(to.as_ref()).await?;
            if applied.is_empty() {
                println!("Nothing to apply");
            }
            for version in applied {
                println!("Applied {version}");
            }
        }
        MigrateCommand::Down { steps } => {
            let rolled_back = runner.rollback_last(steps).await?;
            if rolled_back.is_empty() {
                println!("Nothing to roll back");
            }
            for version in rolled_back {
                println!("Rolled back {version}");
            }
        }
        MigrateCommand::Status => {
            for unit in runner.status().await? {
                let applied = unit
                    .applied_at
                    .map(|at| at.to_datetime().to_rfc3339())
                    .unwrap_or_else(|| "pending".to_string());
                println!(
                    "{:<16} {:<34} {}",
                    unit.version.as_str(),
                    applied,
                    unit.description
                );
            }
        }
        MigrateCommand::Unlock => {
            if runner.force_unlock().await? {
                println!("Migration lock cleared");
            } else {
                println!("No migration lock was held");
            }
        }
    }
    Ok(())
}

async fn seed(store: &MotorlotStore, action: SeedCommand) -> Result<()> {
    let loader = store.seeds()?;
    match action {
        SeedCommand::Up { name, strict } => {
            let seed = find_seed(&name, true)?;
            let mode = if strict {
                SeedConflict::Fail
            } else {
                SeedConflict::Skip
            };
            let report = loader
                .load_seed(&seed, mode)
                .await
                .with_context(|| format!("seed {name}"))?;
            println!(
                "Seed {name}: {} inserted, {} skipped",
                report.inserted.len(),
                report.skipped.len()
            );
        }
        SeedCommand::Down { name } => {
            let seed = find_seed(&name, false)?;
            let removed = loader
                .remove_seed(&seed)
                .await
                .with_context(|| format!("seed {name}"))?;
            println!("Seed {name}: {} removed", removed.len());
        }
    }
    Ok(())
}

/// Removal matches rows by id, so the operator secret only matters when loading.
fn find_seed(name: &str, loading: bool) -> Result<motorlot_store::Seed> {
    let secret = match std::env::var(OPERATOR_SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => secret,
        _ if loading && name == "operators" => {
            return Err(anyhow!(
                "set {OPERATOR_SECRET_ENV} to load the operators seed"
            ));
        }
        _ => String::from("unused"),
    };
    seeds::find(name, &secret)?.ok_or_else(|| {
        anyhow!(
            "unknown seed '{name}' (expected one of: {})",
            seeds::SEED_NAMES.join(", ")
        )
    })
}

async fn schema(store: &MotorlotStore, action: SchemaCommand) -> Result<()> {
    match action {
        SchemaCommand::Dump => {
            let shape = store.catalog_runner()?.applied_shape().await?;
            println!("{}", serde_json::to_string_pretty(&shape)?);
        }
    }
    Ok(())
}
