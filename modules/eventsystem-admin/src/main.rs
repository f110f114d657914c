//! Operator tooling for a Postgres-backed event pipeline.
//!
//! Publishing and restarting belong to the process that owns the handlers;
//! this binary only prepares the schema and inspects records.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use eventsystem_store::{EventRecord, PgDatastore};

mod render;

#[derive(Parser)]
#[command(name = "eventsystem-admin", about = "Inspect and prepare the event store")]
#[command(version)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Print records as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the event_records table if it does not exist
    Migrate,

    /// List the most recently published events
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one event by id
    Show { id: String },

    /// Show the errored event halting the pipeline, if any
    Blocked,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store = PgDatastore::connect(&cli.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    match cli.command {
        Commands::Migrate => {
            store.migrate().await.context("Migration failed")?;
            info!("event_records is up to date");
        }
        Commands::List { limit } => {
            let events = store.read_recent(limit).await?;
            print_events(&events, cli.json)?;
        }
        Commands::Show { id } => {
            let event = store
                .read_event(&id)
                .await?
                .with_context(|| format!("No event with id {id}"))?;
            print_events(std::slice::from_ref(&event), cli.json)?;
        }
        Commands::Blocked => match store.read_blocking().await? {
            Some(event) => print_events(std::slice::from_ref(&event), cli.json)?,
            None => info!("Pipeline is not blocked"),
        },
    }

    Ok(())
}

fn print_events(events: &[EventRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(events)?);
    } else {
        print!("{}", render::table(events));
    }
    Ok(())
}
