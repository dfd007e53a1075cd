mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keepsake::config::KeepsakeConfig;
use keepsake::memory::maintenance::{MaintenanceScheduler, SchedulerSettings};
use keepsake::memory::recall::{NullIndexer, RetrievalFacade};
use keepsake::memory::types::Tier;
use keepsake::memory::TierSet;

#[derive(Parser)]
#[command(name = "keepsake", version, about = "Tiered conversational memory engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the maintenance scheduler until interrupted
    Run,
    /// Store a new fact
    Record {
        /// The fact text
        content: String,
        /// Destination tier: short or long
        #[arg(long, default_value = "short")]
        tier: Tier,
        /// Importance in [0.0, 1.0]
        #[arg(long)]
        importance: Option<f64>,
        /// Mood at creation time
        #[arg(long)]
        mood: Option<String>,
        /// Topic tags (repeatable)
        #[arg(long = "topic")]
        topic_tags: Vec<String>,
        /// Ambient tags (repeatable)
        #[arg(long = "ambient")]
        ambient_tags: Vec<String>,
        /// Importance lost per elapsed day
        #[arg(long)]
        decay_rate: Option<f64>,
    },
    /// Rank stored facts against a mood and query tags
    Recall {
        /// Current mood
        #[arg(long, default_value = "neutral")]
        mood: String,
        /// Query tags (repeatable)
        #[arg(long = "tag")]
        query_tags: Vec<String>,
        /// Maximum results
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Replace a stored fact's content in place
    Rewrite {
        /// Entry id
        id: String,
        /// Replacement text
        content: String,
    },
    /// Archive decayed entries now (one-shot sweep)
    Sweep,
    /// Promote all short-term entries to long-term now
    Migrate,
    /// Show per-tier statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = KeepsakeConfig::load()?;

    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run => run(&config).await?,
        Command::Record {
            content,
            tier,
            importance,
            mood,
            topic_tags,
            ambient_tags,
            decay_rate,
        } => {
            cli::record(
                &config,
                &content,
                tier,
                importance,
                mood,
                &topic_tags,
                &ambient_tags,
                decay_rate,
            )
            .await?;
        }
        Command::Recall {
            mood,
            query_tags,
            max_results,
        } => cli::recall(&config, &mood, &query_tags, max_results).await?,
        Command::Rewrite { id, content } => cli::rewrite(&config, &id, &content).await?,
        Command::Sweep => cli::sweep(&config)?,
        Command::Migrate => cli::migrate(&config)?,
        Command::Stats => cli::stats(&config)?,
    }

    Ok(())
}

/// Start the scheduler and a journaled facade, then wait for ctrl-c.
async fn run(config: &KeepsakeConfig) -> Result<()> {
    let tiers = TierSet::open(config)?;
    tracing::info!(dir = %config.resolved_data_dir().display(), "tiers ready");

    let facade = RetrievalFacade::with_journals(
        tiers.clone(),
        Arc::new(NullIndexer),
        config.maintenance.archive_threshold,
        config.retrieval.journal_depth,
    );

    let scheduler = MaintenanceScheduler::spawn(
        tiers,
        SchedulerSettings {
            heartbeat: config.heartbeat(),
            migration_every: config.migration_interval(),
            archive_threshold: config.maintenance.archive_threshold,
        },
    );
    tracing::info!("keepsake running — ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    scheduler.stop().await;
    facade.shutdown().await;
    Ok(())
}
