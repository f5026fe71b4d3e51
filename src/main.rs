//! # Knowledge Harness CLI (`kh`)
//!
//! ## Usage
//!
//! ```bash
//! kh --config ./config/kh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kh init` | Create the wiki database schema |
//! | `kh sources` | List registered sources and their health |
//! | `kh ask "<query>"` | Run a query through every source |
//! | `kh top <field>` | Rank players straight from the live roster |
//! | `kh serve` | Start the JSON HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! kh init
//! kh ask "cuanta vida tiene un guerrero enano nivel 30"
//! kh ask "cuantos npcs mato Juan" --json
//! kh top npcsmuertes --class mago --faction criminal --limit 5
//! RUST_LOG=debug kh serve
//! ```
//!
//! Logs go to stderr, so `kh ask --json` output can be piped.

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use knowledge_harness::aggregate::Aggregator;
use knowledge_harness::config;
use knowledge_harness::migrate;
use knowledge_harness::ranking::{codes, RankField, RankingService, TopFilters};
use knowledge_harness::server;
use knowledge_harness::sources;
use knowledge_harness::unanswered;

/// Knowledge Harness: federated retrieval over a game wiki, lore notes,
/// a health calculator, and live player rankings.
#[derive(Parser)]
#[command(name = "kh", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the wiki table. Safe to run repeatedly.
    Init,

    /// List registered sources and whether they can answer right now.
    Sources,

    /// Retrieve context fragments for a question.
    ///
    /// Queries with no fragments are appended to the unanswered log when
    /// `[unanswered]` is configured.
    Ask {
        query: String,

        /// Print the fragments as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Rank players by a roster field.
    ///
    /// Fields: nivel, kills, murio, npcsmuertes, retosGanados.
    Top {
        field: RankField,

        /// Class name (e.g. mago, paladin).
        #[arg(long)]
        class: Option<String>,

        /// Race name (e.g. enano, "elfo oscuro").
        #[arg(long)]
        race: Option<String>,

        /// Faction name (ciudadano, criminal, neutro).
        #[arg(long)]
        faction: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Start the HTTP API.
    ///
    /// Loads the off-game corpus first; a failure there aborts startup.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg.wiki.db_path).await?;
            println!("Wiki database initialized at {}.", cfg.wiki.db_path.display());
        }
        Commands::Sources => {
            let aggregator = Aggregator::from_config(&cfg)?;
            sources::list_sources(aggregator.registry()).await?;
        }
        Commands::Ask { query, json } => {
            let aggregator = Aggregator::from_config(&cfg)?;
            let fragments = aggregator.retrieve_all(&query).await;

            if fragments.is_empty() {
                if let Some(log) = &cfg.unanswered {
                    unanswered::record(&log.path, &query).await?;
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&fragments)?);
            } else if fragments.is_empty() {
                println!("No fragments.");
            } else {
                for (i, f) in fragments.iter().enumerate() {
                    let title = f.metadata.title.as_deref().unwrap_or("-");
                    println!("{}. [{}] {:.2} {}", i + 1, f.metadata.source, f.score, title);
                    println!("   {}", f.text.replace('\n', "\n   "));
                }
            }
        }
        Commands::Top {
            field,
            class,
            race,
            faction,
            limit,
        } => {
            let Some(ranking) = &cfg.ranking else {
                bail!("[ranking] is not configured in {}", cli.config.display());
            };
            let service = RankingService::from_config(ranking)?;
            let filters = TopFilters {
                class,
                race,
                faction,
                limit,
            };

            for (i, p) in service.get_top_by(field, &filters).await?.iter().enumerate() {
                let class = p.class.and_then(codes::class_name).unwrap_or("?");
                let race = p.race.and_then(codes::race_name).unwrap_or("?");
                let faction = p.faction.and_then(codes::faction_name).unwrap_or("?");
                println!(
                    "{:>3}. {:<20} {:>8}  {} / {} / {}",
                    i + 1,
                    p.name,
                    field.value(p),
                    class,
                    race,
                    faction
                );
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
