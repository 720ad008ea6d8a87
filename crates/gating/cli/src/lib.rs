//! tag-gating CLI
//!
//! Runs the visibility policy against a JSON fixture so operators can see
//! what a given viewer gets on each surface, and audit that every surface
//! agrees.

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::{audit, surfaces, Target};
pub use error::{CliError, CliResult};
use tag_gating_engine::GatingConfigStore;

#[derive(Parser)]
#[command(name = "tag-gating")]
#[command(about = "Inspect and audit tag-gated content visibility", long_about = None)]
#[command(version)]
struct Cli {
    /// Gating configuration (TOML). Gating is disabled without one.
    #[arg(short, long, env = "TAG_GATING_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct FixtureArgs {
    /// Fixture with users, topics and posts (JSON)
    #[arg(short, long)]
    fixture: PathBuf,

    /// Viewer user id; anonymous when omitted
    #[arg(long)]
    viewer: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration snapshot
    Config,

    /// Direct access check for one topic
    Check {
        #[command(flatten)]
        fixture: FixtureArgs,

        /// Topic id
        #[arg(long)]
        topic: i64,
    },

    /// Run a post or topic listing
    List {
        #[command(flatten)]
        fixture: FixtureArgs,

        #[arg(long, value_enum, default_value = "topics")]
        relation: surfaces::RelationArg,

        #[arg(long)]
        category: Option<i64>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Filter a search result set of topic ids
    Search {
        #[command(flatten)]
        fixture: FixtureArgs,

        /// Comma-separated topic ids, in result order
        #[arg(long, value_delimiter = ',')]
        topics: Vec<i64>,
    },

    /// Filter a featured listing built from every fixture topic
    Featured {
        #[command(flatten)]
        fixture: FixtureArgs,
    },

    /// Evaluate every topic on every surface and report disagreements
    Audit {
        #[command(flatten)]
        fixture: FixtureArgs,
    },
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let filter = if cli.verbose { "debug" } else { "info" };
    // A subscriber may already be installed when run in-process.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .try_init();

    let config = Arc::new(match cli.config.as_deref() {
        Some(path) => GatingConfigStore::load(path)?,
        None => GatingConfigStore::default(),
    });

    match cli.command {
        Commands::Config => surfaces::show_config(&config),
        Commands::Check { fixture, topic } => {
            let target = Target::load(config, &fixture.fixture, fixture.viewer).await?;
            surfaces::check(&target, topic).await
        }
        Commands::List {
            fixture,
            relation,
            category,
            offset,
            limit,
        } => {
            let target = Target::load(config, &fixture.fixture, fixture.viewer).await?;
            surfaces::list(&target, relation, category, offset, limit).await
        }
        Commands::Search { fixture, topics } => {
            let target = Target::load(config, &fixture.fixture, fixture.viewer).await?;
            surfaces::search(&target, &topics).await
        }
        Commands::Featured { fixture } => {
            let target = Target::load(config, &fixture.fixture, fixture.viewer).await?;
            surfaces::featured(&target).await
        }
        Commands::Audit { fixture } => {
            let target = Target::load(config, &fixture.fixture, fixture.viewer).await?;
            audit::execute(&target).await
        }
    }
}

