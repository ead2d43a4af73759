//! Vellum operator CLI.
//!
//! Runs embargo and authorization operations against a JSON repository
//! snapshot (content graph, groups and policies).
//!
//! # Quick Start
//!
//! ```bash
//! # Which READ grants would leak through an embargo on item 3?
//! vellum check repo.json --item 3
//!
//! # Embargo it until 2030 as a system administrator, saving the result
//! vellum set repo.json --item 3 --terms 2030-01-01 --admin --write
//!
//! # May e-person 7 withdraw it?
//! vellum authorize repo.json withdraw-item item:3 --user 7
//! ```

mod commands;
mod snapshot;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Vellum - hierarchical access policies and embargoes for repository content.
#[derive(Parser)]
#[command(name = "vellum")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding vellum.toml and vellum.local.toml.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Read configuration from this file only, ignoring every other source.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report READ grants that bypass an item's embargo.
    Check {
        /// Repository snapshot (JSON).
        snapshot: PathBuf,

        /// Item ID.
        #[arg(short, long)]
        item: u64,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Embargo an item until the date given by its terms.
    Set {
        /// Repository snapshot (JSON).
        snapshot: PathBuf,

        /// Item ID.
        #[arg(short, long)]
        item: u64,

        /// Embargo terms: a date (yyyy, yyyy-mm, yyyy-mm-dd) or the open-ended token.
        #[arg(short, long)]
        terms: String,

        #[command(flatten)]
        actor: ActorArgs,

        /// Save the resulting policies back into the snapshot.
        #[arg(long)]
        write: bool,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Lift an item's embargo, restoring the collection's default read access.
    Lift {
        /// Repository snapshot (JSON).
        snapshot: PathBuf,

        /// Item ID.
        #[arg(short, long)]
        item: u64,

        #[command(flatten)]
        actor: ActorArgs,

        /// Save the resulting policies back into the snapshot.
        #[arg(long)]
        write: bool,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Decide one administrative operation.
    Authorize {
        /// Repository snapshot (JSON).
        snapshot: PathBuf,

        /// Operation name, e.g. manage-item-policy or withdraw-item.
        operation: String,

        /// Target object as type:id (item:3), or a policy ID for manage-policy.
        /// Not needed for require-admin-role.
        target: Option<String>,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Show the effective configuration.
    Config {
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

/// Who the request runs as.
#[derive(Args, Clone, Debug)]
pub struct ActorArgs {
    /// E-person ID of the acting user (anonymous when omitted).
    #[arg(short, long)]
    pub user: Option<u64>,

    /// Extra group memberships carried by the request.
    #[arg(long = "special-group", value_name = "GROUP")]
    pub special_groups: Vec<u64>,

    /// Skip authorization checks (trusted batch work).
    #[arg(long)]
    pub admin: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::config::load(&cli.project, cli.config.as_deref())?;

    match cli.command {
        Commands::Check {
            snapshot,
            item,
            format,
        } => commands::embargo::check(&config, &snapshot, item, format),
        Commands::Set {
            snapshot,
            item,
            terms,
            actor,
            write,
            format,
        } => commands::embargo::set(&config, &snapshot, item, &terms, &actor, write, format),
        Commands::Lift {
            snapshot,
            item,
            actor,
            write,
            format,
        } => commands::embargo::lift(&config, &snapshot, item, &actor, write, format),
        Commands::Authorize {
            snapshot,
            operation,
            target,
            actor,
        } => commands::authorize::run(&config, &snapshot, &operation, target.as_deref(), &actor),
        Commands::Config { format } => commands::config::show(&config, format),
    }
}
