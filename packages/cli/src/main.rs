#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tool for comparing staffing roster documents.
//!
//! Reads two or more roster documents (PDF or plain text), extracts the
//! positions listed in each, orders them by the date printed in the
//! document and reports how every position changed between consecutive
//! versions. Compared documents can be saved as named revisions in a
//! Cloudflare R2 bucket and reopened later.
//!
//! Uses `indicatif-log-bridge` (via [`roster_diff_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use roster_diff_compare_models::{ComparisonFilter, Situation};
use roster_diff_extract::ExtractionConfig;
use roster_diff_roster_models::{FundingStatus, OccupationStatus, Province};
use roster_diff_store::ConfiguredStore;

use crate::commands::{Context, OutputOptions};

#[derive(Parser)]
#[command(name = "roster_diff", about = "Compare staffing roster documents over time")]
struct Cli {
    /// TOML file overriding the extraction settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two or more roster documents, oldest to newest by their
    /// printed date
    Compare {
        /// Documents to compare (PDF or plain text)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Save the documents as a named revision after comparing
        #[arg(long)]
        save_revision: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the positions extracted from a single document
    Extract {
        /// Document to read (PDF or plain text)
        file: PathBuf,
        /// Print records as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Also write the records to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Manage saved revisions
    Revisions {
        #[command(subcommand)]
        command: RevisionCommands,
    },
}

#[derive(Subcommand)]
enum RevisionCommands {
    /// List saved revisions, newest first
    List,
    /// Download a revision and compare its documents
    Open {
        /// Revision name
        name: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a revision and its documents
    Delete {
        /// Revision name
        name: String,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Only positions in this province (repeatable, e.g. "Sevilla", "SS.CC.")
    #[arg(long, value_parser = parse_province)]
    province: Vec<Province>,
    /// Only positions with this grade (repeatable, e.g. "A1")
    #[arg(long)]
    grade: Vec<String>,
    /// Only positions with this funding status (`FUNDED` or `UNFUNDED`)
    #[arg(long)]
    funding: Vec<FundingStatus>,
    /// Only positions with this occupation status (`OCCUPIED` or `VACANT`)
    #[arg(long)]
    status: Vec<OccupationStatus>,
    /// Only rows with this situation (e.g. `NEW`, `OCCUPANT_CHANGED`)
    #[arg(long)]
    situation: Vec<Situation>,
}

impl From<FilterArgs> for ComparisonFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            provinces: args.province.into_iter().collect(),
            grades: args.grade.into_iter().map(|g| g.to_uppercase()).collect(),
            funding: args.funding.into_iter().collect(),
            status: args.status.into_iter().collect(),
            situations: args.situation.into_iter().collect(),
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Print the comparison as JSON instead of tables
    #[arg(long)]
    json: bool,
    /// Write one CSV file per compared pair into this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,
    #[command(flatten)]
    filter: FilterArgs,
}

impl From<OutputArgs> for OutputOptions {
    fn from(args: OutputArgs) -> Self {
        Self {
            filter: args.filter.into(),
            csv_dir: args.csv_dir,
            json: args.json,
        }
    }
}

fn parse_province(s: &str) -> Result<Province, String> {
    Province::from_name(s).ok_or_else(|| format!("unknown province '{s}'"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = roster_diff_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ExtractionConfig::load(path)?,
        None => ExtractionConfig::default(),
    };
    let ctx = Context {
        config,
        multi,
        store: ConfiguredStore::from_env_or_memory(),
    };

    let Some(command) = cli.command else {
        println!("Roster Diff");
        println!();
        return interactive::run(&ctx).await;
    };

    match command {
        Commands::Compare {
            files,
            save_revision,
            output,
        } => {
            commands::compare_files(&ctx, &files, save_revision.as_deref(), &output.into())
                .await?;
        }
        Commands::Extract {
            file,
            json,
            csv,
            filter,
        } => {
            commands::extract_file(&ctx, &file, &filter.into(), json, csv.as_deref())?;
        }
        Commands::Revisions { command } => match command {
            RevisionCommands::List => commands::list_revisions(&ctx).await?,
            RevisionCommands::Open { name, output } => {
                commands::open_revision(&ctx, &name, &output.into()).await?;
            }
            RevisionCommands::Delete { name } => commands::delete_revision(&ctx, &name).await?,
        },
    }

    Ok(())
}
