//! proficio CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "proficio",
    version,
    about = "Competency progress and evidence engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a course dataset TOML file
    Validate {
        /// Path to the dataset file
        #[arg(long)]
        dataset: PathBuf,
    },

    /// Print the competency forest for a course
    Forest {
        /// Path to the dataset file
        #[arg(long)]
        dataset: PathBuf,

        /// Course id
        #[arg(long)]
        course: u64,

        /// User id to act as
        #[arg(long = "as")]
        acting_user: u64,

        /// Output format: markdown, json
        #[arg(long, default_value = "markdown")]
        format: String,
    },

    /// Build an evidence report for a student on one competency
    Report {
        /// Path to the dataset file
        #[arg(long)]
        dataset: PathBuf,

        /// Student user id
        #[arg(long)]
        user: u64,

        /// Competency id
        #[arg(long)]
        competency: u64,

        /// Course id
        #[arg(long)]
        course: u64,

        /// User id to act as
        #[arg(long = "as")]
        acting_user: u64,

        /// Output format: markdown, json, html
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Submit a rating and persist it back into the dataset
    Rate {
        /// Path to the dataset file
        #[arg(long)]
        dataset: PathBuf,

        /// Student user id
        #[arg(long)]
        user: u64,

        /// Competency id
        #[arg(long)]
        competency: u64,

        /// Course id
        #[arg(long)]
        course: u64,

        /// 1-based grade on the framework's scale
        #[arg(long)]
        grade: u32,

        /// Optional note to attach to the evidence log
        #[arg(long)]
        comment: Option<String>,

        /// Rater user id (must hold the rating capability)
        #[arg(long = "as")]
        acting_user: u64,
    },

    /// Print a roster-wide status table for a course
    Overview {
        /// Path to the dataset file
        #[arg(long)]
        dataset: PathBuf,

        /// Course id
        #[arg(long)]
        course: u64,

        /// User id to act as
        #[arg(long = "as")]
        acting_user: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("proficio=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { dataset } => commands::validate::execute(dataset),
        Commands::Forest {
            dataset,
            course,
            acting_user,
            format,
        } => commands::forest::execute(dataset, course, acting_user, format),
        Commands::Report {
            dataset,
            user,
            competency,
            course,
            acting_user,
            format,
            output,
        } => {
            commands::report::execute(dataset, user, competency, course, acting_user, format, output)
                .await
        }
        Commands::Rate {
            dataset,
            user,
            competency,
            course,
            grade,
            comment,
            acting_user,
        } => commands::rate::execute(dataset, user, competency, course, grade, comment, acting_user),
        Commands::Overview {
            dataset,
            course,
            acting_user,
        } => commands::overview::execute(dataset, course, acting_user),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
