use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::commands::config::ConfigOptions;
use crate::commands::start::StartOptions;
use crate::commands::sync::{SyncDirection, SyncOptions};
use crate::error::MultiError;

#[derive(Parser)]
#[command(
    name = "claude-multi",
    version,
    about = "Multi-session memory sharing for Claude Code"
)]
struct Cli {
    /// Print the command report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config document, shared pool and default templates
    Init,

    /// Start a Claude Code session with shared memory
    Start {
        /// Project directory
        #[arg(default_value = ".")]
        project_path: PathBuf,

        /// Session name (defaults to the project directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Additional CLAUDE.md files to inject (repeatable)
        #[arg(short, long = "instructions")]
        instructions: Vec<String>,
    },

    /// Manually sync memory for a project
    Sync {
        /// Project directory
        #[arg(default_value = ".")]
        project_path: PathBuf,

        /// Sync direction
        #[arg(short, long, value_enum, default_value_t = SyncDirection::Both)]
        direction: SyncDirection,
    },

    /// List tracked sessions and their backups
    Sessions,

    /// Show the shared memory pool
    Status,

    /// View or modify configuration
    Config {
        /// Configuration key to view or set
        #[arg(short, long)]
        key: Option<String>,

        /// Value to set for --key
        #[arg(short, long, requires = "key")]
        value: Option<String>,

        /// Add a CLAUDE.md file to the default instruction files
        #[arg(short, long, conflicts_with_all = ["key", "remove_instructions"])]
        add_instructions: Option<String>,

        /// Remove a CLAUDE.md file from the default instruction files
        #[arg(short, long, conflicts_with = "key")]
        remove_instructions: Option<String>,
    },
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let state = if report.ok { "ok" } else { "failed" };
    println!("{}: {state}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    if !report.issues.is_empty() {
        println!("issues:");
        for issue in &report.issues {
            println!("  - {issue}");
        }
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Init => commands::init::run()?,
        Commands::Start {
            project_path,
            name,
            instructions,
        } => commands::start::run(&StartOptions {
            project_path,
            name,
            instructions,
        })?,
        Commands::Sync {
            project_path,
            direction,
        } => commands::sync::run(&SyncOptions {
            project_path,
            direction,
        })?,
        Commands::Sessions => commands::sessions::run()?,
        Commands::Status => commands::status::run()?,
        Commands::Config {
            key,
            value,
            add_instructions,
            remove_instructions,
        } => commands::config::run(&ConfigOptions {
            key,
            value,
            add_instructions,
            remove_instructions,
        })?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        return Err(MultiError::CommandFailed {
            command: report.command,
            issues: report.issues.len(),
        }
        .into());
    }
    Ok(())
}
