//! # Lexibank CLI Module
//!
//! This module implements the CLI interface for Lexibank.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show banks and storage layout
//! - `init` - Initialize new database
//! - `bank` - Create, list, rename, delete or reset banks
//! - `add` / `import` / `words` / `edit` / `remove` - Manage words
//! - `review` - Record recall results
//! - `stages` / `grid` / `due` - Inspect review state
//! - `course` - Create, list, plan or delete courses
//! - `export` / `restore` - Snapshot the whole database
//! - `hash` - Compute BLAKE3 cryptographic hash of the snapshot

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use lexibank_core::LexiError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Lexibank - vocabulary banks with stage-based review
#[derive(Parser, Debug)]
#[command(name = "lexibank")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the config file (default: ./lexibank.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "file" (snapshot file)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show banks and storage layout
    Status,

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Manage word banks
    Bank {
        #[command(subcommand)]
        action: BankCommand,
    },

    /// Add a single word to a bank
    Add {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,

        /// The word or phrase being learned
        term: String,

        /// Its meaning
        meaning: String,
    },

    /// Import words from a file
    Import {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,

        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,

        /// Input format (json, text)
        #[arg(short = 't', long, default_value = "text")]
        format: String,
    },

    /// List the words of a bank
    Words {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,
    },

    /// Change a word's term or meaning
    Edit {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,

        /// Word ID
        #[arg(short, long)]
        word: u64,

        /// New term
        #[arg(long)]
        term: Option<String>,

        /// New meaning
        #[arg(long)]
        meaning: Option<String>,
    },

    /// Remove words from a bank
    Remove {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,

        /// Word IDs (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        words: Vec<u64>,
    },

    /// Record recall results
    Review {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,

        /// Review mode (grid, anti-forgetting)
        #[arg(short = 'm', long, default_value = "grid")]
        mode: String,

        /// Word IDs recalled correctly (comma-separated)
        #[arg(long, value_delimiter = ',')]
        correct: Vec<u64>,

        /// Word IDs missed (comma-separated)
        #[arg(long, value_delimiter = ',')]
        incorrect: Vec<u64>,

        /// Day index to record (default: today)
        #[arg(long)]
        day: Option<u32>,
    },

    /// Show the per-stage word counts of a bank
    Stages {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,
    },

    /// Show a bank as a review grid
    Grid {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,

        /// Cells per row (overrides the config file)
        #[arg(long)]
        columns: Option<usize>,

        /// Only words at this stage
        #[arg(short, long)]
        stage: Option<u8>,

        /// Include mastered words
        #[arg(short, long)]
        all: bool,
    },

    /// List words due for anti-forgetting review
    Due {
        /// Bank ID
        #[arg(short, long)]
        bank: u64,

        /// Day index to check (default: today)
        #[arg(long)]
        day: Option<u32>,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommand,
    },

    /// Export the whole database as a snapshot
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (snapshot, json)
        #[arg(short = 't', long, default_value = "snapshot")]
        format: String,
    },

    /// Replace the whole database with a snapshot
    Restore {
        /// Input file path (snapshot or json)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute BLAKE3 cryptographic hash of the snapshot
    Hash,
}

/// `bank` subcommands.
#[derive(Subcommand, Debug)]
pub enum BankCommand {
    /// Create a bank
    Create { name: String },
    /// List banks
    List,
    /// Rename a bank
    Rename { id: u64, name: String },
    /// Delete a bank, its words and its courses
    Delete { id: u64 },
    /// Send every word of a bank back to stage 1
    Reset { id: u64 },
}

/// `course` subcommands.
#[derive(Subcommand, Debug)]
pub enum CourseCommand {
    /// Create a course over a bank
    Create {
        /// Course name
        name: String,

        /// Bank ID
        #[arg(short, long)]
        bank: u64,

        /// New words per day
        #[arg(short = 'n', long, default_value = "20")]
        daily_new: u32,

        /// First study day index (default: today)
        #[arg(long)]
        start: Option<u32>,
    },
    /// List courses
    List,
    /// Show a course schedule, or one day of it
    Plan {
        /// Course ID
        id: u64,

        /// Only this day index
        #[arg(long)]
        day: Option<u32>,
    },
    /// Delete a course
    Delete { id: u64 },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LexiError> {
    let config = AppConfig::load(cli.config.as_deref())?
        .with_overrides(cli.database.clone(), cli.backend.clone())?;
    let json_mode = cli.json_mode;
    let storage = &config.storage;

    if cli.verbose {
        tracing::info!(
            database = %storage.database.display(),
            backend = %storage.backend,
            chunk_size = storage.chunk_size,
            "resolved configuration"
        );
    }

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            cmd_server(&config, &host, port).await
        }
        Some(Commands::Status) | None => cmd_status(storage, json_mode),
        Some(Commands::Init { force }) => cmd_init(storage, force),
        Some(Commands::Bank { action }) => cmd_bank(storage, json_mode, action),
        Some(Commands::Add {
            bank,
            term,
            meaning,
        }) => cmd_add(storage, json_mode, bank, &term, &meaning),
        Some(Commands::Import { bank, file, format }) => {
            cmd_import(storage, json_mode, bank, &file, &format)
        }
        Some(Commands::Words { bank }) => cmd_words(storage, json_mode, bank),
        Some(Commands::Edit {
            bank,
            word,
            term,
            meaning,
        }) => cmd_edit(
            storage,
            json_mode,
            bank,
            word,
            term.as_deref(),
            meaning.as_deref(),
        ),
        Some(Commands::Remove { bank, words }) => cmd_remove(storage, json_mode, bank, &words),
        Some(Commands::Review {
            bank,
            mode,
            correct,
            incorrect,
            day,
        }) => cmd_review(
            storage, json_mode, bank, &mode, &correct, &incorrect, day,
        ),
        Some(Commands::Stages { bank }) => cmd_stages(storage, json_mode, bank),
        Some(Commands::Grid {
            bank,
            columns,
            stage,
            all,
        }) => cmd_grid(
            storage,
            json_mode,
            bank,
            columns.unwrap_or(config.review.grid_columns),
            stage,
            all,
        ),
        Some(Commands::Due { bank, day }) => cmd_due(storage, json_mode, bank, day),
        Some(Commands::Course { action }) => cmd_course(storage, json_mode, action),
        Some(Commands::Export { output, format }) => cmd_export(storage, &output, &format),
        Some(Commands::Restore { input }) => cmd_restore(storage, &input),
        Some(Commands::Hash) => cmd_hash(storage, json_mode),
    }
}
