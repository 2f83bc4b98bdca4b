//! # First Signal CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show counters and rolling metrics
//! - `log` - Record a decision and its outcome
//! - `nodes` - List nodes, or show one with `--id`
//! - `patterns` - Show emergent patterns
//! - `snapshot` - Print or write a JSON snapshot
//! - `export` - Export the state to a file
//! - `import` - Replace the state from an exported file
//! - `init` - Initialize a new database
//! - `hash` - Compute the BLAKE3 hash of the state

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand, ValueEnum};
use signal_core::{NodeKind, SignalError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// First Signal - decision log and cognitive state engine
///
/// Records decisions with their outcomes, links them causally and tracks
/// how well they are working out.
#[derive(Parser, Debug)]
#[command(name = "first-signal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the database
    #[arg(short = 'D', long, global = true, default_value = "first-signal.db")]
    pub database: PathBuf,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum, default_value_t = Backend::Redb)]
    pub backend: Backend,

    /// TOML configuration file ([engine] and [server] sections)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Owner of a newly created log
    #[arg(short, long, global = true, default_value = "local")]
    pub user: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the log is kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Binary state file, rewritten after each change
    File,
    /// redb database, journaled per insertion
    Redb,
}

impl Backend {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::File => "file",
            Backend::Redb => "redb",
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (default from config, then 127.0.0.1)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (default from config, then 8080)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show counters and rolling metrics
    Status,

    /// Record a decision and its outcome
    Log {
        /// What was decided
        #[arg(short, long)]
        decision: String,

        /// What happened
        #[arg(short, long)]
        outcome: String,

        /// success, failure, insight or delusion
        #[arg(short, long, value_parser = parse_kind)]
        kind: NodeKind,
    },

    /// List nodes, oldest first
    Nodes {
        /// Show a single node with its world-model entry
        #[arg(long)]
        id: Option<String>,

        /// Only nodes of this kind
        #[arg(short, long)]
        kind: Option<String>,

        /// Only the latest N matches
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show emergent patterns, strongest first
    Patterns {
        /// Only the first N patterns
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },

    /// Print a JSON snapshot, or write it to a file
    Snapshot {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the state to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (binary, json)
        #[arg(short = 't', long, default_value = "binary")]
        format: String,
    },

    /// Replace the state from a binary or JSON export
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Compute BLAKE3 cryptographic hash of the state
    Hash,
}

fn parse_kind(s: &str) -> Result<NodeKind, SignalError> {
    s.parse()
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SignalError> {
    let app_config = AppConfig::load(cli.config.as_deref())?;
    let store = Store {
        path: cli.database,
        backend: cli.backend,
        user: cli.user,
        engine: app_config.engine,
    };
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let host = host.unwrap_or(app_config.server.host);
            let port = port.unwrap_or(app_config.server.port);
            cmd_server(&store, &host, port).await
        }
        Some(Commands::Status) => cmd_status(&store, json_mode),
        Some(Commands::Log {
            decision,
            outcome,
            kind,
        }) => cmd_log(&store, json_mode, &decision, &outcome, kind),
        Some(Commands::Nodes { id, kind, limit }) => match id {
            Some(id) => cmd_node(&store, json_mode, cli.verbose, &id),
            None => cmd_nodes(&store, json_mode, cli.verbose, kind, limit),
        },
        Some(Commands::Patterns { top }) => cmd_patterns(&store, json_mode, top),
        Some(Commands::Snapshot { output }) => cmd_snapshot(&store, output.as_deref()),
        Some(Commands::Export { output, format }) => cmd_export(&store, &output, &format),
        Some(Commands::Import { input }) => cmd_import(&store, &input),
        Some(Commands::Init { force }) => cmd_init(&store, force),
        Some(Commands::Hash) => cmd_hash(&store, json_mode),
        None => cmd_status(&store, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
