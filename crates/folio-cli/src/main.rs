//! Folio CLI
//!
//! Command-line interface for Folio - block-based documents stored locally.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use folio_core::{Config, DocumentStore, FileStore};

mod commands;
mod editor;
mod output;

use commands::block::ContentArgs;
use commands::table::TableOp;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio - Block-based documents, stored locally")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List documents, most recently updated first
    #[command(alias = "ls")]
    List,
    /// Create a new document
    New {
        /// Document title
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Show a document and its blocks
    Show {
        /// Document ID (full or prefix)
        id: String,
    },
    /// Rename a document
    Rename {
        /// Document ID (full or prefix)
        id: String,
        /// New title
        title: String,
    },
    /// Delete a document
    #[command(alias = "rm")]
    Delete {
        /// Document ID (full or prefix)
        id: String,
    },
    /// Append blocks to a document from stdin, autosaving as you go
    Write {
        /// Document ID (full or prefix)
        id: String,
    },
    /// Manage blocks in a document
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },
    /// Edit table blocks
    Table {
        #[command(subcommand)]
        command: TableCommands,
    },
    /// Export all documents as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import documents from a JSON export
    Import {
        /// Export file to read
        file: PathBuf,
    },
    /// Show storage usage
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(clap::Args)]
struct ContentOpts {
    /// Block text (lines become list items)
    #[arg(long)]
    text: Option<String>,
    /// Heading level (1-6)
    #[arg(long)]
    level: Option<u8>,
    /// Full content as JSON
    #[arg(long = "content")]
    content: Option<String>,
}

impl From<ContentOpts> for ContentArgs {
    fn from(opts: ContentOpts) -> Self {
        ContentArgs {
            text: opts.text,
            level: opts.level,
            json: opts.content,
        }
    }
}

#[derive(Subcommand)]
enum BlockCommands {
    /// Add a block
    Add {
        /// Document ID (full or prefix)
        doc: String,
        /// Block type (heading, paragraph, table, list, image, divider, code, quote, toc)
        block_type: String,
        #[command(flatten)]
        content: ContentOpts,
        /// Insert at this position instead of appending
        #[arg(long)]
        at: Option<usize>,
    },
    /// Replace a block's content
    Update {
        /// Document ID (full or prefix)
        doc: String,
        /// Block ID (full or prefix)
        block: String,
        /// New block type, with --content
        #[arg(long = "type")]
        block_type: Option<String>,
        #[command(flatten)]
        content: ContentOpts,
        /// Edit the block text in $EDITOR
        #[arg(short, long)]
        edit: bool,
    },
    /// Remove a block
    #[command(alias = "rm")]
    Remove {
        /// Document ID (full or prefix)
        doc: String,
        /// Block ID (full or prefix)
        block: String,
    },
    /// Move a block to another position
    #[command(alias = "mv")]
    Move {
        /// Document ID (full or prefix)
        doc: String,
        /// Current position
        from: usize,
        /// New position
        to: usize,
    },
}

#[derive(Subcommand)]
enum TableCommands {
    /// Append a column
    AddColumn {
        doc: String,
        block: String,
        /// Column name
        #[arg(short, long)]
        name: Option<String>,
        /// Column type (text, number, currency, date, percentage)
        #[arg(short = 't', long = "type", default_value = "text")]
        column_type: String,
    },
    /// Delete a column
    DeleteColumn {
        doc: String,
        block: String,
        /// Column ID (full or prefix)
        column: String,
    },
    /// Append a row
    AddRow { doc: String, block: String },
    /// Delete a row
    DeleteRow {
        doc: String,
        block: String,
        row: usize,
    },
    /// Set a cell value (true/false, numbers and null are typed)
    Set {
        doc: String,
        block: String,
        row: usize,
        /// Column ID (full or prefix)
        column: String,
        value: String,
    },
    /// Set a cell formula, e.g. "=SUM(col-...)"; an empty formula clears it
    Formula {
        doc: String,
        block: String,
        row: usize,
        /// Column ID (full or prefix)
        column: String,
        formula: String,
    },
    /// Indent a row under the row above
    Indent {
        doc: String,
        block: String,
        row: usize,
    },
    /// Outdent a row
    Outdent {
        doc: String,
        block: String,
        row: usize,
    },
    /// Collapse or expand a row
    Collapse {
        doc: String,
        block: String,
        row: usize,
    },
}

impl TableCommands {
    fn into_parts(self) -> (String, String, TableOp) {
        match self {
            TableCommands::AddColumn {
                doc,
                block,
                name,
                column_type,
            } => (doc, block, TableOp::AddColumn { name, column_type }),
            TableCommands::DeleteColumn { doc, block, column } => {
                (doc, block, TableOp::DeleteColumn { column })
            }
            TableCommands::AddRow { doc, block } => (doc, block, TableOp::AddRow),
            TableCommands::DeleteRow { doc, block, row } => {
                (doc, block, TableOp::DeleteRow { row })
            }
            TableCommands::Set {
                doc,
                block,
                row,
                column,
                value,
            } => (doc, block, TableOp::Set { row, column, value }),
            TableCommands::Formula {
                doc,
                block,
                row,
                column,
                formula,
            } => (
                doc,
                block,
                TableOp::Formula {
                    row,
                    column,
                    formula,
                },
            ),
            TableCommands::Indent { doc, block, row } => (doc, block, TableOp::Indent { row }),
            TableCommands::Outdent { doc, block, row } => (doc, block, TableOp::Outdent { row }),
            TableCommands::Collapse { doc, block, row } => {
                (doc, block, TableOp::Collapse { row })
            }
        }
    }
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, autosave_interval_secs, storage_quota_bytes, log_level)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work even when the config file is broken
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let mut store = DocumentStore::open_with_config(&config);
    debug!("Using document storage at {:?}", config.documents_dir());

    run(cli.command, &mut store, &config, &output).await
}

async fn run(
    command: Commands,
    store: &mut DocumentStore<FileStore>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::List => commands::document::list(store, output),
        Commands::New { title } => commands::document::create(store, title, output),
        Commands::Show { id } => commands::document::show(store, id, output),
        Commands::Rename { id, title } => commands::document::rename(store, id, title, output),
        Commands::Delete { id } => commands::document::delete(store, id, output),
        Commands::Write { id } => commands::write::run(store, config, id, output).await,
        Commands::Block { command } => handle_block_command(command, store, output),
        Commands::Table { command } => {
            let (doc, block, op) = command.into_parts();
            commands::table::run(store, doc, block, op, output)
        }
        Commands::Export { output: path } => commands::transfer::export(store, path, output),
        Commands::Import { file } => commands::transfer::import(store, file, output),
        Commands::Status => commands::status::show(store, config, output),
        Commands::Config { .. } => unreachable!(), // Handled in main
    }
}

fn handle_block_command(
    command: BlockCommands,
    store: &mut DocumentStore<FileStore>,
    output: &Output,
) -> Result<()> {
    match command {
        BlockCommands::Add {
            doc,
            block_type,
            content,
            at,
        } => commands::block::add(store, doc, block_type, content.into(), at, output),
        BlockCommands::Update {
            doc,
            block,
            block_type,
            content,
            edit,
        } => commands::block::update(store, doc, block, block_type, content.into(), edit, output),
        BlockCommands::Remove { doc, block } => commands::block::remove(store, doc, block, output),
        BlockCommands::Move { doc, from, to } => {
            commands::block::move_block(store, doc, from, to, output)
        }
    }
}

/// Initialize logging to stderr
///
/// The level comes from config (`log_level`, or `FOLIO_LOG_LEVEL`).
fn init_logging(config: &Config) {
    let level = &config.log_level;
    let env_filter = EnvFilter::new(format!("folio_core={},folio_cli={}", level, level));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
