//! sqlrank CLI - compile relevance searches and run them against SQLite.
//!
//! `compile` prints the SQL and bindings a search produces for the engine
//! named in the configuration file. `search` introspects a SQLite database,
//! executes the search and prints the ranked rows as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use sqlrank::{
    fetch_ranked, Dialect, SchemaSource, SearchConfig, SearchOptions, Searchable, SelectQuery,
    TableSchema,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sqlrank")]
#[command(about = "Relevance-ranked full-text search for SQL tables", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SQL and bindings of a search
    Compile {
        #[command(flatten)]
        search: SearchArgs,

        /// Rewrite placeholders as $1, $2, ...
        #[arg(long)]
        numbered: bool,
    },

    /// Run a search against a SQLite database
    Search {
        #[command(flatten)]
        search: SearchArgs,

        /// SQLite database file
        #[arg(long)]
        db: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    /// JSON file describing the searchable table
    #[arg(short, long)]
    config: PathBuf,

    /// Free-text search query
    #[arg(short, long)]
    query: String,

    /// Minimum relevance (exclusive); derived from the weights when omitted
    #[arg(long)]
    threshold: Option<f64>,

    /// Also score the whole query as one phrase
    #[arg(long)]
    whole_text: bool,

    /// Score only the whole query as one phrase
    #[arg(long, conflicts_with = "whole_text")]
    whole_text_only: bool,

    /// Maximum number of rows
    #[arg(long)]
    limit: Option<u64>,

    /// Rows to skip
    #[arg(long)]
    offset: Option<u64>,
}

impl SearchArgs {
    fn options(&self) -> SearchOptions {
        SearchOptions {
            threshold: self.threshold,
            match_whole_text: self.whole_text,
            match_whole_text_only: self.whole_text_only,
        }
    }

    fn base_query(&self, schema: &impl SchemaSource) -> SelectQuery {
        let mut query = SelectQuery::from_table(schema.dialect(), schema.qualified_table());
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        query
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging; stdout carries the results
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Compile { search, numbered } => compile(&search, numbered),
        Commands::Search { search, db } => search_db(&search, &db),
    }
}

fn load_config(path: &Path) -> Result<SearchConfig> {
    let config = SearchConfig::from_path(path)
        .with_context(|| format!("Failed to load search config {}", path.display()))?;
    debug!(
        "Loaded config for table {} ({} columns, {} joins)",
        config.table,
        config.spec.columns.len(),
        config.spec.joins.len()
    );
    Ok(config)
}

fn compile(args: &SearchArgs, numbered: bool) -> Result<()> {
    let (spec, schema) = load_config(&args.config)?.into_parts();
    let base = args.base_query(&schema);
    let searchable = Searchable::new(spec, schema)?;

    let mut compiled = searchable.compile(base, &args.query, &args.options())?;
    if numbered {
        compiled = compiled.with_numbered_placeholders();
    }

    println!("{}", serde_json::to_string_pretty(&compiled)?);
    Ok(())
}

fn search_db(args: &SearchArgs, db: &Path) -> Result<()> {
    let config = load_config(&args.config)?;
    if config.driver != Dialect::Sqlite {
        warn!(
            "Config targets {}; running against SQLite anyway",
            config.driver
        );
    }
    if !db.exists() {
        bail!("Database not found: {}", db.display());
    }

    let conn = Connection::open(db)
        .with_context(|| format!("Failed to open database {}", db.display()))?;
    let schema = TableSchema::from_sqlite(&conn, &config.table_prefix, &config.table)?;
    info!("Searching {} for {:?}", schema.qualified_table(), args.query);

    let base = args.base_query(&schema);
    let searchable = Searchable::new(config.spec, schema)?;
    let compiled = searchable.compile(base, &args.query, &args.options())?;
    let rows = fetch_ranked(&conn, &compiled)?;

    info!("{} matching rows", rows.len());
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
