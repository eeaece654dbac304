//! # recall CLI
//!
//! The `recall` binary manages the memory index and serves the retrieval
//! path that upstream prompt pipelines call into.
//!
//! ## Usage
//!
//! ```bash
//! recall --config ./config/recall.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recall init` | Create the SQLite database and FTS5 schema |
//! | `recall rebuild` | Rebuild the index from the memory directory |
//! | `recall search "<text>"` | Tokenize the text and print ranked results |
//! | `recall inject` | Print an injection payload for a prompt (arg or hook JSON on stdin) |
//! | `recall list` | List indexed document ids |
//! | `recall delete <id>` | Remove one document from the index |
//! | `recall clear` | Remove all documents from the index |
//!
//! `inject` is the hook entry point: it never fails, and anything short of
//! a relevant result produces no output at all.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;

use recall::config::{self, Config};
use recall::indexer;
use recall::inject;
use recall::query::{build_fts_query, QueryOperator};
use recall::store::IndexStore;
use recall::tokenizer::Tokenizer;

/// recall CLI — a local-first bilingual memory index and retrieval layer
/// for AI assistants.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/recall.example.toml` for a full example. A missing
/// config file falls back to built-in defaults.
#[derive(Parser)]
#[command(
    name = "recall",
    about = "recall — a local-first bilingual memory index and retrieval layer for AI assistants",
    version,
    long_about = "recall indexes a directory of front-mattered markdown notes into a SQLite FTS5 \
    table and answers free-text prompts (mixed English/Chinese) with a character-budgeted block \
    of ranked summaries for context injection."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/recall.toml`. Database, memory-directory,
    /// injection, and tokenizer settings are read from this file.
    #[arg(long, global = true, default_value = "./config/recall.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the FTS5 virtual table.
    /// This command is idempotent — running it multiple times is safe.
    Init,

    /// Rebuild the full-text index from the memory directory.
    ///
    /// Clears the index, scans every markdown file, parses front matter,
    /// and indexes each document. Files with unparsable headers fall back
    /// to filename-derived identity; unreadable files are skipped with a
    /// warning and never abort the rebuild.
    Rebuild,

    /// Search indexed memories with free text.
    ///
    /// The text is tokenized (bilingual word + n-gram extraction), turned
    /// into an FTS5 expression, and matched against all indexed fields.
    Search {
        /// Free-text search input; may mix English and Chinese.
        text: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,

        /// Combination operator: `or` (broad recall) or `and` (precision).
        /// Defaults to the configured `tokenizer.operator`.
        #[arg(long)]
        operator: Option<String>,
    },

    /// Print an injection payload for a prompt, or nothing.
    ///
    /// With `--prompt`, uses the given text. Without it, reads the hook
    /// JSON (`{"prompt": "..."}`) from stdin. Produces no output — and
    /// still exits 0 — when injection is disabled, the store is missing,
    /// or nothing relevant is found.
    Inject {
        /// Prompt text; when omitted, hook JSON is read from stdin.
        #[arg(long)]
        prompt: Option<String>,
    },

    /// List all indexed document ids.
    List,

    /// Remove one document from the index.
    Delete {
        /// Document id.
        id: String,
    },

    /// Remove all documents from the index.
    Clear,
}

/// Hook input from the upstream prompt-capture collaborator. Unknown
/// fields (session id, working directory) are ignored.
#[derive(Deserialize)]
struct HookInput {
    #[serde(default)]
    prompt: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        // The inject path never fails on configuration: missing or
        // unreadable config degrades to defaults, and any absence
        // condition inside the assembler degrades to empty output.
        Commands::Inject { prompt } => {
            let cfg = config::load_or_default(&cli.config);
            run_inject(&cfg, prompt).await;
        }
        command => {
            // A missing config file means defaults; a present but invalid
            // one is a hard error.
            let cfg = if cli.config.exists() {
                config::load_config(&cli.config)?
            } else {
                Config::default()
            };
            let store = IndexStore::new(cfg.db.path.clone());

            match command {
                Commands::Init => {
                    store.init().await?;
                    println!("Database initialized successfully.");
                }
                Commands::Rebuild => {
                    indexer::rebuild(&cfg, &store).await?;
                }
                Commands::Search {
                    text,
                    limit,
                    operator,
                } => {
                    run_search(&cfg, &store, &text, limit, operator).await?;
                }
                Commands::List => {
                    for id in store.list_ids().await {
                        println!("{}", id);
                    }
                }
                Commands::Delete { id } => {
                    if store.delete_document(&id).await {
                        println!("Deleted {}.", id);
                    } else {
                        eprintln!("Error: could not delete '{}'", id);
                        std::process::exit(1);
                    }
                }
                Commands::Clear => {
                    if store.clear_all().await {
                        println!("Index cleared.");
                    } else {
                        eprintln!("Error: could not clear index");
                        std::process::exit(1);
                    }
                }
                Commands::Inject { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}

async fn run_search(
    config: &Config,
    store: &IndexStore,
    text: &str,
    limit: Option<i64>,
    operator: Option<String>,
) -> Result<()> {
    let operator = match operator {
        Some(raw) => raw
            .parse::<QueryOperator>()
            .map_err(|_| anyhow::anyhow!("Unknown operator: '{}'. Use or, and.", raw))?,
        None => config.tokenizer.query_operator(),
    };

    let tokenizer = Tokenizer::from_config(config);
    let tokens = tokenizer.tokenize(text);
    let query = build_fts_query(&tokens, operator);
    if query.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let limit = limit.unwrap_or(config.inject.max_results);
    let results = store.search(&query, limit).await;
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, result.score, result.title);
        println!("    id: {}", result.id);
        println!("    summary: \"{}\"", result.summary.replace('\n', " "));
        println!();
    }

    Ok(())
}

/// Hook entry point: print the payload or nothing, and never fail.
async fn run_inject(config: &Config, prompt: Option<String>) {
    let prompt = match prompt {
        Some(p) => p,
        None => {
            let mut raw = String::new();
            if std::io::stdin().read_to_string(&mut raw).is_err() {
                return;
            }
            match serde_json::from_str::<HookInput>(&raw) {
                Ok(input) => input.prompt,
                Err(_) => return,
            }
        }
    };

    if prompt.is_empty() {
        return;
    }

    let store = IndexStore::new(config.db.path.clone());
    if let Some(payload) = inject::retrieve_and_format(config, &store, &prompt).await {
        print!("{}", payload);
    }
}
