//! Sift: block-by-block document triage.
//!
//! Usage:
//!   sift import notes.txt --title "Reading notes"
//!   sift list
//!   sift triage 0192f3a1
//!   sift triage 0192f3a1 --script start,hide,keep,keep,collect
//!   sift triage draft.json --ephemeral
//!   sift untoggle 0192f3a1

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sift_engine::{EngineOptions, InMemoryDocuments, Processor};
use sift_store::DocumentDb;
use sift_tree::BlockTree;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod keys;
mod render;
mod triage;

use config::SiftConfig;

/// Block-by-block document triage.
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(about = "Review a document block by block and collect what matters")]
struct Cli {
    /// Config file (default: ~/.config/sift/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overrides the config file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a text or JSON document
    Import {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        /// Parent document id or prefix
        #[arg(long)]
        parent: Option<String>,
    },
    /// List documents
    List {
        /// Include archived documents
        #[arg(long)]
        all: bool,
    },
    /// Print a document outline
    Show { id: String },
    /// Print a document's stored content
    Export { id: String },
    /// Restore every hidden block in a document
    Untoggle { id: String },
    /// Turn a block into a link to a new sub-page
    Page {
        document: String,
        block: String,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Review a document
    Triage {
        /// Document id or prefix (a JSON file with --ephemeral)
        target: String,
        /// Comma-separated intents instead of the interactive UI
        #[arg(long)]
        script: Option<String>,
        /// Work on a file in memory; nothing is saved
        #[arg(long)]
        ephemeral: bool,
    },
}

/// Install the global subscriber. With `log_dir`, logs go to a file.
fn init_tracing(default_filter: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let file_appender = tracing_appender::rolling::never(dir, "sift.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    Ok(Some(guard))
}

fn open_db(cli: &Cli, config: &SiftConfig) -> Result<DocumentDb> {
    let path = cli.database.clone().unwrap_or_else(|| config.database_path());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    info!(path = %path.display(), "opening database");
    DocumentDb::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiftConfig::load(cli.config.as_deref()).context("failed to load config")?;

    let interactive = matches!(&cli.command, Command::Triage { script: None, .. });
    let log_dir = interactive.then(|| config.log_dir());
    let _guard = init_tracing(config.log_filter(), log_dir.as_deref())?;

    let options = config.engine.clone();
    match &cli.command {
        Command::Import { file, title, parent } => {
            let db = open_db(&cli, &config)?;
            let id = commands::import(&db, file, title.clone(), parent.as_deref())?;
            println!("{id}");
        }
        Command::List { all } => {
            let db = open_db(&cli, &config)?;
            print!("{}", commands::list(&db, *all)?);
        }
        Command::Show { id } => {
            let db = open_db(&cli, &config)?;
            print!("{}", commands::show(&db, id, &options)?);
        }
        Command::Export { id } => {
            let db = open_db(&cli, &config)?;
            println!("{}", commands::export(&db, id)?);
        }
        Command::Untoggle { id } => {
            let db = open_db(&cli, &config)?;
            let restored = commands::untoggle(&db, id)?;
            println!("restored {restored} hidden block(s)");
        }
        Command::Page { document, block, title } => {
            let db = open_db(&cli, &config)?;
            let page = commands::page(db, document, block, title, options)?;
            println!("{page}");
        }
        Command::Triage {
            target,
            script,
            ephemeral: true,
        } => {
            let text = std::fs::read_to_string(target).with_context(|| format!("failed to read {target}"))?;
            let blocks = commands::blocks_from_file(&text);
            let mut service = InMemoryDocuments::new();
            let content = sift_types::codec::encode_document(&blocks)?;
            let id = service.insert(target, &content);
            run_triage(id, BlockTree::new(blocks), service, target, script.as_deref(), options).await?;
        }
        Command::Triage {
            target,
            script,
            ephemeral: false,
        } => {
            let db = open_db(&cli, &config)?;
            let id = db.resolve(target)?;
            let tree = commands::load_tree(&db, id)?;
            let title = db.get(id)?.map(|d| d.title).unwrap_or_default();
            run_triage(id, tree, db, &title, script.as_deref(), options).await?;
        }
    }
    Ok(())
}

async fn run_triage<S: sift_engine::DocumentService>(
    id: sift_types::DocumentId,
    tree: BlockTree,
    service: S,
    title: &str,
    script: Option<&str>,
    options: EngineOptions,
) -> Result<()> {
    let color = options.highlight_color.clone();
    let (mut processor, mut notices) = Processor::new(id, tree, service, options);
    match script {
        Some(script) => {
            let intents = triage::parse_script(script)?;
            print!("{}", triage::run_script(&mut processor, &mut notices, &intents, &color)?);
        }
        None => triage::run_interactive(processor, notices, title, &color).await?,
    }
    Ok(())
}
