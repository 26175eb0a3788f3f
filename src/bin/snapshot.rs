//! Registry Snapshot CLI
//!
//! Offline tooling around snapshots: classify a directory of schemas without
//! a live registry, inspect an existing snapshot, print the effective
//! configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use registry_snapshot::graph::EnumCatalog;
use registry_snapshot::index::INDEXES_DIRECTORY;
use registry_snapshot::schema::annotate;
use registry_snapshot::version::read_recorded;
use registry_snapshot::writer::{METADATA_FILE, SCHEMAS_DIRECTORY};
use registry_snapshot::{Classifier, IndexKind, PropertyIndex, SchemaDocuments, SemanticKind, SnapshotConfig};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "registry-snapshot")]
#[command(about = "Inspect and classify asset registry snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every schema in a directory
    Classify {
        /// Directory of *.json schema documents
        #[arg(short, long)]
        schemas: PathBuf,

        /// Write annotated schemas here
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print a histogram of semantic kinds
        #[arg(long)]
        summary: bool,
    },

    /// Summarize an existing snapshot
    Inspect {
        /// Snapshot output root
        #[arg(short, long)]
        root: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Extra config file layered over the defaults
        #[arg(short, long)]
        file: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Classify {
            schemas,
            out,
            summary,
        } => classify(&schemas, out.as_deref(), summary),
        Commands::Inspect { root } => inspect(&root),
        Commands::Config { file } => {
            let config = SnapshotConfig::load_from(file.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Every `*.json` under `dir`, keyed by `/`-separated relative path
fn load_schemas(dir: &Path) -> anyhow::Result<SchemaDocuments> {
    let mut schemas = SchemaDocuments::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || path.extension().map(|ext| ext != "json").unwrap_or(true) {
            continue;
        }
        let relative = path
            .strip_prefix(dir)?
            .to_string_lossy()
            .replace('\\', "/");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
        schemas.insert(relative, document);
    }
    Ok(schemas)
}

fn classify(dir: &Path, out: Option<&Path>, summary: bool) -> anyhow::Result<()> {
    let schemas = load_schemas(dir)?;
    let properties = PropertyIndex::build(&schemas);
    // no live codecs offline: enums keep their literal values
    let enums = EnumCatalog::default();
    let semantics = Classifier::new(&schemas, &properties, &enums).classify_all();

    println!("📂 {} schemas, {} properties", schemas.len(), properties.len());
    println!("🏷️  {} classified", semantics.len());

    if summary || out.is_none() {
        let mut by_kind: BTreeMap<SemanticKind, usize> = BTreeMap::new();
        for record in semantics.values() {
            *by_kind.entry(record.kind).or_insert(0) += 1;
        }
        println!();
        for (kind, count) in &by_kind {
            println!("  {:<20} {}", kind.as_str(), count);
        }
    }

    if let Some(out) = out {
        let annotated = annotate(&schemas, &semantics);
        for (file, document) in &annotated {
            let path = out.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, serde_json::to_string_pretty(document)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        println!();
        println!("✅ Wrote {} annotated schemas to {}", annotated.len(), out.display());
    }

    Ok(())
}

fn count_json_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
        .count()
}

fn inspect(root: &Path) -> anyhow::Result<()> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let version = read_recorded(&root.join(METADATA_FILE));
    println!("📦 Snapshot at {}", root.display());
    match version {
        Some(version) => println!("  Version: {}", version),
        None => println!("  Version: (none recorded)"),
    }
    println!("  Schemas: {}", count_json_files(&root.join(SCHEMAS_DIRECTORY)));

    println!();
    println!("  Index shards:");
    let indexes = root.join(INDEXES_DIRECTORY);
    for kind in IndexKind::ALL {
        let count = count_json_files(&indexes.join(kind.directory()));
        println!("    {:<20} {}", kind.as_str(), count);
    }

    Ok(())
}
