//! Scenario CLI: import and export document-store scenarios.
//!
//! Usage:
//!   scenario import <FILE> [--db path] [--options FILE] [--nuke] [--nuke-collection NAME]...
//!   scenario export [--db path] [--collection NAME]... [--with-refs] [--format json|yaml]
//!   scenario collection <subcommand> [--db path]

use clap::{Parser, Subcommand, ValueEnum};
use scenario::{
    CollectionSchema, DescriptorTree, DocumentStore, ExportOptions, ImportOptions, Nuke, OpenStore, Scenario,
    ScenarioEngine, SqliteStore, StorageResult,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scenario",
    version,
    about = "Populate a document store from declarative scenarios"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a scenario file
    Import {
        /// Scenario file (YAML or JSON)
        file: PathBuf,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Import options file (YAML or JSON); flags override it
        #[arg(long)]
        options: Option<PathBuf>,
        /// Empty every collection before importing
        #[arg(long, conflicts_with = "nuke_collection")]
        nuke: bool,
        /// Empty this collection before importing (repeatable)
        #[arg(long)]
        nuke_collection: Vec<String>,
        /// Give up after this long without progress
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Fail before creating anything if a label is never defined
        #[arg(long)]
        check_dependencies: bool,
    },
    /// Export collections as a scenario
    Export {
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Only export this collection (repeatable)
        #[arg(long)]
        collection: Vec<String>,
        /// Label every row with its own ID so the output can be re-imported
        #[arg(long)]
        with_refs: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Manage collections
    Collection {
        #[command(subcommand)]
        action: CollectionAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CollectionAction {
    /// Create a collection or replace its schema
    Define {
        /// Collection name
        name: String,
        /// Schema file (YAML or JSON)
        schema: PathBuf,
    },
    /// List all collections
    List,
    /// Show which fields of a collection hold references
    Describe {
        /// Collection name
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

/// Get the default database path (~/.local/share/scenario/scenario.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let scenario_dir = data_dir.join("scenario");
    std::fs::create_dir_all(&scenario_dir).ok();
    scenario_dir.join("scenario.db")
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(Arc::new(store))
}

/// Read a YAML or JSON file (YAML is a superset, so one parser covers both).
fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_yaml::from_str(&text).map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
}

struct ImportArgs {
    file: PathBuf,
    options: Option<PathBuf>,
    nuke: bool,
    nuke_collection: Vec<String>,
    timeout_ms: Option<u64>,
    check_dependencies: bool,
}

async fn cmd_import(store: Arc<SqliteStore>, args: ImportArgs) -> i32 {
    let value = match read_file::<serde_json::Value>(&args.file) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let input = match Scenario::try_from(value) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut options = match &args.options {
        Some(path) => match read_file::<ImportOptions>(path) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => ImportOptions::default(),
    };
    if args.nuke {
        options.nuke = Nuke::All(true);
    } else if !args.nuke_collection.is_empty() {
        options.nuke = Nuke::Collections(args.nuke_collection);
    }
    if let Some(ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }
    if args.check_dependencies {
        options.check_dependencies = true;
    }

    let engine = ScenarioEngine::new(store);
    match engine.import_with(&input, options).await {
        Ok(progress) => {
            for (collection, count) in &progress.created {
                println!("{:<24}  {:>7}", collection, count);
            }
            if !progress.nuked.is_empty() {
                println!("Emptied: {}", progress.nuked.join(", "));
            }
            0
        }
        Err(failure) => {
            eprintln!("Error: {}", failure.error);
            if let Some(payload) = failure.error.payload() {
                eprintln!("{}", payload);
            }
            if failure.progress.total_created() > 0 {
                eprintln!("Created before failure: {}", failure.progress.total_created());
            }
            1
        }
    }
}

async fn cmd_export(store: Arc<SqliteStore>, collection: Vec<String>, with_refs: bool, format: Format) -> i32 {
    let mut options = ExportOptions::new().with_refs(with_refs);
    if !collection.is_empty() {
        options = options.with_collections(collection);
    }
    let engine = ScenarioEngine::new(store);
    let exported = match engine.export(options).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(&exported).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::to_string(&exported).map_err(|e| e.to_string()),
    };
    match rendered {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_collection_define(store: &SqliteStore, name: &str, schema: &Path) -> i32 {
    let schema = match read_file::<CollectionSchema>(schema) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match store.define_collection(name, schema).await {
        Ok(()) => {
            println!("Defined collection '{}'", name);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Every collection with its document count.
async fn collection_counts(store: &dyn DocumentStore) -> StorageResult<Vec<(String, usize)>> {
    let mut counts = Vec::new();
    for name in store.list_collections().await? {
        let count = store.find_all(&name).await?.len();
        counts.push((name, count));
    }
    Ok(counts)
}

async fn cmd_collection_list(store: &dyn DocumentStore) -> i32 {
    let counts = match collection_counts(store).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if counts.is_empty() {
        println!("No collections defined.");
        return 0;
    }
    println!("{:<24}  {:>9}", "NAME", "DOCUMENTS");
    println!("{}", "-".repeat(35));
    for (name, count) in counts {
        println!("{:<24}  {:>9}", name, count);
    }
    0
}

async fn cmd_collection_describe(store: &SqliteStore, name: &str) -> i32 {
    match store.describe(name).await {
        Ok(Some(schema)) => {
            print!("{}", DescriptorTree::from_schema(&schema).render());
            0
        }
        Ok(None) => {
            eprintln!("Error: collection '{}' not found", name);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn run(cli: Cli) -> i32 {
    match cli.command {
        Commands::Import {
            file,
            db,
            options,
            nuke,
            nuke_collection,
            timeout_ms,
            check_dependencies,
        } => {
            let store = match open_store(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            };
            let args = ImportArgs {
                file,
                options,
                nuke,
                nuke_collection,
                timeout_ms,
                check_dependencies,
            };
            cmd_import(store, args).await
        }
        Commands::Export {
            db,
            collection,
            with_refs,
            format,
        } => match open_store(db) {
            Ok(store) => cmd_export(store, collection, with_refs, format).await,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Collection { action, db } => {
            let store = match open_store(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            };
            match action {
                CollectionAction::Define { name, schema } => cmd_collection_define(&store, &name, &schema).await,
                CollectionAction::List => cmd_collection_list(store.as_ref()).await,
                CollectionAction::Describe { name } => cmd_collection_describe(&store, &name).await,
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    let code = runtime.block_on(run(cli));
    std::process::exit(code);
}
