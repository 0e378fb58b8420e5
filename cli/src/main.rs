//! Catalog Graph CLI: ingest a catalog model, search it, reset the store

use anyhow::{bail, Context, Result};
use catalog_graph::{
    provider_from_config, CatalogSource, Config, ContainerHit, EmbeddedGraphStore,
    EmbeddingProvider, EntityKind, FileSource, GraphStore, HttpCatalogSource, IngestionPipeline,
    SearchHit, SearchService, TeardownTool,
};
use clap::{ArgGroup, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catalog-graph", version, about = "Semantic search over a catalog data model")]
struct Cli {
    /// Snapshot file of the graph store
    #[arg(long, global = true, env = "CATALOG_GRAPH_DATA")]
    data: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and vector index from a catalog model
    #[command(group(ArgGroup::new("input").required(true).args(["file", "catalog"])))]
    Ingest {
        /// Declarative model file (JSON, or YAML by extension)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Fetch the model from the catalog service (GD_HOST, GD_TOKEN, GD_WORKSPACE)
        #[arg(long)]
        catalog: bool,
    },
    /// Search entities by meaning
    Search {
        query: String,

        /// Number of results
        #[arg(short, default_value_t = 10)]
        k: usize,

        /// Only return entities of this kind
        #[arg(long, conflicts_with = "children")]
        kind: Option<EntityKind>,

        /// Return the datasets containing the matches
        #[arg(long)]
        children: bool,
    },
    /// Drop and recreate the vector index from stored embeddings
    Reindex,
    /// Delete every node and relationship and drop the vector index
    Teardown,
    /// Show entity and relationship counts
    Stats,
    /// Start an interactive search prompt
    Shell,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("reading configuration")?;
    if let Some(path) = cli.data {
        config.store.data_path = Some(path);
    }

    let store = EmbeddedGraphStore::open(&config.store).context("opening graph store")?;
    match store.data_path() {
        Some(path) => tracing::debug!("Graph store at {}", path.display()),
        None => tracing::debug!("Graph store is in memory only"),
    }

    match cli.command {
        Commands::Ingest { file, catalog } => {
            let source: Box<dyn CatalogSource> = match (file, catalog) {
                (Some(path), _) => Box::new(FileSource::new(path)),
                (None, true) => Box::new(HttpCatalogSource::from_config(&config.catalog)?),
                (None, false) => bail!("either --file or --catalog is required"),
            };
            let embedder = provider_from_config(&config.embed)?;
            let report = IngestionPipeline::new(&store, embedder.as_ref())
                .with_index_name(&config.search.index_name)
                .ingest_source(source.as_ref())?;
            print_record(&cli.format, &report)
        }
        Commands::Search {
            query,
            k,
            kind,
            children,
        } => {
            let embedder = provider_from_config(&config.embed)?;
            let service = SearchService::with_config(&store, embedder.as_ref(), config.search.clone());
            run_search(&service, &query, k, kind, children, &cli.format)
        }
        Commands::Reindex => {
            let embedder = provider_from_config(&config.embed)?;
            let indexed = IngestionPipeline::new(&store, embedder.as_ref())
                .with_index_name(&config.search.index_name)
                .rebuild_index()?;
            println!("Indexed {} embeddings into {}", indexed, config.search.index_name);
            Ok(())
        }
        Commands::Teardown => {
            let report = TeardownTool::new(&store)
                .with_index_name(&config.search.index_name)
                .run()?;
            print_record(&cli.format, &report)
        }
        Commands::Stats => {
            let stats = store.connect()?.stats()?;
            print_record(&cli.format, &stats)
        }
        Commands::Shell => {
            let embedder = provider_from_config(&config.embed)?;
            let service = SearchService::with_config(&store, embedder.as_ref(), config.search.clone());
            run_shell(&service, embedder.as_ref(), &cli.format)
        }
    }
}

fn run_search(
    service: &SearchService<'_>,
    query: &str,
    k: usize,
    kind: Option<EntityKind>,
    children: bool,
    format: &OutputFormat,
) -> Result<()> {
    if children {
        let rows = service.search_by_children(query, k)?;
        let cells = rows.iter().map(container_cells).collect();
        return print_rows(format, &["Dataset", "Match", "Score"], cells, &rows);
    }

    let hits = match kind {
        Some(kind) => service.search_by_type(query, k, kind)?,
        None => service.search_all(query, k)?,
    };
    let cells = hits.iter().map(hit_cells).collect();
    print_rows(format, &["Title", "Kind", "Score"], cells, &hits)
}

fn run_shell(
    service: &SearchService<'_>,
    embedder: &dyn EmbeddingProvider,
    format: &OutputFormat,
) -> Result<()> {
    println!("Catalog Graph search ({} embeddings)", embedder.name());
    println!("Type a query, or :help for commands. :quit to exit.\n");

    let stdin = std::io::stdin();
    let mut line = String::new();
    let mut k = 10;
    let mut kind: Option<EntityKind> = None;
    let mut children = false;

    loop {
        eprint!("search> ");

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed.split_once(' ').unwrap_or((trimmed, "")) {
            (":quit" | ":exit" | ":q", _) => break,
            (":help" | ":h", _) => {
                println!("Commands:");
                println!("  :k N       Number of results");
                println!("  :kind K    Filter by Dataset, Fact or Attribute (:kind all to clear)");
                println!("  :children  Toggle containing-dataset mode");
                println!("  :quit      Exit shell");
                println!("  <text>     Search");
            }
            (":k", value) => match value.trim().parse() {
                Ok(n) => k = n,
                Err(_) => eprintln!("Error: expected a number"),
            },
            (":kind", value) if value.trim().eq_ignore_ascii_case("all") => kind = None,
            (":kind", value) => match value.parse() {
                Ok(parsed) => kind = Some(parsed),
                Err(e) => eprintln!("Error: {}", e),
            },
            (":children", _) => {
                children = !children;
                println!("Containing-dataset mode {}", if children { "on" } else { "off" });
            }
            _ => {
                if let Err(e) = run_search(service, trimmed, k, kind, children, format) {
                    eprintln!("Error: {:#}", e);
                }
            }
        }
    }

    println!("Bye!");
    Ok(())
}

fn hit_cells(hit: &SearchHit) -> Vec<String> {
    vec![hit.title.clone(), hit.kind.to_string(), format!("{:.4}", hit.score)]
}

fn container_cells(row: &ContainerHit) -> Vec<String> {
    vec![row.parent_title.clone(), row.child.clone(), format!("{:.4}", row.score)]
}

fn print_rows<T: Serialize>(
    format: &OutputFormat,
    header: &[&str],
    rows: Vec<Vec<String>>,
    records: &T,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Csv => {
            println!("{}", header.join(","));
            for row in &rows {
                let cells: Vec<String> = row.iter().map(|c| csv_cell(c)).collect();
                println!("{}", cells.join(","));
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("(no results)");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(header.to_vec());
            let count = rows.len();
            for row in rows {
                table.add_row(row);
            }

            println!("{}", table);
            println!("{} row(s)", count);
        }
    }
    Ok(())
}

/// Print a single report as a two-column table or JSON
fn print_record<T: Serialize>(format: &OutputFormat, record: &T) -> Result<()> {
    let value = serde_json::to_value(record)?;
    let serde_json::Value::Object(fields) = &value else {
        println!("{}", value);
        return Ok(());
    };

    let rows: Vec<Vec<String>> = fields
        .iter()
        .map(|(key, v)| vec![key.clone(), plain_value(v)])
        .collect();
    print_rows(format, &["Field", "Value"], rows, &value)
}

fn plain_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_cell(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
