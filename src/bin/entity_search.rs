//! Command-line search over JSON fixtures
//!
//! Loads an entity schema and records from JSON files, reads a search request
//! from a file or stdin and prints the matching records.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use entity_search::ast::FieldCollector;
use entity_search::backend::QueryExecutor;
use entity_search::backend::memory::{MemoryBackend, MemoryBuilder};
use entity_search::model::SchemaRegistry;
use entity_search::{EngineConfig, SearchEngine};
use log::info;
use serde_json::Value as JsonValue;

#[derive(Parser)]
#[command(name = "entity-search")]
#[command(about = "Run JSON filter expressions against entity records")]
#[command(version)]
struct Cli {
    /// JSON array of entity declarations
    #[arg(short, long)]
    schema: PathBuf,

    /// JSON object mapping entity names to arrays of records
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Entity type to search
    #[arg(short, long)]
    entity: String,

    /// Request file (reads from stdin if not provided)
    request: Option<PathBuf>,

    /// Engine configuration as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the compiled predicate and sort order instead of results
    #[arg(long)]
    explain: bool,

    /// Print a page (pageSize / pageOffset) instead of every match
    #[arg(long)]
    page: bool,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let schema = SchemaRegistry::from_json_str(&read_file(&cli.schema)?)
        .with_context(|| format!("loading schema {}", cli.schema.display()))?;
    let config = match &cli.config {
        Some(path) => serde_json::from_str(&read_file(path)?)
            .with_context(|| format!("parsing configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = SearchEngine::<MemoryBuilder>::with_config(schema.clone(), config)?;

    let mut backend = MemoryBackend::new(schema);
    if let Some(path) = &cli.data {
        load_data(&mut backend, path)?;
    }
    info!("{} record(s) loaded", backend.len());

    let request_text = match &cli.request {
        Some(path) => read_file(path)?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading request from stdin")?;
            text
        }
    };
    let request = engine.parse_request_str(&request_text)?;

    if cli.explain {
        let query = engine.compile(backend.builder(), &cli.entity, &request)?;
        match &query.predicate {
            Some(predicate) => println!("WHERE {predicate}"),
            None => println!("WHERE TRUE"),
        }
        for order in &query.orders {
            println!("ORDER BY {} {:?}", order.expr, order.direction);
        }
        if let Some(filter) = &request.filter {
            println!("FIELDS {}", FieldCollector::collect(filter).join(", "));
        }
        println!("JOINS {}", query.joins);
        return Ok(());
    }

    let output = if cli.page {
        let page = engine
            .search_page(&backend, &cli.entity, &request)?
            .map(|record| record.to_json());
        serde_json::to_value(page)?
    } else {
        let records = engine.search(&backend, &cli.entity, &request)?;
        JsonValue::Array(records.iter().map(|record| record.to_json()).collect())
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_data(backend: &mut MemoryBackend, path: &Path) -> Result<()> {
    let json: JsonValue = serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("parsing {}", path.display()))?;
    let JsonValue::Object(entities) = json else {
        bail!("{} must hold an object keyed by entity name", path.display());
    };
    for (entity, records) in &entities {
        backend
            .load_json(entity, records)
            .with_context(|| format!("loading '{entity}' records"))?;
    }
    Ok(())
}
