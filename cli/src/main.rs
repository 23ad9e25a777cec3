//! orggraph CLI: load enriched company records into the graph
//!
//! Connects to a Neo4j-compatible server over HTTP, or runs against an
//! in-memory store with `--embedded`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orggraph::{
    Company, Config, EmbeddedExecutor, FailurePolicy, GraphBuilder, HttpExecutor, Label,
    NodeLabel, QueryExecutor, RelationPolicy, Relationship, RetryingExecutor, UpsertReport,
};

#[derive(Parser)]
#[command(name = "orggraph", version, about = "Organization graph loader")]
struct Cli {
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server HTTP URI
    #[arg(long, global = true, env = "NEO4J_URI")]
    uri: Option<String>,

    #[arg(long, global = true, env = "NEO4J_USER")]
    user: Option<String>,

    #[arg(long, global = true, env = "NEO4J_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, global = true, env = "NEO4J_DATABASE")]
    database: Option<String>,

    /// Abort the batch on the first failed company
    #[arg(long, global = true)]
    fail_fast: bool,

    /// Fail a company whose relations carry an invalid type or label
    #[arg(long, global = true)]
    strict_relations: bool,

    /// Write into an in-memory store instead of a server
    #[arg(long, global = true)]
    embedded: bool,

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
}

#[derive(Subcommand)]
enum Commands {
    /// Upsert a JSON array of company records
    Load {
        /// Path to the companies file
        file: PathBuf,

        /// JSON array of declared relationships to write after the companies
        #[arg(long)]
        relationships: Option<PathBuf>,

        /// Skip the similarity passes
        #[arg(long)]
        no_similarity: bool,
    },
    /// Recompute similarity edges over the stored companies (server only)
    Derive,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    check_mode(&cli)?;
    let mut config = load_config(&cli)?;

    let embedded = Arc::new(EmbeddedExecutor::new());
    let executor: Arc<dyn QueryExecutor> = if cli.embedded {
        embedded.clone()
    } else {
        let http = HttpExecutor::new(&config.store).context("failed to build HTTP client")?;
        info!("Writing to {}", http.commit_url());
        Arc::new(RetryingExecutor::new(http, config.retry.clone()))
    };

    match cli.command {
        Commands::Load {
            file,
            relationships,
            no_similarity,
        } => {
            if no_similarity {
                config.builder.derive_similarity = false;
            }
            let builder = GraphBuilder::with_config(executor, config.builder)
                .context("invalid builder configuration")?;

            let companies: Vec<Company> = read_json(&file)?;
            let report = builder.upsert(&companies).await?;
            print_report("Companies", &report, &cli.format);

            if let Some(path) = relationships {
                let relationships: Vec<Relationship> = read_json(&path)?;
                let report = builder.upsert_relationships(&relationships).await?;
                print_report("Relationships", &report, &cli.format);
            }
        }
        Commands::Derive => {
            let builder = GraphBuilder::with_config(executor, config.builder)
                .context("invalid builder configuration")?;
            builder.derive_similarity().await?;
            println!("Similarity edges recomputed");
        }
    }

    if cli.embedded {
        print_store_summary(&embedded).await;
    }
    Ok(())
}

/// An embedded store lives for one invocation, so `derive` would run on nothing
fn check_mode(cli: &Cli) -> Result<()> {
    if cli.embedded && matches!(cli.command, Commands::Derive) {
        anyhow::bail!("derive needs a server; an --embedded store starts empty");
    }
    Ok(())
}

/// Defaults, then the config file, then environment and flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_yaml_file(path)?,
        None => Config::default(),
    };
    config.apply_env_overrides()?;

    if let Some(uri) = &cli.uri {
        config.store.uri = uri.clone();
    }
    if let Some(user) = &cli.user {
        config.store.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.store.password = password.clone();
    }
    if let Some(database) = &cli.database {
        config.store.database = database.clone();
    }
    if cli.fail_fast {
        config.builder.failure_policy = FailurePolicy::FailFast;
    }
    if cli.strict_relations {
        config.builder.relation_policy = RelationPolicy::Reject;
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_report(title: &str, report: &UpsertReport, format: &OutputFormat) {
    match format {
        OutputFormat::Json => {
            let failures: Vec<_> = report
                .failures
                .iter()
                .map(|f| serde_json::json!({"name": f.name, "error": f.error.to_string()}))
                .collect();
            let rejected: Vec<_> = report
                .rejected_relations
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "company": r.company,
                        "target": r.target,
                        "error": r.error.to_string(),
                    })
                })
                .collect();
            let summary = serde_json::json!({
                "section": title,
                "upserted": report.upserted,
                "skipped_relations": report.skipped_relations,
                "similarity_derived": report.similarity_derived,
                "failures": failures,
                "rejected_relations": rejected,
            });
            println!("{}", summary);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![title, "Count"]);
            table.add_row(vec!["Upserted".to_string(), report.upserted.to_string()]);
            table.add_row(vec!["Failed".to_string(), report.failures.len().to_string()]);
            table.add_row(vec![
                "Skipped relations".to_string(),
                report.skipped_relations.to_string(),
            ]);
            table.add_row(vec![
                "Rejected relations".to_string(),
                report.rejected_relations.len().to_string(),
            ]);
            table.add_row(vec![
                "Similarity derived".to_string(),
                report.similarity_derived.to_string(),
            ]);
            println!("{}", table);

            if !report.failures.is_empty() {
                let mut failures = Table::new();
                failures.set_content_arrangement(ContentArrangement::Dynamic);
                failures.set_header(vec!["Entity", "Error"]);
                for failure in &report.failures {
                    failures.add_row(vec![failure.name.clone(), failure.error.to_string()]);
                }
                println!("{}", failures);
            }
        }
    }
}

async fn print_store_summary(executor: &EmbeddedExecutor) {
    let store = executor.store_read().await;
    let mut table = Table::new();
    table.set_header(vec!["Label", "Nodes"]);
    for label in NodeLabel::ALL {
        let count = store.get_nodes_by_label(&Label::from(label)).len();
        if count > 0 {
            table.add_row(vec![label.to_string(), count.to_string()]);
        }
    }
    println!("{}", table);
    println!("{} node(s), {} edge(s)", store.node_count(), store.edge_count());
}
