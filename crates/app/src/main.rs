use campus_graph_core::{
    ingest_folder, GraphSink, IngestStatus, KnowledgePipeline, Neo4jStore, RawDocument,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "campus-graph", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Neo4j HTTP endpoint
    #[arg(long, env = "NEO4J_URL", default_value = "http://localhost:7474")]
    neo4j_url: String,

    /// Neo4j database name
    #[arg(long, env = "NEO4J_DATABASE", default_value = "neo4j")]
    neo4j_db: String,

    /// Neo4j username
    #[arg(long, env = "NEO4J_USERNAME", default_value = "neo4j")]
    neo4j_user: String,

    /// Neo4j password
    #[arg(long, env = "NEO4J_PASSWORD", default_value = "password")]
    neo4j_password: String,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a document or folder and import the mutations into Neo4j.
    Ingest {
        /// File or folder to process.
        #[arg(long)]
        path: String,
    },
    /// Dry run: print extracted entities, relations and planned mutations
    /// without touching the store.
    Extract {
        /// Document to process.
        #[arg(long)]
        path: String,
        /// Print planned mutations as JSON.
        #[arg(long, default_value_t = false)]
        mutations: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let pipeline = KnowledgePipeline::new()
        .map_err(|error| anyhow::anyhow!("pipeline configuration invalid: {error}"))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "campus-graph boot"
    );

    match cli.command {
        Command::Ingest { path } => {
            let store = Neo4jStore::new(
                &cli.neo4j_url,
                &cli.neo4j_db,
                &cli.neo4j_user,
                &cli.neo4j_password,
            );
            store
                .verify_connectivity()
                .await
                .map_err(|error| anyhow::anyhow!("graph store unreachable: {error}"))?;

            let target = Path::new(&path);
            if target.is_dir() {
                let report = ingest_folder(&pipeline, target, &store)
                    .await
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

                let mut processed = 0usize;
                let mut failed = 0usize;
                for (document_path, outcome) in &report.outcomes {
                    match outcome.status {
                        IngestStatus::Processed => processed += 1,
                        IngestStatus::Failed => failed += 1,
                    }
                    println!(
                        "[{}] {}: {}",
                        match outcome.status {
                            IngestStatus::Processed => "ok",
                            IngestStatus::Failed => "failed",
                        },
                        document_path.display(),
                        outcome.note
                    );
                }
                println!("{processed} processed, {failed} failed");
            } else {
                let document = RawDocument::from_path(target)
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;
                let outcome = pipeline.run(&document, &store).await;
                println!(
                    "[{}] {}: {}",
                    match outcome.status {
                        IngestStatus::Processed => "ok",
                        IngestStatus::Failed => "failed",
                    },
                    target.display(),
                    outcome.note
                );
                if outcome.status == IngestStatus::Failed {
                    anyhow::bail!("document failed: {}", outcome.note);
                }
            }
        }
        Command::Extract { path, mutations } => {
            let document = RawDocument::from_path(Path::new(&path))
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let extraction = pipeline
                .process_document(&document)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!(
                "document: {} ({} sentences)",
                extraction.fingerprint.title, extraction.sentence_count
            );
            for entity in &extraction.entities {
                println!(
                    "entity: {:?} {:?} [{}..{}]",
                    entity.label, entity.text, entity.start, entity.end
                );
            }
            for relation in &extraction.relations {
                println!(
                    "relation: {} source={:?} target={:?}",
                    relation.rel_type.as_str(),
                    relation.source.text,
                    relation.target
                );
            }
            if mutations {
                for mutation in &extraction.mutations {
                    println!("{}", serde_json::to_string(mutation)?);
                }
            }
            println!(
                "{} entities, {} relations, {} planned mutations",
                extraction.entities.len(),
                extraction.relations.len(),
                extraction.mutations.len()
            );
        }
    }

    Ok(())
}
