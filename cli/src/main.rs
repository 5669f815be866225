use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::{ThreadPool, ThreadPoolBuilder};
use search_core::{
    log_duration, process_queries, process_queries_joined, remove_duplicates, DocId, Document, DocumentStatus,
    Execution, SearchEngine,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

mod loader;

#[derive(Parser)]
#[command(name = "search-cli")]
#[command(about = "Load documents into an in-memory TF-IDF engine and query it", long_about = None)]
struct Cli {
    /// Input path (a .json/.jsonl file or a directory of them)
    #[arg(long)]
    input: PathBuf,
    /// Space-separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// Worker threads for parallel operations (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// Use the parallel execution path where one exists
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Print results as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run each query and print its top documents
    Search {
        queries: Vec<String>,
        /// Only rank documents with this status
        #[arg(long, default_value = "ACTUAL")]
        status: DocumentStatus,
    },
    /// Run queries from a file (one per line) as one concurrent batch
    Batch {
        #[arg(long)]
        queries: PathBuf,
        /// Print one flat list instead of one list per query
        #[arg(long, default_value_t = false)]
        joined: bool,
    },
    /// Show which query words a document matches
    Match {
        #[arg(long)]
        id: DocId,
        query: String,
    },
    /// Remove documents by id, then report what is left
    Remove { ids: Vec<DocId> },
    /// Remove documents whose word set repeats a lower id's
    Dedup,
    /// Print the word frequencies of a document
    Frequencies { id: DocId },
    /// Print index statistics
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let pool = ThreadPoolBuilder::new().num_threads(cli.threads).build().context("building worker pool")?;
    let mut engine = SearchEngine::from_stop_words_text(&cli.stop_words)?;
    {
        log_duration!("load documents");
        loader::load_documents(&mut engine, &cli.input)?;
    }
    let execution = if cli.parallel { Execution::Parallel(&pool) } else { Execution::Sequential };

    match cli.command {
        Commands::Search { queries, status } => {
            for query in &queries {
                let docs = engine.find_top_documents_with(execution, query, |_, s, _| s == status)?;
                print_documents(cli.json, Some(query.as_str()), &docs)?;
            }
        }
        Commands::Batch { queries, joined } => run_batch(&pool, &engine, &queries, joined, cli.json)?,
        Commands::Match { id, query } => {
            let (words, status) = engine.match_document_with(execution, &query, id)?;
            if cli.json {
                println!("{}", serde_json::json!({ "id": id, "status": status, "words": words }));
            } else {
                println!("{{ document_id = {id}, status = {status}, words = {} }}", words.join(" "));
            }
        }
        Commands::Remove { ids } => {
            log_duration!("remove documents");
            for id in ids {
                engine.remove_document_with(execution, id);
            }
            println!("{} documents left", engine.document_count());
        }
        Commands::Dedup => {
            for id in remove_duplicates(&mut engine) {
                println!("Found duplicate document id {id}");
            }
            println!("{} documents left", engine.document_count());
        }
        Commands::Frequencies { id } => {
            let freqs = engine.word_frequencies(id);
            if cli.json {
                println!("{}", serde_json::to_string(&freqs)?);
            } else {
                for (word, tf) in freqs {
                    println!("{word}: {tf}");
                }
            }
        }
        Commands::Stats => {
            println!("documents: {}", engine.document_count());
            println!("terms: {}", engine.index().term_count());
            println!("stop words: {}", engine.stop_words().len());
        }
    }
    Ok(())
}

fn run_batch(pool: &ThreadPool, engine: &SearchEngine, path: &Path, joined: bool, json: bool) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let queries: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    log_duration!(format!("batch of {} queries", queries.len()));
    if joined {
        let docs = process_queries_joined(pool, engine, &queries)?;
        print_documents(json, None, &docs)?;
    } else {
        for (query, docs) in queries.iter().zip(process_queries(pool, engine, &queries)?) {
            print_documents(json, Some(*query), &docs)?;
        }
    }
    Ok(())
}

fn print_documents(json: bool, query: Option<&str>, docs: &[Document]) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&serde_json::json!({ "query": query, "results": docs }))?);
        return Ok(());
    }
    if let Some(query) = query {
        println!("{} documents for query [{query}]", docs.len());
    }
    for doc in docs {
        println!("{doc}");
    }
    Ok(())
}
