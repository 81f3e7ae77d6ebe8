use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use shardsearch::{
    DocumentIndexData, Engine, EngineOptions, IndexType, IndexerOptions, RankByBm25,
    RankByTokenProximity, RankOptions, SearchRequest,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "shardsearch")]
#[command(about = "Index a JSONL corpus and run ranked searches against it", long_about = None)]
struct Args {
    /// JSONL corpus, one {"id", "content", "labels"} object per line
    #[arg(long, env = "SHARDSEARCH_CORPUS")]
    corpus: PathBuf,

    /// Segmenter dictionary; unicode word segmentation is used when absent
    #[arg(long, env = "SHARDSEARCH_DICTIONARY")]
    dictionary: Option<PathBuf>,

    /// Stop token file, one token per line
    #[arg(long, env = "SHARDSEARCH_STOP_TOKENS")]
    stop_tokens: Option<PathBuf>,

    /// Add the built-in English stop token list
    #[arg(long)]
    english_stop_tokens: bool,

    /// JSON file with indexer options; overridden by --shards and --index-type
    #[arg(long)]
    indexer_config: Option<PathBuf>,

    /// Number of indexer/ranker shard pairs
    #[arg(long, env = "SHARDSEARCH_SHARDS")]
    shards: Option<usize>,

    /// Index type (doc-ids, frequencies, locations)
    #[arg(long, env = "SHARDSEARCH_INDEX_TYPE")]
    index_type: Option<String>,

    /// Ranking (bm25, proximity)
    #[arg(long, default_value = "bm25")]
    ranking: String,

    /// Number of results to skip
    #[arg(long, default_value = "0")]
    offset: usize,

    /// Maximum number of results, 0 for all
    #[arg(long, default_value = "10")]
    limit: usize,

    /// Sort ascending
    #[arg(long)]
    reverse: bool,

    /// Labels every result must carry
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,

    /// Print Prometheus metrics after the searches
    #[arg(long)]
    metrics: bool,

    /// Queries to run
    queries: Vec<String>,
}

#[derive(Deserialize)]
struct CorpusEntry {
    id: u64,
    content: String,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query: &'a str,
    tokens: &'a [String],
    num_docs: usize,
    docs: Vec<HitOutput<'a>>,
}

#[derive(Serialize)]
struct HitOutput<'a> {
    id: u64,
    scores: &'a [f32],
    snippet_positions: &'a [usize],
}

fn parse_index_type(name: &str) -> IndexType {
    match name.to_lowercase().as_str() {
        "doc-ids" | "doc_ids" | "docids" => IndexType::DocIds,
        "frequencies" => IndexType::Frequencies,
        "locations" => IndexType::Locations,
        _ => {
            warn!("Unknown index type '{}', using 'frequencies'", name);
            IndexType::Frequencies
        }
    }
}

fn rank_options(args: &Args) -> RankOptions {
    let options = match args.ranking.to_lowercase().as_str() {
        "proximity" | "token_proximity" => RankOptions::new(RankByTokenProximity),
        "bm25" => RankOptions::new(RankByBm25),
        _ => {
            warn!("Unknown ranking '{}', using 'bm25'", args.ranking);
            RankOptions::new(RankByBm25)
        }
    };
    options
        .with_output_offset(args.offset)
        .with_max_outputs(args.limit)
        .with_reverse_order(args.reverse)
}

fn engine_options(args: &Args) -> Result<EngineOptions> {
    let mut indexer = match &args.indexer_config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening indexer config {}", path.display()))?;
            serde_json::from_reader::<_, IndexerOptions>(file)
                .with_context(|| format!("parsing indexer config {}", path.display()))?
        }
        None => IndexerOptions::default(),
    };
    if let Some(shards) = args.shards {
        indexer.num_shards = shards;
    }
    if let Some(index_type) = &args.index_type {
        indexer.index_type = parse_index_type(index_type);
    }

    let mut options = EngineOptions::new()
        .with_english_stop_tokens(args.english_stop_tokens)
        .with_rank_options(rank_options(args));
    options.indexer = indexer;
    if let Some(path) = &args.dictionary {
        options = options.with_dictionary(path);
    }
    if let Some(path) = &args.stop_tokens {
        options = options.with_stop_tokens(path);
    }
    Ok(options)
}

fn load_corpus(engine: &Engine, path: &Path) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("opening corpus {}", path.display()))?;
    let mut count = 0;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: CorpusEntry = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid corpus entry", path.display(), idx + 1))?;
        engine.index_document(
            entry.id,
            DocumentIndexData::new(entry.content).with_labels(entry.labels),
        )?;
        count += 1;
    }
    engine.flush_index()?;
    Ok(count)
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Starting shardsearch v{}", shardsearch::VERSION);

    let engine = Engine::new(engine_options(&args)?)?;

    let start = Instant::now();
    let count = load_corpus(&engine, &args.corpus)?;
    info!(
        documents = count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Indexed corpus"
    );

    for query in &args.queries {
        let request = SearchRequest::new(query.as_str()).with_labels(args.labels.iter().cloned());
        let response = engine.search(request)?;
        let output = QueryOutput {
            query,
            tokens: &response.tokens,
            num_docs: response.num_docs,
            docs: response
                .docs
                .iter()
                .map(|doc| HitOutput {
                    id: doc.doc_id,
                    scores: &doc.scores,
                    snippet_positions: &doc.token_snippet_positions,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string(&output)?);
    }

    if args.metrics {
        print!("{}", engine.metrics().export()?);
    }

    engine.close();
    Ok(())
}
