use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for one engine instance.
///
/// Every engine owns its own registry, so several engines can live in one
/// process without name clashes.
#[derive(Clone)]
pub struct EngineMetrics {
    // Counters
    pub indexing_requests: Counter,
    pub removal_requests: Counter,
    pub documents_indexed: Counter,
    pub documents_removed: Counter,
    pub postings_added: Counter,
    pub searches_total: CounterVec,

    // Gauges
    pub total_documents: Gauge,

    // Histograms
    pub search_latency: Histogram,

    registry: Arc<Registry>,
}

/// Point-in-time copy of the engine counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub indexing_requests: u64,
    pub removal_requests: u64,
    pub documents_indexed: u64,
    pub documents_removed: u64,
    pub postings_added: u64,
    pub searches: u64,
    pub total_documents: u64,
}

impl EngineMetrics {
    /// Create a new EngineMetrics instance
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let indexing_requests = Counter::with_opts(Opts::new(
            "shardsearch_indexing_requests_total",
            "Total number of index_document calls",
        ))?;
        registry.register(Box::new(indexing_requests.clone()))?;

        let removal_requests = Counter::with_opts(Opts::new(
            "shardsearch_removal_requests_total",
            "Total number of remove_document calls",
        ))?;
        registry.register(Box::new(removal_requests.clone()))?;

        let documents_indexed = Counter::with_opts(Opts::new(
            "shardsearch_documents_indexed_total",
            "Total number of documents applied by indexer shards",
        ))?;
        registry.register(Box::new(documents_indexed.clone()))?;

        let documents_removed = Counter::with_opts(Opts::new(
            "shardsearch_documents_removed_total",
            "Total number of documents removed by indexer shards",
        ))?;
        registry.register(Box::new(documents_removed.clone()))?;

        let postings_added = Counter::with_opts(Opts::new(
            "shardsearch_postings_added_total",
            "Total number of postings inserted into the inverted index",
        ))?;
        registry.register(Box::new(postings_added.clone()))?;

        let searches_total = CounterVec::new(
            Opts::new("shardsearch_searches_total", "Total number of searches by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(searches_total.clone()))?;

        let total_documents = Gauge::with_opts(Opts::new(
            "shardsearch_total_documents",
            "Current number of documents in the index",
        ))?;
        registry.register(Box::new(total_documents.clone()))?;

        let search_latency = Histogram::with_opts(
            HistogramOpts::new("shardsearch_search_latency_seconds", "Search latency")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(search_latency.clone()))?;

        Ok(Self {
            indexing_requests,
            removal_requests,
            documents_indexed,
            documents_removed,
            postings_added,
            searches_total,
            total_documents,
            search_latency,
            registry: Arc::new(registry),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a search; `hits` is the number of scored documents
    pub fn record_search(&self, hits: usize, duration_secs: f64) {
        let outcome = if hits == 0 { "empty" } else { "hits" };
        self.searches_total.with_label_values(&[outcome]).inc();
        self.search_latency.observe(duration_secs);
    }

    /// Record a document applied by an indexer shard
    pub fn record_indexed(&self, postings: usize, replaced: bool) {
        self.documents_indexed.inc();
        self.postings_added.inc_by(postings as f64);
        if !replaced {
            self.total_documents.inc();
        }
    }

    /// Record a document removed by an indexer shard
    pub fn record_removed(&self) {
        self.documents_removed.inc();
        self.total_documents.dec();
    }

    pub fn snapshot(&self) -> EngineStats {
        let searches = ["empty", "hits"]
            .iter()
            .map(|outcome| self.searches_total.with_label_values(&[*outcome]).get())
            .sum::<f64>();
        EngineStats {
            indexing_requests: self.indexing_requests.get() as u64,
            removal_requests: self.removal_requests.get() as u64,
            documents_indexed: self.documents_indexed.get() as u64,
            documents_removed: self.documents_removed.get() as u64,
            postings_added: self.postings_added.get() as u64,
            searches: searches as u64,
            total_documents: self.total_documents.get().max(0.0) as u64,
        }
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
