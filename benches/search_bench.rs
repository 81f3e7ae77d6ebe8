use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use shardsearch::{
    DocumentIndexData, Engine, EngineOptions, IndexType, RankByTokenProximity, RankOptions,
    SearchRequest,
};

const WORDS: &[&str] = &[
    "rust", "search", "engine", "shard", "index", "token", "ranking", "query", "document",
    "thread", "channel", "posting",
];

fn make_content(id: u64) -> String {
    (0..12)
        .map(|i| WORDS[((id * 7 + i * 3) % WORDS.len() as u64) as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_engine(doc_count: u64, num_shards: usize) -> Engine {
    let options = EngineOptions::new()
        .with_index_type(IndexType::Locations)
        .with_num_shards(num_shards);
    let engine = Engine::new(options).unwrap();
    for id in 0..doc_count {
        engine
            .index_document(id, DocumentIndexData::new(make_content(id)))
            .unwrap();
    }
    engine.flush_index().unwrap();
    engine
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_documents");
    for &shards in &[1usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(shards), &shards, |b, &shards| {
            b.iter(|| black_box(build_engine(1_000, shards)));
        });
    }
    group.finish();
}

fn bench_bm25_search(c: &mut Criterion) {
    let counts = [1_000u64, 10_000];
    let envs: Vec<(u64, Engine)> = counts.iter().map(|&n| (n, build_engine(n, 4))).collect();

    let mut group = c.benchmark_group("bm25_search");
    for (count, engine) in envs.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), engine, |b, engine| {
            let options = RankOptions::default().with_max_outputs(10);
            b.iter(|| {
                let request = SearchRequest::new("rust search").with_rank_options(options.clone());
                black_box(engine.search(request).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_proximity_search(c: &mut Criterion) {
    let counts = [1_000u64, 10_000];
    let envs: Vec<(u64, Engine)> = counts.iter().map(|&n| (n, build_engine(n, 4))).collect();

    let mut group = c.benchmark_group("proximity_search");
    for (count, engine) in envs.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), engine, |b, engine| {
            let options = RankOptions::new(RankByTokenProximity).with_max_outputs(10);
            b.iter(|| {
                let request = SearchRequest::new("shard index token")
                    .with_rank_options(options.clone());
                black_box(engine.search(request).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_indexing,
    bench_bm25_search,
    bench_proximity_search
);
criterion_main!(benches);
